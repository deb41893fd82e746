use log::info;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

mod output;

pub use output::{write_grid_csv, write_summary_csv};

use crate::error::FillError;
use crate::grid::{CrosswordGrid, LayoutSource};
use crate::search::{IterationRecord, MctsEngine, MctsSettings};
use crate::state::CrosswordState;
use crate::words::{WordBank, WordSource};

/// Everything one run needs, with the defaults the CLI documents.
#[derive(Clone, Debug)]
pub struct FillerSettings {
    pub layout: LayoutSource,
    pub words: WordSource,
    pub max_num_words: Option<usize>,
    pub max_mcts_iterations: usize,
    pub random_seed: u64,
    pub output_path: Option<PathBuf>,
}

impl Default for FillerSettings {
    fn default() -> Self {
        FillerSettings {
            layout: LayoutSource::New { num_rows: 4, num_cols: 5 },
            words: WordSource::Dictionary,
            max_num_words: None,
            max_mcts_iterations: 1000,
            random_seed: 0,
            output_path: None,
        }
    }
}

/// Result of a run: the best state found and the per-iteration history.
/// A reward below 1 means the budget ran out or the grid cannot be fully
/// filled from this word list; both are ordinary outcomes.
#[derive(Debug)]
pub struct FillOutcome {
    pub state: CrosswordState,
    pub history: Vec<IterationRecord>,
}

pub struct CrosswordFiller {
    pub settings: FillerSettings,
}

impl CrosswordFiller {
    pub fn new(settings: FillerSettings) -> Self {
        CrosswordFiller { settings }
    }

    pub fn run(&self) -> Result<FillOutcome, FillError> {
        let layout = self.settings.layout.load()?;
        let grid = CrosswordGrid::build(&layout)?;
        info!("Grid is {}x{} with {} entries",
              grid.num_rows(), grid.num_cols(), grid.entries().len());

        let raw_words = self.settings.words.load()?;
        let bank = WordBank::build(raw_words,
                                   grid.max_entry_length(),
                                   self.settings.max_num_words);
        if bank.is_empty() && !grid.entries().is_empty() {
            return Err(FillError::InvalidWordList(
                "no usable words for this grid".to_string()));
        }

        let initial = CrosswordState::initial(Rc::new(grid), Rc::new(bank))?;
        let mut engine = MctsEngine::new(initial, MctsSettings {
            max_iterations: self.settings.max_mcts_iterations,
            seed: self.settings.random_seed,
            ..MctsSettings::default()
        });
        engine.run()?;

        let outcome = FillOutcome {
            state: engine.best_state().clone(),
            history: engine.history().to_vec(),
        };
        info!("Filled {} of {} entries (reward {:.3})",
              outcome.state.filled_entries(),
              outcome.state.total_entries(),
              outcome.state.reward());

        if let Some(directory) = &self.settings.output_path {
            fs::create_dir_all(directory)?;
            write_grid_csv(&directory.join("grid.csv"), &outcome.state)?;
            write_summary_csv(&directory.join("summary.csv"), &outcome.history)?;
            info!("Wrote grid.csv and summary.csv to {}", directory.display());
        }
        Ok(outcome)
    }
}
