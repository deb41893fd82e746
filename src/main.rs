use clap::{App, Arg};
use std::path::PathBuf;
use std::process;

use crossword_filler::error::FillError;
use crossword_filler::filler::{CrosswordFiller, FillerSettings};
use crossword_filler::grid::LayoutSource;
use crossword_filler::words::WordSource;

fn main() {
    crossword_filler::logging::init_logger(false);
    if let Err(error) = run() {
        eprintln!("Error: {}", error);
        process::exit(1);
    }
}

fn run() -> Result<(), FillError> {
    let matches = App::new("crossword_filler")
        .version("0.1.0")
        .about("Fills crossword layouts with dictionary words using Monte Carlo tree search")
        .arg(Arg::with_name("path_to_layout")
             .long("path_to_layout")
             .takes_value(true)
             .help("CSV layout file or glob; omit to generate a blank grid"))
        .arg(Arg::with_name("num_rows")
             .long("num_rows")
             .takes_value(true)
             .default_value("4")
             .help("Rows of the generated grid, used only without --path_to_layout"))
        .arg(Arg::with_name("num_cols")
             .long("num_cols")
             .takes_value(true)
             .default_value("5")
             .help("Columns of the generated grid, used only without --path_to_layout"))
        .arg(Arg::with_name("path_to_words")
             .long("path_to_words")
             .takes_value(true)
             .help("CSV word file or glob with an answer column; omit for the built-in dictionary"))
        .arg(Arg::with_name("max_num_words")
             .long("max_num_words")
             .takes_value(true)
             .help("Cap on the catalogue size after deduplication"))
        .arg(Arg::with_name("max_mcts_iterations")
             .long("max_mcts_iterations")
             .takes_value(true)
             .default_value("1000")
             .help("Search iteration budget"))
        .arg(Arg::with_name("random_seed")
             .long("random_seed")
             .takes_value(true)
             .default_value("0")
             .help("Seed for every random decision of the run"))
        .arg(Arg::with_name("output_path")
             .long("output_path")
             .takes_value(true)
             .help("Directory to write grid.csv and summary.csv into"))
        .get_matches();

    let layout = match matches.value_of("path_to_layout") {
        Some(pattern) => LayoutSource::Existing(pattern.to_string()),
        None => LayoutSource::New {
            num_rows: parse_argument(matches.value_of("num_rows").unwrap(), "num_rows")?,
            num_cols: parse_argument(matches.value_of("num_cols").unwrap(), "num_cols")?,
        },
    };
    let words = WordSource::from_pattern(matches.value_of("path_to_words"))?;
    let max_num_words = match matches.value_of("max_num_words") {
        Some(value) => Some(parse_argument(value, "max_num_words")?),
        None => None,
    };
    let settings = FillerSettings {
        layout,
        words,
        max_num_words,
        max_mcts_iterations: parse_argument(
            matches.value_of("max_mcts_iterations").unwrap(), "max_mcts_iterations")?,
        random_seed: parse_argument(
            matches.value_of("random_seed").unwrap(), "random_seed")?,
        output_path: matches.value_of("output_path").map(PathBuf::from),
    };

    let outcome = CrosswordFiller::new(settings).run()?;
    println!("{}", outcome.state.to_string());
    println!("Filled {} of {} entries (reward {:.3})",
             outcome.state.filled_entries(),
             outcome.state.total_entries(),
             outcome.state.reward());
    Ok(())
}

fn parse_argument<T: std::str::FromStr>(value: &str, name: &str) -> Result<T, FillError> {
    value.parse().map_err(|_| FillError::InvalidArgument {
        name: name.to_string(),
        value: value.to_string(),
    })
}
