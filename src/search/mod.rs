use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

mod node;

use node::Node;

use crate::error::FillError;
use crate::state::CrosswordState;

const ROOT: usize = 0;

/// Tunables for one search run.
#[derive(Clone, Copy, Debug)]
pub struct MctsSettings {
    pub max_iterations: usize,
    pub seed: u64,
    pub exploration: f64,
    pub stop_on_full_fill: bool,
}

impl Default for MctsSettings {
    fn default() -> Self {
        MctsSettings {
            max_iterations: 1000,
            seed: 0,
            exploration: std::f64::consts::SQRT_2,
            stop_on_full_fill: false,
        }
    }
}

/// One row of the run summary, recorded after every iteration.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub best_reward_so_far: f64,
    pub entries_filled_in_best: usize,
}

struct BestState {
    state: CrosswordState,
    reward: f64,
}

/// Single-player Monte Carlo tree search over crossword states. The tree
/// is an arena of nodes addressed by index; the result of a run is the
/// best terminal state witnessed anywhere, not the most-visited child.
pub struct MctsEngine {
    nodes: Vec<Node>,
    rng: StdRng,
    settings: MctsSettings,
    best: Option<BestState>,
    history: Vec<IterationRecord>,
}

impl MctsEngine {
    pub fn new(initial_state: CrosswordState, settings: MctsSettings) -> Self {
        let rng = StdRng::seed_from_u64(settings.seed);
        let root = Node::new(initial_state, None, None);
        let mut engine = MctsEngine {
            nodes: vec![root],
            rng,
            settings,
            best: None,
            history: vec![],
        };
        if engine.nodes[ROOT].is_terminal() {
            let root_state = engine.nodes[ROOT].state.clone();
            engine.observe_terminal(root_state);
        }
        engine
    }

    pub fn run(&mut self) -> Result<(), FillError> {
        info!("Starting search over {} entries with a budget of {} iterations",
              self.nodes[ROOT].state.total_entries(), self.settings.max_iterations);
        for iteration in 0..self.settings.max_iterations {
            if self.nodes[ROOT].is_terminal() {
                info!("Root state is already terminal");
                break;
            }
            if self.nodes[ROOT].exhausted {
                info!("Search space exhausted after {} iterations", iteration);
                break;
            }

            let leaf = self.select();
            let child = self.expand(leaf)?;
            let value = self.rollout(child)?;
            self.backpropagate(child, value);
            self.update_exhausted(child);

            let (best_reward, best_filled) = match &self.best {
                Some(best) => (best.reward, best.state.filled_entries()),
                None => (0.0, 0),
            };
            self.history.push(IterationRecord {
                iteration,
                best_reward_so_far: best_reward,
                entries_filled_in_best: best_filled,
            });
            if iteration % 100 == 0 {
                debug!("Iteration {}: tree size {}, best reward so far {:.3}",
                       iteration, self.nodes.len(), best_reward);
            }
            if self.settings.stop_on_full_fill && best_reward >= 1.0 {
                info!("Full fill found after {} iterations", iteration + 1);
                break;
            }
        }
        info!("Search finished: {} iterations, tree size {}, best reward {:.3}",
              self.history.len(), self.nodes.len(), self.best_state().reward());
        Ok(())
    }

    /// Descend from the root through fully expanded nodes, maximising UCB1;
    /// stop at the first node that still has untried actions or is terminal.
    fn select(&self) -> usize {
        let mut current = ROOT;
        while self.nodes[current].fully_expanded() && !self.nodes[current].is_terminal() {
            let parent_visits = self.nodes[current].visits;
            let children = &self.nodes[current].children;
            let mut best_child = children[0];
            let mut best_score = self.nodes[best_child].ucb1(parent_visits, self.settings.exploration);
            for &child in &children[1..] {
                let score = self.nodes[child].ucb1(parent_visits, self.settings.exploration);
                if score > best_score {
                    best_child = child;
                    best_score = score;
                }
            }
            current = best_child;
        }
        current
    }

    /// Attach one child for the next untried action. A terminal node is
    /// returned unchanged.
    fn expand(&mut self, node_id: usize) -> Result<usize, FillError> {
        let action = match self.nodes[node_id].next_untried() {
            Some(action) => action,
            None => return Ok(node_id),
        };
        let child_state = self.nodes[node_id].state.apply(action)?;
        let child_id = self.nodes.len();
        self.nodes.push(Node::new(child_state, Some(node_id), Some(action)));
        self.nodes[node_id].children.push(child_id);
        Ok(child_id)
    }

    /// Random playout to a terminal state on a disposable clone chain.
    /// No tree nodes are created here.
    fn rollout(&mut self, node_id: usize) -> Result<f64, FillError> {
        let mut state = self.nodes[node_id].state.clone();
        while let Some(action) = state.random_action(&mut self.rng) {
            state = state.apply(action)?;
        }
        let reward = state.reward();
        self.observe_terminal(state);
        Ok(reward)
    }

    /// Single-player backup: the same scalar is added at every level.
    fn backpropagate(&mut self, node_id: usize, value: f64) {
        let mut current = Some(node_id);
        while let Some(id) = current {
            self.nodes[id].visits += 1;
            self.nodes[id].total_reward += value;
            current = self.nodes[id].parent;
        }
    }

    /// A node is exhausted once every reachable descendant is terminal;
    /// when the root gets there the run can stop early.
    fn update_exhausted(&mut self, node_id: usize) {
        let mut current = Some(node_id);
        while let Some(id) = current {
            let node = &self.nodes[id];
            let exhausted = node.is_terminal()
                || (node.fully_expanded()
                    && node.children.iter().all(|&child| self.nodes[child].exhausted));
            self.nodes[id].exhausted = exhausted;
            current = self.nodes[id].parent;
        }
    }

    /// Keep the best terminal state seen anywhere in the run. Only a
    /// strictly greater reward replaces, so the earliest discovery wins ties.
    fn observe_terminal(&mut self, state: CrosswordState) {
        let reward = state.reward();
        let improved = match &self.best {
            Some(best) => reward > best.reward,
            None => true,
        };
        if improved {
            debug!("New best terminal state with reward {:.3}", reward);
            self.best = Some(BestState { state, reward });
        }
    }

    pub fn best_state(&self) -> &CrosswordState {
        match &self.best {
            Some(best) => &best.state,
            None => &self.nodes[ROOT].state,
        }
    }

    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    pub fn iterations_run(&self) -> usize {
        self.history.len()
    }

    pub fn tree_size(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CrosswordGrid, Layout};
    use crate::state::CrosswordState;
    use crate::words::WordBank;
    use std::rc::Rc;

    fn state_for(layout: &Layout, words: &[&str]) -> CrosswordState {
        let grid = CrosswordGrid::build(layout).unwrap();
        let max_length = grid.max_entry_length();
        let bank = WordBank::build(words.iter().copied(), max_length, None);
        CrosswordState::initial(Rc::new(grid), Rc::new(bank)).unwrap()
    }

    fn search(state: CrosswordState, iterations: usize, seed: u64) -> MctsEngine {
        let mut engine = MctsEngine::new(state, MctsSettings {
            max_iterations: iterations,
            seed,
            ..MctsSettings::default()
        });
        engine.run().unwrap();
        engine
    }

    #[test]
    fn test_finds_unique_two_by_two_fill() {
        crate::logging::init_logger(true);
        let state = state_for(&Layout::open(2, 2), &["ab", "cd", "ac", "bd"]);
        let engine = search(state, 200, 0);
        let best = engine.best_state();
        best.check_valid();
        assert!(best.is_terminal());
        assert!((best.reward() - 1.0).abs() < 1e-9);
        assert_eq!(best.filled_entries(), 4);
    }

    #[test]
    fn test_partial_fill_when_downs_cannot_be_satisfied() {
        let state = state_for(&Layout::open(2, 2), &["ab", "cd"]);
        let engine = search(state, 200, 0);
        let best = engine.best_state();
        assert!(best.is_terminal());
        assert!(best.reward() <= 0.5 + 1e-9);
        // The tiny tree runs dry long before the budget
        assert!(engine.iterations_run() < 200);
        assert!(engine.nodes[ROOT].exhausted);
    }

    #[test]
    fn test_terminal_root_runs_no_iterations() {
        let layout = Layout::from_csv_str(",0,1\n0,_,\n1,,_\n").unwrap();
        let state = state_for(&layout, &["ab"]);
        let engine = search(state, 100, 0);
        assert_eq!(engine.iterations_run(), 0);
        assert_eq!(engine.tree_size(), 1);
        assert!((engine.best_state().reward() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_history_tracks_monotone_best_reward() {
        let state = state_for(&Layout::open(3, 3),
                              &["cat", "are", "ten", "car", "ate", "ren"]);
        let engine = search(state, 100, 7);
        let history = engine.history();
        assert!(!history.is_empty());
        for window in history.windows(2) {
            assert!(window[1].best_reward_so_far >= window[0].best_reward_so_far);
            assert_eq!(window[1].iteration, window[0].iteration + 1);
        }
    }

    #[test]
    fn test_stop_on_full_fill() {
        let state = state_for(&Layout::open(2, 2), &["ab", "cd", "ac", "bd"]);
        let mut engine = MctsEngine::new(state, MctsSettings {
            max_iterations: 10_000,
            seed: 0,
            stop_on_full_fill: true,
            ..MctsSettings::default()
        });
        engine.run().unwrap();
        assert!(engine.iterations_run() < 10_000);
        assert!((engine.best_state().reward() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_result() {
        let words = ["cat", "are", "ten", "car", "ate", "ren"];
        let first = {
            let engine = search(state_for(&Layout::open(3, 3), &words), 50, 3);
            engine.best_state().to_string()
        };
        let second = {
            let engine = search(state_for(&Layout::open(3, 3), &words), 50, 3);
            engine.best_state().to_string()
        };
        assert_eq!(first, second);
    }
}
