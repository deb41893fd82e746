use log::trace;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::FillError;
use crate::grid::{CrosswordGrid, Direction, Location};
use crate::words::{WordBank, WordId};

/// One move available to the search: place `word` into entry `entry`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Action {
    pub entry: usize,
    pub word: WordId,
}

/// Per-entry bookkeeping: the letters committed so far, the word placed
/// here (if any), and the catalogue words still compatible. Candidates are
/// kept sorted so narrowing them is a linear merge.
#[derive(Clone, Debug)]
struct Slot {
    pattern: Vec<Option<char>>,
    assigned: Option<WordId>,
    candidates: Vec<WordId>,
}

/// A partial assignment of words to entries. Cloning duplicates only the
/// per-entry slots; the grid and the word bank are shared by reference,
/// which is what makes the search's clone-per-child protocol cheap.
#[derive(Clone, Debug)]
pub struct CrosswordState {
    grid: Rc<CrosswordGrid>,
    bank: Rc<WordBank>,
    slots: Vec<Slot>,
    filled: usize,
}

impl CrosswordState {
    /// Starting state for a grid: patterns seeded from fixed cells,
    /// candidate sets from the bank. An entry whose pattern is already
    /// complete starts filled (when its word is in the bank and unused on
    /// its axis), so a grid written out by a previous run loads back as a
    /// terminal state with the same reward.
    pub fn initial(grid: Rc<CrosswordGrid>, bank: Rc<WordBank>) -> Result<Self, FillError> {
        let mut slots: Vec<Slot> = vec![];
        for entry in grid.entries() {
            let pattern: Vec<Option<char>> = entry.cells().iter()
                .map(|&location| grid.fixed_letter(location))
                .collect();
            let constraints: Vec<(usize, char)> = pattern.iter().enumerate()
                .filter_map(|(position, letter)| letter.map(|l| (position, l)))
                .collect();
            let candidates = bank.matching(entry.len(), &constraints);
            slots.push(Slot {
                pattern,
                assigned: None,
                candidates,
            });
        }
        let mut state = CrosswordState {
            grid,
            bank,
            slots,
            filled: 0,
        };
        state.assign_predetermined()?;
        Ok(state)
    }

    fn assign_predetermined(&mut self) -> Result<(), FillError> {
        loop {
            let mut action: Option<Action> = None;
            for (id, slot) in self.slots.iter().enumerate() {
                if slot.assigned.is_some() || slot.pattern.iter().any(|l| l.is_none()) {
                    continue;
                }
                // A fully constrained pattern leaves at most one candidate
                if let Some(&word) = slot.candidates.first() {
                    action = Some(Action { entry: id, word });
                    break;
                }
            }
            match action {
                Some(action) => self.commit(action)?,
                None => return Ok(()),
            }
        }
    }

    /// Fail-first: enumerate the candidate words of the unfilled entry with
    /// the fewest remaining candidates (non-empty; ties broken by smallest
    /// entry id). An entry whose candidate set is empty can never be filled
    /// and is passed over so the rest of the grid can still improve.
    pub fn legal_actions(&self) -> Vec<Action> {
        match self.next_entry() {
            Some(entry) => self.slots[entry].candidates.iter()
                .map(|&word| Action { entry, word })
                .collect(),
            None => vec![],
        }
    }

    fn next_entry(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (id, slot) in self.slots.iter().enumerate() {
            if slot.assigned.is_some() || slot.candidates.is_empty() {
                continue;
            }
            let key = (slot.candidates.len(), id);
            if best.map_or(true, |current| key < current) {
                best = Some(key);
            }
        }
        best.map(|(_count, id)| id)
    }

    /// Uniformly sample one legal action. None means the state is terminal.
    pub fn random_action(&self, rng: &mut StdRng) -> Option<Action> {
        self.legal_actions().choose(rng).copied()
    }

    pub fn is_terminal(&self) -> bool {
        self.next_entry().is_none()
    }

    /// Fraction of entries filled. A grid without entries counts as fully
    /// filled (empty product).
    pub fn reward(&self) -> f64 {
        if self.slots.is_empty() {
            1.0
        } else {
            self.filled as f64 / self.slots.len() as f64
        }
    }

    /// Child state with one more entry filled. The parent is left intact
    /// for its siblings; see `commit` for the propagation protocol.
    pub fn apply(&self, action: Action) -> Result<CrosswordState, FillError> {
        let mut child = self.clone();
        child.commit(action)?;
        Ok(child)
    }

    fn commit(&mut self, action: Action) -> Result<(), FillError> {
        let grid = Rc::clone(&self.grid);
        let bank = Rc::clone(&self.bank);
        let entry = grid.entry(action.entry);
        let word: Vec<char> = bank.word(action.word).chars().collect();
        trace!("Placing {} in entry {}", bank.word(action.word), action.entry);

        if word.len() != entry.len() {
            return Err(FillError::Internal(
                format!("word {} does not fit entry {} of length {}",
                        bank.word(action.word), action.entry, entry.len())));
        }
        {
            let slot = &mut self.slots[action.entry];
            if slot.assigned.is_some() {
                return Err(FillError::Internal(
                    format!("entry {} is already filled", action.entry)));
            }
            for (position, &letter) in word.iter().enumerate() {
                if let Some(committed) = slot.pattern[position] {
                    if committed != letter {
                        return Err(FillError::Internal(
                            format!("word {} clashes with pattern of entry {} at position {}",
                                    bank.word(action.word), action.entry, position)));
                    }
                }
            }
            slot.pattern = word.iter().map(|&letter| Some(letter)).collect();
            slot.assigned = Some(action.word);
            slot.candidates.clear();
        }
        self.filled += 1;

        // Propagate into immediate neighbours only; second-order effects
        // surface when a neighbour is itself chosen later
        for (position, crossing) in entry.crossings().iter().enumerate() {
            let crossing = match crossing {
                Some(crossing) => *crossing,
                None => continue,
            };
            let letter = word[position];
            let other = &mut self.slots[crossing.entry];
            match other.pattern[crossing.position] {
                Some(committed) => {
                    if committed != letter {
                        return Err(FillError::Internal(
                            format!("crossing of entries {} and {} disagrees: {} vs {}",
                                    action.entry, crossing.entry, letter, committed)));
                    }
                },
                None => {
                    other.pattern[crossing.position] = Some(letter);
                    other.candidates = bank.restrict(
                        &other.candidates,
                        grid.entry(crossing.entry).len(),
                        crossing.position,
                        letter);
                },
            }
        }

        // A placed word is spent for the rest of its axis
        let direction = entry.direction();
        for (id, slot) in self.slots.iter_mut().enumerate() {
            if id == action.entry || slot.assigned.is_some() {
                continue;
            }
            if grid.entry(id).direction() != direction {
                continue;
            }
            if let Ok(index) = slot.candidates.binary_search(&action.word) {
                slot.candidates.remove(index);
            }
        }
        Ok(())
    }

    pub fn grid(&self) -> &CrosswordGrid {
        &self.grid
    }

    pub fn total_entries(&self) -> usize {
        self.slots.len()
    }

    pub fn filled_entries(&self) -> usize {
        self.filled
    }

    pub fn assigned_word(&self, entry: usize) -> Option<&str> {
        self.slots[entry].assigned.map(|word| self.bank.word(word))
    }

    pub fn pattern(&self, entry: usize) -> &[Option<char>] {
        &self.slots[entry].pattern
    }

    pub fn candidates(&self, entry: usize) -> &[WordId] {
        &self.slots[entry].candidates
    }

    /// Letter currently committed at a cell, from whichever entry runs
    /// through it; fixed letters outside any entry are reported as well.
    pub fn letter_at(&self, location: Location) -> Option<char> {
        let cell = self.grid.cell(location)?;
        if !cell.is_open() {
            return None;
        }
        for &direction in [Direction::Across, Direction::Down].iter() {
            if let Some((entry, offset)) = cell.slot(direction) {
                if let Some(letter) = self.slots[entry].pattern[offset] {
                    return Some(letter);
                }
            }
        }
        cell.fixed_letter()
    }

    pub fn to_string(&self) -> String {
        let mut string: String = String::from("");
        for row in 0..self.grid.num_rows() {
            for col in 0..self.grid.num_cols() {
                let location = Location(row, col);
                let c = if self.grid.is_open(location) {
                    self.letter_at(location).unwrap_or('_')
                } else {
                    '#'
                };
                string.push(c);
            }
            string.push('\n');
        }
        string
    }

    /// Panics if any bookkeeping invariant is broken. Test support.
    pub fn check_valid(&self) {
        let mut used: HashMap<(Direction, WordId), usize> = HashMap::new();
        for (id, slot) in self.slots.iter().enumerate() {
            let entry = self.grid.entry(id);
            assert_eq!(slot.pattern.len(), entry.len());

            if let Some(word_id) = slot.assigned {
                let word: Vec<Option<char>> = self.bank.word(word_id).chars().map(Some).collect();
                assert_eq!(slot.pattern, word,
                           "assigned word of entry {} disagrees with its pattern", id);
                if let Some(previous) = used.insert((entry.direction(), word_id), id) {
                    panic!("word {} placed in entries {} and {} of the same direction",
                           self.bank.word(word_id), previous, id);
                }
            } else {
                for &word_id in &slot.candidates {
                    let word: Vec<char> = self.bank.word(word_id).chars().collect();
                    assert_eq!(word.len(), entry.len());
                    for (position, &letter) in word.iter().enumerate() {
                        if let Some(committed) = slot.pattern[position] {
                            assert_eq!(committed, letter,
                                       "candidate {} of entry {} clashes at position {}",
                                       self.bank.word(word_id), id, position);
                        }
                    }
                }
            }

            for (position, crossing) in entry.crossings().iter().enumerate() {
                if let Some(crossing) = crossing {
                    let other = &self.slots[crossing.entry];
                    if let (Some(a), Some(b)) =
                        (slot.pattern[position], other.pattern[crossing.position]) {
                        assert_eq!(a, b, "crossing of entries {} and {} disagrees",
                                   id, crossing.entry);
                    }
                }
            }
        }
        assert_eq!(self.filled,
                   self.slots.iter().filter(|slot| slot.assigned.is_some()).count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Layout;
    use rand::SeedableRng;

    fn state_for(layout: &Layout, words: &[&str]) -> CrosswordState {
        let grid = CrosswordGrid::build(layout).unwrap();
        let max_length = grid.max_entry_length();
        let bank = WordBank::build(words.iter().copied(), max_length, None);
        CrosswordState::initial(Rc::new(grid), Rc::new(bank)).unwrap()
    }

    #[test]
    fn test_initial_state_candidates() {
        crate::logging::init_logger(true);
        let state = state_for(&Layout::open(2, 2), &["ab", "cd", "ac", "bd"]);
        assert_eq!(state.total_entries(), 4);
        assert_eq!(state.filled_entries(), 0);
        assert!(!state.is_terminal());
        for entry in 0..4 {
            assert_eq!(state.candidates(entry).len(), 4);
            assert_eq!(state.pattern(entry), &[None, None]);
        }
        state.check_valid();
    }

    #[test]
    fn test_initial_state_seeds_fixed_letters() {
        let layout = Layout::from_csv_str(",0,1\n0,A,_\n1,_,_\n").unwrap();
        let state = state_for(&layout, &["ab", "cd", "ac", "bd"]);
        assert_eq!(state.pattern(0), &[Some('A'), None]);
        let candidates: Vec<&str> = state.candidates(0).iter()
            .map(|&id| state.bank.word(id)).collect();
        assert_eq!(candidates, vec!["AB", "AC"]);
        state.check_valid();
    }

    #[test]
    fn test_apply_propagates_to_crossings() {
        let state = state_for(&Layout::open(2, 2), &["ab", "cd", "ac", "bd"]);
        let actions = state.legal_actions();
        // Fail-first ties resolve to the smallest entry id
        assert!(actions.iter().all(|action| action.entry == 0));
        assert_eq!(actions.len(), 4);

        let ab = actions.iter()
            .find(|action| state.bank.word(action.word) == "AB")
            .copied().unwrap();
        let child = state.apply(ab).unwrap();
        child.check_valid();
        assert_eq!(child.filled_entries(), 1);
        assert_eq!(child.assigned_word(0), Some("AB"));
        // Crossing letters are committed into the down entries
        assert_eq!(child.pattern(2), &[Some('A'), None]);
        assert_eq!(child.pattern(3), &[Some('B'), None]);
        let down_candidates: Vec<&str> = child.candidates(2).iter()
            .map(|&id| child.bank.word(id)).collect();
        assert_eq!(down_candidates, vec!["AB", "AC"]);
        // The parent is untouched
        assert_eq!(state.filled_entries(), 0);
        assert_eq!(state.candidates(0).len(), 4);
    }

    #[test]
    fn test_placed_word_is_spent_on_its_axis() {
        let state = state_for(&Layout::open(2, 2), &["ab", "cd", "ac", "bd"]);
        let ab = state.legal_actions().iter()
            .find(|action| state.bank.word(action.word) == "AB")
            .copied().unwrap();
        let child = state.apply(ab).unwrap();
        // The other across entry loses AB; the down entries may still use it
        assert!(!child.candidates(1).contains(&ab.word));
        assert!(child.candidates(2).contains(&ab.word));
    }

    #[test]
    fn test_fail_first_prefers_most_constrained_entry() {
        let state = state_for(&Layout::open(2, 2), &["ab", "cd", "ac", "bd"]);
        let ab = state.legal_actions().iter()
            .find(|action| state.bank.word(action.word) == "AB")
            .copied().unwrap();
        let child = state.apply(ab).unwrap();
        // Candidate counts are now 3 (entry 1), 2 (entry 2) and 1 (entry 3)
        let actions = child.legal_actions();
        assert_eq!(actions.len(), 1);
        assert!(actions.iter().all(|action| action.entry == 3));
        assert_eq!(child.bank.word(actions[0].word), "BD");
    }

    #[test]
    fn test_dead_entry_is_passed_over() {
        // Centre fixed to X and no word carries an X: both middle entries
        // are born dead, the rest of the grid still plays out
        let layout = Layout::from_csv_str(
            ",0,1,2\n0,_,_,_\n1,_,X,_\n2,_,_,_\n").unwrap();
        let state = state_for(&layout, &["cat", "are", "ten", "car", "ate", "ren"]);
        assert!(state.candidates(1).is_empty());
        assert!(!state.is_terminal());
        let actions = state.legal_actions();
        assert!(!actions.is_empty());
        assert!(actions.iter().all(|action| action.entry != 1 && action.entry != 4));
    }

    #[test]
    fn test_terminal_when_all_unfilled_entries_dead() {
        let state = state_for(&Layout::open(2, 2), &["ab", "cd"]);
        let mut rng = StdRng::seed_from_u64(0);
        let mut current = state;
        while let Some(action) = current.random_action(&mut rng) {
            current = current.apply(action).unwrap();
            current.check_valid();
        }
        assert!(current.is_terminal());
        // Both across entries fill, neither down entry can
        assert_eq!(current.filled_entries(), 2);
        assert!((current.reward() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_reward_of_empty_grid_is_one() {
        let layout = Layout::from_csv_str(",0,1\n0,_,\n1,,_\n").unwrap();
        let state = state_for(&layout, &["ab"]);
        assert!(state.is_terminal());
        assert!((state.reward() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fully_fixed_entries_start_assigned() {
        let layout = Layout::from_csv_str(",0,1\n0,A,B\n1,C,D\n").unwrap();
        let state = state_for(&layout, &["ab", "cd", "ac", "bd"]);
        assert!(state.is_terminal());
        assert_eq!(state.filled_entries(), 4);
        assert!((state.reward() - 1.0).abs() < 1e-9);
        assert_eq!(state.assigned_word(0), Some("AB"));
        state.check_valid();
    }

    #[test]
    fn test_to_string_rendering() {
        let layout = Layout::from_csv_str(",0,1\n0,A,B\n1,,_\n").unwrap();
        let state = state_for(&layout, &["ab"]);
        assert_eq!(state.to_string(), "AB\n#_\n");
    }
}
