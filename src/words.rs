use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use crate::error::FillError;
use crate::{expand_glob, sniff_delimiter};

static ENGLISH_DICTIONARY: &str = include_str!("../data/english.txt");

pub const MIN_WORD_LENGTH: usize = 2;

/// Index of a word inside the bank. Ids are dense and assigned in sorted
/// order, so every posting list is canonically ordered.
pub type WordId = usize;

/// Where the catalogue comes from: the dictionary shipped with the binary,
/// or CSV files carrying an `answer` column.
#[derive(Clone, Debug)]
pub enum WordSource {
    Dictionary,
    Files(Vec<PathBuf>),
}

impl WordSource {
    /// Expand an optional path-or-glob into a concrete source.
    pub fn from_pattern(pattern: Option<&str>) -> Result<Self, FillError> {
        match pattern {
            None => Ok(WordSource::Dictionary),
            Some(pattern) => {
                let paths = expand_glob(pattern).map_err(FillError::InvalidWordList)?;
                if paths.is_empty() {
                    return Err(FillError::InvalidWordList(
                        format!("no word files match {}", pattern)));
                }
                Ok(WordSource::Files(paths))
            },
        }
    }

    pub fn load(&self) -> Result<Vec<String>, FillError> {
        match self {
            WordSource::Dictionary => {
                Ok(ENGLISH_DICTIONARY.lines().map(|line| line.to_string()).collect())
            },
            WordSource::Files(paths) => {
                let mut words: Vec<String> = vec![];
                for path in paths {
                    words.append(&mut read_answer_column(path)?);
                }
                Ok(words)
            },
        }
    }
}

fn read_answer_column(path: &PathBuf) -> Result<Vec<String>, FillError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| FillError::InvalidWordList(
            format!("cannot read {}: {}", path.display(), e)))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(&contents))
        .from_reader(contents.as_bytes());
    let answer_index = reader.headers()
        .map_err(|e| FillError::InvalidWordList(
            format!("malformed CSV in {}: {}", path.display(), e)))?
        .iter()
        .position(|header| header.trim() == "answer")
        .ok_or_else(|| FillError::InvalidWordList(
            format!("{} has no answer column", path.display())))?;

    let mut words: Vec<String> = vec![];
    for record in reader.records() {
        let record = record
            .map_err(|e| FillError::InvalidWordList(
                format!("malformed CSV in {}: {}", path.display(), e)))?;
        if let Some(field) = record.get(answer_index) {
            words.push(field.to_string());
        }
    }
    debug!("Read {} words from {}", words.len(), path.display());
    Ok(words)
}

/// Immutable word catalogue, bucketed by length, with a posting list of word
/// ids precomputed for every (length, position, letter) triple. Pattern
/// queries intersect posting lists instead of scanning words.
#[derive(Debug)]
pub struct WordBank {
    words: Vec<String>,
    buckets: HashMap<usize, Vec<WordId>>,
    postings: HashMap<(usize, usize, char), Vec<WordId>>,
}

impl WordBank {
    /// Normalise and index raw words: trim, uppercase, keep all-letter
    /// strings of length 2..=max_length, deduplicate keeping the first
    /// occurrence, then cap before ids are assigned.
    pub fn build<I, S>(raw_words: I, max_length: usize, max_num_words: Option<usize>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut accepted: Vec<String> = vec![];
        for raw in raw_words {
            let word = raw.as_ref().trim().to_uppercase();
            if word.len() < MIN_WORD_LENGTH || word.len() > max_length {
                continue;
            }
            if !word.chars().all(|c| c.is_ascii_uppercase()) {
                continue;
            }
            if seen.insert(word.clone()) {
                accepted.push(word);
            }
        }
        if let Some(cap) = max_num_words {
            accepted.truncate(cap);
        }
        accepted.sort();

        let mut buckets: HashMap<usize, Vec<WordId>> = HashMap::new();
        let mut postings: HashMap<(usize, usize, char), Vec<WordId>> = HashMap::new();
        for (id, word) in accepted.iter().enumerate() {
            buckets.entry(word.len()).or_insert_with(Vec::new).push(id);
            for (position, letter) in word.chars().enumerate() {
                postings.entry((word.len(), position, letter))
                    .or_insert_with(Vec::new)
                    .push(id);
            }
        }
        info!("Built word bank with {} words over {} lengths",
              accepted.len(), buckets.len());
        WordBank { words: accepted, buckets, postings }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, id: WordId) -> &str {
        &self.words[id]
    }

    pub fn ids_of_length(&self, length: usize) -> &[WordId] {
        self.buckets.get(&length).map(|bucket| bucket.as_slice()).unwrap_or(&[])
    }

    fn posting(&self, length: usize, position: usize, letter: char) -> &[WordId] {
        self.postings.get(&(length, position, letter))
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// All words of the given length carrying every required letter.
    /// With no constraints this is the whole bucket.
    pub fn matching(&self, length: usize, constraints: &[(usize, char)]) -> Vec<WordId> {
        if constraints.is_empty() {
            return self.ids_of_length(length).to_vec();
        }
        let mut lists: Vec<&[WordId]> = constraints.iter()
            .map(|&(position, letter)| self.posting(length, position, letter))
            .collect();
        // Intersections run in linear time over the shortest list
        lists.sort_by_key(|list| list.len());
        let mut result = lists[0].to_vec();
        for list in &lists[1..] {
            if result.is_empty() {
                break;
            }
            result = intersect_sorted(&result, list);
        }
        result
    }

    /// Narrow an existing candidate list by one newly committed letter.
    pub fn restrict(&self, candidates: &[WordId], length: usize,
                    position: usize, letter: char) -> Vec<WordId> {
        intersect_sorted(candidates, self.posting(length, position, letter))
    }
}

fn intersect_sorted(a: &[WordId], b: &[WordId]) -> Vec<WordId> {
    let mut result: Vec<WordId> = vec![];
    let mut index_a = 0;
    let mut index_b = 0;
    while index_a < a.len() && index_b < b.len() {
        if a[index_a] == b[index_b] {
            result.push(a[index_a]);
            index_a += 1;
            index_b += 1;
        } else if a[index_a] < b[index_b] {
            index_a += 1;
        } else {
            index_b += 1;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;
    use rstest::rstest;

    #[test]
    fn test_build_normalises_and_filters() {
        crate::logging::init_logger(true);
        let bank = WordBank::build(
            vec![" cat ", "dog", "CAT", "it's", "x", "dog", "zebra", "émigré"],
            5, None);
        assert_eq!(bank.len(), 3);
        let ids = bank.ids_of_length(3);
        let words: Vec<&str> = ids.iter().map(|&id| bank.word(id)).collect();
        assert_eq!(words, vec!["CAT", "DOG"]);
        assert_eq!(bank.ids_of_length(5).len(), 1);
        assert_eq!(bank.ids_of_length(4).len(), 0);
    }

    #[test]
    fn test_cap_keeps_first_words_in_input_order() {
        let bank = WordBank::build(vec!["tap", "cat", "dog", "ant"], 5, Some(2));
        assert_eq!(bank.len(), 2);
        let words: Vec<&str> = bank.ids_of_length(3).iter().map(|&id| bank.word(id)).collect();
        // TAP and CAT survive the cap; ids are assigned after sorting
        assert_eq!(words, vec!["CAT", "TAP"]);
    }

    #[test]
    fn test_length_filter_respects_max() {
        let bank = WordBank::build(vec!["ab", "abc", "abcd"], 3, None);
        assert_eq!(bank.len(), 2);
        assert!(bank.ids_of_length(4).is_empty());
    }

    #[rstest(constraints, expected,
        case(vec![], vec!["ARE", "ATE", "CAR", "CAT", "REN", "TEN"]),
        case(vec![(0, 'C')], vec!["CAR", "CAT"]),
        case(vec![(0, 'C'), (2, 'T')], vec!["CAT"]),
        case(vec![(1, 'E')], vec!["REN", "TEN"]),
        case(vec![(0, 'C'), (1, 'E')], vec![]),
    )]
    fn test_matching(constraints: Vec<(usize, char)>, expected: Vec<&str>) {
        let bank = WordBank::build(vec!["cat", "are", "ten", "car", "ate", "ren"], 3, None);
        let found: Vec<&str> = bank.matching(3, &constraints)
            .iter().map(|&id| bank.word(id)).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_restrict_narrows_candidates() {
        let bank = WordBank::build(vec!["cat", "car", "cab", "con"], 3, None);
        let all = bank.matching(3, &[]);
        let with_a = bank.restrict(&all, 3, 1, 'A');
        let words: Vec<&str> = with_a.iter().map(|&id| bank.word(id)).collect();
        assert_eq!(words, vec!["CAB", "CAR", "CAT"]);
        let with_a_b = bank.restrict(&with_a, 3, 2, 'B');
        assert_eq!(with_a_b.len(), 1);
        assert_eq!(bank.word(with_a_b[0]), "CAB");
    }

    #[test]
    fn test_missing_word_file_is_invalid() {
        let source = WordSource::Files(vec![PathBuf::from("definitely/not/here.csv")]);
        assert_matches!(source.load(), Err(FillError::InvalidWordList(_)));
    }

    #[test]
    fn test_word_file_without_answer_column_is_invalid() {
        let directory = std::env::temp_dir().join("crossword_filler_tests").join("words");
        fs::create_dir_all(&directory).unwrap();
        let path = directory.join("no_answer.csv");
        fs::write(&path, "word,clue\nAB,first\n").unwrap();
        let source = WordSource::Files(vec![path]);
        assert_matches!(source.load(), Err(FillError::InvalidWordList(_)));
    }

    #[test]
    fn test_dictionary_source_is_usable() {
        let words = WordSource::Dictionary.load().unwrap();
        assert!(words.len() > 500);
        let bank = WordBank::build(words, 12, Some(20_000));
        assert!(!bank.is_empty());
        assert!(!bank.ids_of_length(3).is_empty());
        assert!(!bank.ids_of_length(5).is_empty());
    }

    #[test]
    fn test_intersect_sorted() {
        assert_eq!(intersect_sorted(&[1, 3, 5, 7], &[2, 3, 7, 9]), vec![3, 7]);
        assert_eq!(intersect_sorted(&[], &[1, 2]), Vec::<WordId>::new());
        assert_eq!(intersect_sorted(&[4], &[4]), vec![4]);
    }
}
