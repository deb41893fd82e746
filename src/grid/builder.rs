use log::debug;
use ndarray::Array2;
use std::fs;
use std::path::Path;

use crate::error::FillError;
use crate::{expand_glob, sniff_delimiter};

use super::Location;

static VALIDCHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// One cell of a layout before entries are derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutCell {
    Blocked,
    Open,
    Letter(char),
}

/// Rectangular map of blocked, open and pre-seeded cells.
#[derive(Clone, Debug)]
pub struct Layout {
    cells: Array2<LayoutCell>,
}

impl Layout {
    /// All-open layout of the requested size.
    pub fn open(num_rows: usize, num_cols: usize) -> Self {
        Layout {
            cells: Array2::from_elem((num_rows, num_cols), LayoutCell::Open),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.cells.nrows()
    }

    pub fn num_cols(&self) -> usize {
        self.cells.ncols()
    }

    pub fn cell(&self, row: usize, col: usize) -> LayoutCell {
        self.cells[[row, col]]
    }

    pub fn from_file(path: &Path) -> Result<Self, FillError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| FillError::InvalidLayout(
                format!("cannot read {}: {}", path.display(), e)))?;
        debug!("Read layout file {}", path.display());
        Layout::from_csv_str(&contents)
    }

    /// Parse the CSV layout format: a header row of column indices, then one
    /// record per row whose first field is the row index. An empty field is
    /// a blocked cell, `_` is open, a single letter is a fixed cell.
    pub fn from_csv_str(contents: &str) -> Result<Self, FillError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(sniff_delimiter(contents))
            .flexible(true)
            .from_reader(contents.as_bytes());
        let header_width = reader.headers()
            .map_err(|e| FillError::InvalidLayout(format!("malformed CSV: {}", e)))?
            .len();

        let mut rows: Vec<Vec<LayoutCell>> = vec![];
        for record in reader.records() {
            let record = record
                .map_err(|e| FillError::InvalidLayout(format!("malformed CSV: {}", e)))?;
            if record.len() != header_width {
                return Err(FillError::InvalidLayout(
                    format!("row {} has {} fields, expected {}",
                            rows.len(), record.len(), header_width)));
            }
            let mut row: Vec<LayoutCell> = vec![];
            for field in record.iter().skip(1) {
                row.push(parse_cell(field)?);
            }
            rows.push(row);
        }
        if rows.is_empty() {
            return Err(FillError::InvalidLayout("layout has no rows".to_string()));
        }

        let num_rows = rows.len();
        let num_cols = rows[0].len();
        let flattened: Vec<LayoutCell> = rows.into_iter().flatten().collect();
        let cells = Array2::from_shape_vec((num_rows, num_cols), flattened)
            .map_err(|e| FillError::InvalidLayout(format!("not rectangular: {}", e)))?;
        Ok(Layout { cells })
    }

    /// Overlay another layout of the same shape onto this one. Fixed letters
    /// fill open cells; the blocked pattern must agree on both sides.
    pub fn merge(&mut self, other: &Layout) -> Result<(), FillError> {
        if self.cells.dim() != other.cells.dim() {
            return Err(FillError::InvalidLayout(
                format!("cannot merge a {}x{} layout into a {}x{} one",
                        other.num_rows(), other.num_cols(),
                        self.num_rows(), self.num_cols())));
        }
        for ((row, col), &incoming) in other.cells.indexed_iter() {
            let existing = self.cells[[row, col]];
            let merged = match (existing, incoming) {
                (a, b) if a == b => a,
                (LayoutCell::Open, LayoutCell::Letter(letter))
                | (LayoutCell::Letter(letter), LayoutCell::Open) => LayoutCell::Letter(letter),
                (LayoutCell::Letter(existing), LayoutCell::Letter(incoming)) => {
                    return Err(FillError::InconsistentFixedLetters {
                        location: Location(row, col),
                        existing,
                        incoming,
                    });
                },
                _ => {
                    return Err(FillError::InvalidLayout(
                        format!("blocked/open mismatch at row {}, column {}", row, col)));
                },
            };
            self.cells[[row, col]] = merged;
        }
        Ok(())
    }
}

fn parse_cell(field: &str) -> Result<LayoutCell, FillError> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(LayoutCell::Blocked);
    }
    if trimmed == "_" {
        return Ok(LayoutCell::Open);
    }
    let upper = trimmed.to_uppercase();
    let mut chars = upper.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) if VALIDCHARS.contains(letter) => Ok(LayoutCell::Letter(letter)),
        _ => Err(FillError::InvalidLayout(
            format!("unrecognised cell content {:?}", field))),
    }
}

/// Where the layout comes from: a fresh all-open grid of the requested size,
/// or existing CSV files matched by a path or glob. Several matched files
/// are overlaid with `Layout::merge`.
#[derive(Clone, Debug)]
pub enum LayoutSource {
    New { num_rows: usize, num_cols: usize },
    Existing(String),
}

impl LayoutSource {
    pub fn load(&self) -> Result<Layout, FillError> {
        match self {
            LayoutSource::New { num_rows, num_cols } => {
                Ok(Layout::open(*num_rows, *num_cols))
            },
            LayoutSource::Existing(pattern) => {
                let paths = expand_glob(pattern).map_err(FillError::InvalidLayout)?;
                if paths.is_empty() {
                    return Err(FillError::InvalidLayout(
                        format!("no layout files match {}", pattern)));
                }
                let mut layout = Layout::from_file(&paths[0])?;
                for path in &paths[1..] {
                    layout.merge(&Layout::from_file(path)?)?;
                }
                Ok(layout)
            },
        }
    }
}
