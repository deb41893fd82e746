use log::debug;
use std::collections::HashMap;
use std::fmt;

mod builder;
mod cell;
mod entry;

pub use builder::{Layout, LayoutCell, LayoutSource};
pub use cell::{Cell, CellKind};
pub use entry::{Crossing, Entry};

use crate::error::FillError;

/// Entries shorter than this are not entries at all; the cells of a
/// length-1 run simply take part in no entry of that axis.
pub const MIN_ENTRY_LENGTH: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    pub fn rotate(&self) -> Self {
        match self {
            Direction::Across => Direction::Down,
            Direction::Down => Direction::Across,
        }
    }
}

#[derive(Clone, Copy, Eq, Hash, PartialOrd, Ord)]
pub struct Location(pub usize, pub usize);

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Location({}, {})", self.0, self.1)
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Location) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}

/// Static geometry of one puzzle: the cells, the entries derived from them
/// and the crossing relation. Built once from a layout and immutable for
/// the duration of a run.
pub struct CrosswordGrid {
    num_rows: usize,
    num_cols: usize,
    cell_map: HashMap<Location, Cell>,
    entries: Vec<Entry>,
}

impl fmt::Debug for CrosswordGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let entry_strs: Vec<String> = self.entries.iter()
            .map(|e| format!("{}: {:?} {:?} len {}", e.id(), e.direction(), e.cell(0), e.len()))
            .collect();
        write!(f, "CrosswordGrid({}x{}\nEntries:{:#?})",
               self.num_rows, self.num_cols, entry_strs)
    }
}

impl CrosswordGrid {
    /// Derive the entry list and crossing relation from a layout. Across
    /// entries are numbered first in row order, then down entries in column
    /// order, so ids are stable for a given layout.
    pub fn build(layout: &Layout) -> Result<Self, FillError> {
        let num_rows = layout.num_rows();
        let num_cols = layout.num_cols();
        let mut cell_map: HashMap<Location, Cell> = HashMap::new();
        for row in 0..num_rows {
            for col in 0..num_cols {
                let kind = match layout.cell(row, col) {
                    LayoutCell::Blocked => CellKind::Blocked,
                    LayoutCell::Open => CellKind::Free,
                    LayoutCell::Letter(letter) => CellKind::Fixed(letter),
                };
                cell_map.insert(Location(row, col), Cell::new(kind));
            }
        }

        let mut grid = CrosswordGrid {
            num_rows,
            num_cols,
            cell_map,
            entries: vec![],
        };
        grid.scan_entries();
        grid.link_crossings();
        debug!("Built grid {:?}", grid);
        Ok(grid)
    }

    fn scan_entries(&mut self) {
        for row in 0..self.num_rows {
            let mut run: Vec<Location> = vec![];
            for col in 0..self.num_cols {
                let location = Location(row, col);
                if self.cell_map.get(&location).unwrap().is_open() {
                    run.push(location);
                } else {
                    self.finish_run(&mut run, Direction::Across);
                }
            }
            self.finish_run(&mut run, Direction::Across);
        }
        for col in 0..self.num_cols {
            let mut run: Vec<Location> = vec![];
            for row in 0..self.num_rows {
                let location = Location(row, col);
                if self.cell_map.get(&location).unwrap().is_open() {
                    run.push(location);
                } else {
                    self.finish_run(&mut run, Direction::Down);
                }
            }
            self.finish_run(&mut run, Direction::Down);
        }
    }

    fn finish_run(&mut self, run: &mut Vec<Location>, direction: Direction) {
        if run.len() >= MIN_ENTRY_LENGTH {
            let id = self.entries.len();
            let cells = std::mem::replace(run, vec![]);
            for (offset, location) in cells.iter().enumerate() {
                self.cell_map.get_mut(location).unwrap().set_slot(direction, id, offset);
            }
            self.entries.push(Entry::new(id, direction, cells));
        } else {
            run.clear();
        }
    }

    fn link_crossings(&mut self) {
        // For every cell lying in both an across and a down entry, point
        // each entry at the other
        let mut links: Vec<(usize, usize, usize, usize)> = vec![];
        for cell in self.cell_map.values() {
            if let (Some((across, across_offset)), Some((down, down_offset))) =
                (cell.slot(Direction::Across), cell.slot(Direction::Down)) {
                links.push((across, across_offset, down, down_offset));
            }
        }
        for (across, across_offset, down, down_offset) in links {
            self.entries[across].set_crossing(across_offset, Crossing {
                entry: down,
                position: down_offset,
            });
            self.entries[down].set_crossing(down_offset, Crossing {
                entry: across,
                position: across_offset,
            });
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, id: usize) -> &Entry {
        &self.entries[id]
    }

    pub fn cell(&self, location: Location) -> Option<&Cell> {
        self.cell_map.get(&location)
    }

    pub fn is_open(&self, location: Location) -> bool {
        self.cell_map.get(&location).map_or(false, |cell| cell.is_open())
    }

    pub fn fixed_letter(&self, location: Location) -> Option<char> {
        self.cell_map.get(&location).and_then(|cell| cell.fixed_letter())
    }

    pub fn max_entry_length(&self) -> usize {
        self.entries.iter().map(|entry| entry.len()).max().unwrap_or(0)
    }

    pub fn count_intersections(&self) -> usize {
        self.cell_map.values().filter(|cell| cell.is_intersection()).count()
    }
}
