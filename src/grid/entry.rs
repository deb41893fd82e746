use super::{Direction, Location};

/// Pointer from one position of an entry to the entry crossing it there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Crossing {
    pub entry: usize,
    pub position: usize,
}

/// A maximal run of at least two open cells along one axis. Geometry only;
/// the letters and candidates live in the search state.
#[derive(Clone, Debug)]
pub struct Entry {
    id: usize,
    direction: Direction,
    cells: Vec<Location>,
    crossings: Vec<Option<Crossing>>,
}

impl Entry {
    pub(super) fn new(id: usize, direction: Direction, cells: Vec<Location>) -> Self {
        let length = cells.len();
        Entry {
            id,
            direction,
            cells,
            crossings: vec![None; length],
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Location] {
        &self.cells
    }

    pub fn cell(&self, position: usize) -> Location {
        self.cells[position]
    }

    pub fn crossings(&self) -> &[Option<Crossing>] {
        &self.crossings
    }

    pub fn crossing_at(&self, position: usize) -> Option<Crossing> {
        self.crossings[position]
    }

    pub(super) fn set_crossing(&mut self, position: usize, crossing: Crossing) {
        self.crossings[position] = Some(crossing);
    }
}
