use crate::model::ARENA_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Cell {
    Empty,
    Wall,
    Obstacle,
}

/// Square arena. The outer ring is wall for the whole life of the grid.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    cells: Vec<Cell>,
}

impl Grid {
    pub(crate) fn new() -> Self {
        let mut g = Self {
            cells: vec![Cell::Empty; ARENA_SIZE * ARENA_SIZE],
        };
        g.initialize();
        g
    }

    pub(crate) fn initialize(&mut self) {
        for row in 0..ARENA_SIZE {
            for col in 0..ARENA_SIZE {
                let i = idx(row, col);
                self.cells[i] = if is_ring(row, col) {
                    Cell::Wall
                } else {
                    Cell::Empty
                };
            }
        }
    }

    pub(crate) fn size(&self) -> usize {
        ARENA_SIZE
    }

    /// Anything outside the arena reads as wall.
    pub(crate) fn cell_at(&self, row: usize, col: usize) -> Cell {
        if row >= ARENA_SIZE || col >= ARENA_SIZE {
            return Cell::Wall;
        }
        self.cells[idx(row, col)]
    }

    pub(crate) fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        debug_assert!(
            !is_ring(row, col),
            "attempted to overwrite ring cell ({row}, {col})"
        );
        self.cells[idx(row, col)] = cell;
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(ARENA_SIZE)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

fn idx(row: usize, col: usize) -> usize {
    row * ARENA_SIZE + col
}

pub(crate) fn is_ring(row: usize, col: usize) -> bool {
    row == 0 || col == 0 || row == ARENA_SIZE - 1 || col == ARENA_SIZE - 1
}
