use crate::grid::{Cell, Grid};
use rand::Rng;

/// Drops a new obstacle into row 1 at a random interior column.
/// An obstacle already sitting there is silently replaced.
pub(crate) fn spawn<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) -> usize {
    let col = rng.gen_range(1..=grid.size() - 2);
    grid.set_cell(1, col, Cell::Obstacle);
    col
}

/// Moves every obstacle one row down. Returns how many fell off the arena.
pub(crate) fn advance(grid: &mut Grid) -> usize {
    let size = grid.size();
    let mut removed = 0;

    // bottom-up, so an obstacle moved into row r is not visited again
    for row in (1..size - 1).rev() {
        for col in 1..size - 1 {
            if grid.cell_at(row, col) != Cell::Obstacle {
                continue;
            }
            grid.set_cell(row, col, Cell::Empty);
            if grid.cell_at(row + 1, col) == Cell::Wall {
                removed += 1;
                continue;
            }
            grid.set_cell(row + 1, col, Cell::Obstacle);
        }
    }
    removed
}

pub(crate) fn count(grid: &Grid) -> usize {
    grid.rows()
        .flat_map(|r| r.iter())
        .filter(|&&c| c == Cell::Obstacle)
        .count()
}
