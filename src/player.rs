use crate::grid::{Cell, Grid};
use crate::model::{PLAYER_ROW, PLAYER_START_COL};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Player {
    pub(crate) x: usize,
}

impl Player {
    pub(crate) fn new() -> Self {
        Self {
            x: PLAYER_START_COL,
        }
    }

    pub(crate) fn row(&self) -> usize {
        PLAYER_ROW
    }

    pub(crate) fn move_left(&mut self, grid: &Grid) {
        if grid.cell_at(PLAYER_ROW, self.x - 1) == Cell::Wall {
            return;
        }
        self.x -= 1;
    }

    pub(crate) fn move_right(&mut self, grid: &Grid) {
        if grid.cell_at(PLAYER_ROW, self.x + 1) == Cell::Wall {
            return;
        }
        self.x += 1;
    }

    /// Pure read: the obstacle that killed the player stays on the grid.
    pub(crate) fn is_dead(&self, grid: &Grid) -> bool {
        grid.cell_at(PLAYER_ROW, self.x) == Cell::Obstacle
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}
