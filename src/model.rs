use crate::error::GameError;

/// Side length of the square arena, walls included.
pub(crate) const ARENA_SIZE: usize = 40;
/// Row the player lives on (just above the bottom wall).
pub(crate) const PLAYER_ROW: usize = ARENA_SIZE - 2;
pub(crate) const PLAYER_START_COL: usize = ARENA_SIZE / 2;

pub(crate) const FRAMES_PER_STAGE: u32 = 10 * 30;
pub(crate) const MAX_STAGE: i32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Difficulty {
    pub(crate) stage: i32,
    pub(crate) obstacle_speed: i32,
    pub(crate) obstacle_spawn_rate: i32,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            stage: 1,
            obstacle_speed: 1,
            obstacle_spawn_rate: 1,
        }
    }
}

impl Difficulty {
    pub(crate) fn next(self) -> Self {
        Self {
            stage: self.stage + 1,
            obstacle_speed: self.obstacle_speed + 1,
            obstacle_spawn_rate: self.obstacle_spawn_rate + 1,
        }
    }

    /// Ticks between two obstacle descents.
    pub(crate) fn descent_cadence(&self) -> i32 {
        cadence(self.obstacle_speed)
    }

    /// Ticks between two obstacle spawns.
    pub(crate) fn spawn_cadence(&self) -> i32 {
        cadence(self.obstacle_spawn_rate)
    }

    pub(crate) fn is_final_stage(&self) -> bool {
        self.stage >= MAX_STAGE
    }
}

/// `12 - 2n`, never below one tick. Without the floor, stages 6 and up
/// would produce countdowns that never become positive.
pub(crate) fn cadence(level: i32) -> i32 {
    (12 - 2 * level).max(1)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    UserQuit,
    Cleared,
    Died,
}

impl Outcome {
    /// Status code carried back from an isolated attempt.
    pub(crate) fn code(self) -> u8 {
        match self {
            Outcome::UserQuit => 0,
            Outcome::Cleared => 1,
            Outcome::Died => 2,
        }
    }
}

impl TryFrom<u8> for Outcome {
    type Error = GameError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Outcome::UserQuit),
            1 => Ok(Outcome::Cleared),
            2 => Ok(Outcome::Died),
            other => Err(GameError::Execution(format!(
                "attempt reported unknown outcome code {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Input {
    Left,
    Right,
    Escape,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EscapeChoice {
    Resume,
    ReturnToMainMenu,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MenuChoice {
    Play,
    Ranking,
    Exit,
}
