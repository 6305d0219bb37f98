use crate::error::GameError;
use crate::grid::Grid;
use crate::model::{Difficulty, EscapeChoice, Input, Outcome, FRAMES_PER_STAGE};
use crate::obstacles;
use crate::player::Player;
use rand::rngs::StdRng;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AttemptState {
    Running,
    Cleared,
    Died,
    Quit,
}

impl AttemptState {
    pub(crate) fn outcome(self) -> Option<Outcome> {
        match self {
            AttemptState::Running => None,
            AttemptState::Cleared => Some(Outcome::Cleared),
            AttemptState::Died => Some(Outcome::Died),
            AttemptState::Quit => Some(Outcome::UserQuit),
        }
    }
}

/// What the frontend gets to see each tick.
pub(crate) struct FrameView<'a> {
    pub(crate) grid: &'a Grid,
    pub(crate) player: Player,
    pub(crate) difficulty: Difficulty,
    pub(crate) frame: u32,
}

impl FrameView<'_> {
    pub(crate) fn frames_left(&self) -> u32 {
        FRAMES_PER_STAGE.saturating_sub(self.frame)
    }
}

/// Screen and keyboard as seen from inside one attempt.
pub(crate) trait AttemptIo {
    fn draw_frame(&mut self, view: &FrameView<'_>) -> Result<(), GameError>;

    /// Never blocks. At most one input per call; anything else pending is dropped.
    fn poll_input(&mut self) -> Result<Option<Input>, GameError>;

    /// Blocks until the player picks an entry.
    fn escape_menu(&mut self) -> Result<EscapeChoice, GameError>;
}

/// One stage attempt. Owns its grid, player and countdowns; nothing here
/// outlives the attempt.
pub(crate) struct AttemptRunner {
    grid: Grid,
    player: Player,
    difficulty: Difficulty,
    rng: StdRng,
    descent_countdown: i32,
    spawn_countdown: i32,
    frame: u32,
    state: AttemptState,
    tick: Duration,
}

impl AttemptRunner {
    pub(crate) fn new(difficulty: Difficulty, rng: StdRng, tick: Duration) -> Self {
        Self {
            grid: Grid::new(),
            player: Player::new(),
            difficulty,
            rng,
            descent_countdown: 0,
            spawn_countdown: 0,
            frame: 0,
            state: AttemptState::Running,
            tick,
        }
    }

    pub(crate) fn state(&self) -> AttemptState {
        self.state
    }

    pub(crate) fn frame(&self) -> u32 {
        self.frame
    }

    pub(crate) fn run(mut self, io: &mut dyn AttemptIo) -> Result<Outcome, GameError> {
        log::debug!(
            "attempt start: stage {} descent every {} spawn every {}",
            self.difficulty.stage,
            self.difficulty.descent_cadence(),
            self.difficulty.spawn_cadence()
        );
        loop {
            let started = Instant::now();
            self.step(io)?;
            if matches!(self.state(), AttemptState::Running | AttemptState::Cleared) {
                pace(started, self.tick);
            }
            if let Some(outcome) = self.state().outcome() {
                log::debug!("attempt over after {} frames: {:?}", self.frame(), outcome);
                return Ok(outcome);
            }
        }
    }

    /// One tick of the frame loop, without the sleep.
    pub(crate) fn step(&mut self, io: &mut dyn AttemptIo) -> Result<AttemptState, GameError> {
        if self.state != AttemptState::Running {
            return Ok(self.state);
        }

        if self.descent_countdown <= 0 {
            obstacles::advance(&mut self.grid);
            self.descent_countdown = self.difficulty.descent_cadence();
        }
        if self.spawn_countdown <= 0 {
            obstacles::spawn(&mut self.grid, &mut self.rng);
            self.spawn_countdown = self.difficulty.spawn_cadence();
        }

        io.draw_frame(&FrameView {
            grid: &self.grid,
            player: self.player,
            difficulty: self.difficulty,
            frame: self.frame,
        })?;

        match io.poll_input()? {
            Some(Input::Left) => self.player.move_left(&self.grid),
            Some(Input::Right) => self.player.move_right(&self.grid),
            Some(Input::Escape) => {
                if io.escape_menu()? == EscapeChoice::ReturnToMainMenu {
                    self.state = AttemptState::Quit;
                    return Ok(self.state);
                }
            }
            None => {}
        }

        if self.player.is_dead(&self.grid) {
            self.state = AttemptState::Died;
            return Ok(self.state);
        }

        self.descent_countdown -= 1;
        self.spawn_countdown -= 1;
        self.frame += 1;
        if self.frame >= FRAMES_PER_STAGE {
            self.state = AttemptState::Cleared;
        }
        Ok(self.state)
    }
}

fn pace(started: Instant, tick: Duration) {
    let elapsed = started.elapsed();
    if elapsed < tick {
        std::thread::sleep(tick - elapsed);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::model::{ARENA_SIZE, PLAYER_ROW};
    use crate::obstacles;
    use rand::SeedableRng;
    use std::collections::VecDeque;

    /// Replays a fixed input script, one entry per tick.
    #[derive(Default)]
    pub(crate) struct ScriptedIo {
        pub(crate) inputs: VecDeque<Option<Input>>,
        pub(crate) escape_answers: VecDeque<EscapeChoice>,
        pub(crate) frames_drawn: u32,
        pub(crate) last_player_x: Option<usize>,
    }

    impl ScriptedIo {
        pub(crate) fn with_inputs(inputs: impl IntoIterator<Item = Option<Input>>) -> Self {
            Self {
                inputs: inputs.into_iter().collect(),
                ..Self::default()
            }
        }
    }

    impl AttemptIo for ScriptedIo {
        fn draw_frame(&mut self, view: &FrameView<'_>) -> Result<(), GameError> {
            assert!(view.frame < FRAMES_PER_STAGE);
            self.frames_drawn += 1;
            self.last_player_x = Some(view.player.x);
            Ok(())
        }

        fn poll_input(&mut self) -> Result<Option<Input>, GameError> {
            Ok(self.inputs.pop_front().flatten())
        }

        fn escape_menu(&mut self) -> Result<EscapeChoice, GameError> {
            Ok(self
                .escape_answers
                .pop_front()
                .unwrap_or(EscapeChoice::Resume))
        }
    }

    fn runner(difficulty: Difficulty, seed: u64) -> AttemptRunner {
        AttemptRunner::new(difficulty, StdRng::seed_from_u64(seed), Duration::ZERO)
    }

    #[test]
    fn first_tick_spawns_one_obstacle_in_row_one() {
        let mut r = runner(Difficulty::default(), 11);
        let mut io = ScriptedIo::default();
        assert_eq!(r.step(&mut io).unwrap(), AttemptState::Running);
        assert_eq!(obstacles::count(&r.grid), 1);
        assert!((1..ARENA_SIZE - 1).any(|c| r.grid.cell_at(1, c) == Cell::Obstacle));
        assert_eq!(r.frame(), 1);
        assert_eq!(r.descent_countdown, 9);
        assert_eq!(r.spawn_countdown, 9);
    }

    #[test]
    fn stage_one_spawns_every_ten_ticks() {
        let mut r = runner(Difficulty::default(), 5);
        let mut io = ScriptedIo::default();
        for _ in 0..10 {
            r.step(&mut io).unwrap();
        }
        assert_eq!(obstacles::count(&r.grid), 1);
        r.step(&mut io).unwrap();
        assert_eq!(obstacles::count(&r.grid), 2);
    }

    #[test]
    fn surviving_every_frame_clears_the_stage() {
        let mut r = runner(Difficulty::default(), 21);
        let mut io = ScriptedIo::default();
        // at stage one nothing can fall far enough to reach the player row
        while r.state() == AttemptState::Running {
            r.step(&mut io).unwrap();
        }
        assert_eq!(r.state(), AttemptState::Cleared);
        assert_eq!(r.frame(), FRAMES_PER_STAGE);
        assert_eq!(io.frames_drawn, FRAMES_PER_STAGE);
        assert_eq!(r.state().outcome(), Some(Outcome::Cleared));
    }

    #[test]
    fn touching_an_obstacle_dies_before_frame_advances() {
        let mut r = runner(Difficulty::default(), 1);
        r.grid.set_cell(PLAYER_ROW - 1, r.player.x, Cell::Obstacle);
        // countdown is zero, so the first tick drops it onto the player
        let mut io = ScriptedIo::default();
        assert_eq!(r.step(&mut io).unwrap(), AttemptState::Died);
        assert_eq!(r.frame(), 0);
        assert_eq!(r.grid.cell_at(PLAYER_ROW, r.player.x), Cell::Obstacle);
        // terminal states are sticky
        assert_eq!(r.step(&mut io).unwrap(), AttemptState::Died);
        assert_eq!(io.frames_drawn, 1);
    }

    #[test]
    fn stepping_into_an_obstacle_dies() {
        let mut r = runner(Difficulty::default(), 1);
        r.grid.set_cell(PLAYER_ROW, r.player.x - 1, Cell::Obstacle);
        r.descent_countdown = 5;
        let mut io = ScriptedIo::with_inputs([Some(Input::Left)]);
        assert_eq!(r.step(&mut io).unwrap(), AttemptState::Died);
    }

    #[test]
    fn escape_then_resume_keeps_running() {
        let mut r = runner(Difficulty::default(), 2);
        let mut io = ScriptedIo::with_inputs([Some(Input::Escape)]);
        io.escape_answers.push_back(EscapeChoice::Resume);
        assert_eq!(r.step(&mut io).unwrap(), AttemptState::Running);
        assert_eq!(r.frame(), 1);
    }

    #[test]
    fn escape_to_main_menu_quits_immediately() {
        let r = runner(Difficulty::default(), 2);
        let mut io = ScriptedIo::with_inputs([None, None, Some(Input::Escape)]);
        io.escape_answers.push_back(EscapeChoice::ReturnToMainMenu);
        assert_eq!(r.run(&mut io).unwrap(), Outcome::UserQuit);
        assert_eq!(io.frames_drawn, 3);
    }

    #[test]
    fn directional_input_moves_player_between_frames() {
        let mut r = runner(Difficulty::default(), 8);
        let mut io = ScriptedIo::with_inputs([
            Some(Input::Left),
            Some(Input::Left),
            Some(Input::Right),
        ]);
        for _ in 0..3 {
            r.step(&mut io).unwrap();
        }
        assert_eq!(r.player.x, 19);
        assert_eq!(io.last_player_x, Some(18));
    }

    #[test]
    fn late_stages_clamp_cadence_to_every_tick() {
        let d = Difficulty {
            stage: 8,
            obstacle_speed: 8,
            obstacle_spawn_rate: 8,
        };
        let mut r = runner(d, 4);
        let mut io = ScriptedIo::default();
        for _ in 0..3 {
            r.step(&mut io).unwrap();
        }
        assert_eq!(r.descent_countdown, 0);
        assert_eq!(r.spawn_countdown, 0);
        // one spawn per tick, each earlier one pushed down a row
        assert_eq!(obstacles::count(&r.grid), 3);
    }
}
