use crate::attempt::{AttemptIo, AttemptRunner};
use crate::error::GameError;
use crate::model::{Difficulty, Outcome};
use crate::ranking::{Record, RecordSink};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{sync::mpsc, thread, time::Duration};

/// Runs a single attempt to completion and reports how it ended.
pub(crate) trait AttemptLauncher {
    fn launch(
        &mut self,
        difficulty: Difficulty,
        io: &mut (dyn AttemptIo + Send),
    ) -> Result<Outcome, GameError>;
}

/// Screens the controller needs between attempts.
pub(crate) trait StageUi {
    fn show_win(&mut self, hold: Duration) -> Result<(), GameError>;
    fn prompt_name(&mut self, stage: i32, timestamp: i64) -> Result<String, GameError>;
}

/// Each attempt gets its own thread, its own grid and RNG, and exactly one
/// way to talk back: the outcome code on a channel. The caller blocks until
/// the thread is gone.
pub(crate) struct IsolatedLauncher {
    seeds: StdRng,
    tick: Duration,
}

impl IsolatedLauncher {
    pub(crate) fn new(seed: Option<u64>, tick: Duration) -> Self {
        let seeds = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { seeds, tick }
    }
}

impl AttemptLauncher for IsolatedLauncher {
    fn launch(
        &mut self,
        difficulty: Difficulty,
        io: &mut (dyn AttemptIo + Send),
    ) -> Result<Outcome, GameError> {
        let seed: u64 = self.seeds.gen();
        let tick = self.tick;
        let (tx, rx) = mpsc::sync_channel::<u8>(1);

        thread::scope(|scope| {
            let handle = thread::Builder::new()
                .name(format!("attempt-stage-{}", difficulty.stage))
                .spawn_scoped(scope, move || -> Result<(), GameError> {
                    let runner = AttemptRunner::new(difficulty, StdRng::seed_from_u64(seed), tick);
                    let outcome = runner.run(io)?;
                    // receiver outlives the thread, send only fails if it was dropped
                    let _ = tx.send(outcome.code());
                    Ok(())
                })
                .map_err(|e| GameError::Execution(format!("could not launch attempt: {e}")))?;
            handle
                .join()
                .map_err(|_| GameError::Execution("attempt panicked".to_string()))?
        })?;

        let code = rx.try_recv().map_err(|_| {
            GameError::Execution("attempt ended without reporting an outcome".to_string())
        })?;
        Outcome::try_from(code)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RunSummary {
    Quit,
    Won(Record),
    Lost(Record),
}

/// Owns the difficulty triple for one play-through.
pub(crate) struct StageController {
    difficulty: Difficulty,
    win_notice: Duration,
}

impl StageController {
    pub(crate) fn new(win_notice: Duration) -> Self {
        Self {
            difficulty: Difficulty::default(),
            win_notice,
        }
    }

    pub(crate) fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub(crate) fn play<L, F, S>(
        &mut self,
        launcher: &mut L,
        frontend: &mut F,
        sink: &mut S,
    ) -> Result<RunSummary, GameError>
    where
        L: AttemptLauncher + ?Sized,
        F: AttemptIo + StageUi + Send,
        S: RecordSink + ?Sized,
    {
        loop {
            log::info!("launching stage {}", self.difficulty.stage);
            let outcome = launcher.launch(self.difficulty, &mut *frontend)?;
            log::info!("stage {} ended: {:?}", self.difficulty.stage, outcome);

            match outcome {
                Outcome::UserQuit => return Ok(RunSummary::Quit),
                Outcome::Cleared if !self.difficulty.is_final_stage() => {
                    self.difficulty = self.difficulty.next();
                }
                Outcome::Cleared => {
                    frontend.show_win(self.win_notice)?;
                    let record = record_run(self.difficulty.stage, frontend, sink)?;
                    return Ok(RunSummary::Won(record));
                }
                Outcome::Died => {
                    // no floor: dying on stage 1 records stage 0
                    self.difficulty.stage -= 1;
                    let record = record_run(self.difficulty.stage, frontend, sink)?;
                    return Ok(RunSummary::Lost(record));
                }
            }
        }
    }
}

fn record_run<U, S>(stage: i32, ui: &mut U, sink: &mut S) -> Result<Record, GameError>
where
    U: StageUi + ?Sized,
    S: RecordSink + ?Sized,
{
    let timestamp = chrono::Utc::now().timestamp();
    let name = ui.prompt_name(stage, timestamp)?;
    let record = Record::new(timestamp, stage, &name);
    sink.append(&record)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::tests::ScriptedIo;
    use crate::attempt::FrameView;
    use crate::model::{EscapeChoice, Input, MAX_STAGE};
    use std::collections::VecDeque;

    struct FakeLauncher {
        outcomes: VecDeque<Outcome>,
        seen: Vec<Difficulty>,
    }

    impl FakeLauncher {
        fn new(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
            Self {
                outcomes: outcomes.into_iter().collect(),
                seen: vec![],
            }
        }
    }

    impl AttemptLauncher for FakeLauncher {
        fn launch(
            &mut self,
            difficulty: Difficulty,
            _io: &mut (dyn AttemptIo + Send),
        ) -> Result<Outcome, GameError> {
            self.seen.push(difficulty);
            self.outcomes
                .pop_front()
                .ok_or_else(|| GameError::Execution("script exhausted".into()))
        }
    }

    #[derive(Default)]
    struct FakeFrontend {
        io: ScriptedIo,
        wins: u32,
        prompts: Vec<i32>,
    }

    impl AttemptIo for FakeFrontend {
        fn draw_frame(&mut self, view: &FrameView<'_>) -> Result<(), GameError> {
            self.io.draw_frame(view)
        }
        fn poll_input(&mut self) -> Result<Option<Input>, GameError> {
            self.io.poll_input()
        }
        fn escape_menu(&mut self) -> Result<EscapeChoice, GameError> {
            self.io.escape_menu()
        }
    }

    impl StageUi for FakeFrontend {
        fn show_win(&mut self, hold: Duration) -> Result<(), GameError> {
            assert!(hold >= Duration::from_secs(3));
            self.wins += 1;
            Ok(())
        }
        fn prompt_name(&mut self, stage: i32, _timestamp: i64) -> Result<String, GameError> {
            self.prompts.push(stage);
            Ok("tester".into())
        }
    }

    #[derive(Default)]
    struct VecSink(Vec<Record>);

    impl RecordSink for VecSink {
        fn append(&mut self, record: &Record) -> Result<(), GameError> {
            self.0.push(record.clone());
            Ok(())
        }
    }

    struct PanickingIo;

    impl AttemptIo for PanickingIo {
        fn draw_frame(&mut self, _view: &FrameView<'_>) -> Result<(), GameError> {
            panic!("renderer blew up");
        }
        fn poll_input(&mut self) -> Result<Option<Input>, GameError> {
            Ok(None)
        }
        fn escape_menu(&mut self) -> Result<EscapeChoice, GameError> {
            Ok(EscapeChoice::Resume)
        }
    }

    fn controller() -> StageController {
        StageController::new(Duration::from_secs(3))
    }

    #[test]
    fn clearing_all_ten_stages_records_a_single_win() {
        let mut launcher = FakeLauncher::new(std::iter::repeat(Outcome::Cleared).take(10));
        let mut ui = FakeFrontend::default();
        let mut sink = VecSink::default();

        let summary = controller().play(&mut launcher, &mut ui, &mut sink).unwrap();

        assert!(matches!(summary, RunSummary::Won(ref r) if r.stage == MAX_STAGE));
        assert_eq!(ui.wins, 1);
        assert_eq!(sink.0.len(), 1);
        assert_eq!(sink.0[0].stage, 10);
        assert_eq!(sink.0[0].name, "tester");
        let stages: Vec<i32> = launcher.seen.iter().map(|d| d.stage).collect();
        assert_eq!(stages, (1..=10).collect::<Vec<_>>());
        assert!(launcher
            .seen
            .iter()
            .all(|d| d.obstacle_speed == d.stage && d.obstacle_spawn_rate == d.stage));
    }

    #[test]
    fn dying_on_stage_five_records_stage_four() {
        let mut launcher = FakeLauncher::new(
            std::iter::repeat(Outcome::Cleared)
                .take(4)
                .chain([Outcome::Died]),
        );
        let mut ui = FakeFrontend::default();
        let mut sink = VecSink::default();
        let mut c = controller();

        let summary = c.play(&mut launcher, &mut ui, &mut sink).unwrap();

        assert!(matches!(summary, RunSummary::Lost(ref r) if r.stage == 4));
        assert_eq!(ui.prompts, [4]);
        assert_eq!(ui.wins, 0);
        assert_eq!(sink.0.len(), 1);
        assert_eq!(sink.0[0].stage, 4);
        assert_eq!(c.difficulty().obstacle_speed, 5);
    }

    #[test]
    fn dying_on_stage_one_records_zero() {
        let mut launcher = FakeLauncher::new([Outcome::Died]);
        let mut sink = VecSink::default();
        controller()
            .play(&mut launcher, &mut FakeFrontend::default(), &mut sink)
            .unwrap();
        assert_eq!(sink.0[0].stage, 0);
    }

    #[test]
    fn quitting_writes_nothing_and_keeps_difficulty() {
        let mut launcher =
            FakeLauncher::new([Outcome::Cleared, Outcome::Cleared, Outcome::UserQuit]);
        let mut ui = FakeFrontend::default();
        let mut sink = VecSink::default();
        let mut c = controller();

        let summary = c.play(&mut launcher, &mut ui, &mut sink).unwrap();

        assert_eq!(summary, RunSummary::Quit);
        assert!(sink.0.is_empty());
        assert!(ui.prompts.is_empty());
        assert_eq!(
            c.difficulty(),
            Difficulty {
                stage: 3,
                obstacle_speed: 3,
                obstacle_spawn_rate: 3
            }
        );
    }

    #[test]
    fn launcher_errors_are_fatal() {
        let mut launcher = FakeLauncher::new([]);
        let mut sink = VecSink::default();
        let err = controller()
            .play(&mut launcher, &mut FakeFrontend::default(), &mut sink)
            .unwrap_err();
        assert!(matches!(err, GameError::Execution(_)));
        assert!(sink.0.is_empty());
    }

    #[test]
    fn isolated_attempt_reports_quit() {
        let mut launcher = IsolatedLauncher::new(Some(42), Duration::ZERO);
        let mut io = ScriptedIo::with_inputs([None, Some(Input::Escape)]);
        io.escape_answers.push_back(EscapeChoice::ReturnToMainMenu);
        let outcome = launcher.launch(Difficulty::default(), &mut io).unwrap();
        assert_eq!(outcome, Outcome::UserQuit);
        assert_eq!(io.frames_drawn, 2);
    }

    #[test]
    fn isolated_attempt_runs_a_full_stage() {
        let mut launcher = IsolatedLauncher::new(Some(1), Duration::ZERO);
        let mut io = ScriptedIo::default();
        let outcome = launcher.launch(Difficulty::default(), &mut io).unwrap();
        assert_eq!(outcome, Outcome::Cleared);
        assert_eq!(io.frames_drawn, crate::model::FRAMES_PER_STAGE);
    }

    #[test]
    fn panicking_attempt_becomes_execution_error() {
        let mut launcher = IsolatedLauncher::new(Some(1), Duration::ZERO);
        let err = launcher
            .launch(Difficulty::default(), &mut PanickingIo)
            .unwrap_err();
        assert!(matches!(err, GameError::Execution(ref m) if m.contains("panicked")));
    }

    #[test]
    fn controller_drives_isolated_attempts() {
        let mut launcher = IsolatedLauncher::new(Some(9), Duration::ZERO);
        let mut ui = FakeFrontend::default();
        // clear stage one untouched, then bail out of stage two
        let mut inputs = vec![None; crate::model::FRAMES_PER_STAGE as usize];
        inputs.push(Some(Input::Escape));
        ui.io = ScriptedIo::with_inputs(inputs);
        ui.io.escape_answers.push_back(EscapeChoice::ReturnToMainMenu);
        let mut sink = VecSink::default();
        let mut c = controller();

        let summary = c.play(&mut launcher, &mut ui, &mut sink).unwrap();

        assert_eq!(summary, RunSummary::Quit);
        assert_eq!(c.difficulty().stage, 2);
        assert!(sink.0.is_empty());
    }
}
