use crate::attempt::{AttemptIo, FrameView};
use crate::config::{ensure_settings_file, init_logging, load_settings, project_paths, Settings};
use crate::error::GameError;
use crate::input::{
    discard_pending, map_escape_key, map_game_key, map_menu_key, map_name_key,
    poll_key_nonblocking, wait_key, NameEdit,
};
use crate::model::{EscapeChoice, Input, MenuChoice};
use crate::ranking::{format_timestamp, RankedRow, RankingStore, MAX_NAME_BYTES};
use crate::render::{draw_arena, draw_lines, Terminal};
use crate::stage::{IsolatedLauncher, RunSummary, StageController, StageUi};
use crate::Args;
use crossterm::event::KeyCode;
use std::time::Duration;

/// Everything the player sees, on top of one terminal session.
pub(crate) struct Screen {
    term: Terminal,
}

impl Screen {
    fn show_lines<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<(), GameError> {
        self.term.begin_frame()?;
        draw_lines(&mut self.term.cur, lines);
        self.term.present()
    }

    fn main_menu(&mut self) -> Result<MenuChoice, GameError> {
        self.show_lines(&["1. play game", "2. ranking", "3. exit"])?;
        loop {
            if let Some(choice) = map_menu_key(wait_key()?.code) {
                return Ok(choice);
            }
        }
    }

    fn show_ranking(&mut self, rows: &[RankedRow]) -> Result<(), GameError> {
        let mut lines: Vec<String> = rows
            .iter()
            .map(|r| format!("{:>3}. {}   stage {:02}   {}", r.rank, r.when, r.stage, r.name))
            .collect();
        if lines.is_empty() {
            lines.push("no records yet".to_string());
        }
        lines.push(String::new());
        lines.push("<ESC>: return to main menu".to_string());
        self.show_lines(&lines)?;
        while wait_key()?.code != KeyCode::Esc {}
        Ok(())
    }
}

impl AttemptIo for Screen {
    fn draw_frame(&mut self, view: &FrameView<'_>) -> Result<(), GameError> {
        self.term.begin_frame()?;
        draw_arena(&mut self.term.cur, view);
        self.term.present()
    }

    fn poll_input(&mut self) -> Result<Option<Input>, GameError> {
        Ok(poll_key_nonblocking()?.and_then(|k| map_game_key(k.code)))
    }

    fn escape_menu(&mut self) -> Result<EscapeChoice, GameError> {
        self.show_lines(&["1. resume", "2. main menu"])?;
        loop {
            if let Some(choice) = map_escape_key(wait_key()?.code) {
                return Ok(choice);
            }
        }
    }
}

impl StageUi for Screen {
    fn show_win(&mut self, hold: Duration) -> Result<(), GameError> {
        self.show_lines(&["You Win!!!"])?;
        std::thread::sleep(hold);
        discard_pending()?;
        Ok(())
    }

    fn prompt_name(&mut self, stage: i32, timestamp: i64) -> Result<String, GameError> {
        discard_pending()?;
        let mut name = String::new();
        loop {
            self.show_lines(&[
                format!("time: {}", format_timestamp(timestamp)),
                format!("stage: {stage}"),
                format!("user name: {name}_"),
            ])?;
            match map_name_key(wait_key()?) {
                Some(NameEdit::Commit) if !name.trim().is_empty() => {
                    return Ok(name.trim().to_string())
                }
                Some(NameEdit::Push(ch)) if name.len() + ch.len_utf8() <= MAX_NAME_BYTES => {
                    name.push(ch)
                }
                Some(NameEdit::Backspace) => {
                    name.pop();
                }
                _ => {}
            }
        }
    }
}

pub(crate) struct App {
    settings: Settings,
    store: RankingStore,
    launcher: IsolatedLauncher,
    screen: Screen,
}

impl App {
    fn init(settings: Settings, store: RankingStore) -> Result<Self, GameError> {
        let launcher = IsolatedLauncher::new(settings.seed, settings.tick());
        let term = Terminal::begin()?;
        Ok(Self {
            settings,
            store,
            launcher,
            screen: Screen { term },
        })
    }

    fn run(&mut self) -> Result<(), GameError> {
        loop {
            match self.screen.main_menu()? {
                MenuChoice::Play => self.play()?,
                MenuChoice::Ranking => {
                    let rows = self.store.report()?;
                    self.screen.show_ranking(&rows)?;
                }
                MenuChoice::Exit => return Ok(()),
            }
        }
    }

    fn play(&mut self) -> Result<(), GameError> {
        let mut controller = StageController::new(self.settings.win_notice());
        let summary = controller.play(&mut self.launcher, &mut self.screen, &mut self.store)?;
        match summary {
            RunSummary::Quit => log::info!(
                "run abandoned at stage {}",
                controller.difficulty().stage
            ),
            RunSummary::Won(r) => log::info!("{} cleared every stage", r.name),
            RunSummary::Lost(r) => log::info!("{} reached stage {}", r.name, r.stage),
        }
        Ok(())
    }
}

pub(crate) fn run(args: &Args) -> anyhow::Result<()> {
    let paths = project_paths()?;
    init_logging(&paths.log_path)?;

    ensure_settings_file(&paths.settings_path, &Settings::default())?;
    let settings = load_settings(&paths.settings_path).with_overrides(args.tick_ms, args.seed);
    settings.validate()?;
    log::info!("starting with {settings:?}");

    let ranking_path = args.ranking_file.clone().unwrap_or(paths.ranking_path);
    let mut app = App::init(settings, RankingStore::new(ranking_path))?;
    let result = app.run();
    app.screen.term.end()?;
    result?;
    Ok(())
}
