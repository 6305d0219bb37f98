use crate::error::GameError;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// The win notice must stay up at least this long.
pub(crate) const MIN_WIN_NOTICE_MS: u64 = 3000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) tick_ms: u64,
    pub(crate) win_notice_ms: u64,
    pub(crate) seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            win_notice_ms: MIN_WIN_NOTICE_MS,
            seed: None,
        }
    }
}

impl Settings {
    pub(crate) fn with_overrides(mut self, tick_ms: Option<u64>, seed: Option<u64>) -> Self {
        if let Some(t) = tick_ms {
            self.tick_ms = t;
        }
        if seed.is_some() {
            self.seed = seed;
        }
        self
    }

    pub(crate) fn validate(&self) -> Result<(), GameError> {
        if self.tick_ms == 0 {
            return Err(GameError::Configuration(
                "tick_ms must be at least 1".to_string(),
            ));
        }
        if self.win_notice_ms < MIN_WIN_NOTICE_MS {
            return Err(GameError::Configuration(format!(
                "win_notice_ms must be at least {MIN_WIN_NOTICE_MS} (got {})",
                self.win_notice_ms
            )));
        }
        Ok(())
    }

    pub(crate) fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub(crate) fn win_notice(&self) -> Duration {
        Duration::from_millis(self.win_notice_ms)
    }
}

pub(crate) struct Paths {
    pub(crate) ranking_path: PathBuf,
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "stagefall", "Stagefall")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir)
        .map_err(|e| GameError::resource(&dir, e))
        .context("could not create data directory")?;
    Ok(Paths {
        ranking_path: dir.join("ranking.dat"),
        settings_path: dir.join("settings.json"),
        log_path: dir.join("stagefall.log"),
    })
}

/// Logs go to a file: the terminal is in raw mode for the whole session.
pub(crate) fn init_logging(path: &Path) -> Result<()> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| GameError::resource(path, e))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("logger already initialised")?;
    Ok(())
}

/// Missing or unreadable settings fall back to defaults.
pub(crate) fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<Settings>(&s) {
            Ok(v) => {
                log::info!("settings loaded from {}", path.display());
                v
            }
            Err(e) => {
                log::warn!("ignoring malformed {}: {e}", path.display());
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// Writes defaults on first run so there is a file to edit.
pub(crate) fn ensure_settings_file(path: &Path, s: &Settings) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    save_settings_atomic(path, s)
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).map_err(|e| GameError::resource(&tmp, e))?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename over an existing file is not atomic everywhere; remove first
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to).map_err(|e| GameError::resource(to, e))?;
    Ok(())
}
