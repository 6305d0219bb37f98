use std::{io, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub(crate) enum GameError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("cannot access {}: {source}", path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("terminal I/O failed: {0}")]
    Terminal(#[from] io::Error),

    #[error("attempt execution failed: {0}")]
    Execution(String),
}

impl GameError {
    pub(crate) fn resource(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GameError::Resource {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn exit_code(&self) -> i32 {
        match self {
            GameError::Configuration(_) => 2,
            GameError::Resource { .. } => 3,
            GameError::Terminal(_) => 4,
            GameError::Execution(_) => 5,
        }
    }
}
