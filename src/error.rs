use std::fmt;

use thiserror::Error;

/// The three model-backed stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validator,
    Builder,
    Adjuster,
}

impl Stage {
    pub fn parse_failure(&self) -> &'static str {
        match self {
            Stage::Validator => "Failed to parse JSON from validator response",
            Stage::Builder => "Failed to parse JSON from builder response",
            Stage::Adjuster => "Failed to parse JSON from adjuster response",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validator => "validator",
            Stage::Builder => "builder",
            Stage::Adjuster => "adjuster",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Transport Error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API Error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to encode {stage} input: {source}")]
    Encode {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}", .stage.parse_failure())]
    Parse {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },

    #[error("Validator output is invalid or malformed: {0}")]
    MalformedOutput(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt Error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

pub type Result<T> = std::result::Result<T, FormError>;
