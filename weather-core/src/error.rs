use std::{fmt, path::PathBuf};

use thiserror::Error;

/// Which external service a pipeline failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Geocoding,
    Weather,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Upstream::Geocoding => "geocoding",
            Upstream::Weather => "weather",
        })
    }
}

/// Per-request failure talking to geocoding or weather services.
///
/// `Transport` and `Status` cover network-level failures, `Shape` covers a
/// successful response that does not carry what we need. The router treats
/// them all the same way.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{upstream} request failed: {source}")]
    Transport {
        upstream: Upstream,
        #[source]
        source: reqwest::Error,
    },

    #[error("{upstream} request failed with status {status}: {body}")]
    Status {
        upstream: Upstream,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected {upstream} response: {reason}")]
    Shape { upstream: Upstream, reason: String },
}

impl PipelineError {
    pub fn upstream(&self) -> Upstream {
        match self {
            PipelineError::Transport { upstream, .. }
            | PipelineError::Status { upstream, .. }
            | PipelineError::Shape { upstream, .. } => *upstream,
        }
    }

    pub(crate) fn shape(upstream: Upstream, reason: impl Into<String>) -> Self {
        PipelineError::Shape { upstream, reason: reason.into() }
    }
}

/// Startup failure; the bot must not serve requests after one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Missing credential '{0}'.\n\
         Hint: run `weather-bot configure` or set the matching environment variable."
    )]
    MissingCredential(&'static str),

    #[error("Failed to read config file: {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write config file: {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize configuration to TOML")]
    Serialize(#[from] toml::ser::Error),

    #[error("Could not determine platform config directory")]
    NoConfigDir,

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

/// Why a chat message could not be turned into a [`CommandRequest`](crate::router::CommandRequest).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("message is not a command")]
    NotACommand,

    #[error("unknown command '/{0}'")]
    Unknown(String),

    #[error("command is addressed to @{0}")]
    OtherBot(String),
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
