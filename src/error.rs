use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote returned status {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("could not decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("sink target '{target}' failed: {message}")]
    Sink { target: String, message: String },
}

impl ReportError {
    pub fn sink(target: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Sink {
            target: target.into(),
            message: message.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

pub type Result<T, E = ReportError> = std::result::Result<T, E>;
