use larder_common::validation::DraftProblem;
use larder_common::TrackerError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    /// The server answered with a non-success status.
    #[error("{message} ({status})")]
    Api { status: StatusCode, message: String },
    #[error("event stream: {0}")]
    Events(#[from] Box<tokio_tungstenite::tungstenite::Error>),
    /// Refused locally before any request was sent.
    #[error(transparent)]
    Rejected(#[from] TrackerError),
    #[error("{}", describe(.0))]
    Draft(Vec<DraftProblem>),
}

fn describe(problems: &[DraftProblem]) -> String {
    problems
        .iter()
        .map(|p| p.message())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(StatusCode::FORBIDDEN)
    }
}
