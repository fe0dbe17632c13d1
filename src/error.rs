use std::error::Error;
use std::fmt;
use tokio_cron_scheduler::JobSchedulerError;

/// Custom Error and Result types to unify errors from all sources.
pub type BoardResult<T> = Result<T, BoardError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    NotFound(String),
    Http(String),
    Permission(String),
    Timeout,
    Parse(String),
    Config(String),
    Template(String),
    Scheduler(String),
    Io(String),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BoardError::NotFound(s) => write!(f, "Not Found: {}", s),
            BoardError::Http(s) => write!(f, "HTTP Error: {}", s),
            BoardError::Permission(s) => write!(f, "Permission Error: {}", s),
            BoardError::Timeout => write!(f, "Timeout Error: the student directory did not answer in time"),
            BoardError::Parse(s) => write!(f, "Parse Error: {}", s),
            BoardError::Config(s) => write!(f, "Config Error: {}", s),
            BoardError::Template(s) => write!(f, "Template Error: {}", s),
            BoardError::Scheduler(s) => write!(f, "Scheduler Error: {}", s),
            BoardError::Io(s) => write!(f, "IO Error: {}", s),
        }
    }
}

impl Error for BoardError {}

impl From<reqwest::Error> for BoardError {
    fn from(error: reqwest::Error) -> Self {
        match error.is_timeout() {
            true => BoardError::Timeout,
            false => BoardError::Http(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for BoardError {
    fn from(error: serde_json::Error) -> Self {
        BoardError::Parse(error.to_string())
    }
}

impl From<figment::Error> for BoardError {
    fn from(error: figment::Error) -> Self {
        BoardError::Config(error.to_string())
    }
}

impl From<minijinja::Error> for BoardError {
    fn from(error: minijinja::Error) -> Self {
        BoardError::Template(error.to_string())
    }
}

impl From<JobSchedulerError> for BoardError {
    fn from(error: JobSchedulerError) -> Self {
        BoardError::Scheduler(error.to_string())
    }
}

impl From<std::io::Error> for BoardError {
    fn from(error: std::io::Error) -> Self {
        BoardError::Io(error.to_string())
    }
}
