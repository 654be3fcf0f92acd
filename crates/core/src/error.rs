use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("No browser session is open. Call launch_browser first.")]
    NoSession,

    #[error("No element selected. Enable inspection and submit an annotation first.")]
    NoSelection,

    #[error("A browser session is already open: {0}")]
    SessionConflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Missing-prerequisite errors: recoverable by performing the missing step.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::NoSession | Error::NoSelection | Error::SessionConflict(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_classification() {
        assert!(Error::NoSession.is_precondition());
        assert!(Error::NoSelection.is_precondition());
        assert!(!Error::Browser("crashed".into()).is_precondition());
        assert!(!Error::Validation("url".into()).is_precondition());
    }

    #[test]
    fn test_messages_are_user_facing() {
        assert!(Error::NoSelection.to_string().contains("No element selected"));
        assert!(Error::NoSession.to_string().contains("launch_browser"));
    }
}
