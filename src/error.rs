use reqwest::StatusCode;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which of the two requests an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Registration,
    Upload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Registration => f.write_str("registration"),
            Stage::Upload => f.write_str("upload"),
        }
    }
}

/// Every way a run can fail. All of them are fatal.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("error reading the uploaded file {}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("server url must be a base url without query or fragment: {0}")]
    InvalidServerUrl(String),

    #[error("{stage} request failed")]
    Network {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response status code during {stage}: {actual} (expected {expected})")]
    UnexpectedStatus {
        stage: Stage,
        expected: StatusCode,
        actual: StatusCode,
    },

    /// The Location header is absent, blank, or not a usable URL. `value`
    /// holds the raw header when one was sent.
    #[error(
        "registration response has no usable Location header{}",
        .value.as_ref().map(|v| format!(": {v:?}")).unwrap_or_default()
    )]
    MissingLocation { value: Option<String> },

    #[error("failed to build multipart body")]
    Multipart(#[source] reqwest::Error),
}

impl UploadError {
    /// The request stage the error was raised in, if it came from one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            UploadError::Network { stage, .. } | UploadError::UnexpectedStatus { stage, .. } => {
                Some(*stage)
            }
            UploadError::MissingLocation { .. } => Some(Stage::Registration),
            UploadError::Multipart(_) => Some(Stage::Upload),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_status_reports_both_codes() {
        let err = UploadError::UnexpectedStatus {
            stage: Stage::Upload,
            expected: StatusCode::ACCEPTED,
            actual: StatusCode::INTERNAL_SERVER_ERROR,
        };
        let msg = err.to_string();
        assert!(msg.contains("during upload"), "{msg}");
        assert!(msg.contains("500"), "{msg}");
        assert!(msg.contains("202"), "{msg}");
        assert_eq!(err.stage(), Some(Stage::Upload));
    }

    #[test]
    fn location_errors_belong_to_registration() {
        let missing = UploadError::MissingLocation { value: None };
        assert_eq!(missing.stage(), Some(Stage::Registration));
        let bad = UploadError::MissingLocation { value: Some("http://[".into()) };
        assert!(bad.to_string().ends_with(": \"http://[\""), "{bad}");
        let file_err = UploadError::FileAccess {
            path: PathBuf::from("/nope"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(file_err.stage(), None);
        assert!(file_err.to_string().contains("/nope"));
    }
}
