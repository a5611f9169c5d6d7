// Application errors
use crate::domain::settings::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// The backend could not be reached or returned something unusable.
    /// `message` is shown to the user; `detail` is the raw error for the log.
    #[error("{message}")]
    Backend { message: &'static str, detail: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Ongeldige aanvraag: {0}")]
    InvalidRequest(String),
}

impl DashboardError {
    /// Logs the raw error and keeps only the user-facing message.
    pub fn backend(message: &'static str, error: anyhow::Error) -> Self {
        tracing::error!("{}: {:#}", message, error);
        DashboardError::Backend {
            message,
            detail: format!("{:#}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_displays_user_message() {
        let error = DashboardError::backend(
            "De gegevens konden niet worden opgehaald",
            anyhow::anyhow!("connection refused"),
        );

        assert_eq!(error.to_string(), "De gegevens konden niet worden opgehaald");
        match error {
            DashboardError::Backend { detail, .. } => assert_eq!(detail, "connection refused"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validation_error_is_transparent() {
        let error: DashboardError = ValidationError::Required("authenticatietoken").into();
        assert_eq!(error.to_string(), "authenticatietoken is verplicht");
    }
}
