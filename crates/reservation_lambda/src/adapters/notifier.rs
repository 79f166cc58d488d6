use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error("notification channel rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Delivers a rendered message to an external channel.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

/// Accepts every message and delivers nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _message: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}
