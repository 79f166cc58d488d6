#![allow(dead_code)]

use std::sync::Mutex;

use reservation_lambda::adapters::notifier::{Notifier, NotifyError};

/// Notifier that keeps every delivered message.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("notifier lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .expect("notifier lock")
            .push(message.to_string());
        Ok(())
    }
}

/// Notifier whose transport is always down.
pub struct UnreachableNotifier;

impl Notifier for UnreachableNotifier {
    fn notify(&self, _message: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("connection refused".to_string()))
    }
}
