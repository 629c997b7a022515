//! Task errors.

use std::any::Any;

use thiserror::Error;

/// Task error types.
///
/// Cloneable so a stored outcome can be handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// Task body reported a failure.
    #[error("Task failed: {0}")]
    Failed(String),

    /// Task was canceled before it produced a result.
    #[error("Task was canceled")]
    Canceled,

    /// Task body panicked.
    #[error("Task panicked: {0}")]
    Panicked(String),

    /// Cancel requested with a key the task did not issue.
    #[error("{0}")]
    IncorrectCancelToken(String),

    /// Worker pool no longer accepts work.
    #[error("Worker pool is shut down")]
    PoolShutDown,
}

impl TaskError {
    /// Shorthand for [`TaskError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        TaskError::Failed(message.into())
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(TaskError::failed("boom").to_string(), "Task failed: boom");
        assert_eq!(TaskError::Canceled.to_string(), "Task was canceled");
        assert_eq!(
            TaskError::IncorrectCancelToken("wrong key".into()).to_string(),
            "wrong key"
        );
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn Any + Send> = Box::new(7_u32);
        assert_eq!(panic_message(payload.as_ref()), "task panicked");
    }
}
