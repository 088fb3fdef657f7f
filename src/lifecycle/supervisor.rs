//! Fail-fast supervision boundary.
//!
//! The server runs as a supervised task. If it returns an error or panics,
//! the fault is logged and the process exits non-zero so the external process
//! manager restarts it. In-process recovery is never attempted.

use std::fmt::Display;
use std::future::Future;
use std::process::ExitCode;

use crate::http::response::panic_message;

/// How a supervised task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    Failed(String),
    Panicked(String),
}

impl Outcome {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Outcome::Clean)
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_fatal() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

/// Run `task` on its own tokio task and classify how it ended.
pub async fn supervise<F, E>(name: &'static str, task: F) -> Outcome
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let outcome = match tokio::spawn(task).await {
        Ok(Ok(())) => Outcome::Clean,
        Ok(Err(e)) => Outcome::Failed(e.to_string()),
        Err(join) if join.is_panic() => {
            let payload = join.into_panic();
            Outcome::Panicked(panic_message(payload.as_ref()).to_string())
        }
        Err(join) => Outcome::Failed(join.to_string()),
    };

    match &outcome {
        Outcome::Clean => tracing::info!(task = name, "Task finished"),
        Outcome::Failed(reason) => {
            tracing::error!(task = name, error = %reason, "Fatal error, exiting")
        }
        Outcome::Panicked(reason) => {
            tracing::error!(task = name, panic = %reason, "Fatal panic, exiting")
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clean_exit() {
        let outcome = supervise("ok", async { Ok::<(), String>(()) }).await;
        assert_eq!(outcome, Outcome::Clean);
        assert!(!outcome.is_fatal());
    }

    #[tokio::test]
    async fn test_error_is_fatal() {
        let outcome = supervise("err", async { Err::<(), _>("bind failed") }).await;
        assert_eq!(outcome, Outcome::Failed("bind failed".into()));
        assert!(outcome.is_fatal());
    }

    #[tokio::test]
    async fn test_panic_is_fatal() {
        let outcome = supervise("panics", async {
            if true {
                panic!("corrupted state");
            }
            Ok::<(), String>(())
        })
        .await;
        assert_eq!(outcome, Outcome::Panicked("corrupted state".into()));
    }
}
