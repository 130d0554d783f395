//! Restart-on-failure supervision for long-lived background tasks.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs the task built by `make` until `cancel` fires, rebuilding and
/// restarting it after `restart_delay` whenever it panics, fails or returns
/// early. The returned handle resolves to the number of restarts.
pub fn spawn_supervised<F, Fut, E>(
    name: impl Into<String>,
    restart_delay: Duration,
    cancel: CancellationToken,
    make: F,
) -> JoinHandle<u64>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let name = name.into();
    tokio::spawn(async move {
        let mut restarts = 0u64;
        loop {
            let outcome = tokio::spawn(make()).await;
            if cancel.is_cancelled() {
                break;
            }

            match outcome {
                Ok(Ok(())) => warn!(task = %name, "task returned before shutdown"),
                Ok(Err(e)) => error!(task = %name, error = %e, "task failed"),
                Err(e) if e.is_panic() => error!(task = %name, error = %e, "task panicked"),
                Err(e) => error!(task = %name, error = %e, "task aborted"),
            }

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(restart_delay) => {}
            }
            restarts += 1;
            info!(task = %name, restarts, "restarting task");
        }
        info!(task = %name, "supervisor stopped");
        restarts
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_panicking_task_is_restarted() {
        // Arrange
        let runs = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let task_runs = Arc::clone(&runs);
        let task_cancel = cancel.clone();

        // Act
        let handle = spawn_supervised("flaky", Duration::from_millis(5), cancel.clone(), move || {
            let runs = Arc::clone(&task_runs);
            let cancel = task_cancel.clone();
            async move {
                assert!(runs.fetch_add(1, Ordering::SeqCst) > 0, "first run panics");
                cancel.cancelled().await;
                Ok::<(), String>(())
            }
        });
        while runs.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cancel.cancel();

        // Assert
        assert_eq!(handle.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failing_task_is_restarted_until_cancelled() {
        let runs = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let task_runs = Arc::clone(&runs);

        let handle = spawn_supervised("failing", Duration::from_millis(1), cancel.clone(), move || {
            let runs = Arc::clone(&task_runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("broker unreachable")
            }
        });
        while runs.load(Ordering::SeqCst) < 3 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        cancel.cancel();

        assert!(handle.await.unwrap() >= 2);
    }

    #[tokio::test]
    async fn test_cancelled_task_is_not_restarted() {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let handle = spawn_supervised("steady", Duration::from_millis(1), cancel.clone(), move || {
            let cancel = task_cancel.clone();
            async move {
                cancel.cancelled().await;
                Ok::<(), String>(())
            }
        });
        cancel.cancel();

        assert_eq!(handle.await.unwrap(), 0);
    }
}
