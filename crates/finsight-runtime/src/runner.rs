//! Bounded execution of a single operation
//!
//! Every invocation spawns exactly one worker, waits on a one-shot completion
//! signal for at most the deadline, and produces one [`Outcome`]:
//!
//! 1. The worker runs the operation and captures its result, converting a
//!    panic into [`Failure::Panicked`].
//! 2. The worker sends the captured result over a one-shot channel.
//! 3. The caller waits on the receiving end up to the deadline.
//! 4. On timeout the caller cancels the operation's token and drops the
//!    receiver; a late send then fails and the worker logs the discarded
//!    result instead of delivering it.
//!
//! [`run`] and [`run_cancellable`] put the operation on a dedicated OS thread
//! so blocking calls cannot stall the deadline. [`run_async`] puts a future
//! on the tokio runtime and must be called from within one.

use crate::error::{Result, RunnerError};
use crate::outcome::{Failure, Outcome};
use futures::FutureExt;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What the worker observed: the operation's result, or a panic message
type Settled<T, E> = std::result::Result<std::result::Result<T, E>, String>;

/// Run a zero-argument blocking operation under a deadline
///
/// The operation runs on its own thread. If it has not finished when the
/// deadline elapses, `Outcome::TimedOut` is returned at once and the thread
/// is left to finish in the background; it does not keep the process alive.
pub fn run<T, E, F>(operation: F, deadline: Duration, label: &str) -> Result<Outcome<T, E>>
where
    F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    run_cancellable(move |_| operation(), deadline, label)
}

/// Run a blocking operation that can observe cancellation
///
/// The operation receives a token that is cancelled when the deadline
/// elapses. Checking it is optional; the runner returns on time either way.
pub fn run_cancellable<T, E, F>(
    operation: F,
    deadline: Duration,
    label: &str,
) -> Result<Outcome<T, E>>
where
    F: FnOnce(CancellationToken) -> std::result::Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    check_deadline(deadline, label)?;

    let token = CancellationToken::new();
    let worker_token = token.clone();
    let worker_label = label.to_string();
    // Capacity 1 so the worker's send never blocks, even after the caller left.
    let (tx, rx) = mpsc::sync_channel::<Settled<T, E>>(1);

    debug!(label, deadline_ms = deadline.as_millis() as u64, "Starting bounded operation");
    let started = Instant::now();

    thread::Builder::new()
        .name("finsight-bounded".to_string())
        .spawn(move || {
            let settled = catch_unwind(AssertUnwindSafe(|| operation(worker_token)))
                .map_err(|payload| panic_message(payload.as_ref()));

            if let Err(mpsc::SendError(settled)) = tx.send(settled) {
                report_discarded(&worker_label, &settled);
            }
        })
        .map_err(|e| RunnerError::SpawnFailed {
            label: label.to_string(),
            reason: e.to_string(),
        })?;

    let outcome = match rx.recv_timeout(deadline) {
        Ok(settled) => into_outcome(settled),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            token.cancel();
            Outcome::TimedOut { deadline }
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Outcome::Failed(Failure::Panicked(
            "worker exited without reporting a result".to_string(),
        )),
    };

    log_outcome(label, &outcome, started.elapsed());
    Ok(outcome)
}

/// Run an async operation under a deadline
///
/// The future is built by `operation` from a cancellation token and then
/// spawned as its own task, so the caller can return at the deadline while
/// the task is still pending. Must be called from within a tokio runtime.
/// Futures that block their thread should go through [`run`] instead.
pub async fn run_async<T, E, F, Fut>(
    operation: F,
    deadline: Duration,
    label: &str,
) -> Result<Outcome<T, E>>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    check_deadline(deadline, label)?;

    let token = CancellationToken::new();
    let future = operation(token.clone());
    let worker_label = label.to_string();
    let (tx, rx) = oneshot::channel::<Settled<T, E>>();

    debug!(label, deadline_ms = deadline.as_millis() as u64, "Starting bounded task");
    let started = Instant::now();

    tokio::spawn(async move {
        let settled = AssertUnwindSafe(future)
            .catch_unwind()
            .await
            .map_err(|payload| panic_message(payload.as_ref()));

        if let Err(settled) = tx.send(settled) {
            report_discarded(&worker_label, &settled);
        }
    });

    let outcome = match tokio::time::timeout(deadline, rx).await {
        Ok(Ok(settled)) => into_outcome(settled),
        Ok(Err(_)) => Outcome::Failed(Failure::Panicked(
            "task exited without reporting a result".to_string(),
        )),
        Err(_) => {
            token.cancel();
            Outcome::TimedOut { deadline }
        }
    };

    log_outcome(label, &outcome, started.elapsed());
    Ok(outcome)
}

fn check_deadline(deadline: Duration, label: &str) -> Result<()> {
    if deadline.is_zero() {
        return Err(RunnerError::InvalidDeadline {
            label: label.to_string(),
        });
    }
    Ok(())
}

fn into_outcome<T, E>(settled: Settled<T, E>) -> Outcome<T, E> {
    match settled {
        Ok(Ok(value)) => Outcome::Completed(value),
        Ok(Err(error)) => Outcome::Failed(Failure::Error(error)),
        Err(message) => Outcome::Failed(Failure::Panicked(message)),
    }
}

fn log_outcome<T, E: Display>(label: &str, outcome: &Outcome<T, E>, elapsed: Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    match outcome {
        Outcome::Completed(_) => info!(label, elapsed_ms, "Operation completed"),
        Outcome::Failed(Failure::Error(e)) => {
            warn!(label, elapsed_ms, error = %e, "Operation failed");
        }
        Outcome::Failed(Failure::Panicked(message)) => {
            error!(label, elapsed_ms, panic = %message, "Operation panicked");
        }
        Outcome::TimedOut { deadline } => warn!(
            label,
            deadline_ms = deadline.as_millis() as u64,
            "Operation timed out; worker signalled and detached"
        ),
    }
}

/// Log a result that arrived after the caller already received `TimedOut`
fn report_discarded<T, E: Display>(label: &str, settled: &Settled<T, E>) {
    match settled {
        Ok(Ok(_)) => debug!(label, "Late result discarded after timeout"),
        Ok(Err(e)) => warn!(label, error = %e, "Late failure discarded after timeout"),
        Err(message) => warn!(label, panic = %message, "Late panic discarded after timeout"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
