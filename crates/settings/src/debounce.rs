//! Coalescing writer: bursts of updates inside the quiet window collapse into a
//! single write of the most recent value.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Quiet period used for draft persistence.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DebounceError {
    #[error("debounced writer has shut down")]
    Closed,
}

enum Command<T> {
    Value(T),
    Flush(oneshot::Sender<()>),
}

/// Handle to a background task that persists the latest pushed value once no
/// new value has arrived for `window`. Dropping the handle writes any pending
/// value before the task exits.
#[derive(Debug)]
pub struct DebouncedWriter<T> {
    tx: mpsc::UnboundedSender<Command<T>>,
    task: JoinHandle<()>,
}

impl<T> DebouncedWriter<T>
where
    T: Send + 'static,
{
    /// Spawns the writer task on the current tokio runtime.
    pub fn spawn<F, E>(window: Duration, mut write: F) -> Self
    where
        F: FnMut(T) -> Result<(), E> + Send + 'static,
        E: fmt::Display + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command<T>>();
        let task = tokio::spawn(async move {
            let mut pending: Option<T> = None;
            let mut coalesced = 0usize;
            let mut commit = |value: T, coalesced: &mut usize| {
                debug!(coalesced = *coalesced, "writing debounced value");
                *coalesced = 0;
                if let Err(err) = write(value) {
                    warn!(error = %err, "debounced write failed");
                }
            };

            loop {
                let next = if pending.is_some() {
                    match tokio::time::timeout(window, rx.recv()).await {
                        Ok(next) => next,
                        Err(_) => {
                            if let Some(value) = pending.take() {
                                commit(value, &mut coalesced);
                            }
                            continue;
                        }
                    }
                } else {
                    rx.recv().await
                };

                match next {
                    Some(Command::Value(value)) => {
                        if pending.replace(value).is_some() {
                            coalesced += 1;
                        }
                    }
                    Some(Command::Flush(ack)) => {
                        if let Some(value) = pending.take() {
                            commit(value, &mut coalesced);
                        }
                        let _ = ack.send(());
                    }
                    None => {
                        if let Some(value) = pending.take() {
                            commit(value, &mut coalesced);
                        }
                        break;
                    }
                }
            }
        });
        Self { tx, task }
    }

    /// Queues `value`, replacing any value still waiting for the window.
    pub fn push(&self, value: T) -> Result<(), DebounceError> {
        self.tx
            .send(Command::Value(value))
            .map_err(|_| DebounceError::Closed)
    }

    /// Writes the pending value now and waits until it has been handed off.
    pub async fn flush(&self) -> Result<(), DebounceError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(ack_tx))
            .map_err(|_| DebounceError::Closed)?;
        ack_rx.await.map_err(|_| DebounceError::Closed)
    }

    /// Writes the pending value and waits for the task to finish.
    pub async fn close(self) -> Result<(), DebounceError> {
        let Self { tx, task } = self;
        drop(tx);
        task.await.map_err(|_| DebounceError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    fn recording_writer(window: Duration) -> (DebouncedWriter<u32>, Arc<Mutex<Vec<u32>>>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&written);
        let writer = DebouncedWriter::spawn(window, move |value| {
            sink.lock().unwrap().push(value);
            Ok::<_, Infallible>(())
        });
        (writer, written)
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_pushes_collapse_into_latest_value() {
        let (writer, written) = recording_writer(DEFAULT_DEBOUNCE_WINDOW);
        for value in 1..=5 {
            writer.push(value).unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(written.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*written.lock().unwrap(), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn separated_pushes_write_each_value() {
        let (writer, written) = recording_writer(DEFAULT_DEBOUNCE_WINDOW);
        writer.push(1).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        writer.push(2).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(*written.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_pending_value_immediately() {
        let (writer, written) = recording_writer(Duration::from_secs(60));
        writer.push(7).unwrap();
        writer.push(8).unwrap();
        writer.flush().await.unwrap();
        assert_eq!(*written.lock().unwrap(), vec![8]);

        writer.flush().await.unwrap();
        assert_eq!(*written.lock().unwrap(), vec![8]);
    }

    #[tokio::test(start_paused = true)]
    async fn close_writes_pending_value() {
        let (writer, written) = recording_writer(Duration::from_secs(60));
        writer.push(3).unwrap();
        writer.close().await.unwrap();
        assert_eq!(*written.lock().unwrap(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_writes_do_not_stop_the_task() {
        let attempts = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&attempts);
        let writer = DebouncedWriter::spawn(DEFAULT_DEBOUNCE_WINDOW, move |_: u32| {
            *counter.lock().unwrap() += 1;
            Err("disk full")
        });
        writer.push(1).unwrap();
        writer.flush().await.unwrap();
        writer.push(2).unwrap();
        writer.flush().await.unwrap();
        assert_eq!(*attempts.lock().unwrap(), 2);
    }
}
