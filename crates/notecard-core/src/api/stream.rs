use tokio::task::JoinHandle;

/// Cancellation handle for a spawned SSE stream.
///
/// Dropping the handle does not stop the stream; call [`abort`](Self::abort).
#[derive(Debug)]
pub struct StreamHandle {
    task: JoinHandle<()>,
}

impl StreamHandle {
    pub(crate) const fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    /// Stops the stream. No further payloads or error callbacks are delivered.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the stream to end. Returns `false` if it was aborted.
    pub async fn finished(self) -> bool {
        match self.task.await {
            Ok(()) => true,
            Err(error) => {
                if !error.is_cancelled() {
                    tracing::warn!(%error, "Stream task panicked");
                }
                false
            }
        }
    }
}
