use crate::adapters::signal::ShutdownSignal;
use crate::core::Sleeper;
use std::time::Duration;

/// Real delay on the tokio timer. With a shutdown signal attached, a pending
/// sleep ends as soon as the signal fires.
#[derive(Debug, Clone, Default)]
pub struct TokioSleeper {
    shutdown: Option<ShutdownSignal>,
}

impl TokioSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }
}

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }

        match &self.shutdown {
            Some(signal) => {
                tokio::select! {
                    _ = tokio::time::sleep(duration) => {}
                    _ = signal.wait() => {
                        tracing::debug!("Sleep cut short by shutdown");
                    }
                }
            }
            None => tokio::time::sleep(duration).await,
        }
    }
}
