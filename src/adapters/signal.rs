use crate::core::ShutdownFlag;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    triggered: AtomicBool,
    notify: Notify,
}

/// Cloneable stop flag shared between the Ctrl-C listener, the sleeper and
/// the pipeline loop.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.inner.triggered.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Resolves once [`trigger`](Self::trigger) has been called.
    pub async fn wait(&self) {
        loop {
            // register before checking the flag so a concurrent trigger is not missed
            let notified = self.inner.notify.notified();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }

    /// Triggers the signal on the first Ctrl-C; a second one exits at once
    /// without writing output. If that lands while the output is being
    /// written, the partial `<output>.tmp` sibling is left behind and the
    /// target file is not replaced.
    pub fn listen_for_ctrl_c(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Unable to listen for Ctrl-C: {}", e);
                return;
            }
            tracing::warn!("⚠️ Interrupt received, finishing the current row (press Ctrl-C again to abort)");
            signal.trigger();

            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::error!("Second interrupt, exiting without saving");
                std::process::exit(130);
            }
        });
    }
}

impl ShutdownFlag for ShutdownSignal {
    fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }
}
