use std::future::Future;
use std::pin::Pin;

/// A future that resolves when the run should stop.
pub type Interrupt = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Resolves on Ctrl-C. When no listener can be installed it never resolves,
/// so a failed install leaves the run uninterruptible rather than aborted.
pub async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::debug!("cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

pub fn ctrl_c() -> Interrupt {
    Box::pin(interrupted())
}
