mod monitor;

use async_trait::async_trait;

pub use monitor::NetworkMonitor;

/// Answers "is there a usable network right now?". Implementations must
/// never error; an unanswerable probe means offline.
#[async_trait]
pub trait Connectivity: Send + Sync + 'static {
    async fn is_online(&self) -> bool;
}
