use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::oneshot;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("delay cancelled")]
pub struct Cancelled;

/// Holder of at most one pending simulated delay.
///
/// Arming the slot again, calling [`DelaySlot::cancel`], or dropping the slot
/// resolves the previously armed [`ScopedDelay`] as [`Cancelled`].
#[derive(Debug, Default)]
pub struct DelaySlot {
    current: Mutex<Option<oneshot::Sender<()>>>,
}

impl DelaySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&self, after: Duration) -> ScopedDelay {
        let (tx, rx) = oneshot::channel();
        let previous = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(tx);
        drop(previous); // wakes the superseded waiter
        ScopedDelay { after, cancel: Some(rx) }
    }

    pub fn cancel(&self) {
        let _ = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
    }
}

/// One armed delay. Consumed by [`ScopedDelay::wait`].
#[derive(Debug)]
pub struct ScopedDelay {
    after: Duration,
    cancel: Option<oneshot::Receiver<()>>,
}

impl ScopedDelay {
    /// A delay nothing can cancel; used when there is no session to own a slot.
    pub fn detached(after: Duration) -> Self {
        Self { after, cancel: None }
    }

    pub fn duration(&self) -> Duration {
        self.after
    }

    pub async fn wait(self) -> Result<(), Cancelled> {
        let ScopedDelay { after, cancel } = self;
        let Some(cancel) = cancel else {
            tokio::time::sleep(after).await;
            return Ok(());
        };
        tokio::select! {
            biased;
            _ = cancel => Err(Cancelled),
            _ = tokio::time::sleep(after) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn fires_after_exact_duration() {
        let slot = DelaySlot::new();
        let fut = slot.arm(Duration::from_millis(800)).wait();
        tokio::pin!(fut);
        assert!(timeout(Duration::from_millis(799), &mut fut).await.is_err());
        let res = timeout(Duration::from_millis(1), &mut fut).await;
        assert!(matches!(res, Ok(Ok(()))));
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_cancels_previous() {
        let slot = DelaySlot::new();
        let first = slot.arm(Duration::from_millis(800));
        let second = slot.arm(Duration::from_millis(800));
        assert_eq!(first.wait().await, Err(Cancelled));
        assert_eq!(second.wait().await, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_slot_cancels() {
        let slot = DelaySlot::new();
        let pending = slot.arm(Duration::from_secs(2));
        drop(slot);
        assert_eq!(pending.wait().await, Err(Cancelled));
    }
}
