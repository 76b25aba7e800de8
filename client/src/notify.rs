//! Change notifications for UI observers.

use psorcast_engine::ChangeEvent;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 64;

/// Broadcasts [`ChangeEvent`]s to every subscriber.
///
/// Cloning shares the underlying channel. Subscribers that fall behind by
/// more than the capacity skip the oldest events.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Publish `event`, returning how many subscribers will see it.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!(%event, receivers, "Published change");
                receivers
            }
            Err(_) => 0,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
