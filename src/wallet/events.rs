//! Wallet events
//!
//! Fan-out of state changes to observers. The bus is owned by the wallet
//! and hands out plain receivers, so a subscriber never holds the wallet
//! alive. A slow subscriber lags and drops old events rather than blocking
//! a mutation.

use tokio::sync::broadcast;

use crate::mint_url::MintUrl;

/// Buffered events per subscriber before lagging
const EVENT_CAPACITY: usize = 256;

/// Event types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The proof set of a mint changed
    ProofsUpdated {
        /// Mint whose proofs changed
        mint_url: MintUrl,
    },
    /// A quote was created or changed state
    QuoteUpdated {
        /// Quote id
        quote_id: String,
    },
    /// A history entry was appended
    HistoryUpdated,
}

/// Broadcast bus for [`WalletEvent`]
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WalletEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create new [`EventBus`]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Subscribe to all events
    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers
    ///
    /// Publishing with no subscribers is a no-op.
    pub fn publish(&self, event: WalletEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let mint_url = MintUrl::from_str("https://mint.example").unwrap();
        bus.publish(WalletEvent::ProofsUpdated {
            mint_url: mint_url.clone(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event, WalletEvent::ProofsUpdated { mint_url });
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.publish(WalletEvent::HistoryUpdated);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_all_subscribers_receive() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(WalletEvent::HistoryUpdated);

        assert_eq!(rx1.recv().await.unwrap(), WalletEvent::HistoryUpdated);
        assert_eq!(rx2.recv().await.unwrap(), WalletEvent::HistoryUpdated);
    }
}
