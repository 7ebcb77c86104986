//! Outbound notifications and the in-process price feed.
//!
//! Receipt and cancellation notices are best effort: a failure to deliver
//! never fails the operation that triggered it, so the trait methods do not
//! return errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{Cancellation, PassPrice, Sale};

pub trait Notifier: Send + Sync {
    /// A sale was recorded; send the customer their ticket receipt.
    fn ticket_receipt(&self, sale: &Sale);

    /// A cancellation request was filed and is pending review.
    fn cancellation_received(&self, cancellation: &Cancellation);

    /// A cancellation was approved or rejected.
    fn cancellation_resolved(&self, cancellation: &Cancellation);
}

/// Writes each notice to the log instead of delivering it anywhere.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn ticket_receipt(&self, sale: &Sale) {
        tracing::info!(
            ticket_id = %sale.ticket_id,
            email = %sale.email,
            pass_type = %sale.pass_type,
            quantity = sale.quantity,
            amount = sale.amount,
            "ticket receipt"
        );
    }

    fn cancellation_received(&self, cancellation: &Cancellation) {
        tracing::info!(
            ticket_id = %cancellation.ticket_id,
            email = %cancellation.email,
            "cancellation request received"
        );
    }

    fn cancellation_resolved(&self, cancellation: &Cancellation) {
        tracing::info!(
            ticket_id = %cancellation.ticket_id,
            email = %cancellation.email,
            status = %cancellation.status,
            "cancellation resolved"
        );
    }
}

/// Full snapshot of the pricing table, published after every successful save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub prices: Vec<PassPrice>,
    pub updated_at: DateTime<Utc>,
}

/// Broadcast channel fanning price changes out to interested tasks. Counter
/// sessions subscribe so a price change mid-shift reaches them without a
/// restart. Lagging subscribers drop old snapshots, which is fine since only
/// the latest one matters.
#[derive(Debug, Clone)]
pub struct PriceFeed {
    tx: broadcast::Sender<PriceUpdate>,
}

impl PriceFeed {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PriceUpdate> {
        self.tx.subscribe()
    }

    /// Publishes a snapshot. Returns the number of subscribers that saw it;
    /// zero subscribers is not an error.
    pub fn publish(&self, prices: Vec<PassPrice>) -> usize {
        let update = PriceUpdate {
            prices,
            updated_at: Utc::now(),
        };
        self.tx.send(update).unwrap_or(0)
    }
}

impl Default for PriceFeed {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PassType;

    #[tokio::test]
    async fn test_subscribers_receive_published_prices() {
        let feed = PriceFeed::default();
        let mut rx = feed.subscribe();

        let delivered = feed.publish(vec![PassPrice {
            pass_type: PassType::Express,
            price: 2500.00,
        }]);
        assert_eq!(delivered, 1);

        let update = rx.recv().await.unwrap();
        assert_eq!(update.prices.len(), 1);
        assert_eq!(update.prices[0].price, 2500.00);
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let feed = PriceFeed::default();
        assert_eq!(
            feed.publish(vec![PassPrice {
                pass_type: PassType::Junior,
                price: 900.00,
            }]),
            0
        );
    }
}
