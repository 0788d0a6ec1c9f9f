//! Real-time fan-out of new orders to connected dashboards.
//!
//! Delivery is best effort: no queue, no replay. An observer that is not subscribed when an
//! order is published never sees it and must reload the order list on (re)connect.

use crate::models::OrderResponse;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub enum OrderEvent {
    NewOrder(Arc<OrderResponse>),
}

impl OrderEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OrderEvent::NewOrder(_) => "newOrder",
        }
    }

    /// One Server-Sent Events frame.
    pub fn to_sse_frame(&self) -> Result<String, serde_json::Error> {
        let data = match self {
            OrderEvent::NewOrder(order) => serde_json::to_string(order.as_ref())?,
        };
        Ok(format!("event: {}\ndata: {}\n\n", self.name(), data))
    }
}

#[derive(Clone)]
pub struct OrderNotifier {
    sender: broadcast::Sender<OrderEvent>,
}

impl OrderNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns how many observers the event was handed to.
    pub fn publish(&self, event: OrderEvent) -> usize {
        match self.sender.send(event) {
            Ok(n) => {
                log::debug!("Order event delivered to {n} observer(s)");
                n
            }
            Err(_) => {
                log::debug!("No observers connected, order event dropped");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.sender.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Next event for an observer; lagging observers skip what they missed.
pub async fn next_event(receiver: &mut broadcast::Receiver<OrderEvent>) -> Option<OrderEvent> {
    loop {
        match receiver.recv().await {
            Ok(event) => return Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::warn!("Order observer lagged, {skipped} event(s) skipped");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{LineItem, OrderStatus, PaymentMethod, PaymentStatus};
    use crate::models::DeliveryAddress;
    use chrono::Utc;
    use uuid::Uuid;

    fn order() -> Arc<OrderResponse> {
        Arc::new(OrderResponse {
            id: Uuid::new_v4(),
            user: None,
            is_guest: true,
            customer_name: Some("Ayesha".into()),
            customer_email: None,
            customer_phone: Some("+923001234567".into()),
            chef: None,
            items: vec![LineItem {
                food: "f1".into(),
                name: "Nihari".into(),
                price: 600.0,
                quantity: 1,
                image: None,
            }],
            delivery_address: DeliveryAddress {
                street: "1 Main".into(),
                city: "Lahore".into(),
                phone: None,
            },
            total_amount: 750.0,
            payment_method: PaymentMethod::Cod,
            payment_status: PaymentStatus::Pending,
            payment_screenshot: None,
            paid_amount: None,
            payment_verified_at: None,
            verified_by: None,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_publish_without_observers() {
        let notifier = OrderNotifier::new(8);
        assert_eq!(notifier.publish(OrderEvent::NewOrder(order())), 0);
    }

    #[tokio::test]
    async fn test_all_connected_observers_receive() {
        let notifier = OrderNotifier::new(8);
        let mut admin = notifier.subscribe();
        let mut chef = notifier.subscribe();
        let placed = order();

        assert_eq!(notifier.publish(OrderEvent::NewOrder(placed.clone())), 2);

        for rx in [&mut admin, &mut chef] {
            let OrderEvent::NewOrder(got) = next_event(rx).await.unwrap();
            assert_eq!(got.id, placed.id);
        }
    }

    #[tokio::test]
    async fn test_late_observer_misses_earlier_events() {
        let notifier = OrderNotifier::new(8);
        let _keepalive = notifier.subscribe();
        notifier.publish(OrderEvent::NewOrder(order()));

        let mut late = notifier.subscribe();
        assert!(late.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_lagged_observer_skips_ahead() {
        let notifier = OrderNotifier::new(2);
        let mut rx = notifier.subscribe();
        let last = order();
        notifier.publish(OrderEvent::NewOrder(order()));
        notifier.publish(OrderEvent::NewOrder(order()));
        notifier.publish(OrderEvent::NewOrder(last.clone()));

        let mut seen = Vec::new();
        while let Ok(Some(OrderEvent::NewOrder(o))) =
            tokio::time::timeout(std::time::Duration::from_millis(20), next_event(&mut rx)).await
        {
            seen.push(o.id);
        }
        assert_eq!(seen.last(), Some(&last.id));
        assert!(seen.len() <= 2);
    }

    #[test]
    fn test_sse_frame() {
        let placed = order();
        let frame = OrderEvent::NewOrder(placed.clone()).to_sse_frame().unwrap();
        assert!(frame.starts_with("event: newOrder\ndata: {"));
        assert!(frame.contains(&placed.id.to_string()));
        assert!(frame.ends_with("\n\n"));
    }
}
