//! Domain event publishing.

use tracing::{debug, warn};

use crate::domain::events::DomainEvent;

const SUBJECT_PREFIX: &str = "storefront";

/// Publishes to NATS subject `storefront.<kind>`. Without a client events
/// are only logged. Failures are logged and never retried.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub fn disabled() -> Self { Self::default() }

    pub fn subject(event: &DomainEvent) -> String { format!("{SUBJECT_PREFIX}.{}", event.kind()) }

    pub async fn publish(&self, event: &DomainEvent) {
        let subject = Self::subject(event);
        let Some(client) = &self.nats else {
            debug!(%subject, "Domain event");
            return;
        };
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%subject, error = %e, "Failed to serialize event");
                return;
            }
        };
        if let Err(e) = client.publish(subject.clone(), payload.into()).await {
            warn!(%subject, error = %e, "Failed to publish event");
        }
    }

    pub async fn publish_all(&self, events: Vec<DomainEvent>) {
        for event in &events {
            self.publish(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::domain::aggregates::OrderStatus;
    use crate::domain::events::OrderEvent;

    #[test]
    fn test_subject_and_payload() {
        let event = DomainEvent::Order(OrderEvent::StatusChanged {
            order_id: Uuid::nil(),
            from: OrderStatus::Pending,
            to: OrderStatus::Processing,
        });
        assert_eq!(EventPublisher::subject(&event), "storefront.order.status_changed");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "order");
        assert_eq!(json["event"], "status_changed");
        assert_eq!(json["to"], "processing");
    }
}
