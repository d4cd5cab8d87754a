//! Outbound domain events
//!
//! Events are published after the state change that raised them has been
//! persisted. NATS subjects are `storefront.<aggregate>.<event>`.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::events::{DomainEvent, UserEvent};
use crate::{EcommerceError, Result};

pub const SUBJECT_PREFIX: &str = "storefront";

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &DomainEvent) -> Result<()>;
}

/// Publishes JSON-encoded events to NATS.
pub struct NatsPublisher {
    client: async_nats::Client,
}

impl NatsPublisher {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| EcommerceError::internal(format!("NATS connection failed: {e}")))?;
        info!(url, "Connected to NATS");
        Ok(Self::new(client))
    }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<()> {
        let subject = format!("{SUBJECT_PREFIX}.{}", event.subject());
        let payload = serde_json::to_vec(event).map_err(|e| EcommerceError::internal(e.to_string()))?;
        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| EcommerceError::internal(format!("failed to publish {subject}: {e}")))?;
        debug!(%subject, "Published event");
        Ok(())
    }
}

/// Fallback when no broker is configured: events only reach the log.
#[derive(Default)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<()> {
        match event {
            // Links carry one-time tokens; keep them out of the log.
            DomainEvent::User(UserEvent::Registered { user_id, .. })
            | DomainEvent::User(UserEvent::PasswordResetRequested { user_id, .. }) => {
                info!(subject = event.subject(), %user_id, "Domain event (not delivered)");
            }
            DomainEvent::Order(order_event) => {
                info!(subject = event.subject(), event = ?order_event, "Domain event (not delivered)");
            }
        }
        Ok(())
    }
}
