//! Best-effort publication of hotel lifecycle events.
//!
//! Events are POSTed to `<notificationsUri>/notifications`. Delivery is at-most-once:
//! [`dispatch`] logs failures and never returns them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

pub const HOTEL_RESOURCE_TYPE: &str = "hotel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub wt_index: String,
    pub resource_type: String,
    pub resource_address: String,
    pub scope: Scope,
}

impl Notification {
    fn hotel(wt_index: &str, address: &str, scope: Scope) -> Self {
        Self {
            wt_index: wt_index.to_string(),
            resource_type: HOTEL_RESOURCE_TYPE.to_string(),
            resource_address: address.to_string(),
            scope,
        }
    }

    pub fn hotel_created(wt_index: &str, address: &str) -> Self {
        Self::hotel(
            wt_index,
            address,
            Scope {
                action: Action::Create,
                subjects: None,
            },
        )
    }

    pub fn hotel_updated(wt_index: &str, address: &str, subjects: Vec<String>) -> Self {
        Self::hotel(
            wt_index,
            address,
            Scope {
                action: Action::Update,
                subjects: Some(subjects),
            },
        )
    }

    pub fn hotel_deleted(wt_index: &str, address: &str) -> Self {
        Self::hotel(
            wt_index,
            address,
            Scope {
                action: Action::Delete,
                subjects: None,
            },
        )
    }
}

/// `<uri>/notifications`, tolerating a trailing slash on `uri`.
pub fn endpoint(notifications_uri: &str) -> String {
    let separator = if notifications_uri.ends_with('/') { "" } else { "/" };
    format!("{notifications_uri}{separator}notifications")
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, notifications_uri: &str, notification: &Notification) -> Result<()>;
}

/// Notifier delivering events over HTTP.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: Client,
}

impl HttpNotifier {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("cannot build notification client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn publish(&self, notifications_uri: &str, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .post(endpoint(notifications_uri))
            .json(notification)
            .send()
            .await
            .map_err(|e| SyncError::UpstreamBadGateway(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::UpstreamBadGateway(format!(
                "notification service answered {status}"
            )));
        }
        Ok(())
    }
}

/// Publish and swallow any failure.
pub async fn dispatch<N>(notifier: &N, notifications_uri: &str, notification: &Notification)
where
    N: Notifier + ?Sized,
{
    match notifier.publish(notifications_uri, notification).await {
        Ok(()) => log::debug!(
            "[NOTIFY] {:?} for {} sent to {notifications_uri}",
            notification.scope.action,
            notification.resource_address
        ),
        Err(e) => log::warn!(
            "[NOTIFY] could not publish {:?} for {} to {notifications_uri}: {e}",
            notification.scope.action,
            notification.resource_address
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_normalizes_trailing_slash() {
        assert_eq!(
            endpoint("http://notifications.example"),
            "http://notifications.example/notifications"
        );
        assert_eq!(
            endpoint("http://notifications.example/"),
            "http://notifications.example/notifications"
        );
    }

    #[test]
    fn created_event_has_no_subjects() {
        let n = Notification::hotel_created("0xwtIndex", "0xresourceAddress");
        assert_eq!(
            serde_json::to_value(&n).unwrap(),
            json!({
                "wtIndex": "0xwtIndex",
                "resourceType": "hotel",
                "resourceAddress": "0xresourceAddress",
                "scope": {"action": "create"},
            })
        );
    }

    #[test]
    fn updated_event_carries_subjects() {
        let n = Notification::hotel_updated("0xwtIndex", "0xresourceAddress", vec!["ratePlans".into()]);
        assert_eq!(
            serde_json::to_value(&n).unwrap()["scope"],
            json!({"action": "update", "subjects": ["ratePlans"]})
        );
        let deleted = Notification::hotel_deleted("0xwtIndex", "0xresourceAddress");
        assert_eq!(serde_json::to_value(&deleted).unwrap()["scope"]["action"], "delete");
    }

    #[tokio::test]
    async fn dispatch_swallows_delivery_failures() {
        let notifier = HttpNotifier::new(Duration::from_millis(300)).unwrap();
        let n = Notification::hotel_deleted("0xwtIndex", "0xresourceAddress");
        // Nothing listens on port 1; this must only log.
        dispatch(&notifier, "http://127.0.0.1:1", &n).await;
    }
}
