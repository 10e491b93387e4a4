//! 发送结果

use super::model::{Channel, Notification};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一次终态尝试的结果（不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendOutcome {
    pub notification_id: String,
    pub sender_name: String,
    pub channel: Channel,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendOutcome {
    pub fn success(notification: &Notification, sender_name: impl Into<String>, channel: Channel) -> Self {
        Self {
            notification_id: notification.id().to_string(),
            sender_name: sender_name.into(),
            channel,
            timestamp: Utc::now(),
            success: true,
            error: None,
        }
    }

    pub fn failure(
        notification: &Notification,
        sender_name: impl Into<String>,
        channel: Channel,
        error: impl Into<String>,
    ) -> Self {
        Self {
            notification_id: notification.id().to_string(),
            sender_name: sender_name.into(),
            channel,
            timestamp: Utc::now(),
            success: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::model::Recipient;

    #[test]
    fn test_failure_outcome_serializes_error() {
        let notification = Notification::new(Recipient::new(), "x").with_id("n-1");
        let outcome = SendOutcome::failure(&notification, "email", Channel::Email, "timeout");

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["notification_id"], "n-1");
        assert_eq!(json["channel"], "email");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "timeout");
    }

    #[test]
    fn test_success_outcome_omits_error() {
        let notification = Notification::new(Recipient::new(), "x");
        let outcome = SendOutcome::success(&notification, "sms", Channel::Sms);

        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("error").is_none());
        assert!(outcome.success);
    }
}
