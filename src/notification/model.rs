//! 通知数据模型 - Notification / Recipient / Priority / Channel

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 推送渠道使用的 metadata 键
pub const META_DEVICE_TOKEN: &str = "device_token";
/// Slack 渠道使用的 metadata 键
pub const META_SLACK_CHANNEL: &str = "slack_channel";
/// 邮件主题
pub const META_SUBJECT: &str = "subject";

/// 通知渠道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    Push,
    Slack,
}

impl Channel {
    /// 所有渠道，按默认解析优先级排序
    pub const ALL: [Channel; 4] = [Channel::Email, Channel::Sms, Channel::Push, Channel::Slack];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Push => "push",
            Channel::Slack => "slack",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(Channel::Email),
            "sms" => Ok(Channel::Sms),
            "push" => Ok(Channel::Push),
            "slack" => Ok(Channel::Slack),
            other => Err(format!("unknown channel: {}", other)),
        }
    }
}

/// 优先级（有序：Low < Normal < High < Critical）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// 接收者
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    /// 邮箱地址
    pub email: Option<String>,
    /// 手机号
    pub phone: Option<String>,
    /// 渠道相关的标识（device_token / slack_channel / subject）
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Recipient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_device_token(self, token: impl Into<String>) -> Self {
        self.with_metadata(META_DEVICE_TOKEN, token)
    }

    pub fn with_slack_channel(self, channel: impl Into<String>) -> Self {
        self.with_metadata(META_SLACK_CHANNEL, channel)
    }

    /// 获取非空 metadata 值
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    /// 渠道所需的地址字段（空白视为缺失）
    pub fn address_for(&self, channel: Channel) -> Option<&str> {
        fn non_blank(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.trim().is_empty())
        }
        match channel {
            Channel::Email => non_blank(&self.email),
            Channel::Sms => non_blank(&self.phone),
            Channel::Push => self.meta(META_DEVICE_TOKEN),
            Channel::Slack => self.meta(META_SLACK_CHANNEL),
        }
    }
}

/// 通知（构造后不可变，修改通过 `with_*` 产生新实例）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    id: String,
    recipient: Recipient,
    message: String,
    priority: Priority,
    template_variables: Option<HashMap<String, String>>,
}

impl Notification {
    /// 创建通知，id 为随机 UUID
    pub fn new(recipient: Recipient, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            recipient,
            message: message.into(),
            priority: Priority::default(),
            template_variables: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.template_variables
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.template_variables = Some(variables);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn template_variables(&self) -> Option<&HashMap<String, String>> {
        self.template_variables.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Low < Priority::Normal);
        assert!(Priority::Normal < Priority::High);
        assert!(Priority::High < Priority::Critical);
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn test_priority_text_forms_agree() {
        for priority in [Priority::Low, Priority::Normal, Priority::High, Priority::Critical] {
            let shown = priority.to_string();
            assert_eq!(shown, priority.as_str());
            assert_eq!(shown.parse::<Priority>(), Ok(priority));
            assert_eq!(serde_json::to_value(priority).unwrap(), shown);
        }
    }

    #[test]
    fn test_channel_from_str() {
        assert_eq!("EMAIL".parse::<Channel>(), Ok(Channel::Email));
        assert_eq!(" slack ".parse::<Channel>(), Ok(Channel::Slack));
        assert!("fax".parse::<Channel>().is_err());
    }

    #[test]
    fn test_channel_display() {
        assert_eq!(format!("{}", Channel::Sms), "sms");
        assert_eq!(Channel::Push.as_str(), "push");
    }

    #[test]
    fn test_notification_ids_are_unique() {
        let a = Notification::new(Recipient::new(), "hi");
        let b = Notification::new(Recipient::new(), "hi");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_with_message_keeps_identity() {
        let original = Notification::new(Recipient::new().with_email("a@b.io"), "Hello {{name}}")
            .with_priority(Priority::High)
            .with_variable("name", "Ada");
        let updated = original.clone().with_message("Hello Ada");

        assert_eq!(updated.id(), original.id());
        assert_eq!(updated.priority(), Priority::High);
        assert_eq!(original.message(), "Hello {{name}}");
        assert_eq!(updated.message(), "Hello Ada");
    }

    #[test]
    fn test_address_for_ignores_blank_values() {
        let recipient = Recipient::new()
            .with_email("   ")
            .with_phone("+15551234567")
            .with_device_token("");

        assert_eq!(recipient.address_for(Channel::Email), None);
        assert_eq!(recipient.address_for(Channel::Sms), Some("+15551234567"));
        assert_eq!(recipient.address_for(Channel::Push), None);
        assert_eq!(recipient.address_for(Channel::Slack), None);
    }
}
