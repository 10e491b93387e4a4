//! 通知校验 - 消息非空 + 渠道相关的接收者字段检查

use super::error::ValidationError;
use super::model::{Channel, Notification, META_DEVICE_TOKEN, META_SLACK_CHANNEL};
use regex::Regex;

/// 通知校验器
#[derive(Debug, Clone)]
pub struct NotificationValidator {
    email: Regex,
    phone: Regex,
    slack_channel: Regex,
}

impl NotificationValidator {
    pub fn new() -> Self {
        Self {
            email: Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").unwrap(),
            // E.164 风格，允许空格/短横线分隔
            phone: Regex::new(r"^\+?[0-9][0-9 \-]{5,18}[0-9]$").unwrap(),
            // #channel、@user 或 Slack 频道 ID
            slack_channel: Regex::new(r"^([#@][a-z0-9._\-]{1,80}|[CGD][A-Z0-9]{8,})$").unwrap(),
        }
    }

    /// 消息体检查（与渠道无关）
    pub fn validate_message(&self, notification: &Notification) -> Result<(), ValidationError> {
        if notification.message().trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        Ok(())
    }

    /// 检查接收者是否满足渠道要求
    pub fn validate_recipient(&self, notification: &Notification, channel: Channel) -> Result<(), ValidationError> {
        let recipient = notification.recipient();

        match channel {
            Channel::Email => {
                let email = recipient
                    .address_for(Channel::Email)
                    .ok_or(ValidationError::MissingField { channel, field: "email" })?;
                if !self.email.is_match(email.trim()) {
                    return Err(ValidationError::InvalidFormat {
                        field: "email",
                        value: email.to_string(),
                    });
                }
            }
            Channel::Sms => {
                let phone = recipient
                    .address_for(Channel::Sms)
                    .ok_or(ValidationError::MissingField { channel, field: "phone" })?;
                if !self.phone.is_match(phone.trim()) {
                    return Err(ValidationError::InvalidFormat {
                        field: "phone",
                        value: phone.to_string(),
                    });
                }
            }
            Channel::Push => {
                recipient
                    .address_for(Channel::Push)
                    .ok_or(ValidationError::MissingField { channel, field: META_DEVICE_TOKEN })?;
            }
            Channel::Slack => {
                let target = recipient
                    .address_for(Channel::Slack)
                    .ok_or(ValidationError::MissingField { channel, field: META_SLACK_CHANNEL })?;
                if !self.slack_channel.is_match(target.trim()) {
                    return Err(ValidationError::InvalidFormat {
                        field: META_SLACK_CHANNEL,
                        value: target.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for NotificationValidator {
    fn default() -> Self {
        Self::new()
    }
}
