//! 默认渠道解析
//!
//! 未指定渠道时，按固定优先级 email > sms > push > slack 选择第一个
//! 接收者数据可用且已注册发送器的渠道。

use super::error::DispatchError;
use super::model::{Channel, Recipient};
use super::registry::ChannelRegistry;
use tracing::debug;

/// 默认渠道解析器
pub struct ChannelResolver;

impl ChannelResolver {
    pub fn resolve(recipient: &Recipient, registry: &ChannelRegistry) -> Result<Channel, DispatchError> {
        for channel in Channel::ALL {
            if recipient.address_for(channel).is_some() && registry.has(channel) {
                debug!(channel = %channel, "Resolved default channel");
                return Ok(channel);
            }
        }
        Err(DispatchError::ChannelUnresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::error::SendError;
    use crate::notification::model::Notification;
    use crate::notification::outcome::SendOutcome;
    use crate::notification::sender::Sender;
    use std::sync::Arc;

    struct AnySender;

    impl Sender for AnySender {
        fn name(&self) -> &str {
            "any"
        }

        fn supports(&self, _channel: Channel) -> bool {
            true
        }

        fn send(&self, notification: &Notification) -> Result<SendOutcome, SendError> {
            Ok(SendOutcome::success(notification, "any", Channel::Email))
        }
    }

    fn registry_with(channels: &[Channel]) -> ChannelRegistry {
        let mut registry = ChannelRegistry::new();
        for channel in channels {
            registry.register(*channel, Arc::new(AnySender)).unwrap();
        }
        registry
    }

    #[test]
    fn test_resolve_prefers_email() {
        let registry = registry_with(&Channel::ALL);
        let recipient = Recipient::new()
            .with_email("ada@example.com")
            .with_phone("+15551234567")
            .with_device_token("tok")
            .with_slack_channel("#ops");

        assert_eq!(ChannelResolver::resolve(&recipient, &registry).unwrap(), Channel::Email);
    }

    #[test]
    fn test_resolve_phone_only() {
        let registry = registry_with(&[Channel::Sms]);
        let recipient = Recipient::new().with_phone("+15551234567");

        assert_eq!(ChannelResolver::resolve(&recipient, &registry).unwrap(), Channel::Sms);
    }

    #[test]
    fn test_resolve_skips_channel_without_sender() {
        // Email data present but no email sender: falls through to push
        let registry = registry_with(&[Channel::Push, Channel::Slack]);
        let recipient = Recipient::new()
            .with_email("ada@example.com")
            .with_device_token("tok")
            .with_slack_channel("#ops");

        assert_eq!(ChannelResolver::resolve(&recipient, &registry).unwrap(), Channel::Push);
    }

    #[test]
    fn test_resolve_slack_last() {
        let registry = registry_with(&Channel::ALL);
        let recipient = Recipient::new().with_slack_channel("#ops");

        assert_eq!(ChannelResolver::resolve(&recipient, &registry).unwrap(), Channel::Slack);
    }

    #[test]
    fn test_resolve_fails_without_usable_channel() {
        let registry = registry_with(&[Channel::Email]);
        let recipient = Recipient::new().with_phone("+15551234567");

        assert!(matches!(
            ChannelResolver::resolve(&recipient, &registry),
            Err(DispatchError::ChannelUnresolved)
        ));

        let empty = Recipient::new();
        assert!(ChannelResolver::resolve(&empty, &registry).is_err());
    }
}
