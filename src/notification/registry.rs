//! 渠道注册表 - channel -> Sender

use super::error::DispatchError;
use super::model::Channel;
use super::sender::Sender;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// 渠道注册表（构建完成后只读，跨分发共享）
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    senders: BTreeMap<Channel, Arc<dyn Sender>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册发送器，要求 `sender.supports(channel)`
    pub fn register(&mut self, channel: Channel, sender: Arc<dyn Sender>) -> Result<(), DispatchError> {
        if !sender.supports(channel) {
            return Err(DispatchError::Configuration(format!(
                "sender {} does not support channel {}",
                sender.name(),
                channel
            )));
        }

        info!(channel = %channel, sender = sender.name(), "Registering sender");
        if let Some(previous) = self.senders.insert(channel, sender) {
            warn!(channel = %channel, previous = previous.name(), "Replaced existing sender");
        }
        Ok(())
    }

    pub fn get(&self, channel: Channel) -> Option<Arc<dyn Sender>> {
        self.senders.get(&channel).cloned()
    }

    pub fn has(&self, channel: Channel) -> bool {
        self.senders.contains_key(&channel)
    }

    /// 已注册的渠道
    pub fn channels(&self) -> Vec<Channel> {
        self.senders.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.senders.iter().map(|(c, s)| (c, s.name())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::error::SendError;
    use crate::notification::model::Notification;
    use crate::notification::outcome::SendOutcome;

    struct MockSender {
        name: &'static str,
        channel: Channel,
    }

    impl Sender for MockSender {
        fn name(&self) -> &str {
            self.name
        }

        fn supports(&self, channel: Channel) -> bool {
            channel == self.channel
        }

        fn send(&self, notification: &Notification) -> Result<SendOutcome, SendError> {
            Ok(SendOutcome::success(notification, self.name, self.channel))
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ChannelRegistry::new();
        assert!(registry.is_empty());

        registry
            .register(Channel::Sms, Arc::new(MockSender { name: "sms", channel: Channel::Sms }))
            .unwrap();

        assert!(registry.has(Channel::Sms));
        assert!(!registry.has(Channel::Email));
        assert_eq!(registry.get(Channel::Sms).unwrap().name(), "sms");
        assert!(registry.get(Channel::Email).is_none());
        assert_eq!(registry.channels(), vec![Channel::Sms]);
    }

    #[test]
    fn test_register_rejects_unsupported_channel() {
        let mut registry = ChannelRegistry::new();
        let result = registry.register(
            Channel::Email,
            Arc::new(MockSender { name: "sms", channel: Channel::Sms }),
        );

        assert!(matches!(result, Err(DispatchError::Configuration(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_replaces_previous_sender() {
        let mut registry = ChannelRegistry::new();
        registry
            .register(Channel::Push, Arc::new(MockSender { name: "first", channel: Channel::Push }))
            .unwrap();
        registry
            .register(Channel::Push, Arc::new(MockSender { name: "second", channel: Channel::Push }))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(Channel::Push).unwrap().name(), "second");
    }
}
