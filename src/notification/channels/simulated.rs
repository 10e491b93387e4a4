//! 模拟发送器（进程内，不做真实网络传输）
//!
//! 检查渠道所需字段、记录日志、返回成功。可配置前 N 次返回可重试失败，
//! 用于演示重试流程。

use crate::notification::error::SendError;
use crate::notification::model::{Channel, Notification, META_SUBJECT};
use crate::notification::outcome::SendOutcome;
use crate::notification::sender::Sender;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// 模拟发送器配置
#[derive(Debug, Clone)]
pub struct SimulatedConfig {
    /// 发送器名称
    pub name: String,
    /// 支持的渠道
    pub channel: Channel,
    /// 模拟 I/O 延迟
    pub latency: Duration,
    /// 前 N 次发送返回可重试失败
    pub fail_first: u32,
}

impl SimulatedConfig {
    pub fn new(channel: Channel) -> Self {
        Self {
            name: channel.as_str().to_string(),
            channel,
            latency: Duration::ZERO,
            fail_first: 0,
        }
    }
}

/// 模拟发送器
pub struct SimulatedSender {
    config: SimulatedConfig,
    remaining_failures: AtomicU32,
}

impl SimulatedSender {
    pub fn new(config: SimulatedConfig) -> Self {
        let remaining_failures = AtomicU32::new(config.fail_first);
        Self {
            config,
            remaining_failures,
        }
    }

    /// 按渠道创建默认发送器
    pub fn for_channel(channel: Channel) -> Self {
        Self::new(SimulatedConfig::new(channel))
    }

    pub fn channel(&self) -> Channel {
        self.config.channel
    }

    /// 消耗一次模拟失败，返回是否应失败
    fn take_failure(&self) -> bool {
        self.remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Sender for SimulatedSender {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn supports(&self, channel: Channel) -> bool {
        channel == self.config.channel
    }

    fn send(&self, notification: &Notification) -> Result<SendOutcome, SendError> {
        let channel = self.config.channel;
        let Some(target) = notification.recipient().address_for(channel) else {
            return Ok(SendOutcome::failure(
                notification,
                &self.config.name,
                channel,
                format!("recipient has no {} address", channel),
            ));
        };

        if !self.config.latency.is_zero() {
            std::thread::sleep(self.config.latency);
        }

        if self.take_failure() {
            warn!(
                channel = %channel,
                notification_id = %notification.id(),
                "Simulated transient failure"
            );
            return Err(SendError::transient(&self.config.name, "simulated transient failure"));
        }

        info!(
            channel = %channel,
            sender = %self.config.name,
            target = %target,
            subject = ?notification.recipient().meta(META_SUBJECT),
            priority = %notification.priority(),
            notification_id = %notification.id(),
            "Message delivered"
        );
        Ok(SendOutcome::success(notification, &self.config.name, channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::model::Recipient;

    #[test]
    fn test_simulated_sender_supports_single_channel() {
        let sender = SimulatedSender::new(SimulatedConfig::new(Channel::Sms));
        assert!(sender.supports(Channel::Sms));
        assert!(!sender.supports(Channel::Email));
        assert_eq!(sender.name(), "sms");
    }

    #[test]
    fn test_simulated_sender_reports_missing_address() {
        let sender = SimulatedSender::new(SimulatedConfig::new(Channel::Push));
        let n = Notification::new(Recipient::new().with_email("ada@example.com"), "hi");

        let outcome = sender.send(&n).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("recipient has no push address"));
    }

    #[test]
    fn test_simulated_sender_fail_first() {
        let mut config = SimulatedConfig::new(Channel::Email);
        config.fail_first = 2;
        let sender = SimulatedSender::new(config);
        let n = Notification::new(Recipient::new().with_email("ada@example.com"), "hi");

        assert!(matches!(sender.send(&n), Err(SendError::Transient { .. })));
        assert!(matches!(sender.send(&n), Err(SendError::Transient { .. })));
        assert!(sender.send(&n).unwrap().success);
        assert!(sender.send(&n).unwrap().success);
    }
}
