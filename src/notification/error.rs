//! 错误类型
//!
//! - `ValidationError`: 发送前的数据校验失败，不重试
//! - `SendError`: Sender 返回的错误信号（可重试 / 中断 / 致命）
//! - `DispatchError`: 调用方可见的错误

use super::model::Channel;
use thiserror::Error;

/// 数据校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message body must not be empty")]
    EmptyMessage,

    #[error("recipient field '{field}' is required for channel {channel}")]
    MissingField { channel: Channel, field: &'static str },

    #[error("invalid {field}: {value}")]
    InvalidFormat { field: &'static str, value: String },
}

/// Sender 发送失败信号
#[derive(Debug, Error)]
pub enum SendError {
    /// 可恢复的失败，可以重试
    #[error("{sender}: {message}")]
    Transient { sender: String, message: String },

    /// 中断/取消，立即终止
    #[error("send interrupted")]
    Interrupted,

    /// 不符合约定的错误，终止重试并返回给调用方
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

impl SendError {
    pub fn transient(sender: impl Into<String>, message: impl Into<String>) -> Self {
        SendError::Transient {
            sender: sender.into(),
            message: message.into(),
        }
    }
}

/// 分发错误
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("no sender registered for channel {0}")]
    SenderNotFound(Channel),

    #[error("no channel can be resolved from recipient data")]
    ChannelUnresolved,

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("sender {sender} failed unexpectedly: {source}")]
    Unexpected {
        sender: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("worker pool failure: {0}")]
    WorkerPool(String),
}

impl DispatchError {
    /// 是否发生在第一次尝试之前
    pub fn is_pre_attempt(&self) -> bool {
        matches!(
            self,
            DispatchError::Validation(_)
                | DispatchError::SenderNotFound(_)
                | DispatchError::ChannelUnresolved
                | DispatchError::Configuration(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_attempt_classification() {
        assert!(DispatchError::from(ValidationError::EmptyMessage).is_pre_attempt());
        assert!(DispatchError::SenderNotFound(Channel::Sms).is_pre_attempt());
        assert!(DispatchError::ChannelUnresolved.is_pre_attempt());
        assert!(!DispatchError::WorkerPool("shutdown".into()).is_pre_attempt());
        assert!(!DispatchError::Unexpected {
            sender: "email".into(),
            source: anyhow::anyhow!("boom"),
        }
        .is_pre_attempt());
    }

    #[test]
    fn test_error_messages() {
        let err = ValidationError::MissingField { channel: Channel::Push, field: "device_token" };
        assert_eq!(err.to_string(), "recipient field 'device_token' is required for channel push");

        let err = SendError::transient("sms", "timeout");
        assert_eq!(err.to_string(), "sms: timeout");

        let err = DispatchError::SenderNotFound(Channel::Slack);
        assert_eq!(err.to_string(), "no sender registered for channel slack");
    }
}
