//! Sender trait 定义

use super::error::SendError;
use super::model::{Channel, Notification};
use super::outcome::SendOutcome;

/// 渠道发送器 trait
///
/// 实现者应无状态或内部线程安全；分发器调用 `send` 时不加锁。
pub trait Sender: Send + Sync {
    /// 发送器名称（用于日志、事件和结果）
    fn name(&self) -> &str;

    /// 是否支持该渠道（注册时检查）
    fn supports(&self, channel: Channel) -> bool;

    /// 同步发送
    ///
    /// - `Ok(outcome)`: 发送器给出的结果，`success == false` 时可重试
    /// - `Err(SendError::Transient)`: 可恢复的失败
    /// - `Err(SendError::Interrupted)`: 立即终止，记为失败
    /// - `Err(SendError::Fatal)`: 终止并作为错误返回
    fn send(&self, notification: &Notification) -> Result<SendOutcome, SendError>;
}
