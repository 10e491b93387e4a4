//! 生命周期事件与观察者
//!
//! 每次分发只产生一个终态事件（Sent 或 Failed），
//! 之前可能有若干 Retrying 事件，编号 2..=max_attempts。

use super::model::Channel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// 发送前失败时使用的发送器名称
pub const DISPATCHER_SENDER_NAME: &str = "dispatcher";

/// 生命周期事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub notification_id: String,
    pub sender_name: String,
    /// 发送前失败且无法确定渠道时为 None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: LifecycleEventKind,
}

/// 事件类型（封闭集合）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEventKind {
    /// 发送成功
    Sent { attempt_number: u32 },
    /// 最终失败
    Failed { total_attempts: u32, error: String },
    /// 即将重试
    Retrying {
        next_attempt: u32,
        max_attempts: u32,
        delay_ms: u64,
        reason: String,
    },
}

impl LifecycleEvent {
    pub fn new(
        notification_id: impl Into<String>,
        sender_name: impl Into<String>,
        channel: Option<Channel>,
        kind: LifecycleEventKind,
    ) -> Self {
        Self {
            notification_id: notification_id.into(),
            sender_name: sender_name.into(),
            channel,
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn sent(
        notification_id: impl Into<String>,
        sender_name: impl Into<String>,
        channel: Channel,
        attempt_number: u32,
    ) -> Self {
        Self::new(notification_id, sender_name, Some(channel), LifecycleEventKind::Sent { attempt_number })
    }

    pub fn failed(
        notification_id: impl Into<String>,
        sender_name: impl Into<String>,
        channel: Channel,
        total_attempts: u32,
        error: impl Into<String>,
    ) -> Self {
        Self::new(
            notification_id,
            sender_name,
            Some(channel),
            LifecycleEventKind::Failed {
                total_attempts,
                error: error.into(),
            },
        )
    }

    pub fn retrying(
        notification_id: impl Into<String>,
        sender_name: impl Into<String>,
        channel: Channel,
        next_attempt: u32,
        max_attempts: u32,
        delay: Duration,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            notification_id,
            sender_name,
            Some(channel),
            LifecycleEventKind::Retrying {
                next_attempt,
                max_attempts,
                delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                reason: reason.into(),
            },
        )
    }

    /// 发送前失败（校验 / 配置错误），记为一次失败的尝试
    pub fn rejected(
        notification_id: impl Into<String>,
        channel: Option<Channel>,
        error: impl Into<String>,
    ) -> Self {
        Self::new(
            notification_id,
            DISPATCHER_SENDER_NAME,
            channel,
            LifecycleEventKind::Failed {
                total_attempts: 1,
                error: error.into(),
            },
        )
    }

    /// Sent / Failed 为终态
    pub fn is_terminal(&self) -> bool {
        match self.kind {
            LifecycleEventKind::Sent { .. } | LifecycleEventKind::Failed { .. } => true,
            LifecycleEventKind::Retrying { .. } => false,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self.kind {
            LifecycleEventKind::Sent { .. } => "sent",
            LifecycleEventKind::Failed { .. } => "failed",
            LifecycleEventKind::Retrying { .. } => "retrying",
        }
    }
}

/// 事件观察者
///
/// 可能在任意线程被调用。返回错误或 panic 都会被发布器吞掉并记录日志。
pub trait EventObserver: Send + Sync {
    fn on_event(&self, event: &LifecycleEvent) -> anyhow::Result<()>;
}

/// 闭包适配器
pub struct FnObserver<F>(F);

impl<F> FnObserver<F>
where
    F: Fn(&LifecycleEvent) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventObserver for FnObserver<F>
where
    F: Fn(&LifecycleEvent) + Send + Sync,
{
    fn on_event(&self, event: &LifecycleEvent) -> anyhow::Result<()> {
        (self.0)(event);
        Ok(())
    }
}

/// 通过 tracing 记录每个事件
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl EventObserver for LoggingObserver {
    fn on_event(&self, event: &LifecycleEvent) -> anyhow::Result<()> {
        match &event.kind {
            LifecycleEventKind::Sent { attempt_number } => info!(
                notification_id = %event.notification_id,
                sender = %event.sender_name,
                channel = ?event.channel,
                attempt = attempt_number,
                "Notification sent"
            ),
            LifecycleEventKind::Failed { total_attempts, error } => warn!(
                notification_id = %event.notification_id,
                sender = %event.sender_name,
                channel = ?event.channel,
                attempts = total_attempts,
                error = %error,
                "Notification failed"
            ),
            LifecycleEventKind::Retrying {
                next_attempt,
                max_attempts,
                delay_ms,
                reason,
            } => info!(
                notification_id = %event.notification_id,
                sender = %event.sender_name,
                channel = ?event.channel,
                next_attempt,
                max_attempts,
                delay_ms,
                reason = %reason,
                "Retrying notification"
            ),
        }
        Ok(())
    }
}
