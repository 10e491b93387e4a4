//! 分发器构建器 - 以代码方式配置渠道、重试策略、线程池和观察者

use super::channels::SimulatedSender;
use super::dispatcher::{NotificationDispatcher, WorkerPool};
use super::error::DispatchError;
use super::event::EventObserver;
use super::model::Channel;
use super::publisher::EventPublisher;
use super::registry::ChannelRegistry;
use super::retry::RetryPolicy;
use super::sender::Sender;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::info;

/// 分发器构建器
pub struct DispatcherBuilder {
    senders: Vec<(Channel, Arc<dyn Sender>)>,
    max_attempts: u32,
    retry_delay: Duration,
    runtime: Option<Handle>,
    worker_threads: Option<usize>,
    observers: Vec<Arc<dyn EventObserver>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        let policy = RetryPolicy::default();
        Self {
            senders: Vec::new(),
            max_attempts: policy.max_attempts(),
            retry_delay: policy.delay(),
            runtime: None,
            worker_threads: None,
            observers: Vec::new(),
        }
    }

    /// 注册渠道发送器
    pub fn sender(mut self, channel: Channel, sender: Arc<dyn Sender>) -> Self {
        self.senders.push((channel, sender));
        self
    }

    /// 为所有渠道注册模拟发送器
    pub fn with_default_senders(mut self) -> Self {
        for channel in Channel::ALL {
            let sender: Arc<dyn Sender> = Arc::new(SimulatedSender::for_channel(channel));
            self.senders.push((channel, sender));
        }
        self
    }

    /// 设置重试策略
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.max_attempts = policy.max_attempts();
        self.retry_delay = policy.delay();
        self
    }

    /// 设置最大尝试次数（>= 1，build 时检查）
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// 设置重试间隔
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// 使用调用方的 tokio runtime 执行异步分发
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// 默认线程池的线程数（仅在未提供 runtime 时生效）
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// 添加初始观察者
    pub fn observer(mut self, observer: Arc<dyn EventObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// 构建 NotificationDispatcher
    pub fn build(self) -> Result<NotificationDispatcher, DispatchError> {
        let policy = RetryPolicy::new(self.max_attempts, self.retry_delay)?;

        if self.worker_threads == Some(0) {
            return Err(DispatchError::Configuration(
                "worker_threads must be at least 1".to_string(),
            ));
        }

        let mut registry = ChannelRegistry::new();
        for (channel, sender) in self.senders {
            registry.register(channel, sender)?;
        }

        let publisher = Arc::new(EventPublisher::new());
        for observer in self.observers {
            publisher.subscribe(observer);
        }

        let pool = match self.runtime {
            Some(handle) => WorkerPool::Provided(handle),
            None => WorkerPool::Default {
                worker_threads: self.worker_threads,
            },
        };

        info!(
            channels = ?registry.channels(),
            max_attempts = policy.max_attempts(),
            delay_ms = u64::try_from(policy.delay().as_millis()).unwrap_or(u64::MAX),
            observers = publisher.count(),
            "Notification dispatcher built"
        );

        Ok(NotificationDispatcher::from_parts(registry, publisher, policy, pool))
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationDispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::event::LoggingObserver;

    #[test]
    fn test_builder_default() {
        let builder = DispatcherBuilder::new();
        assert_eq!(builder.max_attempts, 3);
        assert_eq!(builder.retry_delay, Duration::from_millis(1000));
        assert!(builder.senders.is_empty());
        assert!(builder.runtime.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let dispatcher = DispatcherBuilder::new()
            .with_default_senders()
            .max_attempts(5)
            .retry_delay(Duration::from_millis(20))
            .observer(Arc::new(LoggingObserver))
            .build()
            .unwrap();

        assert_eq!(dispatcher.retry_policy().max_attempts(), 5);
        assert_eq!(dispatcher.retry_policy().delay_for_attempt(2), Duration::from_millis(20));
        assert_eq!(dispatcher.registry().channels(), Channel::ALL.to_vec());
        assert_eq!(dispatcher.publisher().count(), 1);
    }

    #[test]
    fn test_builder_rejects_zero_attempts() {
        let result = DispatcherBuilder::new().max_attempts(0).build();
        assert!(matches!(result, Err(DispatchError::Configuration(_))));
    }

    #[test]
    fn test_builder_rejects_zero_worker_threads() {
        let result = DispatcherBuilder::new().worker_threads(0).build();
        assert!(matches!(result, Err(DispatchError::Configuration(_))));
    }

    #[test]
    fn test_builder_rejects_mismatched_sender() {
        let result = DispatcherBuilder::new()
            .sender(Channel::Email, Arc::new(SimulatedSender::for_channel(Channel::Sms)))
            .build();
        assert!(matches!(result, Err(DispatchError::Configuration(_))));
    }

    #[test]
    fn test_retry_policy_overrides_fields() {
        let policy = RetryPolicy::new(2, Duration::from_millis(7)).unwrap();
        let dispatcher = DispatcherBuilder::new().retry_policy(policy).build().unwrap();
        assert_eq!(dispatcher.retry_policy(), &policy);
    }
}
