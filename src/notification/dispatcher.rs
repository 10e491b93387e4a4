//! 通知分发器 - 校验、选择渠道、模板替换、驱动重试
//!
//! - `send`: 在调用线程上阻塞执行，发送前的错误直接返回
//! - `send_async`: 整个流程在工作线程池上执行，调用方立即拿到 `DispatchHandle`；
//!   发送前的错误会发布一个 `Failed{total_attempts: 1}` 事件后以 `Err` 结束

use super::error::DispatchError;
use super::event::LifecycleEvent;
use super::model::{Channel, Notification};
use super::outcome::SendOutcome;
use super::publisher::EventPublisher;
use super::registry::ChannelRegistry;
use super::resolver::ChannelResolver;
use super::retry::{Interrupt, RetryExecutor, RetryPolicy};
use super::sender::Sender;
use super::template;
use super::validator::NotificationValidator;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 工作线程池：调用方提供，或首次使用时创建的进程级默认线程池
#[derive(Debug, Clone)]
pub(crate) enum WorkerPool {
    Provided(Handle),
    Default { worker_threads: Option<usize> },
}

impl WorkerPool {
    fn handle(&self) -> Result<Handle, DispatchError> {
        match self {
            WorkerPool::Provided(handle) => Ok(handle.clone()),
            WorkerPool::Default { worker_threads } => default_pool(*worker_threads),
        }
    }
}

static DEFAULT_POOL: OnceLock<Result<Runtime, String>> = OnceLock::new();

/// 默认线程池只创建一次，线程数以第一次创建时为准
fn default_pool(worker_threads: Option<usize>) -> Result<Handle, DispatchError> {
    let pool = DEFAULT_POOL.get_or_init(|| {
        warn!(
            worker_threads = ?worker_threads,
            "No worker pool configured, creating default dispatch pool"
        );
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.thread_name("notify-dispatch-worker").enable_all();
        if let Some(n) = worker_threads {
            builder.worker_threads(n.max(1));
        }
        builder.build().map_err(|e| e.to_string())
    });

    match pool {
        Ok(runtime) => Ok(runtime.handle().clone()),
        Err(e) => Err(DispatchError::WorkerPool(format!("failed to create default pool: {}", e))),
    }
}

struct DispatcherInner {
    registry: ChannelRegistry,
    publisher: Arc<EventPublisher>,
    executor: RetryExecutor,
    validator: NotificationValidator,
    pool: WorkerPool,
}

impl DispatcherInner {
    /// 发送前的全部步骤：校验消息 -> 解析渠道 -> 查找发送器 -> 校验接收者 -> 模板替换
    fn prepare(
        &self,
        notification: &Notification,
        channel: Option<Channel>,
    ) -> Result<(Channel, Arc<dyn Sender>, Notification), DispatchError> {
        self.validator.validate_message(notification)?;

        let channel = match channel {
            Some(channel) => channel,
            None => ChannelResolver::resolve(notification.recipient(), &self.registry)?,
        };

        let sender = self
            .registry
            .get(channel)
            .ok_or(DispatchError::SenderNotFound(channel))?;

        self.validator.validate_recipient(notification, channel)?;

        let prepared = template::apply(notification.clone());
        debug!(
            notification_id = %prepared.id(),
            channel = %channel,
            sender = sender.name(),
            priority = %prepared.priority(),
            "Notification prepared"
        );
        Ok((channel, sender, prepared))
    }
}

/// 通知分发器（克隆开销小，内部共享）
#[derive(Clone)]
pub struct NotificationDispatcher {
    inner: Arc<DispatcherInner>,
}

impl NotificationDispatcher {
    pub(crate) fn from_parts(
        registry: ChannelRegistry,
        publisher: Arc<EventPublisher>,
        policy: RetryPolicy,
        pool: WorkerPool,
    ) -> Self {
        let executor = RetryExecutor::new(policy, publisher.clone());
        Self {
            inner: Arc::new(DispatcherInner {
                registry,
                publisher,
                executor,
                validator: NotificationValidator::new(),
                pool,
            }),
        }
    }

    /// 阻塞发送
    ///
    /// 校验 / 配置错误直接返回 `Err`，不发布事件；
    /// 重试耗尽返回 `Ok(outcome)` 且 `outcome.success == false`。
    pub fn send(&self, notification: &Notification, channel: Option<Channel>) -> Result<SendOutcome, DispatchError> {
        self.send_interruptible(notification, channel, &Interrupt::new())
    }

    /// 阻塞发送，重试等待可被调用方持有的 `interrupt` 打断
    ///
    /// 中断只作用于使用同一个 `Interrupt` 的分发。
    pub fn send_interruptible(
        &self,
        notification: &Notification,
        channel: Option<Channel>,
        interrupt: &Interrupt,
    ) -> Result<SendOutcome, DispatchError> {
        let (channel, sender, prepared) = self.inner.prepare(notification, channel).map_err(|e| {
            warn!(notification_id = %notification.id(), error = %e, "Dispatch rejected");
            e
        })?;

        info!(
            notification_id = %prepared.id(),
            channel = %channel,
            sender = sender.name(),
            "Dispatching notification"
        );
        self.inner
            .executor
            .execute_blocking(sender.as_ref(), &prepared, channel, interrupt)
    }

    /// 非阻塞发送，立即返回
    pub fn send_async(&self, notification: Notification, channel: Option<Channel>) -> DispatchHandle {
        let handle = match self.inner.pool.handle() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(notification_id = %notification.id(), error = %e, "Worker pool unavailable");
                return DispatchHandle::ready(Err(e));
            }
        };

        let inner = self.inner.clone();
        let task = handle.spawn(async move {
            let (resolved, sender, prepared) = match inner.prepare(&notification, channel) {
                Ok(prepared) => prepared,
                Err(e) => {
                    warn!(notification_id = %notification.id(), error = %e, "Async dispatch rejected");
                    // 渠道未指定时尽量带上解析结果
                    let channel = channel
                        .or_else(|| ChannelResolver::resolve(notification.recipient(), &inner.registry).ok());
                    inner
                        .publisher
                        .publish(&LifecycleEvent::rejected(notification.id(), channel, e.to_string()));
                    return Err(e);
                }
            };

            info!(
                notification_id = %prepared.id(),
                channel = %resolved,
                sender = sender.name(),
                "Dispatching notification (async)"
            );
            inner
                .executor
                .execute_async(sender, Arc::new(prepared), resolved)
                .await
        });

        DispatchHandle::spawned(task)
    }

    pub fn publisher(&self) -> &Arc<EventPublisher> {
        &self.inner.publisher
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.inner.registry
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.inner.executor.policy()
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("registry", &self.inner.registry)
            .field("retry_policy", self.retry_policy())
            .field("observers", &self.inner.publisher.count())
            .finish()
    }
}

/// 异步分发的结果
///
/// 工作线程池关闭或任务异常退出时以 `DispatchError::WorkerPool` 结束。
pub struct DispatchHandle {
    state: HandleState,
}

enum HandleState {
    Spawned(JoinHandle<Result<SendOutcome, DispatchError>>),
    Ready(Option<Result<SendOutcome, DispatchError>>),
}

impl DispatchHandle {
    fn spawned(task: JoinHandle<Result<SendOutcome, DispatchError>>) -> Self {
        Self {
            state: HandleState::Spawned(task),
        }
    }

    fn ready(result: Result<SendOutcome, DispatchError>) -> Self {
        Self {
            state: HandleState::Ready(Some(result)),
        }
    }

    pub fn is_finished(&self) -> bool {
        match &self.state {
            HandleState::Spawned(task) => task.is_finished(),
            HandleState::Ready(_) => true,
        }
    }

    /// 取消尚未完成的分发
    pub fn abort(&self) {
        if let HandleState::Spawned(task) = &self.state {
            task.abort();
        }
    }
}

impl Future for DispatchHandle {
    type Output = Result<SendOutcome, DispatchError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            HandleState::Spawned(task) => Pin::new(task).poll(cx).map(|joined| {
                joined.unwrap_or_else(|e| Err(DispatchError::WorkerPool(e.to_string())))
            }),
            HandleState::Ready(result) => Poll::Ready(
                result
                    .take()
                    .unwrap_or_else(|| Err(DispatchError::WorkerPool("result already taken".to_string()))),
            ),
        }
    }
}
