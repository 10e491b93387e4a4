//! 重试编排
//!
//! 每次分发是一个小状态机：
//!
//! ```text
//! Attempting(1) -> Sent                       (成功)
//!               -> Failed                     (n == max_attempts / 中断 / 致命错误)
//!               -> Retrying(n+1) -> Attempting(n+1)
//! ```
//!
//! `RetryMachine` 负责判定和发布事件，两个驱动只负责调用 Sender 与等待：
//! - `execute_blocking`: 在调用线程上运行，用可中断的 sleep 等待
//! - `execute_async`: Sender 调用放到 blocking 线程池，等待用 tokio 定时器，不占用线程
//!
//! 两个驱动共用同一个状态机，因此事件序列和最终结果一致。

use super::error::{DispatchError, SendError};
use super::event::LifecycleEvent;
use super::model::{Channel, Notification};
use super::outcome::SendOutcome;
use super::publisher::EventPublisher;
use super::sender::Sender;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

const INTERRUPTED: &str = "interrupted";
const UNKNOWN_ERROR: &str = "unknown error";

/// 重试策略：最大尝试次数 + 固定间隔（从第 2 次尝试开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Result<Self, DispatchError> {
        if max_attempts == 0 {
            return Err(DispatchError::Configuration(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(Self { max_attempts, delay })
    }

    /// 只尝试一次
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// 第 `attempt` 次尝试之前的等待时间（第 1 次为 0，之后固定）
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            Duration::ZERO
        } else {
            self.delay
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

/// 阻塞驱动的中断标志
///
/// 中断后标志保持置位，直到显式 `clear()`。
#[derive(Debug, Default)]
pub struct Interrupt {
    interrupted: Mutex<bool>,
    cond: Condvar,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// 唤醒所有正在等待的阻塞分发
    pub fn interrupt(&self) {
        let mut flag = self.interrupted.lock().unwrap_or_else(|e| e.into_inner());
        *flag = true;
        self.cond.notify_all();
    }

    pub fn clear(&self) {
        *self.interrupted.lock().unwrap_or_else(|e| e.into_inner()) = false;
    }

    pub fn is_interrupted(&self) -> bool {
        *self.interrupted.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 睡眠 `timeout`；被中断时提前返回 `false`
    pub fn sleep(&self, timeout: Duration) -> bool {
        let guard = self.interrupted.lock().unwrap_or_else(|e| e.into_inner());
        let (guard, _) = self
            .cond
            .wait_timeout_while(guard, timeout, |interrupted| !*interrupted)
            .unwrap_or_else(|e| e.into_inner());
        !*guard
    }
}

/// 状态机的下一步
enum Step {
    Done(SendOutcome),
    Retry { next_attempt: u32, delay: Duration },
    Fatal(DispatchError),
}

/// 单次分发的状态机
struct RetryMachine<'a> {
    policy: &'a RetryPolicy,
    publisher: &'a EventPublisher,
    notification: &'a Notification,
    sender_name: &'a str,
    channel: Channel,
}

impl RetryMachine<'_> {
    fn on_result(&self, attempt: u32, result: Result<SendOutcome, SendError>) -> Step {
        match result {
            Ok(outcome) if outcome.success => {
                self.publish(LifecycleEvent::sent(
                    self.notification.id(),
                    self.sender_name,
                    self.channel,
                    attempt,
                ));
                Step::Done(outcome)
            }
            Ok(outcome) => {
                let reason = outcome.error.clone().unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                self.fail_or_retry(attempt, reason, outcome)
            }
            Err(SendError::Transient { message, .. }) => {
                let outcome = SendOutcome::failure(self.notification, self.sender_name, self.channel, &message);
                self.fail_or_retry(attempt, message, outcome)
            }
            Err(SendError::Interrupted) => Step::Done(self.interrupted(attempt)),
            Err(SendError::Fatal(source)) => {
                self.publish(LifecycleEvent::failed(
                    self.notification.id(),
                    self.sender_name,
                    self.channel,
                    attempt,
                    source.to_string(),
                ));
                Step::Fatal(DispatchError::Unexpected {
                    sender: self.sender_name.to_string(),
                    source,
                })
            }
        }
    }

    fn fail_or_retry(&self, attempt: u32, reason: String, outcome: SendOutcome) -> Step {
        let max_attempts = self.policy.max_attempts();
        if attempt >= max_attempts {
            self.publish(LifecycleEvent::failed(
                self.notification.id(),
                self.sender_name,
                self.channel,
                attempt,
                reason,
            ));
            return Step::Done(outcome);
        }

        let next_attempt = attempt + 1;
        let delay = self.policy.delay_for_attempt(next_attempt);
        warn!(
            notification_id = %self.notification.id(),
            sender = %self.sender_name,
            attempt,
            max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            reason = %reason,
            "Send attempt failed, retrying"
        );
        self.publish(LifecycleEvent::retrying(
            self.notification.id(),
            self.sender_name,
            self.channel,
            next_attempt,
            max_attempts,
            delay,
            reason,
        ));
        Step::Retry { next_attempt, delay }
    }

    /// 中断：记为失败，`attempts` 为已完成的尝试次数
    fn interrupted(&self, attempts: u32) -> SendOutcome {
        self.publish(LifecycleEvent::failed(
            self.notification.id(),
            self.sender_name,
            self.channel,
            attempts,
            INTERRUPTED,
        ));
        SendOutcome::failure(self.notification, self.sender_name, self.channel, INTERRUPTED)
    }

    fn publish(&self, event: LifecycleEvent) {
        self.publisher.publish(&event);
    }
}

/// Sender panic 视为致命错误
fn panic_to_send_error(panic: Box<dyn std::any::Any + Send>) -> SendError {
    let reason = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    SendError::Fatal(anyhow::anyhow!("sender panicked: {}", reason))
}

/// 重试执行器
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    publisher: Arc<EventPublisher>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy, publisher: Arc<EventPublisher>) -> Self {
        Self { policy, publisher }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 阻塞驱动：在调用线程上执行，等待期间可被 `interrupt` 打断
    pub fn execute_blocking(
        &self,
        sender: &dyn Sender,
        notification: &Notification,
        channel: Channel,
        interrupt: &Interrupt,
    ) -> Result<SendOutcome, DispatchError> {
        let machine = RetryMachine {
            policy: &self.policy,
            publisher: &self.publisher,
            notification,
            sender_name: sender.name(),
            channel,
        };

        let mut attempt = 1;
        loop {
            debug!(notification_id = %notification.id(), attempt, "Send attempt (blocking)");
            let result = catch_unwind(AssertUnwindSafe(|| sender.send(notification)))
                .unwrap_or_else(|panic| Err(panic_to_send_error(panic)));

            match machine.on_result(attempt, result) {
                Step::Done(outcome) => return Ok(self.finish(outcome, attempt)),
                Step::Fatal(err) => return Err(err),
                Step::Retry { next_attempt, delay } => {
                    if !interrupt.sleep(delay) {
                        warn!(notification_id = %notification.id(), attempt, "Retry interrupted");
                        return Ok(machine.interrupted(attempt));
                    }
                    attempt = next_attempt;
                }
            }
        }
    }

    /// 非阻塞驱动：等待期间不占用任何线程
    pub async fn execute_async(
        &self,
        sender: Arc<dyn Sender>,
        notification: Arc<Notification>,
        channel: Channel,
    ) -> Result<SendOutcome, DispatchError> {
        let sender_name = sender.name().to_string();
        let machine = RetryMachine {
            policy: &self.policy,
            publisher: &self.publisher,
            notification: &notification,
            sender_name: &sender_name,
            channel,
        };

        let mut attempt = 1;
        loop {
            debug!(notification_id = %notification.id(), attempt, "Send attempt (async)");
            let task_sender = sender.clone();
            let task_notification = notification.clone();
            let result = match tokio::task::spawn_blocking(move || task_sender.send(&task_notification)).await {
                Ok(result) => result,
                Err(e) if e.is_panic() => Err(panic_to_send_error(e.into_panic())),
                Err(e) => return Err(DispatchError::WorkerPool(e.to_string())),
            };

            match machine.on_result(attempt, result) {
                Step::Done(outcome) => return Ok(self.finish(outcome, attempt)),
                Step::Fatal(err) => return Err(err),
                Step::Retry { next_attempt, delay } => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt = next_attempt;
                }
            }
        }
    }

    fn finish(&self, outcome: SendOutcome, attempts: u32) -> SendOutcome {
        if outcome.success && attempts > 1 {
            info!(
                notification_id = %outcome.notification_id,
                attempts,
                "Notification delivered after retries"
            );
        }
        outcome
    }
}
