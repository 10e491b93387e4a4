//! 事件发布器 - 将生命周期事件广播给所有观察者
//!
//! 观察者列表采用写时复制：订阅/取消订阅替换整个列表，
//! 发布时拿到快照后在锁外迭代。单个观察者出错（返回 Err 或 panic）
//! 只记录日志，不影响其他观察者，也不影响发送结果。

use super::event::{EventObserver, LifecycleEvent};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

type ObserverList = Arc<Vec<Arc<dyn EventObserver>>>;

/// 事件发布器
#[derive(Default)]
pub struct EventPublisher {
    observers: RwLock<ObserverList>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅
    pub fn subscribe(&self, observer: Arc<dyn EventObserver>) {
        let mut guard = self.observers.write().unwrap_or_else(|e| e.into_inner());
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(observer);
        *guard = Arc::new(next);
        debug!(count = guard.len(), "Observer subscribed");
    }

    /// 取消订阅（按指针判等），返回是否找到
    pub fn unsubscribe(&self, observer: &Arc<dyn EventObserver>) -> bool {
        let mut guard = self.observers.write().unwrap_or_else(|e| e.into_inner());
        let Some(pos) = guard.iter().position(|o| Arc::ptr_eq(o, observer)) else {
            return false;
        };
        let mut next: Vec<_> = guard.iter().cloned().collect();
        next.remove(pos);
        *guard = Arc::new(next);
        debug!(count = guard.len(), "Observer unsubscribed");
        true
    }

    /// 按订阅顺序同步通知所有观察者
    pub fn publish(&self, event: &LifecycleEvent) {
        let snapshot = self.snapshot();

        for (index, observer) in snapshot.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| observer.on_event(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(
                        observer = index,
                        event = event.event_type(),
                        notification_id = %event.notification_id,
                        error = %e,
                        "Observer failed to handle event"
                    );
                }
                Err(panic) => {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    warn!(
                        observer = index,
                        event = event.event_type(),
                        notification_id = %event.notification_id,
                        panic = %reason,
                        "Observer panicked while handling event"
                    );
                }
            }
        }
    }

    /// 当前观察者数量
    pub fn count(&self) -> usize {
        self.snapshot().len()
    }

    fn snapshot(&self) -> ObserverList {
        self.observers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("observers", &self.count())
            .finish()
    }
}
