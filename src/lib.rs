//! Notify Dispatch - 多渠道通知分发核心（渠道选择、有界重试、生命周期事件）

pub mod notification;

pub use notification::{
    Channel, ChannelRegistry, DispatchError, DispatchHandle, DispatcherBuilder, EventObserver,
    EventPublisher, FnObserver, LifecycleEvent, LifecycleEventKind, LoggingObserver, Notification,
    NotificationDispatcher, Priority, Recipient, RetryPolicy, SendError, SendOutcome, Sender,
    ValidationError,
};
