//! 通知分发核心 - 统一管理所有通知渠道
//!
//! # 设计目标
//! 1. 统一接口：所有渠道实现 `Sender` trait，注册时检查 `supports(channel)`
//! 2. 自动选择渠道：未指定时按 email > sms > push > slack 解析
//! 3. 有界重试：阻塞 / 非阻塞两个驱动共用同一状态机，事件序列一致
//! 4. 事件隔离：观察者出错不影响发送和其他观察者
//!
//! # 使用示例
//! ```ignore
//! use notify_dispatch::notification::{Notification, NotificationDispatcher, Recipient};
//!
//! let dispatcher = NotificationDispatcher::builder()
//!     .with_default_senders()
//!     .max_attempts(3)
//!     .build()?;
//!
//! let notification = Notification::new(Recipient::new().with_phone("+15551234567"), "Hello {{name}}")
//!     .with_variable("name", "Ada");
//! let outcome = dispatcher.send(&notification, None)?;
//! ```

pub mod model;
pub mod outcome;
pub mod error;
pub mod sender;
pub mod registry;
pub mod resolver;
pub mod event;
pub mod publisher;
pub mod retry;
pub mod validator;
pub mod template;
pub mod channels;
pub mod dispatcher;
pub mod builder;

pub use model::{Channel, Notification, Priority, Recipient, META_DEVICE_TOKEN, META_SLACK_CHANNEL, META_SUBJECT};
pub use outcome::SendOutcome;
pub use error::{DispatchError, SendError, ValidationError};
pub use sender::Sender;
pub use registry::ChannelRegistry;
pub use resolver::ChannelResolver;
pub use event::{EventObserver, FnObserver, LifecycleEvent, LifecycleEventKind, LoggingObserver, DISPATCHER_SENDER_NAME};
pub use publisher::EventPublisher;
pub use retry::{Interrupt, RetryExecutor, RetryPolicy};
pub use validator::NotificationValidator;
pub use dispatcher::{DispatchHandle, NotificationDispatcher};
pub use builder::DispatcherBuilder;
