//! 驱动层模块
//!
//! 本模块提供悬浮平台控制器的核心逻辑，包括：
//! - 执行器占空比状态与功率上限（[`ActuatorBank`]）
//! - 瞬时执行器的超时自动释放（[`TimeoutMonitor`]）
//! - 入站命令解码与分发（[`CommandDispatcher`]）
//! - 状态发布（[`StatusPublisher`]）
//! - 单线程协作式控制循环（[`ControlLoop`]）
//! - 钩子系统：占空比变化回调，供 PWM 输出层使用
//!
//! # 使用场景
//!
//! ```
//! use hover_driver::{ActuatorId, ControllerBuilder, ManualClock};
//! use hover_transport::{ChannelTransport, Transport};
//!
//! let (mut transport, handle) = ChannelTransport::pair();
//! transport.connect().unwrap();
//! let mut control = ControllerBuilder::new()
//!     .build(transport, ManualClock::new())
//!     .unwrap();
//!
//! handle.send("ligar", "on");
//! control.tick().unwrap();
//! assert_eq!(control.duty(ActuatorId::Lift1), 1023);
//! ```

mod bank;
mod builder;
pub mod clock;
pub mod connection;
mod control_loop;
mod dispatcher;
mod error;
pub mod hooks;
pub mod metrics;
pub mod status;
mod timeout;

pub use bank::ActuatorBank;
pub use builder::ControllerBuilder;
pub use clock::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use connection::{associate, connect_with_retry, sleep_while_running, subscribe_all};
pub use control_loop::{ControlLoop, TickReport};
pub use dispatcher::{CommandDispatcher, DispatchOutcome};
pub use error::DriverError;
pub use hooks::{DutyCallback, DutyRecorder, HookManager, TracingDutyOutput};
pub use metrics::{ControllerMetrics, MetricsSnapshot};
pub use status::{NullPublisher, StatusPublisher, TransportPublisher};
pub use timeout::{MomentaryState, TimeoutMonitor};

pub use hover_protocol::{ActuatorId, Command, StatusEvent, TopicRole, TopicTable};
