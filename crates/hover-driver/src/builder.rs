//! Builder 模式实现
//!
//! 提供链式构造 [`ControlLoop`] 的便捷方式。

use crate::bank::ActuatorBank;
use crate::clock::Clock;
use crate::control_loop::ControlLoop;
use crate::dispatcher::CommandDispatcher;
use crate::error::DriverError;
use crate::hooks::{DutyCallback, HookManager};
use crate::metrics::ControllerMetrics;
use crate::timeout::TimeoutMonitor;
use hover_tools::ControllerConfig;
use hover_transport::Transport;
use std::sync::Arc;

/// 控制器 Builder（链式构造）
///
/// # Example
///
/// ```
/// use hover_driver::{ControllerBuilder, ManualClock, TracingDutyOutput};
/// use hover_transport::ChannelTransport;
/// use std::sync::Arc;
///
/// let (transport, _handle) = ChannelTransport::pair();
/// let control = ControllerBuilder::new()
///     .hook(Arc::new(TracingDutyOutput))
///     .build(transport, ManualClock::new())
///     .unwrap();
/// assert_eq!(control.dispatcher().power_limit(), 1023);
/// ```
#[derive(Default)]
pub struct ControllerBuilder {
    /// 控制器配置（默认值即现场部署常量）
    config: ControllerConfig,
    /// 占空比回调
    hooks: HookManager,
    /// 外部共享的指标（可选）
    metrics: Option<Arc<ControllerMetrics>>,
}

impl ControllerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置配置
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// 注册占空比回调（可多次调用）
    pub fn hook(mut self, callback: Arc<dyn DutyCallback>) -> Self {
        self.hooks.add_callback(callback);
        self
    }

    /// 使用外部创建的指标
    pub fn metrics(mut self, metrics: Arc<ControllerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// 只构造分发器（不含传输与时钟）
    pub fn build_dispatcher(self) -> Result<CommandDispatcher, DriverError> {
        Ok(self.into_parts()?.1)
    }

    fn into_parts(self) -> Result<(ControllerConfig, CommandDispatcher), DriverError> {
        self.config.validate()?;

        let dispatcher = CommandDispatcher::with_parts(
            self.config.topics.table(),
            ActuatorBank::with_hooks(self.hooks),
            TimeoutMonitor::new(self.config.control.steer_timeout()),
            self.metrics.unwrap_or_default(),
        );
        Ok((self.config, dispatcher))
    }

    /// 构造控制循环
    ///
    /// 配置不合法时返回 [`DriverError::Config`]。
    pub fn build<T: Transport, C: Clock>(
        self,
        transport: T,
        clock: C,
    ) -> Result<ControlLoop<T, C>, DriverError> {
        let (config, dispatcher) = self.into_parts()?;
        Ok(ControlLoop::new(transport, clock, dispatcher, config))
    }
}
