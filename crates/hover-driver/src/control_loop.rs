//! 控制循环
//!
//! 单线程协作式调度，每个 tick：
//!
//! 1. 从传输层轮询至多一条消息并分发
//! 2. 推进超时监视器，释放到期的瞬时执行器
//! 3. 固定间隔休眠（`run` 中，使用 spin_sleep）
//!
//! 所有状态只在本线程修改，tick 内严格顺序执行。
//!
//! 传输错误按 [`TransportError::is_fatal`] 分类：致命错误使 `tick` 返回 `Err`，
//! 由调用方断开并退出；其余错误记录后继续。

use crate::clock::Clock;
use crate::connection::{associate, connect_with_retry, sleep_while_running, subscribe_all};
use crate::dispatcher::{CommandDispatcher, DispatchOutcome};
use crate::error::DriverError;
use crate::metrics::ControllerMetrics;
use crate::status::TransportPublisher;
use hover_protocol::ActuatorId;
use hover_tools::ControllerConfig;
use hover_transport::{NetworkLink, Transport, TransportError};
use smallvec::SmallVec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, trace, warn};

/// 单个 tick 的结果
#[derive(Debug, Default)]
pub struct TickReport {
    /// 本 tick 收到消息时的分发结果
    pub outcome: Option<DispatchOutcome>,
    /// 本 tick 超时释放的执行器
    pub released: SmallVec<[ActuatorId; 2]>,
    /// 本 tick 记录下的非致命传输错误
    pub transport_error: Option<TransportError>,
}

/// 控制循环
pub struct ControlLoop<T: Transport, C: Clock> {
    transport: T,
    clock: C,
    dispatcher: CommandDispatcher,
    config: ControllerConfig,
}

impl<T: Transport, C: Clock> ControlLoop<T, C> {
    /// 由组件直接装配，通常使用 [`ControllerBuilder`](crate::ControllerBuilder)
    pub fn new(transport: T, clock: C, dispatcher: CommandDispatcher, config: ControllerConfig) -> Self {
        Self {
            transport,
            clock,
            dispatcher,
            config,
        }
    }

    /// 启动序列：初始化 → 网络关联 → 稳定等待 → 连接 broker → 订阅
    ///
    /// `running` 被清除时在下一次尝试或等待处返回 [`DriverError::Interrupted`]，
    /// 执行器保持初始化后的零状态。
    pub fn start(
        &mut self,
        link: &mut dyn NetworkLink,
        running: &AtomicBool,
    ) -> Result<(), DriverError> {
        self.dispatcher.initialize();

        associate(
            link,
            self.config.network.max_attempts,
            self.config.network.retry_delay(),
            running,
        )?;

        let settle = self.config.broker.settle_delay();
        if !settle.is_zero() {
            trace!("Settling for {:?} before connecting", settle);
        }
        sleep_while_running(settle, running)?;

        connect_with_retry(&mut self.transport, &self.config.broker.retry, running)?;
        subscribe_all(&mut self.transport, self.dispatcher.topics())?;
        Ok(())
    }

    /// 执行一次 tick（不休眠）
    pub fn tick(&mut self) -> Result<TickReport, DriverError> {
        let now = self.clock.now();
        let mut report = TickReport::default();

        match self.transport.try_receive() {
            Ok(Some(message)) => {
                let mut publisher =
                    TransportPublisher::new(&mut self.transport, &self.config.topics.status_prefix);
                report.outcome = Some(self.dispatcher.dispatch(
                    &message.topic,
                    &message.payload,
                    now,
                    &mut publisher,
                ));
            },
            Ok(None) => {},
            Err(e) if e.is_fatal() => {
                error!("Transport failure while polling: {}", e);
                return Err(e.into());
            },
            Err(e) => {
                warn!("Transport error while polling: {}", e);
                report.transport_error = Some(e);
            },
        }

        report.released = self.dispatcher.release_expired(now);
        Ok(report)
    }

    /// 运行直到 `running` 被清除或发生致命错误
    pub fn run(&mut self, running: &AtomicBool) -> Result<(), DriverError> {
        let interval = self.config.control.tick_interval();
        info!("Control loop started (tick interval {:?})", interval);

        while running.load(Ordering::Acquire) {
            self.tick()?;
            spin_sleep::sleep(interval);
        }

        info!("Control loop stopped");
        Ok(())
    }

    /// 关闭：全部执行器清零并断开传输
    pub fn shutdown(&mut self) -> Result<(), DriverError> {
        self.dispatcher.initialize();
        self.transport.disconnect()?;
        info!("Actuators zeroed, transport disconnected");
        Ok(())
    }

    /// 命令分发器
    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut CommandDispatcher {
        &mut self.dispatcher
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// 共享的指标计数器
    pub fn metrics(&self) -> Arc<ControllerMetrics> {
        Arc::clone(self.dispatcher.metrics())
    }

    /// 执行器当前占空比
    #[inline]
    pub fn duty(&self, id: ActuatorId) -> u16 {
        self.dispatcher.duty(id)
    }
}
