//! 命令分发
//!
//! 入站 (主题, 载荷) → [`TopicRole`] → [`Command`] → 执行器状态变更。
//!
//! | 命令 | 动作 |
//! |------|------|
//! | `SetBinary { on }` | 升力电机组与指示灯置 `MAX_DUTY`（受功率上限钳位）或 0，发布状态 |
//! | `Steer { which }` | 本方向置为功率上限，反方向清零，登记本方向超时 |
//! | `ReleaseSteer { which }` | 本方向清零，计时留待自然到期 |
//! | `SetPowerLimit { value }` | 更新功率上限，不影响已生效的占空比 |
//!
//! 未知主题忽略；无法解码的载荷丢弃并记录警告。两者都不改变状态。

use crate::bank::ActuatorBank;
use crate::clock::Timestamp;
use crate::error::DriverError;
use crate::metrics::ControllerMetrics;
use crate::status::StatusPublisher;
use crate::timeout::TimeoutMonitor;
use hover_protocol::{ActuatorId, Command, MAX_DUTY, StatusEvent, TopicRole, TopicTable};
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 单条入站消息的处理结果
#[derive(Debug)]
pub enum DispatchOutcome {
    /// 主题不在主题表中
    Ignored,
    /// 载荷无法解码或数值越界，状态未变
    Discarded(DriverError),
    /// 命令已应用
    Applied(Command),
}

impl DispatchOutcome {
    /// 命令是否已生效
    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchOutcome::Applied(_))
    }
}

/// 命令分发器
///
/// 独占执行器状态与超时监视器；只在控制循环线程内使用，无需加锁。
#[derive(Debug)]
pub struct CommandDispatcher {
    topics: TopicTable,
    bank: ActuatorBank,
    monitor: TimeoutMonitor,
    metrics: Arc<ControllerMetrics>,
}

impl CommandDispatcher {
    /// 使用默认执行器表、给定转向超时和新的指标计数器创建
    pub fn new(topics: TopicTable, steer_timeout: Duration) -> Self {
        Self::with_parts(
            topics,
            ActuatorBank::new(),
            TimeoutMonitor::new(steer_timeout),
            Arc::new(ControllerMetrics::new()),
        )
    }

    /// 由现成组件装配（构建器使用，回调和指标可在外部共享）
    pub fn with_parts(
        topics: TopicTable,
        bank: ActuatorBank,
        monitor: TimeoutMonitor,
        metrics: Arc<ControllerMetrics>,
    ) -> Self {
        Self {
            topics,
            bank,
            monitor,
            metrics,
        }
    }

    /// 处理一条入站消息
    ///
    /// 未知主题返回 `Ignored`，无法解码或越界的载荷返回 `Discarded`，
    /// 两种情况都不改变执行器状态。
    ///
    /// # 示例
    ///
    /// ```
    /// use hover_driver::{ActuatorId, CommandDispatcher, StatusEvent, Timestamp, TopicTable};
    /// use std::time::Duration;
    ///
    /// let mut dispatcher = CommandDispatcher::new(TopicTable::standard(), Duration::from_secs(5));
    /// let mut published: Vec<StatusEvent> = Vec::new();
    ///
    /// let outcome = dispatcher.dispatch(b"ligar", b"on", Timestamp::ZERO, &mut published);
    /// assert!(outcome.is_applied());
    /// assert_eq!(dispatcher.duty(ActuatorId::Lift1), 1023);
    /// assert_eq!(published.len(), 1);
    ///
    /// let outcome = dispatcher.dispatch(b"intervalo", b"9999", Timestamp::ZERO, &mut published);
    /// assert!(!outcome.is_applied());
    /// assert_eq!(dispatcher.power_limit(), 1023);
    /// ```
    pub fn dispatch(
        &mut self,
        topic: &[u8],
        payload: &[u8],
        now: Timestamp,
        publisher: &mut dyn StatusPublisher,
    ) -> DispatchOutcome {
        ControllerMetrics::incr(&self.metrics.messages_received);
        debug!(
            "Received: topic = {}, payload = {}",
            String::from_utf8_lossy(topic),
            String::from_utf8_lossy(payload)
        );

        let Some(role) = self.topics.resolve(topic) else {
            ControllerMetrics::incr(&self.metrics.messages_ignored);
            debug!("Ignoring message on unknown topic");
            return DispatchOutcome::Ignored;
        };

        let command = match Command::decode(role, payload) {
            Ok(command) => command,
            Err(e) => return self.discard(e.into()),
        };

        match self.apply(command, now, publisher) {
            Ok(()) => {
                ControllerMetrics::incr(&self.metrics.commands_applied);
                DispatchOutcome::Applied(command)
            },
            Err(e) => self.discard(e),
        }
    }

    fn discard(&self, error: DriverError) -> DispatchOutcome {
        ControllerMetrics::incr(&self.metrics.messages_discarded);
        warn!("Discarding message: {}", error);
        DispatchOutcome::Discarded(error)
    }

    /// 应用已解码的命令
    pub fn apply(
        &mut self,
        command: Command,
        now: Timestamp,
        publisher: &mut dyn StatusPublisher,
    ) -> Result<(), DriverError> {
        match command {
            Command::SetBinary { target, on } => {
                let duty = if on { MAX_DUTY as i32 } else { 0 };
                self.bank.set_group(target.motors(), duty)?;
                if let Some(indicator) = target.indicator() {
                    self.bank.set(indicator, duty)?;
                }

                let event = StatusEvent::binary(target, on);
                if let Err(e) = publisher.publish(&event) {
                    ControllerMetrics::incr(&self.metrics.publish_failures);
                    warn!("Failed to publish status {}={}: {}", event.name, event.value, e);
                }
            },
            Command::Steer { which } => {
                let id = which.actuator();
                self.bank.set(id, self.bank.power_limit() as i32)?;
                // 反方向只清占空比，计时继续跑
                self.bank.clear(which.opposite().actuator());
                self.monitor.record_activation(id, now)?;
            },
            Command::ReleaseSteer { which } => {
                self.bank.clear(which.actuator());
            },
            Command::SetPowerLimit { value } => {
                self.bank.set_power_limit(value as i32)?;
                info!("Power limit set to {}", value);
            },
        }
        Ok(())
    }

    /// 释放已超时的瞬时执行器
    pub fn release_expired(&mut self, now: Timestamp) -> SmallVec<[ActuatorId; 2]> {
        let released = self.monitor.tick(now);
        for &id in released.iter() {
            self.bank.clear(id);
            ControllerMetrics::incr(&self.metrics.auto_releases);
            info!(
                "{} released after {:?} without renewal",
                id.name(),
                self.monitor.timeout()
            );
        }
        released
    }

    /// 初始化例程：全部执行器清零，清空超时
    pub fn initialize(&mut self) {
        self.bank.reset();
        self.monitor.reset();
    }

    /// 主题表
    pub fn topics(&self) -> &TopicTable {
        &self.topics
    }

    /// 主题对应的角色
    pub fn role_of(&self, topic: &[u8]) -> Option<TopicRole> {
        self.topics.resolve(topic)
    }

    /// 执行器占空比表
    pub fn bank(&self) -> &ActuatorBank {
        &self.bank
    }

    /// 执行器占空比表（可变，绕过命令解码）
    pub fn bank_mut(&mut self) -> &mut ActuatorBank {
        &mut self.bank
    }

    /// 超时监视器
    pub fn monitor(&self) -> &TimeoutMonitor {
        &self.monitor
    }

    /// 共享的指标计数器
    pub fn metrics(&self) -> &Arc<ControllerMetrics> {
        &self.metrics
    }

    /// 执行器当前占空比
    #[inline]
    pub fn duty(&self, id: ActuatorId) -> u16 {
        self.bank.get(id)
    }

    /// 当前功率上限
    #[inline]
    pub fn power_limit(&self) -> u16 {
        self.bank.power_limit()
    }
}
