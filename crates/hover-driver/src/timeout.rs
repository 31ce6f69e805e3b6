//! 瞬时执行器超时监视
//!
//! 每个瞬时执行器（转向电机）有两个状态：
//!
//! ```text
//! Idle ──record_activation(now)──> Active(now)
//!  ^                                   │  record_activation(t) 刷新为 Active(t)
//!  └──── tick: now - last_seen > timeout
//! ```
//!
//! 没有取消操作：反方向激活不会清除本方向的计时，只能自然到期。

use crate::clock::Timestamp;
use crate::error::DriverError;
use hover_protocol::ActuatorId;
use smallvec::SmallVec;
use std::time::Duration;

/// 单个瞬时执行器的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MomentaryState {
    /// 无待释放的激活
    Idle,
    /// 最近一次激活于给定时刻
    Active(Timestamp),
}

/// 超时监视器
///
/// # 示例
///
/// ```
/// use hover_driver::{ActuatorId, MomentaryState, TimeoutMonitor, Timestamp};
/// use std::time::Duration;
///
/// let mut monitor = TimeoutMonitor::new(Duration::from_secs(5));
/// monitor
///     .record_activation(ActuatorId::SteerRight, Timestamp::ZERO)
///     .unwrap();
///
/// // 恰好等于超时不释放
/// assert!(monitor.tick(Timestamp::from_secs(5)).is_empty());
/// let released = monitor.tick(Timestamp::from_millis(5_001));
/// assert_eq!(released.as_slice(), &[ActuatorId::SteerRight]);
/// assert_eq!(monitor.state(ActuatorId::SteerRight), MomentaryState::Idle);
/// ```
#[derive(Debug, Clone)]
pub struct TimeoutMonitor {
    timeout: Duration,
    /// 下标 0 = SteerRight，1 = SteerLeft
    pending: [Option<Timestamp>; 2],
}

impl TimeoutMonitor {
    /// 创建监视器，所有瞬时执行器处于 `Idle`
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pending: [None; 2],
        }
    }

    /// 自动释放超时
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn slot(id: ActuatorId) -> Result<usize, DriverError> {
        match id {
            ActuatorId::SteerRight => Ok(0),
            ActuatorId::SteerLeft => Ok(1),
            other => Err(DriverError::NotMomentary(other)),
        }
    }

    const fn id_of(slot: usize) -> ActuatorId {
        if slot == 0 {
            ActuatorId::SteerRight
        } else {
            ActuatorId::SteerLeft
        }
    }

    /// 登记激活，无论之前状态如何都刷新为 `Active(now)`
    pub fn record_activation(&mut self, id: ActuatorId, now: Timestamp) -> Result<(), DriverError> {
        let slot = Self::slot(id)?;
        self.pending[slot] = Some(now);
        Ok(())
    }

    /// 扫描到期项
    ///
    /// 经过时间严格大于超时才释放；释放的执行器回到 `Idle`。
    pub fn tick(&mut self, now: Timestamp) -> SmallVec<[ActuatorId; 2]> {
        let mut released = SmallVec::new();
        for (slot, entry) in self.pending.iter_mut().enumerate() {
            if let Some(last_seen) = *entry
                && now.saturating_duration_since(last_seen) > self.timeout
            {
                *entry = None;
                released.push(Self::id_of(slot));
            }
        }
        released
    }

    /// 最近一次激活时间，非瞬时执行器返回 `None`
    pub fn pending(&self, id: ActuatorId) -> Option<Timestamp> {
        Self::slot(id).ok().and_then(|slot| self.pending[slot])
    }

    /// 执行器的当前状态，非瞬时执行器始终为 `Idle`
    pub fn state(&self, id: ActuatorId) -> MomentaryState {
        match self.pending(id) {
            Some(t) => MomentaryState::Active(t),
            None => MomentaryState::Idle,
        }
    }

    /// 全部回到 `Idle`
    pub fn reset(&mut self) {
        self.pending = [None; 2];
    }
}
