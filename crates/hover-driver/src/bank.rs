//! 执行器占空比状态
//!
//! [`ActuatorBank`] 是占空比的唯一写入者。所有值始终落在
//! `[0, power_limit]` 内；功率上限只约束之后的写入，
//! 不回溯压低已生效的占空比。

use crate::error::DriverError;
use crate::hooks::{DutyCallback, HookManager};
use hover_protocol::{ActuatorId, MAX_DUTY, MIN_POWER, power_limit_in_range};
use std::sync::Arc;
use tracing::trace;

/// 执行器占空比表
#[derive(Debug)]
pub struct ActuatorBank {
    duty: [u16; ActuatorId::COUNT],
    power_limit: u16,
    hooks: HookManager,
}

impl Default for ActuatorBank {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorBank {
    /// 全零占空比，功率上限为 `MAX_DUTY`
    pub fn new() -> Self {
        Self::with_hooks(HookManager::new())
    }

    /// 使用已有回调集合创建，初始状态同 [`new`](Self::new)
    pub fn with_hooks(hooks: HookManager) -> Self {
        Self {
            duty: [0; ActuatorId::COUNT],
            power_limit: MAX_DUTY,
            hooks,
        }
    }

    /// 注册占空比回调
    pub fn add_hook(&mut self, callback: Arc<dyn DutyCallback>) {
        self.hooks.add_callback(callback);
    }

    /// 已注册的回调
    pub fn hooks(&self) -> &HookManager {
        &self.hooks
    }

    fn validate(duty: i32) -> Result<u16, DriverError> {
        if duty < 0 {
            return Err(DriverError::OutOfRange {
                value: duty as i64,
                min: 0,
                max: MAX_DUTY as i64,
            });
        }
        Ok(duty.min(u16::MAX as i32) as u16)
    }

    fn store(&mut self, id: ActuatorId, duty: u16) -> u16 {
        let clamped = duty.min(self.power_limit);
        self.duty[id.index()] = clamped;
        trace!("{} duty = {}", id.name(), clamped);
        self.hooks.trigger_all(id, clamped);
        clamped
    }

    /// 写入占空比，返回实际存储的值
    ///
    /// 负值返回 `OutOfRange` 且不改变状态；超过功率上限的值被钳位。
    ///
    /// # 示例
    ///
    /// ```
    /// use hover_driver::{ActuatorBank, ActuatorId, DriverError};
    ///
    /// let mut bank = ActuatorBank::new();
    /// bank.set_power_limit(600).unwrap();
    /// assert_eq!(bank.set(ActuatorId::SteerLeft, 1023).unwrap(), 600);
    /// assert_eq!(bank.get(ActuatorId::SteerLeft), 600);
    ///
    /// let err = bank.set(ActuatorId::SteerLeft, -1).unwrap_err();
    /// assert!(matches!(err, DriverError::OutOfRange { value: -1, .. }));
    /// assert_eq!(bank.get(ActuatorId::SteerLeft), 600);
    /// ```
    pub fn set(&mut self, id: ActuatorId, duty: i32) -> Result<u16, DriverError> {
        let duty = Self::validate(duty)?;
        Ok(self.store(id, duty))
    }

    /// 清零
    pub fn clear(&mut self, id: ActuatorId) {
        self.store(id, 0);
    }

    /// 对一组执行器写入相同占空比
    ///
    /// 先校验后写入，失败时任何执行器都不会被修改。
    pub fn set_group(&mut self, ids: &[ActuatorId], duty: i32) -> Result<u16, DriverError> {
        let duty = Self::validate(duty)?;
        let mut stored = duty.min(self.power_limit);
        for &id in ids {
            stored = self.store(id, duty);
        }
        Ok(stored)
    }

    /// 设置功率上限，范围 `[MIN_POWER, MAX_DUTY]`
    pub fn set_power_limit(&mut self, value: i32) -> Result<(), DriverError> {
        if !power_limit_in_range(value as i64) {
            return Err(DriverError::OutOfRange {
                value: value as i64,
                min: MIN_POWER as i64,
                max: MAX_DUTY as i64,
            });
        }
        self.power_limit = value as u16;
        Ok(())
    }

    /// 当前占空比
    #[inline]
    pub fn get(&self, id: ActuatorId) -> u16 {
        self.duty[id.index()]
    }

    /// 当前功率上限
    #[inline]
    pub fn power_limit(&self) -> u16 {
        self.power_limit
    }

    /// 按通道序号排列的占空比快照
    pub fn snapshot(&self) -> [u16; ActuatorId::COUNT] {
        self.duty
    }

    /// 全部清零（初始化例程）
    ///
    /// 对每个执行器都触发回调，即使其值本来就是 0。功率上限保持不变。
    pub fn reset(&mut self) {
        for id in ActuatorId::ALL {
            self.store(id, 0);
        }
    }
}
