//! 钩子系统（Hook System）
//!
//! 占空比变化时触发自定义回调。硬件抽象层（PWM 输出）通过注册
//! [`DutyCallback`] 读取 [`ActuatorBank`](crate::ActuatorBank) 的变化，
//! 控制核心本身不驱动任何电信号。
//!
//! # 使用示例
//!
//! ```rust
//! use hover_driver::hooks::{DutyCallback, DutyRecorder, HookManager};
//! use hover_protocol::ActuatorId;
//! use std::sync::Arc;
//!
//! let mut hooks = HookManager::new();
//! let (recorder, rx) = DutyRecorder::new(16);
//! hooks.add_callback(Arc::new(recorder));
//!
//! hooks.trigger_all(ActuatorId::Indicator, 1023);
//! assert_eq!(rx.try_recv().unwrap(), (ActuatorId::Indicator, 1023));
//! ```

use crossbeam_channel::{Receiver, Sender, bounded};
use hover_protocol::ActuatorId;
use std::sync::Arc;
use tracing::debug;

/// 占空比回调 Trait
///
/// # 性能要求
///
/// - **非阻塞**: 回调在控制循环线程内同步执行，禁止阻塞 I/O
/// - **Channel 模式**: 需要跨线程处理时使用 `try_send`
pub trait DutyCallback: Send + Sync {
    /// 执行器占空比被写入后调用
    fn on_duty_changed(&self, id: ActuatorId, duty: u16);
}

/// 钩子管理器
#[derive(Default)]
pub struct HookManager {
    /// 回调列表
    callbacks: Vec<Arc<dyn DutyCallback>>,
}

impl HookManager {
    /// 创建新的钩子管理器
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// 添加回调
    pub fn add_callback(&mut self, callback: Arc<dyn DutyCallback>) {
        self.callbacks.push(callback);
    }

    /// 移除所有回调
    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    /// 触发所有回调
    pub fn trigger_all(&self, id: ActuatorId, duty: u16) {
        for callback in self.callbacks.iter() {
            callback.on_duty_changed(id, duty);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl std::fmt::Debug for HookManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookManager")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

/// 将占空比变化写入日志的输出（主机构建下代替 PWM）
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDutyOutput;

impl DutyCallback for TracingDutyOutput {
    fn on_duty_changed(&self, id: ActuatorId, duty: u16) {
        debug!("PWM {} <- {}", id.name(), duty);
    }
}

/// 异步录制钩子
///
/// 通过有界 channel 转发占空比变化；channel 满时丢弃，不阻塞控制循环。
pub struct DutyRecorder {
    sender: Sender<(ActuatorId, u16)>,
}

impl DutyRecorder {
    /// 创建录制钩子及其接收端
    pub fn new(capacity: usize) -> (Self, Receiver<(ActuatorId, u16)>) {
        let (sender, receiver) = bounded(capacity);
        (Self { sender }, receiver)
    }
}

impl DutyCallback for DutyRecorder {
    fn on_duty_changed(&self, id: ActuatorId, duty: u16) {
        // ✅ try_send，非阻塞
        let _ = self.sender.try_send((id, duty));
    }
}
