//! 控制器运行指标
//!
//! 原子计数器，可通过 `Arc` 在控制循环之外读取（例如退出时打印）。

use std::sync::atomic::{AtomicU64, Ordering};

/// 控制器实时指标
///
/// # 使用示例
///
/// ```rust
/// use hover_driver::ControllerMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = ControllerMetrics::new();
/// metrics.messages_received.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(metrics.snapshot().messages_received, 1);
/// ```
#[derive(Debug, Default)]
pub struct ControllerMetrics {
    /// 收到的入站消息总数（含未知主题）
    pub messages_received: AtomicU64,

    /// 成功应用的命令数
    pub commands_applied: AtomicU64,

    /// 未知主题（忽略）
    pub messages_ignored: AtomicU64,

    /// 载荷无法解码或数值越界（丢弃）
    pub messages_discarded: AtomicU64,

    /// 超时自动释放次数
    pub auto_releases: AtomicU64,

    /// 状态发布失败次数
    pub publish_failures: AtomicU64,
}

impl ControllerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            commands_applied: self.commands_applied.load(Ordering::Relaxed),
            messages_ignored: self.messages_ignored.load(Ordering::Relaxed),
            messages_discarded: self.messages_discarded.load(Ordering::Relaxed),
            auto_releases: self.auto_releases.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.messages_received.store(0, Ordering::Relaxed);
        self.commands_applied.store(0, Ordering::Relaxed);
        self.messages_ignored.store(0, Ordering::Relaxed);
        self.messages_discarded.store(0, Ordering::Relaxed);
        self.auto_releases.store(0, Ordering::Relaxed);
        self.publish_failures.store(0, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub commands_applied: u64,
    pub messages_ignored: u64,
    pub messages_discarded: u64,
    pub auto_releases: u64,
    pub publish_failures: u64,
}
