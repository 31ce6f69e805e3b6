//! # 连接重试策略
//!
//! broker 连接失败后的行为必须显式配置，而不是在代码里写死：
//!
//! | 模式 | 行为 |
//! |------|------|
//! | `forever` | 固定间隔无限重试 |
//! | `limited` | 最多尝试 `max_attempts` 次 |
//! | `fail-fast` | 只尝试一次 |

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 重试模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetryMode {
    Forever,
    Limited,
    FailFast,
}

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    pub mode: RetryMode,
    /// 仅 `limited` 模式使用：总尝试次数（含第一次）
    pub max_attempts: u32,
    /// 两次尝试之间的固定间隔（毫秒）
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::forever(Duration::from_secs(2))
    }
}

impl RetryPolicy {
    pub fn forever(delay: Duration) -> Self {
        Self {
            mode: RetryMode::Forever,
            max_attempts: 0,
            delay_ms: delay.as_millis() as u64,
        }
    }

    pub fn limited(max_attempts: u32, delay: Duration) -> Self {
        Self {
            mode: RetryMode::Limited,
            max_attempts,
            delay_ms: delay.as_millis() as u64,
        }
    }

    pub fn fail_fast() -> Self {
        Self {
            mode: RetryMode::FailFast,
            max_attempts: 1,
            delay_ms: 0,
        }
    }

    /// 是否允许第 `attempt` 次尝试（从 1 开始计数）
    pub fn allows(&self, attempt: u32) -> bool {
        match self.mode {
            RetryMode::Forever => true,
            RetryMode::Limited => attempt <= self.max_attempts,
            RetryMode::FailFast => attempt <= 1,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
