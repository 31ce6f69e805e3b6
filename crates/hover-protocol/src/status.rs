//! 状态事件

use crate::command::BinaryGroup;
use crate::constants::{STATUS_OFF, STATUS_ON, STATUS_PREFIX};

/// 对外发布的状态事件
///
/// 每次二值组开关命令都会产生一个事件，不与上次发布值去重。
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEvent {
    /// 主题后缀
    pub name: String,
    /// 状态值
    pub value: String,
}

impl StatusEvent {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// 二值组开关对应的事件（`ligado` / `desligado`）
    pub fn binary(group: BinaryGroup, on: bool) -> Self {
        Self::new(group.status_name(), if on { STATUS_ON } else { STATUS_OFF })
    }

    /// 完整发布主题：前缀 + 事件名
    pub fn topic(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.name)
    }

    /// 使用默认前缀 `status/` 的发布主题
    pub fn default_topic(&self) -> String {
        self.topic(STATUS_PREFIX)
    }
}
