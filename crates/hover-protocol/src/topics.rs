//! 主题角色
//!
//! 线上主题字符串在订阅时一次性解析为封闭的 [`TopicRole`] 枚举，
//! 分发逻辑只看角色，不再散落字符串比较。

use crate::constants::{TOPIC_POWER, TOPIC_POWER_LIMIT, TOPIC_STEERING};

/// 主题角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TopicRole {
    /// 电源开关：`on` / `off`
    Power,
    /// 独立关闭主题（旧布局）：仅接受 `off`
    PowerOff,
    /// 转向：`virar_direita` / `virar_esquerda`
    Steering,
    /// 右转独立主题（旧布局）：`on` / `off`
    SteerRight,
    /// 左转独立主题（旧布局）：`on` / `off`
    SteerLeft,
    /// 功率上限：十进制整数
    PowerLimit,
}

/// 主题表：线上主题 → 角色
///
/// 主题按字节精确匹配，无通配符。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicTable {
    entries: Vec<(String, TopicRole)>,
}

impl TopicTable {
    /// 空表
    pub fn new() -> Self {
        Self::default()
    }

    /// 标准主题布局：`ligar`、`controle/motores`、`intervalo`
    pub fn standard() -> Self {
        Self::new()
            .with(TOPIC_POWER, TopicRole::Power)
            .with(TOPIC_STEERING, TopicRole::Steering)
            .with(TOPIC_POWER_LIMIT, TopicRole::PowerLimit)
    }

    /// 追加一条映射（链式）
    ///
    /// 同一主题重复注册时，后注册的覆盖先注册的。
    #[must_use]
    pub fn with(mut self, topic: impl Into<String>, role: TopicRole) -> Self {
        self.insert(topic, role);
        self
    }

    pub fn insert(&mut self, topic: impl Into<String>, role: TopicRole) {
        let topic = topic.into();
        if let Some(entry) = self.entries.iter_mut().find(|(t, _)| *t == topic) {
            entry.1 = role;
        } else {
            self.entries.push((topic, role));
        }
    }

    /// 解析入站主题
    pub fn resolve(&self, topic: &[u8]) -> Option<TopicRole> {
        self.entries
            .iter()
            .find(|(t, _)| t.as_bytes() == topic)
            .map(|(_, role)| *role)
    }

    /// 需要订阅的主题（按注册顺序）
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
