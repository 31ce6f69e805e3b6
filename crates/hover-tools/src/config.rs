//! # 控制器配置
//!
//! 所有原本写死在模块顶层的网络/broker/主题参数集中到 [`ControllerConfig`]，
//! 由调用方构造后传入控制器。
//!
//! 未出现在文件中的字段取默认值，默认值与现场部署保持一致。
//!
//! ```toml
//! [broker]
//! host = "172.20.10.14"
//!
//! [broker.retry]
//! mode = "limited"
//! max_attempts = 2
//! ```

use crate::retry::{RetryMode, RetryPolicy};
use hover_protocol::{
    STATUS_PREFIX, STEER_TIMEOUT, TICK_INTERVAL, TOPIC_POWER, TOPIC_POWER_LIMIT, TOPIC_STEERING,
    TopicRole, TopicTable,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 控制器配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    pub network: NetworkConfig,
    pub broker: BrokerConfig,
    pub topics: TopicsConfig,
    pub control: ControlConfig,
}

impl ControllerConfig {
    /// 从 TOML 文件加载并校验
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// 从 TOML 文本解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "control.tick_interval_ms must be > 0".into(),
            ));
        }
        if self.control.steer_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "control.steer_timeout_ms must be > 0".into(),
            ));
        }
        if self.network.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "network.max_attempts must be > 0".into(),
            ));
        }
        if self.broker.host.is_empty() {
            return Err(ConfigError::Invalid("broker.host must not be empty".into()));
        }
        if self.broker.retry.mode == RetryMode::Limited && self.broker.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "broker.retry.max_attempts must be > 0 in limited mode".into(),
            ));
        }
        if self.topics.status_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "topics.status_prefix must not be empty".into(),
            ));
        }

        let mut seen: Vec<&str> = Vec::new();
        for (topic, _) in self.topics.entries() {
            if topic.is_empty() {
                return Err(ConfigError::Invalid("topic names must not be empty".into()));
            }
            if seen.contains(&topic) {
                return Err(ConfigError::Invalid(format!(
                    "topic {:?} is assigned to more than one role",
                    topic
                )));
            }
            seen.push(topic);
        }
        Ok(())
    }

    /// 序列化为 TOML 文本
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// 网络关联设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// 网络名称（主机链路下不使用）
    pub ssid: String,
    /// 网络密码（主机链路下不使用，不写入日志）
    pub password: String,
    /// 最大关联检查次数
    pub max_attempts: u32,
    /// 两次检查之间的间隔（毫秒）
    pub retry_delay_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            max_attempts: 20,
            retry_delay_ms: 2000,
        }
    }
}

impl NetworkConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// broker 连接设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
    /// 创建客户端后、首次连接前的等待（毫秒）
    pub settle_delay_ms: u64,
    /// 单次轮询的最长等待（毫秒）
    pub poll_timeout_ms: u64,
    /// 等待 CONNACK 的最长时间（毫秒）
    pub connect_timeout_ms: u64,
    pub retry: RetryPolicy,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1883,
            client_id: "cliente_12321".to_string(),
            keep_alive_secs: 60,
            settle_delay_ms: 3000,
            poll_timeout_ms: 10,
            connect_timeout_ms: 5000,
            retry: RetryPolicy::default(),
        }
    }
}

impl BrokerConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// 主题设置
///
/// 默认值必须与现场部署逐字节一致。可选主题用于旧布局：
/// 独立的关闭主题、按方向拆分的转向主题。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TopicsConfig {
    pub power: String,
    pub steering: String,
    pub power_limit: String,
    pub status_prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_off: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steer_right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steer_left: Option<String>,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            power: TOPIC_POWER.to_string(),
            steering: TOPIC_STEERING.to_string(),
            power_limit: TOPIC_POWER_LIMIT.to_string(),
            status_prefix: STATUS_PREFIX.to_string(),
            power_off: None,
            steer_right: None,
            steer_left: None,
        }
    }
}

impl TopicsConfig {
    /// 所有已配置的入站主题及其角色
    pub fn entries(&self) -> Vec<(&str, TopicRole)> {
        let mut entries = vec![
            (self.power.as_str(), TopicRole::Power),
            (self.steering.as_str(), TopicRole::Steering),
            (self.power_limit.as_str(), TopicRole::PowerLimit),
        ];
        if let Some(topic) = &self.power_off {
            entries.push((topic.as_str(), TopicRole::PowerOff));
        }
        if let Some(topic) = &self.steer_right {
            entries.push((topic.as_str(), TopicRole::SteerRight));
        }
        if let Some(topic) = &self.steer_left {
            entries.push((topic.as_str(), TopicRole::SteerLeft));
        }
        entries
    }

    /// 解析为主题表（订阅时一次性构建）
    pub fn table(&self) -> TopicTable {
        self.entries()
            .into_iter()
            .fold(TopicTable::new(), |table, (topic, role)| {
                table.with(topic, role)
            })
    }
}

/// 控制循环设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    pub tick_interval_ms: u64,
    pub steer_timeout_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL.as_millis() as u64,
            steer_timeout_ms: STEER_TIMEOUT.as_millis() as u64,
        }
    }
}

impl ControlConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn steer_timeout(&self) -> Duration {
        Duration::from_millis(self.steer_timeout_ms)
    }
}
