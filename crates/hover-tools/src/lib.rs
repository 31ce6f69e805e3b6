//! # Hover Tools
//!
//! 控制器共享的配置结构与工具
//!
//! ## 模块
//!
//! - `config`: 控制器配置（TOML），显式传入控制器，不使用全局可变状态
//! - `retry`: 连接重试策略

pub mod config;
pub mod retry;

pub use config::{
    BrokerConfig, ConfigError, ControlConfig, ControllerConfig, NetworkConfig, TopicsConfig,
};
pub use retry::{RetryMode, RetryPolicy};
