//! # Hover Protocol
//!
//! 遥控指令协议定义（无传输层、无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 占空比、功率上限、超时等协议常量
//! - `ids`: 执行器标识（升力电机、转向电机、指示灯）
//! - `topics`: 主题角色（订阅时一次性解析）
//! - `command`: 载荷解码为类型化命令
//! - `status`: 对外发布的状态事件
//!
//! ## 线上格式
//!
//! 主题与载荷均为不透明字节串，按字节精确匹配：
//! 区分大小写、不裁剪空白、不做前缀/通配匹配。

pub mod command;
pub mod constants;
pub mod ids;
pub mod status;
pub mod topics;

// 重新导出常用类型
pub use command::*;
pub use constants::*;
pub use ids::*;
pub use status::*;
pub use topics::*;

use thiserror::Error;

/// 协议解析错误类型
///
/// 所有变体都属于"可恢复/本地"错误：调用方记录日志后丢弃该消息，
/// 不得导致进程退出。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unknown payload token {payload:?} for topic role {role:?}")]
    UnknownToken { role: TopicRole, payload: String },

    #[error("Invalid integer payload: {payload:?}")]
    InvalidInteger { payload: String },

    #[error("Power limit {value} out of range [{min}, {max}]")]
    PowerLimitOutOfRange { value: i64, min: u16, max: u16 },
}

impl ProtocolError {
    /// 载荷转为日志可读文本（非 UTF-8 字节按替换字符显示）
    pub(crate) fn lossy(payload: &[u8]) -> String {
        String::from_utf8_lossy(payload).into_owned()
    }
}
