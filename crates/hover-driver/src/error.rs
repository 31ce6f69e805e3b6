//! 驱动层错误类型定义

use hover_protocol::{ActuatorId, ProtocolError};
use hover_tools::ConfigError;
use hover_transport::TransportError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 传输层错误
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// 数值超出允许范围（负占空比、功率上限越界）
    #[error("Value {value} out of range [{min}, {max}]")]
    OutOfRange { value: i64, min: i64, max: i64 },

    /// 对非瞬时执行器登记超时
    #[error("Actuator {0:?} is not momentary")]
    NotMomentary(ActuatorId),

    /// 网络关联失败（已用尽检查次数）
    #[error("Network association failed after {attempts} attempts")]
    AssociationFailed { attempts: u32 },

    /// broker 不可用（重试策略已放弃）
    #[error("Broker unavailable after {attempts} attempts: {reason}")]
    BrokerUnavailable { attempts: u32, reason: String },

    /// 启动阶段收到停止请求
    #[error("Interrupted by stop request")]
    Interrupted,
}
