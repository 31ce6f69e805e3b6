//! 命令解码
//!
//! 将 (主题角色, 载荷) 解码为类型化 [`Command`]。
//! 载荷按字面量精确匹配：`"On"`、`" on"`、`"on\n"` 都不是 `on`。

use crate::constants::*;
use crate::ids::{ActuatorId, SteerDirection};
use crate::topics::TopicRole;
use crate::ProtocolError;

/// 二值执行器组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryGroup {
    /// 升力电机组 + 指示灯
    Power,
}

impl BinaryGroup {
    /// 组内的电机（不含指示灯）
    pub fn motors(self) -> &'static [ActuatorId] {
        match self {
            BinaryGroup::Power => &ActuatorId::LIFT_BANK,
        }
    }

    /// 随组一起开关的指示灯
    pub fn indicator(self) -> Option<ActuatorId> {
        match self {
            BinaryGroup::Power => Some(ActuatorId::Indicator),
        }
    }

    /// 状态事件名
    pub fn status_name(self) -> &'static str {
        match self {
            BinaryGroup::Power => STATUS_POWER,
        }
    }
}

/// 解码后的命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// 二值组开关
    SetBinary { target: BinaryGroup, on: bool },
    /// 转向激活（刷新超时计时）
    Steer { which: SteerDirection },
    /// 转向显式关闭（仅旧布局的独立转向主题）
    ReleaseSteer { which: SteerDirection },
    /// 设置功率上限，已校验在 `[MIN_POWER, MAX_DUTY]` 内
    SetPowerLimit { value: u16 },
}

impl Command {
    /// 按主题角色解码载荷
    pub fn decode(role: TopicRole, payload: &[u8]) -> Result<Self, ProtocolError> {
        let unknown = || ProtocolError::UnknownToken {
            role,
            payload: ProtocolError::lossy(payload),
        };

        match role {
            TopicRole::Power => match payload {
                TOKEN_ON => Ok(Command::SetBinary {
                    target: BinaryGroup::Power,
                    on: true,
                }),
                TOKEN_OFF => Ok(Command::SetBinary {
                    target: BinaryGroup::Power,
                    on: false,
                }),
                _ => Err(unknown()),
            },
            TopicRole::PowerOff => match payload {
                TOKEN_OFF => Ok(Command::SetBinary {
                    target: BinaryGroup::Power,
                    on: false,
                }),
                _ => Err(unknown()),
            },
            TopicRole::Steering => match payload {
                TOKEN_TURN_RIGHT => Ok(Command::Steer {
                    which: SteerDirection::Right,
                }),
                TOKEN_TURN_LEFT => Ok(Command::Steer {
                    which: SteerDirection::Left,
                }),
                _ => Err(unknown()),
            },
            TopicRole::SteerRight | TopicRole::SteerLeft => {
                let which = if role == TopicRole::SteerRight {
                    SteerDirection::Right
                } else {
                    SteerDirection::Left
                };
                match payload {
                    TOKEN_ON => Ok(Command::Steer { which }),
                    TOKEN_OFF => Ok(Command::ReleaseSteer { which }),
                    _ => Err(unknown()),
                }
            },
            TopicRole::PowerLimit => decode_power_limit(payload),
        }
    }
}

/// 解析功率上限载荷
///
/// 十进制整数，不裁剪空白。
fn decode_power_limit(payload: &[u8]) -> Result<Command, ProtocolError> {
    let invalid = || ProtocolError::InvalidInteger {
        payload: ProtocolError::lossy(payload),
    };

    let text = std::str::from_utf8(payload).map_err(|_| invalid())?;
    let value: i64 = text.parse().map_err(|_| invalid())?;

    if !power_limit_in_range(value) {
        return Err(ProtocolError::PowerLimitOutOfRange {
            value,
            min: MIN_POWER,
            max: MAX_DUTY,
        });
    }

    // 范围已校验，必然落在 u16 内
    Ok(Command::SetPowerLimit {
        value: value as u16,
    })
}
