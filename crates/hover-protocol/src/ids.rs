//! 执行器标识
//!
//! 执行器集合在编译期固定，不在运行时发现。

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 逻辑执行器标识
///
/// `repr(u8)` 的取值即 PWM 通道序号，硬件抽象层按此索引输出。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ActuatorId {
    /// 升力电机 1
    Lift1 = 0,
    /// 升力电机 2
    Lift2 = 1,
    /// 右转电机（瞬时）
    SteerRight = 2,
    /// 左转电机（瞬时）
    SteerLeft = 3,
    /// 指示灯
    Indicator = 4,
}

impl ActuatorId {
    /// 执行器数量
    pub const COUNT: usize = 5;

    /// 全部执行器，按通道序号排列
    pub const ALL: [ActuatorId; Self::COUNT] = [
        ActuatorId::Lift1,
        ActuatorId::Lift2,
        ActuatorId::SteerRight,
        ActuatorId::SteerLeft,
        ActuatorId::Indicator,
    ];

    /// 升力电机组（总是一起开关）
    pub const LIFT_BANK: [ActuatorId; 2] = [ActuatorId::Lift1, ActuatorId::Lift2];

    /// 通道序号
    #[inline]
    pub fn index(self) -> usize {
        u8::from(self) as usize
    }

    /// 是否为瞬时执行器（受超时自动释放约束）
    #[inline]
    pub fn is_momentary(self) -> bool {
        matches!(self, ActuatorId::SteerRight | ActuatorId::SteerLeft)
    }

    pub fn name(self) -> &'static str {
        match self {
            ActuatorId::Lift1 => "lift1",
            ActuatorId::Lift2 => "lift2",
            ActuatorId::SteerRight => "steer_right",
            ActuatorId::SteerLeft => "steer_left",
            ActuatorId::Indicator => "indicator",
        }
    }
}

/// 转向方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SteerDirection {
    Left,
    Right,
}

impl SteerDirection {
    /// 该方向对应的转向电机
    #[inline]
    pub fn actuator(self) -> ActuatorId {
        match self {
            SteerDirection::Left => ActuatorId::SteerLeft,
            SteerDirection::Right => ActuatorId::SteerRight,
        }
    }

    /// 相反方向
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            SteerDirection::Left => SteerDirection::Right,
            SteerDirection::Right => SteerDirection::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_repr() {
        for (i, id) in ActuatorId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(ActuatorId::try_from(i as u8).unwrap(), *id);
        }
        assert!(ActuatorId::try_from(5u8).is_err());
    }

    #[test]
    fn test_momentary_set() {
        let momentary: Vec<_> = ActuatorId::ALL
            .iter()
            .copied()
            .filter(|id| id.is_momentary())
            .collect();
        assert_eq!(momentary, vec![ActuatorId::SteerRight, ActuatorId::SteerLeft]);
    }

    #[test]
    fn test_steer_direction_mapping() {
        assert_eq!(SteerDirection::Right.actuator(), ActuatorId::SteerRight);
        assert_eq!(SteerDirection::Left.actuator(), ActuatorId::SteerLeft);
        assert_eq!(SteerDirection::Right.opposite(), SteerDirection::Left);
    }
}
