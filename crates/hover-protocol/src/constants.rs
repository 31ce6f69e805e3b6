//! 协议常量定义

use std::time::Duration;

/// 占空比最大值（10 位 PWM 分辨率）
pub const MAX_DUTY: u16 = 1023;

/// 功率上限允许的最小值
pub const MIN_POWER: u16 = 10;

/// 转向（瞬时）执行器的自动释放超时
///
/// 最后一次激活后超过该时长未续期，执行器自动归零。
pub const STEER_TIMEOUT: Duration = Duration::from_secs(5);

/// 控制循环每个 tick 之间的休眠间隔
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// 电源开关主题（载荷 `on` / `off`）
pub const TOPIC_POWER: &str = "ligar";

/// 转向主题（载荷 `virar_direita` / `virar_esquerda`）
pub const TOPIC_STEERING: &str = "controle/motores";

/// 功率上限主题（载荷为十进制整数）
pub const TOPIC_POWER_LIMIT: &str = "intervalo";

/// 对外状态发布的主题前缀
pub const STATUS_PREFIX: &str = "status/";

/// 电源开关状态事件名（完整主题为 `status/motores`）
pub const STATUS_POWER: &str = "motores";

/// 电源开启时发布的状态值
pub const STATUS_ON: &str = "ligado";

/// 电源关闭时发布的状态值
pub const STATUS_OFF: &str = "desligado";

// 载荷字面量
pub(crate) const TOKEN_ON: &[u8] = b"on";
pub(crate) const TOKEN_OFF: &[u8] = b"off";
pub(crate) const TOKEN_TURN_RIGHT: &[u8] = b"virar_direita";
pub(crate) const TOKEN_TURN_LEFT: &[u8] = b"virar_esquerda";

/// 检查功率上限是否在 `[MIN_POWER, MAX_DUTY]` 内
#[inline]
pub fn power_limit_in_range(value: i64) -> bool {
    (MIN_POWER as i64..=MAX_DUTY as i64).contains(&value)
}
