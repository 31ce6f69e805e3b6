//! 启动阶段的连接建立
//!
//! 网络关联按固定次数检查；broker 连接遵循 [`RetryPolicy`]。
//! 稳态轮询中的传输错误不在这里处理，见 [`ControlLoop`](crate::ControlLoop)。
//!
//! 所有等待都受 `running` 标志约束：标志被清除后，下一次尝试或等待之前
//! 返回 [`DriverError::Interrupted`]。

use crate::error::DriverError;
use hover_protocol::TopicTable;
use hover_tools::RetryPolicy;
use hover_transport::{NetworkLink, Transport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// 可中断等待的最大切片
const STOP_POLL_SLICE: Duration = Duration::from_millis(20);

fn ensure_running(running: &AtomicBool) -> Result<(), DriverError> {
    if running.load(Ordering::Acquire) {
        Ok(())
    } else {
        info!("Stop requested during startup");
        Err(DriverError::Interrupted)
    }
}

/// 等待 `delay`，期间 `running` 被清除则提前返回 `Interrupted`
pub fn sleep_while_running(delay: Duration, running: &AtomicBool) -> Result<(), DriverError> {
    let deadline = Instant::now() + delay;
    loop {
        ensure_running(running)?;
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(());
        }
        spin_sleep::sleep(remaining.min(STOP_POLL_SLICE));
    }
}

/// 等待网络关联
///
/// 最多检查 `max_attempts` 次，每次未关联后等待 `delay`，等待结束后再做最后一次检查。
/// 返回关联成功前等待的次数。
pub fn associate(
    link: &mut dyn NetworkLink,
    max_attempts: u32,
    delay: Duration,
    running: &AtomicBool,
) -> Result<u32, DriverError> {
    ensure_running(running)?;
    link.begin()?;

    let mut attempts = 0;
    while !link.is_associated() && attempts < max_attempts {
        info!("Waiting for network association {}/{}", attempts + 1, max_attempts);
        sleep_while_running(delay, running)?;
        attempts += 1;
    }

    if link.is_associated() {
        info!("Network associated");
        Ok(attempts)
    } else {
        error!("Network association failed after {} attempts", max_attempts);
        Err(DriverError::AssociationFailed {
            attempts: max_attempts,
        })
    }
}

/// 按重试策略连接 broker
///
/// 返回成功时的尝试序号（从 1 开始）。
pub fn connect_with_retry<T: Transport + ?Sized>(
    transport: &mut T,
    policy: &RetryPolicy,
    running: &AtomicBool,
) -> Result<u32, DriverError> {
    let mut attempt = 1;
    loop {
        ensure_running(running)?;
        info!("Connecting to broker (attempt {})", attempt);
        match transport.connect() {
            Ok(()) => {
                info!("Connected to broker");
                return Ok(attempt);
            },
            Err(e) => {
                warn!("Unable to connect to broker: {}", e);
                if !policy.allows(attempt + 1) {
                    error!("Giving up on broker after {} attempts ({:?})", attempt, policy.mode);
                    return Err(DriverError::BrokerUnavailable {
                        attempts: attempt,
                        reason: e.to_string(),
                    });
                }
                sleep_while_running(policy.delay(), running)?;
                attempt += 1;
            },
        }
    }
}

/// 订阅主题表中的全部主题
pub fn subscribe_all<T: Transport + ?Sized>(
    transport: &mut T,
    topics: &TopicTable,
) -> Result<(), DriverError> {
    for topic in topics.topics() {
        transport.subscribe(topic)?;
        info!("Subscribed to {}", topic);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hover_transport::{ChannelTransport, TransportError};
    use std::sync::Arc;
    use std::thread;

    static RUNNING: AtomicBool = AtomicBool::new(true);

    /// 第 `ready_after` 次检查起报告已关联
    struct ScriptedLink {
        checks: u32,
        ready_after: Option<u32>,
        began: bool,
    }

    impl ScriptedLink {
        fn new(ready_after: Option<u32>) -> Self {
            Self {
                checks: 0,
                ready_after,
                began: false,
            }
        }
    }

    impl NetworkLink for ScriptedLink {
        fn begin(&mut self) -> Result<(), TransportError> {
            self.began = true;
            Ok(())
        }

        fn is_associated(&mut self) -> bool {
            self.checks += 1;
            self.ready_after.is_some_and(|n| self.checks >= n)
        }
    }

    #[test]
    fn test_associate_immediately() {
        let mut link = ScriptedLink::new(Some(1));
        assert_eq!(associate(&mut link, 20, Duration::ZERO, &RUNNING).unwrap(), 0);
        assert!(link.began);
    }

    #[test]
    fn test_associate_after_waiting() {
        let mut link = ScriptedLink::new(Some(4));
        assert_eq!(associate(&mut link, 20, Duration::ZERO, &RUNNING).unwrap(), 3);
    }

    #[test]
    fn test_associate_last_check_after_final_wait() {
        // 3 次等待后的最后一次检查成功
        let mut link = ScriptedLink::new(Some(4));
        assert_eq!(associate(&mut link, 3, Duration::ZERO, &RUNNING).unwrap(), 3);
    }

    #[test]
    fn test_associate_gives_up() {
        let mut link = ScriptedLink::new(None);
        let err = associate(&mut link, 5, Duration::ZERO, &RUNNING).unwrap_err();
        assert!(matches!(err, DriverError::AssociationFailed { attempts: 5 }));
        assert_eq!(link.checks, 7);
    }

    #[test]
    fn test_connect_forever_eventually_succeeds() {
        let (mut transport, handle) = ChannelTransport::pair();
        for _ in 0..3 {
            handle.fail_next_connect(TransportError::Refused("busy".into()));
        }
        let policy = RetryPolicy::forever(Duration::ZERO);
        let attempts = connect_with_retry(&mut transport, &policy, &RUNNING);
        assert_eq!(attempts.unwrap(), 4);
        assert!(transport.is_connected());
    }

    #[test]
    fn test_connect_limited_gives_up() {
        let (mut transport, handle) = ChannelTransport::pair();
        for _ in 0..3 {
            handle.fail_next_connect(TransportError::Timeout);
        }
        let policy = RetryPolicy::limited(2, Duration::ZERO);
        let err = connect_with_retry(&mut transport, &policy, &RUNNING).unwrap_err();
        assert!(matches!(err, DriverError::BrokerUnavailable { attempts: 2, .. }));
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_connect_fail_fast() {
        let (mut transport, handle) = ChannelTransport::pair();
        handle.fail_next_connect(TransportError::Refused("not authorized".into()));
        let policy = RetryPolicy::fail_fast();
        let err = connect_with_retry(&mut transport, &policy, &RUNNING).unwrap_err();
        match err {
            DriverError::BrokerUnavailable { attempts, reason } => {
                assert_eq!(attempts, 1);
                assert!(reason.contains("not authorized"));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_stopped_before_start_does_nothing() {
        let stopped = AtomicBool::new(false);
        let mut link = ScriptedLink::new(Some(1));
        let err = associate(&mut link, 20, Duration::ZERO, &stopped).unwrap_err();
        assert!(matches!(err, DriverError::Interrupted));
        assert!(!link.began);

        let (mut transport, _handle) = ChannelTransport::pair();
        let err = connect_with_retry(&mut transport, &RetryPolicy::fail_fast(), &stopped)
            .unwrap_err();
        assert!(matches!(err, DriverError::Interrupted));
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_association_wait_interrupted() {
        let running = Arc::new(AtomicBool::new(true));
        let stopper = Arc::clone(&running);
        let waiter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            stopper.store(false, Ordering::Release);
        });

        let started = Instant::now();
        let mut link = ScriptedLink::new(None);
        let err = associate(&mut link, 20, Duration::from_secs(2), &running).unwrap_err();
        waiter.join().unwrap();

        assert!(matches!(err, DriverError::Interrupted));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_sleep_while_running_completes() {
        let started = Instant::now();
        sleep_while_running(Duration::from_millis(30), &RUNNING).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_subscribe_all_in_table_order() {
        let (mut transport, mut handle) = ChannelTransport::pair();
        transport.connect().unwrap();
        subscribe_all(&mut transport, &TopicTable::standard()).unwrap();
        assert_eq!(
            handle.subscriptions(),
            &["ligar", "controle/motores", "intervalo"]
        );
    }

    #[test]
    fn test_subscribe_requires_connection() {
        let (mut transport, _handle) = ChannelTransport::pair();
        let err = subscribe_all(&mut transport, &TopicTable::standard()).unwrap_err();
        assert!(matches!(err, DriverError::Transport(TransportError::NotConnected)));
    }
}
