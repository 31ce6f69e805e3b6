//! 启动序列集成测试
//!
//! 关联 → 稳定等待 → 连接 broker（按重试策略）→ 订阅。

use hover_driver::*;
use hover_tools::{ControllerConfig, RetryPolicy};
use hover_transport::{ChannelTransport, NetworkLink, TransportError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

static RUNNING: AtomicBool = AtomicBool::new(true);

/// 始终处于（或从不处于）关联状态的链路
struct FixedLink(bool);

impl NetworkLink for FixedLink {
    fn begin(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn is_associated(&mut self) -> bool {
        self.0
    }
}

fn fast_config() -> ControllerConfig {
    let mut config = ControllerConfig::default();
    config.network.max_attempts = 3;
    config.network.retry_delay_ms = 0;
    config.broker.settle_delay_ms = 0;
    config.broker.retry = RetryPolicy::forever(Duration::ZERO);
    config.control.tick_interval_ms = 1;
    config
}

#[test]
fn test_start_connects_and_subscribes() {
    let (transport, mut handle) = ChannelTransport::pair();
    handle.fail_next_connect(TransportError::Refused("server unavailable".into()));

    let mut control = ControllerBuilder::new()
        .config(fast_config())
        .build(transport, ManualClock::new())
        .unwrap();
    control.start(&mut FixedLink(true), &RUNNING).unwrap();

    assert!(control.transport().is_connected());
    assert_eq!(
        handle.subscriptions(),
        &["ligar", "controle/motores", "intervalo"]
    );
}

#[test]
fn test_start_fails_without_network() {
    let (transport, handle) = ChannelTransport::pair();
    let mut control = ControllerBuilder::new()
        .config(fast_config())
        .build(transport, ManualClock::new())
        .unwrap();

    let err = control.start(&mut FixedLink(false), &RUNNING).unwrap_err();
    assert!(matches!(err, DriverError::AssociationFailed { attempts: 3 }));
    assert!(!control.transport().is_connected());
    drop(handle);
}

#[test]
fn test_start_fail_fast_policy() {
    let mut config = fast_config();
    config.broker.retry = RetryPolicy::fail_fast();

    let (transport, handle) = ChannelTransport::pair();
    handle.fail_next_connect(TransportError::Timeout);
    let mut control = ControllerBuilder::new()
        .config(config)
        .build(transport, ManualClock::new())
        .unwrap();

    let err = control.start(&mut FixedLink(true), &RUNNING).unwrap_err();
    assert!(matches!(err, DriverError::BrokerUnavailable { attempts: 1, .. }));
}

#[test]
fn test_start_resets_actuators() {
    let (transport, _handle) = ChannelTransport::pair();
    let mut control = ControllerBuilder::new()
        .config(fast_config())
        .build(transport, ManualClock::new())
        .unwrap();
    control
        .dispatcher_mut()
        .bank_mut()
        .set(ActuatorId::SteerLeft, 800)
        .unwrap();

    control.start(&mut FixedLink(true), &RUNNING).unwrap();
    assert_eq!(control.duty(ActuatorId::SteerLeft), 0);
}

#[test]
fn test_run_until_stopped_then_shutdown() {
    let (transport, handle) = ChannelTransport::pair();
    let mut control = ControllerBuilder::new()
        .config(fast_config())
        .build(transport, MonotonicClock::new())
        .unwrap();
    control.start(&mut FixedLink(true), &RUNNING).unwrap();

    let running = Arc::new(AtomicBool::new(true));
    let stopper = Arc::clone(&running);
    handle.send("ligar", "on");

    let worker = thread::spawn(move || {
        let result = control.run(&running);
        (control, result)
    });

    thread::sleep(Duration::from_millis(50));
    stopper.store(false, Ordering::Release);
    let (mut control, result) = worker.join().unwrap();
    result.unwrap();

    assert_eq!(control.duty(ActuatorId::Lift1), 1023);
    control.shutdown().unwrap();
    assert_eq!(control.duty(ActuatorId::Lift1), 0);
    assert!(!control.transport().is_connected());
    assert_eq!(control.metrics().snapshot().commands_applied, 1);
}

#[test]
fn test_stop_during_broker_retry() {
    let mut config = fast_config();
    config.broker.retry = RetryPolicy::forever(Duration::from_millis(10));

    let (transport, mut handle) = ChannelTransport::pair();
    for _ in 0..200 {
        handle.fail_next_connect(TransportError::Refused("server unavailable".into()));
    }
    let mut control = ControllerBuilder::new()
        .config(config)
        .build(transport, ManualClock::new())
        .unwrap();

    let running = Arc::new(AtomicBool::new(true));
    let stopper = Arc::clone(&running);
    let started = Instant::now();
    let worker = thread::spawn(move || {
        let result = control.start(&mut FixedLink(true), &running);
        (control, result)
    });

    thread::sleep(Duration::from_millis(20));
    stopper.store(false, Ordering::Release);
    let (control, result) = worker.join().unwrap();

    assert!(matches!(result, Err(DriverError::Interrupted)));
    // 200 次 × 10ms 的重试队列远未耗尽
    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(!control.transport().is_connected());
    assert!(handle.subscriptions().is_empty());
}

#[test]
fn test_stop_during_association_wait() {
    let mut config = fast_config();
    config.network.max_attempts = 20;
    config.network.retry_delay_ms = 500;

    let (transport, _handle) = ChannelTransport::pair();
    let mut control = ControllerBuilder::new()
        .config(config)
        .build(transport, ManualClock::new())
        .unwrap();

    let running = Arc::new(AtomicBool::new(true));
    let stopper = Arc::clone(&running);
    let started = Instant::now();
    let worker = thread::spawn(move || control.start(&mut FixedLink(false), &running));

    thread::sleep(Duration::from_millis(20));
    stopper.store(false, Ordering::Release);
    let result = worker.join().unwrap();

    assert!(matches!(result, Err(DriverError::Interrupted)));
    assert!(started.elapsed() < Duration::from_millis(500));
}
