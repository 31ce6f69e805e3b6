//! 状态发布
//!
//! 分发器在状态变更后同步调用 [`StatusPublisher`]。每次开关命令都发布，
//! 不与上一次发布的值去重。发布失败由调用方记录日志，不中断控制循环。

use hover_protocol::StatusEvent;
use hover_transport::{Transport, TransportError};
use tracing::debug;

/// 状态发布接口
pub trait StatusPublisher {
    fn publish(&mut self, event: &StatusEvent) -> Result<(), TransportError>;
}

/// 通过传输层发布到 `<prefix><name>`
pub struct TransportPublisher<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    prefix: &'a str,
}

impl<'a, T: Transport + ?Sized> TransportPublisher<'a, T> {
    pub fn new(transport: &'a mut T, prefix: &'a str) -> Self {
        Self { transport, prefix }
    }
}

impl<T: Transport + ?Sized> StatusPublisher for TransportPublisher<'_, T> {
    fn publish(&mut self, event: &StatusEvent) -> Result<(), TransportError> {
        let topic = event.topic(self.prefix);
        debug!("Publishing {} = {}", topic, event.value);
        self.transport.publish(&topic, event.value.as_bytes())
    }
}

/// 收集到内存（测试、离线回放）
impl StatusPublisher for Vec<StatusEvent> {
    fn publish(&mut self, event: &StatusEvent) -> Result<(), TransportError> {
        self.push(event.clone());
        Ok(())
    }
}

/// 丢弃所有事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

impl StatusPublisher for NullPublisher {
    fn publish(&mut self, _event: &StatusEvent) -> Result<(), TransportError> {
        Ok(())
    }
}
