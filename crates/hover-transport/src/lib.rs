//! # Hover Transport Layer
//!
//! 发布/订阅传输抽象层，提供统一的传输接口与网络关联接口。
//!
//! - [`Transport`]: 连接、订阅、轮询、发布、断开
//! - [`NetworkLink`]: 链路层关联（WiFi 等），由调用方负责有限次重试
//!
//! 后端：
//! - `mqtt` feature: [`mqtt::MqttTransport`]（rumqttc）
//! - `mock` feature: [`mock::ChannelTransport`]（内存 channel，测试用）

use bytes::Bytes;
use thiserror::Error;

pub mod link;

pub use link::HostLink;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::{ChannelHandle, ChannelTransport, OutboundMessage};

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttSettings, MqttTransport};

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not connected")]
    NotConnected,
    #[error("Connection refused by broker: {0}")]
    Refused(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Client request rejected: {0}")]
    Client(String),
    #[error("Receive timeout")]
    Timeout,
    #[error("Transport disconnected")]
    Disconnected,
}

impl TransportError {
    /// 是否为致命错误
    ///
    /// 稳态轮询期间遇到致命错误时，控制循环断开连接并退出；
    /// 非致命错误（超时、请求队列满）只记录日志。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TransportError::Io(_)
                | TransportError::NotConnected
                | TransportError::Refused(_)
                | TransportError::Connection(_)
                | TransportError::Disconnected
        )
    }
}

/// 入站消息（主题、载荷均为不透明字节串）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: Bytes,
    pub payload: Bytes,
}

impl InboundMessage {
    pub fn new(topic: impl Into<Bytes>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// 发布/订阅传输
pub trait Transport {
    /// 与 broker 建立会话（单次尝试，重试策略由调用方决定）
    fn connect(&mut self) -> Result<(), TransportError>;

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// 轮询至多一条入站消息
    ///
    /// 非阻塞或短超时；没有消息时返回 `Ok(None)`。
    fn try_receive(&mut self) -> Result<Option<InboundMessage>, TransportError>;

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError>;

    fn disconnect(&mut self) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self) -> Result<(), TransportError> {
        (**self).connect()
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        (**self).subscribe(topic)
    }

    fn try_receive(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        (**self).try_receive()
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        (**self).publish(topic, payload)
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        (**self).disconnect()
    }
}

/// 网络链路关联（WiFi STA 等）
///
/// 对应"先发起关联，再轮询是否已关联"的两步流程。
pub trait NetworkLink {
    /// 发起关联（不等待完成）
    fn begin(&mut self) -> Result<(), TransportError>;

    /// 链路是否已可用
    fn is_associated(&mut self) -> bool;
}

impl<L: NetworkLink + ?Sized> NetworkLink for Box<L> {
    fn begin(&mut self) -> Result<(), TransportError> {
        (**self).begin()
    }

    fn is_associated(&mut self) -> bool {
        (**self).is_associated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(TransportError::Disconnected.is_fatal());
        assert!(TransportError::NotConnected.is_fatal());
        assert!(TransportError::Connection("reset".into()).is_fatal());
        assert!(TransportError::Io(std::io::Error::other("x")).is_fatal());
        assert!(!TransportError::Timeout.is_fatal());
        assert!(!TransportError::Client("queue full".into()).is_fatal());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", TransportError::Timeout), "Receive timeout");
        let msg = format!("{}", TransportError::Refused("BadClientId".into()));
        assert!(msg.contains("BadClientId"), "{}", msg);
    }

    #[test]
    fn test_inbound_message_from_static() {
        let msg = InboundMessage::new(&b"ligar"[..], &b"on"[..]);
        assert_eq!(&msg.topic[..], b"ligar");
        assert_eq!(&msg.payload[..], b"on");
    }
}
