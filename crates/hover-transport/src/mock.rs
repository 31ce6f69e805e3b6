//! 内存传输（Mock 模式）
//!
//! 基于 crossbeam channel 的 [`Transport`] 实现，无需 broker。
//! [`ChannelHandle`] 扮演远程操作者：投递入站消息、读取已发布消息、注入故障。
//!
//! 与真实 broker 不同，内存传输不按订阅过滤，所有投递的消息原样送达，
//! 便于测试未知主题的处理路径。

use crate::{InboundMessage, Transport, TransportError};
use bytes::Bytes;
use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};

/// 已发布的出站消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub payload: Bytes,
}

/// 内存传输
pub struct ChannelTransport {
    inbox: Receiver<InboundMessage>,
    outbox: Sender<OutboundMessage>,
    subscribed: Sender<String>,
    connect_faults: Receiver<TransportError>,
    receive_faults: Receiver<TransportError>,
    publish_faults: Receiver<TransportError>,
    connected: bool,
}

/// 操作者一侧的句柄
pub struct ChannelHandle {
    inbox: Sender<InboundMessage>,
    outbox: Receiver<OutboundMessage>,
    subscribed: Receiver<String>,
    connect_faults: Sender<TransportError>,
    receive_faults: Sender<TransportError>,
    publish_faults: Sender<TransportError>,
    subscriptions: Vec<String>,
}

impl ChannelTransport {
    /// 创建一对相连的传输与句柄
    pub fn pair() -> (ChannelTransport, ChannelHandle) {
        let (inbox_tx, inbox_rx) = unbounded();
        let (outbox_tx, outbox_rx) = unbounded();
        let (sub_tx, sub_rx) = unbounded();
        let (connect_tx, connect_rx) = unbounded();
        let (receive_tx, receive_rx) = unbounded();
        let (publish_tx, publish_rx) = unbounded();

        let transport = ChannelTransport {
            inbox: inbox_rx,
            outbox: outbox_tx,
            subscribed: sub_tx,
            connect_faults: connect_rx,
            receive_faults: receive_rx,
            publish_faults: publish_rx,
            connected: false,
        };
        let handle = ChannelHandle {
            inbox: inbox_tx,
            outbox: outbox_rx,
            subscribed: sub_rx,
            connect_faults: connect_tx,
            receive_faults: receive_tx,
            publish_faults: publish_tx,
            subscriptions: Vec::new(),
        };
        (transport, handle)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

impl Transport for ChannelTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        if let Ok(err) = self.connect_faults.try_recv() {
            return Err(err);
        }
        self.connected = true;
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        // 句柄已释放时订阅记录无人关心，忽略发送失败
        let _ = self.subscribed.send(topic.to_string());
        Ok(())
    }

    fn try_receive(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        if let Ok(err) = self.receive_faults.try_recv() {
            return Err(err);
        }
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        match self.inbox.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Disconnected),
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        if let Ok(err) = self.publish_faults.try_recv() {
            return Err(err);
        }
        self.outbox
            .send(OutboundMessage {
                topic: topic.to_string(),
                payload: Bytes::copy_from_slice(payload),
            })
            .map_err(|_| TransportError::Disconnected)
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        self.connected = false;
        Ok(())
    }
}

impl ChannelHandle {
    /// 投递一条入站消息
    pub fn send(&self, topic: impl AsRef<[u8]>, payload: impl AsRef<[u8]>) {
        let _ = self.inbox.send(InboundMessage::new(
            Bytes::copy_from_slice(topic.as_ref()),
            Bytes::copy_from_slice(payload.as_ref()),
        ));
    }

    /// 取出目前为止发布的全部消息
    pub fn published(&self) -> Vec<OutboundMessage> {
        self.outbox.try_iter().collect()
    }

    /// 目前为止订阅过的主题
    pub fn subscriptions(&mut self) -> &[String] {
        self.subscriptions.extend(self.subscribed.try_iter());
        &self.subscriptions
    }

    /// 下一次 `connect()` 返回该错误（可多次调用排队）
    pub fn fail_next_connect(&self, err: TransportError) {
        let _ = self.connect_faults.send(err);
    }

    /// 下一次 `try_receive()` 返回该错误
    pub fn fail_next_receive(&self, err: TransportError) {
        let _ = self.receive_faults.send(err);
    }

    /// 下一次 `publish()` 返回该错误
    pub fn fail_next_publish(&self, err: TransportError) {
        let _ = self.publish_faults.send(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receive_requires_connection() {
        let (mut transport, handle) = ChannelTransport::pair();
        handle.send("ligar", "on");
        assert!(matches!(
            transport.try_receive(),
            Err(TransportError::NotConnected)
        ));

        transport.connect().unwrap();
        let msg = transport.try_receive().unwrap().unwrap();
        assert_eq!(&msg.topic[..], b"ligar");
        assert_eq!(&msg.payload[..], b"on");
        assert!(transport.try_receive().unwrap().is_none());
    }

    #[test]
    fn test_publish_and_subscriptions() {
        let (mut transport, mut handle) = ChannelTransport::pair();
        assert!(transport.publish("status/motores", b"ligado").is_err());

        transport.connect().unwrap();
        transport.subscribe("ligar").unwrap();
        transport.publish("status/motores", b"ligado").unwrap();

        assert_eq!(handle.subscriptions(), &["ligar".to_string()]);
        let published = handle.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "status/motores");
        assert_eq!(&published[0].payload[..], b"ligado");
    }

    #[test]
    fn test_fault_injection() {
        let (mut transport, handle) = ChannelTransport::pair();
        handle.fail_next_connect(TransportError::Refused("busy".into()));
        assert!(transport.connect().is_err());
        assert!(transport.connect().is_ok());

        handle.fail_next_publish(TransportError::Client("full".into()));
        assert!(transport.publish("a", b"b").is_err());
        assert!(transport.publish("a", b"b").is_ok());

        handle.fail_next_receive(TransportError::Timeout);
        assert!(matches!(
            transport.try_receive(),
            Err(TransportError::Timeout)
        ));
        assert!(transport.try_receive().unwrap().is_none());
    }

    #[test]
    fn test_dropped_handle_disconnects() {
        let (mut transport, handle) = ChannelTransport::pair();
        transport.connect().unwrap();
        drop(handle);
        assert!(matches!(
            transport.try_receive(),
            Err(TransportError::Disconnected)
        ));
    }
}
