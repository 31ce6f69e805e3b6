//! MQTT 传输后端
//!
//! 基于 rumqttc 同步客户端。rumqttc 的事件循环只在轮询 `Connection`
//! 时推进，因此订阅、发布等请求会在下一次 `try_receive()` 时真正发出。
//!
//! 本后端不做自动重连：事件循环报错即视为连接断开，交由调用方处理。

use crate::{InboundMessage, Transport, TransportError};
use bytes::Bytes;
use rumqttc::{
    Client, ConnectReturnCode, Connection, ConnectionError, Event, MqttOptions, Outgoing, Packet,
    QoS, RecvTimeoutError,
};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// 断开时最多推进事件循环的次数（用于把 DISCONNECT 包发出去）
const DISCONNECT_DRAIN_POLLS: usize = 8;

/// MQTT 连接参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttSettings {
    /// broker 主机名或 IP
    pub host: String,
    /// broker 端口
    pub port: u16,
    /// 客户端标识
    pub client_id: String,
    /// 心跳间隔
    pub keep_alive: Duration,
    /// `try_receive()` 单次轮询的最长等待
    pub poll_timeout: Duration,
    /// 等待 CONNACK 的最长时间
    pub connect_timeout: Duration,
    /// 请求队列容量
    pub request_capacity: usize,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1883,
            client_id: "cliente_12321".to_string(),
            keep_alive: Duration::from_secs(60),
            poll_timeout: Duration::from_millis(10),
            connect_timeout: Duration::from_secs(5),
            request_capacity: 10,
        }
    }
}

/// 一次事件循环轮询的结果
type Polled = Result<Result<Event, ConnectionError>, RecvTimeoutError>;

/// 把轮询结果映射为入站消息
///
/// 只有入站 PUBLISH 产生消息；其余事件与轮询超时都是“本轮无消息”。
fn poll_outcome(polled: Polled) -> Result<Option<InboundMessage>, TransportError> {
    match polled {
        Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => Ok(Some(InboundMessage {
            topic: Bytes::from(publish.topic),
            payload: publish.payload,
        })),
        Ok(Ok(event)) => {
            trace!("MQTT event: {:?}", event);
            Ok(None)
        },
        Ok(Err(e)) => Err(TransportError::Connection(e.to_string())),
        Err(RecvTimeoutError::Timeout) => Ok(None),
        Err(RecvTimeoutError::Disconnected) => Err(TransportError::Disconnected),
    }
}

struct Session {
    client: Client,
    connection: Connection,
}

/// MQTT 传输
pub struct MqttTransport {
    settings: MqttSettings,
    session: Option<Session>,
}

impl MqttTransport {
    pub fn new(settings: MqttSettings) -> Self {
        Self {
            settings,
            session: None,
        }
    }

    pub fn settings(&self) -> &MqttSettings {
        &self.settings
    }

    fn session_mut(&mut self) -> Result<&mut Session, TransportError> {
        self.session.as_mut().ok_or(TransportError::NotConnected)
    }

    /// 处理一次轮询结果；致命错误时丢弃会话
    fn absorb(&mut self, polled: Polled) -> Result<Option<InboundMessage>, TransportError> {
        let outcome = poll_outcome(polled);
        if let Err(e) = &outcome
            && e.is_fatal()
        {
            warn!("MQTT session lost: {}", e);
            self.session = None;
        }
        outcome
    }

    fn client_error(e: rumqttc::ClientError) -> TransportError {
        TransportError::Client(e.to_string())
    }
}

impl Transport for MqttTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        // 丢弃旧会话，重新握手
        self.session = None;

        let mut options = MqttOptions::new(
            self.settings.client_id.clone(),
            self.settings.host.clone(),
            self.settings.port,
        );
        options.set_keep_alive(self.settings.keep_alive);

        let (client, mut connection) = Client::new(options, self.settings.request_capacity);
        let deadline = Instant::now() + self.settings.connect_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::Timeout);
            }

            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    if ack.code != ConnectReturnCode::Success {
                        return Err(TransportError::Refused(format!("{:?}", ack.code)));
                    }
                    info!(
                        "MQTT session established with {}:{} as {}",
                        self.settings.host, self.settings.port, self.settings.client_id
                    );
                    self.session = Some(Session { client, connection });
                    return Ok(());
                },
                Ok(Ok(event)) => {
                    trace!("MQTT event before CONNACK: {:?}", event);
                },
                Ok(Err(e)) => return Err(TransportError::Connection(e.to_string())),
                Err(RecvTimeoutError::Timeout) => return Err(TransportError::Timeout),
                Err(RecvTimeoutError::Disconnected) => return Err(TransportError::Disconnected),
            }
        }
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        let session = self.session_mut()?;
        session
            .client
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(Self::client_error)?;
        debug!("MQTT subscribe queued: {}", topic);
        Ok(())
    }

    fn try_receive(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        let poll_timeout = self.settings.poll_timeout;
        let polled = self.session_mut()?.connection.recv_timeout(poll_timeout);
        self.absorb(polled)
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportError> {
        let session = self.session_mut()?;
        session
            .client
            .try_publish(topic, QoS::AtMostOnce, false, payload.to_vec())
            .map_err(Self::client_error)
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        session.client.disconnect().map_err(Self::client_error)?;

        for _ in 0..DISCONNECT_DRAIN_POLLS {
            match session.connection.recv_timeout(self.settings.poll_timeout) {
                Ok(Ok(Event::Outgoing(Outgoing::Disconnect))) => {
                    debug!("MQTT DISCONNECT sent");
                    break;
                },
                Ok(Ok(_)) | Err(RecvTimeoutError::Timeout) => continue,
                Ok(Err(e)) => {
                    warn!("MQTT error while disconnecting: {}", e);
                    break;
                },
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_default_settings_match_source_constants() {
        let settings = MqttSettings::default();
        assert_eq!(settings.port, 1883);
        assert_eq!(settings.client_id, "cliente_12321");
        assert_eq!(settings.keep_alive, Duration::from_secs(60));
    }

    fn with_session() -> MqttTransport {
        // 事件循环只在轮询时联网，这里不会发起连接
        let options = MqttOptions::new("cliente_teste", "127.0.0.1", 1883);
        let (client, connection) = Client::new(options, 10);
        let mut transport = MqttTransport::new(MqttSettings::default());
        transport.session = Some(Session { client, connection });
        transport
    }

    #[test]
    fn test_incoming_publish_becomes_message() {
        let publish = rumqttc::Publish::new("controle/motores", QoS::AtMostOnce, "virar_direita");
        let message = poll_outcome(Ok(Ok(Event::Incoming(Packet::Publish(publish)))))
            .unwrap()
            .unwrap();
        assert_eq!(&message.topic[..], b"controle/motores");
        assert_eq!(&message.payload[..], b"virar_direita");
    }

    #[test]
    fn test_other_events_yield_nothing() {
        let events = [
            Event::Incoming(Packet::PingResp),
            Event::Outgoing(Outgoing::PingReq),
            Event::Outgoing(Outgoing::Subscribe(1)),
        ];
        for event in events {
            assert!(poll_outcome(Ok(Ok(event))).unwrap().is_none());
        }
        assert!(poll_outcome(Err(RecvTimeoutError::Timeout)).unwrap().is_none());
    }

    #[test]
    fn test_event_loop_errors_map_to_fatal() {
        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        let err = poll_outcome(Ok(Err(ConnectionError::Io(reset)))).unwrap_err();
        assert!(matches!(
            err,
            TransportError::Connection(ref msg) if msg.contains("reset by peer")
        ));
        assert!(err.is_fatal());

        let err = poll_outcome(Err(RecvTimeoutError::Disconnected)).unwrap_err();
        assert!(matches!(err, TransportError::Disconnected));
    }

    #[test]
    fn test_fatal_poll_drops_session() {
        let mut transport = with_session();
        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        assert!(transport.absorb(Ok(Err(ConnectionError::Io(reset)))).is_err());
        assert!(transport.session.is_none());
        assert!(matches!(
            transport.try_receive(),
            Err(TransportError::NotConnected)
        ));

        let mut transport = with_session();
        assert!(transport.absorb(Err(RecvTimeoutError::Disconnected)).is_err());
        assert!(transport.session.is_none());
    }

    #[test]
    fn test_quiet_poll_keeps_session() {
        let mut transport = with_session();
        assert!(transport.absorb(Err(RecvTimeoutError::Timeout)).unwrap().is_none());
        let publish = rumqttc::Publish::new("ligar", QoS::AtMostOnce, "on");
        let message = transport
            .absorb(Ok(Ok(Event::Incoming(Packet::Publish(publish)))))
            .unwrap();
        assert!(message.is_some());
        assert!(transport.session.is_some());
    }

    #[test]
    fn test_operations_before_connect() {
        let mut transport = MqttTransport::new(MqttSettings::default());
        assert!(matches!(
            transport.try_receive(),
            Err(TransportError::NotConnected)
        ));
        assert!(matches!(
            transport.publish("status/motores", b"ligado"),
            Err(TransportError::NotConnected)
        ));
        assert!(transport.subscribe("ligar").is_err());
        // 未连接时断开是空操作
        assert!(transport.disconnect().is_ok());
    }
}
