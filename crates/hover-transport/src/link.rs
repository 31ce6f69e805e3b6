//! 主机侧网络链路
//!
//! 在主机（Linux/macOS）上没有 WiFi STA 接口可控，链路"已关联"
//! 等价于 broker 地址可解析。

use crate::{NetworkLink, TransportError};
use std::net::ToSocketAddrs;
use tracing::debug;

/// 以地址解析作为关联判据的链路
#[derive(Debug, Clone)]
pub struct HostLink {
    host: String,
    port: u16,
}

impl HostLink {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl NetworkLink for HostLink {
    fn begin(&mut self) -> Result<(), TransportError> {
        debug!("Host link: checking {}:{}", self.host, self.port);
        Ok(())
    }

    fn is_associated(&mut self) -> bool {
        match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(mut addrs) => addrs.next().is_some(),
            Err(e) => {
                debug!("Host link: cannot resolve {}: {}", self.host, e);
                false
            },
        }
    }
}
