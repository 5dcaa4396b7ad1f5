use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

/// One concrete address and port to probe.
///
/// The location code is a shared handle onto the originating range's code,
/// kept for lookup only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub addr: Ipv4Addr,
    pub port: u16,
    pub code: Option<Arc<str>>,
}

impl Candidate {
    pub fn new(addr: Ipv4Addr, port: u16) -> Self {
        Self {
            addr,
            port,
            code: None,
        }
    }

    pub fn with_code(mut self, code: Option<Arc<str>>) -> Self {
        self.code = code;
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(self.addr), self.port)
    }
}
