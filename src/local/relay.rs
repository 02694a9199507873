//! Local relay backends.
//!
//! `LocalRelayServer` reserves the configured ICE ports by binding them and
//! releases them on stop; media handling is not part of this crate.
//! `LocalDelegate` validates and records the external endpoint.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::{mpsc, Mutex};
use url::Url;

use crate::host::{ClusterEvent, SignalMessage};
use crate::relay::{RelayDelegate, RelayError, RelayFactory, RelayServer, RelayServerConfig};

const OUTBOUND_BUFFER: usize = 1024;

/// Builds [`LocalRelayServer`]s and [`LocalDelegate`]s.
#[derive(Debug, Clone, Default)]
pub struct LocalRelayFactory;

#[async_trait]
impl RelayFactory for LocalRelayFactory {
    fn new_server(&self, config: &RelayServerConfig) -> Result<Arc<dyn RelayServer>, RelayError> {
        Ok(Arc::new(LocalRelayServer::new(config.clone())?))
    }

    async fn new_delegate(&self, endpoint: &str) -> Result<Arc<dyn RelayDelegate>, RelayError> {
        Ok(Arc::new(LocalDelegate::new(endpoint)?))
    }
}

struct Bound {
    udp: UdpSocket,
    tcp: TcpListener,
}

pub struct LocalRelayServer {
    udp_addr: SocketAddr,
    tcp_addr: SocketAddr,
    bound: Mutex<Option<Bound>>,
    outbound_tx: mpsc::Sender<SignalMessage>,
    outbound_rx: StdMutex<Option<mpsc::Receiver<SignalMessage>>>,
}

impl LocalRelayServer {
    pub fn new(config: RelayServerConfig) -> Result<Self, RelayError> {
        let udp_addr = listen_addr(&config.udp_address, config.udp_port, config.enable_ipv6)?;
        let tcp_addr = listen_addr(&config.tcp_address, config.tcp_port, config.enable_ipv6)?;
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);

        Ok(Self {
            udp_addr,
            tcp_addr,
            bound: Mutex::new(None),
            outbound_tx,
            outbound_rx: StdMutex::new(Some(outbound_rx)),
        })
    }

    /// Queue a signaling message for the writer.
    pub async fn send_signal(&self, message: SignalMessage) -> Result<(), RelayError> {
        self.outbound_tx
            .send(message)
            .await
            .map_err(|_| RelayError::Event("outbound channel closed".into()))
    }

    /// Bound addresses while running.
    pub async fn local_addrs(&self) -> Option<(SocketAddr, SocketAddr)> {
        let bound = self.bound.lock().await;
        let bound = bound.as_ref()?;
        Some((bound.udp.local_addr().ok()?, bound.tcp.local_addr().ok()?))
    }
}

fn listen_addr(address: &str, port: u16, ipv6: bool) -> Result<SocketAddr, RelayError> {
    let ip: IpAddr = if address.is_empty() {
        if ipv6 {
            Ipv6Addr::UNSPECIFIED.into()
        } else {
            Ipv4Addr::UNSPECIFIED.into()
        }
    } else {
        address
            .parse()
            .map_err(|e| RelayError::Create(format!("invalid listen address {address}: {e}")))?
    };
    Ok(SocketAddr::new(ip, port))
}

#[async_trait]
impl RelayServer for LocalRelayServer {
    async fn start(&self) -> Result<(), RelayError> {
        let mut bound = self.bound.lock().await;
        if bound.is_some() {
            return Err(RelayError::Start("already started".into()));
        }

        let udp = UdpSocket::bind(self.udp_addr)
            .await
            .map_err(|e| RelayError::Start(format!("udp {}: {e}", self.udp_addr)))?;
        let tcp = TcpListener::bind(self.tcp_addr)
            .await
            .map_err(|e| RelayError::Start(format!("tcp {}: {e}", self.tcp_addr)))?;

        tracing::info!(udp = %self.udp_addr, tcp = %self.tcp_addr, "Relay listening");
        *bound = Some(Bound { udp, tcp });
        Ok(())
    }

    async fn stop(&self) -> Result<(), RelayError> {
        match self.bound.lock().await.take() {
            Some(_) => Ok(()),
            None => Err(RelayError::Stop("not running".into())),
        }
    }

    fn take_outbound(&self) -> Option<mpsc::Receiver<SignalMessage>> {
        self.outbound_rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    async fn handle_cluster_event(&self, event: ClusterEvent) -> Result<(), RelayError> {
        tracing::trace!(kind = %event.kind, sender = %event.sender_id, "Relay received cluster event");
        Ok(())
    }
}

pub struct LocalDelegate {
    endpoint: String,
    closed: AtomicBool,
}

impl LocalDelegate {
    pub fn new(endpoint: &str) -> Result<Self, RelayError> {
        Url::parse(endpoint).map_err(|e| RelayError::Delegate(format!("invalid endpoint {endpoint}: {e}")))?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            closed: AtomicBool::new(false),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RelayDelegate for LocalDelegate {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn handle_cluster_event(&self, event: ClusterEvent) -> Result<(), RelayError> {
        if self.is_closed() {
            return Err(RelayError::Event("delegate closed".into()));
        }
        tracing::trace!(kind = %event.kind, endpoint = %self.endpoint, "Forwarding cluster event to rtcd");
        Ok(())
    }

    async fn close(&self) -> Result<(), RelayError> {
        if self.closed.swap(true, Ordering::Relaxed) {
            return Err(RelayError::Close("already closed".into()));
        }
        Ok(())
    }
}
