//! Latency probing
//!
//! A probe is one ICMP echo request to a relay's IPv4 address. Its result
//! falls into one of two tiers:
//! - `Ok(ProbeOutcome)`: the relay answered, or stayed silent until the
//!   timeout. A silent relay is skipped and the run goes on.
//! - `Err(AppError)`: the transport itself failed (socket creation, send
//!   errors). The run stops.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use rand::random;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use surge_ping::{Client, Config as PingConfig, PingIdentifier, PingSequence, SurgeError};

/// Echo payload length, matching the default of the common `ping` tools
const PAYLOAD_SIZE: usize = 56;

/// Result of a single probe that did not hit a transport error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Echo reply received after the given round-trip time
    Reply(Duration),
    /// No reply within the timeout
    NoReply,
}

/// Something that can measure round-trip time to an address
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, address: Ipv4Addr, timeout: Duration) -> Result<ProbeOutcome>;
}

/// Builds the prober once the run knows it has relays to probe
pub type ProberFactory = Box<dyn Fn() -> Result<Box<dyn Prober>> + Send + Sync>;

/// Factory for the real ICMP prober
pub fn icmp_prober_factory() -> ProberFactory {
    Box::new(|| Ok(Box::new(IcmpProber::new()?) as Box<dyn Prober>))
}

/// ICMP echo prober backed by `surge-ping`
pub struct IcmpProber {
    client: Client,
    payload: [u8; PAYLOAD_SIZE],
}

impl IcmpProber {
    /// Open the ICMP socket
    ///
    /// Must be called from within a Tokio runtime. Fails when the process
    /// may not open ICMP sockets.
    pub fn new() -> Result<Self> {
        let client = Client::new(&PingConfig::default()).map_err(|e| {
            AppError::probe(format!("Failed to open ICMP socket: {}", e))
        })?;

        Ok(Self {
            client,
            payload: [0; PAYLOAD_SIZE],
        })
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, address: Ipv4Addr, timeout: Duration) -> Result<ProbeOutcome> {
        let mut pinger = self
            .client
            .pinger(IpAddr::V4(address), PingIdentifier(random()))
            .await;
        pinger.timeout(timeout);

        let reply = pinger
            .ping(PingSequence(0), &self.payload)
            .await
            .map(|(_packet, rtt)| rtt);
        classify(reply)
    }
}

/// Split a ping result into the skippable and fatal tiers
pub fn classify(reply: std::result::Result<Duration, SurgeError>) -> Result<ProbeOutcome> {
    match reply {
        Ok(rtt) => Ok(ProbeOutcome::Reply(rtt)),
        Err(SurgeError::Timeout { .. }) => Ok(ProbeOutcome::NoReply),
        Err(e) => Err(e.into()),
    }
}
