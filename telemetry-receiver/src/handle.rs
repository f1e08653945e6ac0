use crate::registry::{NodeId, NodeStatus, Observation, Registry, UpdateOutcome};
use chrono::{DateTime, Utc};
use pasture_protocol::{record::SEQNO_NEVER_SENT, CollectViewMessage, TelemetryRecord};
use serde::Serialize;
use std::{net::SocketAddr, time::Instant};

/// One JSON output line.
#[derive(Serialize)]
pub(crate) struct Report<'a> {
    pub(crate) node: NodeId,
    pub(crate) status: &'a NodeStatus,
}

impl Report<'_> {
    pub(crate) fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Received {
    pub(crate) node: NodeId,
    /// The record carried the sequence number a node never sends.
    pub(crate) reserved_seqno: bool,
    pub(crate) outcome: UpdateOutcome,
}

/// Decodes a datagram and records it against the sending node.
///
/// Datagrams that fail to decode leave the registry untouched.
pub(crate) fn receive(
    registry: &mut Registry,
    datagram: &[u8],
    from: SocketAddr,
    now: Instant,
    wall_time: DateTime<Utc>,
) -> Result<Received, pasture_protocol::Error> {
    let record = TelemetryRecord::decode::<CollectViewMessage>(datagram)?;

    let node = NodeId::from_address(&from.ip());

    let reserved_seqno = record.seqno == SEQNO_NEVER_SENT;

    let observation = Observation {
        seqno: record.seqno,
        position: record.position,
        routing: record.blob.routing,
        clock: record.blob.clock,
    };

    let outcome = registry.update(node, observation, now, wall_time);

    Ok(Received {
        node,
        reserved_seqno,
        outcome,
    })
}
