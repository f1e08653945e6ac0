use crate::area::Area;
use chrono::{DateTime, Utc};
use pasture_protocol::{Position, RoutingMetrics};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fmt,
    net::IpAddr,
    time::{Duration, Instant},
};

/// Identity of a node, the last two bytes of its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub(crate) struct NodeId(pub(crate) u16);

impl NodeId {
    pub(crate) fn from_address(address: &IpAddr) -> Self {
        match address {
            IpAddr::V4(address) => {
                let octets = address.octets();
                Self(u16::from_be_bytes([octets[2], octets[3]]))
            }
            IpAddr::V6(address) => {
                let octets = address.octets();
                Self(u16::from_be_bytes([octets[14], octets[15]]))
            }
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Observation {
    pub(crate) seqno: u8,
    pub(crate) position: Position,
    pub(crate) routing: RoutingMetrics,
    pub(crate) clock: u16,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NodeStatus {
    pub(crate) first_seen: DateTime<Utc>,
    pub(crate) last_seen: DateTime<Utc>,
    #[serde(skip)]
    last_update: Instant,
    pub(crate) total_updates: u64,
    pub(crate) active: bool,
    pub(crate) inside_area: bool,
    pub(crate) last: Observation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UpdateOutcome {
    pub(crate) new_node: bool,
    pub(crate) reactivated: bool,
    pub(crate) inside_area: bool,
}

pub(crate) struct Registry {
    nodes: BTreeMap<NodeId, NodeStatus>,
    area: Area,
    inactive_timeout: Duration,
}

impl Registry {
    pub(crate) fn new(area: Area, inactive_timeout: Duration) -> Self {
        Self {
            nodes: BTreeMap::new(),
            area,
            inactive_timeout,
        }
    }

    pub(crate) fn update(
        &mut self,
        id: NodeId,
        observation: Observation,
        now: Instant,
        wall_time: DateTime<Utc>,
    ) -> UpdateOutcome {
        let inside_area = self.area.contains(&observation.position);

        match self.nodes.get_mut(&id) {
            Some(node) => {
                let reactivated = !node.active;

                node.last_seen = wall_time;
                node.last_update = now;
                node.total_updates = node.total_updates.saturating_add(1);
                node.active = true;
                node.inside_area = inside_area;
                node.last = observation;

                UpdateOutcome {
                    new_node: false,
                    reactivated,
                    inside_area,
                }
            }
            None => {
                self.nodes.insert(
                    id,
                    NodeStatus {
                        first_seen: wall_time,
                        last_seen: wall_time,
                        last_update: now,
                        total_updates: 1,
                        active: true,
                        inside_area,
                        last: observation,
                    },
                );

                UpdateOutcome {
                    new_node: true,
                    reactivated: false,
                    inside_area,
                }
            }
        }
    }

    /// Marks nodes that have not reported within the timeout as inactive.
    ///
    /// Returns only the nodes that became inactive during this sweep.
    pub(crate) fn sweep(&mut self, now: Instant) -> Vec<NodeId> {
        let mut newly_inactive = Vec::new();

        for (id, node) in self.nodes.iter_mut() {
            if node.active && now.saturating_duration_since(node.last_update) > self.inactive_timeout
            {
                node.active = false;
                newly_inactive.push(*id);
            }
        }

        newly_inactive
    }

    pub(crate) fn get(&self, id: &NodeId) -> Option<&NodeStatus> {
        self.nodes.get(id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&NodeId, &NodeStatus)> {
        self.nodes.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}
