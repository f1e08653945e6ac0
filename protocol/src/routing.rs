use serde::{Deserialize, Serialize};

/// Two byte link layer identity of a mesh neighbour.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub [u8; 2]);

impl LinkId {
    pub const NULL: Self = Self([0, 0]);
}

/// Snapshot of routing layer health, taken once per tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingMetrics {
    /// Preferred parent, [`LinkId::NULL`] when there is no parent.
    pub parent: LinkId,

    /// Path cost (ETX) towards the preferred parent, zero when there is no parent.
    pub parent_etx: u16,

    pub rank: u16,
    pub num_neighbors: u16,
    pub beacon_interval_seconds: u16,
}
