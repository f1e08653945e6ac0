//! Routing layer health, as seen by the telemetry cycle.

use pasture_protocol::{LinkId, RoutingMetrics};
use std::net::Ipv6Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLink {
    pub link_id: LinkId,
    pub path_cost: u16,
}

/// Read only view of the mesh routing layer.
///
/// Every method returns `None` when the routing layer has nothing to report, e.g. before a
/// topology has been joined. Implementations must not block.
pub trait RoutingMetricsSource {
    fn current_parent(&self) -> Option<ParentLink>;
    fn current_rank(&self) -> Option<u16>;
    fn beacon_interval_seconds(&self) -> Option<u16>;
    fn neighbor_count(&self) -> Option<u16>;
}

/// Takes a snapshot of the routing metrics, anything missing is reported as zero.
pub fn sample<R: RoutingMetricsSource + ?Sized>(source: &R) -> RoutingMetrics {
    let parent = source.current_parent();

    RoutingMetrics {
        parent: parent.map_or(LinkId::NULL, |p| p.link_id),
        parent_etx: parent.map_or(0, |p| p.path_cost),
        rank: source.current_rank().unwrap_or(0),
        num_neighbors: source.neighbor_count().unwrap_or(0),
        beacon_interval_seconds: source.beacon_interval_seconds().unwrap_or(0),
    }
}

/// Link identity of a neighbour, the last two bytes of its address swapped.
pub fn link_id_from_address(address: &Ipv6Addr) -> LinkId {
    let octets = address.octets();
    LinkId([octets[15], octets[14]])
}

/// Path cost towards a parent of the given rank.
pub fn path_cost(parent_rank: u16) -> u16 {
    parent_rank / 2
}

/// Current DIO trickle interval in whole seconds.
pub fn beacon_interval_seconds(dio_interval_doublings: u8) -> u16 {
    let millis = 2u64
        .checked_shl(u32::from(dio_interval_doublings))
        .unwrap_or(0);
    (millis / 1000) as u16
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferredParent {
    pub address: Ipv6Addr,
    pub rank: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dag {
    pub rank: u16,
    pub dio_interval_doublings: u8,
    pub preferred_parent: Option<PreferredParent>,
}

/// Fixed snapshot of RPL state, for nodes whose routing layer is configured externally.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RplState {
    pub dag: Option<Dag>,
    pub neighbors: u16,
}

impl RoutingMetricsSource for RplState {
    fn current_parent(&self) -> Option<ParentLink> {
        self.dag
            .as_ref()?
            .preferred_parent
            .as_ref()
            .map(|parent| ParentLink {
                link_id: link_id_from_address(&parent.address),
                path_cost: path_cost(parent.rank),
            })
    }

    fn current_rank(&self) -> Option<u16> {
        self.dag.as_ref().map(|dag| dag.rank)
    }

    fn beacon_interval_seconds(&self) -> Option<u16> {
        self.dag
            .as_ref()
            .map(|dag| beacon_interval_seconds(dag.dio_interval_doublings))
    }

    fn neighbor_count(&self) -> Option<u16> {
        self.dag.as_ref().map(|_| self.neighbors)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn joined() -> RplState {
        RplState {
            dag: Some(Dag {
                rank: 512,
                dio_interval_doublings: 12,
                preferred_parent: Some(PreferredParent {
                    address: "aaaa::212:7401:1:101".parse().unwrap(),
                    rank: 256,
                }),
            }),
            neighbors: 4,
        }
    }

    #[test]
    fn no_topology_is_all_zero() {
        assert_eq!(sample(&RplState::default()), RoutingMetrics::default());
    }

    #[test]
    fn no_topology_ignores_neighbours() {
        let state = RplState {
            dag: None,
            neighbors: 3,
        };
        assert_eq!(sample(&state).num_neighbors, 0);
    }

    #[test]
    fn joined_topology() {
        assert_eq!(
            sample(&joined()),
            RoutingMetrics {
                parent: LinkId([0x01, 0x01]),
                parent_etx: 128,
                rank: 512,
                num_neighbors: 4,
                beacon_interval_seconds: 8,
            }
        );
    }

    #[test]
    fn no_parent() {
        let mut state = joined();
        if let Some(dag) = state.dag.as_mut() {
            dag.preferred_parent = None;
        }

        let metrics = sample(&state);
        assert_eq!(metrics.parent, LinkId::NULL);
        assert_eq!(metrics.parent_etx, 0);
        assert_eq!(metrics.rank, 512);
    }

    #[test]
    fn parent_bytes_are_swapped() {
        let address: Ipv6Addr = "aaaa::1:0203".parse().unwrap();
        assert_eq!(link_id_from_address(&address), LinkId([0x03, 0x02]));
    }

    #[test]
    fn beacon_interval() {
        assert_eq!(beacon_interval_seconds(0), 0);
        assert_eq!(beacon_interval_seconds(9), 1);
        assert_eq!(beacon_interval_seconds(16), 131);
        assert_eq!(beacon_interval_seconds(200), 0);
    }
}
