//! The "collect view" node status message used as the routing blob of a telemetry record.
//!
//! Twenty two big endian 16 bit words. The parent link identity is copied byte for byte and is
//! not byte swapped.

use crate::{Error, LinkId, RoutingBlob, RoutingMetrics};
use serde::{Deserialize, Serialize};

const SENSOR_COUNT: usize = 10;
const WORDS: usize = 12 + SENSOR_COUNT;

/// Clock ticks per second of the `clock` field.
pub const CLOCK_SECOND: u32 = 128;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectViewMessage {
    pub clock: u16,
    pub timesynch_time: u16,
    pub cpu: u16,
    pub lpm: u16,
    pub transmit: u16,
    pub listen: u16,
    pub routing: RoutingMetrics,
    pub sensors: [u16; SENSOR_COUNT],
}

impl CollectViewMessage {
    /// Builds a message carrying only routing metrics and the node clock.
    pub fn new(routing: RoutingMetrics, clock: u16) -> Self {
        Self {
            clock,
            routing,
            ..Default::default()
        }
    }
}

impl RoutingBlob for CollectViewMessage {
    const LEN: usize = WORDS * 2;

    fn write_to(&self, buffer: &mut [u8]) {
        let words = [
            WORDS as u16,
            self.clock,
            self.timesynch_time,
            self.cpu,
            self.lpm,
            self.transmit,
            self.listen,
        ];
        let (head, tail) = buffer.split_at_mut(words.len() * 2);
        for (chunk, word) in head.chunks_exact_mut(2).zip(words) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }

        tail[..2].copy_from_slice(&self.routing.parent.0);

        let words = [
            self.routing.parent_etx,
            self.routing.rank,
            self.routing.num_neighbors,
            self.routing.beacon_interval_seconds,
        ]
        .into_iter()
        .chain(self.sensors);
        for (chunk, word) in tail[2..].chunks_exact_mut(2).zip(words) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
    }

    fn read_from(buffer: &[u8]) -> Result<Self, Error> {
        let mut words = [0u16; WORDS];
        for (word, chunk) in words.iter_mut().zip(buffer.chunks_exact(2)) {
            *word = u16::from_be_bytes([chunk[0], chunk[1]]);
        }

        if words[0] != WORDS as u16 {
            return Err(Error::IncorrectBlobLength {
                expected: WORDS as u16,
                declared: words[0],
            });
        }

        let mut sensors = [0u16; SENSOR_COUNT];
        sensors.copy_from_slice(&words[12..]);

        Ok(Self {
            clock: words[1],
            timesynch_time: words[2],
            cpu: words[3],
            lpm: words[4],
            transmit: words[5],
            listen: words[6],
            routing: RoutingMetrics {
                parent: LinkId([buffer[14], buffer[15]]),
                parent_etx: words[8],
                rank: words[9],
                num_neighbors: words[10],
                beacon_interval_seconds: words[11],
            },
            sensors,
        })
    }
}
