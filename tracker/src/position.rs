//! Simulated position of the node.
//!
//! Each node starts near [`BASE_POSITION`] at an offset derived from its identity, then drifts
//! by a small pseudo random amount every tick. The generator is seeded once from the node
//! identity, so a given node always follows the same path.

use pasture_protocol::Position;
use tracing::debug;

/// -8.055719, -34.950969
pub const BASE_POSITION: Position = Position::new(-8_055_719, -34_950_969);

/// Seed used when the node identity would give an all zero generator.
pub const FALLBACK_SEED: u16 = 12345;

const OFFSET_SPAN: i32 = 1000;
const DRIFT_SPAN: u16 = 200;

/// Offset of a node from [`BASE_POSITION`], in microdegrees of latitude and longitude.
///
/// Both components are in `-500..=499`.
pub fn initial_offset(node_identity: u16) -> (i32, i32) {
    let identity = i32::from(node_identity);
    let half = OFFSET_SPAN / 2;
    (
        (identity % OFFSET_SPAN) - half,
        ((identity / OFFSET_SPAN) % OFFSET_SPAN) - half,
    )
}

pub fn initialize(node_identity: u16) -> Position {
    let (latitude, longitude) = initial_offset(node_identity);
    BASE_POSITION.offset(latitude, longitude)
}

/// 16 bit linear congruential generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prng(u16);

impl Prng {
    pub fn seeded(node_identity: u16) -> Self {
        match node_identity {
            0 => Self(FALLBACK_SEED),
            seed => Self(seed),
        }
    }

    /// Resumes a generator from a known state.
    pub const fn from_state(state: u16) -> Self {
        Self(state)
    }

    pub fn state(&self) -> u16 {
        self.0
    }

    /// Steps the generator and returns a drift in `-100..=99`.
    pub fn next_drift(&mut self) -> i32 {
        let next = u32::from(self.0)
            .wrapping_mul(1_103_515_245)
            .wrapping_add(12_345)
            & 0x7fff_ffff;
        // Only 16 bits of state are kept
        self.0 = next as u16;
        i32::from(self.0 % DRIFT_SPAN) - i32::from(DRIFT_SPAN / 2)
    }
}

/// Applies one latitude then one longitude drift to `position`.
pub fn advance(mut prng: Prng, position: Position) -> (Prng, Position) {
    let latitude = prng.next_drift();
    let longitude = prng.next_drift();
    (prng, position.offset(latitude, longitude))
}

#[derive(Debug, Clone)]
pub struct PositionModel {
    prng: Prng,
    position: Position,
}

impl PositionModel {
    pub fn new(node_identity: u16) -> Self {
        Self {
            prng: Prng::seeded(node_identity),
            position: initialize(node_identity),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn advance(&mut self) -> Position {
        (self.prng, self.position) = advance(self.prng, self.position);
        debug!("Position update: {}", self.position);
        self.position
    }
}
