use core::fmt;
use serde::{Deserialize, Serialize};

/// Fixed point scale of [`Position`] coordinates.
pub const MICRODEGREES_PER_DEGREE: i32 = 1_000_000;

/// A geographic position in fixed point degrees (degrees x 1,000,000).
///
/// No range is enforced, coordinates are free to drift past +/-180 degrees and wrap on overflow.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: i32,
    pub longitude: i32,
}

impl Position {
    pub const WIRE_SIZE: usize = 8;

    pub const fn new(latitude: i32, longitude: i32) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns this position moved by the given number of microdegrees on each axis.
    #[must_use]
    pub const fn offset(self, latitude: i32, longitude: i32) -> Self {
        Self {
            latitude: self.latitude.wrapping_add(latitude),
            longitude: self.longitude.wrapping_add(longitude),
        }
    }

    pub fn latitude_degrees(&self) -> f64 {
        f64::from(self.latitude) / f64::from(MICRODEGREES_PER_DEGREE)
    }

    pub fn longitude_degrees(&self) -> f64 {
        f64::from(self.longitude) / f64::from(MICRODEGREES_PER_DEGREE)
    }

    pub(crate) fn to_be_bytes(self) -> [u8; Self::WIRE_SIZE] {
        let mut bytes = [0u8; Self::WIRE_SIZE];
        bytes[..4].copy_from_slice(&self.latitude.to_be_bytes());
        bytes[4..].copy_from_slice(&self.longitude.to_be_bytes());
        bytes
    }

    pub(crate) fn from_be_bytes(bytes: [u8; Self::WIRE_SIZE]) -> Self {
        Self {
            latitude: i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            longitude: i32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

struct FixedPointDegrees(i32);

impl fmt::Display for FixedPointDegrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let scale = MICRODEGREES_PER_DEGREE.unsigned_abs();
        write!(f, "{sign}{}.{:06}", magnitude / scale, magnitude % scale)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}",
            FixedPointDegrees(self.latitude),
            FixedPointDegrees(self.longitude)
        )
    }
}
