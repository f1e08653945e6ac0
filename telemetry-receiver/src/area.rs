use pasture_protocol::Position;

/// Square region nodes are expected to stay inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Area {
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,

    /// Side of the square, in degrees of latitude.
    pub(crate) square_distance: f64,
}

impl Area {
    pub(crate) fn contains(&self, position: &Position) -> bool {
        let half = self.square_distance / 2.0;

        // Widen the longitude range so the area stays square on the ground
        let longitude_half = half / self.latitude.to_radians().cos();

        let latitude = position.latitude_degrees();
        let longitude = position.longitude_degrees();

        (self.latitude - half..=self.latitude + half).contains(&latitude)
            && (self.longitude - longitude_half..=self.longitude + longitude_half)
                .contains(&longitude)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const AREA: Area = Area {
        latitude: -8.055719,
        longitude: -34.950969,
        square_distance: 0.001,
    };

    #[test]
    fn centre() {
        assert!(AREA.contains(&Position::new(-8_055_719, -34_950_969)));
    }

    #[test]
    fn latitude_edges() {
        assert!(AREA.contains(&Position::new(-8_055_719 + 499, -34_950_969)));
        assert!(!AREA.contains(&Position::new(-8_055_719 + 501, -34_950_969)));
        assert!(!AREA.contains(&Position::new(-8_055_719 - 501, -34_950_969)));
    }

    #[test]
    fn longitude_is_widened() {
        // Half width is 0.0005 / cos(8.06 degrees), about 0.000505
        assert!(AREA.contains(&Position::new(-8_055_719, -34_950_969 + 503)));
        assert!(!AREA.contains(&Position::new(-8_055_719, -34_950_969 + 507)));
        assert!(!AREA.contains(&Position::new(-8_055_719, -34_950_969 - 507)));
    }

    #[test]
    fn far_away() {
        assert!(!AREA.contains(&Position::new(51_500_000, -120_000)));
    }
}
