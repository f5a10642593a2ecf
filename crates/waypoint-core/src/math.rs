use glam::DVec3;

/// Offset from the viewer at which a marker is drawn, plus the distance
/// shown on its label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerPlacement {
    /// Seat offset relative to the viewer, before the vertical nudge.
    pub offset: DVec3,
    /// Label distance: horizontal distance combined with the scaled
    /// vertical component of `offset`.
    pub distance: f64,
}

/// Place a marker `marker_distance` away from `viewer`, pointing at `target`.
///
/// The direction is normalized by its horizontal (x, z) length only, so the
/// vertical component keeps its slope. A viewer standing exactly above or
/// below the target gets an unnormalized vector rather than a division by
/// zero.
pub fn marker_placement(viewer: DVec3, target: DVec3, marker_distance: f64) -> MarkerPlacement {
    let delta = target - viewer;
    let horizontal_sq = delta.x * delta.x + delta.z * delta.z;
    let horizontal = horizontal_sq.sqrt();

    let direction = if horizontal > 0.0 {
        delta / horizontal
    } else {
        delta
    };

    let offset = direction * marker_distance;
    MarkerPlacement {
        offset,
        distance: (horizontal_sq + offset.y * offset.y).sqrt(),
    }
}

/// Yaw and pitch (degrees) that make an eye at `eye` look at `target`.
/// Yaw 0 faces +z, increasing clockwise seen from above; pitch is positive
/// looking down.
pub fn look_at(eye: DVec3, target: DVec3) -> (f64, f64) {
    let delta = target - eye;
    let horizontal = (delta.x * delta.x + delta.z * delta.z).sqrt();

    let yaw = if delta.x == 0.0 && delta.z == 0.0 {
        0.0
    } else {
        let mut yaw = (-delta.x).atan2(delta.z).to_degrees();
        if yaw < 0.0 {
            yaw += 360.0;
        }
        yaw
    };
    let pitch = -delta.y.atan2(horizontal).to_degrees();
    (yaw, pitch)
}

/// Clamp a coordinate typed by a user to the world border.
pub fn clamp_coord(value: f64) -> f64 {
    value.clamp(crate::constants::MIN_COORD, crate::constants::MAX_COORD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_placement_horizontal() {
        let p = marker_placement(DVec3::ZERO, DVec3::new(30.0, 0.0, 40.0), 5.0);
        assert!((p.offset - DVec3::new(3.0, 0.0, 4.0)).length() < 1e-9);
        assert!((p.distance - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_marker_placement_keeps_vertical_slope() {
        let p = marker_placement(DVec3::ZERO, DVec3::new(10.0, 10.0, 0.0), 2.0);
        assert!((p.offset - DVec3::new(2.0, 2.0, 0.0)).length() < 1e-9);
        assert!((p.distance - 104f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_marker_placement_directly_above() {
        let p = marker_placement(DVec3::ZERO, DVec3::new(0.0, 3.0, 0.0), 2.0);
        assert!(p.offset.is_finite());
        assert_eq!(p.offset, DVec3::new(0.0, 6.0, 0.0));
        assert!((p.distance - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_label_distance_uses_scaled_vertical() {
        let viewer = DVec3::new(0.0, 64.0, 0.0);
        let above = marker_placement(viewer, DVec3::new(10.0, 74.0, 0.0), 5.0);
        assert!((above.distance - 125f64.sqrt()).abs() < 1e-9);
        assert_eq!(above.distance.ceil(), 12.0);

        let below = marker_placement(viewer, DVec3::new(10.0, 54.0, 0.0), 5.0);
        assert_eq!(below.distance, above.distance);
    }

    #[test]
    fn test_look_at() {
        let (yaw, pitch) = look_at(DVec3::ZERO, DVec3::new(0.0, 0.0, 10.0));
        assert!(yaw.abs() < 1e-9);
        assert!(pitch.abs() < 1e-9);

        let (yaw, _) = look_at(DVec3::ZERO, DVec3::new(-10.0, 0.0, 0.0));
        assert!((yaw - 90.0).abs() < 1e-9);

        let (_, pitch) = look_at(DVec3::ZERO, DVec3::new(0.0, -10.0, 0.0));
        assert!((pitch - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_coord() {
        assert_eq!(clamp_coord(1.0e9), 30_000_000.0);
        assert_eq!(clamp_coord(-5.0), -5.0);
    }
}
