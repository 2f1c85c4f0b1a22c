// Rotation/mirroring arithmetic for presenting camera frames upright.

/// Texture transform the renderer must apply to present a frame upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orientation {
    /// Clockwise rotation in degrees, always in `[0, 360)`.
    pub rotation_degrees: u32,
    /// Whether the image must be mirrored horizontally (front cameras).
    pub mirrored: bool,
}

/// Compute the rotation needed to correct a frame for the current display.
///
/// The sensor is mounted at `sensor_mount_angle` degrees relative to the
/// device's natural orientation; the display is currently rotated
/// `display_rotation` degrees. Both must be one of 0/90/180/270 — callers
/// with raw rotation values go through [`normalize_rotation`] first.
///
/// The formulas are empirical device corrections, kept verbatim:
/// back camera `(mount - display + 360) % 360`, front camera
/// `(mount + display) % 360` with a horizontal mirror.
pub fn resolve(sensor_mount_angle: u32, display_rotation: u32, front_facing: bool) -> Orientation {
    let rotation_degrees = if front_facing {
        (sensor_mount_angle + display_rotation) % 360
    } else {
        (sensor_mount_angle + 360 - display_rotation) % 360
    };
    Orientation {
        rotation_degrees,
        mirrored: front_facing,
    }
}

/// Snap an arbitrary rotation to the nearest cardinal value (0/90/180/270).
///
/// Negative inputs wrap: `-90` maps to `270`.
pub fn normalize_rotation(raw: i32) -> u32 {
    let wrapped = raw.rem_euclid(360);
    (((wrapped + 45) / 90) % 4 * 90) as u32
}
