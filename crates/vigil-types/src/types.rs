//! Identity and position types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique, immutable identifier for a player.
///
/// Newtype over [`Uuid`] so a player id can't be confused with any other
/// string or id floating around the host server. The account store keys
/// its durable records by this, and the session layer keys its in-memory
/// state by it.
///
/// `#[serde(transparent)]` keeps the on-disk representation a plain UUID
/// string rather than a wrapper object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Generates a fresh random id. Mostly useful in tests and tools;
    /// real ids come from the host's account system.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in a game world, with orientation.
///
/// Captured when an unauthenticated player joins (so we can restore them
/// after login) and used by the tick loop to detect drift away from the
/// holding location or the freeze point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Horizontal look angle in degrees.
    pub yaw: f32,
    /// Vertical look angle in degrees.
    pub pitch: f32,
    /// Host-specific world/dimension identifier, e.g. `"overworld"`.
    pub world: String,
}

impl Position {
    /// A position with the given coordinates, zero orientation, in `world`.
    pub fn new(x: f64, y: f64, z: f64, world: impl Into<String>) -> Self {
        Self {
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
            world: world.into(),
        }
    }

    /// Largest absolute offset from `other` on the horizontal axes.
    ///
    /// The holding-location correction only cares about XZ drift: falling
    /// or being stacked vertically at the holding point is fine.
    pub fn horizontal_drift(&self, other: &Position) -> f64 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// Largest absolute offset from `other` on any axis, Y included.
    ///
    /// The freeze-in-place correction uses this: an unauthenticated player
    /// must not drift on any axis.
    pub fn drift(&self, other: &Position) -> f64 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_display_is_plain_uuid() {
        let id = PlayerId::random();
        assert_eq!(id.to_string(), id.0.to_string());
    }

    #[test]
    fn test_player_id_serde_transparent() {
        let id = PlayerId::random();
        let json = serde_json::to_string(&id).unwrap();
        // A bare JSON string, not an object.
        assert!(json.starts_with('"') && json.ends_with('"'));
        let back: PlayerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_horizontal_drift_ignores_y() {
        let a = Position::new(0.5, 120.0, 0.5, "overworld");
        let mut b = a.clone();
        b.y = 60.0;
        assert_eq!(a.horizontal_drift(&b), 0.0);

        b.x = 3.0;
        assert!((a.horizontal_drift(&b) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_drift_includes_y() {
        let a = Position::new(0.0, 64.0, 0.0, "overworld");
        let mut b = a.clone();
        b.y = 64.3;
        assert!((a.drift(&b) - 0.3).abs() < 1e-9);
    }
}
