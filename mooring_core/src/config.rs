// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binder configuration presets.

/// Configuration for the [`SceneBinder`](crate::binder::SceneBinder).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BinderConfig {
    /// Whether tracking loss hides the node (`set_node_visible(node, false)`).
    ///
    /// When set, re-acquisition makes the node visible again.
    pub hide_on_tracking_loss: bool,
    /// Absolute tolerance for the rigid-pose check.
    ///
    /// See [`Transform3d::check_rigid`](crate::transform::Transform3d::check_rigid).
    pub rigid_tolerance: f64,
    /// Whether pose updates from the tracking session are checked before they
    /// reach the registry.
    ///
    /// Placement transforms from the application are always checked.
    pub validate_updates: bool,
    /// Number of removed bindings kept for diagnosing late callbacks.
    ///
    /// Once a removal pushes the count past this bound, all tombstones are
    /// dropped and later callbacks for those anchors are reported as unknown.
    pub max_tombstones: usize,
}

impl BinderConfig {
    /// Default configuration for world-tracking sessions with
    /// single-precision poses.
    #[must_use]
    pub const fn world_tracking() -> Self {
        Self {
            hide_on_tracking_loss: true,
            rigid_tolerance: 1e-3,
            validate_updates: true,
            max_tombstones: 256,
        }
    }

    /// Configuration that trusts the tracking session and never hides nodes.
    ///
    /// Useful for recorded sessions whose poses were already validated, or
    /// for trackers that report loss frequently and briefly.
    #[must_use]
    pub const fn permissive() -> Self {
        Self {
            hide_on_tracking_loss: false,
            rigid_tolerance: 1e-2,
            validate_updates: false,
            max_tombstones: 1024,
        }
    }
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self::world_tracking()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Transform3d, TransformDefect};

    #[test]
    fn default_is_world_tracking() {
        assert_eq!(BinderConfig::default(), BinderConfig::world_tracking());
    }

    #[test]
    fn permissive_tolerance_admits_float_drift() {
        // Scale drift of 4e-3, typical of poses accumulated in f32.
        let drifted = Transform3d::from_scale(1.004, 1.0, 1.0);
        assert_eq!(
            drifted.check_rigid(BinderConfig::world_tracking().rigid_tolerance),
            Err(TransformDefect::NotOrthonormal)
        );
        assert_eq!(
            drifted.check_rigid(BinderConfig::permissive().rigid_tolerance),
            Ok(())
        );
    }
}
