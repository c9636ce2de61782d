// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles for driving a [`SceneBinder`] without a device.
//!
//! - [`ScriptedSession`] stands in for the platform tracking session. It
//!   queues creation and removal requests so a test can answer them, drop
//!   them, reorder them or duplicate them.
//! - [`MirrorRenderer`] stands in for the scene graph. It builds a model of
//!   the scene from the commands it receives, flags commands that make no
//!   sense (adding a node twice, moving a node that is not there) and can be
//!   compared against the registry with [`MirrorRenderer::mismatches`].
//!
//! [`check_consistency`] combines the two checks for the common case.

pub mod mirror;
pub mod session;

pub use mirror::{MirrorNode, MirrorRenderer, Mismatch, SceneViolation};
pub use session::{ScriptedSession, TrackingEvent, TrackingRequest, deliver_all};

use mooring_core::binder::SceneBinder;
use mooring_core::session::TrackingSession;

/// Problems found by [`check_consistency`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConsistencyReport {
    /// Commands that did not fit the scene at the time they arrived.
    pub violations: Vec<SceneViolation>,
    /// Differences between the final scene and the registry.
    pub mismatches: Vec<Mismatch>,
}

impl ConsistencyReport {
    /// Returns `true` if nothing was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.mismatches.is_empty()
    }
}

/// Checks a binder's mirrored scene against its registry.
pub fn check_consistency<T: TrackingSession>(
    binder: &SceneBinder<T, MirrorRenderer>,
) -> ConsistencyReport {
    let hides_stale = binder.config().hide_on_tracking_loss;
    binder.with_renderer(|r| ConsistencyReport {
        violations: r.violations().to_vec(),
        mismatches: r.mismatches(binder.registry(), hides_stale),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooring_core::config::BinderConfig;
    use mooring_core::id::{AnchorId, NodeId};
    use mooring_core::registry::BindingState;
    use mooring_core::session::SceneCommand;
    use mooring_core::transform::Transform3d;

    type Binder = SceneBinder<ScriptedSession, MirrorRenderer>;

    fn binder(config: BinderConfig) -> Binder {
        SceneBinder::new(ScriptedSession::new(), MirrorRenderer::new(), config)
    }

    /// Small deterministic generator so the stress run is reproducible per
    /// thread even though interleavings are not.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            self.0 >> 33
        }

        fn below(&mut self, n: u64) -> u64 {
            self.next() % n
        }
    }

    #[test]
    fn full_lifecycle_is_consistent() {
        let b = binder(BinderConfig::world_tracking());
        let node = NodeId(5);
        let placed = Transform3d::from_translation(0.0, 0.0, -1.0);
        let anchor = b.place_object(node, placed).unwrap();
        assert!(check_consistency(&b).is_clean());

        ScriptedSession::pump(&b);
        let moved = Transform3d::from_translation(0.1, 0.0, -1.0);
        deliver_all(
            &b,
            [
                TrackingEvent::Lost(anchor),
                TrackingEvent::Lost(anchor),
                TrackingEvent::Updated(anchor, moved),
            ],
        );
        let report = check_consistency(&b);
        assert!(report.is_clean(), "{report:?}");
        assert_eq!(
            b.with_renderer(|r| r.node(node)),
            Some(MirrorNode {
                transform: moved,
                visible: true,
            })
        );

        b.detach(node);
        ScriptedSession::pump(&b);
        let report = check_consistency(&b);
        assert!(report.is_clean(), "{report:?}");
        assert!(b.with_renderer(|r| r.nodes().is_empty()));
    }

    #[test]
    fn duplicated_and_late_callbacks_do_not_disturb_the_scene() {
        let b = binder(BinderConfig::world_tracking());
        let anchor = b.place_object(NodeId(1), Transform3d::IDENTITY).unwrap();
        let create = b.tracking().take_requests();
        assert_eq!(create, vec![TrackingRequest::Create(anchor, Transform3d::IDENTITY)]);

        b.on_anchor_updated(anchor, Transform3d::IDENTITY);
        b.on_anchor_updated(anchor, Transform3d::IDENTITY);
        b.detach(NodeId(1));
        deliver_all(
            &b,
            [
                TrackingEvent::Removed(anchor),
                TrackingEvent::Removed(anchor),
                TrackingEvent::Updated(anchor, Transform3d::IDENTITY),
                TrackingEvent::Lost(anchor),
                TrackingEvent::Updated(AnchorId(999), Transform3d::IDENTITY),
            ],
        );

        let report = check_consistency(&b);
        assert!(report.is_clean(), "{report:?}");
        let adds = b.with_renderer(|r| {
            r.log()
                .iter()
                .filter(|c| matches!(c, SceneCommand::AddNode(..)))
                .count()
        });
        assert_eq!(adds, 1, "one add per binding");
    }

    #[test]
    fn concurrent_app_and_tracking_threads_stay_consistent() {
        const NODES: u64 = 8;
        const STEPS: usize = 2_000;

        let b = binder(BinderConfig::world_tracking());

        std::thread::scope(|s| {
            s.spawn(|| {
                let mut rng = Lcg(0x5eed_0001);
                for _ in 0..STEPS {
                    let node = NodeId(rng.below(NODES));
                    match rng.below(5) {
                        0..=2 => {
                            let x = rng.below(100) as f64 / 100.0;
                            let _ = b.place_object(node, Transform3d::from_translation(x, 0.0, -1.0));
                        }
                        3 => b.detach(node),
                        _ => {
                            let _ = b.force_detach(node);
                        }
                    }
                }
            });
            s.spawn(|| {
                let mut rng = Lcg(0x5eed_0002);
                for _ in 0..STEPS {
                    if rng.below(3) == 0 {
                        ScriptedSession::pump(&b);
                        continue;
                    }
                    let live = b.registry().bindings();
                    if live.is_empty() {
                        continue;
                    }
                    let anchor = live[rng.below(live.len() as u64) as usize].anchor;
                    let event = match rng.below(4) {
                        0 => TrackingEvent::Lost(anchor),
                        1 => TrackingEvent::Removed(anchor),
                        _ => {
                            let z = -(rng.below(100) as f64) / 50.0;
                            TrackingEvent::Updated(anchor, Transform3d::from_translation(0.0, 0.0, z))
                        }
                    };
                    event.deliver_to(&b);
                    if rng.below(50) == 0 {
                        b.collect_garbage();
                    }
                }
            });
        });

        while ScriptedSession::pump(&b) > 0 {}

        let report = check_consistency(&b);
        assert!(report.is_clean(), "{report:?}");
        for binding in b.registry().bindings() {
            assert_eq!(
                b.registry().lookup_by_node(binding.node).map(|x| x.anchor),
                Some(binding.anchor),
                "node index agrees with anchor index"
            );
            assert_ne!(binding.state, BindingState::Removed, "live list excludes tombstones");
        }
    }

    #[test]
    fn garbage_collection_leaves_scene_consistent() {
        let b = binder(BinderConfig::world_tracking());
        let kept = b.place_object(NodeId(1), Transform3d::IDENTITY).unwrap();
        let gone = b.place_object(NodeId(2), Transform3d::IDENTITY).unwrap();
        ScriptedSession::pump(&b);
        b.detach(NodeId(2));
        ScriptedSession::pump(&b);

        assert_eq!(b.collect_garbage(), 1);
        TrackingEvent::Updated(gone, Transform3d::IDENTITY).deliver_to(&b);
        TrackingEvent::Lost(kept).deliver_to(&b);

        let report = check_consistency(&b);
        assert!(report.is_clean(), "{report:?}");
        assert_eq!(b.registry().len(), 1);
        assert!(b.registry().lookup(gone).is_none());
    }

    #[test]
    fn permissive_config_never_hides() {
        let b = binder(BinderConfig::permissive());
        let anchor = b.place_object(NodeId(2), Transform3d::IDENTITY).unwrap();
        ScriptedSession::pump(&b);
        TrackingEvent::Lost(anchor).deliver_to(&b);

        assert_eq!(b.registry().lookup(anchor).unwrap().state, BindingState::Stale);
        assert!(b.with_renderer(|r| r.node(NodeId(2)).unwrap().visible));
        assert!(check_consistency(&b).is_clean());
    }
}
