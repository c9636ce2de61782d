// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Orchestration between the application, the tracking session and the
//! scene renderer.
//!
//! Placement is anchored through the tracking session rather than written
//! straight into the scene: [`SceneBinder::place_object`] only records a
//! pending binding and asks for an anchor. The node enters the scene when the
//! session first reports a pose for that anchor, and every later pose
//! correction (plane refinement, relocalization) moves it without extra
//! bookkeeping.
//!
//! # Threading
//!
//! Tracking callbacks (`on_*`) and application calls (`place_object`,
//! `detach`, `force_detach`) may run concurrently on different threads. Every
//! registry transition that leads to a scene command happens while the
//! renderer lock is held, so the renderer sees commands in exactly the order
//! the transitions happened. The tracking session is only called after all
//! locks are released.
//!
//! # Ordering
//!
//! Pose updates are applied in delivery order. If the session delivers two
//! updates for one anchor out of chronological order, the binding keeps the
//! one delivered last.

use core::fmt;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::config::BinderConfig;
use crate::error::BindingError;
use crate::id::{AnchorId, NodeId};
use crate::registry::{AnchorRegistry, BindingState, RegistryView};
use crate::session::{SceneCommand, SceneRenderer, TrackingSession};
use crate::trace::{
    CommandEvent, DetachEvent, DetachKind, IgnoreReason, IgnoredEvent, PlacedEvent, RejectedEvent,
    TraceSink, TransitionEvent,
};
use crate::transform::Transform3d;

struct Diagnostics {
    sink: Option<Box<dyn TraceSink + Send>>,
    next_seq: u64,
}

/// Keeps an [`AnchorRegistry`] and a scene in agreement with a tracking
/// session.
///
/// `T` is the tracking session and `R` the scene renderer. The binder owns
/// both; wrap it in an [`Arc`](std::sync::Arc) to share it between the
/// tracking callback thread and the application thread.
pub struct SceneBinder<T, R> {
    registry: AnchorRegistry,
    tracking: T,
    renderer: Mutex<R>,
    config: BinderConfig,
    diagnostics: Mutex<Diagnostics>,
}

impl<T, R> fmt::Debug for SceneBinder<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneBinder")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: TrackingSession, R: SceneRenderer> SceneBinder<T, R> {
    /// Creates a binder with an empty registry.
    #[must_use]
    pub fn new(tracking: T, renderer: R, config: BinderConfig) -> Self {
        Self {
            registry: AnchorRegistry::new(),
            tracking,
            renderer: Mutex::new(renderer),
            config,
            diagnostics: Mutex::new(Diagnostics {
                sink: None,
                next_seq: 0,
            }),
        }
    }

    /// Installs a diagnostics sink, replacing any previous one.
    #[must_use]
    pub fn with_trace_sink(self, sink: impl TraceSink + Send + 'static) -> Self {
        self.set_trace_sink(sink);
        self
    }

    /// Installs a diagnostics sink, replacing any previous one.
    pub fn set_trace_sink(&self, sink: impl TraceSink + Send + 'static) {
        self.diagnostics.lock().sink = Some(Box::new(sink));
    }

    /// Returns a read-only view of the registry for polling.
    ///
    /// Binding state only changes through the binder, so the renderer always
    /// hears about it. Use [`force_detach`](Self::force_detach) for local
    /// removals.
    #[must_use]
    pub fn registry(&self) -> RegistryView<'_> {
        self.registry.view()
    }

    /// Drops all tombstones now and returns how many were dropped.
    ///
    /// The binder also does this on its own once more than
    /// [`BinderConfig::max_tombstones`] have accumulated.
    pub fn collect_garbage(&self) -> usize {
        let dropped = self.registry.collect_garbage();
        debug!(dropped, "tombstones collected");
        dropped
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Returns the tracking session.
    #[must_use]
    pub fn tracking(&self) -> &T {
        &self.tracking
    }

    /// Runs `f` with shared access to the renderer.
    pub fn with_renderer<O>(&self, f: impl FnOnce(&R) -> O) -> O {
        f(&self.renderer.lock())
    }

    /// Tears the binder down and returns the collaborators.
    pub fn into_parts(self) -> (T, R) {
        (self.tracking, self.renderer.into_inner())
    }

    // -- Application API --

    /// Records a pending binding for `node` and asks the tracking session for
    /// an anchor at `world_transform`.
    ///
    /// Returns the new anchor id immediately. The node is *not* added to the
    /// scene yet; that happens on the first
    /// [`on_anchor_updated`](Self::on_anchor_updated) for the anchor.
    ///
    /// Fails with [`BindingError::MalformedTransform`] if `world_transform` is
    /// not a rigid pose, or [`BindingError::DuplicateNode`] if `node` is
    /// already anchored. On failure nothing changes and no collaborator is
    /// called.
    pub fn place_object(
        &self,
        node: NodeId,
        world_transform: Transform3d,
    ) -> Result<AnchorId, BindingError> {
        let placed = world_transform
            .check_rigid(self.config.rigid_tolerance)
            .map_err(BindingError::from)
            .and_then(|()| self.registry.create_pending(node));

        let anchor = match placed {
            Ok(anchor) => anchor,
            Err(error) => {
                debug!(%node, %error, "placement rejected");
                self.emit(|seq, sink| sink.on_rejected(&RejectedEvent { seq, node, error }));
                return Err(error);
            }
        };

        debug!(%anchor, %node, "placement pending");
        self.emit(|seq, sink| {
            sink.on_placed(&PlacedEvent {
                seq,
                anchor,
                node,
                transform: world_transform,
            });
        });
        self.tracking.request_anchor_creation(anchor, world_transform);
        Ok(anchor)
    }

    /// Asks the tracking session to remove the anchor holding `node`.
    ///
    /// This is a request: the binding and the scene node are cleaned up when
    /// the session reports the removal through
    /// [`on_anchor_removed`](Self::on_anchor_removed). If `node` has no
    /// binding, nothing happens.
    pub fn detach(&self, node: NodeId) {
        let Some(binding) = self.registry.lookup_by_node(node) else {
            self.ignore_detach(node);
            return;
        };
        let anchor = binding.anchor;
        debug!(%anchor, %node, "detach requested");
        self.emit(|seq, sink| {
            sink.on_detach(&DetachEvent {
                seq,
                anchor,
                node,
                kind: DetachKind::Requested,
            });
        });
        self.tracking.request_anchor_removal(anchor);
    }

    /// Removes the binding holding `node` immediately, then asks the tracking
    /// session to remove its anchor.
    ///
    /// Intended for applications that gave up waiting for a removal callback.
    /// The node is removed from the scene if it had been added. The eventual
    /// callback for the anchor is absorbed as a benign race.
    ///
    /// Returns the released anchor, or `None` if `node` had no binding.
    pub fn force_detach(&self, node: NodeId) -> Option<AnchorId> {
        let anchor = {
            let mut renderer = self.renderer.lock();
            let Some(binding) = self.registry.lookup_by_node(node) else {
                drop(renderer);
                self.ignore_detach(node);
                return None;
            };
            let anchor = binding.anchor;
            debug!(%anchor, %node, "forced detach");
            self.emit(|seq, sink| {
                sink.on_detach(&DetachEvent {
                    seq,
                    anchor,
                    node,
                    kind: DetachKind::Forced,
                });
            });
            if let Some(before) = self.registry.remove_binding(anchor) {
                self.finish_removal(&mut *renderer, anchor, before.node, before.state);
            }
            anchor
        };
        self.tracking.request_anchor_removal(anchor);
        Some(anchor)
    }

    // -- Tracking callbacks --

    /// Handles a pose report for `anchor`.
    ///
    /// The first report adds the node to the scene; later reports move it. A
    /// report after tracking loss also makes the node visible again if it was
    /// hidden. Reports for unknown or removed anchors are absorbed.
    pub fn on_anchor_updated(&self, anchor: AnchorId, transform: Transform3d) {
        if self.config.validate_updates
            && let Err(defect) = transform.check_rigid(self.config.rigid_tolerance)
        {
            warn!(%anchor, %defect, "dropping malformed pose update");
            self.ignore(Some(anchor), IgnoreReason::MalformedUpdate(defect));
            return;
        }

        let mut renderer = self.renderer.lock();
        let confirmation = match self.registry.confirm(anchor, transform) {
            Ok(c) => c,
            Err(_) => {
                drop(renderer);
                debug!(%anchor, "pose update for unknown anchor");
                self.ignore(Some(anchor), IgnoreReason::UnknownAnchor);
                return;
            }
        };

        let node = confirmation.node;
        match confirmation.previous {
            BindingState::Pending => {
                debug!(%anchor, %node, "anchor confirmed");
                self.transition(anchor, node, BindingState::Pending, BindingState::Bound);
                self.issue(&mut *renderer, anchor, SceneCommand::AddNode(node, transform));
            }
            BindingState::Bound => {
                trace!(%anchor, %node, "anchor moved");
                self.issue(
                    &mut *renderer,
                    anchor,
                    SceneCommand::UpdateNodeTransform(node, transform),
                );
            }
            BindingState::Stale => {
                debug!(%anchor, %node, "tracking reacquired");
                self.transition(anchor, node, BindingState::Stale, BindingState::Bound);
                self.issue(
                    &mut *renderer,
                    anchor,
                    SceneCommand::UpdateNodeTransform(node, transform),
                );
                if self.config.hide_on_tracking_loss {
                    self.issue(&mut *renderer, anchor, SceneCommand::SetNodeVisible(node, true));
                }
            }
            // `confirm` refuses removed bindings.
            BindingState::Removed => {}
        }
    }

    /// Handles the tracking session's removal of `anchor`.
    ///
    /// Removes the node from the scene if it had been added. Removals for
    /// unknown or already removed anchors are absorbed.
    pub fn on_anchor_removed(&self, anchor: AnchorId) {
        let mut renderer = self.renderer.lock();
        let Some(before) = self.registry.remove_binding(anchor) else {
            drop(renderer);
            debug!(%anchor, "removal for unknown anchor");
            self.ignore(Some(anchor), IgnoreReason::UnknownAnchor);
            return;
        };
        debug!(%anchor, node = %before.node, "anchor removed");
        self.finish_removal(&mut *renderer, anchor, before.node, before.state);
    }

    /// Handles loss of tracking for `anchor`.
    ///
    /// The binding becomes stale and, if configured, the node is hidden while
    /// it is untracked. Nothing happens for pending, stale or removed
    /// bindings; unknown anchors are absorbed.
    pub fn on_tracking_lost(&self, anchor: AnchorId) {
        let mut renderer = self.renderer.lock();
        match self.registry.mark_stale(anchor) {
            Ok(Some(node)) => {
                debug!(%anchor, %node, "tracking lost");
                self.transition(anchor, node, BindingState::Bound, BindingState::Stale);
                if self.config.hide_on_tracking_loss {
                    self.issue(&mut *renderer, anchor, SceneCommand::SetNodeVisible(node, false));
                }
            }
            Ok(None) => {
                trace!(%anchor, "tracking loss ignored in current state");
            }
            Err(_) => {
                drop(renderer);
                debug!(%anchor, "tracking loss for unknown anchor");
                self.ignore(Some(anchor), IgnoreReason::UnknownAnchor);
            }
        }
    }

    // -- Helpers --

    fn finish_removal(&self, renderer: &mut R, anchor: AnchorId, node: NodeId, from: BindingState) {
        self.transition(anchor, node, from, BindingState::Removed);
        if from.is_in_scene() {
            self.issue(renderer, anchor, SceneCommand::RemoveNode(node));
        }
        if self.registry.tombstones() > self.config.max_tombstones {
            self.collect_garbage();
        }
    }

    fn issue(&self, renderer: &mut R, anchor: AnchorId, command: SceneCommand) {
        command.apply_to(renderer);
        self.emit(|seq, sink| sink.on_command(&CommandEvent { seq, anchor, command }));
    }

    fn transition(&self, anchor: AnchorId, node: NodeId, from: BindingState, to: BindingState) {
        self.emit(|seq, sink| {
            sink.on_transition(&TransitionEvent {
                seq,
                anchor,
                node,
                from,
                to,
            });
        });
    }

    fn ignore_detach(&self, node: NodeId) {
        debug!(%node, "detach for node without binding");
        self.emit(|seq, sink| {
            sink.on_ignored(&IgnoredEvent {
                seq,
                anchor: None,
                node: Some(node),
                reason: IgnoreReason::NoBinding,
            });
        });
    }

    fn ignore(&self, anchor: Option<AnchorId>, reason: IgnoreReason) {
        self.emit(|seq, sink| {
            sink.on_ignored(&IgnoredEvent {
                seq,
                anchor,
                node: None,
                reason,
            });
        });
    }

    fn emit(&self, f: impl FnOnce(u64, &mut dyn TraceSink)) {
        let mut diag = self.diagnostics.lock();
        let seq = diag.next_seq;
        diag.next_seq += 1;
        if let Some(sink) = diag.sink.as_deref_mut() {
            f(seq, sink);
        }
    }
}
