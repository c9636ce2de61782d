// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Authoritative store of anchor-to-node bindings.
//!
//! Every binding moves through a small state machine:
//!
//! ```text
//!   create_pending ──► Pending ──confirm──► Bound ──mark_stale──► Stale
//!                         │                 ▲  │                    │
//!                         │                 │  └──confirm (refresh) │
//!                         │                 └──────confirm──────────┘
//!                         └────────────── remove (any live state) ──► Removed
//! ```
//!
//! All transitions go through [`AnchorRegistry`] methods. A single lock
//! guards both directions of the mapping, so each operation's
//! read-check-write is atomic with respect to every other operation.
//!
//! Removed bindings are kept as tombstones so late events can still be told
//! apart from never-seen ids, until [`AnchorRegistry::collect_garbage`] drops
//! them. The binder does this itself once more than
//! [`BinderConfig::max_tombstones`](crate::config::BinderConfig::max_tombstones)
//! have accumulated.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::BindingError;
use crate::id::{AnchorId, NodeId};
use crate::transform::Transform3d;

/// Lifecycle state of a [`Binding`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingState {
    /// Placement requested; the tracking session has not reported a pose yet.
    Pending,
    /// The anchor is tracked and the node is in the scene.
    Bound,
    /// Tracking of the anchor was lost; the node is still in the scene.
    Stale,
    /// The binding is finished. Its ids are never reused.
    Removed,
}

impl BindingState {
    /// Returns whether the binding still holds its node (anything but
    /// [`Removed`](Self::Removed)).
    #[inline]
    #[must_use]
    pub const fn is_live(self) -> bool {
        !matches!(self, Self::Removed)
    }

    /// Returns whether the renderer has been told to add the node and not yet
    /// to remove it.
    #[inline]
    #[must_use]
    pub const fn is_in_scene(self) -> bool {
        matches!(self, Self::Bound | Self::Stale)
    }
}

/// A read-only snapshot of one anchor-to-node binding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Binding {
    /// The anchor side of the binding.
    pub anchor: AnchorId,
    /// The node side of the binding.
    pub node: NodeId,
    /// Pose from the most recently delivered confirmation, if any.
    pub last_known_transform: Option<Transform3d>,
    /// Current lifecycle state.
    pub state: BindingState,
    /// Number of confirmations received.
    pub updates: u64,
}

/// Result of a successful [`AnchorRegistry::confirm`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Confirmation {
    /// The node bound to the confirmed anchor.
    pub node: NodeId,
    /// State before the confirmation: [`Pending`](BindingState::Pending) for
    /// the first pose, [`Bound`](BindingState::Bound) for a refresh, and
    /// [`Stale`](BindingState::Stale) for a re-acquisition.
    pub previous: BindingState,
}

#[derive(Debug)]
struct Inner {
    bindings: HashMap<AnchorId, Binding>,
    by_node: HashMap<NodeId, AnchorId>,
    next_anchor: u64,
    tombstones: usize,
}

/// Thread-safe bidirectional map between anchors and scene nodes.
///
/// Each live anchor maps to exactly one node and each node is held by at most
/// one live anchor. No method panics on bad input; misuse is reported through
/// [`BindingError`] or an `Option`.
#[derive(Debug)]
pub struct AnchorRegistry {
    inner: Mutex<Inner>,
}

impl Default for AnchorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AnchorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                bindings: HashMap::new(),
                by_node: HashMap::new(),
                next_anchor: 1,
                tombstones: 0,
            }),
        }
    }

    /// Allocates a fresh anchor id and records a [`Pending`](BindingState::Pending)
    /// binding for `node`.
    ///
    /// Fails with [`BindingError::DuplicateNode`] if `node` already has a live
    /// binding; the registry is left unchanged in that case.
    pub fn create_pending(&self, node: NodeId) -> Result<AnchorId, BindingError> {
        let mut inner = self.inner.lock();
        if let Some(&existing) = inner.by_node.get(&node) {
            return Err(BindingError::DuplicateNode { node, existing });
        }

        let anchor = AnchorId(inner.next_anchor);
        inner.next_anchor += 1;
        inner.by_node.insert(node, anchor);
        inner.bindings.insert(
            anchor,
            Binding {
                anchor,
                node,
                last_known_transform: None,
                state: BindingState::Pending,
                updates: 0,
            },
        );
        Ok(anchor)
    }

    /// Records a pose for `anchor` and moves it to [`Bound`](BindingState::Bound).
    ///
    /// Accepts `Pending`, `Bound` and `Stale` bindings. Fails with
    /// [`BindingError::UnknownAnchor`] if the anchor was never created here or
    /// has already been removed; the registry is left unchanged in that case.
    pub fn confirm(
        &self,
        anchor: AnchorId,
        transform: Transform3d,
    ) -> Result<Confirmation, BindingError> {
        let mut inner = self.inner.lock();
        let binding = inner
            .bindings
            .get_mut(&anchor)
            .filter(|b| b.state.is_live())
            .ok_or(BindingError::UnknownAnchor(anchor))?;

        let previous = binding.state;
        binding.state = BindingState::Bound;
        binding.last_known_transform = Some(transform);
        binding.updates += 1;
        Ok(Confirmation {
            node: binding.node,
            previous,
        })
    }

    /// Moves a [`Bound`](BindingState::Bound) binding to
    /// [`Stale`](BindingState::Stale).
    ///
    /// Returns the binding's node if the state changed. `Stale`, `Removed`
    /// and `Pending` bindings are left alone and yield `Ok(None)`. Fails with
    /// [`BindingError::UnknownAnchor`] only for ids this registry has no
    /// record of.
    pub fn mark_stale(&self, anchor: AnchorId) -> Result<Option<NodeId>, BindingError> {
        let mut inner = self.inner.lock();
        let binding = inner
            .bindings
            .get_mut(&anchor)
            .ok_or(BindingError::UnknownAnchor(anchor))?;
        if binding.state == BindingState::Bound {
            binding.state = BindingState::Stale;
            Ok(Some(binding.node))
        } else {
            Ok(None)
        }
    }

    /// Moves any live binding to [`Removed`](BindingState::Removed) and
    /// returns its node.
    ///
    /// Returns `None` for unknown or already-removed anchors, so repeated calls
    /// are harmless.
    pub fn remove(&self, anchor: AnchorId) -> Option<NodeId> {
        self.remove_binding(anchor).map(|b| b.node)
    }

    /// Like [`remove`](Self::remove), but returns the snapshot taken just
    /// before removal so the caller can tell whether the node was in the scene.
    pub fn remove_binding(&self, anchor: AnchorId) -> Option<Binding> {
        let mut inner = self.inner.lock();
        let binding = inner.bindings.get_mut(&anchor)?;
        if !binding.state.is_live() {
            return None;
        }
        let before = *binding;
        binding.state = BindingState::Removed;
        inner.by_node.remove(&before.node);
        inner.tombstones += 1;
        Some(before)
    }

    /// Returns a snapshot of the binding for `anchor`, including tombstones.
    #[must_use]
    pub fn lookup(&self, anchor: AnchorId) -> Option<Binding> {
        self.inner.lock().bindings.get(&anchor).copied()
    }

    /// Returns a snapshot of the live binding that holds `node`, if any.
    #[must_use]
    pub fn lookup_by_node(&self, node: NodeId) -> Option<Binding> {
        let inner = self.inner.lock();
        let anchor = inner.by_node.get(&node)?;
        inner.bindings.get(anchor).copied()
    }

    /// Returns snapshots of all live bindings, ordered by anchor id.
    #[must_use]
    pub fn bindings(&self) -> Vec<Binding> {
        let inner = self.inner.lock();
        let mut out: Vec<Binding> = inner
            .bindings
            .values()
            .filter(|b| b.state.is_live())
            .copied()
            .collect();
        out.sort_by_key(|b| b.anchor);
        out
    }

    /// Returns the number of live bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().by_node.len()
    }

    /// Returns whether there are no live bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of removed bindings not yet collected.
    #[must_use]
    pub fn tombstones(&self) -> usize {
        self.inner.lock().tombstones
    }

    /// Drops all [`Removed`](BindingState::Removed) bindings and returns how
    /// many were dropped.
    ///
    /// Afterwards, events for the dropped anchors are indistinguishable from
    /// events for ids that were never created.
    pub fn collect_garbage(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.bindings.retain(|_, b| b.state.is_live());
        core::mem::take(&mut inner.tombstones)
    }

    /// Returns a read-only view of this registry.
    #[must_use]
    pub fn view(&self) -> RegistryView<'_> {
        RegistryView { registry: self }
    }
}

/// Read-only access to an [`AnchorRegistry`].
///
/// Handed out by [`SceneBinder::registry`](crate::binder::SceneBinder::registry)
/// so callers can poll bindings without changing them behind the renderer's
/// back.
#[derive(Clone, Copy, Debug)]
pub struct RegistryView<'a> {
    registry: &'a AnchorRegistry,
}

impl RegistryView<'_> {
    /// See [`AnchorRegistry::lookup`].
    #[must_use]
    pub fn lookup(&self, anchor: AnchorId) -> Option<Binding> {
        self.registry.lookup(anchor)
    }

    /// See [`AnchorRegistry::lookup_by_node`].
    #[must_use]
    pub fn lookup_by_node(&self, node: NodeId) -> Option<Binding> {
        self.registry.lookup_by_node(node)
    }

    /// See [`AnchorRegistry::bindings`].
    #[must_use]
    pub fn bindings(&self) -> Vec<Binding> {
        self.registry.bindings()
    }

    /// See [`AnchorRegistry::len`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// See [`AnchorRegistry::is_empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// See [`AnchorRegistry::tombstones`].
    #[must_use]
    pub fn tombstones(&self) -> usize {
        self.registry.tombstones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use proptest::prelude::*;

    fn pose(x: f64) -> Transform3d {
        Transform3d::from_translation(x, 0.0, -1.0)
    }

    #[test]
    fn create_pending_allocates_fresh_ids() {
        let reg = AnchorRegistry::new();
        let a = reg.create_pending(NodeId(1)).unwrap();
        let b = reg.create_pending(NodeId(2)).unwrap();
        assert_ne!(a, b);
        assert_eq!(reg.len(), 2);

        let binding = reg.lookup(a).unwrap();
        assert_eq!(binding.node, NodeId(1));
        assert_eq!(binding.state, BindingState::Pending);
        assert_eq!(binding.last_known_transform, None);
    }

    #[test]
    fn duplicate_node_leaves_registry_unchanged() {
        let reg = AnchorRegistry::new();
        let a = reg.create_pending(NodeId(42)).unwrap();
        let err = reg.create_pending(NodeId(42)).unwrap_err();
        assert_eq!(
            err,
            BindingError::DuplicateNode {
                node: NodeId(42),
                existing: a,
            }
        );
        assert_eq!(reg.len(), 1);
        let binding = reg.lookup_by_node(NodeId(42)).unwrap();
        assert_eq!(binding.anchor, a);
        assert_eq!(binding.state, BindingState::Pending);
        assert_eq!(binding.last_known_transform, None);
    }

    #[test]
    fn confirm_binds_then_refreshes() {
        let reg = AnchorRegistry::new();
        let a = reg.create_pending(NodeId(3)).unwrap();

        let first = reg.confirm(a, pose(1.0)).unwrap();
        assert_eq!(first.previous, BindingState::Pending);
        assert_eq!(first.node, NodeId(3));

        let second = reg.confirm(a, pose(2.0)).unwrap();
        assert_eq!(second.previous, BindingState::Bound);

        let binding = reg.lookup(a).unwrap();
        assert_eq!(binding.state, BindingState::Bound);
        assert_eq!(binding.last_known_transform, Some(pose(2.0)));
        assert_eq!(binding.updates, 2);
    }

    #[test]
    fn confirm_unknown_does_not_grow_registry() {
        let reg = AnchorRegistry::new();
        reg.create_pending(NodeId(1)).unwrap();
        let err = reg.confirm(AnchorId(99), pose(0.0)).unwrap_err();
        assert_eq!(err, BindingError::UnknownAnchor(AnchorId(99)));
        assert_eq!(reg.len(), 1);
        assert!(reg.lookup(AnchorId(99)).is_none());
    }

    #[test]
    fn confirm_after_remove_is_unknown() {
        let reg = AnchorRegistry::new();
        let a = reg.create_pending(NodeId(1)).unwrap();
        reg.confirm(a, pose(0.0)).unwrap();
        reg.remove(a);
        assert_eq!(
            reg.confirm(a, pose(5.0)),
            Err(BindingError::UnknownAnchor(a))
        );
        let tomb = reg.lookup(a).unwrap();
        assert_eq!(tomb.state, BindingState::Removed);
        assert_eq!(tomb.last_known_transform, Some(pose(0.0)));
    }

    #[test]
    fn mark_stale_transitions_only_bound() {
        let reg = AnchorRegistry::new();
        let a = reg.create_pending(NodeId(1)).unwrap();
        assert_eq!(reg.mark_stale(a), Ok(None), "pending has nothing to lose");

        reg.confirm(a, pose(0.0)).unwrap();
        assert_eq!(reg.mark_stale(a), Ok(Some(NodeId(1))));
        assert_eq!(reg.mark_stale(a), Ok(None), "already stale");
        assert_eq!(reg.lookup(a).unwrap().state, BindingState::Stale);

        reg.remove(a);
        assert_eq!(reg.mark_stale(a), Ok(None), "removed is a no-op");
        assert_eq!(
            reg.mark_stale(AnchorId(77)),
            Err(BindingError::UnknownAnchor(AnchorId(77)))
        );
    }

    #[test]
    fn stale_binding_keeps_transform_until_reacquired() {
        let reg = AnchorRegistry::new();
        let a = reg.create_pending(NodeId(1)).unwrap();
        reg.confirm(a, pose(1.0)).unwrap();
        reg.mark_stale(a).unwrap();
        assert_eq!(reg.lookup(a).unwrap().last_known_transform, Some(pose(1.0)));

        let c = reg.confirm(a, pose(4.0)).unwrap();
        assert_eq!(c.previous, BindingState::Stale);
        let binding = reg.lookup(a).unwrap();
        assert_eq!(binding.state, BindingState::Bound);
        assert_eq!(binding.last_known_transform, Some(pose(4.0)));
    }

    #[test]
    fn remove_is_idempotent() {
        let reg = AnchorRegistry::new();
        let a = reg.create_pending(NodeId(8)).unwrap();
        assert_eq!(reg.remove(a), Some(NodeId(8)));
        assert_eq!(reg.remove(a), None);
        assert_eq!(reg.remove(AnchorId(1234)), None);
        assert!(reg.is_empty());
        assert!(reg.lookup_by_node(NodeId(8)).is_none());
    }

    #[test]
    fn remove_binding_reports_prior_state() {
        let reg = AnchorRegistry::new();
        let a = reg.create_pending(NodeId(1)).unwrap();
        reg.confirm(a, pose(0.0)).unwrap();
        reg.mark_stale(a).unwrap();
        let before = reg.remove_binding(a).unwrap();
        assert_eq!(before.state, BindingState::Stale);
        assert!(before.state.is_in_scene());
    }

    #[test]
    fn node_can_be_reanchored_with_a_fresh_id() {
        let reg = AnchorRegistry::new();
        let first = reg.create_pending(NodeId(5)).unwrap();
        reg.remove(first);
        let second = reg.create_pending(NodeId(5)).unwrap();
        assert_ne!(first, second);
        assert_eq!(reg.lookup_by_node(NodeId(5)).unwrap().anchor, second);
        assert_eq!(reg.lookup(first).unwrap().state, BindingState::Removed);
    }

    #[test]
    fn collect_garbage_drops_tombstones_only() {
        let reg = AnchorRegistry::new();
        let a = reg.create_pending(NodeId(1)).unwrap();
        let b = reg.create_pending(NodeId(2)).unwrap();
        reg.remove(a);
        assert_eq!(reg.tombstones(), 1);
        assert_eq!(reg.collect_garbage(), 1);
        assert_eq!(reg.tombstones(), 0);
        assert!(reg.lookup(a).is_none());
        assert_eq!(reg.mark_stale(a), Err(BindingError::UnknownAnchor(a)));
        assert!(reg.lookup(b).is_some());
        assert_eq!(reg.collect_garbage(), 0);
    }

    #[test]
    fn view_reads_through_to_registry() {
        let reg = AnchorRegistry::new();
        let view = reg.view();
        assert!(view.is_empty());

        let a = reg.create_pending(NodeId(4)).unwrap();
        reg.confirm(a, pose(1.0)).unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(view.lookup_by_node(NodeId(4)).map(|b| b.anchor), Some(a));
        assert_eq!(view.bindings(), reg.bindings());

        reg.remove(a);
        assert_eq!(view.lookup(a).unwrap().state, BindingState::Removed);
        assert_eq!(view.tombstones(), 1);
    }

    #[test]
    fn bindings_are_sorted_and_live() {
        let reg = AnchorRegistry::new();
        let a = reg.create_pending(NodeId(30)).unwrap();
        let b = reg.create_pending(NodeId(10)).unwrap();
        let c = reg.create_pending(NodeId(20)).unwrap();
        reg.remove(b);
        let anchors: Vec<_> = reg.bindings().iter().map(|b| b.anchor).collect();
        assert_eq!(anchors, vec![a, c]);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Create(u64),
        Confirm(u64),
        Stale(u64),
        Remove(u64),
        Collect,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0_u64..6).prop_map(Op::Create),
            (0_u64..12).prop_map(Op::Confirm),
            (0_u64..12).prop_map(Op::Stale),
            (0_u64..12).prop_map(Op::Remove),
            Just(Op::Collect),
        ]
    }

    fn assert_bijective(reg: &AnchorRegistry) {
        let live = reg.bindings();
        let nodes: HashSet<NodeId> = live.iter().map(|b| b.node).collect();
        assert_eq!(nodes.len(), live.len(), "a node is bound to two anchors");
        assert_eq!(reg.len(), live.len(), "node index out of sync");
        for b in &live {
            let back = reg.lookup_by_node(b.node).expect("live node must be indexed");
            assert_eq!(back.anchor, b.anchor, "reverse lookup disagrees");
        }
    }

    proptest! {
        #[test]
        fn mapping_stays_bijective(ops in proptest::collection::vec(op(), 0..64)) {
            let reg = AnchorRegistry::new();
            for op in ops {
                match op {
                    Op::Create(n) => {
                        let had = reg.lookup_by_node(NodeId(n)).is_some();
                        let res = reg.create_pending(NodeId(n));
                        prop_assert_eq!(res.is_err(), had);
                    }
                    Op::Confirm(a) => {
                        let before = reg.len();
                        let _ = reg.confirm(AnchorId(a), Transform3d::IDENTITY);
                        prop_assert_eq!(reg.len(), before);
                    }
                    Op::Stale(a) => {
                        let _ = reg.mark_stale(AnchorId(a));
                    }
                    Op::Remove(a) => {
                        if reg.remove(AnchorId(a)).is_some() {
                            prop_assert_eq!(reg.remove(AnchorId(a)), None);
                        }
                    }
                    Op::Collect => {
                        reg.collect_garbage();
                    }
                }
                assert_bijective(&reg);
            }
        }
    }
}
