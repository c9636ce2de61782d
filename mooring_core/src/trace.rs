// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics for the binding layer.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`SceneBinder`](crate::binder::SceneBinder) calls as it places objects,
//! moves bindings between states, issues scene commands and absorbs benign
//! races. All method bodies default to no-ops, so implementing only the events
//! you care about is fine.
//!
//! Every event carries a sequence number assigned by the binder. Numbers are
//! strictly increasing in the order the binder observed the events, across all
//! calling threads.
//!
//! Sinks compose: `(A, B)` forwards every event to both halves, and
//! `Arc<Mutex<S>>` lets the caller keep a handle to a sink that the binder
//! owns.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::BindingError;
use crate::id::{AnchorId, NodeId};
use crate::registry::BindingState;
use crate::session::SceneCommand;
use crate::transform::{Transform3d, TransformDefect};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why an inbound event or request was absorbed without effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IgnoreReason {
    /// The tracking session reported an anchor this registry does not hold
    /// (never created here, or already removed locally).
    UnknownAnchor,
    /// A pose update failed the rigid-pose check and was dropped.
    MalformedUpdate(TransformDefect),
    /// `detach` named a node without a live binding.
    NoBinding,
}

/// Which application request caused a detach.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetachKind {
    /// Asynchronous: cleanup waits for the tracking session's removal callback.
    Requested,
    /// Local removal first; the tracking session is told afterwards.
    Forced,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when `place_object` records a pending binding.
#[derive(Clone, Copy, Debug)]
pub struct PlacedEvent {
    /// Sequence number.
    pub seq: u64,
    /// Newly allocated anchor.
    pub anchor: AnchorId,
    /// Node being placed.
    pub node: NodeId,
    /// Requested world transform.
    pub transform: Transform3d,
}

/// Emitted when `place_object` is refused.
#[derive(Clone, Copy, Debug)]
pub struct RejectedEvent {
    /// Sequence number.
    pub seq: u64,
    /// Node that could not be placed.
    pub node: NodeId,
    /// Error returned to the application.
    pub error: BindingError,
}

/// Emitted when a binding changes state.
#[derive(Clone, Copy, Debug)]
pub struct TransitionEvent {
    /// Sequence number.
    pub seq: u64,
    /// Anchor side of the binding.
    pub anchor: AnchorId,
    /// Node side of the binding.
    pub node: NodeId,
    /// State before the transition.
    pub from: BindingState,
    /// State after the transition.
    pub to: BindingState,
}

/// Emitted for every command issued to the scene renderer.
#[derive(Clone, Copy, Debug)]
pub struct CommandEvent {
    /// Sequence number.
    pub seq: u64,
    /// Anchor whose binding caused the command.
    pub anchor: AnchorId,
    /// The command.
    pub command: SceneCommand,
}

/// Emitted when the application detaches a node.
#[derive(Clone, Copy, Debug)]
pub struct DetachEvent {
    /// Sequence number.
    pub seq: u64,
    /// Anchor being released.
    pub anchor: AnchorId,
    /// Node being detached.
    pub node: NodeId,
    /// Requested or forced.
    pub kind: DetachKind,
}

/// Emitted when an event or request is absorbed without effect.
#[derive(Clone, Copy, Debug)]
pub struct IgnoredEvent {
    /// Sequence number.
    pub seq: u64,
    /// Anchor named by the event, if any.
    pub anchor: Option<AnchorId>,
    /// Node named by the request, if any.
    pub node: Option<NodeId>,
    /// Why nothing happened.
    pub reason: IgnoreReason,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives diagnostics events from the binder.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after a pending binding is recorded.
    fn on_placed(&mut self, e: &PlacedEvent) {
        _ = e;
    }

    /// Called when a placement is refused.
    fn on_rejected(&mut self, e: &RejectedEvent) {
        _ = e;
    }

    /// Called when a binding changes state.
    fn on_transition(&mut self, e: &TransitionEvent) {
        _ = e;
    }

    /// Called for every scene command.
    fn on_command(&mut self, e: &CommandEvent) {
        _ = e;
    }

    /// Called when the application detaches a node.
    fn on_detach(&mut self, e: &DetachEvent) {
        _ = e;
    }

    /// Called when an event is absorbed.
    fn on_ignored(&mut self, e: &IgnoredEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// Sink adapters
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

impl<A: TraceSink, B: TraceSink> TraceSink for (A, B) {
    fn on_placed(&mut self, e: &PlacedEvent) {
        self.0.on_placed(e);
        self.1.on_placed(e);
    }

    fn on_rejected(&mut self, e: &RejectedEvent) {
        self.0.on_rejected(e);
        self.1.on_rejected(e);
    }

    fn on_transition(&mut self, e: &TransitionEvent) {
        self.0.on_transition(e);
        self.1.on_transition(e);
    }

    fn on_command(&mut self, e: &CommandEvent) {
        self.0.on_command(e);
        self.1.on_command(e);
    }

    fn on_detach(&mut self, e: &DetachEvent) {
        self.0.on_detach(e);
        self.1.on_detach(e);
    }

    fn on_ignored(&mut self, e: &IgnoredEvent) {
        self.0.on_ignored(e);
        self.1.on_ignored(e);
    }
}

impl<S: TraceSink + ?Sized> TraceSink for Arc<Mutex<S>> {
    fn on_placed(&mut self, e: &PlacedEvent) {
        self.lock().on_placed(e);
    }

    fn on_rejected(&mut self, e: &RejectedEvent) {
        self.lock().on_rejected(e);
    }

    fn on_transition(&mut self, e: &TransitionEvent) {
        self.lock().on_transition(e);
    }

    fn on_command(&mut self, e: &CommandEvent) {
        self.lock().on_command(e);
    }

    fn on_detach(&mut self, e: &DetachEvent) {
        self.lock().on_detach(e);
    }

    fn on_ignored(&mut self, e: &IgnoredEvent) {
        self.lock().on_ignored(e);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        commands: Vec<u64>,
        ignored: usize,
    }

    impl TraceSink for Counting {
        fn on_command(&mut self, e: &CommandEvent) {
            self.commands.push(e.seq);
        }

        fn on_ignored(&mut self, _e: &IgnoredEvent) {
            self.ignored += 1;
        }
    }

    fn command(seq: u64) -> CommandEvent {
        CommandEvent {
            seq,
            anchor: AnchorId(1),
            command: SceneCommand::RemoveNode(NodeId(2)),
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_command(&command(0));
        sink.on_ignored(&IgnoredEvent {
            seq: 1,
            anchor: Some(AnchorId(9)),
            node: None,
            reason: IgnoreReason::UnknownAnchor,
        });
    }

    #[test]
    fn pair_forwards_to_both() {
        let mut pair = (Counting::default(), Counting::default());
        pair.on_command(&command(3));
        pair.on_placed(&PlacedEvent {
            seq: 4,
            anchor: AnchorId(1),
            node: NodeId(1),
            transform: Transform3d::IDENTITY,
        });
        assert_eq!(pair.0.commands, [3]);
        assert_eq!(pair.1.commands, [3]);
    }

    #[test]
    fn shared_sink_is_observable_by_the_caller() {
        let shared = Arc::new(Mutex::new(Counting::default()));
        let mut handle = Arc::clone(&shared);
        handle.on_ignored(&IgnoredEvent {
            seq: 0,
            anchor: None,
            node: Some(NodeId(7)),
            reason: IgnoreReason::NoBinding,
        });
        assert_eq!(shared.lock().ignored, 1);
    }
}
