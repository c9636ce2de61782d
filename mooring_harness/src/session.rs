// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted stand-in for a platform tracking session.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::trace;

use mooring_core::binder::SceneBinder;
use mooring_core::id::AnchorId;
use mooring_core::session::{SceneRenderer, TrackingSession};
use mooring_core::transform::Transform3d;

/// A request the binder sent to the tracking session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrackingRequest {
    /// `request_anchor_creation`.
    Create(AnchorId, Transform3d),
    /// `request_anchor_removal`.
    Remove(AnchorId),
}

/// A callback a tracking session delivers to the binder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrackingEvent {
    /// `on_anchor_updated`.
    Updated(AnchorId, Transform3d),
    /// `on_anchor_removed`.
    Removed(AnchorId),
    /// `on_tracking_lost`.
    Lost(AnchorId),
}

impl TrackingEvent {
    /// Returns the anchor this event is about.
    #[must_use]
    pub const fn anchor(&self) -> AnchorId {
        match *self {
            Self::Updated(a, _) | Self::Removed(a) | Self::Lost(a) => a,
        }
    }

    /// Delivers this event to `binder`.
    pub fn deliver_to<T: TrackingSession, R: SceneRenderer>(self, binder: &SceneBinder<T, R>) {
        trace!(?self, "delivering tracking event");
        match self {
            Self::Updated(anchor, t) => binder.on_anchor_updated(anchor, t),
            Self::Removed(anchor) => binder.on_anchor_removed(anchor),
            Self::Lost(anchor) => binder.on_tracking_lost(anchor),
        }
    }
}

/// Delivers `events` to `binder` in order.
pub fn deliver_all<T: TrackingSession, R: SceneRenderer>(
    binder: &SceneBinder<T, R>,
    events: impl IntoIterator<Item = TrackingEvent>,
) {
    for event in events {
        event.deliver_to(binder);
    }
}

/// A [`TrackingSession`] that queues every request for the test to act on.
///
/// Nothing is delivered on its own. Tests either drain the queue with
/// [`take_requests`](Self::take_requests) and script the callbacks, or call
/// [`pump`](Self::pump) to answer every queued request the way a healthy
/// session would.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    queue: Mutex<VecDeque<TrackingRequest>>,
    history: Mutex<Vec<TrackingRequest>>,
}

impl ScriptedSession {
    /// Creates a session with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns all queued requests.
    pub fn take_requests(&self) -> Vec<TrackingRequest> {
        self.queue.lock().drain(..).collect()
    }

    /// Returns every request ever received, including drained ones.
    #[must_use]
    pub fn history(&self) -> Vec<TrackingRequest> {
        self.history.lock().clone()
    }

    /// Returns the number of queued requests.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.lock().len()
    }

    /// Answers every queued request: creations are confirmed at the requested
    /// pose and removals are reported as done.
    ///
    /// Returns the number of requests answered. Requests queued while pumping
    /// are left for the next call.
    pub fn pump<R: SceneRenderer>(binder: &SceneBinder<Self, R>) -> usize {
        let requests = binder.tracking().take_requests();
        let answered = requests.len();
        for request in requests {
            match request {
                TrackingRequest::Create(anchor, t) => binder.on_anchor_updated(anchor, t),
                TrackingRequest::Remove(anchor) => binder.on_anchor_removed(anchor),
            }
        }
        answered
    }

    fn push(&self, request: TrackingRequest) {
        self.history.lock().push(request);
        self.queue.lock().push_back(request);
    }
}

impl TrackingSession for ScriptedSession {
    fn request_anchor_creation(&self, anchor: AnchorId, world_transform: Transform3d) {
        self.push(TrackingRequest::Create(anchor, world_transform));
    }

    fn request_anchor_removal(&self, anchor: AnchorId) {
        self.push(TrackingRequest::Remove(anchor));
    }
}
