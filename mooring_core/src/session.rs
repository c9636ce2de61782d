// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator contract for platform integrations.
//!
//! A [`SceneBinder`](crate::binder::SceneBinder) sits between two external
//! subsystems:
//!
//! - **Tracking session** — Creates and removes anchors on request and reports
//!   pose updates, tracking loss and removals back through the binder's
//!   `on_*` methods. Implemented via [`TrackingSession`].
//!
//! - **Scene renderer** — Owns the drawable nodes. The binder is its only
//!   writer and only ever issues the four commands of [`SceneRenderer`]; it
//!   never reads the scene back.
//!
//! Both traits are deliberately small so that test doubles and recorded
//! sessions can stand in for a platform framework.

use crate::id::{AnchorId, NodeId};
use crate::transform::Transform3d;

/// Outbound requests to the tracking subsystem.
///
/// Calls may arrive from any thread that uses the binder, and never while the
/// binder holds one of its locks, so implementations are free to deliver
/// callbacks synchronously from inside these methods.
pub trait TrackingSession {
    /// Asks the session to start tracking `anchor` at `world_transform`.
    ///
    /// The first pose for the anchor is expected to arrive later through
    /// [`SceneBinder::on_anchor_updated`](crate::binder::SceneBinder::on_anchor_updated).
    fn request_anchor_creation(&self, anchor: AnchorId, world_transform: Transform3d);

    /// Asks the session to stop tracking `anchor`.
    ///
    /// Completion is reported through
    /// [`SceneBinder::on_anchor_removed`](crate::binder::SceneBinder::on_anchor_removed).
    fn request_anchor_removal(&self, anchor: AnchorId);
}

/// Scene-graph mutations issued by the binder.
pub trait SceneRenderer {
    /// Adds `node` to the scene at `transform`.
    fn add_node(&mut self, node: NodeId, transform: Transform3d);

    /// Moves a node previously added with [`add_node`](Self::add_node).
    fn update_node_transform(&mut self, node: NodeId, transform: Transform3d);

    /// Removes a node previously added with [`add_node`](Self::add_node).
    fn remove_node(&mut self, node: NodeId);

    /// Shows or hides a node without removing it.
    fn set_node_visible(&mut self, node: NodeId, visible: bool);
}

/// One scene-graph mutation, as a value.
///
/// Used by diagnostics and by renderers that queue commands for a render
/// thread instead of applying them in place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SceneCommand {
    /// See [`SceneRenderer::add_node`].
    AddNode(NodeId, Transform3d),
    /// See [`SceneRenderer::update_node_transform`].
    UpdateNodeTransform(NodeId, Transform3d),
    /// See [`SceneRenderer::remove_node`].
    RemoveNode(NodeId),
    /// See [`SceneRenderer::set_node_visible`].
    SetNodeVisible(NodeId, bool),
}

impl SceneCommand {
    /// Returns the node this command targets.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        match *self {
            Self::AddNode(node, _)
            | Self::UpdateNodeTransform(node, _)
            | Self::RemoveNode(node)
            | Self::SetNodeVisible(node, _) => node,
        }
    }

    /// Applies this command to a renderer.
    pub fn apply_to<R: SceneRenderer + ?Sized>(self, renderer: &mut R) {
        match self {
            Self::AddNode(node, t) => renderer.add_node(node, t),
            Self::UpdateNodeTransform(node, t) => renderer.update_node_transform(node, t),
            Self::RemoveNode(node) => renderer.remove_node(node),
            Self::SetNodeVisible(node, visible) => renderer.set_node_visible(node, visible),
        }
    }
}

impl SceneRenderer for Vec<SceneCommand> {
    fn add_node(&mut self, node: NodeId, transform: Transform3d) {
        self.push(SceneCommand::AddNode(node, transform));
    }

    fn update_node_transform(&mut self, node: NodeId, transform: Transform3d) {
        self.push(SceneCommand::UpdateNodeTransform(node, transform));
    }

    fn remove_node(&mut self, node: NodeId) {
        self.push(SceneCommand::RemoveNode(node));
    }

    fn set_node_visible(&mut self, node: NodeId, visible: bool) {
        self.push(SceneCommand::SetNodeVisible(node, visible));
    }
}
