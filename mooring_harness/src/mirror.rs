// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A renderer double that keeps a model of the scene it was told to build.

use std::collections::BTreeMap;

use mooring_core::id::NodeId;
use mooring_core::registry::{BindingState, RegistryView};
use mooring_core::session::{SceneCommand, SceneRenderer};
use mooring_core::transform::Transform3d;

/// What the mirror knows about one node in the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MirrorNode {
    /// Transform from the last add or update.
    pub transform: Transform3d,
    /// Visibility from the last `set_node_visible` (true after add).
    pub visible: bool,
}

/// A command that made no sense for the current scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SceneViolation {
    /// `add_node` for a node already in the scene.
    DoubleAdd(NodeId),
    /// A command other than `add_node` for a node not in the scene.
    Dangling(SceneCommand),
}

/// A difference between the mirror and the registry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mismatch {
    /// The registry says the node is in the scene but the mirror lacks it.
    Missing(NodeId),
    /// The mirror holds a node the registry does not consider in the scene.
    Leaked(NodeId),
    /// The mirror's transform differs from the binding's last known one.
    Transform(NodeId),
    /// The mirror's visibility differs from the binding state.
    Visibility(NodeId),
}

/// A [`SceneRenderer`] that logs every command and maintains a model of the
/// resulting scene.
#[derive(Clone, Debug, Default)]
pub struct MirrorRenderer {
    nodes: BTreeMap<NodeId, MirrorNode>,
    log: Vec<SceneCommand>,
    violations: Vec<SceneViolation>,
}

impl MirrorRenderer {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the nodes currently in the scene.
    #[must_use]
    pub fn nodes(&self) -> &BTreeMap<NodeId, MirrorNode> {
        &self.nodes
    }

    /// Returns one node, if it is in the scene.
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<MirrorNode> {
        self.nodes.get(&node).copied()
    }

    /// Returns every command received, in order.
    #[must_use]
    pub fn log(&self) -> &[SceneCommand] {
        &self.log
    }

    /// Returns the commands that did not fit the scene.
    #[must_use]
    pub fn violations(&self) -> &[SceneViolation] {
        &self.violations
    }

    /// Compares the scene with `registry`.
    ///
    /// Every `Bound` or `Stale` binding must have its node in the scene at
    /// its last known transform, and no other node may be present. When
    /// `hides_stale` is set, stale nodes must be hidden and bound nodes
    /// visible.
    #[must_use]
    pub fn mismatches(&self, registry: RegistryView<'_>, hides_stale: bool) -> Vec<Mismatch> {
        let mut out = Vec::new();
        let in_scene: BTreeMap<NodeId, _> = registry
            .bindings()
            .into_iter()
            .filter(|b| b.state.is_in_scene())
            .map(|b| (b.node, b))
            .collect();

        for (node, binding) in &in_scene {
            let Some(mirror) = self.nodes.get(node) else {
                out.push(Mismatch::Missing(*node));
                continue;
            };
            if binding.last_known_transform != Some(mirror.transform) {
                out.push(Mismatch::Transform(*node));
            }
            if hides_stale && mirror.visible != (binding.state == BindingState::Bound) {
                out.push(Mismatch::Visibility(*node));
            }
        }
        out.extend(
            self.nodes
                .keys()
                .filter(|n| !in_scene.contains_key(n))
                .map(|n| Mismatch::Leaked(*n)),
        );
        out
    }

    fn record(&mut self, command: SceneCommand) {
        self.log.push(command);
        let node = command.node();
        let present = self.nodes.contains_key(&node);
        match command {
            SceneCommand::AddNode(_, transform) => {
                if present {
                    self.violations.push(SceneViolation::DoubleAdd(node));
                }
                self.nodes.insert(
                    node,
                    MirrorNode {
                        transform,
                        visible: true,
                    },
                );
            }
            _ if !present => self.violations.push(SceneViolation::Dangling(command)),
            SceneCommand::UpdateNodeTransform(_, transform) => {
                if let Some(n) = self.nodes.get_mut(&node) {
                    n.transform = transform;
                }
            }
            SceneCommand::RemoveNode(_) => {
                self.nodes.remove(&node);
            }
            SceneCommand::SetNodeVisible(_, visible) => {
                if let Some(n) = self.nodes.get_mut(&node) {
                    n.visible = visible;
                }
            }
        }
    }
}

impl SceneRenderer for MirrorRenderer {
    fn add_node(&mut self, node: NodeId, transform: Transform3d) {
        self.record(SceneCommand::AddNode(node, transform));
    }

    fn update_node_transform(&mut self, node: NodeId, transform: Transform3d) {
        self.record(SceneCommand::UpdateNodeTransform(node, transform));
    }

    fn remove_node(&mut self, node: NodeId) {
        self.record(SceneCommand::RemoveNode(node));
    }

    fn set_node_visible(&mut self, node: NodeId, visible: bool) {
        self.record(SceneCommand::SetNodeVisible(node, visible));
    }
}
