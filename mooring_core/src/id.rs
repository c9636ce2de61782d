// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Anchor and node identity types.

use core::fmt;

/// Identifies a spatial anchor known to the tracking session.
///
/// Anchor ids are allocated by the [`AnchorRegistry`](crate::registry::AnchorRegistry)
/// from a monotonically increasing counter, so an id is never handed out twice
/// by the same registry. Once the binding it names is removed the id is dead
/// for good; re-anchoring a node always yields a fresh id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnchorId(pub u64);

impl AnchorId {
    /// Returns the raw value (for diagnostics and recording).
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnchorId({})", self.0)
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anchor#{}", self.0)
    }
}

/// An opaque reference to a renderable scene node.
///
/// Nodes are created and managed externally (by the application or the
/// renderer). Core code passes them through without interpreting the value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Returns the raw value (for diagnostics and recording).
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}
