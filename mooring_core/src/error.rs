// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy for binding operations.
//!
//! None of these are fatal. [`BindingError::DuplicateNode`] and
//! [`BindingError::MalformedTransform`] are returned to the application from
//! [`SceneBinder::place_object`](crate::binder::SceneBinder::place_object).
//! [`BindingError::UnknownAnchor`] is the benign race between the tracking
//! session and local detaches; the binder logs and absorbs it.

use crate::id::{AnchorId, NodeId};
use crate::transform::TransformDefect;

/// An error from an [`AnchorRegistry`](crate::registry::AnchorRegistry) or
/// [`SceneBinder`](crate::binder::SceneBinder) operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    /// The node already has a live (non-removed) binding.
    #[error("{node} is already anchored by {existing}")]
    DuplicateNode {
        /// The node that was asked to be placed.
        node: NodeId,
        /// The anchor that currently holds it.
        existing: AnchorId,
    },
    /// No live binding exists for this anchor.
    #[error("no live binding for {0}")]
    UnknownAnchor(AnchorId),
    /// The transform is not a well-formed rigid pose.
    #[error("malformed transform: {0}")]
    MalformedTransform(#[from] TransformDefect),
}
