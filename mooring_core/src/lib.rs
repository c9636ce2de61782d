// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding registry between tracked spatial anchors and renderable scene nodes.
//!
//! `mooring_core` is the coordination layer between a *tracking session*
//! (which creates, re-poses, loses and removes anchors asynchronously) and a
//! *scene renderer* (which owns the drawable nodes). It does no tracking and
//! no rendering itself; it keeps the two worlds in agreement.
//!
//! # Architecture
//!
//! ```text
//!   Application                     Tracking session
//!       │ place_object / detach          ▲        │ on_anchor_updated
//!       ▼                                │        │ on_anchor_removed
//!   SceneBinder ── request_anchor_* ─────┘        │ on_tracking_lost
//!       │  ▲                                      │
//!       │  └──────────────────────────────────────┘
//!       ▼
//!   AnchorRegistry (Pending → Bound ⇄ Stale → Removed)
//!       │
//!       ▼
//!   SceneRenderer::add_node / update_node_transform / set_node_visible / remove_node
//! ```
//!
//! **[`registry`]** — The [`AnchorRegistry`](registry::AnchorRegistry):
//! a lock-guarded bidirectional map from [`AnchorId`](id::AnchorId) to
//! [`NodeId`](id::NodeId) and the only place binding state changes.
//!
//! **[`binder`]** — The [`SceneBinder`](binder::SceneBinder), which accepts
//! application requests and tracking callbacks and turns registry transitions
//! into scene commands.
//!
//! **[`session`]** — The [`TrackingSession`](session::TrackingSession) and
//! [`SceneRenderer`](session::SceneRenderer) traits implemented by platform
//! integrations and test doubles.
//!
//! **[`config`]** — [`BinderConfig`](config::BinderConfig) presets.
//!
//! **[`error`]** — [`BindingError`](error::BindingError).
//!
//! **[`transform`]** — 3D affine transform type and the rigid-pose check.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! binding diagnostics.

pub mod binder;
pub mod config;
pub mod error;
pub mod id;
pub mod registry;
pub mod session;
pub mod trace;
pub mod transform;
