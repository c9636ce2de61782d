// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records. [`decode`] reads them back as an
//! iterator of [`RecordedEvent`].
//!
//! Each record starts with a one-byte tag followed by the event's sequence
//! number. Transforms are stored as all sixteen column-major `f64` elements.

use mooring_core::error::BindingError;
use mooring_core::id::{AnchorId, NodeId};
use mooring_core::registry::BindingState;
use mooring_core::session::SceneCommand;
use mooring_core::trace::{
    CommandEvent, DetachEvent, DetachKind, IgnoreReason, IgnoredEvent, PlacedEvent, RejectedEvent,
    TraceSink, TransitionEvent,
};
use mooring_core::transform::{Transform3d, TransformDefect};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PLACED: u8 = 1;
const TAG_REJECTED: u8 = 2;
const TAG_TRANSITION: u8 = 3;
const TAG_COMMAND: u8 = 4;
const TAG_DETACH: u8 = 5;
const TAG_IGNORED: u8 = 6;

const CMD_ADD: u8 = 0;
const CMD_UPDATE: u8 = 1;
const CMD_REMOVE: u8 = 2;
const CMD_VISIBLE: u8 = 3;

const ERR_DUPLICATE_NODE: u8 = 0;
const ERR_UNKNOWN_ANCHOR: u8 = 1;
const ERR_MALFORMED: u8 = 2;

const IGN_UNKNOWN_ANCHOR: u8 = 0;
const IGN_MALFORMED_UPDATE: u8 = 1;
const IGN_NO_BINDING: u8 = 2;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_option_u64(&mut self, v: Option<u64>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u64(val);
            }
            None => {
                self.write_u8(0);
                self.write_u64(0);
            }
        }
    }

    fn write_transform(&mut self, t: &Transform3d) {
        for v in t.cols.iter().flatten() {
            self.write_f64(*v);
        }
    }

    fn write_state(&mut self, s: BindingState) {
        self.write_u8(match s {
            BindingState::Pending => 0,
            BindingState::Bound => 1,
            BindingState::Stale => 2,
            BindingState::Removed => 3,
        });
    }

    fn write_defect(&mut self, d: TransformDefect) {
        self.write_u8(match d {
            TransformDefect::NonFinite => 0,
            TransformDefect::NotAffine => 1,
            TransformDefect::NotOrthonormal => 2,
            TransformDefect::Reflection => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_placed(&mut self, e: &PlacedEvent) {
        self.write_u8(TAG_PLACED);
        self.write_u64(e.seq);
        self.write_u64(e.anchor.get());
        self.write_u64(e.node.get());
        self.write_transform(&e.transform);
    }

    fn on_rejected(&mut self, e: &RejectedEvent) {
        self.write_u8(TAG_REJECTED);
        self.write_u64(e.seq);
        self.write_u64(e.node.get());
        match e.error {
            BindingError::DuplicateNode { existing, .. } => {
                self.write_u8(ERR_DUPLICATE_NODE);
                self.write_u64(existing.get());
            }
            BindingError::UnknownAnchor(anchor) => {
                self.write_u8(ERR_UNKNOWN_ANCHOR);
                self.write_u64(anchor.get());
            }
            BindingError::MalformedTransform(defect) => {
                self.write_u8(ERR_MALFORMED);
                self.write_defect(defect);
            }
        }
    }

    fn on_transition(&mut self, e: &TransitionEvent) {
        self.write_u8(TAG_TRANSITION);
        self.write_u64(e.seq);
        self.write_u64(e.anchor.get());
        self.write_u64(e.node.get());
        self.write_state(e.from);
        self.write_state(e.to);
    }

    fn on_command(&mut self, e: &CommandEvent) {
        self.write_u8(TAG_COMMAND);
        self.write_u64(e.seq);
        self.write_u64(e.anchor.get());
        match e.command {
            SceneCommand::AddNode(node, t) => {
                self.write_u8(CMD_ADD);
                self.write_u64(node.get());
                self.write_transform(&t);
            }
            SceneCommand::UpdateNodeTransform(node, t) => {
                self.write_u8(CMD_UPDATE);
                self.write_u64(node.get());
                self.write_transform(&t);
            }
            SceneCommand::RemoveNode(node) => {
                self.write_u8(CMD_REMOVE);
                self.write_u64(node.get());
            }
            SceneCommand::SetNodeVisible(node, visible) => {
                self.write_u8(CMD_VISIBLE);
                self.write_u64(node.get());
                self.write_u8(u8::from(visible));
            }
        }
    }

    fn on_detach(&mut self, e: &DetachEvent) {
        self.write_u8(TAG_DETACH);
        self.write_u64(e.seq);
        self.write_u64(e.anchor.get());
        self.write_u64(e.node.get());
        self.write_u8(match e.kind {
            DetachKind::Requested => 0,
            DetachKind::Forced => 1,
        });
    }

    fn on_ignored(&mut self, e: &IgnoredEvent) {
        self.write_u8(TAG_IGNORED);
        self.write_u64(e.seq);
        self.write_option_u64(e.anchor.map(AnchorId::get));
        self.write_option_u64(e.node.map(NodeId::get));
        match e.reason {
            IgnoreReason::UnknownAnchor => self.write_u8(IGN_UNKNOWN_ANCHOR),
            IgnoreReason::MalformedUpdate(defect) => {
                self.write_u8(IGN_MALFORMED_UPDATE);
                self.write_defect(defect);
            }
            IgnoreReason::NoBinding => self.write_u8(IGN_NO_BINDING),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PlacedEvent`].
    Placed(PlacedEvent),
    /// A [`RejectedEvent`].
    Rejected(RejectedEvent),
    /// A [`TransitionEvent`].
    Transition(TransitionEvent),
    /// A [`CommandEvent`].
    Command(CommandEvent),
    /// A [`DetachEvent`].
    Detach(DetachEvent),
    /// An [`IgnoredEvent`].
    Ignored(IgnoredEvent),
}

impl RecordedEvent {
    /// Returns the event's sequence number.
    #[must_use]
    pub fn seq(&self) -> u64 {
        match self {
            Self::Placed(e) => e.seq,
            Self::Rejected(e) => e.seq,
            Self::Transition(e) => e.seq,
            Self::Command(e) => e.seq,
            Self::Detach(e) => e.seq,
            Self::Ignored(e) => e.seq,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes: [u8; N] = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take::<8>().map(u64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.take::<8>().map(f64::from_le_bytes)
    }

    fn read_option_u64(&mut self) -> Option<Option<u64>> {
        let present = self.read_u8()?;
        let val = self.read_u64()?;
        Some(if present != 0 { Some(val) } else { None })
    }

    fn read_col(&mut self) -> Option<[f64; 4]> {
        Some([self.read_f64()?, self.read_f64()?, self.read_f64()?, self.read_f64()?])
    }

    fn read_transform(&mut self) -> Option<Transform3d> {
        Some(Transform3d::from_cols(
            self.read_col()?,
            self.read_col()?,
            self.read_col()?,
            self.read_col()?,
        ))
    }

    fn read_state(&mut self) -> Option<BindingState> {
        Some(match self.read_u8()? {
            0 => BindingState::Pending,
            1 => BindingState::Bound,
            2 => BindingState::Stale,
            3 => BindingState::Removed,
            _ => return None,
        })
    }

    fn read_defect(&mut self) -> Option<TransformDefect> {
        Some(match self.read_u8()? {
            0 => TransformDefect::NonFinite,
            1 => TransformDefect::NotAffine,
            2 => TransformDefect::NotOrthonormal,
            3 => TransformDefect::Reflection,
            _ => return None,
        })
    }

    fn decode_placed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Placed(PlacedEvent {
            seq: self.read_u64()?,
            anchor: AnchorId(self.read_u64()?),
            node: NodeId(self.read_u64()?),
            transform: self.read_transform()?,
        }))
    }

    fn decode_rejected(&mut self) -> Option<RecordedEvent> {
        let seq = self.read_u64()?;
        let node = NodeId(self.read_u64()?);
        let error = match self.read_u8()? {
            ERR_DUPLICATE_NODE => BindingError::DuplicateNode {
                node,
                existing: AnchorId(self.read_u64()?),
            },
            ERR_UNKNOWN_ANCHOR => BindingError::UnknownAnchor(AnchorId(self.read_u64()?)),
            ERR_MALFORMED => BindingError::MalformedTransform(self.read_defect()?),
            _ => return None,
        };
        Some(RecordedEvent::Rejected(RejectedEvent { seq, node, error }))
    }

    fn decode_transition(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Transition(TransitionEvent {
            seq: self.read_u64()?,
            anchor: AnchorId(self.read_u64()?),
            node: NodeId(self.read_u64()?),
            from: self.read_state()?,
            to: self.read_state()?,
        }))
    }

    fn decode_command(&mut self) -> Option<RecordedEvent> {
        let seq = self.read_u64()?;
        let anchor = AnchorId(self.read_u64()?);
        let kind = self.read_u8()?;
        let node = NodeId(self.read_u64()?);
        let command = match kind {
            CMD_ADD => SceneCommand::AddNode(node, self.read_transform()?),
            CMD_UPDATE => SceneCommand::UpdateNodeTransform(node, self.read_transform()?),
            CMD_REMOVE => SceneCommand::RemoveNode(node),
            CMD_VISIBLE => SceneCommand::SetNodeVisible(node, self.read_u8()? != 0),
            _ => return None,
        };
        Some(RecordedEvent::Command(CommandEvent {
            seq,
            anchor,
            command,
        }))
    }

    fn decode_detach(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Detach(DetachEvent {
            seq: self.read_u64()?,
            anchor: AnchorId(self.read_u64()?),
            node: NodeId(self.read_u64()?),
            kind: if self.read_u8()? == 0 {
                DetachKind::Requested
            } else {
                DetachKind::Forced
            },
        }))
    }

    fn decode_ignored(&mut self) -> Option<RecordedEvent> {
        let seq = self.read_u64()?;
        let anchor = self.read_option_u64()?.map(AnchorId);
        let node = self.read_option_u64()?.map(NodeId);
        let reason = match self.read_u8()? {
            IGN_UNKNOWN_ANCHOR => IgnoreReason::UnknownAnchor,
            IGN_MALFORMED_UPDATE => IgnoreReason::MalformedUpdate(self.read_defect()?),
            IGN_NO_BINDING => IgnoreReason::NoBinding,
            _ => return None,
        };
        Some(RecordedEvent::Ignored(IgnoredEvent {
            seq,
            anchor,
            node,
            reason,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PLACED => self.decode_placed(),
            TAG_REJECTED => self.decode_rejected(),
            TAG_TRANSITION => self.decode_transition(),
            TAG_COMMAND => self.decode_command(),
            TAG_DETACH => self.decode_detach(),
            TAG_IGNORED => self.decode_ignored(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
