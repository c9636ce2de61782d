// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use mooring_core::registry::BindingState;
use mooring_core::session::SceneCommand;
use mooring_core::trace::{
    CommandEvent, DetachEvent, DetachKind, IgnoreReason, IgnoredEvent, PlacedEvent, RejectedEvent,
    TraceSink, TransitionEvent,
};
use mooring_core::transform::Transform3d;

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write + Send>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub(crate) fn state_name(state: BindingState) -> &'static str {
    match state {
        BindingState::Pending => "pending",
        BindingState::Bound => "bound",
        BindingState::Stale => "stale",
        BindingState::Removed => "removed",
    }
}

struct Position(Transform3d);

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [x, y, z] = self.0.translation();
        write!(f, "({x:.3}, {y:.3}, {z:.3})")
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_placed(&mut self, e: &PlacedEvent) {
        let _ = writeln!(
            self.writer,
            "[place] seq={} {} {} at {}",
            e.seq,
            e.anchor,
            e.node,
            Position(e.transform),
        );
    }

    fn on_rejected(&mut self, e: &RejectedEvent) {
        let _ = writeln!(self.writer, "[reject] seq={} {}: {}", e.seq, e.node, e.error);
    }

    fn on_transition(&mut self, e: &TransitionEvent) {
        let _ = writeln!(
            self.writer,
            "[state] seq={} {} {} {} -> {}",
            e.seq,
            e.anchor,
            e.node,
            state_name(e.from),
            state_name(e.to),
        );
    }

    fn on_command(&mut self, e: &CommandEvent) {
        let _ = match e.command {
            SceneCommand::AddNode(node, t) => {
                writeln!(self.writer, "[scene] seq={} add {node} at {}", e.seq, Position(t))
            }
            SceneCommand::UpdateNodeTransform(node, t) => {
                writeln!(self.writer, "[scene] seq={} move {node} to {}", e.seq, Position(t))
            }
            SceneCommand::RemoveNode(node) => {
                writeln!(self.writer, "[scene] seq={} remove {node}", e.seq)
            }
            SceneCommand::SetNodeVisible(node, visible) => {
                let verb = if visible { "show" } else { "hide" };
                writeln!(self.writer, "[scene] seq={} {verb} {node}", e.seq)
            }
        };
    }

    fn on_detach(&mut self, e: &DetachEvent) {
        let kind = match e.kind {
            DetachKind::Requested => "requested",
            DetachKind::Forced => "FORCED",
        };
        let _ = writeln!(
            self.writer,
            "[detach] seq={} {} {} {kind}",
            e.seq, e.anchor, e.node,
        );
    }

    fn on_ignored(&mut self, e: &IgnoredEvent) {
        let subject = match (e.anchor, e.node) {
            (Some(anchor), _) => anchor.to_string(),
            (None, Some(node)) => node.to_string(),
            (None, None) => String::from("?"),
        };
        let reason = match e.reason {
            IgnoreReason::UnknownAnchor => String::from("unknown anchor"),
            IgnoreReason::MalformedUpdate(defect) => format!("malformed update: {defect}"),
            IgnoreReason::NoBinding => String::from("no binding"),
        };
        let _ = writeln!(self.writer, "[ignore] seq={} {subject}: {reason}", e.seq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooring_core::id::{AnchorId, NodeId};
    use mooring_core::transform::TransformDefect;

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn pretty_print_place() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_placed(&PlacedEvent {
            seq: 0,
            anchor: AnchorId(1),
            node: NodeId(42),
            transform: Transform3d::from_translation(0.25, 0.0, -1.5),
        });
        let out = output(sink);
        assert_eq!(out, "[place] seq=0 anchor#1 node#42 at (0.250, 0.000, -1.500)\n");
    }

    #[test]
    fn pretty_print_transition_and_hide() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_transition(&TransitionEvent {
            seq: 4,
            anchor: AnchorId(2),
            node: NodeId(7),
            from: BindingState::Bound,
            to: BindingState::Stale,
        });
        sink.on_command(&CommandEvent {
            seq: 5,
            anchor: AnchorId(2),
            command: SceneCommand::SetNodeVisible(NodeId(7), false),
        });
        let out = output(sink);
        assert!(out.contains("[state] seq=4 anchor#2 node#7 bound -> stale"), "got: {out}");
        assert!(out.contains("[scene] seq=5 hide node#7"), "got: {out}");
    }

    #[test]
    fn pretty_print_ignored_reasons() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_ignored(&IgnoredEvent {
            seq: 1,
            anchor: Some(AnchorId(3)),
            node: None,
            reason: IgnoreReason::MalformedUpdate(TransformDefect::NonFinite),
        });
        sink.on_ignored(&IgnoredEvent {
            seq: 2,
            anchor: None,
            node: Some(NodeId(8)),
            reason: IgnoreReason::NoBinding,
        });
        let out = output(sink);
        assert!(out.contains("anchor#3: malformed update"), "got: {out}");
        assert!(out.contains("node#8: no binding"), "got: {out}");
    }
}
