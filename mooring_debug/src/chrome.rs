// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Binding events carry no wall-clock time, so the sequence number is used as
//! the timestamp (one microsecond per event). Each anchor gets its own track
//! (`tid`); a binding's lifetime from placement to removal is a duration
//! slice on that track, with transitions and scene commands as instant events
//! inside it. Events that name no anchor go on track 0.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use mooring_core::registry::BindingState;
use mooring_core::session::SceneCommand;

use crate::pretty::state_name;
use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes).map(to_json).collect();
    serde_json::to_writer_pretty(&mut *writer, &events)?;
    writeln!(writer)
}

fn to_json(recorded: RecordedEvent) -> Value {
    match recorded {
        RecordedEvent::Placed(e) => {
            let [x, y, z] = e.transform.translation();
            json!({
                "ph": "B",
                "name": format!("{}", e.node),
                "cat": "Binding",
                "ts": e.seq,
                "pid": 0,
                "tid": e.anchor.get(),
                "args": {
                    "anchor": e.anchor.get(),
                    "node": e.node.get(),
                    "position": [x, y, z],
                }
            })
        }
        RecordedEvent::Rejected(e) => json!({
            "ph": "i",
            "name": "Rejected",
            "cat": "Application",
            "ts": e.seq,
            "pid": 0,
            "tid": 0,
            "s": "g",
            "args": {
                "node": e.node.get(),
                "error": e.error.to_string(),
            }
        }),
        RecordedEvent::Transition(e) if e.to == BindingState::Removed => json!({
            "ph": "E",
            "name": format!("{}", e.node),
            "cat": "Binding",
            "ts": e.seq,
            "pid": 0,
            "tid": e.anchor.get(),
            "args": {
                "from": state_name(e.from),
            }
        }),
        RecordedEvent::Transition(e) => json!({
            "ph": "i",
            "name": format!("{} -> {}", state_name(e.from), state_name(e.to)),
            "cat": "Binding",
            "ts": e.seq,
            "pid": 0,
            "tid": e.anchor.get(),
            "s": "t",
            "args": {
                "node": e.node.get(),
            }
        }),
        RecordedEvent::Command(e) => {
            let (name, args) = match e.command {
                SceneCommand::AddNode(node, t) => {
                    ("AddNode", json!({ "node": node.get(), "position": t.translation() }))
                }
                SceneCommand::UpdateNodeTransform(node, t) => (
                    "UpdateNodeTransform",
                    json!({ "node": node.get(), "position": t.translation() }),
                ),
                SceneCommand::RemoveNode(node) => ("RemoveNode", json!({ "node": node.get() })),
                SceneCommand::SetNodeVisible(node, visible) => (
                    "SetNodeVisible",
                    json!({ "node": node.get(), "visible": visible }),
                ),
            };
            json!({
                "ph": "i",
                "name": name,
                "cat": "Scene",
                "ts": e.seq,
                "pid": 0,
                "tid": e.anchor.get(),
                "s": "t",
                "args": args,
            })
        }
        RecordedEvent::Detach(e) => json!({
            "ph": "i",
            "name": format!("Detach{:?}", e.kind),
            "cat": "Application",
            "ts": e.seq,
            "pid": 0,
            "tid": e.anchor.get(),
            "s": "t",
            "args": {
                "node": e.node.get(),
            }
        }),
        RecordedEvent::Ignored(e) => json!({
            "ph": "i",
            "name": "Ignored",
            "cat": "Race",
            "ts": e.seq,
            "pid": 0,
            "tid": e.anchor.map_or(0, |a| a.get()),
            "s": "t",
            "args": {
                "anchor": e.anchor.map(|a| a.get()),
                "node": e.node.map(|n| n.get()),
                "reason": format!("{:?}", e.reason),
            }
        }),
    }
}
