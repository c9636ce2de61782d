// Copyright 2026 the Mooring Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated tap-to-place session.
//!
//! A tracking thread plays the part of the platform session: it "detects" a
//! horizontal floor plane, confirms anchors on it, refines the plane estimate
//! (which re-poses every anchor), loses and regains tracking, and reports one
//! corrupt pose. The main thread plays the application: it hit-tests screen
//! taps against the plane, places a model node at each hit, and finally
//! detaches everything.
//!
//! Events go to a [`PrettyPrintSink`] on stdout and a [`RecorderSink`], which
//! is exported as Chrome trace JSON to `anchors_trace.json`. Set `RUST_LOG`
//! (for example `RUST_LOG=mooring_core=debug`) to see the binder's own logs.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use parking_lot::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mooring_core::binder::SceneBinder;
use mooring_core::config::BinderConfig;
use mooring_core::id::{AnchorId, NodeId};
use mooring_core::session::TrackingSession;
use mooring_core::transform::Transform3d;

use mooring_debug::chrome;
use mooring_debug::pretty::PrettyPrintSink;
use mooring_debug::recorder::RecorderSink;

use mooring_harness::{MirrorRenderer, check_consistency};

const TRACE_PATH: &str = "anchors_trace.json";
/// Horizontal half field of view, as a slope.
const FOV_SLOPE: f64 = 0.6;

type Binder = SceneBinder<ChannelSession, MirrorRenderer>;

/// A floor plane at `height`, bounded by `half_extent` around the origin.
#[derive(Clone, Copy, Debug)]
struct Plane {
    height: f64,
    half_extent: f64,
}

impl Plane {
    /// Casts a ray from a camera at the origin looking down -z through the
    /// normalized screen point `(u, v)` and returns the floor hit, if any.
    fn hit_test(&self, u: f64, v: f64) -> Option<[f64; 3]> {
        let dir = [(u - 0.5) * 2.0 * FOV_SLOPE, -(v - 0.5) * 2.0 * FOV_SLOPE, -1.0];
        if dir[1] >= 0.0 {
            return None;
        }
        let t = self.height / dir[1];
        let hit = [dir[0] * t, self.height, dir[2] * t];
        (hit[0].abs() <= self.half_extent && hit[2].abs() <= self.half_extent).then_some(hit)
    }
}

/// Where an anchor sits on the plane.
#[derive(Clone, Copy, Debug)]
struct Footprint {
    x: f64,
    z: f64,
    yaw: f64,
}

impl Footprint {
    fn pose(self, plane: Plane) -> Transform3d {
        Transform3d::from_translation(self.x, plane.height, self.z)
            * Transform3d::from_rotation_y(self.yaw)
    }
}

/// Messages for the simulated tracking thread.
#[derive(Debug)]
enum World {
    CreateAnchor(AnchorId, Transform3d),
    RemoveAnchor(AnchorId),
    RefinePlane(f64),
    LoseTracking,
    Reacquire,
    CorruptPose,
    Shutdown,
}

/// A [`TrackingSession`] that forwards requests to the tracking thread.
#[derive(Debug)]
struct ChannelSession {
    tx: Sender<World>,
}

impl TrackingSession for ChannelSession {
    fn request_anchor_creation(&self, anchor: AnchorId, world_transform: Transform3d) {
        if self.tx.send(World::CreateAnchor(anchor, world_transform)).is_err() {
            warn!(%anchor, "tracking thread is gone");
        }
    }

    fn request_anchor_removal(&self, anchor: AnchorId) {
        if self.tx.send(World::RemoveAnchor(anchor)).is_err() {
            warn!(%anchor, "tracking thread is gone");
        }
    }
}

fn run_tracking(binder: Arc<Binder>, rx: Receiver<World>, mut plane: Plane, ready: Sender<Plane>) {
    let mut anchors: BTreeMap<AnchorId, Footprint> = BTreeMap::new();
    info!(height = plane.height, "floor plane detected");
    let _ = ready.send(plane);

    for message in rx {
        match message {
            World::CreateAnchor(anchor, requested) => {
                let [x, _, z] = requested.translation();
                let yaw = x.atan2(z);
                let footprint = Footprint { x, z, yaw };
                anchors.insert(anchor, footprint);
                binder.on_anchor_updated(anchor, footprint.pose(plane));
            }
            World::RemoveAnchor(anchor) => {
                anchors.remove(&anchor);
                binder.on_anchor_removed(anchor);
            }
            World::RefinePlane(height) => {
                info!(from = plane.height, to = height, "plane refined");
                plane.height = height;
                for (&anchor, footprint) in &anchors {
                    binder.on_anchor_updated(anchor, footprint.pose(plane));
                }
            }
            World::LoseTracking => {
                info!("tracking limited");
                for &anchor in anchors.keys() {
                    binder.on_tracking_lost(anchor);
                }
            }
            World::Reacquire => {
                info!("tracking normal");
                for (&anchor, footprint) in &anchors {
                    binder.on_anchor_updated(anchor, footprint.pose(plane));
                }
            }
            World::CorruptPose => {
                if let Some(&anchor) = anchors.keys().next() {
                    let mut glitch = Transform3d::IDENTITY;
                    glitch.cols[3][1] = f64::NAN;
                    binder.on_anchor_updated(anchor, glitch);
                }
            }
            World::Shutdown => break,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // -- sinks -------------------------------------------------------------
    let recorder = Arc::new(Mutex::new(RecorderSink::new()));
    let pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));

    // -- binder and tracking thread ----------------------------------------
    let (tx, rx) = mpsc::channel();
    let binder = Arc::new(
        SceneBinder::new(
            ChannelSession { tx: tx.clone() },
            MirrorRenderer::new(),
            BinderConfig::world_tracking(),
        )
        .with_trace_sink((pretty, Arc::clone(&recorder))),
    );

    let (ready_tx, ready_rx) = mpsc::channel();
    let floor = Plane {
        height: -1.2,
        half_extent: 5.0,
    };
    let tracker = {
        let binder = Arc::clone(&binder);
        thread::spawn(move || run_tracking(binder, rx, floor, ready_tx))
    };
    let plane = ready_rx.recv().expect("tracking thread failed to start");

    // -- taps --------------------------------------------------------------
    let taps = [(0.5, 0.8), (0.3, 0.9), (0.5, 0.2), (0.7, 0.75)];
    let mut placed = Vec::new();
    for (i, (u, v)) in (1..).zip(taps) {
        let Some([x, y, z]) = plane.hit_test(u, v) else {
            info!(u, v, "tap missed the plane");
            continue;
        };
        let node = NodeId(i);
        let pose = Transform3d::from_translation(x, y, z);
        match binder.place_object(node, pose) {
            Ok(anchor) => {
                info!(%node, %anchor, "placed model");
                placed.push(node);
            }
            Err(error) => warn!(%node, %error, "placement failed"),
        }
    }

    // Trying to anchor a node twice is rejected.
    if let Some(&first) = placed.first() {
        let _ = binder.place_object(first, Transform3d::IDENTITY);
    }

    // -- world changes -----------------------------------------------------
    for message in [
        World::RefinePlane(-1.23),
        World::LoseTracking,
        World::CorruptPose,
        World::Reacquire,
    ] {
        tx.send(message).expect("tracking thread exited early");
    }

    // -- teardown ----------------------------------------------------------
    for node in placed {
        binder.detach(node);
    }
    tx.send(World::Shutdown).expect("tracking thread exited early");
    tracker.join().expect("tracking thread panicked");

    let report = check_consistency(&binder);
    if report.is_clean() {
        info!(
            tombstones = binder.registry().tombstones(),
            "scene consistent with registry"
        );
    } else {
        warn!(?report, "scene diverged from registry");
    }
    binder.collect_garbage();

    let binder = Arc::try_unwrap(binder).expect("tracking thread still holds the binder");
    let (_session, scene) = binder.into_parts();
    info!(
        commands = scene.log().len(),
        nodes = scene.nodes().len(),
        "scene torn down"
    );

    // -- export ------------------------------------------------------------
    let file = File::create(TRACE_PATH).expect("failed to create trace file");
    let mut writer = BufWriter::new(file);
    chrome::export(recorder.lock().as_bytes(), &mut writer).expect("failed to write trace");
    info!(path = TRACE_PATH, "wrote chrome trace");
}
