// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Process-wide capture of the last operation's intermediate sizes and
//! the boundary-chain diagnostics dump

use crate::boolean::graph::IntersectionGraph;
use crate::boolean::topology::MeshTopology;
use crate::error::MeshSide;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Summary of the most recently completed boolean operation.
///
/// Written monotonically by the kernel after each run; read by external
/// tooling at its own risk. Not part of the result contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugCapture {
    pub candidate_pairs: usize,
    pub intersecting_pairs: usize,
    pub graph_vertices: usize,
    pub graph_edges: usize,
    pub patches_a: usize,
    pub patches_b: usize,
    pub regions_a: usize,
    pub regions_b: usize,
    pub selected_triangles: usize,
    pub output_vertices: usize,
    pub output_triangles: usize,
}

static LAST_CAPTURE: Mutex<Option<DebugCapture>> = Mutex::new(None);

/// Record the capture for the operation that just finished.
pub(crate) fn store(capture: DebugCapture) {
    if let Ok(mut slot) = LAST_CAPTURE.lock() {
        *slot = Some(capture);
    }
}

/// The last capture, if any operation has completed in this process.
pub fn last() -> Option<DebugCapture> {
    LAST_CAPTURE.lock().ok().and_then(|slot| slot.clone())
}

/// Take the last capture, clearing the slot.
pub fn take_last() -> Option<DebugCapture> {
    LAST_CAPTURE.lock().ok().and_then(|mut slot| slot.take())
}

#[derive(Serialize)]
struct ChainDump {
    side: String,
    closed: bool,
    vertices: Vec<[f64; 3]>,
}

/// Emit the intersection boundary chains of one operand as JSON lines
/// when `DUMP_BOUNDARY=1` is set in the environment.
pub(crate) fn dump_boundary(side: MeshSide, topology: &MeshTopology, graph: &IntersectionGraph) {
    if std::env::var("DUMP_BOUNDARY").map(|v| v == "1") != Ok(true) {
        return;
    }
    for chain in &topology.chains {
        let dump = ChainDump {
            side: side.to_string(),
            closed: chain.closed,
            vertices: chain
                .vertices
                .iter()
                .map(|&v| {
                    let p = graph.vertices[v];
                    [p.x, p.y, p.z]
                })
                .collect(),
        };
        match serde_json::to_string(&dump) {
            Ok(line) => debug!("boundary {line}"),
            Err(err) => debug!("boundary dump failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_roundtrip() {
        let capture = DebugCapture {
            candidate_pairs: 1,
            intersecting_pairs: 1,
            graph_vertices: 2,
            graph_edges: 1,
            patches_a: 3,
            patches_b: 3,
            regions_a: 1,
            regions_b: 1,
            selected_triangles: 4,
            output_vertices: 4,
            output_triangles: 4,
        };
        store(capture.clone());
        let read = last().unwrap();
        assert_eq!(read.graph_vertices, 2);
        assert_eq!(read.output_triangles, 4);
    }
}
