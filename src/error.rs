// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Typed failures surfaced at the kernel boundary

use thiserror::Error;

/// Which operand a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MeshSide {
    /// The first operand.
    A,
    /// The second operand.
    B,
}

impl MeshSide {
    /// The other operand.
    pub fn opposite(self) -> Self {
        match self {
            MeshSide::A => MeshSide::B,
            MeshSide::B => MeshSide::A,
        }
    }
}

impl std::fmt::Display for MeshSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshSide::A => write!(f, "A"),
            MeshSide::B => write!(f, "B"),
        }
    }
}

/// Pipeline phase in which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Pair intersection (C1).
    PairIntersect,
    /// Global graph construction (C2).
    Graph,
    /// Per-triangle subdivision (C3).
    Subdivide,
    /// Patch and region classification (C4).
    Classify,
    /// Selection and mesh assembly (C5).
    Assemble,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::PairIntersect => "pair-intersect",
            Phase::Graph => "graph",
            Phase::Subdivide => "subdivide",
            Phase::Classify => "classify",
            Phase::Assemble => "assemble",
        };
        write!(f, "{name}")
    }
}

/// Failure raised by a boolean operation.
///
/// No partial results: the pipeline stops at the first fatal error and the
/// error names the phase, the offending elements, and the violated
/// invariant.
#[derive(Debug, Error)]
pub enum KernelError {
    /// The caller passed an empty triangle list.
    #[error("input mesh {side} has no triangles")]
    EmptyInput {
        /// Offending operand.
        side: MeshSide,
    },

    /// An input triangle has (near-)zero area and cannot participate in
    /// plane or barycentric predicates.
    #[error("input triangle {side}/{triangle} is degenerate (area {area:.3e})")]
    DegenerateInputTriangle {
        /// Operand holding the triangle.
        side: MeshSide,
        /// Triangle index within the operand.
        triangle: usize,
        /// Measured world-space area.
        area: f64,
    },

    /// A per-triangle subdivision violated a planarity or topology
    /// invariant.
    #[error("[subdivide] triangle {side}/{triangle}: {detail}")]
    SubdivisionInvariant {
        /// Operand holding the triangle.
        side: MeshSide,
        /// Triangle index within the operand.
        triangle: usize,
        /// The invariant that was violated.
        detail: String,
    },

    /// A stage detected an internal inconsistency not tied to one
    /// triangle.
    #[error("[{phase}] {detail}")]
    InvariantViolation {
        /// Phase that detected the violation.
        phase: Phase,
        /// The invariant that was violated.
        detail: String,
    },

    /// The assembled output is not a closed manifold.
    #[error(
        "[assemble] output mesh is not closed: {offending} of {total} edges have use count != 2; \
         histogram {histogram:?}; first offenders {samples:?}"
    )]
    NonManifoldOutput {
        /// Number of undirected edges with a use count other than 2.
        offending: usize,
        /// Total undirected edge count.
        total: usize,
        /// use-count -> number of edges with that count.
        histogram: Vec<(usize, usize)>,
        /// Sample offending edges as ((vertex, vertex), use count).
        samples: Vec<((usize, usize), usize)>,
    },

    /// The operation was cancelled between stages via the polling flag.
    #[error("operation cancelled after phase {0}")]
    Cancelled(Phase),
}

impl KernelError {
    /// The phase in which this error was raised, when one applies.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            KernelError::EmptyInput { .. } | KernelError::DegenerateInputTriangle { .. } => None,
            KernelError::SubdivisionInvariant { .. } => Some(Phase::Subdivide),
            KernelError::InvariantViolation { phase, .. } => Some(*phase),
            KernelError::NonManifoldOutput { .. } => Some(Phase::Assemble),
            KernelError::Cancelled(phase) => Some(*phase),
        }
    }
}

/// Result alias used throughout the kernel.
pub type KernelResult<T> = Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_phase() {
        let err = KernelError::InvariantViolation {
            phase: Phase::Graph,
            detail: "edge with coincident endpoints".into(),
        };
        assert!(err.to_string().contains("[graph]"));
        assert_eq!(err.phase(), Some(Phase::Graph));
    }

    #[test]
    fn test_non_manifold_report_carries_samples() {
        let err = KernelError::NonManifoldOutput {
            offending: 1,
            total: 12,
            histogram: vec![(1, 1), (2, 11)],
            samples: vec![((3, 7), 1)],
        };
        let text = err.to_string();
        assert!(text.contains("use count != 2"));
        assert!(text.contains("(3, 7)"));
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(MeshSide::A.opposite(), MeshSide::B);
        assert_eq!(MeshSide::B.opposite(), MeshSide::A);
    }
}
