// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Trisect Contributors

//! Boolean keep rules applied at region granularity

use super::classify::{Containment, MeshClassification};
use super::subdivide::{CoplanarOwner, TriangleSubdivision};
use crate::error::MeshSide;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// The supported boolean operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanOp {
    /// A intersected with B.
    Intersection,
    /// A united with B.
    Union,
    /// A minus B.
    DifferenceAB,
    /// B minus A.
    DifferenceBA,
    /// Union minus intersection.
    SymmetricDifference,
}

/// Keep decision for one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {
    /// Discard the region.
    Drop,
    /// Keep with the source winding.
    Keep,
    /// Keep with reversed winding (the subtracted operand of a
    /// difference).
    KeepFlipped,
}

/// Patches selected for the output, in deterministic collection order:
/// operand A's triangles first, then operand B's.
#[derive(Debug, Clone, Default)]
pub struct BooleanPatchSet {
    /// World triangles, winding already final.
    pub triangles: Vec<[Point3<f64>; 3]>,
    /// Operand each triangle came from; diagnostics only.
    pub provenance: Vec<MeshSide>,
}

/// Keep rule for a region that is not a coplanar overlap.
///
/// | operation        | keep from A | keep from B        |
/// |------------------|-------------|--------------------|
/// | Intersection     | Inside      | Inside             |
/// | Union            | Outside     | Outside            |
/// | A - B            | Outside     | Inside, flipped    |
/// | B - A            | Inside, flipped | Outside        |
/// | Symmetric diff   | Outside     | Outside            |
pub fn keep_rule(op: BooleanOp, side: MeshSide, containment: Containment) -> Keep {
    use BooleanOp::*;
    use Containment::*;
    use MeshSide::{A, B};
    match (op, side, containment) {
        (Intersection, _, Inside) => Keep::Keep,
        (Union, _, Outside) => Keep::Keep,
        (DifferenceAB, A, Outside) => Keep::Keep,
        (DifferenceAB, B, Inside) => Keep::KeepFlipped,
        (DifferenceBA, A, Inside) => Keep::KeepFlipped,
        (DifferenceBA, B, Outside) => Keep::Keep,
        (SymmetricDifference, _, Outside) => Keep::Keep,
        _ => Keep::Drop,
    }
}

/// Keep rule for a coplanar (`On`) region.
///
/// Same-facing overlaps carry owner `MeshA` on both operands and survive
/// through exactly one copy; opposite-facing overlaps carry their own
/// operand as owner and survive only where a difference exposes them.
/// `drop_all` forces the empty-intersection behavior for disjoint
/// operands.
pub fn keep_coplanar_rule(
    op: BooleanOp,
    side: MeshSide,
    owner: CoplanarOwner,
    drop_all: bool,
) -> Keep {
    use BooleanOp::*;
    use MeshSide::{A, B};
    if drop_all || owner == CoplanarOwner::None {
        return Keep::Drop;
    }
    let owns_own = matches!(
        (side, owner),
        (A, CoplanarOwner::MeshA) | (B, CoplanarOwner::MeshB)
    );
    match (op, side) {
        // Both copies of an opposite-facing overlap survive intersection
        // and cancel as an opposite-winding pair in assembly; of a
        // same-facing overlap only operand A's copy survives.
        (Intersection, _) => {
            if owns_own {
                Keep::Keep
            } else {
                Keep::Drop
            }
        }
        // One canonical copy of same-facing overlaps; none of
        // opposite-facing ones.
        (Union, B) => {
            if owner == CoplanarOwner::MeshA {
                Keep::Keep
            } else {
                Keep::Drop
            }
        }
        (Union, A) => Keep::Drop,
        // A - B exposes B's side of an opposite-facing overlap, flipped
        // into A's orientation.
        (DifferenceAB, B) => {
            if owner == CoplanarOwner::MeshB {
                Keep::KeepFlipped
            } else {
                Keep::Drop
            }
        }
        (DifferenceAB, A) => Keep::Drop,
        // B - A keeps B's own copy unflipped.
        (DifferenceBA, B) => {
            if owner == CoplanarOwner::MeshB {
                Keep::Keep
            } else {
                Keep::Drop
            }
        }
        (DifferenceBA, A) => Keep::Drop,
        (SymmetricDifference, _) => Keep::Drop,
    }
}

/// Apply the boolean semantics to both operands' regions and collect the
/// surviving patches.
pub fn select_patches(
    op: BooleanOp,
    subdivision_a: &TriangleSubdivision,
    classification_a: &MeshClassification,
    subdivision_b: &TriangleSubdivision,
    classification_b: &MeshClassification,
) -> BooleanPatchSet {
    // Disjoint operands under intersection drop coplanar regions too:
    // nothing is inside, and no same-facing overlap provides a canonical
    // shared surface.
    let same_facing_overlap = classification_b.regions.iter().any(|r| {
        r.containment == Containment::On && r.coplanar_owner == CoplanarOwner::MeshA
    });
    let drop_all_coplanar = op == BooleanOp::Intersection
        && classification_a.no_inside_regions()
        && classification_b.no_inside_regions()
        && !same_facing_overlap;

    let mut set = BooleanPatchSet::default();
    for (side, subdivision, classification) in [
        (MeshSide::A, subdivision_a, classification_a),
        (MeshSide::B, subdivision_b, classification_b),
    ] {
        let region_keep: Vec<Keep> = classification
            .regions
            .iter()
            .map(|region| {
                if region.containment == Containment::On {
                    keep_coplanar_rule(op, side, region.coplanar_owner, drop_all_coplanar)
                } else {
                    keep_rule(op, side, region.containment)
                }
            })
            .collect();

        for (tri, patches) in subdivision.patches.iter().enumerate() {
            for (patch_idx, patch) in patches.iter().enumerate() {
                let region = classification.patch_region[tri][patch_idx];
                match region_keep[region] {
                    Keep::Drop => {}
                    Keep::Keep => {
                        set.triangles.push(patch.vertices);
                        set.provenance.push(side);
                    }
                    Keep::KeepFlipped => {
                        let [a, b, c] = patch.vertices;
                        set.triangles.push([a, c, b]);
                        set.provenance.push(side);
                    }
                }
            }
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_rule_table() {
        use BooleanOp::*;
        use Containment::*;
        use MeshSide::{A, B};
        assert_eq!(keep_rule(Intersection, A, Inside), Keep::Keep);
        assert_eq!(keep_rule(Intersection, B, Outside), Keep::Drop);
        assert_eq!(keep_rule(Union, A, Outside), Keep::Keep);
        assert_eq!(keep_rule(Union, B, Inside), Keep::Drop);
        assert_eq!(keep_rule(DifferenceAB, A, Outside), Keep::Keep);
        assert_eq!(keep_rule(DifferenceAB, B, Inside), Keep::KeepFlipped);
        assert_eq!(keep_rule(DifferenceBA, A, Inside), Keep::KeepFlipped);
        assert_eq!(keep_rule(DifferenceBA, B, Outside), Keep::Keep);
        assert_eq!(keep_rule(SymmetricDifference, A, Outside), Keep::Keep);
        assert_eq!(keep_rule(SymmetricDifference, B, Inside), Keep::Drop);
        // On regions never pass the plain rule.
        assert_eq!(keep_rule(Union, A, On), Keep::Drop);
    }

    #[test]
    fn test_coplanar_same_facing_single_copy() {
        use BooleanOp::*;
        use MeshSide::{A, B};
        let owner = CoplanarOwner::MeshA; // same-facing convention
        // Intersection and union keep exactly one copy.
        let int_copies = [
            keep_coplanar_rule(Intersection, A, owner, false),
            keep_coplanar_rule(Intersection, B, owner, false),
        ];
        assert_eq!(
            int_copies.iter().filter(|&&k| k != Keep::Drop).count(),
            1
        );
        let union_copies = [
            keep_coplanar_rule(Union, A, owner, false),
            keep_coplanar_rule(Union, B, owner, false),
        ];
        assert_eq!(
            union_copies.iter().filter(|&&k| k != Keep::Drop).count(),
            1
        );
        // Differences and symmetric difference drop same-facing overlaps.
        for op in [DifferenceAB, DifferenceBA, SymmetricDifference] {
            assert_eq!(keep_coplanar_rule(op, A, owner, false), Keep::Drop);
            assert_eq!(keep_coplanar_rule(op, B, owner, false), Keep::Drop);
        }
    }

    #[test]
    fn test_coplanar_opposite_facing() {
        use BooleanOp::*;
        use MeshSide::{A, B};
        // Opposite-facing: each operand owns its copy.
        let a_owner = CoplanarOwner::MeshA;
        let b_owner = CoplanarOwner::MeshB;
        // Intersection keeps both; they cancel as an opposite-winding
        // pair during assembly.
        assert_eq!(
            keep_coplanar_rule(Intersection, A, a_owner, false),
            Keep::Keep
        );
        assert_eq!(
            keep_coplanar_rule(Intersection, B, b_owner, false),
            Keep::Keep
        );
        // Union drops both: the interiors merge across the plane.
        assert_eq!(keep_coplanar_rule(Union, A, a_owner, false), Keep::Drop);
        assert_eq!(keep_coplanar_rule(Union, B, b_owner, false), Keep::Drop);
        // A - B exposes the surface through B's flipped copy.
        assert_eq!(keep_coplanar_rule(DifferenceAB, A, a_owner, false), Keep::Drop);
        assert_eq!(
            keep_coplanar_rule(DifferenceAB, B, b_owner, false),
            Keep::KeepFlipped
        );
        // B - A keeps B's copy as-is.
        assert_eq!(
            keep_coplanar_rule(DifferenceBA, B, b_owner, false),
            Keep::Keep
        );
        assert_eq!(keep_coplanar_rule(DifferenceBA, A, a_owner, false), Keep::Drop);
    }

    #[test]
    fn test_drop_all_overrides_everything() {
        for op in [
            BooleanOp::Intersection,
            BooleanOp::Union,
            BooleanOp::DifferenceAB,
            BooleanOp::DifferenceBA,
            BooleanOp::SymmetricDifference,
        ] {
            for side in [MeshSide::A, MeshSide::B] {
                for owner in [CoplanarOwner::MeshA, CoplanarOwner::MeshB] {
                    assert_eq!(keep_coplanar_rule(op, side, owner, true), Keep::Drop);
                }
            }
        }
    }
}
