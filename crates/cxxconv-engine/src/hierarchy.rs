//! Inheritance distance between class types.
//!
//! Depth-first search over direct bases in declaration order, returning the
//! first path found (not a guaranteed global minimum). The remaining depth
//! budget is passed by value so behavior is deterministic and independent of
//! the call stack.

use cxxconv_types::{StripMask, TypeDatabase, TypeId, as_class, same_type, strip};

/// Edge budget for base-class traversal. Hierarchies deeper than this (or
/// cyclic ones, which the budget also bounds) report "no relation" instead
/// of failing hard.
pub const MAX_INHERITANCE_DEPTH: u32 = 16;

/// Number of base-class edges from `ty` up to `ancestor`, or `None` when no
/// inheritance relationship is found within `budget` edges. Identity is
/// distance 0. An ancestor that is a template specialization also matches a
/// base equal to its primary template.
pub fn inheritance_distance(
    db: &dyn TypeDatabase,
    budget: u32,
    ty: TypeId,
    ancestor: TypeId,
) -> Option<u32> {
    if same_type(db, ty, ancestor) {
        return Some(0);
    }
    if budget == 0 {
        return None;
    }

    let class = as_class(db, ty)?;
    as_class(db, ancestor)?;

    let Some(def) = db.class_definition(class) else {
        tracing::warn!(class = class.0, "no definition for class; assuming no relation");
        return None;
    };

    let ancestor_primary = as_class(db, ancestor)
        .and_then(|id| db.class_definition(id))
        .and_then(|d| d.specialized_from);

    for base in &def.bases {
        let base_ty = db.intern(cxxconv_types::TypeData::Class(base.class));
        if same_type(db, base_ty, ancestor) || ancestor_primary == Some(base.class) {
            return Some(1);
        }
        let base_ty = strip(db, base_ty, StripMask::TDEF);
        if as_class(db, base_ty).is_some() {
            if let Some(n) = inheritance_distance(db, budget - 1, base_ty, ancestor) {
                return Some(n + 1);
            }
        }
    }

    None
}
