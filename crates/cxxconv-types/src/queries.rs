//! Type query service: selective unwrapping and structural comparison.
//!
//! `strip` peels typedefs, references and top-level qualifiers according to a
//! composable mask, mirroring how the conversion rules talk about "the
//! unqualified referent of" a type. `same_type` is the structural equality
//! used everywhere instead of id comparison: it resolves typedefs on both
//! sides and ignores originating expressions on basic types.

use bitflags::bitflags;

use crate::db::TypeDatabase;
use crate::types::{BasicKind, ClassId, CvQualifier, TypeData, TypeId};

bitflags! {
    /// Which wrappers `strip` removes. Combinations read like the conversion
    /// rules: `TDEF | REF` yields the possibly-qualified referent,
    /// `TDEF | REF | ALLCVQ` the bare underlying type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StripMask: u8 {
        /// Resolve typedefs.
        const TDEF = 1 << 0;
        /// Strip reference wrappers.
        const REF = 1 << 1;
        /// Strip top-level const/volatile qualification.
        const ALLCVQ = 1 << 2;
    }
}

/// Peel the requested wrappers off `ty`, repeatedly, until the outermost
/// node is not of a requested kind.
pub fn strip(db: &dyn TypeDatabase, mut ty: TypeId, mask: StripMask) -> TypeId {
    loop {
        match db.type_data(ty) {
            TypeData::Typedef { aliased, .. } if mask.contains(StripMask::TDEF) => ty = aliased,
            TypeData::Reference { referent } if mask.contains(StripMask::REF) => ty = referent,
            TypeData::Qualified { inner, .. } if mask.contains(StripMask::ALLCVQ) => ty = inner,
            _ => return ty,
        }
    }
}

/// The top-level qualification of `ty` (typedefs resolved). Pointers and
/// pointers-to-member report their own qualification, so each indirection
/// level of a pointer chain answers for itself.
pub fn cv_qualifier_of(db: &dyn TypeDatabase, ty: TypeId) -> CvQualifier {
    match db.type_data(strip(db, ty, StripMask::TDEF)) {
        TypeData::Qualified { cv, .. } => cv,
        TypeData::Pointer { cv, .. } => cv,
        TypeData::PointerToMember { cv, .. } => cv,
        _ => CvQualifier::None,
    }
}

/// Apply additional qualification to `ty`, merging with any qualifier
/// already present. A no-op for `CvQualifier::None`.
pub fn add_qualifiers(db: &dyn TypeDatabase, ty: TypeId, cv: CvQualifier) -> TypeId {
    if cv == CvQualifier::None {
        return ty;
    }
    match db.type_data(ty) {
        TypeData::Qualified { cv: existing, inner } => db.intern(TypeData::Qualified {
            cv: existing.merge(cv),
            inner,
        }),
        _ => db.intern(TypeData::Qualified { cv, inner: ty }),
    }
}

/// Structural "same type" relation. Typedefs are transparent; the literal
/// expression a basic type was created from is not part of its identity.
/// Classes and enumerations compare nominally.
pub fn same_type(db: &dyn TypeDatabase, a: TypeId, b: TypeId) -> bool {
    let a = strip(db, a, StripMask::TDEF);
    let b = strip(db, b, StripMask::TDEF);
    if a == b {
        return true;
    }
    match (db.type_data(a), db.type_data(b)) {
        (
            TypeData::Basic {
                kind: k1,
                modifiers: m1,
                ..
            },
            TypeData::Basic {
                kind: k2,
                modifiers: m2,
                ..
            },
        ) => k1 == k2 && m1 == m2,
        (
            TypeData::Pointer {
                pointee: p1,
                cv: cv1,
            },
            TypeData::Pointer {
                pointee: p2,
                cv: cv2,
            },
        ) => cv1 == cv2 && same_type(db, p1, p2),
        (
            TypeData::PointerToMember {
                pointee: p1,
                member_of: c1,
                cv: cv1,
            },
            TypeData::PointerToMember {
                pointee: p2,
                member_of: c2,
                cv: cv2,
            },
        ) => cv1 == cv2 && same_type(db, c1, c2) && same_type(db, p1, p2),
        (
            TypeData::Array {
                element: e1,
                size: s1,
            },
            TypeData::Array {
                element: e2,
                size: s2,
            },
        ) => s1 == s2 && same_type(db, e1, e2),
        (
            TypeData::Function {
                params: ps1,
                ret: r1,
            },
            TypeData::Function {
                params: ps2,
                ret: r2,
            },
        ) => {
            ps1.len() == ps2.len()
                && same_type(db, r1, r2)
                && ps1
                    .iter()
                    .zip(ps2.iter())
                    .all(|(&x, &y)| same_type(db, x, y))
        }
        (TypeData::Class(c1), TypeData::Class(c2)) => c1 == c2,
        (TypeData::Enum(e1), TypeData::Enum(e2)) => e1 == e2,
        (TypeData::Reference { referent: r1 }, TypeData::Reference { referent: r2 }) => {
            same_type(db, r1, r2)
        }
        (
            TypeData::Qualified { cv: cv1, inner: i1 },
            TypeData::Qualified { cv: cv2, inner: i2 },
        ) => cv1 == cv2 && same_type(db, i1, i2),
        _ => false,
    }
}

/// The class id of `ty` when it is (after typedef resolution) a class type.
pub fn as_class(db: &dyn TypeDatabase, ty: TypeId) -> Option<ClassId> {
    match db.type_data(strip(db, ty, StripMask::TDEF)) {
        TypeData::Class(id) => Some(id),
        _ => None,
    }
}

pub fn is_class(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    as_class(db, ty).is_some()
}

pub fn is_void(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    matches!(
        db.type_data(strip(db, ty, StripMask::TDEF)),
        TypeData::Basic {
            kind: BasicKind::Void,
            ..
        }
    )
}
