//! Standard conversion sequence: lvalue transformations, promotions,
//! conversions and qualification adjustment, attempted in that fixed order.
//!
//! Each stage either fully equates the (possibly rewritten) source and
//! target, hands the rewritten pair to the next stage, or reports a terminal
//! failure. The `Cost` passed through accumulates rank, inheritance distance
//! and qualification adjustments as the stages run.

use cxxconv_types::{
    BasicKind, BasicModifiers, CvQualifier, StripMask, TypeData, TypeDatabase, TypeId,
    add_qualifiers, as_class, cv_qualifier_of, is_class, is_void, same_type, strip,
};

use crate::cost::{Cost, Rank};
use crate::hierarchy::{MAX_INHERITANCE_DEPTH, inheritance_distance};

/// Distance recorded for a pointer-to-void conversion, so that any real
/// derived-to-base path outranks converting to `void*`.
pub const VOID_POINTER_DISTANCE: u32 = i16::MAX as u32;

const TDEF: StripMask = StripMask::TDEF;
const REF: StripMask = StripMask::REF;
const ALLCVQ: StripMask = StripMask::ALLCVQ;

/// Width model for integral promotion. Whether `unsigned short` promotes to
/// `int` or only to `unsigned int` depends on whether `int` can represent
/// every `unsigned short` value on the target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerWidths {
    pub short_bits: u32,
    pub int_bits: u32,
}

impl Default for IntegerWidths {
    fn default() -> IntegerWidths {
        IntegerWidths {
            short_bits: 16,
            int_bits: 32,
        }
    }
}

impl IntegerWidths {
    /// Can a plain `int` hold every value of `unsigned short`?
    fn int_represents_unsigned_short(self) -> bool {
        self.int_bits > self.short_bits
    }
}

/// Compute the cost of the standard conversion sequence from `source` to
/// `target`. `for_implicit_this` suppresses derived-to-base cost for members
/// nominated via using-declarations.
pub(crate) fn check_standard_conversion_sequence(
    db: &dyn TypeDatabase,
    widths: IntegerWidths,
    source: TypeId,
    target: TypeId,
    for_implicit_this: bool,
) -> Cost {
    let mut cost = Cost::new(source, target, Rank::Identity);
    if lvalue_to_rvalue(db, &mut cost) {
        return cost;
    }
    if promotion(db, widths, &mut cost) {
        return cost;
    }
    if conversion(db, &mut cost, for_implicit_this) {
        return cost;
    }
    if qualification_conversion(db, &mut cost) {
        return cost;
    }
    // The qualifications cannot be reconciled; nothing further applies.
    cost.set_rank(Rank::NoMatch);
    cost
}

/// Lvalue-to-rvalue, array-to-pointer and function-to-pointer conversions.
/// Returns whether this stage completely equated source and target (or hit a
/// terminal failure); otherwise the rewritten pair is left in `cost` for the
/// next stage.
fn lvalue_to_rvalue(db: &dyn TypeDatabase, cost: &mut Cost) -> bool {
    let mut converted = false;
    let mut target = strip(db, cost.target, REF | TDEF);
    let mut source = strip(db, cost.source, TDEF);

    let src_rvalue = strip(db, source, REF | TDEF);
    if matches!(db.type_data(source), TypeData::Reference { .. }) {
        // lvalue of non-function, non-array type decays
        let rdata = db.type_data(src_rvalue);
        if !matches!(
            rdata,
            TypeData::Function { .. } | TypeData::Array { .. }
        ) {
            // for a non-class type the rvalue is the cv-unqualified version
            let unqualified = strip(db, src_rvalue, ALLCVQ | TDEF | REF);
            if is_class(db, unqualified) {
                if is_complete_type(db, unqualified) {
                    source = src_rvalue;
                } else {
                    // rvalue of incomplete class type is ill-formed
                    cost.set_rank(Rank::NoMatch);
                    return true;
                }
            } else {
                source = unqualified;
            }
            cost.set_rank(Rank::LvalueTransformation);
            converted = true;
        }
    }

    // array-to-pointer conversion
    if !converted {
        if let TypeData::Array { element, .. } = db.type_data(src_rvalue) {
            if let TypeData::Pointer { pointee, .. } = db.type_data(target) {
                let target_ptr_tgt = strip(db, pointee, TDEF);
                let target_cv = cv_qualifier_of(db, target_ptr_tgt);
                // a string literal may decay to a pointer to non-const char
                if !target_cv.is_const() {
                    if let TypeData::Qualified { cv, inner } =
                        db.type_data(strip(db, element, TDEF))
                    {
                        if cv.is_const() {
                            if let TypeData::Basic {
                                literal: Some(expr),
                                ..
                            } = db.type_data(inner)
                            {
                                if db.is_string_literal(expr) {
                                    source = db.intern(TypeData::Pointer {
                                        pointee: inner,
                                        cv: CvQualifier::None,
                                    });
                                    cost.set_qualification_adjustment(if target_cv.is_volatile() {
                                        2
                                    } else {
                                        1
                                    });
                                    cost.set_rank(Rank::LvalueTransformation);
                                    converted = true;
                                }
                            }
                        }
                    }
                }
            }
            if !converted
                && matches!(
                    db.type_data(target),
                    TypeData::Pointer { .. } | TypeData::Basic { .. }
                )
            {
                source = db.intern(TypeData::Pointer {
                    pointee: strip(db, element, TDEF),
                    cv: CvQualifier::None,
                });
                cost.set_rank(Rank::LvalueTransformation);
                converted = true;
            }
        }
    }

    // function-to-pointer conversion
    if !converted {
        if let TypeData::Pointer { pointee, .. } = db.type_data(target) {
            if matches!(db.type_data(strip(db, pointee, TDEF)), TypeData::Function { .. })
                && matches!(db.type_data(src_rvalue), TypeData::Function { .. })
            {
                source = db.intern(TypeData::Pointer {
                    pointee: source,
                    cv: CvQualifier::None,
                });
                cost.set_rank(Rank::LvalueTransformation);
                converted = true;
            }
        }
    }

    // When neither side is a class type, top-level qualifiers carry no
    // information for value binding; drop them before structural comparison.
    let unqualified_target = strip(db, target, ALLCVQ | TDEF | REF);
    if !is_class(db, unqualified_target) {
        let unqualified_source = strip(db, source, ALLCVQ | TDEF | REF);
        if !is_class(db, unqualified_source) {
            source = unqualified_source;
            target = unqualified_target;
        }
    }

    cost.source = source;
    cost.target = target;
    same_type(db, source, target)
}

/// Integral and floating promotions.
fn promotion(db: &dyn TypeDatabase, widths: IntegerWidths, cost: &mut Cost) -> bool {
    let TypeData::Basic {
        kind: target_kind,
        modifiers: target_mods,
        ..
    } = db.type_data(cost.target)
    else {
        return false;
    };

    let can_promote = match db.type_data(cost.source) {
        TypeData::Basic {
            kind: source_kind,
            modifiers: source_mods,
            ..
        } => {
            let target_is_int = target_kind == BasicKind::Int
                && !target_mods.intersects(
                    BasicModifiers::SHORT | BasicModifiers::LONG | BasicModifiers::LONG_LONG,
                );
            if target_is_int {
                match source_kind {
                    BasicKind::Int if source_mods.contains(BasicModifiers::SHORT) => {
                        if source_mods.contains(BasicModifiers::UNSIGNED) {
                            // unsigned short goes to int only when int can
                            // represent all its values, otherwise to
                            // unsigned int
                            if widths.int_represents_unsigned_short() {
                                !target_mods.contains(BasicModifiers::UNSIGNED)
                            } else {
                                target_mods.contains(BasicModifiers::UNSIGNED)
                            }
                        } else {
                            !target_mods.contains(BasicModifiers::UNSIGNED)
                        }
                    }
                    BasicKind::Char | BasicKind::Bool | BasicKind::WChar | BasicKind::Unspecified => {
                        !target_mods.contains(BasicModifiers::UNSIGNED)
                    }
                    _ => false,
                }
            } else {
                target_kind == BasicKind::Double
                    && source_kind == BasicKind::Float
                    && !target_mods.contains(BasicModifiers::LONG)
            }
        }
        TypeData::Enum(id) => {
            if target_kind == BasicKind::Int || target_kind == BasicKind::Unspecified {
                match db.enum_definition(id) {
                    Some(def) => {
                        def.int_modifiers == target_mods & BasicModifiers::PROMOTION_RELEVANT
                    }
                    None => {
                        tracing::warn!(enum_id = id.0, "no definition for enum; no promotion");
                        false
                    }
                }
            } else {
                false
            }
        }
        _ => false,
    };

    if can_promote {
        cost.set_rank(Rank::Promotion);
        return true;
    }
    false
}

/// Integral/floating conversions, pointer-to-bool, null pointer constants,
/// pointer-to-void, derived-to-base pointer adjustment, and pointer-to-member
/// base/derived adjustment. Returns `true` when the outcome is terminal
/// (fully converted or no match); a `false` with a rewritten source falls
/// through to qualification adjustment.
fn conversion(db: &dyn TypeDatabase, cost: &mut Cost, for_implicit_this: bool) -> bool {
    let source_data = db.type_data(cost.source);
    let target_data = db.type_data(cost.target);

    if let TypeData::Basic {
        kind: target_kind, ..
    } = &target_data
    {
        // any two arithmetic or enumeration types convert
        if matches!(
            &source_data,
            TypeData::Basic { .. } | TypeData::Enum(_)
        ) {
            cost.set_rank(Rank::Conversion);
            return true;
        }
        // pointer or pointer-to-member converts to bool
        if *target_kind == BasicKind::Bool
            && matches!(
                &source_data,
                TypeData::Pointer { .. } | TypeData::PointerToMember { .. }
            )
        {
            cost.set_rank(Rank::ConversionPtrBool);
            return true;
        }
        return false;
    }

    let target_is_pointer_like = matches!(
        &target_data,
        TypeData::Pointer { .. } | TypeData::PointerToMember { .. }
    );
    if !target_is_pointer_like {
        return false;
    }

    // an integral constant expression evaluating to 0 converts to any
    // pointer or pointer-to-member type
    if let TypeData::Basic { literal, .. } = &source_data {
        if let Some(expr) = *literal {
            if db.evaluate_integer_constant(expr) == Some(0) {
                cost.set_rank(Rank::Conversion);
                return true;
            }
        }
        return false;
    }

    if let (
        TypeData::Pointer {
            pointee: source_pointee,
            ..
        },
        TypeData::Pointer {
            pointee: target_pointee,
            ..
        },
    ) = (&source_data, &target_data)
    {
        let target_ptr_tgt = strip(db, *target_pointee, TDEF | ALLCVQ | REF);

        // pointer to cv T -> pointer to cv void
        if is_void(db, target_ptr_tgt) {
            cost.set_rank(Rank::Conversion);
            cost.set_inheritance_distance(VOID_POINTER_DISTANCE);
            let cv = cv_qualifier_of(db, *source_pointee);
            cost.source = db.intern(TypeData::Pointer {
                pointee: add_qualifiers(db, TypeId::VOID, cv),
                cv: CvQualifier::None,
            });
            return false;
        }

        // pointer to cv D -> pointer to cv B for a base class B of D
        let source_ptr_tgt = strip(db, *source_pointee, TDEF | ALLCVQ | REF);
        if is_class(db, target_ptr_tgt) && is_class(db, source_ptr_tgt) {
            match inheritance_distance(db, MAX_INHERITANCE_DEPTH, source_ptr_tgt, target_ptr_tgt) {
                None => {
                    cost.set_rank(Rank::NoMatch);
                    return true;
                }
                Some(depth) => {
                    if depth > 0 {
                        if !for_implicit_this {
                            cost.set_rank(Rank::Conversion);
                            cost.set_inheritance_distance(depth);
                        }
                        let cv = cv_qualifier_of(db, *source_pointee);
                        cost.source = db.intern(TypeData::Pointer {
                            pointee: add_qualifiers(db, target_ptr_tgt, cv),
                            cv: CvQualifier::None,
                        });
                    }
                    return false;
                }
            }
        }
        return false;
    }

    // pointer to member of B -> pointer to member of D, distance measured
    // from derived target class back up to the source's class
    if let (
        TypeData::PointerToMember {
            pointee: source_member_ty,
            member_of: source_class,
            cv: source_cv,
        },
        TypeData::PointerToMember {
            pointee: target_member_ty,
            member_of: target_class,
            ..
        },
    ) = (&source_data, &target_data)
    {
        if same_type(db, *source_member_ty, *target_member_ty) {
            match inheritance_distance(db, MAX_INHERITANCE_DEPTH, *target_class, *source_class) {
                None => {
                    cost.set_rank(Rank::NoMatch);
                    return true;
                }
                Some(depth) => {
                    if depth > 0 {
                        cost.set_rank(Rank::Conversion);
                        cost.set_inheritance_distance(depth);
                        cost.source = db.intern(TypeData::PointerToMember {
                            pointee: *source_member_ty,
                            member_of: *target_class,
                            cv: *source_cv,
                        });
                    }
                    return false;
                }
            }
        }
    }

    false
}

/// Qualification conversion: walk matching indirection chains level by
/// level. At each level the target must be at least as qualified as the
/// source, and once a non-const level has been passed no deeper level may
/// add qualification ("const in every cv2,k"). Accumulates a packed per-level
/// adjustment code and finally requires structurally equal leaf types.
fn qualification_conversion(db: &dyn TypeDatabase, cost: &mut Cost) -> bool {
    let mut s = cost.source;
    let mut t = cost.target;
    let mut const_in_every_level = true;
    let mut first_pointer = true;
    let mut adjustments: u32 = 0;

    loop {
        s = strip(db, s, TDEF | REF);
        t = strip(db, t, TDEF | REF);
        let Some((s_pointee, s_cv, s_member)) = pointer_level(db, s) else {
            break;
        };
        let Some((t_pointee, t_cv, t_member)) = pointer_level(db, t) else {
            break;
        };

        adjustments <<= 2;
        let Some(cmp) = t_cv.compare(s_cv) else {
            return false;
        };
        if cmp > 0 && !const_in_every_level {
            return false;
        }
        match (s_member, t_member) {
            (None, None) => {}
            (Some(s_class), Some(t_class)) => {
                if !same_type(db, s_class, t_class) {
                    return false;
                }
            }
            // pointer and pointer-to-member never match
            _ => return false,
        }

        const_in_every_level &= first_pointer || t_cv.is_const();
        s = s_pointee;
        t = t_pointee;
        first_pointer = false;
        adjustments |= u32::from(cmp);
    }

    adjustments <<= 2;
    let Some(cmp) = cv_qualifier_of(db, t).compare(cv_qualifier_of(db, s)) else {
        return false;
    };
    if cmp > 0 && !const_in_every_level {
        return false;
    }
    adjustments |= u32::from(cmp);

    let s = strip(db, s, ALLCVQ | TDEF | REF);
    let t = strip(db, t, ALLCVQ | TDEF | REF);

    if adjustments > 0 {
        cost.set_qualification_adjustment(adjustments);
    }
    same_type(db, s, t)
}

/// One pointer-chain level: pointee, the level's own qualification, and the
/// member-of class when the level is a pointer to member.
fn pointer_level(
    db: &dyn TypeDatabase,
    ty: TypeId,
) -> Option<(TypeId, CvQualifier, Option<TypeId>)> {
    match db.type_data(ty) {
        TypeData::Pointer { pointee, cv } => Some((pointee, cv, None)),
        TypeData::PointerToMember {
            pointee,
            cv,
            member_of,
        } => Some((pointee, cv, Some(member_of))),
        _ => None,
    }
}

/// Completeness oracle. A class without a reachable definition is treated as
/// incomplete; non-class types are always complete.
fn is_complete_type(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    match as_class(db, ty) {
        Some(class) => match db.class_definition(class) {
            Some(def) => def.is_complete,
            None => {
                tracing::warn!(class = class.0, "completeness lookup failed; assuming incomplete");
                false
            }
        },
        None => true,
    }
}
