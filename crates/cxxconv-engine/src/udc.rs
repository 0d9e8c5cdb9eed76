//! User-defined conversion sequences: converting constructors on a class
//! target, and conversion operators on a class source, with at most one
//! user-defined step per sequence.
//!
//! Nested conversion checks run with user-defined conversions forbidden.
//! Candidates compete through their first conversion step with
//! [`Cost::compare_to`]; an exact tie marks the winner ambiguous rather than
//! picking either.

use std::cmp::Ordering;

use cxxconv_types::{
    ClassId, CvQualifier, StripMask, TypeData, TypeDatabase, TypeId, add_qualifiers, as_class,
    is_class, is_void, strip,
};

use crate::checker::{ConversionChecker, UdcMode, ValueCategory};
use crate::cost::{Cost, Rank, UserDefinedConversion};
use crate::hierarchy::{MAX_INHERITANCE_DEPTH, inheritance_distance};

/// Try to convert `source` to `target` through exactly one constructor or
/// conversion operator. Returns `None` when no viable candidate exists; a
/// returned cost may still be marked ambiguous.
///
/// With `defer` set, the search is not performed; a placeholder cost of
/// user-defined rank is returned so the caller can rank the candidate
/// without recursing into nested overload resolution.
pub(crate) fn check_user_defined_conversion_sequence(
    checker: &ConversionChecker<'_>,
    value_category: ValueCategory,
    source: TypeId,
    target: TypeId,
    defer: bool,
) -> Option<Cost> {
    let db = checker.db();
    let s = strip(db, source, StripMask::TDEF | StripMask::REF | StripMask::ALLCVQ);
    let t = strip(db, target, StripMask::TDEF | StripMask::REF | StripMask::ALLCVQ);

    if !is_class(db, s) && !is_class(db, t) {
        return None;
    }

    if defer {
        let mut placeholder = Cost::new(source, target, Rank::UserDefined);
        placeholder.set_deferred_udc(true);
        return Some(placeholder);
    }

    // The best first conversion step found so far; constructor and operator
    // candidates compete through it.
    let mut best_first_step: Option<Cost> = None;
    let mut result: Option<Cost> = None;

    if let Some(target_class) = as_class(db, t) {
        // copy-initialization of a class by converting constructor
        if let Some(def) = db.class_definition(target_class) {
            for (index, ctor) in def.constructors.iter().enumerate() {
                if checker.is_cancelled() {
                    return None;
                }
                if ctor.is_explicit {
                    continue;
                }
                let first_step = match ctor.params.first() {
                    Some(param) => {
                        let param_ty = strip(db, param.ty, StripMask::TDEF);
                        // a sole void parameter means no viable binding
                        if is_void(db, strip(db, param_ty, StripMask::ALLCVQ)) {
                            continue;
                        }
                        if ctor.params.iter().skip(1).any(|p| !p.has_default) {
                            continue;
                        }
                        checker.check(value_category, source, param_ty, UdcMode::Forbid, false)
                    }
                    None => {
                        if !ctor.is_variadic {
                            continue;
                        }
                        // only the ellipsis can absorb the argument
                        Cost::new(source, t, Rank::Ellipsis)
                    }
                };
                if !first_step.converts() {
                    continue;
                }
                let cmp = best_first_step
                    .as_ref()
                    .map_or(Ordering::Less, |b| first_step.compare_to(b));
                if cmp != Ordering::Greater {
                    let mut chosen = Cost::new(t, t, Rank::Identity);
                    chosen.set_user_defined(UserDefinedConversion::Constructor {
                        class: target_class,
                        index,
                    });
                    if cmp == Ordering::Equal {
                        chosen.set_ambiguous_udc(true);
                    }
                    best_first_step = Some(first_step);
                    result = Some(chosen);
                }
            }
        }

        // initialization by a conversion operator whose return type is the
        // target class or inheritance-related to it
        if let Some(source_class) = as_class(db, s) {
            if let Some(def) = db.class_definition(source_class) {
                for (index, op) in def.conversion_operators.iter().enumerate() {
                    if checker.is_cancelled() {
                        return None;
                    }
                    if op.is_explicit {
                        continue;
                    }
                    let return_ty = strip(
                        db,
                        op.return_type,
                        StripMask::TDEF | StripMask::REF | StripMask::ALLCVQ,
                    );
                    let Some(distance) =
                        inheritance_distance(db, MAX_INHERITANCE_DEPTH, return_ty, t)
                    else {
                        continue;
                    };
                    let implicit =
                        implicit_object_type(db, source_class, op.is_const, op.is_volatile);
                    let first_step =
                        checker.check(value_category, source, implicit, UdcMode::Forbid, false);
                    if !first_step.converts() {
                        continue;
                    }
                    let cmp = best_first_step
                        .as_ref()
                        .map_or(Ordering::Less, |b| first_step.compare_to(b));
                    if cmp != Ordering::Greater {
                        let mut chosen = Cost::new(t, t, Rank::Identity);
                        if distance > 0 {
                            chosen.set_inheritance_distance(distance);
                            chosen.set_rank(Rank::Conversion);
                        }
                        chosen.set_user_defined(UserDefinedConversion::Operator {
                            class: source_class,
                            index,
                        });
                        if cmp == Ordering::Equal {
                            chosen.set_ambiguous_udc(true);
                        }
                        best_first_step = Some(first_step);
                        result = Some(chosen);
                    }
                }
            }
        }
        return result;
    }

    // class source converting to a non-class target: a conversion operator
    // followed by a standard conversion from its return type
    let source_class = as_class(db, s)?;
    let def = db.class_definition(source_class)?;
    for (index, op) in def.conversion_operators.iter().enumerate() {
        if checker.is_cancelled() {
            return None;
        }
        if op.is_explicit {
            continue;
        }
        let return_ty = strip(db, op.return_type, StripMask::TDEF | StripMask::ALLCVQ);
        let second_step =
            checker.check(ValueCategory::RValue, return_ty, target, UdcMode::Forbid, false);
        if !second_step.converts() {
            continue;
        }
        let implicit = implicit_object_type(db, source_class, op.is_const, op.is_volatile);
        let first_step = checker.check(value_category, source, implicit, UdcMode::Forbid, false);
        if !first_step.converts() {
            continue;
        }
        let cmp = best_first_step
            .as_ref()
            .map_or(Ordering::Less, |b| first_step.compare_to(b));
        if cmp != Ordering::Greater {
            let mut chosen = second_step;
            chosen.set_user_defined(UserDefinedConversion::Operator {
                class: source_class,
                index,
            });
            if cmp == Ordering::Equal {
                chosen.set_ambiguous_udc(true);
            }
            best_first_step = Some(first_step);
            result = Some(chosen);
        }
    }
    result
}

/// The type the implicit object parameter of a cv-qualified conversion
/// operator binds to: a reference to the suitably qualified class type.
fn implicit_object_type(
    db: &dyn TypeDatabase,
    class: ClassId,
    is_const: bool,
    is_volatile: bool,
) -> TypeId {
    let class_ty = db.intern(TypeData::Class(class));
    let qualified = add_qualifiers(db, class_ty, CvQualifier::from_parts(is_const, is_volatile));
    db.intern(TypeData::Reference {
        referent: qualified,
    })
}
