//! Implicit conversion sequence orchestrator.
//!
//! [`ConversionChecker::check`] relates a source type and value category to
//! a target type and produces the [`Cost`] of the best implicit conversion
//! sequence. Reference targets go through the reference-binding rules;
//! everything else through the standard conversion sequence with a
//! user-defined fallback. "No conversion exists" is a normal result with
//! rank [`Rank::NoMatch`], never an error.

use std::cmp::Ordering;

use cxxconv_types::{
    StripMask, TypeData, TypeDatabase, TypeId, as_class, cv_qualifier_of, is_class, same_type,
    strip,
};

use crate::cost::{Cost, Rank, UserDefinedConversion};
use crate::hierarchy::{MAX_INHERITANCE_DEPTH, inheritance_distance};
use crate::standard::{IntegerWidths, check_standard_conversion_sequence};
use crate::udc::check_user_defined_conversion_sequence;

/// Whether user-defined conversions may participate in a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UdcMode {
    Allow,
    Forbid,
    /// Report a placeholder instead of resolving candidates, to break
    /// recursion when conversions are checked during candidate gathering.
    Defer,
}

/// Value category of the source expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCategory {
    LValue,
    RValue,
}

impl ValueCategory {
    pub fn is_lvalue(self) -> bool {
        self == ValueCategory::LValue
    }
}

/// Conversion cost computations against one type database. Cheap to
/// construct; holds no state between calls, so one checker can serve any
/// number of concurrent callers.
pub struct ConversionChecker<'a> {
    db: &'a dyn TypeDatabase,
    widths: IntegerWidths,
    cancel: Option<&'a (dyn Fn() -> bool + Sync)>,
}

impl<'a> ConversionChecker<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> ConversionChecker<'a> {
        ConversionChecker {
            db,
            widths: IntegerWidths::default(),
            cancel: None,
        }
    }

    /// Use a non-default integer width model for promotions.
    pub fn with_widths(mut self, widths: IntegerWidths) -> ConversionChecker<'a> {
        self.widths = widths;
        self
    }

    /// Install a cancellation probe, consulted on orchestrator re-entry and
    /// inside user-defined conversion candidate loops. A cancelled
    /// computation conservatively reports no match.
    pub fn with_cancellation(
        mut self,
        cancel: &'a (dyn Fn() -> bool + Sync),
    ) -> ConversionChecker<'a> {
        self.cancel = Some(cancel);
        self
    }

    pub(crate) fn db(&self) -> &'a dyn TypeDatabase {
        self.db
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|probe| probe())
    }

    /// Compute the cost of the implicit conversion sequence from `source`
    /// (with the given value category) to `target`.
    ///
    /// `is_implied_object` marks the binding of a member function's implicit
    /// object parameter, which never undergoes user-defined conversion,
    /// never materializes a temporary, and records no inheritance distance.
    pub fn check(
        &self,
        value_category: ValueCategory,
        source: TypeId,
        target: TypeId,
        udc: UdcMode,
        is_implied_object: bool,
    ) -> Cost {
        let db = self.db;
        if self.is_cancelled() {
            return Cost::no_match(source, target);
        }
        tracing::trace!(
            source = source.0,
            target = target.0,
            ?udc,
            is_implied_object,
            "checking implicit conversion sequence"
        );

        let udc = if is_implied_object { UdcMode::Forbid } else { udc };
        let target = strip(db, target, StripMask::TDEF);
        let mut source = strip(db, source, StripMask::TDEF);
        let mut value_category = value_category;

        if matches!(db.type_data(target), TypeData::Reference { .. }) {
            // initialization of a reference
            let cv1_t1 = strip(db, target, StripMask::TDEF | StripMask::REF);

            if matches!(db.type_data(source), TypeData::Reference { .. }) {
                value_category = ValueCategory::LValue;
                source = strip(db, source, StripMask::TDEF | StripMask::REF);
            }

            let t2 = strip(db, source, StripMask::TDEF | StripMask::REF | StripMask::ALLCVQ);

            // an lvalue binds directly when the target is
            // reference-compatible with the source
            if value_category.is_lvalue() {
                if let Some(mut cost) = self.is_reference_compatible(cv1_t1, source, is_implied_object)
                {
                    // direct binding has identity or conversion rank
                    if cost.inheritance_distance() > 0 {
                        cost.set_rank(Rank::Conversion);
                    }
                    return cost;
                }
            }

            // a class source may produce a bindable lvalue through a
            // conversion operator returning a reference
            if udc != UdcMode::Forbid {
                if let Some(source_class) = as_class(db, t2) {
                    if let Some(def) = db.class_definition(source_class) {
                        let mut operator_cost: Option<Cost> = None;
                        let mut ambiguous = false;
                        for (index, op) in def.conversion_operators.iter().enumerate() {
                            if self.is_cancelled() {
                                return Cost::no_match(source, cv1_t1);
                            }
                            if op.is_explicit {
                                continue;
                            }
                            let returned = strip(db, op.return_type, StripMask::TDEF);
                            if !matches!(db.type_data(returned), TypeData::Reference { .. }) {
                                continue;
                            }
                            let cv_t2 = strip(db, returned, StripMask::TDEF | StripMask::REF);
                            let Some(mut candidate) =
                                self.is_reference_compatible(cv1_t1, cv_t2, false)
                            else {
                                continue;
                            };
                            candidate.set_user_defined(UserDefinedConversion::Operator {
                                class: source_class,
                                index,
                            });
                            let cmp = operator_cost
                                .as_ref()
                                .map_or(Ordering::Less, |b| candidate.compare_to(b));
                            if cmp != Ordering::Greater {
                                ambiguous = cmp == Ordering::Equal;
                                operator_cost = Some(candidate);
                            }
                        }
                        // an exact tie between operators has no winner
                        if !ambiguous {
                            if let Some(mut cost) = operator_cost {
                                if is_implied_object {
                                    cost.set_inheritance_distance(0);
                                }
                                return cost;
                            }
                        }
                    }
                }
            }

            // direct binding failed; only a const (not volatile) target may
            // bind by materializing a temporary
            if cv_qualifier_of(db, cv1_t1) == cxxconv_types::CvQualifier::Const {
                if !value_category.is_lvalue() && is_class(db, t2) {
                    if let Some(cost) =
                        self.is_reference_compatible(cv1_t1, source, is_implied_object)
                    {
                        return cost;
                    }
                }

                // no temporary is created for an implied object parameter;
                // a source that is reference-related but more qualified
                // than the target makes the binding ill-formed
                if !is_implied_object {
                    let t1 = strip(db, cv1_t1, StripMask::TDEF | StripMask::REF | StripMask::ALLCVQ);
                    let ill_formed = self.is_reference_related(t1, t2).is_some()
                        && compare_qualifications(db, cv1_t1, source).is_none();
                    if !ill_formed {
                        return self.non_reference_conversion(
                            value_category,
                            source,
                            cv1_t1,
                            udc,
                            is_implied_object,
                        );
                    }
                }
            }
            return Cost::no_match(source, cv1_t1);
        }

        // non-reference binding
        let uq_source = strip(db, source, StripMask::TDEF | StripMask::REF | StripMask::ALLCVQ);
        let uq_target = strip(db, target, StripMask::TDEF | StripMask::REF | StripMask::ALLCVQ);

        // derived-to-base conversion by value
        if is_class(db, uq_source) && is_class(db, uq_target) {
            if let Some(depth) =
                inheritance_distance(db, MAX_INHERITANCE_DEPTH, uq_source, uq_target)
            {
                if depth == 0 {
                    return Cost::new(uq_source, uq_target, Rank::Identity);
                }
                let mut cost = Cost::new(uq_source, uq_target, Rank::Conversion);
                cost.set_inheritance_distance(depth);
                return cost;
            }
        }

        // top-level qualifiers carry no information between non-class types
        let (source, target) = if !is_class(db, uq_source) && !is_class(db, uq_target) {
            (uq_source, uq_target)
        } else {
            (source, target)
        };
        self.non_reference_conversion(value_category, source, target, udc, is_implied_object)
    }

    /// Standard conversion sequence, falling back to a user-defined one when
    /// allowed and the standard sequence found no match.
    fn non_reference_conversion(
        &self,
        value_category: ValueCategory,
        source: TypeId,
        target: TypeId,
        udc: UdcMode,
        is_implied_object: bool,
    ) -> Cost {
        let cost =
            check_standard_conversion_sequence(self.db, self.widths, source, target, is_implied_object);
        if cost.converts() || udc == UdcMode::Forbid {
            return cost;
        }
        match check_user_defined_conversion_sequence(
            self,
            value_category,
            source,
            target,
            udc == UdcMode::Defer,
        ) {
            Some(udc_cost) => udc_cost,
            None => cost,
        }
    }

    /// Is `cv1_target` reference-related to `cv2_source` (same type, or a
    /// base class of it, level by level through one pointer or array)?
    /// Returns the inheritance distance when related.
    fn is_reference_related(&self, cv1_target: TypeId, cv2_source: TypeId) -> Option<u32> {
        let db = self.db;
        let mut t = strip(db, cv1_target, StripMask::TDEF | StripMask::REF);
        let mut s = strip(db, cv2_source, StripMask::TDEF | StripMask::REF);

        match (db.type_data(t), db.type_data(s)) {
            (
                TypeData::Pointer { pointee: tp, .. },
                TypeData::Pointer { pointee: sp, .. },
            ) => {
                // pointee qualification stays significant below the top level
                t = strip(db, tp, StripMask::TDEF | StripMask::REF);
                s = strip(db, sp, StripMask::TDEF | StripMask::REF);
            }
            (TypeData::Pointer { .. }, _) | (_, TypeData::Pointer { .. }) => return None,
            (
                TypeData::Array {
                    element: te,
                    size: t_size,
                },
                TypeData::Array {
                    element: se,
                    size: s_size,
                },
            ) => {
                if t_size != s_size {
                    return None;
                }
                t = strip(db, te, StripMask::TDEF | StripMask::REF);
                s = strip(db, se, StripMask::TDEF | StripMask::REF);
            }
            (TypeData::Array { .. }, _) | (_, TypeData::Array { .. }) => return None,
            _ => {
                t = strip(db, t, StripMask::TDEF | StripMask::REF | StripMask::ALLCVQ);
                s = strip(db, s, StripMask::TDEF | StripMask::REF | StripMask::ALLCVQ);
                if is_class(db, t) && is_class(db, s) {
                    return inheritance_distance(db, MAX_INHERITANCE_DEPTH, s, t);
                }
            }
        }
        same_type(db, t, s).then_some(0)
    }

    /// Reference compatibility: reference-related, with the target at least
    /// as qualified as the source. Produces the identity-ranked binding cost
    /// carrying the qualification adjustment and inheritance distance.
    /// An implied object parameter is treated as if it had the derived type,
    /// so its distance is not recorded.
    pub(crate) fn is_reference_compatible(
        &self,
        cv1_target: TypeId,
        cv2_source: TypeId,
        is_implied_object: bool,
    ) -> Option<Cost> {
        let distance = self.is_reference_related(cv1_target, cv2_source)?;
        let additions = compare_qualifications(self.db, cv1_target, cv2_source)?;
        let distance = if is_implied_object { 0 } else { distance };

        let mut cost = Cost::new(cv2_source, cv1_target, Rank::Identity);
        cost.set_qualification_adjustment(u32::from(additions));
        cost.set_inheritance_distance(distance);
        Some(cost)
    }
}

/// Top-level qualifier comparison: the additions needed on `t2` to reach
/// `t1`'s qualification, or `None` when `t1` is less qualified.
fn compare_qualifications(db: &dyn TypeDatabase, t1: TypeId, t2: TypeId) -> Option<u8> {
    let t1 = strip(db, t1, StripMask::TDEF | StripMask::REF);
    let t2 = strip(db, t2, StripMask::TDEF | StripMask::REF);
    cv_qualifier_of(db, t1).compare(cv_qualifier_of(db, t2))
}

/// Compute the cost of converting `source` to `target` with a fresh checker
/// using the default integer width model.
pub fn compute_conversion_cost(
    db: &dyn TypeDatabase,
    value_category: ValueCategory,
    source: TypeId,
    target: TypeId,
    udc: UdcMode,
    is_implied_object: bool,
) -> Cost {
    ConversionChecker::new(db).check(value_category, source, target, udc, is_implied_object)
}
