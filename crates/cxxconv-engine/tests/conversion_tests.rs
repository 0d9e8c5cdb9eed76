use cxxconv_engine::{
    ConversionChecker, Cost, IntegerWidths, Rank, UdcMode, UserDefinedConversion, ValueCategory,
    VOID_POINTER_DISTANCE, compute_conversion_cost,
};
use cxxconv_types::{
    AccessSpecifier, BaseSpecifier, BasicKind, BasicModifiers, ClassDefinition, ClassId,
    Constructor, ConversionOperator, CvQualifier, Param, TypeId, TypeInterner,
};

fn base(class: ClassId) -> BaseSpecifier {
    BaseSpecifier {
        class,
        access: AccessSpecifier::Public,
        is_virtual: false,
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn convert(db: &TypeInterner, source: TypeId, target: TypeId) -> Cost {
    init_logging();
    compute_conversion_cost(db, ValueCategory::RValue, source, target, UdcMode::Allow, false)
}

fn convert_lvalue(db: &TypeInterner, source: TypeId, target: TypeId) -> Cost {
    init_logging();
    compute_conversion_cost(db, ValueCategory::LValue, source, target, UdcMode::Allow, false)
}

#[test]
fn test_identity_for_builtins_and_classes() {
    let db = TypeInterner::new();
    let c = db.add_class(ClassDefinition::new("C"));
    for ty in [TypeId::INT, TypeId::DOUBLE, db.pointer_to(TypeId::CHAR), db.class_type(c)] {
        let cost = convert(&db, ty, ty);
        assert_eq!(cost.rank(), Rank::Identity);
        assert_eq!(cost.inheritance_distance(), 0);
        assert_eq!(cost.qualification_adjustment(), 0);
    }
}

#[test]
fn test_derived_pointer_to_base_pointer() {
    let db = TypeInterner::new();
    let b = db.add_class(ClassDefinition::new("B"));
    let mid = db.add_class(ClassDefinition::new("Mid"));
    let d = db.add_class(ClassDefinition::new("D"));
    db.set_bases(mid, vec![base(b)]);
    db.set_bases(d, vec![base(mid)]);

    let d_ptr = db.pointer_to(db.class_type(d));
    let b_ptr = db.pointer_to(db.class_type(b));

    let cost = convert(&db, d_ptr, b_ptr);
    assert_eq!(cost.rank(), Rank::Conversion);
    assert_eq!(cost.inheritance_distance(), 2);

    // the relation is directional
    assert!(!convert(&db, b_ptr, d_ptr).converts());
}

#[test]
fn test_derived_class_to_base_class_by_value() {
    let db = TypeInterner::new();
    let b = db.add_class(ClassDefinition::new("B"));
    let d = db.add_class(ClassDefinition::new("D"));
    db.set_bases(d, vec![base(b)]);

    let cost = convert(&db, db.class_type(d), db.class_type(b));
    assert_eq!(cost.rank(), Rank::Conversion);
    assert_eq!(cost.inheritance_distance(), 1);
}

#[test]
fn test_pointer_to_void_is_worst_conversion_path() {
    let db = TypeInterner::new();
    let b = db.add_class(ClassDefinition::new("B"));
    let d = db.add_class(ClassDefinition::new("D"));
    db.set_bases(d, vec![base(b)]);

    let d_ptr = db.pointer_to(db.class_type(d));
    let void_ptr = db.pointer_to(TypeId::VOID);

    let to_void = convert(&db, d_ptr, void_ptr);
    assert_eq!(to_void.rank(), Rank::Conversion);
    assert_eq!(to_void.inheritance_distance(), VOID_POINTER_DISTANCE);

    let to_base = convert(&db, d_ptr, db.pointer_to(db.class_type(b)));
    assert_eq!(to_base.compare_to(&to_void), std::cmp::Ordering::Less);
}

#[test]
fn test_rvalue_class_binds_to_const_ref_only() {
    let db = TypeInterner::new();
    let c = db.add_class(ClassDefinition::new("C"));
    let c_ty = db.class_type(c);
    let const_ref = db.reference_to(db.qualified(CvQualifier::Const, c_ty));
    let plain_ref = db.reference_to(c_ty);

    let cost = convert(&db, c_ty, const_ref);
    assert_eq!(cost.rank(), Rank::Identity);
    assert_eq!(cost.qualification_adjustment(), 1);

    assert!(!convert(&db, c_ty, plain_ref).converts());
}

#[test]
fn test_lvalue_binds_directly() {
    let db = TypeInterner::new();
    let b = db.add_class(ClassDefinition::new("B"));
    let d = db.add_class(ClassDefinition::new("D"));
    db.set_bases(d, vec![base(b)]);

    let cost = convert_lvalue(&db, db.class_type(d), db.reference_to(db.class_type(d)));
    assert_eq!(cost.rank(), Rank::Identity);

    // direct binding through an inheritance edge has conversion rank
    let cost = convert_lvalue(&db, db.class_type(d), db.reference_to(db.class_type(b)));
    assert_eq!(cost.rank(), Rank::Conversion);
    assert_eq!(cost.inheritance_distance(), 1);
}

#[test]
fn test_reference_related_but_underqualified_is_ill_formed() {
    let db = TypeInterner::new();
    let c = db.add_class(ClassDefinition::new("C"));
    let c_ty = db.class_type(c);
    let volatile_c = db.qualified(CvQualifier::Volatile, c_ty);
    let const_ref = db.reference_to(db.qualified(CvQualifier::Const, c_ty));

    assert!(!convert(&db, volatile_c, const_ref).converts());
}

#[test]
fn test_qualification_only_beats_arithmetic_conversion() {
    let db = TypeInterner::new();
    let identity = convert(&db, TypeId::INT, TypeId::INT);

    let int_ptr = db.pointer_to(TypeId::INT);
    let const_int_ptr = db.pointer_to(db.qualified(CvQualifier::Const, TypeId::INT));
    let qualified = convert(&db, int_ptr, const_int_ptr);
    assert!(qualified.converts());
    assert_eq!(qualified.qualification_adjustment(), 1);

    let long = db.basic_with(BasicKind::Int, BasicModifiers::LONG);
    let arithmetic = convert(&db, TypeId::INT, long);
    assert_eq!(arithmetic.rank(), Rank::Conversion);

    assert_eq!(identity.compare_to(&qualified), std::cmp::Ordering::Less);
    assert_eq!(qualified.compare_to(&arithmetic), std::cmp::Ordering::Less);
}

#[test]
fn test_null_pointer_constant() {
    let db = TypeInterner::new();
    let zero = db.integer_literal(0);
    let seven = db.integer_literal(7);
    let int_ptr = db.pointer_to(TypeId::INT);
    let c = db.add_class(ClassDefinition::new("C"));
    let member_ptr = db.member_pointer(TypeId::INT, db.class_type(c));

    assert_eq!(convert(&db, zero, int_ptr).rank(), Rank::Conversion);
    assert_eq!(convert(&db, zero, member_ptr).rank(), Rank::Conversion);
    assert!(!convert(&db, seven, int_ptr).converts());
    assert!(!convert(&db, seven, member_ptr).converts());
}

#[test]
fn test_pointer_converts_to_bool() {
    let db = TypeInterner::new();
    let int_ptr = db.pointer_to(TypeId::INT);
    let cost = convert(&db, int_ptr, TypeId::BOOL);
    assert_eq!(cost.rank(), Rank::ConversionPtrBool);

    // a pointer to member converts to bool at the same rank
    let c = db.add_class(ClassDefinition::new("C"));
    let member_ptr = db.member_pointer(TypeId::INT, db.class_type(c));
    let member_cost = convert(&db, member_ptr, TypeId::BOOL);
    assert_eq!(member_cost.rank(), Rank::ConversionPtrBool);

    // loses a tie against a plain conversion of the same family
    let arithmetic = convert(&db, TypeId::INT, TypeId::DOUBLE);
    assert_eq!(arithmetic.compare_to(&cost), std::cmp::Ordering::Less);
}

#[test]
fn test_member_pointer_base_to_derived() {
    let db = TypeInterner::new();
    let b = db.add_class(ClassDefinition::new("B"));
    let d = db.add_class(ClassDefinition::new("D"));
    db.set_bases(d, vec![base(b)]);

    let in_base = db.member_pointer(TypeId::INT, db.class_type(b));
    let in_derived = db.member_pointer(TypeId::INT, db.class_type(d));

    // a pointer to member of a base converts toward the derived class
    let cost = convert(&db, in_base, in_derived);
    assert_eq!(cost.rank(), Rank::Conversion);
    assert_eq!(cost.inheritance_distance(), 1);

    assert!(!convert(&db, in_derived, in_base).converts());
}

#[test]
fn test_ambiguous_conversion_operators_for_reference_target() {
    let db = TypeInterner::new();
    let b = db.add_class(ClassDefinition::new("B"));
    let b_ref = db.reference_to(db.class_type(b));
    let s = db.add_class(ClassDefinition::new("S"));
    let op = ConversionOperator {
        return_type: b_ref,
        is_const: false,
        is_volatile: false,
        is_explicit: false,
    };
    db.set_conversion_operators(s, vec![op.clone(), op]);

    // two equally good operators: no usable candidate, not an arbitrary pick
    let cost = convert_lvalue(&db, db.class_type(s), b_ref);
    assert!(!cost.converts());
}

#[test]
fn test_single_conversion_operator_binds_reference() {
    let db = TypeInterner::new();
    let b = db.add_class(ClassDefinition::new("B"));
    let b_ref = db.reference_to(db.class_type(b));
    let s = db.add_class(ClassDefinition::new("S"));
    db.set_conversion_operators(
        s,
        vec![ConversionOperator {
            return_type: b_ref,
            is_const: false,
            is_volatile: false,
            is_explicit: false,
        }],
    );

    let cost = convert_lvalue(&db, db.class_type(s), b_ref);
    assert!(cost.converts());
    assert!(matches!(
        cost.user_defined(),
        Some(UserDefinedConversion::Operator { .. })
    ));
}

#[test]
fn test_converting_constructor() {
    let db = TypeInterner::new();
    let target = db.add_class(ClassDefinition::new("Wrapper"));
    db.set_constructors(
        target,
        vec![Constructor {
            is_explicit: false,
            params: vec![Param {
                ty: TypeId::INT,
                has_default: false,
            }],
            is_variadic: false,
        }],
    );

    let cost = convert(&db, TypeId::DOUBLE, db.class_type(target));
    assert!(cost.converts());
    assert!(matches!(
        cost.user_defined(),
        Some(UserDefinedConversion::Constructor { index: 0, .. })
    ));

    // forbidding user-defined conversions removes the only path
    let forbidden = compute_conversion_cost(
        &db,
        ValueCategory::RValue,
        TypeId::DOUBLE,
        db.class_type(target),
        UdcMode::Forbid,
        false,
    );
    assert!(!forbidden.converts());
}

#[test]
fn test_explicit_constructor_is_not_a_candidate() {
    let db = TypeInterner::new();
    let target = db.add_class(ClassDefinition::new("Wrapper"));
    db.set_constructors(
        target,
        vec![Constructor {
            is_explicit: true,
            params: vec![Param {
                ty: TypeId::INT,
                has_default: false,
            }],
            is_variadic: false,
        }],
    );

    assert!(!convert(&db, TypeId::INT, db.class_type(target)).converts());
}

#[test]
fn test_conversion_operator_to_non_class_target() {
    let db = TypeInterner::new();
    let s = db.add_class(ClassDefinition::new("S"));
    db.set_conversion_operators(
        s,
        vec![ConversionOperator {
            return_type: TypeId::INT,
            is_const: true,
            is_volatile: false,
            is_explicit: false,
        }],
    );

    // operator int() followed by int -> double
    let cost = convert_lvalue(&db, db.class_type(s), TypeId::DOUBLE);
    assert!(cost.converts());
    assert!(matches!(
        cost.user_defined(),
        Some(UserDefinedConversion::Operator { index: 0, .. })
    ));
}

#[test]
fn test_deferred_udc_returns_placeholder() {
    let db = TypeInterner::new();
    let target = db.add_class(ClassDefinition::new("Wrapper"));
    db.set_constructors(
        target,
        vec![Constructor {
            is_explicit: false,
            params: vec![Param {
                ty: TypeId::INT,
                has_default: false,
            }],
            is_variadic: false,
        }],
    );

    let cost = compute_conversion_cost(
        &db,
        ValueCategory::RValue,
        TypeId::INT,
        db.class_type(target),
        UdcMode::Defer,
        false,
    );
    assert_eq!(cost.rank(), Rank::UserDefined);
    assert!(cost.is_deferred_udc());
}

#[test]
fn test_variadic_constructor_converts_at_ellipsis_rank() {
    let db = TypeInterner::new();
    let target = db.add_class(ClassDefinition::new("Sink"));
    db.set_constructors(
        target,
        vec![Constructor {
            is_explicit: false,
            params: vec![],
            is_variadic: true,
        }],
    );

    let cost = convert(&db, TypeId::INT, db.class_type(target));
    assert!(cost.converts());
    assert!(cost.user_defined().is_some());
}

#[test]
fn test_unsigned_short_promotion_depends_on_int_width() {
    let db = TypeInterner::new();
    let unsigned_short =
        db.basic_with(BasicKind::Int, BasicModifiers::SHORT | BasicModifiers::UNSIGNED);

    // 32-bit int represents every unsigned short: promotes to int
    let wide = ConversionChecker::new(&db);
    let cost = wide.check(
        ValueCategory::RValue,
        unsigned_short,
        TypeId::INT,
        UdcMode::Allow,
        false,
    );
    assert_eq!(cost.rank(), Rank::Promotion);
    let cost = wide.check(
        ValueCategory::RValue,
        unsigned_short,
        TypeId::UNSIGNED_INT,
        UdcMode::Allow,
        false,
    );
    assert_eq!(cost.rank(), Rank::Conversion);

    // 16-bit int does not: promotes to unsigned int instead
    let narrow = ConversionChecker::new(&db).with_widths(IntegerWidths {
        short_bits: 16,
        int_bits: 16,
    });
    let cost = narrow.check(
        ValueCategory::RValue,
        unsigned_short,
        TypeId::UNSIGNED_INT,
        UdcMode::Allow,
        false,
    );
    assert_eq!(cost.rank(), Rank::Promotion);
    let cost = narrow.check(
        ValueCategory::RValue,
        unsigned_short,
        TypeId::INT,
        UdcMode::Allow,
        false,
    );
    assert_eq!(cost.rank(), Rank::Conversion);
}

#[test]
fn test_enum_promotion_matches_underlying_int() {
    let db = TypeInterner::new();
    let e = db.add_enum(cxxconv_types::EnumDefinition::new("E"));
    let e_ty = db.enum_type(e);

    assert_eq!(convert(&db, e_ty, TypeId::INT).rank(), Rank::Promotion);
    assert_eq!(convert(&db, e_ty, TypeId::DOUBLE).rank(), Rank::Conversion);
    // an unsigned target does not match a plain-int representation
    assert_eq!(convert(&db, e_ty, TypeId::UNSIGNED_INT).rank(), Rank::Conversion);
}

#[test]
fn test_string_literal_decays_to_non_const_char_pointer() {
    let db = TypeInterner::new();
    let literal = db.string_literal_type(6);
    let char_ptr = db.pointer_to(TypeId::CHAR);
    let const_char_ptr = db.pointer_to(db.qualified(CvQualifier::Const, TypeId::CHAR));

    let cost = convert(&db, literal, char_ptr);
    assert_eq!(cost.rank(), Rank::LvalueTransformation);
    assert_eq!(cost.qualification_adjustment(), 1);

    // the ordinary decay to a const pointee costs no adjustment
    let cost = convert(&db, literal, const_char_ptr);
    assert_eq!(cost.rank(), Rank::LvalueTransformation);
    assert_eq!(cost.qualification_adjustment(), 0);
}

#[test]
fn test_qualification_adjustment_round_trip() {
    let db = TypeInterner::new();
    // char** -> const char* const*
    let char_ptr_ptr = db.pointer_to(db.pointer_to(TypeId::CHAR));
    let const_char = db.qualified(CvQualifier::Const, TypeId::CHAR);
    let target = db.pointer_to(db.pointer_cv(const_char, CvQualifier::Const));

    let cost = convert(&db, char_ptr_ptr, target);
    assert!(cost.converts());

    let steps = cost.qualification_steps();
    assert_eq!(steps.len(), 2);
    // leaf gained const, the inner pointer level gained const
    assert!(steps[0].const_added && !steps[0].volatile_added);
    assert!(steps[1].const_added && !steps[1].volatile_added);
}

#[test]
fn test_adding_const_at_depth_requires_const_in_between() {
    let db = TypeInterner::new();
    // char** -> const char** is ill-formed; the const* const* form is fine
    let char_ptr_ptr = db.pointer_to(db.pointer_to(TypeId::CHAR));
    let const_char = db.qualified(CvQualifier::Const, TypeId::CHAR);
    let bad_target = db.pointer_to(db.pointer_to(const_char));

    assert!(!convert(&db, char_ptr_ptr, bad_target).converts());
}

#[test]
fn test_lvalue_to_rvalue_strips_qualifiers() {
    let db = TypeInterner::new();
    let const_int_ref = db.reference_to(db.qualified(CvQualifier::Const, TypeId::INT));

    let cost = convert(&db, const_int_ref, TypeId::INT);
    assert_eq!(cost.rank(), Rank::LvalueTransformation);
    assert_eq!(cost.qualification_adjustment(), 0);
}

#[test]
fn test_function_to_pointer_decay() {
    let db = TypeInterner::new();
    let f = db.function(vec![TypeId::INT], TypeId::VOID);
    let f_ptr = db.pointer_to(f);

    let cost = convert(&db, f, f_ptr);
    assert_eq!(cost.rank(), Rank::LvalueTransformation);
}

#[test]
fn test_typedefs_are_transparent() {
    let db = TypeInterner::new();
    let named = db.typedef("myint", TypeId::INT);
    assert_eq!(convert(&db, named, TypeId::INT).rank(), Rank::Identity);
    assert_eq!(convert(&db, TypeId::INT, named).rank(), Rank::Identity);
}
