//! Structural C++ type representation with interning.
//!
//! Types are immutable values identified by [`TypeId`]. The conversion engine
//! never mutates a type; transformations (pointer decay, qualifier rewrites)
//! intern fresh derived types instead. Identity is structural for compound
//! types and nominal for classes and enumerations, which are represented by
//! an id into the database's definition tables.

use bitflags::bitflags;

/// Interned type handle. Two equal ids always denote the same interned node;
/// structural equality across distinct ids is answered by
/// [`same_type`](crate::queries::same_type), which resolves typedefs and
/// ignores originating expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    // Pre-interned ids, seeded by `TypeInterner::new` in this order.
    pub const VOID: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);
    pub const CHAR: TypeId = TypeId(2);
    pub const INT: TypeId = TypeId(3);
    pub const UNSIGNED_INT: TypeId = TypeId(4);
    pub const FLOAT: TypeId = TypeId(5);
    pub const DOUBLE: TypeId = TypeId(6);

    pub(crate) const FIRST_FREE: u32 = 7;
}

/// Nominal handle for a class definition in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

/// Nominal handle for an enumeration definition in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumId(pub u32);

/// Handle for an expression known to the constant evaluator. Only the facts
/// the engine needs are queryable: integer-constant value and
/// string-literal-ness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub u32);

/// Kind of a basic (built-in) type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    /// Implicit int, e.g. from old-style declarations.
    Unspecified,
    Void,
    Bool,
    Char,
    WChar,
    Int,
    Float,
    Double,
}

bitflags! {
    /// Modifier flags carried by a basic type or by an enumeration's
    /// underlying integer representation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BasicModifiers: u8 {
        const SHORT = 1 << 0;
        const LONG = 1 << 1;
        const LONG_LONG = 1 << 2;
        const SIGNED = 1 << 3;
        const UNSIGNED = 1 << 4;
    }
}

impl BasicModifiers {
    /// The modifiers that matter for enum-promotion matching.
    pub const PROMOTION_RELEVANT: BasicModifiers = BasicModifiers::SHORT
        .union(BasicModifiers::LONG)
        .union(BasicModifiers::LONG_LONG)
        .union(BasicModifiers::UNSIGNED);
}

/// Const/volatile qualification of a type or pointer level.
///
/// There is a partial order on qualifiers: `cv1` is at least as qualified as
/// `cv2` when every qualifier of `cv2` is present on `cv1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CvQualifier {
    #[default]
    None,
    Const,
    Volatile,
    ConstVolatile,
}

impl CvQualifier {
    pub fn from_parts(is_const: bool, is_volatile: bool) -> CvQualifier {
        match (is_const, is_volatile) {
            (false, false) => CvQualifier::None,
            (true, false) => CvQualifier::Const,
            (false, true) => CvQualifier::Volatile,
            (true, true) => CvQualifier::ConstVolatile,
        }
    }

    pub fn is_const(self) -> bool {
        matches!(self, CvQualifier::Const | CvQualifier::ConstVolatile)
    }

    pub fn is_volatile(self) -> bool {
        matches!(self, CvQualifier::Volatile | CvQualifier::ConstVolatile)
    }

    fn bits(self) -> u8 {
        (self.is_const() as u8) | ((self.is_volatile() as u8) << 1)
    }

    /// Union of two qualifier sets.
    pub fn merge(self, other: CvQualifier) -> CvQualifier {
        CvQualifier::from_parts(
            self.is_const() || other.is_const(),
            self.is_volatile() || other.is_volatile(),
        )
    }

    /// Partial-order comparison: is `self` at least as qualified as `other`?
    ///
    /// Returns the additions needed to get from `other` to `self` as a 2-bit
    /// code (bit 0 = const added, bit 1 = volatile added), so `Some(0)` means
    /// equal qualification. Returns `None` when `self` is less qualified than
    /// `other` or the two are incomparable.
    pub fn compare(self, other: CvQualifier) -> Option<u8> {
        let a = self.bits();
        let b = other.bits();
        if b & !a != 0 {
            return None;
        }
        Some(a & !b)
    }
}

/// Closed sum of all type shapes the engine can encounter. Every conversion
/// stage matches exhaustively on this, so adding a variant forces each stage
/// to take a position on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeData {
    /// Built-in arithmetic or void type. `literal` records the expression the
    /// type was created from, when any; it is consulted for
    /// null-pointer-constant and string-literal detection and ignored by
    /// structural equality.
    Basic {
        kind: BasicKind,
        modifiers: BasicModifiers,
        literal: Option<ExprId>,
    },
    /// `cv`-qualified pointer to `pointee` (the cv applies to the pointer
    /// itself, as in `T* const`).
    Pointer { pointee: TypeId, cv: CvQualifier },
    /// Pointer to member of `member_of` with member type `pointee`.
    PointerToMember {
        pointee: TypeId,
        member_of: TypeId,
        cv: CvQualifier,
    },
    Array {
        element: TypeId,
        size: Option<u64>,
    },
    Function {
        params: Vec<TypeId>,
        ret: TypeId,
    },
    Class(ClassId),
    Enum(EnumId),
    Reference { referent: TypeId },
    /// Top-level cv qualification of `inner`. `inner` is never itself a
    /// `Qualified` or `Reference` node; construction merges nested
    /// qualifiers instead.
    Qualified { cv: CvQualifier, inner: TypeId },
    Typedef { name: String, aliased: TypeId },
}

/// Base-class access, carried through from the class hierarchy service.
/// The conversion engine records but does not filter on it; access checking
/// belongs to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSpecifier {
    Public,
    Protected,
    Private,
}

/// One direct base class of a class definition, in declaration order.
#[derive(Debug, Clone)]
pub struct BaseSpecifier {
    pub class: ClassId,
    pub access: AccessSpecifier,
    pub is_virtual: bool,
}

/// A constructor parameter as the overload candidate service reports it.
#[derive(Debug, Clone)]
pub struct Param {
    pub ty: TypeId,
    pub has_default: bool,
}

/// A constructor candidate of a class.
#[derive(Debug, Clone)]
pub struct Constructor {
    pub is_explicit: bool,
    pub params: Vec<Param>,
    pub is_variadic: bool,
}

/// A conversion operator candidate (`operator T()`) of a class.
#[derive(Debug, Clone)]
pub struct ConversionOperator {
    pub return_type: TypeId,
    /// Qualification of the implicit object parameter.
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_explicit: bool,
}

/// Everything the engine asks of a class: bases in declaration order,
/// overload candidates, completeness, and the primary template when the
/// class is a specialization.
#[derive(Debug, Clone)]
pub struct ClassDefinition {
    pub name: String,
    pub bases: Vec<BaseSpecifier>,
    pub constructors: Vec<Constructor>,
    pub conversion_operators: Vec<ConversionOperator>,
    /// For template specializations, the primary template's class id.
    /// Inheritance matching accepts a base equal to an ancestor's primary.
    pub specialized_from: Option<ClassId>,
    pub is_complete: bool,
}

impl ClassDefinition {
    pub fn new(name: impl Into<String>) -> ClassDefinition {
        ClassDefinition {
            name: name.into(),
            bases: Vec::new(),
            constructors: Vec::new(),
            conversion_operators: Vec::new(),
            specialized_from: None,
            is_complete: true,
        }
    }
}

/// An enumeration definition. `int_modifiers` is the modifier set of the
/// smallest standard integer type that holds the enumerators, used to match
/// promotion targets.
#[derive(Debug, Clone)]
pub struct EnumDefinition {
    pub name: String,
    pub int_modifiers: BasicModifiers,
}

impl EnumDefinition {
    pub fn new(name: impl Into<String>) -> EnumDefinition {
        EnumDefinition {
            name: name.into(),
            int_modifiers: BasicModifiers::empty(),
        }
    }
}

/// The facts the constant evaluator exposes about an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprKind {
    IntegerConstant(i64),
    StringLiteral,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifier_partial_order_additions() {
        use CvQualifier::*;
        // additions bitmask: bit 0 = const, bit 1 = volatile
        assert_eq!(ConstVolatile.compare(None), Some(3));
        assert_eq!(ConstVolatile.compare(Const), Some(2));
        assert_eq!(ConstVolatile.compare(Volatile), Some(1));
        assert_eq!(ConstVolatile.compare(ConstVolatile), Some(0));
        assert_eq!(Const.compare(None), Some(1));
        assert_eq!(Volatile.compare(None), Some(2));
        assert_eq!(None.compare(None), Some(0));
    }

    #[test]
    fn qualifier_partial_order_incomparable() {
        use CvQualifier::*;
        assert_eq!(Const.compare(Volatile), Option::None);
        assert_eq!(Volatile.compare(Const), Option::None);
        assert_eq!(None.compare(Const), Option::None);
        assert_eq!(None.compare(ConstVolatile), Option::None);
        assert_eq!(Const.compare(ConstVolatile), Option::None);
    }

    #[test]
    fn qualifier_merge() {
        use CvQualifier::*;
        assert_eq!(Const.merge(Volatile), ConstVolatile);
        assert_eq!(None.merge(Const), Const);
        assert_eq!(ConstVolatile.merge(None), ConstVolatile);
    }

    #[test]
    fn basic_modifiers_promotion_mask_excludes_signed() {
        assert!(!BasicModifiers::PROMOTION_RELEVANT.contains(BasicModifiers::SIGNED));
        assert!(BasicModifiers::PROMOTION_RELEVANT.contains(BasicModifiers::UNSIGNED));
    }
}
