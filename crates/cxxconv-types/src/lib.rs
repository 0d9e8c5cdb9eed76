//! Interned C++ type model for the cxxconv conversion cost engine.
//!
//! This crate supplies everything the engine treats as an external service:
//! the structural type graph ([`TypeData`] behind interned [`TypeId`]s), the
//! [`TypeDatabase`] trait bundling the class hierarchy, overload candidate,
//! constant evaluator and completeness services, the [`TypeInterner`]
//! reference implementation, and the strip/classification query layer.
//!
//! Key properties:
//! - O(1) identity for interned nodes; structural comparison via
//!   [`same_type`] resolves typedefs and ignores literal provenance
//! - Types are immutable and shared; the engine only ever interns new
//!   derived nodes
//! - All services are safe for concurrent read access

mod db;
mod intern;
pub mod queries;
pub mod types;

pub use db::TypeDatabase;
pub use intern::TypeInterner;
pub use queries::{StripMask, add_qualifiers, as_class, cv_qualifier_of, is_class, is_void, same_type, strip};
pub use types::{
    AccessSpecifier, BaseSpecifier, BasicKind, BasicModifiers, ClassDefinition, ClassId,
    Constructor, ConversionOperator, CvQualifier, EnumDefinition, EnumId, ExprId, ExprKind, Param,
    TypeData, TypeId,
};
