//! The database trait the conversion engine computes over.
//!
//! The engine is a pure function library; everything it needs from the
//! surrounding front end (type graph, class hierarchy, overload candidates,
//! constant evaluation, completeness) is reached through this one trait.
//! Implementations must be safe for concurrent read access: the engine takes
//! `&dyn TypeDatabase` and may be driven from any number of threads at once.

use std::sync::Arc;

use crate::types::{ClassDefinition, ClassId, EnumDefinition, EnumId, ExprId, TypeData, TypeId};

pub trait TypeDatabase: Sync {
    /// Resolve an interned id to its structural data.
    fn type_data(&self, id: TypeId) -> TypeData;

    /// Intern a (possibly new) type, returning its id. Interning an already
    /// known structure returns the existing id.
    fn intern(&self, data: TypeData) -> TypeId;

    /// Class hierarchy / overload candidate service. `None` means the class
    /// is unknown to the database; callers treat that as incomplete and
    /// conservatively reject.
    fn class_definition(&self, id: ClassId) -> Option<Arc<ClassDefinition>>;

    fn enum_definition(&self, id: EnumId) -> Option<Arc<EnumDefinition>>;

    /// Constant evaluator: the integer value of a constant expression, if it
    /// is one. Used solely to detect null pointer constants.
    fn evaluate_integer_constant(&self, expr: ExprId) -> Option<i64>;

    /// Whether the expression is a string literal (array-decay special case).
    fn is_string_literal(&self, expr: ExprId) -> bool;
}
