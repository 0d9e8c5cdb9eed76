//! Reference implementation of [`TypeDatabase`]: a concurrent-read type
//! interner plus registration tables for classes, enumerations and
//! expressions.
//!
//! Interning gives O(1) identity for structurally identical nodes and lets
//! the engine synthesize derived types (decayed pointers, qualified
//! temporaries) mid-computation without touching the original graph. All
//! methods take `&self`; reads and writes are safe from any number of
//! threads.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use crate::db::TypeDatabase;
use crate::types::{
    BasicKind, BasicModifiers, ClassDefinition, ClassId, Constructor, ConversionOperator,
    CvQualifier, EnumDefinition, EnumId, ExprId, ExprKind, TypeData, TypeId,
};

pub struct TypeInterner {
    ids: DashMap<TypeData, TypeId, FxBuildHasher>,
    nodes: RwLock<Vec<TypeData>>,
    classes: RwLock<Vec<Arc<ClassDefinition>>>,
    enums: RwLock<Vec<Arc<EnumDefinition>>>,
    exprs: RwLock<Vec<ExprKind>>,
}

impl TypeInterner {
    pub fn new() -> TypeInterner {
        let interner = TypeInterner {
            ids: DashMap::default(),
            nodes: RwLock::new(Vec::new()),
            classes: RwLock::new(Vec::new()),
            enums: RwLock::new(Vec::new()),
            exprs: RwLock::new(Vec::new()),
        };
        // Seed order must match the TypeId constants.
        for kind in [
            BasicKind::Void,
            BasicKind::Bool,
            BasicKind::Char,
            BasicKind::Int,
        ] {
            interner.intern(basic_data(kind, BasicModifiers::empty()));
        }
        interner.intern(basic_data(BasicKind::Int, BasicModifiers::UNSIGNED));
        interner.intern(basic_data(BasicKind::Float, BasicModifiers::empty()));
        interner.intern(basic_data(BasicKind::Double, BasicModifiers::empty()));
        debug_assert_eq!(
            interner.nodes.read().map(|n| n.len()).unwrap_or(0) as u32,
            TypeId::FIRST_FREE
        );
        interner
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    pub fn add_class(&self, def: ClassDefinition) -> ClassId {
        let mut classes = self.classes.write().unwrap_or_else(|e| e.into_inner());
        let id = ClassId(classes.len() as u32);
        classes.push(Arc::new(def));
        id
    }

    pub fn add_enum(&self, def: EnumDefinition) -> EnumId {
        let mut enums = self.enums.write().unwrap_or_else(|e| e.into_inner());
        let id = EnumId(enums.len() as u32);
        enums.push(Arc::new(def));
        id
    }

    pub fn add_expression(&self, kind: ExprKind) -> ExprId {
        let mut exprs = self.exprs.write().unwrap_or_else(|e| e.into_inner());
        let id = ExprId(exprs.len() as u32);
        exprs.push(kind);
        id
    }

    /// Replace a class's constructor list. Members often need the class's own
    /// type id, so registration happens in two steps: `add_class`, then the
    /// member setters.
    pub fn set_constructors(&self, class: ClassId, constructors: Vec<Constructor>) {
        self.update_class(class, |def| def.constructors = constructors);
    }

    pub fn set_conversion_operators(&self, class: ClassId, operators: Vec<ConversionOperator>) {
        self.update_class(class, |def| def.conversion_operators = operators);
    }

    pub fn set_bases(&self, class: ClassId, bases: Vec<crate::types::BaseSpecifier>) {
        self.update_class(class, |def| def.bases = bases);
    }

    pub fn set_complete(&self, class: ClassId, is_complete: bool) {
        self.update_class(class, |def| def.is_complete = is_complete);
    }

    fn update_class(&self, class: ClassId, f: impl FnOnce(&mut ClassDefinition)) {
        let mut classes = self.classes.write().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = classes.get_mut(class.0 as usize) {
            let mut def = (**slot).clone();
            f(&mut def);
            *slot = Arc::new(def);
        } else {
            tracing::warn!(class = class.0, "update for unknown class ignored");
        }
    }

    // -----------------------------------------------------------------------
    // Construction conveniences
    // -----------------------------------------------------------------------

    pub fn basic(&self, kind: BasicKind) -> TypeId {
        self.intern(basic_data(kind, BasicModifiers::empty()))
    }

    pub fn basic_with(&self, kind: BasicKind, modifiers: BasicModifiers) -> TypeId {
        self.intern(basic_data(kind, modifiers))
    }

    /// An `int` type carrying an integer-constant expression, as a literal in
    /// source would produce. `integer_literal(0)` is a null pointer constant.
    pub fn integer_literal(&self, value: i64) -> TypeId {
        let expr = self.add_expression(ExprKind::IntegerConstant(value));
        self.intern(TypeData::Basic {
            kind: BasicKind::Int,
            modifiers: BasicModifiers::empty(),
            literal: Some(expr),
        })
    }

    /// The type of a string literal of `len` characters: array of const char,
    /// element marked as created from a string-literal expression.
    pub fn string_literal_type(&self, len: u64) -> TypeId {
        let expr = self.add_expression(ExprKind::StringLiteral);
        let element = self.intern(TypeData::Basic {
            kind: BasicKind::Char,
            modifiers: BasicModifiers::empty(),
            literal: Some(expr),
        });
        let const_char = self.qualified(CvQualifier::Const, element);
        self.array_of(const_char, Some(len))
    }

    pub fn pointer_to(&self, pointee: TypeId) -> TypeId {
        self.pointer_cv(pointee, CvQualifier::None)
    }

    pub fn pointer_cv(&self, pointee: TypeId, cv: CvQualifier) -> TypeId {
        self.intern(TypeData::Pointer { pointee, cv })
    }

    pub fn member_pointer(&self, pointee: TypeId, member_of: TypeId) -> TypeId {
        self.intern(TypeData::PointerToMember {
            pointee,
            member_of,
            cv: CvQualifier::None,
        })
    }

    pub fn array_of(&self, element: TypeId, size: Option<u64>) -> TypeId {
        self.intern(TypeData::Array { element, size })
    }

    pub fn function(&self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.intern(TypeData::Function { params, ret })
    }

    pub fn reference_to(&self, referent: TypeId) -> TypeId {
        self.intern(TypeData::Reference { referent })
    }

    pub fn qualified(&self, cv: CvQualifier, inner: TypeId) -> TypeId {
        // merges with an existing qualifier so Qualified never nests
        crate::queries::add_qualifiers(self, inner, cv)
    }

    pub fn typedef(&self, name: impl Into<String>, aliased: TypeId) -> TypeId {
        self.intern(TypeData::Typedef {
            name: name.into(),
            aliased,
        })
    }

    pub fn class_type(&self, id: ClassId) -> TypeId {
        self.intern(TypeData::Class(id))
    }

    pub fn enum_type(&self, id: EnumId) -> TypeId {
        self.intern(TypeData::Enum(id))
    }
}

impl TypeDatabase for TypeInterner {
    fn type_data(&self, id: TypeId) -> TypeData {
        let nodes = self.nodes.read().unwrap_or_else(|e| e.into_inner());
        match nodes.get(id.0 as usize) {
            Some(data) => data.clone(),
            None => {
                tracing::warn!(id = id.0, "lookup of unknown type id");
                basic_data(BasicKind::Unspecified, BasicModifiers::empty())
            }
        }
    }

    fn intern(&self, data: TypeData) -> TypeId {
        if let Some(existing) = self.ids.get(&data) {
            return *existing;
        }
        let mut nodes = self.nodes.write().unwrap_or_else(|e| e.into_inner());
        // Re-check under the write lock: another thread may have interned
        // the same node between the lookup above and acquiring the lock.
        if let Some(existing) = self.ids.get(&data) {
            return *existing;
        }
        let id = TypeId(nodes.len() as u32);
        nodes.push(data.clone());
        self.ids.insert(data, id);
        id
    }

    fn class_definition(&self, id: ClassId) -> Option<Arc<ClassDefinition>> {
        let classes = self.classes.read().unwrap_or_else(|e| e.into_inner());
        classes.get(id.0 as usize).cloned()
    }

    fn enum_definition(&self, id: EnumId) -> Option<Arc<EnumDefinition>> {
        let enums = self.enums.read().unwrap_or_else(|e| e.into_inner());
        enums.get(id.0 as usize).cloned()
    }

    fn evaluate_integer_constant(&self, expr: ExprId) -> Option<i64> {
        let exprs = self.exprs.read().unwrap_or_else(|e| e.into_inner());
        match exprs.get(expr.0 as usize) {
            Some(ExprKind::IntegerConstant(v)) => Some(*v),
            _ => None,
        }
    }

    fn is_string_literal(&self, expr: ExprId) -> bool {
        let exprs = self.exprs.read().unwrap_or_else(|e| e.into_inner());
        matches!(exprs.get(expr.0 as usize), Some(ExprKind::StringLiteral))
    }
}

fn basic_data(kind: BasicKind, modifiers: BasicModifiers) -> TypeData {
    TypeData::Basic {
        kind,
        modifiers,
        literal: None,
    }
}
