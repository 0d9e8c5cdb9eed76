//! Implicit conversion sequence costing for C++ overload resolution.
//!
//! Given a source type with a value category and a target type, the engine
//! decides whether an implicit conversion sequence exists and how good it is,
//! following the layered standard rules: lvalue transformations, integral and
//! floating promotions, standard conversions, qualification adjustment,
//! reference binding, and user-defined conversions through constructors and
//! conversion operators.
//!
//! The result is a [`Cost`]; candidates are ranked with [`Cost::compare_to`].
//! An impossible conversion is an ordinary [`Rank::NoMatch`] cost, not an
//! error. The engine holds no mutable state and only reads from the
//! [`TypeDatabase`](cxxconv_types::TypeDatabase), so checks for independent
//! candidates may run concurrently.
//!
//! ```
//! use cxxconv_engine::{Rank, UdcMode, ValueCategory, compute_conversion_cost};
//! use cxxconv_types::{TypeId, TypeInterner};
//!
//! let db = TypeInterner::new();
//! let cost = compute_conversion_cost(
//!     &db,
//!     ValueCategory::RValue,
//!     TypeId::INT,
//!     TypeId::DOUBLE,
//!     UdcMode::Allow,
//!     false,
//! );
//! assert_eq!(cost.rank(), Rank::Conversion);
//! ```

mod checker;
mod cost;
mod hierarchy;
mod standard;
mod udc;

pub use checker::{ConversionChecker, UdcMode, ValueCategory, compute_conversion_cost};
pub use cost::{Cost, QualificationStep, Rank, UserDefinedConversion};
pub use hierarchy::{MAX_INHERITANCE_DEPTH, inheritance_distance};
pub use standard::{IntegerWidths, VOID_POINTER_DISTANCE};
