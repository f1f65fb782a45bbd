//! Field resolution and value comparison.
//!
//! The matcher layer answers one question for the evaluator: does a single
//! compiled predicate hold for a single event.
//!
//! ## Components
//!
//! - [`FieldResolver`] - Walks dotted paths through nested JSON, fanning out over arrays into a [`Resolved`] set
//! - [`EventContext`] - Picks the resolution root for a path within one event record
//! - [`Scalar`] - Typed comparison values and coercion of raw JSON
//! - [`comparators`] - The comparison operators over resolved values
//!
//! ## Example Usage
//!
//! ```rust
//! use criteria_engine::matcher::{comparators, EventContext};
//! use criteria_engine::{ComparatorType, EventRecord, FieldPredicate, FieldType, Operand};
//! use criteria_engine::matcher::Scalar;
//! use serde_json::json;
//!
//! let predicate = FieldPredicate::new(
//!     "milestoneYears",
//!     FieldType::Long,
//!     ComparatorType::Equals,
//!     Operand::Values(vec![Scalar::Long(1997)]),
//! );
//!
//! let event = EventRecord::user(json!({"milestoneYears": [1996, 1997, 2002]}));
//! let context = EventContext::new(&event, 1024);
//! assert!(comparators::evaluate(&predicate, &context.resolve_field(&predicate)));
//! ```

pub mod comparators;
pub mod context;
pub mod fields;
pub mod types;

pub use context::EventContext;
pub use fields::{FieldResolver, Resolved};
pub use types::{is_set_value, Scalar};
