//! # Criteria Completion Engine
//!
//! Decides, entirely on the device, whether a user's local event history
//! satisfies any of the server-defined criteria sets of an in-app marketing
//! campaign. A criteria set is a boolean tree of event-type-scoped field
//! predicates; the first set the event log completes is reported by id.
//!
//! ## Quick Start
//!
//! ```rust
//! use criteria_engine::CriteriaCompletionChecker;
//!
//! let definition = r#"{
//!     "count": 1,
//!     "criteriaSets": [{
//!         "criteriaId": "285",
//!         "name": "David spent 10",
//!         "searchQuery": {
//!             "combinator": "And",
//!             "searchQueries": [
//!                 {
//!                     "dataType": "user",
//!                     "searchCombo": {
//!                         "combinator": "And",
//!                         "searchQueries": [{
//!                             "dataType": "user",
//!                             "field": "firstName",
//!                             "fieldType": "string",
//!                             "comparatorType": "Equals",
//!                             "value": "David"
//!                         }]
//!                     }
//!                 },
//!                 {
//!                     "dataType": "customEvent",
//!                     "searchCombo": {
//!                         "combinator": "And",
//!                         "searchQueries": [{
//!                             "dataType": "customEvent",
//!                             "field": "total",
//!                             "fieldType": "double",
//!                             "comparatorType": "Equals",
//!                             "value": "10"
//!                         }]
//!                     }
//!                 }
//!             ]
//!         }
//!     }]
//! }"#;
//!
//! let event_log = r#"[
//!     {"eventType": "user", "dataFields": {"firstName": "David"}},
//!     {"eventType": "customEvent", "eventName": "checkout", "dataFields": {"total": "10"}}
//! ]"#;
//!
//! let checker = CriteriaCompletionChecker::new();
//! let matched = checker.get_matched_criteria(definition, event_log)?;
//! assert_eq!(matched.as_deref(), Some("285"));
//! # Ok::<(), criteria_engine::CriteriaError>(())
//! ```
//!
//! ### Compile Once, Evaluate Many
//!
//! ```rust
//! use criteria_engine::{Compiler, CriteriaCompletionChecker, EventLog, EventRecord};
//! use serde_json::json;
//!
//! let definition = Compiler::new().compile_value(&json!({
//!     "criteriaSets": [{
//!         "criteriaId": "cart",
//!         "searchQuery": {
//!             "dataType": "cartUpdate",
//!             "minMatch": 2,
//!             "maxMatch": 3,
//!             "searchCombo": {
//!                 "combinator": "And",
//!                 "searchQueries": [{
//!                     "field": "updateCart.updatedShoppingCartItems.price",
//!                     "fieldType": "double",
//!                     "comparatorType": "GreaterThanOrEqualTo",
//!                     "value": "50"
//!                 }]
//!             }
//!         }
//!     }]
//! }))?;
//!
//! let checker = CriteriaCompletionChecker::new();
//! let mut log = EventLog::new();
//! log.push(EventRecord::cart_update(vec![json!({"price": 60})]));
//! assert_eq!(checker.matched_criteria(&definition, &log), None);
//!
//! log.push(EventRecord::cart_update(vec![json!({"price": 75})]));
//! assert_eq!(checker.matched_criteria(&definition, &log).as_deref(), Some("cart"));
//! # Ok::<(), criteria_engine::CriteriaError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`compiler`] - Tolerant parsing of criteria JSON into the typed tree in [`ir`]
//! - [`matcher`] - Field path resolution and value comparison for one event
//! - [`evaluator`] - Boolean combination and minMatch/maxMatch counting over the log
//! - [`engine`] - The [`CriteriaCompletionChecker`] entry point
//!
//! ## Failure Semantics
//!
//! Only unusable inputs are errors: text that is not JSON, a definition with
//! no `criteriaSets` array, an event log that is not an array. Anything else
//! that cannot be understood (unknown comparators, missing attributes,
//! unparsable numbers, absent fields) makes the affected node non-matching
//! and is reported through `tracing`. The crate never installs a subscriber.

pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod event;
pub mod ir;
pub mod matcher;

pub use compiler::{Compiler, FieldMapping};
pub use config::{EngineConfig, InvertedRangePolicy, ParallelConfig};
pub use engine::{CriteriaCompletionChecker, CriteriaEvaluation};
pub use error::{CriteriaError, Result};
pub use evaluator::{LogicalExpressionEvaluator, MatchResult, Verdict};
pub use event::{EventLog, EventRecord};
pub use ir::{
    Combinator, ComparatorType, CriteriaSet, CriteriaSetDefinition, DataType, FieldPredicate,
    FieldType, MatchBounds, Operand, Predicate, QueryNode, SearchCombo,
};
