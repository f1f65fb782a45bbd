//! Criteria definition compiler.
//!
//! This module turns the server-delivered criteria JSON into the typed tree in
//! [`crate::ir`], ready to be evaluated against any number of event logs.
//!
//! The compiler is organized into two sub-modules:
//! - [`field_mapping`] - Field path alias normalization
//! - [`parser`] - Tolerant parsing of criteria sets, query nodes and predicates
//!
//! # Examples
//!
//! ```rust
//! use criteria_engine::Compiler;
//!
//! let compiler = Compiler::new();
//! let definition = compiler.compile_str(r#"{
//!     "count": 1,
//!     "criteriaSets": [{
//!         "criteriaId": "285",
//!         "name": "David signed up",
//!         "searchQuery": {
//!             "combinator": "And",
//!             "searchQueries": [{
//!                 "dataType": "user",
//!                 "searchCombo": {
//!                     "combinator": "And",
//!                     "searchQueries": [{
//!                         "dataType": "user",
//!                         "field": "firstName",
//!                         "fieldType": "string",
//!                         "comparatorType": "Equals",
//!                         "value": "David"
//!                     }]
//!                 }
//!             }]
//!         }
//!     }]
//! }"#)?;
//!
//! assert_eq!(definition.len(), 1);
//! assert_eq!(definition.criteria_sets[0].criteria_id, "285");
//! # Ok::<(), criteria_engine::CriteriaError>(())
//! ```

pub mod field_mapping;
pub(crate) mod parser;

pub use field_mapping::FieldMapping;

use crate::config::EngineConfig;
use crate::error::{CriteriaError, Result};
use crate::event::json_type_name;
use crate::ir::CriteriaSetDefinition;
use parser::CriteriaParser;
use serde_json::Value;

/// Compiles criteria definitions.
///
/// A compiler holds no per-definition state; one instance can compile any
/// number of definitions.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    field_mapping: FieldMapping,
    config: EngineConfig,
}

impl Compiler {
    /// Create a compiler with the default field mapping and configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            field_mapping: FieldMapping::default(),
            config,
        }
    }

    /// Create a compiler with a custom field mapping.
    ///
    /// ```rust
    /// use criteria_engine::{Compiler, FieldMapping};
    ///
    /// let mut field_mapping = FieldMapping::default();
    /// field_mapping.add_mapping("profile".to_string(), "user".to_string());
    ///
    /// let compiler = Compiler::with_field_mapping(field_mapping);
    /// assert!(compiler.field_mapping().has_mapping("profile"));
    /// ```
    pub fn with_field_mapping(field_mapping: FieldMapping) -> Self {
        Self {
            field_mapping,
            config: EngineConfig::default(),
        }
    }

    pub fn field_mapping_mut(&mut self) -> &mut FieldMapping {
        &mut self.field_mapping
    }

    pub fn field_mapping(&self) -> &FieldMapping {
        &self.field_mapping
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compile a definition from JSON text.
    pub fn compile_str(&self, json: &str) -> Result<CriteriaSetDefinition> {
        let value: Value = serde_json::from_str(json)?;
        self.compile_value(&value)
    }

    /// Compile a definition from parsed JSON.
    ///
    /// Fails only when the envelope is unusable: the top level is not an object
    /// or `criteriaSets` is missing or not an array. Problems inside individual
    /// criteria sets are compiled into non-matching nodes.
    pub fn compile_value(&self, value: &Value) -> Result<CriteriaSetDefinition> {
        let object = value.as_object().ok_or_else(|| {
            CriteriaError::InvalidDefinition(format!(
                "expected a JSON object, found {}",
                json_type_name(value)
            ))
        })?;

        let entries = object
            .get("criteriaSets")
            .ok_or_else(|| CriteriaError::InvalidDefinition("missing criteriaSets".to_string()))?
            .as_array()
            .ok_or_else(|| {
                CriteriaError::InvalidDefinition("criteriaSets is not an array".to_string())
            })?;

        let parser = CriteriaParser::new(&self.field_mapping, &self.config);
        let criteria_sets: Vec<_> = entries
            .iter()
            .filter_map(|entry| parser.parse_criteria_set(entry))
            .collect();

        let count = object
            .get("count")
            .and_then(Value::as_u64)
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(criteria_sets.len());

        Ok(CriteriaSetDefinition {
            count,
            criteria_sets,
        })
    }
}
