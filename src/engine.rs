//! Criteria completion checking.
//!
//! This module provides [`CriteriaCompletionChecker`], the primary interface of
//! the crate: given a criteria definition and a snapshot of the local event
//! log, it reports which criteria set (if any) the user has completed.

use crate::compiler::Compiler;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::evaluator::{LogicalExpressionEvaluator, MatchResult};
use crate::event::EventLog;
use crate::ir::{CriteriaSet, CriteriaSetDefinition};
use rayon::prelude::*;
use serde_json::Value;
use tracing::debug;

/// Checks event logs against criteria definitions.
///
/// The checker holds only its compiler and configuration, neither of which is
/// mutated by evaluation. One instance can be shared across threads, and
/// repeated calls with the same inputs always return the same result.
///
/// # Usage Patterns
///
/// ## One-shot
/// Parses both inputs on every call, the way an SDK invokes it after each
/// event append:
/// ```rust,ignore
/// let matched = checker.get_matched_criteria(&definition_json, &event_log_json)?;
/// ```
///
/// ## Compile once, evaluate many
/// ```rust,ignore
/// let definition = checker.compile(&definition_json)?;
/// for log in snapshots {
///     if let Some(id) = checker.matched_criteria(&definition, &log) {
///         fire_completion(id);
///     }
/// }
/// ```
///
/// # Examples
///
/// ```rust
/// use criteria_engine::CriteriaCompletionChecker;
///
/// let definition = r#"{
///     "count": 1,
///     "criteriaSets": [{
///         "criteriaId": "42",
///         "name": "Big spender",
///         "searchQuery": {
///             "combinator": "And",
///             "searchQueries": [{
///                 "dataType": "purchase",
///                 "searchCombo": {
///                     "combinator": "And",
///                     "searchQueries": [{
///                         "dataType": "purchase",
///                         "field": "shoppingCartItems.price",
///                         "fieldType": "double",
///                         "comparatorType": "GreaterThanOrEqualTo",
///                         "value": "100"
///                     }]
///                 }
///             }]
///         }
///     }]
/// }"#;
///
/// let event_log = r#"[
///     {"eventType": "purchase", "items": [{"name": "Lamp", "price": 149.99}], "total": 149.99}
/// ]"#;
///
/// let checker = CriteriaCompletionChecker::new();
/// assert_eq!(checker.get_matched_criteria(definition, event_log)?, Some("42".to_string()));
/// assert_eq!(checker.get_matched_criteria(definition, "[]")?, None);
/// # Ok::<(), criteria_engine::CriteriaError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct CriteriaCompletionChecker {
    compiler: Compiler,
}

/// Verdict for one criteria set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriteriaEvaluation {
    pub criteria_id: String,
    pub name: Option<String>,
    pub result: MatchResult,
}

impl CriteriaCompletionChecker {
    /// Create a checker with the default field mapping and configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            compiler: Compiler::with_config(config),
        }
    }

    /// Create a checker around a preconfigured compiler, e.g. one with extra
    /// field aliases.
    pub fn with_compiler(compiler: Compiler) -> Self {
        Self { compiler }
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub fn config(&self) -> &EngineConfig {
        self.compiler.config()
    }

    /// Compile a criteria definition for repeated evaluation.
    pub fn compile(&self, definition_json: &str) -> Result<CriteriaSetDefinition> {
        self.compiler.compile_str(definition_json)
    }

    /// Return the id of the first criteria set completed by the event log.
    ///
    /// Both inputs are JSON text. Invalid JSON, a definition without a
    /// `criteriaSets` array, or an event log that is not an array are errors.
    /// Everything else that cannot be understood simply does not match.
    pub fn get_matched_criteria(
        &self,
        definition_json: &str,
        event_log_json: &str,
    ) -> Result<Option<String>> {
        let definition = self.compile(definition_json)?;
        let log = EventLog::from_json_str(event_log_json)?;
        Ok(self.matched_criteria(&definition, &log))
    }

    /// [`Self::get_matched_criteria`] over already parsed JSON.
    pub fn get_matched_criteria_value(
        &self,
        definition: &Value,
        event_log: &Value,
    ) -> Result<Option<String>> {
        let definition = self.compiler.compile_value(definition)?;
        let log = EventLog::from_value(event_log)?;
        Ok(self.matched_criteria(&definition, &log))
    }

    /// Return the id of the first criteria set, in definition order, that the
    /// event log completes.
    pub fn matched_criteria(
        &self,
        definition: &CriteriaSetDefinition,
        log: &EventLog,
    ) -> Option<String> {
        let evaluator = LogicalExpressionEvaluator::new(self.config());
        definition
            .criteria_sets
            .iter()
            .find(|set| self.evaluate_set(&evaluator, set, log).matched())
            .map(|set| set.criteria_id.clone())
    }

    /// Return the ids of every completed criteria set, in definition order.
    pub fn all_matched_criteria(
        &self,
        definition: &CriteriaSetDefinition,
        log: &EventLog,
    ) -> Vec<String> {
        let evaluator = LogicalExpressionEvaluator::new(self.config());
        definition
            .criteria_sets
            .iter()
            .filter(|set| self.evaluate_set(&evaluator, set, log).matched())
            .map(|set| set.criteria_id.clone())
            .collect()
    }

    /// Evaluate every criteria set and report each verdict.
    pub fn evaluate_criteria(
        &self,
        definition: &CriteriaSetDefinition,
        log: &EventLog,
    ) -> Vec<CriteriaEvaluation> {
        let evaluator = LogicalExpressionEvaluator::new(self.config());
        definition
            .criteria_sets
            .iter()
            .map(|set| CriteriaEvaluation {
                criteria_id: set.criteria_id.clone(),
                name: set.name.clone(),
                result: self.evaluate_set(&evaluator, set, log),
            })
            .collect()
    }

    /// Evaluate one definition against many independent event log snapshots.
    ///
    /// Results are returned in the order of `logs`. Large batches run on the
    /// rayon thread pool when parallel processing is enabled.
    pub fn evaluate_batch(
        &self,
        definition: &CriteriaSetDefinition,
        logs: &[EventLog],
    ) -> Vec<Option<String>> {
        let config = self.config();
        if config.enable_parallel_processing
            && logs.len() >= config.parallel.min_batch_size_for_parallelism
        {
            logs.par_iter()
                .map(|log| self.matched_criteria(definition, log))
                .collect()
        } else {
            logs.iter()
                .map(|log| self.matched_criteria(definition, log))
                .collect()
        }
    }

    fn evaluate_set(
        &self,
        evaluator: &LogicalExpressionEvaluator<'_>,
        set: &CriteriaSet,
        log: &EventLog,
    ) -> MatchResult {
        let result = evaluator.evaluate_search_query(&set.search_query, log);
        debug!(
            criteria_id = %set.criteria_id,
            verdict = ?result.verdict,
            match_count = result.match_count,
            events = log.len(),
            "Evaluated criteria set"
        );
        result
    }
}
