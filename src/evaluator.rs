//! Logical expression evaluation over the event log.
//!
//! Two levels of evaluation:
//! - a [`SearchCombo`] is evaluated against a single event
//! - a [`QueryNode`] tree is evaluated against the whole event log, with leaves
//!   counting the events of their data type that satisfy their combo
//!
//! The evaluator keeps no state between calls, so one instance can be shared
//! freely across threads.

use crate::config::EngineConfig;
use crate::event::{EventLog, EventRecord};
use crate::ir::{Combinator, MatchBounds, Predicate, QueryNode, SearchCombo};
use crate::matcher::{comparators, EventContext};

/// Three-valued outcome of evaluating a predicate, combo or node.
///
/// Anything built from a malformed part is `Undetermined` unless the rest of
/// the expression decides it regardless. Only `Matched` completes a criteria
/// set, so negating an undetermined subtree never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    Matched,
    #[default]
    NotMatched,
    Undetermined,
}

impl Verdict {
    pub fn is_matched(self) -> bool {
        self == Self::Matched
    }

    /// Combine child verdicts, stopping at the first child that decides the
    /// result. An empty list never matches.
    ///
    /// ```rust
    /// use criteria_engine::{Combinator, Verdict};
    ///
    /// let children = [Verdict::NotMatched, Verdict::Undetermined];
    /// assert_eq!(Verdict::combine(Combinator::Or, children), Verdict::Undetermined);
    /// assert_eq!(Verdict::combine(Combinator::And, children), Verdict::NotMatched);
    /// assert_eq!(Verdict::combine(Combinator::Not, children), Verdict::Undetermined);
    /// ```
    pub fn combine<I>(op: Combinator, verdicts: I) -> Self
    where
        I: IntoIterator<Item = Verdict>,
    {
        let mut verdicts = verdicts.into_iter().peekable();
        if verdicts.peek().is_none() {
            return Self::NotMatched;
        }

        // (child verdict that decides the result, that result, result otherwise)
        let (decisive, decided, otherwise) = match op {
            Combinator::And => (Self::NotMatched, Self::NotMatched, Self::Matched),
            Combinator::Or => (Self::Matched, Self::Matched, Self::NotMatched),
            Combinator::Not => (Self::Matched, Self::NotMatched, Self::Matched),
        };
        let mut undetermined = false;
        for verdict in verdicts {
            if verdict == decisive {
                return decided;
            }
            undetermined |= verdict == Self::Undetermined;
        }

        if undetermined {
            Self::Undetermined
        } else {
            otherwise
        }
    }
}

impl From<bool> for Verdict {
    fn from(matched: bool) -> Self {
        if matched {
            Self::Matched
        } else {
            Self::NotMatched
        }
    }
}

/// Outcome for one query node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchResult {
    pub verdict: Verdict,
    /// For leaves, the qualifying events counted before evaluation could stop.
    /// For combinators, the children found satisfied before short-circuiting.
    pub match_count: u64,
}

impl MatchResult {
    pub fn undetermined() -> Self {
        Self {
            verdict: Verdict::Undetermined,
            match_count: 0,
        }
    }

    pub fn matched(&self) -> bool {
        self.verdict.is_matched()
    }
}

/// Evaluates compiled query trees against event logs.
///
/// # Example
/// ```rust
/// use criteria_engine::{Compiler, EngineConfig, EventLog, EventRecord, LogicalExpressionEvaluator};
/// use serde_json::json;
///
/// let definition = Compiler::new().compile_value(&json!({
///     "criteriaSets": [{
///         "criteriaId": "1",
///         "searchQuery": {
///             "dataType": "customEvent",
///             "minMatch": 2,
///             "searchCombo": {
///                 "combinator": "And",
///                 "searchQueries": [{
///                     "field": "eventName",
///                     "comparatorType": "Equals",
///                     "value": "app-opened"
///                 }]
///             }
///         }
///     }]
/// }))?;
///
/// let log: EventLog = vec![
///     EventRecord::custom_event("app-opened", json!({})),
///     EventRecord::custom_event("app-opened", json!({})),
/// ]
/// .into();
///
/// let config = EngineConfig::default();
/// let evaluator = LogicalExpressionEvaluator::new(&config);
/// let result = evaluator.evaluate_search_query(&definition.criteria_sets[0].search_query, &log);
/// assert!(result.matched());
/// assert_eq!(result.match_count, 2);
/// # Ok::<(), criteria_engine::CriteriaError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LogicalExpressionEvaluator<'c> {
    config: &'c EngineConfig,
}

impl<'c> LogicalExpressionEvaluator<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        Self { config }
    }

    /// Evaluate a search combo against one event.
    ///
    /// Malformed predicates are undetermined.
    pub fn evaluate_search_combo(&self, combo: &SearchCombo, context: &EventContext<'_>) -> Verdict {
        Verdict::combine(
            combo.combinator,
            combo
                .predicates
                .iter()
                .map(|predicate| self.evaluate_predicate(predicate, context)),
        )
    }

    fn evaluate_predicate(&self, predicate: &Predicate, context: &EventContext<'_>) -> Verdict {
        match predicate {
            Predicate::Field(field) => {
                let resolved = context.resolve_field(field);
                comparators::evaluate(field, &resolved).into()
            }
            Predicate::Malformed { .. } => Verdict::Undetermined,
        }
    }

    /// Evaluate a query tree against the full event log.
    pub fn evaluate_search_query(&self, node: &QueryNode, log: &EventLog) -> MatchResult {
        match node {
            QueryNode::Combinator { op, children } => self.evaluate_combinator(*op, children, log),
            QueryNode::Leaf {
                data_type,
                combo,
                bounds,
            } => self.evaluate_leaf(combo, bounds, log.events_of(*data_type)),
            QueryNode::Malformed { .. } => MatchResult::undetermined(),
        }
    }

    fn evaluate_combinator(
        &self,
        op: Combinator,
        children: &[QueryNode],
        log: &EventLog,
    ) -> MatchResult {
        let mut satisfied = 0;
        let verdict = Verdict::combine(
            op,
            children.iter().map(|child| {
                let verdict = self.evaluate_search_query(child, log).verdict;
                if verdict.is_matched() {
                    satisfied += 1;
                }
                verdict
            }),
        );

        // A miss decided next to an undecidable sibling cannot be negated.
        let verdict = if verdict == Verdict::NotMatched
            && children.iter().any(|child| self.has_undecidable_part(child))
        {
            Verdict::Undetermined
        } else {
            verdict
        };

        MatchResult {
            verdict,
            match_count: satisfied,
        }
    }

    fn has_undecidable_part(&self, node: &QueryNode) -> bool {
        match node {
            QueryNode::Combinator { children, .. } => {
                children.iter().any(|child| self.has_undecidable_part(child))
            }
            QueryNode::Leaf { combo, bounds, .. } => {
                combo.has_malformed() || bounds.effective_range(self.config.inverted_range).is_none()
            }
            QueryNode::Malformed { .. } => true,
        }
    }

    fn evaluate_leaf<'e, I>(&self, combo: &SearchCombo, bounds: &MatchBounds, events: I) -> MatchResult
    where
        I: Iterator<Item = &'e EventRecord>,
    {
        let Some((min, max)) = bounds.effective_range(self.config.inverted_range) else {
            return MatchResult::undetermined();
        };
        let in_range = |count: u64| count >= min && max.map_or(true, |max| count <= max);

        let mut count = 0u64;
        let mut unknown = 0u64;
        for event in events {
            // Without an upper bound the result cannot change once min is reached.
            if max.is_none() && count >= min {
                break;
            }
            let context = EventContext::new(event, self.config.max_field_fanout);
            match self.evaluate_search_combo(combo, &context) {
                Verdict::Matched => {
                    count += 1;
                    if max.is_some_and(|max| count > max) {
                        break;
                    }
                }
                Verdict::Undetermined => unknown += 1,
                Verdict::NotMatched => {}
            }
        }

        // Undetermined events could land on either side of the bounds.
        let verdict = if in_range(count) && in_range(count + unknown) {
            Verdict::Matched
        } else if count + unknown < min || max.is_some_and(|max| count > max) {
            Verdict::NotMatched
        } else {
            Verdict::Undetermined
        };

        // A combo with a malformed predicate cannot vouch for a miss.
        let verdict = if verdict == Verdict::NotMatched && combo.has_malformed() {
            Verdict::Undetermined
        } else {
            verdict
        };

        MatchResult {
            verdict,
            match_count: count,
        }
    }
}
