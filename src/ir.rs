//! Compiled representation of criteria definitions.
//!
//! This module defines the typed tree produced by the [`Compiler`](crate::Compiler)
//! and walked by the [`LogicalExpressionEvaluator`](crate::LogicalExpressionEvaluator).
//! Anything the compiler could not make sense of is kept as an explicit
//! `Malformed` variant so evaluation stays total.

use crate::config::InvertedRangePolicy;
use crate::matcher::types::Scalar;
use regex::Regex;

/// Boolean combinator shared by query nodes and search combos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    And,
    Or,
    Not,
}

impl Combinator {
    pub fn from_wire(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("and") {
            Some(Self::And)
        } else if value.eq_ignore_ascii_case("or") {
            Some(Self::Or)
        } else if value.eq_ignore_ascii_case("not") {
            Some(Self::Not)
        } else {
            None
        }
    }
}

/// Event category a leaf applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    User,
    CustomEvent,
    Purchase,
    CartUpdate,
}

impl DataType {
    /// Parse the wire name. `cartUpdate` and `updateCart` are synonyms.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "customEvent" => Some(Self::CustomEvent),
            "purchase" => Some(Self::Purchase),
            "cartUpdate" | "updateCart" => Some(Self::CartUpdate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::CustomEvent => "customEvent",
            Self::Purchase => "purchase",
            Self::CartUpdate => "cartUpdate",
        }
    }
}

/// Declared type of a predicate's field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldType {
    #[default]
    String,
    Double,
    Long,
    Boolean,
    Object,
    Nested,
}

impl FieldType {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "string" => Some(Self::String),
            "double" => Some(Self::Double),
            "long" => Some(Self::Long),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "nested" => Some(Self::Nested),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Double | Self::Long)
    }

    /// Object and nested fields only support presence checks.
    pub fn is_structural(self) -> bool {
        matches!(self, Self::Object | Self::Nested)
    }
}

/// Comparison operator of a field predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparatorType {
    Equals,
    DoesNotEqual,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    IsSet,
    Contains,
    StartsWith,
    MatchesRegex,
    IsOneOf,
    IsNotOneOf,
}

impl ComparatorType {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "Equals" => Some(Self::Equals),
            "DoesNotEqual" => Some(Self::DoesNotEqual),
            "GreaterThan" => Some(Self::GreaterThan),
            "GreaterThanOrEqualTo" => Some(Self::GreaterThanOrEqualTo),
            "LessThan" => Some(Self::LessThan),
            "LessThanOrEqualTo" => Some(Self::LessThanOrEqualTo),
            "IsSet" => Some(Self::IsSet),
            "Contains" => Some(Self::Contains),
            "StartsWith" => Some(Self::StartsWith),
            "MatchesRegex" => Some(Self::MatchesRegex),
            "IsOneOf" => Some(Self::IsOneOf),
            "IsNotOneOf" => Some(Self::IsNotOneOf),
            _ => None,
        }
    }

    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::GreaterThan | Self::GreaterThanOrEqualTo | Self::LessThan | Self::LessThanOrEqualTo
        )
    }

    /// Comparators that operate on the text form of a value.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Contains | Self::StartsWith | Self::MatchesRegex)
    }

    /// The field type event values are coerced to before comparing.
    pub fn effective_field_type(self, declared: FieldType) -> FieldType {
        if self.is_textual() {
            FieldType::String
        } else if self.is_ordering() {
            match declared {
                FieldType::Long => FieldType::Long,
                _ => FieldType::Double,
            }
        } else {
            declared
        }
    }
}

/// Predicate-side operand, coerced at compile time.
#[derive(Debug, Clone)]
pub enum Operand {
    /// No operand; used by `IsSet`.
    None,
    /// One or more candidate values. A scalar `value` compiles to a single entry.
    Values(Vec<Scalar>),
    /// Anchored patterns for `MatchesRegex`.
    Patterns(Vec<Regex>),
}

/// A single field comparison evaluated against one event.
#[derive(Debug, Clone)]
pub struct FieldPredicate {
    /// Dotted path as written in the definition.
    pub field: String,
    /// `field` split on `.`.
    pub path: Vec<String>,
    /// `path` rewritten by a field alias, tried when `path` resolves nothing.
    pub alias_path: Option<Vec<String>>,
    pub field_type: FieldType,
    pub comparator: ComparatorType,
    pub operand: Operand,
}

impl FieldPredicate {
    pub fn new(
        field: impl Into<String>,
        field_type: FieldType,
        comparator: ComparatorType,
        operand: Operand,
    ) -> Self {
        let field = field.into();
        Self {
            path: split_path(&field),
            field,
            alias_path: None,
            field_type,
            comparator,
            operand,
        }
    }

    /// Attach the aliased form of the field. Ignored when it equals the field.
    pub fn with_alias(mut self, aliased_field: &str) -> Self {
        self.alias_path = (aliased_field != self.field).then(|| split_path(aliased_field));
        self
    }
}

fn split_path(field: &str) -> Vec<String> {
    field.split('.').map(str::to_string).collect()
}

#[derive(Debug, Clone)]
pub enum Predicate {
    Field(FieldPredicate),
    Malformed { reason: String },
}

/// A flat group of predicates combined against one event.
#[derive(Debug, Clone)]
pub struct SearchCombo {
    pub combinator: Combinator,
    pub predicates: Vec<Predicate>,
}

impl SearchCombo {
    pub fn has_malformed(&self) -> bool {
        self.predicates
            .iter()
            .any(|predicate| matches!(predicate, Predicate::Malformed { .. }))
    }
}

/// Inclusive bounds on the number of qualifying events for a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchBounds {
    pub min_match: Option<u64>,
    pub max_match: Option<u64>,
}

impl MatchBounds {
    pub fn new(min_match: Option<u64>, max_match: Option<u64>) -> Self {
        Self {
            min_match,
            max_match,
        }
    }

    pub fn is_counted(&self) -> bool {
        self.min_match.is_some() || self.max_match.is_some()
    }

    pub fn is_inverted(&self) -> bool {
        matches!((self.min_match, self.max_match), (Some(min), Some(max)) if min > max)
    }

    /// Effective `(min, max)` range, or `None` when the leaf can never match.
    ///
    /// Without bounds a single qualifying event is required.
    pub fn effective_range(&self, policy: InvertedRangePolicy) -> Option<(u64, Option<u64>)> {
        let min = self.min_match.unwrap_or(1);
        match self.max_match {
            Some(max) if min > max => match policy {
                InvertedRangePolicy::NeverMatch => None,
                InvertedRangePolicy::Swap => Some((max, Some(min))),
            },
            max => Some((min, max)),
        }
    }
}

/// A node of the search query tree.
#[derive(Debug, Clone)]
pub enum QueryNode {
    Combinator {
        op: Combinator,
        children: Vec<QueryNode>,
    },
    Leaf {
        data_type: DataType,
        combo: SearchCombo,
        bounds: MatchBounds,
    },
    Malformed {
        reason: String,
    },
}

impl QueryNode {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }

    /// Depth of the tree rooted at this node; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Self::Combinator { children, .. } => {
                1 + children.iter().map(QueryNode::depth).max().unwrap_or(0)
            }
            Self::Leaf { .. } | Self::Malformed { .. } => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CriteriaSet {
    pub criteria_id: String,
    pub name: Option<String>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub search_query: QueryNode,
}

/// An ordered list of criteria sets. Order is precedence.
#[derive(Debug, Clone, Default)]
pub struct CriteriaSetDefinition {
    pub count: usize,
    pub criteria_sets: Vec<CriteriaSet>,
}

impl CriteriaSetDefinition {
    pub fn len(&self) -> usize {
        self.criteria_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria_sets.is_empty()
    }

    pub fn get(&self, criteria_id: &str) -> Option<&CriteriaSet> {
        self.criteria_sets
            .iter()
            .find(|set| set.criteria_id == criteria_id)
    }
}
