//! Criteria definition node parsing.
//!
//! Walks the JSON of a single criteria set and produces the typed tree in
//! [`crate::ir`]. Every node is parsed independently: a node the parser cannot
//! understand becomes `Malformed` and its siblings are unaffected.

use crate::compiler::field_mapping::FieldMapping;
use crate::config::EngineConfig;
use crate::event::json_type_name;
use crate::ir::{
    Combinator, ComparatorType, CriteriaSet, DataType, FieldPredicate, FieldType, MatchBounds,
    Operand, Predicate, QueryNode, SearchCombo,
};
use crate::matcher::types::Scalar;
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use tracing::warn;

pub(crate) struct CriteriaParser<'a> {
    field_mapping: &'a FieldMapping,
    config: &'a EngineConfig,
}

impl<'a> CriteriaParser<'a> {
    pub(crate) fn new(field_mapping: &'a FieldMapping, config: &'a EngineConfig) -> Self {
        Self {
            field_mapping,
            config,
        }
    }

    /// Parse one entry of `criteriaSets`. Entries without a usable
    /// `criteriaId` are dropped since a match could never be reported.
    pub(crate) fn parse_criteria_set(&self, value: &Value) -> Option<CriteriaSet> {
        let Some(object) = value.as_object() else {
            warn!(found = json_type_name(value), "skipping criteria set that is not an object");
            return None;
        };

        let Some(criteria_id) = object.get("criteriaId").and_then(id_string) else {
            warn!("skipping criteria set without criteriaId");
            return None;
        };

        let search_query = match object.get("searchQuery") {
            Some(query) => self.parse_query_node(query, 1),
            None => QueryNode::malformed("criteria set has no searchQuery"),
        };
        if let QueryNode::Malformed { reason } = &search_query {
            warn!(criteria_id = %criteria_id, reason = %reason, "criteria set root is malformed");
        }

        Some(CriteriaSet {
            criteria_id,
            name: object.get("name").and_then(Value::as_str).map(str::to_string),
            created_at: object.get("createdAt").and_then(Value::as_i64),
            updated_at: object.get("updatedAt").and_then(Value::as_i64),
            search_query,
        })
    }

    /// Parse a search query node.
    ///
    /// `searchQueries` makes a combinator node and takes precedence over
    /// `searchCombo`, which makes a leaf.
    pub(crate) fn parse_query_node(&self, value: &Value, depth: usize) -> QueryNode {
        if depth > self.config.max_query_depth {
            return QueryNode::malformed(format!(
                "nesting deeper than {} levels",
                self.config.max_query_depth
            ));
        }

        let Some(object) = value.as_object() else {
            return QueryNode::malformed(format!(
                "search query is a {}, not an object",
                json_type_name(value)
            ));
        };

        if let Some(children) = object.get("searchQueries") {
            return self.parse_combinator_node(object, children, depth);
        }
        if let Some(combo) = object.get("searchCombo") {
            return self.parse_leaf_node(object, combo);
        }
        QueryNode::malformed("search query has neither searchQueries nor searchCombo")
    }

    fn parse_combinator_node(
        &self,
        object: &Map<String, Value>,
        children: &Value,
        depth: usize,
    ) -> QueryNode {
        let op = match parse_combinator(object) {
            Ok(op) => op,
            Err(reason) => return QueryNode::malformed(reason),
        };

        let Some(children) = children.as_array() else {
            return QueryNode::malformed("searchQueries is not an array");
        };
        if children.is_empty() {
            return QueryNode::malformed("searchQueries is empty");
        }

        let children = children
            .iter()
            .map(|child| {
                let node = self.parse_query_node(child, depth + 1);
                if let QueryNode::Malformed { reason } = &node {
                    warn!(reason = %reason, "malformed search query node");
                }
                node
            })
            .collect();

        QueryNode::Combinator { op, children }
    }

    fn parse_leaf_node(&self, object: &Map<String, Value>, combo: &Value) -> QueryNode {
        let Some(data_type_name) = object.get("dataType").and_then(Value::as_str) else {
            return QueryNode::malformed("leaf has no dataType");
        };
        let Some(data_type) = DataType::from_wire(data_type_name) else {
            return QueryNode::malformed(format!("unknown dataType '{data_type_name}'"));
        };

        let bounds = match (count_bound(object, "minMatch"), count_bound(object, "maxMatch")) {
            (Ok(min_match), Ok(max_match)) => MatchBounds::new(min_match, max_match),
            (Err(reason), _) | (_, Err(reason)) => return QueryNode::malformed(reason),
        };
        if bounds.is_inverted() {
            warn!(
                data_type = data_type.as_str(),
                min_match = ?bounds.min_match,
                max_match = ?bounds.max_match,
                policy = ?self.config.inverted_range,
                "minMatch exceeds maxMatch"
            );
        }

        match self.parse_search_combo(combo) {
            Ok(combo) => QueryNode::Leaf {
                data_type,
                combo,
                bounds,
            },
            Err(reason) => QueryNode::malformed(reason),
        }
    }

    /// Parse a `searchCombo`: a combinator over field predicates.
    pub(crate) fn parse_search_combo(&self, value: &Value) -> Result<SearchCombo, String> {
        let object = value
            .as_object()
            .ok_or_else(|| "searchCombo is not an object".to_string())?;
        let combinator = parse_combinator(object)?;

        let entries = object
            .get("searchQueries")
            .and_then(Value::as_array)
            .ok_or_else(|| "searchCombo has no searchQueries array".to_string())?;
        if entries.is_empty() {
            return Err("searchCombo has no predicates".to_string());
        }

        let predicates = entries
            .iter()
            .map(|entry| match self.parse_predicate(entry) {
                Ok(predicate) => Predicate::Field(predicate),
                Err(reason) => {
                    warn!(reason = %reason, "malformed field predicate");
                    Predicate::Malformed { reason }
                }
            })
            .collect();

        Ok(SearchCombo {
            combinator,
            predicates,
        })
    }

    /// Parse a field predicate and coerce its operand.
    pub(crate) fn parse_predicate(&self, value: &Value) -> Result<FieldPredicate, String> {
        let object = value
            .as_object()
            .ok_or_else(|| "predicate is not an object".to_string())?;

        let raw_field = object
            .get("field")
            .and_then(Value::as_str)
            .filter(|field| !field.is_empty())
            .ok_or_else(|| "predicate has no field".to_string())?;
        if raw_field.split('.').any(str::is_empty) {
            return Err(format!("field path '{raw_field}' has an empty segment"));
        }
        let aliased_field = self.field_mapping.normalize_field(raw_field);

        let field_type = match object.get("fieldType").and_then(Value::as_str) {
            Some(name) => FieldType::from_wire(name)
                .ok_or_else(|| format!("unknown fieldType '{name}'"))?,
            None => FieldType::default(),
        };

        let comparator_name = object
            .get("comparatorType")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("predicate on '{raw_field}' has no comparatorType"))?;
        let comparator = ComparatorType::from_wire(comparator_name)
            .ok_or_else(|| format!("unknown comparatorType '{comparator_name}'"))?;

        if field_type.is_structural() && comparator != ComparatorType::IsSet {
            return Err(format!(
                "{comparator_name} is not supported on {field_type:?} field '{raw_field}'"
            ));
        }

        let operand = self.parse_operand(object, field_type, comparator)?;

        Ok(FieldPredicate::new(raw_field, field_type, comparator, operand)
            .with_alias(&aliased_field))
    }

    fn parse_operand(
        &self,
        object: &Map<String, Value>,
        field_type: FieldType,
        comparator: ComparatorType,
    ) -> Result<Operand, String> {
        if comparator == ComparatorType::IsSet {
            return Ok(Operand::None);
        }

        let raw_values = raw_operand_values(object, field_type);
        if raw_values.is_empty() {
            return Err(format!("{comparator:?} predicate has no value"));
        }

        if comparator == ComparatorType::MatchesRegex {
            let patterns = raw_values
                .iter()
                .map(|raw| {
                    let pattern = Scalar::coerce(raw, FieldType::String)
                        .ok_or_else(|| "regex pattern is not a string".to_string())?;
                    self.compile_pattern(&pattern.as_text())
                })
                .collect::<Result<Vec<Regex>, String>>()?;
            return Ok(Operand::Patterns(patterns));
        }

        let operand_type = comparator.effective_field_type(field_type);
        let values: Vec<Scalar> = raw_values
            .iter()
            .filter_map(|raw| {
                let scalar = Scalar::coerce(raw, operand_type);
                if scalar.is_none() {
                    warn!(value = %raw, field_type = ?operand_type, "dropping operand value");
                }
                scalar
            })
            .collect();
        if values.is_empty() {
            return Err(format!(
                "no operand value of {comparator:?} coerces to {operand_type:?}"
            ));
        }
        Ok(Operand::Values(values))
    }

    /// Compile a pattern anchored to match the whole value.
    fn compile_pattern(&self, pattern: &str) -> Result<Regex, String> {
        RegexBuilder::new(&format!("^(?:{pattern})$"))
            .size_limit(self.config.max_regex_size)
            .build()
            .map_err(|err| format!("invalid regex '{pattern}': {err}"))
    }
}

fn parse_combinator(object: &Map<String, Value>) -> Result<Combinator, String> {
    let name = object
        .get("combinator")
        .and_then(Value::as_str)
        .ok_or_else(|| "node has no combinator".to_string())?;
    Combinator::from_wire(name).ok_or_else(|| format!("unknown combinator '{name}'"))
}

/// Operand values in priority order: `values`, then `valueLong` for numeric
/// fields, then `value`, then `valueLong`.
fn raw_operand_values(object: &Map<String, Value>, field_type: FieldType) -> Vec<&Value> {
    if let Some(Value::Array(values)) = object.get("values") {
        if !values.is_empty() {
            return values.iter().filter(|value| !value.is_null()).collect();
        }
    }

    let value = object.get("value").filter(|value| !value.is_null());
    let value_long = object.get("valueLong").filter(|value| !value.is_null());
    let preferred = if field_type.is_numeric() {
        value_long.or(value)
    } else {
        value.or(value_long)
    };
    preferred.into_iter().collect()
}

fn count_bound(object: &Map<String, Value>, key: &str) -> Result<Option<u64>, String> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| format!("{key} must be a non-negative integer, found {n}")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| format!("{key} must be a non-negative integer, found '{s}'")),
        Some(other) => Err(format!("{key} is a {}", json_type_name(other))),
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
