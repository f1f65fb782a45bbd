//! Comparison operators applied to resolved field values.
//!
//! A field path can resolve to several values (arrays fan out), so every
//! operator answers "does any resolved value satisfy it", except the negative
//! operators which require that no resolved value is excluded. Values that
//! cannot be coerced to the predicate's field type are dropped first; if none
//! remain the predicate fails closed. A resolved set cut short by the fan-out
//! cap never satisfies a negative operator or `IsSet`.

use crate::ir::{ComparatorType, FieldPredicate, FieldType, Operand};
use crate::matcher::fields::Resolved;
use crate::matcher::types::{is_set_value, Scalar};
use serde_json::Value;
use std::cmp::Ordering;

/// Evaluate a compiled predicate against the values its field resolved to.
///
/// # Example
/// ```rust
/// use criteria_engine::matcher::{comparators, FieldResolver, Scalar};
/// use criteria_engine::{ComparatorType, FieldPredicate, FieldType, Operand};
/// use serde_json::json;
///
/// let fields = json!({"milestoneYears": [1996, 1997, 2002]});
/// let years = FieldResolver::new(16).resolve(&fields, &["milestoneYears"]);
///
/// let predicate = FieldPredicate::new(
///     "milestoneYears",
///     FieldType::Long,
///     ComparatorType::Equals,
///     Operand::Values(vec![Scalar::Long(1997)]),
/// );
/// assert!(comparators::evaluate(&predicate, &years));
///
/// let predicate = FieldPredicate::new(
///     "milestoneYears",
///     FieldType::Long,
///     ComparatorType::DoesNotEqual,
///     Operand::Values(vec![Scalar::Long(1997)]),
/// );
/// assert!(!comparators::evaluate(&predicate, &years));
/// ```
pub fn evaluate(predicate: &FieldPredicate, resolved: &Resolved<'_>) -> bool {
    if predicate.comparator == ComparatorType::IsSet {
        return is_set(resolved);
    }

    let field_type = predicate.comparator.effective_field_type(predicate.field_type);
    let scalars = coerce_all(&resolved.scalars, field_type);
    let elements = coerce_all(&resolved.elements, field_type);
    if scalars.is_empty() && elements.is_empty() {
        return false;
    }
    let all = || scalars.iter().chain(elements.iter());

    match (&predicate.operand, predicate.comparator) {
        (Operand::Values(values), ComparatorType::Equals | ComparatorType::IsOneOf) => {
            all().any(|scalar| contains_match(values, scalar))
        }
        (Operand::Values(values), ComparatorType::DoesNotEqual | ComparatorType::IsNotOneOf) => {
            !resolved.truncated && all().all(|scalar| !contains_match(values, scalar))
        }
        (Operand::Values(values), ComparatorType::GreaterThan) => {
            any_ordering(all(), values, |ord| ord == Ordering::Greater)
        }
        (Operand::Values(values), ComparatorType::GreaterThanOrEqualTo) => {
            any_ordering(all(), values, |ord| ord != Ordering::Less)
        }
        (Operand::Values(values), ComparatorType::LessThan) => {
            any_ordering(all(), values, |ord| ord == Ordering::Less)
        }
        (Operand::Values(values), ComparatorType::LessThanOrEqualTo) => {
            any_ordering(all(), values, |ord| ord != Ordering::Greater)
        }
        // Substring of a single value, membership among array elements.
        (Operand::Values(values), ComparatorType::Contains) => {
            any_text(scalars.iter(), values, |s, v| s.contains(v))
                || elements.iter().any(|element| contains_match(values, element))
        }
        (Operand::Values(values), ComparatorType::StartsWith) => {
            any_text(all(), values, |s, v| s.starts_with(v))
        }
        (Operand::Patterns(patterns), ComparatorType::MatchesRegex) => all().any(|scalar| {
            let text = scalar.as_text();
            patterns.iter().any(|pattern| pattern.is_match(text.as_ref()))
        }),
        // The compiler never pairs other operands with these comparators.
        _ => false,
    }
}

/// At least one value resolved, none of them is empty, and the fan-out cap
/// did not hide any.
pub fn is_set(resolved: &Resolved<'_>) -> bool {
    !resolved.truncated && !resolved.is_empty() && resolved.iter().all(is_set_value)
}

fn coerce_all(values: &[&Value], field_type: FieldType) -> Vec<Scalar> {
    values
        .iter()
        .filter_map(|value| Scalar::coerce(value, field_type))
        .collect()
}

fn contains_match(values: &[Scalar], scalar: &Scalar) -> bool {
    values.iter().any(|value| scalar.matches(value))
}

fn any_ordering<'s, I, F>(mut scalars: I, values: &[Scalar], accept: F) -> bool
where
    I: Iterator<Item = &'s Scalar>,
    F: Fn(Ordering) -> bool,
{
    scalars.any(|scalar| {
        values
            .iter()
            .any(|value| scalar.compare(value).is_some_and(&accept))
    })
}

fn any_text<'s, I, F>(mut scalars: I, values: &[Scalar], accept: F) -> bool
where
    I: Iterator<Item = &'s Scalar>,
    F: Fn(&str, &str) -> bool,
{
    scalars.any(|scalar| {
        let text = scalar.as_text();
        values
            .iter()
            .any(|value| accept(text.as_ref(), value.as_text().as_ref()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use serde_json::json;

    fn predicate(comparator: ComparatorType, field_type: FieldType, values: Vec<Scalar>) -> FieldPredicate {
        FieldPredicate::new("field", field_type, comparator, Operand::Values(values))
    }

    fn single(value: &Value) -> Resolved<'_> {
        Resolved::from_scalars(vec![value])
    }

    fn array(values: &[Value]) -> Resolved<'_> {
        Resolved::from_elements(values.iter().collect())
    }

    fn long(value: i64) -> Scalar {
        Scalar::Long(value)
    }

    fn text(value: &str) -> Scalar {
        Scalar::String(value.to_string())
    }

    #[test]
    fn test_equals_any_array_element() {
        let years = [json!(1996), json!(1997), json!(2002)];
        let resolved = array(&years);

        let p = predicate(ComparatorType::Equals, FieldType::Long, vec![long(1997)]);
        assert!(evaluate(&p, &resolved));

        let p = predicate(ComparatorType::Equals, FieldType::Long, vec![long(2000)]);
        assert!(!evaluate(&p, &resolved));
    }

    #[test]
    fn test_does_not_equal_requires_no_element_equal() {
        let years = [json!(1996), json!(1997), json!(2002)];
        let resolved = array(&years);

        // One element differs but another equals: not satisfied.
        let p = predicate(ComparatorType::DoesNotEqual, FieldType::Long, vec![long(1997)]);
        assert!(!evaluate(&p, &resolved));

        let p = predicate(ComparatorType::DoesNotEqual, FieldType::Long, vec![long(2000)]);
        assert!(evaluate(&p, &resolved));
    }

    #[test]
    fn test_does_not_equal_on_missing_field_fails_closed() {
        let p = predicate(ComparatorType::DoesNotEqual, FieldType::String, vec![text("x")]);
        assert!(!evaluate(&p, &Resolved::default()));
    }

    #[test]
    fn test_negatives_fail_closed_when_truncated() {
        let years = [json!(1995), json!(1996)];
        let mut resolved = array(&years);
        resolved.truncated = true;

        let p = predicate(ComparatorType::DoesNotEqual, FieldType::Long, vec![long(1997)]);
        assert!(!evaluate(&p, &resolved));

        let p = predicate(ComparatorType::IsNotOneOf, FieldType::Long, vec![long(1997)]);
        assert!(!evaluate(&p, &resolved));

        // Positive operators still see the values that were kept.
        let p = predicate(ComparatorType::Equals, FieldType::Long, vec![long(1996)]);
        assert!(evaluate(&p, &resolved));
    }

    #[test]
    fn test_equals_coerces_numeric_strings() {
        let total = json!("10");
        let p = predicate(ComparatorType::Equals, FieldType::Double, vec![Scalar::Double(10.0)]);
        assert!(evaluate(&p, &single(&total)));

        let total = json!("11");
        assert!(!evaluate(&p, &single(&total)));
    }

    #[test]
    fn test_unparsable_number_fails_closed() {
        let value = json!("ten");
        let p = predicate(ComparatorType::GreaterThan, FieldType::Double, vec![Scalar::Double(1.0)]);
        assert!(!evaluate(&p, &single(&value)));

        let p = predicate(ComparatorType::DoesNotEqual, FieldType::Double, vec![Scalar::Double(1.0)]);
        assert!(!evaluate(&p, &single(&value)));
    }

    #[test]
    fn test_ordering_comparators() {
        let price = json!(50);
        let at = |comparator, bound| {
            evaluate(
                &predicate(comparator, FieldType::Double, vec![Scalar::Double(bound)]),
                &single(&price),
            )
        };

        assert!(at(ComparatorType::GreaterThan, 49.9));
        assert!(!at(ComparatorType::GreaterThan, 50.0));
        assert!(at(ComparatorType::GreaterThanOrEqualTo, 50.0));
        assert!(at(ComparatorType::LessThan, 50.1));
        assert!(!at(ComparatorType::LessThan, 50.0));
        assert!(at(ComparatorType::LessThanOrEqualTo, 50.0));
    }

    #[test]
    fn test_ordering_any_element() {
        let prices = [json!(5), json!(75)];
        let resolved = Resolved::from_scalars(prices.iter().collect());
        let p = predicate(ComparatorType::GreaterThanOrEqualTo, FieldType::Double, vec![Scalar::Double(50.0)]);
        assert!(evaluate(&p, &resolved));
    }

    #[test]
    fn test_is_set() {
        let present = json!("x");
        let empty = json!("");
        assert!(is_set(&single(&present)));
        assert!(!is_set(&Resolved::default()));
        assert!(!is_set(&single(&empty)));
        assert!(!is_set(&Resolved::from_elements(vec![&present, &empty])));
    }

    #[test]
    fn test_is_set_fails_closed_when_truncated() {
        let present = json!("a");
        let mut resolved = Resolved::from_elements(vec![&present]);
        assert!(is_set(&resolved));

        resolved.truncated = true;
        assert!(!is_set(&resolved));
    }

    #[test]
    fn test_is_set_ignores_operand() {
        let value = json!({"color": "red"});
        let p = FieldPredicate::new("furniture", FieldType::Object, ComparatorType::IsSet, Operand::None);
        assert!(evaluate(&p, &single(&value)));
    }

    #[test]
    fn test_contains_substring_and_membership() {
        let title = json!("Summer Sale");
        let p = predicate(ComparatorType::Contains, FieldType::String, vec![text("Sale")]);
        assert!(evaluate(&p, &single(&title)));

        let p = predicate(ComparatorType::Contains, FieldType::String, vec![text("sale")]);
        assert!(!evaluate(&p, &single(&title)));

        let tags = [json!("red"), json!("blue")];
        let p = predicate(ComparatorType::Contains, FieldType::String, vec![text("blue")]);
        assert!(evaluate(&p, &array(&tags)));

        // A substring of an element is not membership.
        let tags = [json!("blueberry"), json!("red")];
        assert!(!evaluate(&p, &array(&tags)));

        let p = predicate(ComparatorType::Contains, FieldType::String, vec![text("red")]);
        assert!(evaluate(&p, &array(&tags)));
    }

    #[test]
    fn test_contains_substring_through_mid_path_array() {
        // Values reached through an array of objects are single values.
        let names = [json!("blueberry muffin")];
        let resolved = Resolved::from_scalars(names.iter().collect());
        let p = predicate(ComparatorType::Contains, FieldType::String, vec![text("blue")]);
        assert!(evaluate(&p, &resolved));
    }

    #[test]
    fn test_starts_with() {
        let names = [json!("Mocha"), json!("Latte")];
        let resolved = array(&names);

        let p = predicate(ComparatorType::StartsWith, FieldType::String, vec![text("Lat")]);
        assert!(evaluate(&p, &resolved));

        let p = predicate(ComparatorType::StartsWith, FieldType::String, vec![text("atte")]);
        assert!(!evaluate(&p, &resolved));
    }

    #[test]
    fn test_matches_regex_full_value() {
        let phone = json!("+1-555-0100");
        let p = FieldPredicate::new(
            "phone",
            FieldType::String,
            ComparatorType::MatchesRegex,
            Operand::Patterns(vec![Regex::new(r"^(?:\+1-\d{3}-\d{4})$").unwrap()]),
        );
        assert!(evaluate(&p, &single(&phone)));

        let longer = json!("call +1-555-0100");
        assert!(!evaluate(&p, &single(&longer)));
    }

    #[test]
    fn test_is_one_of_and_is_not_one_of() {
        let city = json!("Paris");
        let cities = vec![text("London"), text("Paris")];

        let p = predicate(ComparatorType::IsOneOf, FieldType::String, cities.clone());
        assert!(evaluate(&p, &single(&city)));

        let p = predicate(ComparatorType::IsNotOneOf, FieldType::String, cities);
        assert!(!evaluate(&p, &single(&city)));

        let other = json!("Rome");
        let p = predicate(ComparatorType::IsNotOneOf, FieldType::String, vec![text("London")]);
        assert!(evaluate(&p, &single(&other)));
    }

    #[test]
    fn test_boolean_equals() {
        let flag = json!("TRUE");
        let p = predicate(ComparatorType::Equals, FieldType::Boolean, vec![Scalar::Boolean(true)]);
        assert!(evaluate(&p, &single(&flag)));
    }

    #[test]
    fn test_mismatched_operand_never_matches() {
        let value = json!("x");
        let p = FieldPredicate::new("field", FieldType::String, ComparatorType::Equals, Operand::None);
        assert!(!evaluate(&p, &single(&value)));
    }
}
