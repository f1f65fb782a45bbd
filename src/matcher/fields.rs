//! Dotted field path resolution over JSON values.
//!
//! Resolution never fails. A path that cannot be followed simply contributes
//! no values, which evaluates as "predicate false" further up.

use serde_json::Value;
use tracing::trace;

/// Values a field path resolved to within one event.
///
/// Values found at the end of the path are kept apart from the elements of
/// arrays found at the end of the path, since `Contains` tests substrings of
/// the former and membership among the latter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolved<'v> {
    /// Non-array values at the end of the path.
    pub scalars: Vec<&'v Value>,
    /// Elements of arrays at the end of the path, nested arrays flattened.
    pub elements: Vec<&'v Value>,
    /// Collection stopped at the fan-out cap with values left over.
    pub truncated: bool,
}

impl<'v> Resolved<'v> {
    /// A resolved set made only of non-array values.
    pub fn from_scalars(scalars: Vec<&'v Value>) -> Self {
        Self {
            scalars,
            ..Self::default()
        }
    }

    /// A resolved set made only of array elements.
    pub fn from_elements(elements: Vec<&'v Value>) -> Self {
        Self {
            elements,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.scalars.len() + self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty() && self.elements.is_empty()
    }

    /// Every resolved value, scalars first.
    pub fn iter(&self) -> impl Iterator<Item = &'v Value> + '_ {
        self.scalars.iter().chain(self.elements.iter()).copied()
    }

    pub fn values(&self) -> Vec<&'v Value> {
        self.iter().collect()
    }
}

/// Field path resolver with a cap on the number of resolved values.
///
/// Arrays are transparent: an array met in the middle of a path applies the
/// remaining path to every element, and an array at the end of a path
/// contributes its elements. This gives "any element" semantics for arrays of
/// objects and arrays of primitives alike.
///
/// ```rust
/// use criteria_engine::matcher::FieldResolver;
/// use serde_json::json;
///
/// let fields = json!({
///     "furniture": {
///         "material": [
///             {"type": "table", "color": "black"},
///             {"type": "chair", "color": "brown"}
///         ]
///     }
/// });
///
/// let resolver = FieldResolver::new(16);
/// let colors = resolver.resolve(&fields, &["furniture", "material", "color"]);
/// assert_eq!(colors.values(), vec![&json!("black"), &json!("brown")]);
/// assert!(!colors.truncated);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver {
    max_fanout: usize,
}

impl FieldResolver {
    pub fn new(max_fanout: usize) -> Self {
        Self { max_fanout }
    }

    /// Resolve `path` starting at `value`.
    pub fn resolve<'v, S: AsRef<str>>(&self, value: &'v Value, path: &[S]) -> Resolved<'v> {
        let mut out = Resolved::default();
        self.resolve_into(value, path, &mut out);
        out
    }

    /// Resolve `path` starting at `value`, appending to `out`.
    ///
    /// Stops as soon as a value would exceed `max_fanout`, marking `out` as
    /// truncated.
    pub fn resolve_into<'v, S: AsRef<str>>(
        &self,
        value: &'v Value,
        path: &[S],
        out: &mut Resolved<'v>,
    ) {
        if out.truncated {
            return;
        }

        match value {
            Value::Array(elements) => self.resolve_elements_into(elements, path, out),
            Value::Null => {}
            _ if path.is_empty() => self.push(value, false, out),
            Value::Object(map) => {
                if let Some(child) = map.get(path[0].as_ref()) {
                    self.resolve_into(child, &path[1..], out);
                }
            }
            // A scalar where a mapping was expected.
            _ => {}
        }
    }

    /// Resolve `path` against every element of an array.
    pub fn resolve_elements_into<'v, S: AsRef<str>>(
        &self,
        elements: &'v [Value],
        path: &[S],
        out: &mut Resolved<'v>,
    ) {
        for element in elements {
            if out.truncated {
                break;
            }
            match element {
                Value::Array(nested) => self.resolve_elements_into(nested, path, out),
                Value::Null => {}
                _ if path.is_empty() => self.push(element, true, out),
                _ => self.resolve_into(element, path, out),
            }
        }
    }

    fn push<'v>(&self, value: &'v Value, element: bool, out: &mut Resolved<'v>) {
        if out.len() >= self.max_fanout {
            trace!(max_fanout = self.max_fanout, "field fan-out cap reached");
            out.truncated = true;
            return;
        }
        if element {
            out.elements.push(value);
        } else {
            out.scalars.push(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve<'v>(value: &'v Value, path: &str) -> Resolved<'v> {
        let segments: Vec<&str> = path.split('.').collect();
        FieldResolver::new(1024).resolve(value, &segments)
    }

    #[test]
    fn test_simple_field() {
        let fields = json!({"firstName": "David"});
        let resolved = resolve(&fields, "firstName");
        assert_eq!(resolved.scalars, vec![&json!("David")]);
        assert!(resolved.elements.is_empty());
    }

    #[test]
    fn test_missing_field() {
        let fields = json!({"firstName": "David"});
        assert!(resolve(&fields, "lastName").is_empty());
    }

    #[test]
    fn test_nested_objects() {
        let fields = json!({"a": {"b": {"c": 42}}});
        assert_eq!(resolve(&fields, "a.b.c").values(), vec![&json!(42)]);
    }

    #[test]
    fn test_scalar_where_mapping_expected() {
        let fields = json!({"a": "text"});
        assert!(resolve(&fields, "a.b").is_empty());
    }

    #[test]
    fn test_terminal_array_of_primitives() {
        let fields = json!({"milestoneYears": [1996, 1997, 2002]});
        let resolved = resolve(&fields, "milestoneYears");
        assert!(resolved.scalars.is_empty());
        assert_eq!(
            resolved.elements,
            vec![&json!(1996), &json!(1997), &json!(2002)]
        );
    }

    #[test]
    fn test_array_of_objects_mid_path() {
        let fields = json!({
            "furniture": [
                {"type": "table", "price": 100},
                {"type": "chair"},
                {"type": "sofa", "price": 900}
            ]
        });
        let resolved = resolve(&fields, "furniture.price");
        assert_eq!(resolved.scalars, vec![&json!(100), &json!(900)]);
        assert!(resolved.elements.is_empty());
    }

    #[test]
    fn test_nested_arrays_flatten() {
        let fields = json!({"matrix": [[1, 2], [3]]});
        assert_eq!(
            resolve(&fields, "matrix").elements,
            vec![&json!(1), &json!(2), &json!(3)]
        );
    }

    #[test]
    fn test_null_contributes_nothing() {
        let fields = json!({"a": null, "b": [null, "x"]});
        assert!(resolve(&fields, "a").is_empty());
        assert_eq!(resolve(&fields, "b").values(), vec![&json!("x")]);
    }

    #[test]
    fn test_terminal_object() {
        let fields = json!({"address": {"city": "Paris"}});
        assert_eq!(
            resolve(&fields, "address").values(),
            vec![&json!({"city": "Paris"})]
        );
    }

    #[test]
    fn test_fanout_cap_marks_truncation() {
        let fields = json!({"values": [1, 2, 3, 4, 5, 6]});
        let resolved = FieldResolver::new(4).resolve(&fields, &["values"]);
        assert_eq!(resolved.len(), 4);
        assert!(resolved.truncated);
    }

    #[test]
    fn test_fanout_exactly_at_cap_is_not_truncated() {
        let fields = json!({"values": [1, 2, 3, 4]});
        let resolved = FieldResolver::new(4).resolve(&fields, &["values"]);
        assert_eq!(resolved.len(), 4);
        assert!(!resolved.truncated);
    }

    #[test]
    fn test_fanout_cap_stops_mid_path_walk() {
        let fields = json!({"rows": [{"v": 1}, {"v": 2}, {"v": 3}, {"v": 4}]});
        let resolved = FieldResolver::new(2).resolve(&fields, &["rows", "v"]);
        assert_eq!(resolved.values(), vec![&json!(1), &json!(2)]);
        assert!(resolved.truncated);
    }
}
