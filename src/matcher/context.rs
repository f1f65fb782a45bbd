//! Per-event field resolution context.

use crate::event::EventRecord;
use crate::ir::{DataType, FieldPredicate};
use crate::matcher::fields::{FieldResolver, Resolved};
use serde_json::Value;

/// Resolves predicate field paths against a single event record.
///
/// The first path segment is looked up in this order:
/// - the event's `dataFields`
/// - the event-level fields `items`, `total`, `eventName` and `createdAt`
///
/// When that finds nothing and the first segment names the event itself (the
/// custom event's name, or the data type name for purchases and cart updates),
/// the segment is dropped and the rest of the path is resolved. A custom-event
/// path prefixed with another event's name therefore resolves to nothing.
///
/// # Examples
/// ```rust
/// use criteria_engine::matcher::EventContext;
/// use criteria_engine::EventRecord;
/// use serde_json::json;
///
/// let event = EventRecord::custom_event("button-clicked", json!({"animal": "cat"}));
/// let context = EventContext::new(&event, 1024);
///
/// assert_eq!(context.resolve(&["animal"]).values(), vec![&json!("cat")]);
/// assert_eq!(
///     context.resolve(&["button-clicked", "animal"]).values(),
///     vec![&json!("cat")]
/// );
/// assert!(context.resolve(&["page-viewed", "animal"]).is_empty());
/// ```
pub struct EventContext<'a> {
    /// Reference to the original event
    pub event: &'a EventRecord,
    data_type: Option<DataType>,
    event_name: Option<Value>,
    created_at: Option<Value>,
    resolver: FieldResolver,
}

impl<'a> EventContext<'a> {
    pub fn new(event: &'a EventRecord, max_fanout: usize) -> Self {
        Self {
            event,
            data_type: event.data_type(),
            event_name: event.event_name.clone().map(Value::String),
            created_at: event.created_at.map(Value::from),
            resolver: FieldResolver::new(max_fanout),
        }
    }

    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }

    /// Resolve a predicate's field. The path as written wins; the aliased
    /// path is only tried when the written one finds nothing.
    pub fn resolve_field(&self, predicate: &FieldPredicate) -> Resolved<'_> {
        let resolved = self.resolve(&predicate.path);
        match &predicate.alias_path {
            Some(alias_path) if resolved.is_empty() => self.resolve(alias_path),
            _ => resolved,
        }
    }

    /// Resolve a split field path to the values it designates in this event.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Resolved<'_> {
        let direct = self.resolve_from_root(path);
        if !direct.is_empty() || path.len() < 2 || !self.is_event_prefix(path[0].as_ref()) {
            return direct;
        }
        self.resolve_from_root(&path[1..])
    }

    fn resolve_from_root<S: AsRef<str>>(&self, path: &[S]) -> Resolved<'_> {
        let mut out = Resolved::default();
        let Some((head, rest)) = path.split_first() else {
            return out;
        };

        let head = head.as_ref();
        if let Some(value) = self.event.data_fields.get(head) {
            self.resolver.resolve_into(value, rest, &mut out);
            return out;
        }

        match head {
            "items" => self
                .resolver
                .resolve_elements_into(&self.event.items, rest, &mut out),
            "total" => {
                if let Some(total) = &self.event.total {
                    self.resolver.resolve_into(total, rest, &mut out);
                }
            }
            "eventName" => {
                if let Some(name) = &self.event_name {
                    self.resolver.resolve_into(name, rest, &mut out);
                }
            }
            "createdAt" => {
                if let Some(created_at) = &self.created_at {
                    self.resolver.resolve_into(created_at, rest, &mut out);
                }
            }
            _ => {}
        }
        out
    }

    fn is_event_prefix(&self, segment: &str) -> bool {
        match self.data_type {
            Some(DataType::CustomEvent) => self.event.event_name.as_deref() == Some(segment),
            Some(DataType::Purchase) => segment == "purchase",
            Some(DataType::CartUpdate) => segment == "updateCart" || segment == "cartUpdate",
            Some(DataType::User) | None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ComparatorType, FieldType, Operand};
    use serde_json::json;

    fn split(path: &str) -> Vec<&str> {
        path.split('.').collect()
    }

    fn values<'a>(context: &'a EventContext<'_>, path: &str) -> Vec<&'a Value> {
        context.resolve(&split(path)).values()
    }

    #[test]
    fn test_data_fields_lookup() {
        let event = EventRecord::user(json!({"firstName": "David", "address": {"city": "Paris"}}));
        let context = EventContext::new(&event, 1024);

        assert_eq!(values(&context, "firstName"), vec![&json!("David")]);
        assert_eq!(values(&context, "address.city"), vec![&json!("Paris")]);
        assert!(context.resolve(&split("lastName")).is_empty());
    }

    #[test]
    fn test_items_and_total() {
        let event = EventRecord::purchase(
            vec![
                json!({"name": "Mocha", "price": 4.67}),
                json!({"name": "Latte", "price": 5.1}),
            ],
            9.77,
        );
        let context = EventContext::new(&event, 1024);

        assert_eq!(
            values(&context, "items.price"),
            vec![&json!(4.67), &json!(5.1)]
        );
        assert_eq!(values(&context, "total"), vec![&json!(9.77)]);
        assert_eq!(values(&context, "purchase.total"), vec![&json!(9.77)]);
    }

    #[test]
    fn test_data_fields_shadow_event_level_fields() {
        let event = EventRecord::custom_event("checkout", json!({"total": "10"}));
        let context = EventContext::new(&event, 1024);

        assert_eq!(values(&context, "total"), vec![&json!("10")]);
    }

    #[test]
    fn test_event_name_prefix() {
        let event = EventRecord::custom_event("button-clicked", json!({"animal": "cat"}));
        let context = EventContext::new(&event, 1024);

        assert_eq!(
            values(&context, "button-clicked.animal"),
            vec![&json!("cat")]
        );
        assert!(context.resolve(&split("other-event.animal")).is_empty());
    }

    #[test]
    fn test_event_name_field() {
        let event = EventRecord::custom_event("button-clicked", json!({}));
        let context = EventContext::new(&event, 1024);

        assert_eq!(
            values(&context, "eventName"),
            vec![&json!("button-clicked")]
        );
    }

    #[test]
    fn test_created_at_field() {
        let event = EventRecord::user(json!({})).with_created_at(1_700_000_000_000);
        let context = EventContext::new(&event, 1024);

        assert_eq!(
            values(&context, "createdAt"),
            vec![&json!(1_700_000_000_000i64)]
        );
    }

    #[test]
    fn test_cart_update_prefix() {
        let event = EventRecord::cart_update(vec![json!({"quantity": 2})]);
        let context = EventContext::new(&event, 1024);

        assert_eq!(
            values(&context, "updateCart.items.quantity"),
            vec![&json!(2)]
        );
    }

    #[test]
    fn test_user_has_no_event_prefix() {
        let event = EventRecord::user(json!({"firstName": "David"}));
        let context = EventContext::new(&event, 1024);

        assert!(context.resolve(&split("user.firstName")).is_empty());
    }

    #[test]
    fn test_items_path_yields_elements() {
        let event = EventRecord::cart_update(vec![json!({"sku": "a"}), json!({"sku": "b"})]);
        let context = EventContext::new(&event, 1024);

        let items = context.resolve(&split("items"));
        assert_eq!(items.elements.len(), 2);
        assert!(items.scalars.is_empty());
    }

    #[test]
    fn test_written_path_wins_over_alias() {
        let event = EventRecord::custom_event(
            "checkout",
            json!({"shoppingCartItems": [{"price": 5}]}),
        );
        let context = EventContext::new(&event, 1024);
        let predicate = FieldPredicate::new(
            "shoppingCartItems.price",
            FieldType::Double,
            ComparatorType::Equals,
            Operand::None,
        )
        .with_alias("items.price");

        assert_eq!(context.resolve_field(&predicate).values(), vec![&json!(5)]);
    }

    #[test]
    fn test_alias_used_when_written_path_is_absent() {
        let event = EventRecord::purchase(vec![json!({"price": 4.67})], 4.67);
        let context = EventContext::new(&event, 1024);
        let predicate = FieldPredicate::new(
            "shoppingCartItems.price",
            FieldType::Double,
            ComparatorType::Equals,
            Operand::None,
        )
        .with_alias("items.price");

        assert_eq!(context.resolve_field(&predicate).values(), vec![&json!(4.67)]);
    }

    #[test]
    fn test_empty_path() {
        let event = EventRecord::user(json!({"firstName": "David"}));
        let context = EventContext::new(&event, 1024);
        let path: [&str; 0] = [];

        assert!(context.resolve(&path).is_empty());
    }
}
