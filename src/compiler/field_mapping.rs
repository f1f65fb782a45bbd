//! Field path aliases applied while compiling predicates.
//!
//! This module provides the [`FieldMapping`] struct, which rewrites the leading
//! segments of predicate field paths so criteria written against different
//! event vocabularies resolve against the same event shape.

use std::collections::HashMap;

/// Prefix aliases for predicate field paths.
///
/// A mapping applies when the field equals the alias or starts with the alias
/// followed by `.`. When several aliases apply, the longest one wins.
///
/// The default mapping routes the shopping-cart vocabularies onto the event's
/// `items` array.
///
/// # Examples
///
/// ```rust
/// use criteria_engine::compiler::FieldMapping;
///
/// let mapping = FieldMapping::default();
/// assert_eq!(mapping.normalize_field("shoppingCartItems.price"), "items.price");
/// assert_eq!(
///     mapping.normalize_field("updateCart.updatedShoppingCartItems.quantity"),
///     "items.quantity"
/// );
/// assert_eq!(mapping.normalize_field("total"), "total");
/// ```
#[derive(Debug, Clone)]
pub struct FieldMapping {
    field_map: HashMap<String, String>,
}

impl FieldMapping {
    /// Create a mapping without any aliases.
    ///
    /// ```rust
    /// use criteria_engine::compiler::FieldMapping;
    ///
    /// let mapping = FieldMapping::new();
    /// assert_eq!(mapping.mappings().len(), 0);
    /// assert_eq!(mapping.normalize_field("shoppingCartItems.price"), "shoppingCartItems.price");
    /// ```
    pub fn new() -> Self {
        Self {
            field_map: HashMap::new(),
        }
    }

    /// Create a mapping with the cart-item aliases.
    pub fn with_cart_aliases() -> Self {
        let mut mapping = Self::new();
        mapping.add_mapping("shoppingCartItems".to_string(), "items".to_string());
        mapping.add_mapping("updatedShoppingCartItems".to_string(), "items".to_string());
        mapping.add_mapping(
            "updateCart.updatedShoppingCartItems".to_string(),
            "items".to_string(),
        );
        mapping
    }

    /// Add several aliases at once.
    pub fn load_mappings(&mut self, mappings: HashMap<String, String>) {
        self.field_map.extend(mappings);
    }

    /// Add an alias.
    ///
    /// ```rust
    /// use criteria_engine::compiler::FieldMapping;
    ///
    /// let mut mapping = FieldMapping::new();
    /// mapping.add_mapping("profile".to_string(), "user".to_string());
    /// assert!(mapping.has_mapping("profile"));
    /// assert_eq!(mapping.normalize_field("profile.email"), "user.email");
    /// ```
    pub fn add_mapping(&mut self, source_prefix: String, target_prefix: String) {
        self.field_map.insert(source_prefix, target_prefix);
    }

    /// Rewrite a field path using the longest matching alias.
    ///
    /// Returns the original path if no alias applies.
    pub fn normalize_field(&self, field_name: &str) -> String {
        let best = self
            .field_map
            .iter()
            .filter(|(source, _)| {
                field_name == source.as_str()
                    || field_name
                        .strip_prefix(source.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            })
            .max_by_key(|(source, _)| source.len());

        match best {
            Some((source, target)) => format!("{target}{}", &field_name[source.len()..]),
            None => field_name.to_string(),
        }
    }

    pub fn has_mapping(&self, source_prefix: &str) -> bool {
        self.field_map.contains_key(source_prefix)
    }

    pub fn mappings(&self) -> &HashMap<String, String> {
        &self.field_map
    }
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self::with_cart_aliases()
    }
}
