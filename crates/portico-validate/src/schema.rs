//! Declarative field schemas.

use indexmap::IndexMap;

/// The expected shape of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A string value, optionally trimmed on coercion.
    String,
    /// A numeric value; numeric strings are coerced.
    Number,
    /// A boolean value; `"true"`/`"false"` strings are coerced.
    Boolean,
    /// A JSON object.
    Object,
    /// An array whose elements each satisfy the inner rule.
    Array(Box<FieldRule>),
    /// Any value, passed through unchanged.
    Any,
}

/// A validation rule for one field.
///
/// # Example
///
/// ```
/// use portico_validate::FieldRule;
///
/// let name = FieldRule::string().trim().required();
/// assert!(name.is_required());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    kind: FieldKind,
    required: bool,
    trim: bool,
}

impl FieldRule {
    fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            trim: false,
        }
    }

    /// A string field.
    #[must_use]
    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    /// A numeric field.
    #[must_use]
    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    /// A boolean field.
    #[must_use]
    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    /// An object field.
    #[must_use]
    pub fn object() -> Self {
        Self::new(FieldKind::Object)
    }

    /// An array field whose elements each satisfy `element`.
    #[must_use]
    pub fn array(element: FieldRule) -> Self {
        Self::new(FieldKind::Array(Box::new(element)))
    }

    /// A field with no constraints.
    #[must_use]
    pub fn any() -> Self {
        Self::new(FieldKind::Any)
    }

    /// Marks the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Trims surrounding whitespace when coercing a string value.
    #[must_use]
    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    /// Whether the field is required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether string coercion trims whitespace.
    #[must_use]
    pub fn trims(&self) -> bool {
        self.trim
    }

    /// The expected field shape.
    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Wraps this rule in an array-of variant for multi-value sections.
    ///
    /// The array itself inherits the required flag; each element is
    /// validated with the original rule, so per-field policies such as
    /// trimming apply element-wise.
    #[must_use]
    pub fn into_multi_value(self) -> Self {
        let required = self.required;
        Self {
            kind: FieldKind::Array(Box::new(self)),
            required,
            trim: false,
        }
    }
}

/// An ordered set of field rules for one request section.
///
/// # Example
///
/// ```
/// use portico_validate::{FieldRule, Schema};
///
/// let schema = Schema::new()
///     .field("name", FieldRule::string().trim().required())
///     .field("age", FieldRule::number());
///
/// assert_eq!(schema.fields().count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: IndexMap<String, FieldRule>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field rule, replacing any existing rule for the name.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.insert(name.into(), rule);
        self
    }

    /// Iterates the field rules in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    /// Looks up the rule for a field name.
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.fields.get(name)
    }

    /// Whether the schema declares no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Derives the multi-value variant of this schema: every field rule is
    /// wrapped in an array-of variant so repeated header/query keys are
    /// validated element-wise with the same per-field rules.
    #[must_use]
    pub fn to_multi_value(&self) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .map(|(name, rule)| (name.clone(), rule.clone().into_multi_value()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_value_wraps_every_field() {
        let schema = Schema::new()
            .field("name", FieldRule::string().trim().required())
            .field("count", FieldRule::number());

        let multi = schema.to_multi_value();
        let name = multi.rule("name").unwrap();

        assert!(name.is_required());
        match name.kind() {
            FieldKind::Array(element) => {
                assert!(element.trims());
                assert_eq!(element.kind(), &FieldKind::String);
            }
            other => panic!("expected array rule, got {other:?}"),
        }
        assert!(matches!(
            multi.rule("count").unwrap().kind(),
            FieldKind::Array(_)
        ));
    }

    #[test]
    fn field_replaces_existing_rule() {
        let schema = Schema::new()
            .field("x", FieldRule::string())
            .field("x", FieldRule::number());

        assert_eq!(schema.fields().count(), 1);
        assert_eq!(schema.rule("x").unwrap().kind(), &FieldKind::Number);
    }
}
