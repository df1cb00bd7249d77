//! Section validators.
//!
//! A request is validated section by section in a fixed order. Each section
//! validator runs the schema engine against the event's section value,
//! annotates failures with a client-facing 400, and merges the coerced
//! output back into the event in place.

use crate::engine::{EngineOptions, SchemaEngine};
use crate::schema::Schema;
use portico_core::{PorticoError, PorticoResult, ProxyEvent};
use serde_json::Value;
use std::sync::Arc;

/// One logically distinct, independently validated part of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Single-value headers.
    Headers,
    /// Single-value query string parameters.
    QueryStringParameters,
    /// The request body.
    Body,
    /// Path parameters.
    PathParameters,
    /// Multi-value headers.
    MultiValueHeaders,
    /// Multi-value query string parameters.
    MultiValueQueryStringParameters,
}

impl Section {
    /// The fixed validation order.
    pub const ORDER: [Self; 6] = [
        Self::Headers,
        Self::QueryStringParameters,
        Self::Body,
        Self::PathParameters,
        Self::MultiValueHeaders,
        Self::MultiValueQueryStringParameters,
    ];

    /// The wire key of this section.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Headers => "headers",
            Self::QueryStringParameters => "queryStringParameters",
            Self::Body => "body",
            Self::PathParameters => "pathParameters",
            Self::MultiValueHeaders => "multiValueHeaders",
            Self::MultiValueQueryStringParameters => "multiValueQueryStringParameters",
        }
    }

    /// Parses a section key; `query` is accepted as an alias for
    /// `queryStringParameters`.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "headers" => Some(Self::Headers),
            "queryStringParameters" | "query" => Some(Self::QueryStringParameters),
            "body" => Some(Self::Body),
            "pathParameters" => Some(Self::PathParameters),
            "multiValueHeaders" => Some(Self::MultiValueHeaders),
            "multiValueQueryStringParameters" => Some(Self::MultiValueQueryStringParameters),
            _ => None,
        }
    }

    fn position(self) -> usize {
        Self::ORDER
            .iter()
            .position(|section| *section == self)
            .unwrap_or(Self::ORDER.len())
    }
}

/// Declarative validation configuration for a handler method.
///
/// # Example
///
/// ```
/// use portico_validate::{FieldRule, Schema, ValidationSpec};
///
/// let spec = ValidationSpec::new()
///     .body(
///         Schema::new()
///             .field("name", FieldRule::string().trim().required())
///             .field("age", FieldRule::number().required()),
///     )
///     .allow_unknown(true);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValidationSpec {
    sections: Vec<(Section, Schema, Option<bool>)>,
    allow_unknown: Option<bool>,
}

impl ValidationSpec {
    /// Creates an empty spec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a schema for an arbitrary section.
    #[must_use]
    pub fn section(mut self, section: Section, schema: Schema) -> Self {
        self.sections.retain(|(existing, _, _)| *existing != section);
        self.sections.push((section, schema, None));
        self
    }

    /// Declares the headers schema.
    #[must_use]
    pub fn headers(self, schema: Schema) -> Self {
        self.section(Section::Headers, schema)
    }

    /// Declares the query string parameters schema.
    #[must_use]
    pub fn query(self, schema: Schema) -> Self {
        self.section(Section::QueryStringParameters, schema)
    }

    /// Declares the body schema.
    #[must_use]
    pub fn body(self, schema: Schema) -> Self {
        self.section(Section::Body, schema)
    }

    /// Declares the path parameters schema.
    #[must_use]
    pub fn path_parameters(self, schema: Schema) -> Self {
        self.section(Section::PathParameters, schema)
    }

    /// Declares an explicit multi-value headers schema, suppressing the
    /// automatic derivation from the headers schema.
    #[must_use]
    pub fn multi_value_headers(self, schema: Schema) -> Self {
        self.section(Section::MultiValueHeaders, schema)
    }

    /// Declares an explicit multi-value query schema, suppressing the
    /// automatic derivation from the query schema.
    #[must_use]
    pub fn multi_value_query(self, schema: Schema) -> Self {
        self.section(Section::MultiValueQueryStringParameters, schema)
    }

    /// Sets the schema-wide unknown-key default.
    #[must_use]
    pub fn allow_unknown(mut self, allow: bool) -> Self {
        self.allow_unknown = Some(allow);
        self
    }

    /// Overrides the unknown-key policy for one declared section.
    ///
    /// No-op if the section has no schema declared yet.
    #[must_use]
    pub fn section_allow_unknown(mut self, section: Section, allow: bool) -> Self {
        for (existing, _, override_flag) in &mut self.sections {
            if *existing == section {
                *override_flag = Some(allow);
            }
        }
        self
    }
}

struct SectionRule {
    section: Section,
    schema: Schema,
    allow_unknown: Option<bool>,
}

/// A compiled, ordered list of section validators.
pub struct SectionSet {
    rules: Vec<SectionRule>,
    default_allow_unknown: Option<bool>,
    engine: Arc<dyn SchemaEngine>,
}

impl SectionSet {
    /// Compiles a spec against a schema engine.
    ///
    /// Multi-value variants not explicitly authored are synthesized from
    /// the corresponding singular schema by wrapping every field rule in an
    /// array-of variant; the singular section's unknown-key override is
    /// inherited.
    #[must_use]
    pub fn compile(spec: ValidationSpec, engine: Arc<dyn SchemaEngine>) -> Self {
        let mut rules: Vec<SectionRule> = spec
            .sections
            .iter()
            .map(|(section, schema, allow_unknown)| SectionRule {
                section: *section,
                schema: schema.clone(),
                allow_unknown: *allow_unknown,
            })
            .collect();

        let derivations = [
            (Section::Headers, Section::MultiValueHeaders),
            (
                Section::QueryStringParameters,
                Section::MultiValueQueryStringParameters,
            ),
        ];
        for (singular, multi) in derivations {
            if rules.iter().any(|rule| rule.section == multi) {
                continue;
            }
            if let Some(source) = rules.iter().find(|rule| rule.section == singular) {
                let derived = SectionRule {
                    section: multi,
                    schema: source.schema.to_multi_value(),
                    allow_unknown: source.allow_unknown,
                };
                rules.push(derived);
            }
        }

        rules.sort_by_key(|rule| rule.section.position());

        Self {
            rules,
            default_allow_unknown: spec.allow_unknown,
            engine,
        }
    }

    /// Whether the set validates nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The sections validated, in execution order.
    #[must_use]
    pub fn sections(&self) -> Vec<Section> {
        self.rules.iter().map(|rule| rule.section).collect()
    }

    /// Validates every declared section against the event, merging coerced
    /// output back into the event in place.
    ///
    /// # Errors
    ///
    /// Returns a 400-status [`PorticoError::validation`] naming the section
    /// and offending field on the first failure.
    pub fn validate(&self, event: &mut ProxyEvent) -> PorticoResult<()> {
        for rule in &self.rules {
            let allow_unknown = rule
                .allow_unknown
                .or(self.default_allow_unknown)
                .unwrap_or(true);
            let options = EngineOptions { allow_unknown };

            let current = section_value(event, rule.section);
            let coerced = self
                .engine
                .validate(&current, &rule.schema, &options)
                .map_err(|fault| {
                    PorticoError::validation(format!("{}: {}", rule.section.key(), fault))
                })?;
            write_section(event, rule.section, coerced);
        }
        Ok(())
    }
}

fn section_value(event: &ProxyEvent, section: Section) -> Value {
    match section {
        Section::Headers => Value::Object(event.headers.clone()),
        Section::QueryStringParameters => Value::Object(event.query_string_parameters.clone()),
        Section::Body => event.body.clone(),
        Section::PathParameters => Value::Object(event.path_parameters.clone()),
        Section::MultiValueHeaders => Value::Object(event.multi_value_headers.clone()),
        Section::MultiValueQueryStringParameters => {
            Value::Object(event.multi_value_query_string_parameters.clone())
        }
    }
}

fn write_section(event: &mut ProxyEvent, section: Section, coerced: Value) {
    if section == Section::Body {
        event.body = coerced;
        return;
    }
    let Value::Object(map) = coerced else {
        return;
    };
    match section {
        Section::Headers => event.headers = map,
        Section::QueryStringParameters => event.query_string_parameters = map,
        Section::PathParameters => event.path_parameters = map,
        Section::MultiValueHeaders => event.multi_value_headers = map,
        Section::MultiValueQueryStringParameters => {
            event.multi_value_query_string_parameters = map;
        }
        Section::Body => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FieldRuleEngine;
    use crate::schema::FieldRule;
    use http::StatusCode;
    use serde_json::json;

    fn compile(spec: ValidationSpec) -> SectionSet {
        SectionSet::compile(spec, Arc::new(FieldRuleEngine::new()))
    }

    #[test]
    fn sections_run_in_fixed_order_regardless_of_declaration() {
        let set = compile(
            ValidationSpec::new()
                .body(Schema::new())
                .headers(Schema::new())
                .query(Schema::new()),
        );
        assert_eq!(
            set.sections(),
            vec![
                Section::Headers,
                Section::QueryStringParameters,
                Section::Body,
                Section::MultiValueHeaders,
                Section::MultiValueQueryStringParameters,
            ]
        );
    }

    #[test]
    fn body_coercion_merges_in_place() {
        let set = compile(ValidationSpec::new().body(
            Schema::new().field("name", FieldRule::string().trim().required()),
        ));

        let mut event = ProxyEvent::for_method("PUT");
        event.body = json!({"name": "  John Doe"});

        set.validate(&mut event).unwrap();
        assert_eq!(event.body, json!({"name": "John Doe"}));
    }

    #[test]
    fn failure_carries_400_and_field_name() {
        let set = compile(ValidationSpec::new().body(
            Schema::new().field("age", FieldRule::number().required()),
        ));

        let mut event = ProxyEvent::for_method("PUT");
        event.body = json!({});

        let err = set.validate(&mut event).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.wire_type(), "ValidationError");
        assert!(err.to_string().contains("\"age\" is required"));
    }

    #[test]
    fn multi_value_schema_is_synthesized_from_singular() {
        let set = compile(ValidationSpec::new().query(
            Schema::new().field("tag", FieldRule::string().trim()),
        ));
        assert_eq!(
            set.sections(),
            vec![
                Section::QueryStringParameters,
                Section::MultiValueQueryStringParameters,
            ]
        );

        let mut event = ProxyEvent::for_method("GET");
        event
            .query_string_parameters
            .insert("tag".to_string(), json!(" a "));
        event
            .multi_value_query_string_parameters
            .insert("tag".to_string(), json!([" a ", " b "]));

        set.validate(&mut event).unwrap();
        assert_eq!(event.query_string_parameters["tag"], json!("a"));
        assert_eq!(
            event.multi_value_query_string_parameters["tag"],
            json!(["a", "b"])
        );
    }

    #[test]
    fn explicit_multi_value_schema_suppresses_synthesis() {
        let set = compile(
            ValidationSpec::new()
                .headers(Schema::new().field("x-id", FieldRule::string()))
                .multi_value_headers(Schema::new().field("x-other", FieldRule::any())),
        );

        let sections = set.sections();
        assert_eq!(
            sections,
            vec![Section::Headers, Section::MultiValueHeaders]
        );

        let mut event = ProxyEvent::for_method("GET");
        // The explicit multi-value schema does not require x-id arrays.
        event
            .multi_value_headers
            .insert("x-other".to_string(), json!("anything"));
        set.validate(&mut event).unwrap();
    }

    #[test]
    fn allow_unknown_precedence() {
        // Implicit default allows unknowns.
        let set = compile(ValidationSpec::new().body(Schema::new()));
        let mut event = ProxyEvent::for_method("POST");
        event.body = json!({"anything": 1});
        set.validate(&mut event).unwrap();

        // Schema-wide default forbids them.
        let set = compile(ValidationSpec::new().body(Schema::new()).allow_unknown(false));
        let mut event = ProxyEvent::for_method("POST");
        event.body = json!({"anything": 1});
        assert!(set.validate(&mut event).is_err());

        // Per-section override wins over the schema-wide default.
        let set = compile(
            ValidationSpec::new()
                .body(Schema::new())
                .allow_unknown(false)
                .section_allow_unknown(Section::Body, true),
        );
        let mut event = ProxyEvent::for_method("POST");
        event.body = json!({"anything": 1});
        set.validate(&mut event).unwrap();
    }

    #[test]
    fn validating_twice_leaves_event_unchanged() {
        let set = compile(
            ValidationSpec::new().body(
                Schema::new()
                    .field("name", FieldRule::string().trim().required())
                    .field("age", FieldRule::number()),
            ),
        );

        let mut event = ProxyEvent::for_method("PUT");
        event.body = json!({"name": " John ", "age": "42"});

        set.validate(&mut event).unwrap();
        let after_first = event.body.clone();
        set.validate(&mut event).unwrap();
        assert_eq!(event.body, after_first);
    }
}
