//! Injection-attack scanning.
//!
//! An optional pipeline stage runs a [`ContentScanner`] over the inbound
//! event before authentication and validation. Findings are either logged
//! (report mode) or turned into a client-facing validation failure (fail
//! mode).

use portico_core::{PorticoError, PorticoResult, ProxyEvent};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// What to do with a scanner finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtectionMode {
    /// Do not scan at all.
    Disabled,
    /// Scan and log findings at warn level; the request proceeds.
    #[default]
    Report,
    /// Scan and reject the request on the first finding.
    Fail,
}

/// A suspicious value found by a scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFinding {
    /// The event section the value came from (`queryStringParameters`,
    /// `body`, ...).
    pub section: &'static str,
    /// The key within the section.
    pub key: String,
}

impl fmt::Display for ScanFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.key)
    }
}

/// Scans an inbound event for hostile content.
pub trait ContentScanner: Send + Sync {
    /// Returns the first finding, if any.
    fn scan(&self, event: &ProxyEvent) -> Option<ScanFinding>;
}

/// Regex-based SQL-injection scanner over query string parameters, path
/// parameters, and string body values.
pub struct SqlScanner {
    pattern: Option<Regex>,
}

impl SqlScanner {
    /// Creates a scanner with the built-in signature set.
    #[must_use]
    pub fn new() -> Self {
        let pattern = Regex::new(
            r"(?i)('\s*(or|and)\s+.+[=<>])|(union\s+(all\s+)?select)|(;\s*(drop|delete|insert|update)\b)|(--)|(\b(sleep|benchmark)\s*\()",
        )
        .ok();
        Self { pattern }
    }

    fn matches(&self, value: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(value))
    }

    fn scan_map(
        &self,
        section: &'static str,
        map: &serde_json::Map<String, Value>,
    ) -> Option<ScanFinding> {
        for (key, value) in map {
            if let Some(text) = value.as_str() {
                if self.matches(text) {
                    return Some(ScanFinding {
                        section,
                        key: key.clone(),
                    });
                }
            }
        }
        None
    }
}

impl Default for SqlScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentScanner for SqlScanner {
    fn scan(&self, event: &ProxyEvent) -> Option<ScanFinding> {
        if let Some(finding) = self.scan_map("queryStringParameters", &event.query_string_parameters)
        {
            return Some(finding);
        }
        if let Some(finding) = self.scan_map("pathParameters", &event.path_parameters) {
            return Some(finding);
        }
        match &event.body {
            Value::Object(map) => self.scan_map("body", map),
            Value::String(text) if self.matches(text) => Some(ScanFinding {
                section: "body",
                key: String::new(),
            }),
            _ => None,
        }
    }
}

/// The configured protection stage: a scanner plus a mode.
pub(crate) struct Protection {
    mode: ProtectionMode,
    scanner: Arc<dyn ContentScanner>,
}

impl Protection {
    pub(crate) fn new(mode: ProtectionMode, scanner: Arc<dyn ContentScanner>) -> Self {
        Self { mode, scanner }
    }

    pub(crate) fn run(&self, event: &ProxyEvent) -> PorticoResult<()> {
        if self.mode == ProtectionMode::Disabled {
            return Ok(());
        }
        let Some(finding) = self.scanner.scan(event) else {
            return Ok(());
        };
        match self.mode {
            ProtectionMode::Report => {
                tracing::warn!(location = %finding, "potential injection attack detected");
                Ok(())
            }
            ProtectionMode::Fail => Err(PorticoError::validation(format!(
                "potential injection attack: {finding}"
            ))),
            ProtectionMode::Disabled => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_with_query(key: &str, value: &str) -> ProxyEvent {
        let mut event = ProxyEvent::for_method("GET");
        event
            .query_string_parameters
            .insert(key.to_string(), json!(value));
        event
    }

    #[test]
    fn benign_values_pass() {
        let scanner = SqlScanner::new();
        assert!(scanner.scan(&event_with_query("name", "John O'Neil")).is_none());
        assert!(scanner.scan(&event_with_query("q", "select a seat")).is_none());
    }

    #[test]
    fn classic_injection_payloads_are_flagged() {
        let scanner = SqlScanner::new();
        for payload in [
            "' or 1=1",
            "x' OR 'a' = 'a",
            "1 UNION SELECT password FROM users",
            "1; DROP TABLE users",
            "admin'--",
        ] {
            let finding = scanner.scan(&event_with_query("id", payload));
            assert!(finding.is_some(), "payload not flagged: {payload}");
        }
    }

    #[test]
    fn body_string_values_are_scanned() {
        let scanner = SqlScanner::new();
        let mut event = ProxyEvent::for_method("POST");
        event.body = json!({"comment": "1; drop table users"});

        let finding = scanner.scan(&event).unwrap();
        assert_eq!(finding.section, "body");
        assert_eq!(finding.key, "comment");
    }

    #[test]
    fn fail_mode_rejects_with_validation_error() {
        let protection = Protection::new(ProtectionMode::Fail, Arc::new(SqlScanner::new()));
        let err = protection
            .run(&event_with_query("id", "' or 1=1"))
            .unwrap_err();
        assert!(err.to_string().contains("potential injection attack"));
        assert_eq!(err.status().as_u16(), 400);
    }

    #[test]
    fn report_mode_lets_the_request_proceed() {
        let protection = Protection::new(ProtectionMode::Report, Arc::new(SqlScanner::new()));
        protection.run(&event_with_query("id", "' or 1=1")).unwrap();
    }

    #[test]
    fn disabled_mode_never_scans() {
        struct PanicScanner;
        impl ContentScanner for PanicScanner {
            fn scan(&self, _: &ProxyEvent) -> Option<ScanFinding> {
                panic!("scanner invoked while disabled");
            }
        }
        let protection = Protection::new(ProtectionMode::Disabled, Arc::new(PanicScanner));
        protection.run(&ProxyEvent::for_method("GET")).unwrap();
    }
}
