//! Query templates and instantiated query specs.

use std::fmt;

/// The substitution point in a query template.
pub const ENTITY_PLACEHOLDER: &str = "$UUID";

/// An instantiated query, ready to send to the backend.
///
/// Query text is opaque to the pipeline. Specs are rebuilt whenever the
/// selected entity changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuerySpec {
    /// The query expression.
    pub query_text: String,
    /// Evaluate over a time range instead of at a single instant.
    pub is_range: bool,
}

impl QuerySpec {
    /// An instant query.
    pub fn instant(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            is_range: false,
        }
    }

    /// A range query.
    pub fn range(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            is_range: true,
        }
    }
}

/// A query string with a single entity substitution point.
///
/// Every occurrence of `$UUID` is replaced by the entity id. The id is escaped
/// so it stays inside a double-quoted label matcher.
///
/// ```rust
/// use gpuwatch_types::QueryTemplate;
///
/// let t = QueryTemplate::new(r#"DCGM_FI_DEV_MAX_SM_CLOCK{UUID="$UUID"}"#);
/// assert_eq!(t.render("GPU-1"), r#"DCGM_FI_DEV_MAX_SM_CLOCK{UUID="GPU-1"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct QueryTemplate(String);

impl QueryTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the template references the entity.
    pub fn has_placeholder(&self) -> bool {
        self.0.contains(ENTITY_PLACEHOLDER)
    }

    /// Substitute the entity id into the template.
    pub fn render(&self, entity_id: &str) -> String {
        self.0.replace(ENTITY_PLACEHOLDER, &escape_label_value(entity_id))
    }

    /// Build an instant query for the entity.
    pub fn instant(&self, entity_id: &str) -> QuerySpec {
        QuerySpec::instant(self.render(entity_id))
    }

    /// Build a range query for the entity.
    pub fn range(&self, entity_id: &str) -> QuerySpec {
        QuerySpec::range(self.render(entity_id))
    }
}

impl fmt::Display for QueryTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QueryTemplate {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_occurrence() {
        let t = QueryTemplate::new(r#"a{UUID="$UUID"} / b{UUID="$UUID"}"#);
        assert_eq!(t.render("GPU-9"), r#"a{UUID="GPU-9"} / b{UUID="GPU-9"}"#);
    }

    #[test]
    fn escapes_quotes_and_backslashes() {
        let t = QueryTemplate::new(r#"m{UUID="$UUID"}"#);
        assert_eq!(t.render(r#"x"} or vector(1) or m{a="\"#), r#"m{UUID="x\"} or vector(1) or m{a=\"\\"}"#);
    }

    #[test]
    fn template_without_placeholder() {
        let t = QueryTemplate::new("DCGM_FI_PROF_GR_ENGINE_ACTIVE");
        assert!(!t.has_placeholder());
        assert_eq!(t.render("ignored"), "DCGM_FI_PROF_GR_ENGINE_ACTIVE");
    }

    #[test]
    fn instant_and_range_specs() {
        let t = QueryTemplate::new("m{UUID=\"$UUID\"}");
        assert!(!t.instant("g").is_range);
        assert!(t.range("g").is_range);
        assert_eq!(t.instant("g").query_text, t.range("g").query_text);
    }
}
