//! Template Renderer - fills `${ this.path }` placeholders from merged data.
//!
//! Each literal string renders independently. An unresolved placeholder
//! degrades instead of failing: it becomes the fallback text, or, when a
//! replacement is configured, the whole string becomes the replacement.

use improv_data::record::{self, Record, Value};
use improv_data::{EngineConfig, DEFAULT_CLOSE, DEFAULT_FALLBACK, DEFAULT_OPEN};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

use crate::error::{ImprovError, Result};

static DEFAULT_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(.*?)\}").unwrap());

/// Root every placeholder expression is written against.
const ROOT: &str = "this";

/// An ordered sequence of literal strings to render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub strings: Vec<String>,
}

impl Template {
    pub fn new(strings: Vec<String>) -> Self {
        Self { strings }
    }
}

impl From<Vec<String>> for Template {
    fn from(strings: Vec<String>) -> Self {
        Self::new(strings)
    }
}

impl From<&str> for Template {
    fn from(string: &str) -> Self {
        Self::new(vec![string.to_owned()])
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    pattern: Regex,
    fallback: String,
    replacement: Option<String>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PLACEHOLDER.clone(),
            fallback: DEFAULT_FALLBACK.to_owned(),
            replacement: None,
        }
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a renderer from the engine's fallback, replacement and delimiters.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let (open, close) = config.delimiters();
        let pattern = if (open, close) == (DEFAULT_OPEN, DEFAULT_CLOSE) {
            DEFAULT_PLACEHOLDER.clone()
        } else {
            placeholder_pattern(open, close)?
        };

        Ok(Self {
            pattern,
            fallback: config.fallback().to_owned(),
            replacement: config.replacement().map(str::to_owned),
        })
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }

    /// Render every string of `template`, preserving order and count.
    pub fn render(&self, template: &Template, data: &Record) -> Vec<String> {
        template
            .strings
            .iter()
            .map(|string| self.render_string(string, data))
            .collect()
    }

    pub fn render_string(&self, input: &str, data: &Record) -> String {
        let mut output = String::with_capacity(input.len());
        let mut cursor = 0;

        for captures in self.pattern.captures_iter(input) {
            let (Some(placeholder), Some(expression)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            output.push_str(&input[cursor..placeholder.start()]);
            cursor = placeholder.end();

            match resolve(expression.as_str().trim(), data) {
                Some(text) => output.push_str(&text),
                None => {
                    debug!(expression = expression.as_str().trim(), "unresolved placeholder");
                    if let Some(replacement) = &self.replacement {
                        return replacement.clone();
                    }
                    output.push_str(&self.fallback);
                }
            }
        }

        output.push_str(&input[cursor..]);
        output
    }
}

fn placeholder_pattern(open: &str, close: &str) -> Result<Regex> {
    if open.is_empty() || close.is_empty() {
        return Err(ImprovError::EmptyDelimiter {
            open: open.to_owned(),
            close: close.to_owned(),
        });
    }
    Ok(Regex::new(&format!(
        "{}(.*?){}",
        regex::escape(open),
        regex::escape(close)
    ))?)
}

/// Resolve `this` or `this.<path>` against `data`. Anything else is unresolved.
fn resolve(expression: &str, data: &Record) -> Option<String> {
    if expression == ROOT {
        return Some(Value::Object(data.clone()).to_string());
    }
    let path = expression.strip_prefix(ROOT)?.strip_prefix('.')?;
    record::get(data, path).map(display)
}

/// Text form of a resolved value. Whole floats drop their fraction and
/// sequences join their items with commas, null items left empty. Objects
/// render as JSON.
fn display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => match number.as_f64() {
            Some(float) if number.is_f64() => float.to_string(),
            _ => number.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        record::into_record(value).unwrap()
    }

    #[test]
    fn test_renders_path() {
        let data = record(json!({"site": "The Hub"}));
        let rendered = Renderer::new().render(&Template::from("welcome to ${ this.site }"), &data);
        assert_eq!(rendered, vec!["welcome to The Hub"]);
    }

    #[test]
    fn test_fallback_without_data() {
        let rendered = Renderer::new().render(
            &Template::from("hey ${this.user.name}, pay ${this.product.price}"),
            &Record::new(),
        );
        assert_eq!(rendered, vec!["hey unknown, pay unknown"]);
    }

    #[test]
    fn test_fallback_for_partial_data() {
        let data = record(json!({"product": {"price": "$55"}}));
        let rendered = Renderer::new().render(
            &Template::from("hey ${ this.user.name }, pay ${ this.product.price }"),
            &data,
        );
        assert_eq!(rendered, vec!["hey unknown, pay $55"]);
    }

    #[test]
    fn test_replacement_replaces_whole_string() {
        let data = record(json!({"product": {"price": "$55"}}));
        let rendered = Renderer::new().with_replacement("¯\\_(ツ)_/¯").render(
            &Template::from("hey ${this.user.name}, pay ${this.product.price}"),
            &data,
        );
        assert_eq!(rendered, vec!["¯\\_(ツ)_/¯"]);
    }

    #[test]
    fn test_replacement_only_affects_failing_strings() {
        let data = record(json!({"site": {"name": "The Hub"}}));
        let template = Template::new(vec![
            "plain".into(),
            "welcome to ${this.site.name}".into(),
            "hi ${this.user.name}".into(),
        ]);
        let rendered = Renderer::new().with_replacement("...").render(&template, &data);
        assert_eq!(rendered, vec!["plain", "welcome to The Hub", "..."]);
    }

    #[test]
    fn test_custom_fallback() {
        let rendered = Renderer::new()
            .with_fallback("friend")
            .render_string("hi ${this.user.name}", &Record::new());
        assert_eq!(rendered, "hi friend");
    }

    #[test]
    fn test_non_string_values() {
        let data = record(json!({
            "count": 3,
            "price": 55.0,
            "ratio": 1.5,
            "ok": true,
            "none": null,
            "tags": ["a", "b"],
            "mixed": [1, null, ["x", 2.0]],
            "site": {"name": "Hub"}
        }));
        let rendered = Renderer::new().render_string(
            "${this.count} ${this.price} ${this.ratio} ${this.ok} ${this.none} ${this.tags} ${this.tags.1}",
            &data,
        );
        assert_eq!(rendered, "3 55 1.5 true null a,b b");
        assert_eq!(Renderer::new().render_string("${this.mixed}", &data), "1,,x,2");
        assert_eq!(Renderer::new().render_string("${this.site}", &data), r#"{"name":"Hub"}"#);
    }

    #[test]
    fn test_malformed_expressions_are_unresolved() {
        let data = record(json!({"site": {"name": "Hub"}}));
        let renderer = Renderer::new();
        assert_eq!(renderer.render_string("${site.name}", &data), "unknown");
        assert_eq!(renderer.render_string("${this..site}", &data), "unknown");
        assert_eq!(renderer.render_string("${thissite}", &data), "unknown");
        assert_eq!(renderer.render_string("${}", &data), "unknown");
    }

    #[test]
    fn test_root_expression_renders_record() {
        let data = record(json!({"a": 1}));
        assert_eq!(Renderer::new().render_string("${this}", &data), r#"{"a":1}"#);
    }

    #[test]
    fn test_passthrough_and_count() {
        let template = Template::new(vec!["hello you".into(), String::new(), "$ { not }".into()]);
        let rendered = Renderer::new().render(&template, &Record::new());
        assert_eq!(rendered, template.strings);
    }

    #[test]
    fn test_from_config_delimiters() {
        let mut config = EngineConfig::default();
        config.merge(record(json!({"open": "{{", "close": "}}", "fallback": "?"})));
        let renderer = Renderer::from_config(&config).unwrap();

        let data = record(json!({"site": "The Hub"}));
        assert_eq!(
            renderer.render_string("{{ this.site }} ${this.site} {{this.nope}}", &data),
            "The Hub ${this.site} ?"
        );
    }

    #[test]
    fn test_from_config_rejects_empty_delimiter() {
        let mut config = EngineConfig::default();
        config.merge(record(json!({"open": ""})));
        assert!(matches!(
            Renderer::from_config(&config),
            Err(ImprovError::EmptyDelimiter { .. })
        ));
    }
}
