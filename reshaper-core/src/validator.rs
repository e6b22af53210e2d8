use crate::config::EngineConfig;
use crate::diagnostics::{DiagnosticsSink, TracingSink};
use crate::document::{self, Object};
use crate::error::{EngineError, Result};
use crate::parallel;
use crate::profiler::StepProfiler;
use crate::registry::RuleSetCollection;
use crate::rules::ValidationRule;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Patterns compiled once per call, keyed by the raw pattern text
type CompiledPatterns<'r> = HashMap<&'r str, std::result::Result<Regex, regex::Error>>;

/// Checks documents against every rule of every target of a rule set.
///
/// Diagnostics for each failing check go to the sink; the verdict is the AND
/// of all checks over all objects in the document.
pub struct Validator<'a> {
    rule_sets: Option<&'a RuleSetCollection<ValidationRule>>,
    sink: &'a dyn DiagnosticsSink,
    config: EngineConfig,
}

impl<'a> Validator<'a> {
    pub fn new() -> Self {
        Self {
            rule_sets: None,
            sink: &TracingSink,
            config: EngineConfig::default(),
        }
    }

    pub fn with_rule_sets(mut self, rule_sets: &'a RuleSetCollection<ValidationRule>) -> Self {
        self.rule_sets = Some(rule_sets);
        self
    }

    pub fn with_sink(mut self, sink: &'a dyn DiagnosticsSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate `source` against `rule_set`.
    ///
    /// Fails before any rule runs when no rule sets were supplied, when the
    /// source is null or when the rule set name is empty. A rule set name that
    /// was never initialised passes with no rules applied.
    pub fn validate<T: Serialize + ?Sized>(&self, source: &T, rule_set: &str) -> Result<bool> {
        let rule_sets = self.rule_sets.ok_or(EngineError::NoRuleSets)?;

        let mut profiler = StepProfiler::new(self.config.log_timings, self.sink);
        let tree = profiler.time_step("Normalization", || document::normalize(source))?;
        if tree.is_null() {
            return Err(EngineError::NullSource);
        }

        if rule_set.is_empty() {
            return Err(EngineError::MissingRuleSetName);
        }

        self.sink.debug("Initialising Validation Process");

        let rules: Vec<&ValidationRule> = rule_sets
            .get(rule_set)
            .map(|targets| targets.values().flatten().collect())
            .unwrap_or_default();

        if rules.is_empty() {
            self.sink.trace(&format!("No validation rules found for Rule Set '{rule_set}'"));
        }

        let patterns = compile_patterns(&rules);
        let is_valid = profiler.time_step("Validation Process", || self.validate_root(&tree, &rules, &patterns));

        profiler.report_summary();
        self.sink.debug("Validation Process Ended");
        Ok(is_valid)
    }

    /// Top level arrays may be split across workers; nested arrays are walked in place.
    fn validate_root(&self, tree: &Value, rules: &[&ValidationRule], patterns: &CompiledPatterns<'_>) -> bool {
        match tree {
            Value::Array(items)
                if self.config.parallel_elements && items.len() >= self.config.min_parallel_elements =>
            {
                parallel::map_ordered(items.as_slice(), self.config.workers(), |item| {
                    self.validate_node(item, rules, patterns)
                })
                .into_iter()
                .fold(true, |all, valid| all & valid)
            }
            _ => self.validate_node(tree, rules, patterns),
        }
    }

    fn validate_node(&self, node: &Value, rules: &[&ValidationRule], patterns: &CompiledPatterns<'_>) -> bool {
        match node {
            // Every element is checked so each failure gets its own diagnostics
            Value::Array(items) => items
                .iter()
                .fold(true, |all, item| self.validate_node(item, rules, patterns) & all),
            Value::Object(object) => self.validate_object(node, object, rules, patterns),
            _ => true,
        }
    }

    fn validate_object(
        &self,
        node: &Value,
        object: &Object,
        rules: &[&ValidationRule],
        patterns: &CompiledPatterns<'_>,
    ) -> bool {
        let mut is_valid = true;

        for rule in rules {
            let field = rule.field();
            let value = field.and_then(|name| document::field(object, name));

            if let Some(name) = field {
                if rule.is_required() && value.is_none() {
                    self.sink.error(
                        &format!("The {name} field is required but an object was passed with the field missing"),
                        None,
                    );
                    is_valid = false;
                }

                if let (Some(pattern), Some(value)) = (rule.pattern(), value) {
                    is_valid &= self.check_pattern(name, pattern, value, patterns);
                }
            }

            if let Some(expression) = rule.expression() {
                match (field, value) {
                    (Some(name), Some(value)) => {
                        if !expression(value, self.sink) {
                            self.sink.error(
                                &format!("The {name} field has failed the evaluation of the validation rule."),
                                None,
                            );
                            is_valid = false;
                        }
                    }
                    (Some(_), None) => {}
                    (None, _) => {
                        if !expression(node, self.sink) {
                            self.sink
                                .error("An evaluation expression has failed to validate the input.", None);
                            is_valid = false;
                        }
                    }
                }
            }
        }

        is_valid
    }

    fn check_pattern(&self, field: &str, pattern: &str, value: &Value, patterns: &CompiledPatterns<'_>) -> bool {
        let text = document::text_of(value).unwrap_or_default();

        match patterns.get(pattern) {
            Some(Ok(regex)) => {
                if regex.is_match(&text) {
                    return true;
                }
                self.sink.error(
                    &format!(
                        "The {field} field is expected to match the pattern {pattern} but the field value '{text}' fails the test"
                    ),
                    None,
                );
                false
            }
            Some(Err(err)) => {
                self.sink.error(
                    &format!("The {field} field has an invalid validation pattern {pattern}"),
                    Some(err),
                );
                false
            }
            None => false,
        }
    }
}

impl Default for Validator<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_patterns<'r>(rules: &[&'r ValidationRule]) -> CompiledPatterns<'r> {
    let mut patterns = CompiledPatterns::new();
    for pattern in rules.iter().copied().filter_map(ValidationRule::pattern) {
        patterns
            .entry(pattern)
            .or_insert_with(|| Regex::new(&format!(r"\b{pattern}\b")));
    }
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{LogLevel, MemorySink};
    use serde_json::json;

    fn rule_set(rules: Vec<ValidationRule>) -> RuleSetCollection<ValidationRule> {
        let mut rule_sets = RuleSetCollection::new();
        rule_sets.initialise_rule_set("test").unwrap();
        rule_sets.add_target("test", "unittest", rules).unwrap();
        rule_sets
    }

    #[test]
    fn test_required_field() {
        let rule_sets = rule_set(vec![ValidationRule::for_field("X").required()]);
        let sink = MemorySink::new();
        let validator = Validator::new().with_rule_sets(&rule_sets).with_sink(&sink);

        assert!(!validator.validate(&json!({}), "test").unwrap());
        let errors = sink.messages_at(LogLevel::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("X"));

        sink.clear();
        assert!(validator.validate(&json!({"X": 1}), "test").unwrap());
        assert_eq!(sink.count(LogLevel::Error), 0);
    }

    #[test]
    fn test_explicit_null_counts_as_present() {
        let rule_sets = rule_set(vec![ValidationRule::for_field("X").required()]);
        let validator = Validator::new().with_rule_sets(&rule_sets).with_sink(&crate::diagnostics::NullSink);
        assert!(validator.validate(&json!({"X": null}), "test").unwrap());
    }

    #[test]
    fn test_preconditions() {
        let sink = MemorySink::new();
        let err = Validator::new().with_sink(&sink).validate(&json!({}), "test").unwrap_err();
        assert!(matches!(err, EngineError::NoRuleSets));

        let rule_sets = rule_set(vec![ValidationRule::for_field("X").required()]);
        let validator = Validator::new().with_rule_sets(&rule_sets).with_sink(&sink);

        let err = validator.validate(&Value::Null, "test").unwrap_err();
        assert!(matches!(err, EngineError::NullSource));

        let none: Option<i32> = None;
        assert!(matches!(validator.validate(&none, "test").unwrap_err(), EngineError::NullSource));

        let err = validator.validate(&json!({}), "").unwrap_err();
        assert!(matches!(err, EngineError::MissingRuleSetName));
        assert_eq!(sink.count(LogLevel::Error), 0);
    }

    #[test]
    fn test_whitespace_rule_set_name_passes_when_undeclared() {
        let rule_sets = rule_set(vec![ValidationRule::for_field("X").required()]);
        let validator = Validator::new().with_rule_sets(&rule_sets).with_sink(&crate::diagnostics::NullSink);
        assert!(validator.validate(&json!({}), " ").unwrap());
    }

    #[test]
    fn test_unknown_rule_set_is_vacuous_pass() {
        let rule_sets = rule_set(vec![ValidationRule::for_field("X").required()]);
        let sink = MemorySink::new();
        let validator = Validator::new().with_rule_sets(&rule_sets).with_sink(&sink);
        assert!(validator.validate(&json!({}), "ghost").unwrap());
        assert_eq!(sink.count(LogLevel::Error), 0);
    }

    #[test]
    fn test_invalid_pattern_fails_with_error() {
        let rule_sets = rule_set(vec![ValidationRule::for_field("X").with_pattern("([a-z")]);
        let sink = MemorySink::new();
        let validator = Validator::new().with_rule_sets(&rule_sets).with_sink(&sink);

        assert!(!validator.validate(&json!({"X": "abc"}), "test").unwrap());
        let entries = sink.entries();
        assert_eq!(entries.len(), 3);
        let errors: Vec<_> = entries.iter().filter(|e| e.level == LogLevel::Error).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].error.is_some());
    }

    #[test]
    fn test_pattern_is_word_bounded() {
        let rule_sets = rule_set(vec![ValidationRule::for_field("Code").with_pattern("[A-Z]{3}")]);
        let sink = MemorySink::new();
        let validator = Validator::new()
            .with_rule_sets(&rule_sets)
            .with_sink(&sink)
            .with_config(EngineConfig::sequential());

        assert!(validator.validate(&json!({"Code": "ABC"}), "test").unwrap());
        assert!(!validator.validate(&json!({"Code": "ABCD"}), "test").unwrap());
        assert_eq!(
            sink.messages_at(LogLevel::Error),
            vec!["The Code field is expected to match the pattern [A-Z]{3} but the field value 'ABCD' fails the test"]
        );
    }

    #[test]
    fn test_compile_patterns_once_per_distinct_pattern() {
        let a = ValidationRule::for_field("a").with_pattern("x+");
        let b = ValidationRule::for_field("b").with_pattern("x+");
        let c = ValidationRule::for_field("c").with_pattern("y+");
        let patterns = compile_patterns(&[&a, &b, &c]);
        assert_eq!(patterns.len(), 2);
        assert!(patterns.values().all(|compiled| compiled.is_ok()));
    }
}
