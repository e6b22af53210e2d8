use crate::config::EngineConfig;
use crate::convert;
use crate::diagnostics::{DiagnosticsSink, TracingSink};
use crate::document::{self, Object};
use crate::error::{EngineError, Result};
use crate::parallel;
use crate::profiler::StepProfiler;
use crate::registry::RuleSetCollection;
use crate::rules::{Operation, TransformExpression, TransformationRule};
use crate::types::{As, MatchOn, RuleSetState, ValueSetMatch};
use crate::value_set::ValueSet;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Target name -> output objects in traversal order
pub type TransformOutput = BTreeMap<String, Vec<Object>>;

/// Builds new documents from a source document, one list per target of a rule set.
///
/// The transformer only borrows its rule sets and value sets, so any number
/// of transformers can share them across threads once setup is done.
pub struct Transformer<'a> {
    rule_sets: &'a RuleSetCollection<TransformationRule>,
    value_sets: Option<&'a ValueSet>,
    sink: &'a dyn DiagnosticsSink,
    config: EngineConfig,
}

impl<'a> Transformer<'a> {
    pub fn new(rule_sets: &'a RuleSetCollection<TransformationRule>) -> Self {
        Self {
            rule_sets,
            value_sets: None,
            sink: &TracingSink,
            config: EngineConfig::default(),
        }
    }

    pub fn with_value_sets(mut self, value_sets: &'a ValueSet) -> Self {
        self.value_sets = Some(value_sets);
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

    /// Check that the rule set is fully set up, logging an error for whatever is missing.
    ///
    /// The result is advisory only; `transform` runs regardless.
    pub fn can_run(&self, rule_set: &str) -> bool {
        let reason = match self.rule_sets.rule_set_state(rule_set) {
            RuleSetState::Initialised => return true,
            RuleSetState::Undeclared => "an unknown Rule Set",
            RuleSetState::NoTargetsDefined => "a Rule Set that has no targets for transformation rules",
            RuleSetState::TargetWithoutRulesDefined => {
                "a Rule Set that has a target without transformation rules"
            }
        };

        self.sink.error(
            &format!("The Transformation Process was called with {reason} '{rule_set}'"),
            None,
        );
        false
    }

    /// Apply every target of `rule_set` to `source`.
    ///
    /// An unknown rule set yields an empty output after the advisory error.
    /// Malformed rules fail the call with [`EngineError::InvalidRule`] or
    /// [`EngineError::MissingField`].
    pub fn transform<T: Serialize + ?Sized>(&self, source: &T, rule_set: &str) -> Result<TransformOutput> {
        let mut profiler = StepProfiler::new(self.config.log_timings, self.sink);
        self.sink.debug("Initialising Transformation Process");

        if self.can_run(rule_set) {
            self.sink.debug("Rule Set is valid for processing");
        }

        let document = profiler.time_step("Normalization", || document::normalize(source))?;

        let mut output = TransformOutput::new();
        if let Some(targets) = self.rule_sets.get(rule_set) {
            let targets: Vec<(&String, &Vec<TransformationRule>)> = targets.iter().collect();
            let workers = if self.config.parallel_targets {
                self.config.workers()
            } else {
                1
            };

            // Each target builds its own list; the lists are merged here in target order
            let results = profiler.time_step("Transformation Process", || {
                parallel::map_ordered(targets.as_slice(), workers, |&(target, rules)| {
                    self.transform_target(&document, rules)
                        .map(|objects| (target.clone(), objects))
                })
            });

            for result in results {
                let (target, objects) = result?;
                output.insert(target, objects);
            }
        }

        profiler.report_summary();
        self.sink.debug("Transformation Process Ended");
        Ok(output)
    }

    fn transform_target(&self, document: &Value, rules: &[TransformationRule]) -> Result<Vec<Object>> {
        let mut objects = Vec::new();
        self.walk(document, rules, &mut objects)?;
        Ok(objects)
    }

    fn walk(&self, node: &Value, rules: &[TransformationRule], objects: &mut Vec<Object>) -> Result<()> {
        match node {
            Value::Array(items) => {
                for item in items {
                    self.walk(item, rules, objects)?;
                }
            }
            Value::Object(source) => {
                let transformed = self.transform_object(node, source, rules)?;
                if !transformed.is_empty() {
                    objects.push(transformed);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn transform_object(&self, node: &Value, source: &Object, rules: &[TransformationRule]) -> Result<Object> {
        let mut transformed = Object::new();

        for rule in rules {
            if rule.target_field().trim().is_empty() {
                return Err(EngineError::InvalidRule(
                    "The Target Field for one of the rules is missing.".to_string(),
                ));
            }

            let value = self.evaluate(node, source, rule)?;
            if !value.is_null() {
                transformed.insert(rule.target_field().to_string(), value);
            }
        }

        Ok(transformed)
    }

    /// Run one rule against one object. `Value::Null` means "no value".
    fn evaluate(&self, node: &Value, source: &Object, rule: &TransformationRule) -> Result<Value> {
        let label = rule.source_field().unwrap_or_default();

        let value = match rule.operation() {
            Operation::AsIs => {
                let field = rule.source_field().ok_or_else(|| {
                    EngineError::MissingField(format!(
                        "The Source Field for Target Field, {}, is missing.",
                        rule.target_field()
                    ))
                })?;
                document::field(source, field)
                    .filter(|value| document::is_scalar(value))
                    .cloned()
                    .unwrap_or(Value::Null)
            }
            Operation::TypeConversion(as_type) => {
                let value = self.required_source(source, rule)?;
                self.coerce(*as_type, value, label)
            }
            Operation::Expression(expression) => self.evaluate_expression(node, source, rule, expression),
            Operation::ExpressionTypeConversion(expression, as_type) => {
                let value = self.evaluate_expression(node, source, rule, expression);
                self.coerce(*as_type, &value, label)
            }
            Operation::ValueConversion(lookup) => {
                let value = self.required_source(source, rule)?;
                self.lookup(value, lookup)
            }
            Operation::ValueTypeConversion(lookup, as_type) => {
                let value = self.required_source(source, rule)?;
                let value = self.lookup(value, lookup);
                self.coerce(*as_type, &value, label)
            }
            Operation::ValueExpression(expression, lookup) => {
                let value = self.evaluate_expression(node, source, rule, expression);
                self.lookup(&value, lookup)
            }
            Operation::ValueExpressionTypeConversion(expression, lookup, as_type) => {
                let value = self.evaluate_expression(node, source, rule, expression);
                let value = self.lookup(&value, lookup);
                self.coerce(*as_type, &value, label)
            }
        };

        Ok(value)
    }

    fn required_source<'s>(&self, source: &'s Object, rule: &TransformationRule) -> Result<&'s Value> {
        let field = rule.source_field().ok_or_else(|| {
            EngineError::InvalidRule(format!(
                "The Source Field for the target value {} is missing.",
                rule.target_field()
            ))
        })?;
        Ok(document::field_or_null(source, field))
    }

    /// The expression sees the field value (null when missing), or the whole
    /// object when the rule names no source field.
    fn evaluate_expression(
        &self,
        node: &Value,
        source: &Object,
        rule: &TransformationRule,
        expression: &TransformExpression,
    ) -> Value {
        let input = match rule.source_field() {
            Some(field) => document::field_or_null(source, field),
            None => node,
        };
        expression(input, self.sink)
    }

    fn coerce(&self, as_type: As, value: &Value, label: &str) -> Value {
        convert::convert(as_type, value, label, self.sink).unwrap_or(Value::Null)
    }

    fn lookup(&self, value: &Value, lookup: &ValueSetMatch) -> Value {
        let Some(value_sets) = self.value_sets else {
            self.sink.warning(
                &format!(
                    "No Value Sets have been configured for the lookup against '{}'",
                    lookup.set_name
                ),
                None,
            );
            return Value::Null;
        };

        if !value_sets.contains(&lookup.set_name) {
            let err = EngineError::UnknownValueSet(lookup.set_name.clone());
            self.sink.warning(&err.to_string(), None);
            return Value::Null;
        }

        let Some(probe) = document::text_of(value) else {
            return Value::Null;
        };

        match value_sets.lookup(&lookup.set_name, &probe, lookup.match_on, lookup.case_sensitive) {
            Some(entry) => match lookup.match_on {
                MatchOn::Label => Value::String(entry.value.clone()),
                MatchOn::Value => Value::String(entry.label.clone()),
            },
            None => Value::Null,
        }
    }
}
