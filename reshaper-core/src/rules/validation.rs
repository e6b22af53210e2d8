use crate::diagnostics::DiagnosticsSink;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// User predicate over a field value or a whole object.
pub type ValidationExpression = Arc<dyn Fn(&Value, &dyn DiagnosticsSink) -> bool + Send + Sync>;

/// A set of independent checks against one field, or against the whole object
/// when no field is named.
#[derive(Clone, Default)]
pub struct ValidationRule {
    field: Option<String>,
    is_required: bool,
    pattern: Option<String>,
    expression: Option<ValidationExpression>,
}

impl ValidationRule {
    pub fn for_field(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::default()
        }
    }

    /// Rule whose expression receives the whole current object.
    pub fn for_object() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Regex the field's string form must match, anchored on word boundaries.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_expression<F>(mut self, expression: F) -> Self
    where
        F: Fn(&Value, &dyn DiagnosticsSink) -> bool + Send + Sync + 'static,
    {
        self.expression = Some(Arc::new(expression));
        self
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref().filter(|name| !name.trim().is_empty())
    }

    pub fn is_required(&self) -> bool {
        self.is_required
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref().filter(|p| !p.trim().is_empty())
    }

    pub fn expression(&self) -> Option<&ValidationExpression> {
        self.expression.as_ref()
    }
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRule")
            .field("field", &self.field)
            .field("is_required", &self.is_required)
            .field("pattern", &self.pattern)
            .field("has_expression", &self.expression.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let rule = ValidationRule::for_field("Email")
            .required()
            .with_pattern("[a-z]+@[a-z]+")
            .with_expression(|value, _| value.is_string());

        assert_eq!(rule.field(), Some("Email"));
        assert!(rule.is_required());
        assert_eq!(rule.pattern(), Some("[a-z]+@[a-z]+"));
        assert!(rule.expression().is_some());
    }

    #[test]
    fn test_object_rule_has_no_field() {
        let rule = ValidationRule::for_object().with_expression(|value, _| value.is_object());
        assert_eq!(rule.field(), None);
        assert!(!rule.is_required());
        assert_eq!(rule.pattern(), None);
    }

    #[test]
    fn test_blank_pattern_is_ignored() {
        let rule = ValidationRule::for_field("x").with_pattern("");
        assert_eq!(rule.pattern(), None);
    }
}
