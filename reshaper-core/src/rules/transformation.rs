use crate::diagnostics::DiagnosticsSink;
use crate::types::{As, ValueSetMatch};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// User callable producing a working value from a field value or a whole object.
/// Returning `Value::Null` means "no value".
pub type TransformExpression = Arc<dyn Fn(&Value, &dyn DiagnosticsSink) -> Value + Send + Sync>;

/// Flag view of an [`Operation`]. All flags clear means as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperationFlags {
    pub type_conversion: bool,
    pub expression: bool,
    pub value_conversion: bool,
}

impl OperationFlags {
    pub fn is_as_is(&self) -> bool {
        !(self.type_conversion || self.expression || self.value_conversion)
    }
}

/// What a rule does, resolved once when the rule is built.
///
/// Evaluation order is always expression, then value-set lookup, then type
/// coercion, skipping whichever steps are absent.
#[derive(Clone)]
pub enum Operation {
    AsIs,
    TypeConversion(As),
    Expression(TransformExpression),
    ExpressionTypeConversion(TransformExpression, As),
    ValueConversion(ValueSetMatch),
    ValueTypeConversion(ValueSetMatch, As),
    ValueExpression(TransformExpression, ValueSetMatch),
    ValueExpressionTypeConversion(TransformExpression, ValueSetMatch, As),
}

impl Operation {
    fn resolve(as_type: As, expression: Option<TransformExpression>, value_set: Option<ValueSetMatch>) -> Self {
        let coerce = as_type != As::Unchanged;
        match (expression, value_set) {
            (None, None) if coerce => Operation::TypeConversion(as_type),
            (None, None) => Operation::AsIs,
            (Some(e), None) if coerce => Operation::ExpressionTypeConversion(e, as_type),
            (Some(e), None) => Operation::Expression(e),
            (None, Some(m)) if coerce => Operation::ValueTypeConversion(m, as_type),
            (None, Some(m)) => Operation::ValueConversion(m),
            (Some(e), Some(m)) if coerce => Operation::ValueExpressionTypeConversion(e, m, as_type),
            (Some(e), Some(m)) => Operation::ValueExpression(e, m),
        }
    }

    pub fn flags(&self) -> OperationFlags {
        let (type_conversion, expression, value_conversion) = match self {
            Operation::AsIs => (false, false, false),
            Operation::TypeConversion(_) => (true, false, false),
            Operation::Expression(_) => (false, true, false),
            Operation::ExpressionTypeConversion(..) => (true, true, false),
            Operation::ValueConversion(_) => (false, false, true),
            Operation::ValueTypeConversion(..) => (true, false, true),
            Operation::ValueExpression(..) => (false, true, true),
            Operation::ValueExpressionTypeConversion(..) => (true, true, true),
        };
        OperationFlags {
            type_conversion,
            expression,
            value_conversion,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::AsIs => "AsIs",
            Operation::TypeConversion(_) => "TypeConversion",
            Operation::Expression(_) => "Expression",
            Operation::ExpressionTypeConversion(..) => "Expression|TypeConversion",
            Operation::ValueConversion(_) => "ValueConversion",
            Operation::ValueTypeConversion(..) => "ValueConversion|TypeConversion",
            Operation::ValueExpression(..) => "ValueConversion|Expression",
            Operation::ValueExpressionTypeConversion(..) => "ValueConversion|Expression|TypeConversion",
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Produces one field of an output object.
#[derive(Clone)]
pub struct TransformationRule {
    source_field: Option<String>,
    target_field: String,
    as_type: As,
    value_set_match: Option<ValueSetMatch>,
    operation: Operation,
}

impl TransformationRule {
    /// Plain copy of `source_field` into `target_field`.
    pub fn new(source_field: impl Into<String>, target_field: impl Into<String>) -> Self {
        Self::builder(target_field).source_field(source_field).build()
    }

    pub fn builder(target_field: impl Into<String>) -> TransformationRuleBuilder {
        TransformationRuleBuilder {
            source_field: None,
            target_field: target_field.into(),
            as_type: As::Unchanged,
            expression: None,
            value_set_match: None,
        }
    }

    /// Blank names count as absent.
    pub fn source_field(&self) -> Option<&str> {
        self.source_field
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    pub fn target_field(&self) -> &str {
        &self.target_field
    }

    pub fn as_type(&self) -> As {
        self.as_type
    }

    pub fn value_set_match(&self) -> Option<&ValueSetMatch> {
        self.value_set_match.as_ref()
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }
}

impl fmt::Debug for TransformationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformationRule")
            .field("source_field", &self.source_field)
            .field("target_field", &self.target_field)
            .field("as_type", &self.as_type)
            .field("value_set_match", &self.value_set_match)
            .field("operation", &self.operation)
            .finish()
    }
}

pub struct TransformationRuleBuilder {
    source_field: Option<String>,
    target_field: String,
    as_type: As,
    expression: Option<TransformExpression>,
    value_set_match: Option<ValueSetMatch>,
}

impl TransformationRuleBuilder {
    pub fn source_field(mut self, source_field: impl Into<String>) -> Self {
        self.source_field = Some(source_field.into());
        self
    }

    pub fn as_type(mut self, as_type: As) -> Self {
        self.as_type = as_type;
        self
    }

    pub fn expression<F>(mut self, expression: F) -> Self
    where
        F: Fn(&Value, &dyn DiagnosticsSink) -> Value + Send + Sync + 'static,
    {
        self.expression = Some(Arc::new(expression));
        self
    }

    pub fn value_set(mut self, value_set_match: ValueSetMatch) -> Self {
        self.value_set_match = Some(value_set_match);
        self
    }

    pub fn build(self) -> TransformationRule {
        let operation = Operation::resolve(self.as_type, self.expression, self.value_set_match.clone());
        TransformationRule {
            source_field: self.source_field,
            target_field: self.target_field,
            as_type: self.as_type,
            value_set_match: self.value_set_match,
            operation,
        }
    }
}
