// Rule definitions - pure data plus user callables, no evaluation logic.
// Evaluation lives in the engines:
// - transformation.rs: TransformationRule and its resolved Operation (see transformer.rs)
// - validation.rs: ValidationRule (see validator.rs)

pub mod transformation;
pub mod validation;

pub use transformation::{
    Operation, OperationFlags, TransformExpression, TransformationRule, TransformationRuleBuilder,
};
pub use validation::{ValidationExpression, ValidationRule};
