use thiserror::Error;

/// Hard failures surfaced to the caller.
///
/// Coercion problems are not errors: they are logged through the
/// diagnostics sink and the affected field is left out of the output.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("The Rule Set '{0}' has not been initialised")]
    UnknownRuleSet(String),

    #[error("A reference to the Value Set collection with name '{0}' is not defined")]
    UnknownValueSet(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("No Rule Sets have been configured against which to perform validation")]
    NoRuleSets,

    #[error("The validation cannot be performed on null objects")]
    NullSource,

    #[error("A Ruleset needs to be defined against which validation rules are to be checked")]
    MissingRuleSetName,

    #[error("The source could not be converted into a document: {0}")]
    Normalization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
