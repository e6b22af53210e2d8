// Reshaper Core Library
//
// Declarative transformation and validation of JSON-like documents.
// Callers register named rule sets (and optional value-set lookup tables)
// once, then feed documents through a Transformer or a Validator.

pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod profiler;
pub mod registry;
pub mod rules;
pub mod transformer;
pub mod types;
pub mod validator;
pub mod value_set;

mod parallel;

// Re-export main types and functions for easy use
pub use config::EngineConfig;
pub use diagnostics::{DiagnosticsSink, LogEntry, LogLevel, MemorySink, NullSink, TracingSink};
pub use document::Object;
pub use error::{EngineError, Result};
pub use registry::{RuleSetCollection, Targets};
pub use rules::{Operation, OperationFlags, TransformationRule, ValidationRule};
pub use transformer::{TransformOutput, Transformer};
pub use types::*;
pub use validator::Validator;
pub use value_set::{ValueSet, ValueSetEntry};
