use serde::{Deserialize, Serialize};

// ===== RULE SET TYPES =====
// A rule set's readiness is never stored. It is derived from the registry
// contents every time it is asked for.

/// Readiness of a rule set, ordered from least to most ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleSetState {
    /// The name has never been initialised
    Undeclared,
    /// The name is known but has no targets
    NoTargetsDefined,
    /// At least one target has an empty rule list
    TargetWithoutRulesDefined,
    /// Every target carries at least one rule
    Initialised,
}

impl RuleSetState {
    pub fn is_initialised(self) -> bool {
        self == RuleSetState::Initialised
    }
}

// ===== TRANSFORMATION TYPES =====

/// Representation a transformed value is coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum As {
    #[default]
    Unchanged,
    String,
    WholeNumber,
    Double,
    IsoDate,
    IsoUtcDate,
    SerializeJson,
}

/// Column of a value set a probe is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOn {
    Label,
    Value,
}

/// Value-set substitution settings for a transformation rule.
///
/// Matching on `Label` substitutes the row's value, matching on `Value`
/// substitutes the row's label. Case sensitivity has no default and must
/// always be given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSetMatch {
    pub set_name: String,
    pub match_on: MatchOn,
    pub case_sensitive: bool,
}

impl ValueSetMatch {
    pub fn new(set_name: impl Into<String>, match_on: MatchOn, case_sensitive: bool) -> Self {
        Self {
            set_name: set_name.into(),
            match_on,
            case_sensitive,
        }
    }
}
