use crate::error::{EngineError, Result};
use crate::types::RuleSetState;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Index;

/// Target name -> ordered rules for that target
pub type Targets<R> = BTreeMap<String, Vec<R>>;

/// Named rule sets, each holding one ordered rule list per output target.
///
/// Rule sets are set up once and read by every evaluation call. There is no
/// removal API. Mutation needs `&mut self`, so setup has to finish before the
/// collection is shared with concurrent evaluations.
pub struct RuleSetCollection<R> {
    collection: HashMap<String, Targets<R>>,
}

impl<R> RuleSetCollection<R> {
    pub fn new() -> Self {
        Self {
            collection: HashMap::new(),
        }
    }

    /// Declare a rule set with no targets. Safe to call repeatedly.
    pub fn initialise_rule_set(&mut self, name: &str) -> Result<&mut Self> {
        self.initialise_rule_set_with_targets(name, std::iter::empty::<String>())
    }

    /// Declare a rule set and give each named target an empty rule list.
    ///
    /// An existing rule set is left in place. A target name that already
    /// exists is replaced by an empty list (last write wins per key).
    pub fn initialise_rule_set_with_targets<I, S>(&mut self, name: &str, targets: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if name.is_empty() {
            return Err(EngineError::InvalidArgument(
                "Rule Set name cannot be null or empty".to_string(),
            ));
        }

        let rule_set = self.collection.entry(name.to_string()).or_default();
        for target in targets {
            rule_set.insert(target.into(), Vec::new());
        }

        Ok(self)
    }

    /// Append rules to a target, creating the target when it does not exist yet.
    pub fn add_target(
        &mut self,
        name: &str,
        target: impl Into<String>,
        rules: impl IntoIterator<Item = R>,
    ) -> Result<&mut Self> {
        let rule_set = self
            .collection
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownRuleSet(name.to_string()))?;
        rule_set.entry(target.into()).or_default().extend(rules);
        Ok(self)
    }

    pub fn add_rule(&mut self, name: &str, target: impl Into<String>, rule: R) -> Result<&mut Self> {
        self.add_target(name, target, std::iter::once(rule))
    }

    pub fn rule_set_state(&self, name: &str) -> RuleSetState {
        let Some(targets) = self.collection.get(name) else {
            return RuleSetState::Undeclared;
        };

        if targets.is_empty() {
            return RuleSetState::NoTargetsDefined;
        }

        if targets.values().any(Vec::is_empty) {
            return RuleSetState::TargetWithoutRulesDefined;
        }

        RuleSetState::Initialised
    }

    pub fn get(&self, name: &str) -> Option<&Targets<R>> {
        self.collection.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Targets<R>> {
        self.collection.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collection.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collection.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }
}

impl<R> Default for RuleSetCollection<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Clone> Clone for RuleSetCollection<R> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for RuleSetCollection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSetCollection")
            .field("collection", &self.collection)
            .finish()
    }
}

/// Panics when the rule set was never initialised; check the state first.
impl<R> Index<&str> for RuleSetCollection<R> {
    type Output = Targets<R>;

    fn index(&self, name: &str) -> &Self::Output {
        match self.collection.get(name) {
            Some(targets) => targets,
            None => panic!("Rule Set '{name}' has not been initialised"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_progression() {
        let mut rule_sets: RuleSetCollection<&str> = RuleSetCollection::new();
        assert_eq!(rule_sets.rule_set_state("orders"), RuleSetState::Undeclared);

        rule_sets.initialise_rule_set("orders").unwrap();
        assert_eq!(rule_sets.rule_set_state("orders"), RuleSetState::NoTargetsDefined);

        rule_sets
            .initialise_rule_set_with_targets("orders", ["summary", "lines"])
            .unwrap();
        assert_eq!(
            rule_sets.rule_set_state("orders"),
            RuleSetState::TargetWithoutRulesDefined
        );

        rule_sets.add_rule("orders", "summary", "copy id").unwrap();
        assert_eq!(
            rule_sets.rule_set_state("orders"),
            RuleSetState::TargetWithoutRulesDefined
        );

        rule_sets.add_rule("orders", "lines", "copy sku").unwrap();
        assert_eq!(rule_sets.rule_set_state("orders"), RuleSetState::Initialised);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut rule_sets: RuleSetCollection<&str> = RuleSetCollection::new();
        let err = rule_sets.initialise_rule_set("").unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
        assert!(rule_sets.is_empty());
    }

    #[test]
    fn test_whitespace_name_is_a_valid_name() {
        let mut rule_sets: RuleSetCollection<&str> = RuleSetCollection::new();
        rule_sets.initialise_rule_set(" ").unwrap();
        assert!(rule_sets.contains(" "));
        assert_eq!(rule_sets.rule_set_state(" "), RuleSetState::NoTargetsDefined);
    }

    #[test]
    fn test_initialise_is_idempotent_and_additive() {
        let mut rule_sets: RuleSetCollection<&str> = RuleSetCollection::new();
        rule_sets
            .initialise_rule_set_with_targets("people", ["a"])
            .unwrap();
        rule_sets.add_rule("people", "a", "rule").unwrap();

        rule_sets.initialise_rule_set("people").unwrap();
        rule_sets
            .initialise_rule_set_with_targets("people", ["b"])
            .unwrap();

        let targets = &rule_sets["people"];
        assert_eq!(targets.len(), 2);
        assert_eq!(targets["a"], vec!["rule"]);
        assert!(targets["b"].is_empty());
    }

    #[test]
    fn test_reinitialising_a_target_replaces_its_rules() {
        let mut rule_sets: RuleSetCollection<&str> = RuleSetCollection::new();
        rule_sets
            .initialise_rule_set_with_targets("people", ["a"])
            .unwrap();
        rule_sets.add_rule("people", "a", "rule").unwrap();
        rule_sets
            .initialise_rule_set_with_targets("people", ["a"])
            .unwrap();

        assert!(rule_sets["people"]["a"].is_empty());
    }

    #[test]
    fn test_add_target_requires_declared_rule_set() {
        let mut rule_sets: RuleSetCollection<&str> = RuleSetCollection::new();
        let err = rule_sets.add_target("ghost", "t", ["r"]).unwrap_err();
        assert!(matches!(err, EngineError::UnknownRuleSet(name) if name == "ghost"));
    }

    #[test]
    fn test_add_target_appends() {
        let mut rule_sets: RuleSetCollection<&str> = RuleSetCollection::new();
        rule_sets.initialise_rule_set("people").unwrap();
        rule_sets.add_target("people", "t", ["one"]).unwrap();
        rule_sets.add_target("people", "t", ["two", "three"]).unwrap();
        assert_eq!(rule_sets["people"]["t"], vec!["one", "two", "three"]);
    }

    #[test]
    #[should_panic(expected = "has not been initialised")]
    fn test_index_panics_for_unknown_rule_set() {
        let rule_sets: RuleSetCollection<&str> = RuleSetCollection::new();
        let _ = &rule_sets["missing"];
    }
}
