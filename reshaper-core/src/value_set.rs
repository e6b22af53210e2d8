use crate::error::{EngineError, Result};
use crate::types::MatchOn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSetEntry {
    pub label: String,
    pub value: String,
}

impl ValueSetEntry {
    fn column(&self, match_on: MatchOn) -> &str {
        match match_on {
            MatchOn::Label => &self.label,
            MatchOn::Value => &self.value,
        }
    }
}

/// Named lookup tables of label/value rows.
///
/// Rows are kept in insertion order and duplicates are allowed, so the first
/// matching row always wins.
#[derive(Debug, Clone, Default)]
pub struct ValueSet {
    sets: HashMap<String, Vec<ValueSetEntry>>,
}

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row, creating the table on first use.
    pub fn add_entry(
        &mut self,
        set_name: &str,
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.sets
            .entry(set_name.to_string())
            .or_default()
            .push(ValueSetEntry {
                label: label.into(),
                value: value.into(),
            });
        self
    }

    pub fn get_table(&self, set_name: &str) -> Result<&[ValueSetEntry]> {
        self.sets
            .get(set_name)
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::UnknownValueSet(set_name.to_string()))
    }

    /// First row whose `match_on` column equals `probe`.
    ///
    /// No match, including an unknown table, is a normal outcome and yields `None`.
    pub fn lookup(
        &self,
        set_name: &str,
        probe: &str,
        match_on: MatchOn,
        case_sensitive: bool,
    ) -> Option<&ValueSetEntry> {
        let table = self.sets.get(set_name)?;

        if case_sensitive {
            return table.iter().find(|entry| entry.column(match_on) == probe);
        }

        table
            .iter()
            .find(|entry| eq_ignore_case(entry.column(match_on), probe))
    }

    pub fn contains(&self, set_name: &str) -> bool {
        self.sets.contains_key(set_name)
    }

    pub fn set_names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }
}

/// Case-insensitive comparison without building lowercased copies.
fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
