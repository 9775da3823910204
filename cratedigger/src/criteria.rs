// SPDX-FileCopyrightText: The cratedigger authors
// SPDX-License-Identifier: MPL-2.0

use serde::{Deserialize, Serialize};

use crate::{Field, Rule};

/// Boolean combinator over the rule sequence.
///
/// Serialized as the literal strings `"AND"` and `"OR"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Match {
    #[default]
    #[serde(rename = "AND")]
    All,
    #[serde(rename = "OR")]
    Any,
}

/// Ordered rule sequence under a single combinator.
///
/// An empty rule sequence is a valid transient state while editing. It
/// previews as "matches nothing" but is rejected by the save
/// preconditions, see [`CrateDraft::validate`](crate::CrateDraft::validate).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    pub logic: Match,
    pub rules: Vec<Rule>,
}

impl Criteria {
    #[must_use]
    pub const fn new(logic: Match) -> Self {
        Self {
            logic,
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Appends a rule on the first field with its default operator and value.
    pub fn add_rule(&mut self) {
        self.rules.push(Rule::new(Field::ALL[0]));
    }

    /// Replaces the rule at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn update_rule(&mut self, index: usize, rule: Rule) {
        self.rules[index] = rule;
    }

    /// Removes and returns the rule at `index`.
    ///
    /// The combinator is kept even if the sequence becomes empty.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn remove_rule(&mut self, index: usize) -> Rule {
        self.rules.remove(index)
    }

    /// Serializes into the backend's opaque criteria payload.
    pub fn to_payload(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Deserializes from the backend's opaque criteria payload.
    ///
    /// Lossless: `from_payload(c.to_payload()?)? == c` for every reachable
    /// criteria value.
    pub fn from_payload(payload: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(payload)
    }
}
