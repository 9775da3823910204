// SPDX-FileCopyrightText: The cratedigger authors
// SPDX-License-Identifier: MPL-2.0

use serde::{Deserialize, Serialize};

use crate::{Criteria, ValidationError};

/// Crate kind marker sent on create and update.
pub const CRATE_KIND_SMART: &str = "smart";

/// Backend-assigned crate identifier.
///
/// A draft has no identifier until its first save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrateId(String);

impl CrateId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Checks that the backend actually assigned an identifier.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CrateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A crate as stored by the backend.
///
/// The client never holds an authoritative copy. After each mutating call
/// the cached list is reloaded, see [`CrateStore`](crate::CrateStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crate {
    pub id: CrateId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_smart: bool,
    pub color: String,
    pub icon: String,
    pub criteria: Criteria,
    /// Derived by the backend, never written by the client.
    #[serde(default)]
    pub track_count: u64,
}

/// Unsaved draft, owned exclusively by the builder session until save or
/// cancel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrateDraft {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub criteria: Criteria,
}

impl CrateDraft {
    /// Pre-seeds a draft from a persisted crate for further edits.
    #[must_use]
    pub fn from_crate(persisted: &Crate) -> Self {
        let Crate {
            id: _,
            name,
            description,
            kind: _,
            is_smart: _,
            color,
            icon,
            criteria,
            track_count: _,
        } = persisted;
        Self {
            name: name.clone(),
            description: description.clone(),
            color: color.clone(),
            icon: icon.clone(),
            criteria: criteria.clone(),
        }
    }

    /// Checks the save preconditions: a non-empty trimmed name and at
    /// least one rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.criteria.is_empty() {
            return Err(ValidationError::NoRules);
        }
        Ok(())
    }
}

/// Track summary row of a crate's track listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub id: i64,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub bpm: Option<f64>,
    pub key: Option<String>,
    pub rating: Option<i64>,
    pub year: Option<i64>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{Field, Match};

    use super::*;

    #[test]
    fn crate_id_validity() {
        assert!(!CrateId::default().is_valid());
        assert!(!CrateId::new("").is_valid());
        assert!(CrateId::new("c-42").is_valid());
    }

    #[test]
    fn crate_id_is_a_transparent_string_on_the_wire() {
        assert_eq!(serde_json::to_value(CrateId::new("c-42")).unwrap(), json!("c-42"));
        let id: CrateId = serde_json::from_value(json!("c-42")).unwrap();
        assert_eq!(id, CrateId::new("c-42"));
    }

    #[test]
    fn draft_validation_blocks_empty_and_whitespace_names() {
        let mut draft = CrateDraft::default();
        draft.criteria.add_rule();
        assert_eq!(draft.validate(), Err(ValidationError::EmptyName));
        draft.name = "   \t".to_owned();
        assert_eq!(draft.validate(), Err(ValidationError::EmptyName));
        draft.name = "Peak Hour".to_owned();
        assert_eq!(draft.validate(), Ok(()));
    }

    #[test]
    fn draft_validation_blocks_empty_rule_sequence() {
        let draft = CrateDraft {
            name: "Peak Hour".to_owned(),
            ..CrateDraft::default()
        };
        assert_eq!(draft.validate(), Err(ValidationError::NoRules));
    }

    #[test]
    fn crate_deserializes_from_wire_shape() {
        let persisted: Crate = serde_json::from_value(json!({
            "id": "c-1",
            "name": "Warmup",
            "type": "smart",
            "is_smart": true,
            "color": "#3366ff",
            "icon": "disc",
            "criteria": {
                "logic": "AND",
                "rules": [
                    { "field": "tempo", "operator": "range", "value": [100.0, 118.0] },
                ],
            },
            "track_count": 17,
        }))
        .unwrap();
        assert_eq!(persisted.id, CrateId::new("c-1"));
        assert_eq!(persisted.kind, CRATE_KIND_SMART);
        assert!(persisted.description.is_none());
        assert_eq!(persisted.criteria.logic, Match::All);
        assert_eq!(persisted.criteria.rules[0].field, Field::Tempo);
        assert_eq!(persisted.track_count, 17);
    }

    #[test]
    fn draft_from_crate_copies_the_editable_fields() {
        let mut criteria = Criteria::default();
        criteria.add_rule();
        let persisted = Crate {
            id: CrateId::new("c-1"),
            name: "Warmup".to_owned(),
            description: Some("Opening hour".to_owned()),
            kind: CRATE_KIND_SMART.to_owned(),
            is_smart: true,
            color: "#3366ff".to_owned(),
            icon: "disc".to_owned(),
            criteria: criteria.clone(),
            track_count: 17,
        };
        let draft = CrateDraft::from_crate(&persisted);
        assert_eq!(draft.name, persisted.name);
        assert_eq!(draft.description, persisted.description);
        assert_eq!(draft.criteria, criteria);
    }
}
