// SPDX-FileCopyrightText: The cratedigger authors
// SPDX-License-Identifier: MPL-2.0

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Filterable track attribute.
///
/// Closed enumeration. Wire names are the `snake_case` renderings of the
/// variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Tempo,
    Key,
    EnergyLevel,
    Era,
    GenreTags,
    MoodTags,
    Rating,
    Danceability,
    Valence,
    Explicit,
    Year,
}

impl Field {
    /// All fields, in display order.
    ///
    /// The first entry is the starting field of a freshly added rule.
    pub const ALL: [Self; 11] = [
        Self::Tempo,
        Self::Key,
        Self::EnergyLevel,
        Self::Era,
        Self::GenreTags,
        Self::MoodTags,
        Self::Rating,
        Self::Danceability,
        Self::Valence,
        Self::Explicit,
        Self::Year,
    ];

    /// Permitted operators for this field, in display order.
    ///
    /// Never empty. The first entry is the default operator selected when
    /// switching a rule to this field.
    #[must_use]
    pub const fn allowed_operators(self) -> &'static [Operator] {
        match self {
            Self::Tempo => &[
                Operator::Range,
                Operator::Equals,
                Operator::GreaterOrEqual,
                Operator::LessOrEqual,
                Operator::GreaterThan,
                Operator::LessThan,
                Operator::NotEquals,
            ],
            Self::Key | Self::Era => {
                &[Operator::Equals, Operator::NotEquals, Operator::MemberOf]
            }
            Self::EnergyLevel => &[
                Operator::GreaterOrEqual,
                Operator::LessOrEqual,
                Operator::Equals,
                Operator::NotEquals,
                Operator::Range,
                Operator::GreaterThan,
                Operator::LessThan,
            ],
            Self::GenreTags | Self::MoodTags => &[Operator::Contains, Operator::MemberOf],
            Self::Rating => &[
                Operator::GreaterOrEqual,
                Operator::Equals,
                Operator::LessOrEqual,
                Operator::NotEquals,
                Operator::Range,
            ],
            Self::Danceability | Self::Valence => &[
                Operator::GreaterOrEqual,
                Operator::LessOrEqual,
                Operator::Range,
                Operator::GreaterThan,
                Operator::LessThan,
            ],
            Self::Explicit => &[Operator::Equals, Operator::NotEquals],
            Self::Year => &[
                Operator::Range,
                Operator::Equals,
                Operator::GreaterOrEqual,
                Operator::LessOrEqual,
                Operator::NotEquals,
            ],
        }
    }

    /// Default operator, i.e. the first permitted one.
    #[must_use]
    pub const fn default_operator(self) -> Operator {
        self.allowed_operators()[0]
    }

    /// Type-correct starting value for a rule on this field with `operator`.
    ///
    /// Total over all `(field, operator)` pairs reachable via
    /// [`Field::allowed_operators`].
    #[must_use]
    pub fn default_value(self, operator: Operator) -> Value {
        match operator.shape() {
            Shape::Pair => {
                let (lo, hi) = self.default_range();
                Value::Range(lo, hi)
            }
            Shape::TagSet => Value::Tags(BTreeSet::new()),
            Shape::Scalar => self.default_scalar(),
        }
    }

    /// Domain-specific starting window for the `range` operator.
    const fn default_range(self) -> (f64, f64) {
        match self {
            Self::Tempo => (120.0, 130.0),
            Self::EnergyLevel => (4.0, 7.0),
            Self::Rating => (3.0, 5.0),
            Self::Danceability | Self::Valence => (0.4, 0.7),
            Self::Year => (2016.0, 2025.0),
            // These fields never permit the `range` operator.
            Self::Key | Self::Era | Self::GenreTags | Self::MoodTags | Self::Explicit => {
                (0.0, 0.0)
            }
        }
    }

    /// Mid-scale value for scalar operators, or empty text for
    /// free-text-like fields.
    fn default_scalar(self) -> Value {
        match self {
            Self::Tempo => Value::Number(125.0),
            Self::Key | Self::Era => Value::Text(String::new()),
            Self::EnergyLevel => Value::Number(5.0),
            Self::Rating => Value::Number(3.0),
            Self::Danceability | Self::Valence => Value::Number(0.5),
            Self::Explicit => Value::Number(1.0),
            Self::Year => Value::Number(2020.0),
            // Tag fields have no scalar operators.
            Self::GenreTags | Self::MoodTags => Value::Tags(BTreeSet::new()),
        }
    }
}

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    MemberOf,
    Contains,
    Range,
}

impl Operator {
    /// Value shape this operator expects.
    #[must_use]
    pub const fn shape(self) -> Shape {
        match self {
            Self::Range => Shape::Pair,
            Self::MemberOf | Self::Contains => Shape::TagSet,
            Self::Equals
            | Self::NotEquals
            | Self::GreaterThan
            | Self::GreaterOrEqual
            | Self::LessThan
            | Self::LessOrEqual => Shape::Scalar,
        }
    }
}

/// Shape tag of a rule value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A single number or string.
    Scalar,
    /// An ordered pair of numbers.
    Pair,
    /// A set of strings.
    TagSet,
}

/// Polymorphic rule value.
///
/// Untagged on the wire: a number, a two-element array of numbers, an
/// array of strings, or a string. The variant order matters for
/// deserialization; an empty array decodes as an empty tag set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Range(f64, f64),
    Tags(BTreeSet<String>),
    Text(String),
}

impl Value {
    /// Shape tag of this value.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        match self {
            Self::Number(_) | Self::Text(_) => Shape::Scalar,
            Self::Range(..) => Shape::Pair,
            Self::Tags(_) => Shape::TagSet,
        }
    }
}

/// One filter condition: a field, an operator, and a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub field: Field,
    pub operator: Operator,
    pub value: Value,
}

impl Rule {
    /// Creates a rule on `field` with its default operator and value.
    #[must_use]
    pub fn new(field: Field) -> Self {
        let operator = field.default_operator();
        let value = field.default_value(operator);
        Self {
            field,
            operator,
            value,
        }
    }

    /// Switches the field, resetting operator and value to the new field's
    /// defaults.
    ///
    /// Never carries over a value shaped for the old field.
    #[must_use]
    pub fn with_field(self, field: Field) -> Self {
        Self::new(field)
    }

    /// Switches the operator, keeping the field and resetting the value.
    #[must_use]
    pub fn with_operator(self, operator: Operator) -> Self {
        debug_assert!(self.field.allowed_operators().contains(&operator));
        let value = self.field.default_value(operator);
        Self {
            field: self.field,
            operator,
            value,
        }
    }

    /// Checks that the operator is permitted for the field and that the
    /// value shape matches the operator.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.field.allowed_operators().contains(&self.operator)
            && self.value.shape() == self.operator.shape()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn allowed_operators_non_empty_with_default_first() {
        for field in Field::ALL {
            let allowed = field.allowed_operators();
            assert!(!allowed.is_empty());
            assert_eq!(allowed[0], field.default_operator());
            assert_eq!(Rule::new(field).operator, allowed[0]);
        }
    }

    #[test]
    fn default_value_shape_matches_operator() {
        for field in Field::ALL {
            for &operator in field.allowed_operators() {
                let value = field.default_value(operator);
                assert_eq!(
                    value.shape(),
                    operator.shape(),
                    "{field:?}/{operator:?} default has wrong shape"
                );
            }
        }
    }

    #[test]
    fn new_rule_is_consistent_for_every_field() {
        for field in Field::ALL {
            assert!(Rule::new(field).is_consistent());
        }
    }

    #[test]
    fn field_change_resets_operator_and_value() {
        let rule = Rule::new(Field::GenreTags);
        assert_eq!(rule.value.shape(), Shape::TagSet);
        let rule = rule.with_field(Field::Tempo);
        assert_eq!(rule.operator, Operator::Range);
        assert_eq!(rule.value, Value::Range(120.0, 130.0));
        assert!(rule.is_consistent());
    }

    #[test]
    fn operator_change_keeps_field_and_resets_value() {
        let rule = Rule::new(Field::Tempo).with_operator(Operator::GreaterOrEqual);
        assert_eq!(rule.field, Field::Tempo);
        assert_eq!(rule.value, Value::Number(125.0));
        assert!(rule.is_consistent());
    }

    #[test]
    fn wire_names_are_snake_case() {
        assert_eq!(
            serde_json::to_value(Field::EnergyLevel).unwrap(),
            json!("energy_level")
        );
        assert_eq!(
            serde_json::to_value(Operator::GreaterOrEqual).unwrap(),
            json!("greater_or_equal")
        );
        assert_eq!(serde_json::to_value(Operator::Range).unwrap(), json!("range"));
    }

    #[test]
    fn value_wire_representation_is_untagged() {
        assert_eq!(serde_json::to_value(Value::Number(4.0)).unwrap(), json!(4.0));
        assert_eq!(
            serde_json::to_value(Value::Range(120.0, 130.0)).unwrap(),
            json!([120.0, 130.0])
        );
        let tags: BTreeSet<_> = ["house".to_owned(), "techno".to_owned()].into();
        assert_eq!(
            serde_json::to_value(Value::Tags(tags)).unwrap(),
            json!(["house", "techno"])
        );
        assert_eq!(
            serde_json::to_value(Value::Text("8A".to_owned())).unwrap(),
            json!("8A")
        );
    }

    #[test]
    fn value_deserializes_by_shape() {
        let value: Value = serde_json::from_value(json!([120.0, 130.0])).unwrap();
        assert_eq!(value, Value::Range(120.0, 130.0));
        let value: Value = serde_json::from_value(json!(["house"])).unwrap();
        assert_eq!(value.shape(), Shape::TagSet);
        // An empty array is an empty tag set, not a malformed range.
        let value: Value = serde_json::from_value(json!([])).unwrap();
        assert_eq!(value, Value::Tags(BTreeSet::new()));
    }
}
