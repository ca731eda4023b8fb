use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ConditionType
// ---------------------------------------------------------------------------

/// Comparison tag carried on the wire and in persisted filter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionType {
    Gte,
    Lte,
    Between,
    In,
}

impl ConditionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::Gte => "gte",
            ConditionType::Lte => "lte",
            ConditionType::Between => "between",
            ConditionType::In => "in",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gte" => Some(ConditionType::Gte),
            "lte" => Some(ConditionType::Lte),
            "between" => Some(ConditionType::Between),
            "in" => Some(ConditionType::In),
            _ => None,
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Condition / ConditionRow
// ---------------------------------------------------------------------------

/// Operands of a single filter clause.
///
/// Bounds stay optional end to end: an absent bound is never collapsed to 0.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Gte(Option<f64>),
    Lte(Option<f64>),
    Between { gte: Option<f64>, lte: Option<f64> },
    In(Option<Vec<String>>),
}

impl Condition {
    pub fn condition_type(&self) -> ConditionType {
        match self {
            Condition::Gte(_) => ConditionType::Gte,
            Condition::Lte(_) => ConditionType::Lte,
            Condition::Between { .. } => ConditionType::Between,
            Condition::In(_) => ConditionType::In,
        }
    }
}

/// One filter clause: a field key plus its condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawConditionRow", into = "RawConditionRow")]
pub struct ConditionRow {
    pub key: String,
    pub condition: Condition,
}

impl ConditionRow {
    pub fn new(key: impl Into<String>, condition: Condition) -> Self {
        Self {
            key: key.into(),
            condition,
        }
    }

    pub fn gte(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, Condition::Gte(Some(value)))
    }

    pub fn lte(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, Condition::Lte(Some(value)))
    }

    pub fn between(key: impl Into<String>, gte: f64, lte: f64) -> Self {
        Self::new(
            key,
            Condition::Between {
                gte: Some(gte),
                lte: Some(lte),
            },
        )
    }

    pub fn one_of<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            key,
            Condition::In(Some(values.into_iter().map(Into::into).collect())),
        )
    }

    pub fn condition_type(&self) -> ConditionType {
        self.condition.condition_type()
    }

    /// Lower bound, for `gte` and `between` rows.
    pub fn gte_bound(&self) -> Option<f64> {
        match self.condition {
            Condition::Gte(v) => v,
            Condition::Between { gte, .. } => gte,
            _ => None,
        }
    }

    /// Upper bound, for `lte` and `between` rows.
    pub fn lte_bound(&self) -> Option<f64> {
        match self.condition {
            Condition::Lte(v) => v,
            Condition::Between { lte, .. } => lte,
            _ => None,
        }
    }

    pub fn values(&self) -> Option<&[String]> {
        match &self.condition {
            Condition::In(Some(values)) => Some(values),
            _ => None,
        }
    }

    /// True when the row carries every operand its condition needs, with
    /// finite bounds and a non-empty member list.
    pub fn is_complete(&self) -> bool {
        let finite = |v: Option<f64>| v.is_some_and(f64::is_finite);
        match &self.condition {
            Condition::Gte(v) | Condition::Lte(v) => finite(*v),
            Condition::Between { gte, lte } => finite(*gte) && finite(*lte),
            Condition::In(values) => values.as_ref().is_some_and(|v| !v.is_empty()),
        }
    }
}

// ---------------------------------------------------------------------------
// JSON shape: {"key":"pnl","conditionType":"gte","gte":100}
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConditionRow {
    key: String,
    condition_type: ConditionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gte: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lte: Option<f64>,
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    values: Option<Vec<String>>,
}

impl From<RawConditionRow> for ConditionRow {
    fn from(raw: RawConditionRow) -> Self {
        let condition = match raw.condition_type {
            ConditionType::Gte => Condition::Gte(raw.gte),
            ConditionType::Lte => Condition::Lte(raw.lte),
            ConditionType::Between => Condition::Between {
                gte: raw.gte,
                lte: raw.lte,
            },
            ConditionType::In => Condition::In(raw.values),
        };
        ConditionRow {
            key: raw.key,
            condition,
        }
    }
}

impl From<ConditionRow> for RawConditionRow {
    fn from(row: ConditionRow) -> Self {
        let condition_type = row.condition_type();
        let (gte, lte, values) = match row.condition {
            Condition::Gte(v) => (v, None, None),
            Condition::Lte(v) => (None, v, None),
            Condition::Between { gte, lte } => (gte, lte, None),
            Condition::In(values) => (None, None, values),
        };
        RawConditionRow {
            key: row.key,
            condition_type,
            gte,
            lte,
            values,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
