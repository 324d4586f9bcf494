use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// One of the insulin doses predicted by the model, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetLabel {
    #[default]
    #[serde(rename = "Insulina al Risveglio (07:00)")]
    Waking,
    #[serde(rename = "Insulina alle 09:30")]
    At0930,
    #[serde(rename = "Insulina alle 13:00")]
    At1300,
    #[serde(rename = "Insulina alle 15:00")]
    At1500,
    #[serde(rename = "Insulina alle 18:00")]
    At1800,
    #[serde(rename = "Insulina alle 23:00")]
    At2300,
}

/// The target column names, in model output order.
pub const TARGET_COLUMNS: [&str; 6] = [
    "Insulina al Risveglio (07:00)",
    "Insulina alle 09:30",
    "Insulina alle 13:00",
    "Insulina alle 15:00",
    "Insulina alle 18:00",
    "Insulina alle 23:00",
];

impl TargetLabel {
    pub const ALL: [TargetLabel; 6] = [
        TargetLabel::Waking,
        TargetLabel::At0930,
        TargetLabel::At1300,
        TargetLabel::At1500,
        TargetLabel::At1800,
        TargetLabel::At2300,
    ];

    /// Returns the position of this label in the model's output row.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the column name used on the wire and in training data.
    pub fn as_str(self) -> &'static str {
        TARGET_COLUMNS[self.index()]
    }
}

impl fmt::Display for TargetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown target label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTarget(pub String);

impl fmt::Display for UnknownTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown target label '{}'", self.0)
    }
}

impl std::error::Error for UnknownTarget {}

impl FromStr for TargetLabel {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| UnknownTarget(s.to_string()))
    }
}
