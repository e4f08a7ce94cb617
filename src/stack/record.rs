//! Mastery record schema
//!
//! One record per curriculum standard, as delivered by the mastery dataset:
//!
//! ```json
//! { "domain": "Ratios", "cluster": "Understand ratio concepts",
//!   "standardid": "6.RP.A.1", "grade": "6th Grade", "mastery": 2 }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::Result;

/// Grade a stack is built for. The scene always has exactly these three stacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    Sixth,
    Seventh,
    Eighth,
}

impl Grade {
    /// All grades in stack order
    pub const ALL: [Grade; 3] = [Grade::Sixth, Grade::Seventh, Grade::Eighth];

    /// Parse the dataset's grade label. Unrecognized labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "6th Grade" => Some(Grade::Sixth),
            "7th Grade" => Some(Grade::Seventh),
            "8th Grade" => Some(Grade::Eighth),
            _ => None,
        }
    }

    /// Dataset label, e.g. `"7th Grade"`
    pub fn label(self) -> &'static str {
        match self {
            Grade::Sixth => "6th Grade",
            Grade::Seventh => "7th Grade",
            Grade::Eighth => "8th Grade",
        }
    }

    /// Grade number (6, 7 or 8), used to key the pools
    pub fn number(self) -> u8 {
        match self {
            Grade::Sixth => 6,
            Grade::Seventh => 7,
            Grade::Eighth => 8,
        }
    }

    /// Stack index (0, 1 or 2)
    pub fn index(self) -> usize {
        match self {
            Grade::Sixth => 0,
            Grade::Seventh => 1,
            Grade::Eighth => 2,
        }
    }

    /// Grade for a stack index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How far a student has progressed on a standard.
///
/// Encoded in the dataset as 0, 1 or 2; any other value is a parse error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Mastery {
    NotStarted,
    Learned,
    Mastered,
}

impl Mastery {
    /// Index into the material table
    pub fn index(self) -> usize {
        match self {
            Mastery::NotStarted => 0,
            Mastery::Learned => 1,
            Mastery::Mastered => 2,
        }
    }

    /// Text shown on the block's label
    pub fn label(self) -> &'static str {
        match self {
            Mastery::NotStarted => "",
            Mastery::Learned => "Learned",
            Mastery::Mastered => "Mastered",
        }
    }

    /// Not-started blocks carry no label
    pub fn shows_label(self) -> bool {
        self != Mastery::NotStarted
    }
}

impl TryFrom<u8> for Mastery {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Mastery::NotStarted),
            1 => Ok(Mastery::Learned),
            2 => Ok(Mastery::Mastered),
            other => Err(format!("invalid mastery level {}, expected 0, 1 or 2", other)),
        }
    }
}

impl From<Mastery> for u8 {
    fn from(mastery: Mastery) -> u8 {
        mastery.index() as u8
    }
}

/// A single standard's mastery entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRecord {
    pub domain: String,
    pub cluster: String,
    #[serde(rename = "standardid")]
    pub standard_id: String,
    /// Raw grade label; see [`StackRecord::grade`]
    pub grade: String,
    pub mastery: Mastery,
}

impl StackRecord {
    /// Create a record
    pub fn new(
        domain: impl Into<String>,
        cluster: impl Into<String>,
        standard_id: impl Into<String>,
        grade: impl Into<String>,
        mastery: Mastery,
    ) -> Self {
        Self {
            domain: domain.into(),
            cluster: cluster.into(),
            standard_id: standard_id.into(),
            grade: grade.into(),
            mastery,
        }
    }

    /// Parsed grade, `None` if the label is not one of the three known grades
    pub fn grade(&self) -> Option<Grade> {
        Grade::from_label(&self.grade)
    }
}

/// Parse a JSON array of mastery records.
///
/// Any missing or mistyped field fails the whole parse.
pub fn parse_records(json: &str) -> Result<Vec<StackRecord>> {
    let records: Vec<StackRecord> = serde_json::from_str(json)?;
    Ok(records)
}
