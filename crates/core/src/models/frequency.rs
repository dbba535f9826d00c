use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::CoreError;

/// How often a recurring purchase is made.
///
/// Parsed from (and serialized as) the single-letter request code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    /// `d`
    Daily,
    /// `w`
    Weekly,
    /// `b` — every two weeks
    Biweekly,
    /// `m` — 30-day approximation
    Monthly,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Biweekly,
        Frequency::Monthly,
    ];

    pub fn code(self) -> char {
        match self {
            Frequency::Daily => 'd',
            Frequency::Weekly => 'w',
            Frequency::Biweekly => 'b',
            Frequency::Monthly => 'm',
        }
    }
}

impl FromStr for Frequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "d" => Ok(Frequency::Daily),
            "w" => Ok(Frequency::Weekly),
            "b" => Ok(Frequency::Biweekly),
            "m" => Ok(Frequency::Monthly),
            other => Err(CoreError::InvalidFrequency(other.to_string())),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(f: Frequency) -> Self {
        f.code().to_string()
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
