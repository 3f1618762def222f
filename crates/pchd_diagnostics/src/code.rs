//! Stable diagnostic codes such as `E101` or `W201`.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The family a code belongs to, shown as its leading letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Category {
    /// `E`: a unit or a PCH failed.
    Error,
    /// `W`: something was skipped.
    Warning,
    /// `J`: job scheduling.
    Job,
}

impl Category {
    /// The code's leading letter.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Job => 'J',
        }
    }

    fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'E' => Some(Category::Error),
            'W' => Some(Category::Warning),
            'J' => Some(Category::Job),
            _ => None,
        }
    }
}

/// A category letter plus a three-digit number.
///
/// Serialized as its display string so JSON reports read `"code": "E101"`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DiagnosticCode {
    /// The family.
    pub category: Category,
    /// Number within the family.
    pub number: u16,
}

impl DiagnosticCode {
    /// A translation unit could not be read and was skipped.
    pub const UNREADABLE_UNIT: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);
    /// The compiler frontend failed or crashed on one translation unit.
    pub const FRONTEND_FAILURE: DiagnosticCode = DiagnosticCode::new(Category::Error, 102);
    /// PCH emission failed.
    pub const PCH_EMISSION_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Error, 103);
    /// An `#include` directive did not resolve to a file.
    pub const UNRESOLVED_INCLUDE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 201);
    /// An excluded include path could not be resolved to a file identity.
    pub const UNRESOLVED_EXCLUSION: DiagnosticCode = DiagnosticCode::new(Category::Warning, 202);
    /// A job request could not be prepared.
    pub const MALFORMED_JOB: DiagnosticCode = DiagnosticCode::new(Category::Job, 301);

    /// Creates a code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

impl FromStr for DiagnosticCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let category = chars
            .next()
            .and_then(Category::from_prefix)
            .ok_or_else(|| format!("unknown diagnostic category in '{s}'"))?;
        let digits = chars.as_str();
        if digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("diagnostic code '{s}' needs three digits"));
        }
        let number = digits.parse().map_err(|_| format!("bad number in '{s}'"))?;
        Ok(Self::new(category, number))
    }
}

impl Serialize for DiagnosticCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DiagnosticCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}
