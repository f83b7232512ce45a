//! Academic term keys
//!
//! Terms are written two ways: the short form stored in the local schema
//! (`FA24`) and the six-digit Banner code used by the ODS and live systems
//! (`202490`). Banner suffixes are `10` (Spring), `60` (Summer), `90` (Fall).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Term season, in calendar order within a year
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TermName {
    Spring,
    Summer,
    Fall,
}

impl TermName {
    /// Human-readable name
    pub fn full_name(self) -> &'static str {
        match self {
            TermName::Spring => "Spring",
            TermName::Summer => "Summer",
            TermName::Fall => "Fall",
        }
    }

    /// Two-letter prefix of the short form
    pub fn short_code(self) -> &'static str {
        match self {
            TermName::Spring => "SP",
            TermName::Summer => "SM",
            TermName::Fall => "FA",
        }
    }

    /// Two-digit suffix of the Banner term code
    pub fn banner_suffix(self) -> &'static str {
        match self {
            TermName::Spring => "10",
            TermName::Summer => "60",
            TermName::Fall => "90",
        }
    }

    /// Suffix of the per-term ODS table (`CSUS_TERM_INFO_xxx`)
    pub fn ods_table_suffix(self) -> &'static str {
        match self {
            TermName::Spring => "SPR",
            TermName::Summer => "SMR",
            TermName::Fall => "FAL",
        }
    }

    fn from_short_code(code: &str) -> Option<Self> {
        match code {
            "SP" => Some(TermName::Spring),
            "SM" => Some(TermName::Summer),
            "FA" => Some(TermName::Fall),
            _ => None,
        }
    }

    fn from_banner_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "10" => Some(TermName::Spring),
            "60" => Some(TermName::Summer),
            "90" => Some(TermName::Fall),
            _ => None,
        }
    }
}

impl fmt::Display for TermName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

/// A term (season plus four-digit year)
///
/// Ordering is chronological: year first, then season. Serializes as the
/// short form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TermKey {
    pub year: i32,
    pub name: TermName,
}

impl TermKey {
    pub fn new(name: TermName, year: i32) -> Self {
        Self { year, name }
    }

    /// Parse a six-character Banner code such as `202490`
    ///
    /// Returns `None` for anything that is not four digits followed by a
    /// known season suffix.
    pub fn from_banner_code(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.len() != 6 || !code.is_ascii() {
            return None;
        }
        let year: i32 = code[..4].parse().ok()?;
        let name = TermName::from_banner_suffix(&code[4..])?;
        Some(Self::new(name, year))
    }

    /// Parse the short form (`FA24`), also accepting four-digit years (`FA2024`)
    pub fn parse_short(text: &str) -> Result<Self> {
        let text = text.trim();
        if !text.is_ascii() || text.len() < 4 {
            return Err(Error::InvalidTerm(text.to_string()));
        }

        let name = TermName::from_short_code(&text[..2].to_ascii_uppercase())
            .ok_or_else(|| Error::InvalidTerm(format!("unknown term name in '{}'", text)))?;

        let digits = &text[2..];
        let year = match digits.len() {
            2 => digits.parse::<i32>().map(|y| 2000 + y),
            4 => digits.parse::<i32>(),
            _ => return Err(Error::InvalidTerm(format!("bad year in '{}'", text))),
        }
        .map_err(|_| Error::InvalidTerm(format!("bad year in '{}'", text)))?;

        Ok(Self::new(name, year))
    }

    /// Six-character Banner code
    pub fn banner_code(&self) -> String {
        format!("{:04}{}", self.year, self.name.banner_suffix())
    }

    /// Short form stored in the local schema
    ///
    /// Only the last two digits of the year are kept, and `parse_short`
    /// reads them back as 20xx, so stored terms round-trip for 2000-2099 only.
    pub fn short_string(&self) -> String {
        format!("{}{:02}", self.name.short_code(), self.year.rem_euclid(100))
    }

    /// The term that follows this one
    pub fn next(&self) -> Self {
        match self.name {
            TermName::Spring => Self::new(TermName::Summer, self.year),
            TermName::Summer => Self::new(TermName::Fall, self.year),
            TermName::Fall => Self::new(TermName::Spring, self.year + 1),
        }
    }
}

impl fmt::Display for TermKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name.full_name(), self.year)
    }
}

impl FromStr for TermKey {
    type Err = Error;

    /// Accepts either the Banner code or the short form
    fn from_str(s: &str) -> Result<Self> {
        Self::from_banner_code(s).map_or_else(|| Self::parse_short(s), Ok)
    }
}

impl TryFrom<String> for TermKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TermKey> for String {
    fn from(term: TermKey) -> Self {
        term.short_string()
    }
}
