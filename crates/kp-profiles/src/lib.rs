//! Runtime profile registry.
//!
//! Generated programs were written against more than one revision of the runtime, and those
//! revisions disagree on a few observable conventions. A profile pins them:
//! - the runtime library (formatting, truthiness)
//! - the tooling (CLI, ABI listings)
//!
//! share this authoritative list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileId {
    /// kforth-compatible runtime: nonzero is true, uppercase hex.
    #[default]
    Kforth,
    /// Earlier runtime revisions: only -1 is true, lowercase hex.
    Legacy,
}

/// Which values `pwrite_bool` (and other truth tests) treat as true.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoolConvention {
    NonZero,
    MinusOne,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HexCase {
    Upper,
    Lower,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileCaps {
    pub bool_convention: BoolConvention,
    pub hex_case: HexCase,
}

impl ProfileId {
    pub const ALL: [ProfileId; 2] = [ProfileId::Kforth, ProfileId::Legacy];

    pub fn as_str(self) -> &'static str {
        match self {
            ProfileId::Kforth => "kforth",
            ProfileId::Legacy => "legacy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kforth" | "default" => Some(ProfileId::Kforth),
            "legacy" => Some(ProfileId::Legacy),
            _ => None,
        }
    }

    /// Stable numeric id used by `kp_rt_init` across the C ABI.
    pub fn abi_code(self) -> i32 {
        match self {
            ProfileId::Kforth => 0,
            ProfileId::Legacy => 1,
        }
    }

    pub fn from_abi_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ProfileId::Kforth),
            1 => Some(ProfileId::Legacy),
            _ => None,
        }
    }

    pub fn caps(self) -> ProfileCaps {
        match self {
            ProfileId::Kforth => ProfileCaps {
                bool_convention: BoolConvention::NonZero,
                hex_case: HexCase::Upper,
            },
            ProfileId::Legacy => ProfileCaps {
                bool_convention: BoolConvention::MinusOne,
                hex_case: HexCase::Lower,
            },
        }
    }
}

impl BoolConvention {
    pub fn as_str(self) -> &'static str {
        match self {
            BoolConvention::NonZero => "non-zero",
            BoolConvention::MinusOne => "minus-one",
        }
    }

    pub fn is_true(self, x: i32) -> bool {
        match self {
            BoolConvention::NonZero => x != 0,
            BoolConvention::MinusOne => x == -1,
        }
    }
}

impl HexCase {
    pub fn as_str(self) -> &'static str {
        match self {
            HexCase::Upper => "upper",
            HexCase::Lower => "lower",
        }
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BoolConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for HexCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ProfileParseError {
    value: String,
}

impl fmt::Display for ProfileParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid runtime profile {:?} (expected one of: kforth, legacy)",
            self.value
        )
    }
}

impl std::error::Error for ProfileParseError {}

impl FromStr for ProfileId {
    type Err = ProfileParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileId::parse(s).ok_or_else(|| ProfileParseError {
            value: s.trim().to_string(),
        })
    }
}

#[cfg(feature = "clap")]
impl clap::ValueEnum for ProfileId {
    fn value_variants<'a>() -> &'a [Self] {
        &ProfileId::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            ProfileId::Kforth => Some(clap::builder::PossibleValue::new("kforth").alias("default")),
            ProfileId::Legacy => Some(clap::builder::PossibleValue::new("legacy")),
        }
    }
}

#[cfg(feature = "clap")]
impl clap::ValueEnum for HexCase {
    fn value_variants<'a>() -> &'a [Self] {
        const ALL: [HexCase; 2] = [HexCase::Upper, HexCase::Lower];
        &ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

#[cfg(feature = "clap")]
impl clap::ValueEnum for BoolConvention {
    fn value_variants<'a>() -> &'a [Self] {
        const ALL: [BoolConvention; 2] = [BoolConvention::NonZero, BoolConvention::MinusOne];
        &ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}
