//! Build variants

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// The build flavour the host application was compiled as
///
/// `Development` is the designated development variant: general non-fatal
/// errors are only forwarded to the chat webhook there. Crash collection is
/// only enabled for `Release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildVariant {
    Development,
    Staging,
    Release,
}

impl BuildVariant {
    /// Returns true for the designated development variant
    pub fn is_development(&self) -> bool {
        matches!(self, BuildVariant::Development)
    }

    /// Returns true for release builds
    pub fn is_release(&self) -> bool {
        matches!(self, BuildVariant::Release)
    }
}

impl Default for BuildVariant {
    fn default() -> Self {
        BuildVariant::Development
    }
}

impl std::fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BuildVariant::Development => "development",
            BuildVariant::Staging => "staging",
            BuildVariant::Release => "release",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for BuildVariant {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(BuildVariant::Development),
            "staging" => Ok(BuildVariant::Staging),
            "release" | "production" | "prod" => Ok(BuildVariant::Release),
            other => Err(DomainError::InvalidVariant(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!("dev".parse::<BuildVariant>().unwrap(), BuildVariant::Development);
        assert_eq!("Release".parse::<BuildVariant>().unwrap(), BuildVariant::Release);
        assert_eq!("staging".parse::<BuildVariant>().unwrap(), BuildVariant::Staging);
        assert!("beta".parse::<BuildVariant>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for v in [
            BuildVariant::Development,
            BuildVariant::Staging,
            BuildVariant::Release,
        ] {
            assert_eq!(v.to_string().parse::<BuildVariant>().unwrap(), v);
        }
    }

    #[test]
    fn test_predicates() {
        assert!(BuildVariant::Development.is_development());
        assert!(!BuildVariant::Staging.is_development());
        assert!(BuildVariant::Release.is_release());
        assert!(!BuildVariant::Development.is_release());
    }
}
