use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Permission level granted on a repository or project.
///
/// Levels are ordered: admin implies write implies read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionLevel {
    Read,
    Write,
    Admin,
}

impl PermissionLevel {
    pub const ALL: [PermissionLevel; 3] = [Self::Read, Self::Write, Self::Admin];

    /// Parses both scoped (`REPO_WRITE`, `PROJECT_WRITE`) and bare (`WRITE`) forms.
    pub fn parse(s: &str) -> Option<PermissionLevel> {
        let upper = s.trim().to_ascii_uppercase();
        let bare = upper
            .strip_prefix("REPO_")
            .or_else(|| upper.strip_prefix("PROJECT_"))
            .unwrap_or(&upper);
        match bare {
            "READ" => Some(Self::Read),
            "WRITE" => Some(Self::Write),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_repo_str(self) -> &'static str {
        match self {
            Self::Read => "REPO_READ",
            Self::Write => "REPO_WRITE",
            Self::Admin => "REPO_ADMIN",
        }
    }

    #[must_use]
    pub fn grants_read(self) -> bool {
        self >= Self::Read
    }

    #[must_use]
    pub fn grants_write(self) -> bool {
        self >= Self::Write
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_repo_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| Error::InvalidPermission(s.to_string()))
    }
}

/// Serde adapter for levels read from the remote: anything unrecognized
/// (including `REPO_CREATE` or an empty string) becomes `None`.
pub mod optional_level {
    use super::*;

    pub fn serialize<S: Serializer>(
        level: &Option<PermissionLevel>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match level {
            Some(l) => serializer.serialize_str(l.as_repo_str()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<PermissionLevel>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(PermissionLevel::parse))
    }
}

/// Branch restriction type as named by the branch-permissions API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum RestrictionType {
    ReadOnly,
    NoDeletes,
    FastForwardOnly,
    PullRequestOnly,
}

impl RestrictionType {
    pub const ALL: [RestrictionType; 4] = [
        Self::ReadOnly,
        Self::NoDeletes,
        Self::FastForwardOnly,
        Self::PullRequestOnly,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "read-only",
            Self::NoDeletes => "no-deletes",
            Self::FastForwardOnly => "fast-forward-only",
            Self::PullRequestOnly => "pull-request-only",
        }
    }
}

impl fmt::Display for RestrictionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestrictionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidRestriction(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Group,
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Group => f.write_str("group"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scoped_and_bare() {
        assert_eq!(PermissionLevel::parse("REPO_READ"), Some(PermissionLevel::Read));
        assert_eq!(
            PermissionLevel::parse("PROJECT_ADMIN"),
            Some(PermissionLevel::Admin)
        );
        assert_eq!(PermissionLevel::parse("write"), Some(PermissionLevel::Write));
        assert_eq!(PermissionLevel::parse("REPO_CREATE"), None);
        assert_eq!(PermissionLevel::parse(""), None);
    }

    #[test]
    fn test_level_ordering_implies() {
        assert!(PermissionLevel::Admin.grants_write());
        assert!(PermissionLevel::Admin.grants_read());
        assert!(PermissionLevel::Write.grants_read());
        assert!(!PermissionLevel::Read.grants_write());
    }

    #[test]
    fn test_optional_level_tolerates_unknown() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(with = "optional_level")]
            permission: Option<PermissionLevel>,
        }

        let row: Row = serde_json::from_str(r#"{"permission":"PROJECT_WRITE"}"#).unwrap();
        assert_eq!(row.permission, Some(PermissionLevel::Write));

        let row: Row = serde_json::from_str(r#"{"permission":"REPO_CREATE"}"#).unwrap();
        assert_eq!(row.permission, None);

        let row: Row = serde_json::from_str(r#"{"permission":null}"#).unwrap();
        assert_eq!(row.permission, None);
    }

    #[test]
    fn test_restriction_type_round_trip_strings() {
        for kind in RestrictionType::ALL {
            assert_eq!(kind.as_str().parse::<RestrictionType>().unwrap(), kind);
        }
        assert!("read_only".parse::<RestrictionType>().is_err());
        assert_eq!(
            serde_json::to_string(&RestrictionType::FastForwardOnly).unwrap(),
            "\"fast-forward-only\""
        );
    }
}
