use crate::types::{PermissionLevel, RestrictionType};

use super::EntityCache;

/// Which value a flag being completed expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionTarget {
    Project,
    Username,
    Repository,
    Permission,
    Restriction,
}

impl CompletionTarget {
    /// Maps a flag (with or without leading dashes) to its completion source.
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag.trim_start_matches('-') {
            "project" | "source-project" | "target-project" => Some(Self::Project),
            "username" | "user" => Some(Self::Username),
            "repository" | "source-repository" | "target-repository" => Some(Self::Repository),
            "permission" => Some(Self::Permission),
            "restriction" => Some(Self::Restriction),
            _ => None,
        }
    }
}

/// Candidate values for `target`, in cache order.
#[must_use]
pub fn candidates(cache: &EntityCache, target: CompletionTarget) -> Vec<String> {
    match target {
        CompletionTarget::Project => cache.projects().iter().map(|p| p.key.clone()).collect(),
        CompletionTarget::Username => cache.users().iter().map(|u| u.slug.clone()).collect(),
        CompletionTarget::Repository => {
            let mut slugs: Vec<String> = Vec::new();
            for repo in cache.repositories() {
                if !slugs.contains(&repo.slug) {
                    slugs.push(repo.slug.clone());
                }
            }
            slugs
        }
        CompletionTarget::Permission => PermissionLevel::ALL
            .iter()
            .map(|l| l.as_repo_str().to_string())
            .collect(),
        CompletionTarget::Restriction => RestrictionType::ALL
            .iter()
            .map(|r| r.as_str().to_string())
            .collect(),
    }
}
