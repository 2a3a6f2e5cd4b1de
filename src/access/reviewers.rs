use crate::error::Result;
use crate::remote::RemoteApi;
use crate::types::{DefaultReviewersSetting, Matcher, Repository, User};

/// What [`apply_default_reviewers`] did on the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewersChange {
    Updated(DefaultReviewersSetting),
    Created(DefaultReviewersSetting),
}

impl ReviewersChange {
    #[must_use]
    pub fn setting(&self) -> &DefaultReviewersSetting {
        match self {
            Self::Updated(s) | Self::Created(s) => s,
        }
    }
}

/// Adds `reviewers` to `setting`, skipping slugs already present, or swaps the
/// list outright when `replace` is set.
pub fn merge_reviewers(setting: &mut DefaultReviewersSetting, reviewers: &[User], replace: bool) {
    if replace {
        setting.reviewers = reviewers.to_vec();
        return;
    }
    for user in reviewers {
        if !setting.reviewers.iter().any(|r| r.slug == user.slug) {
            setting.reviewers.push(user.clone());
        }
    }
}

/// Updates the condition targeting `branch_ref`, or creates one from any ref
/// to that branch.
///
/// `required_approvals` is only used for a new condition.
pub fn apply_default_reviewers(
    remote: &dyn RemoteApi,
    repository: &Repository,
    branch_ref: &str,
    reviewers: &[User],
    required_approvals: u32,
    replace: bool,
) -> Result<ReviewersChange> {
    let (project_key, slug) = (repository.project_key(), repository.slug.as_str());
    let existing = remote
        .default_reviewers(project_key, slug)?
        .into_iter()
        .find(|s| s.target_ref_matcher.id == branch_ref);

    if let Some(mut setting) = existing {
        merge_reviewers(&mut setting, reviewers, replace);
        let updated = remote.update_default_reviewers(project_key, slug, &setting)?;
        return Ok(ReviewersChange::Updated(updated));
    }

    let setting = DefaultReviewersSetting {
        id: None,
        repository: Some(repository.clone()),
        source_ref_matcher: Matcher::any_ref(),
        target_ref_matcher: Matcher::branch(branch_ref),
        reviewers: reviewers.to_vec(),
        required_approvals,
    };
    let created = remote.create_default_reviewers(project_key, slug, &setting)?;
    Ok(ReviewersChange::Created(created))
}
