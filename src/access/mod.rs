//! Access-control reconciliation: effective permission views, branch
//! restriction and default reviewer merges, and bulk principal updates.

mod aggregate;
mod bulk;
mod clone;
mod restriction;
mod reviewers;

pub use aggregate::{
    AccessRow, GrantSources, MASTER_BRANCH_REF, RepositoryAccess, aggregate, collect_access, has_merge,
};
pub use bulk::{BulkOutcome, for_each_item, for_each_labeled, grant, unset};
pub use clone::{CloneOptions, clone_permissions, clone_restrictions};
pub use restriction::{MergeMode, apply_restriction, merge_restriction};
pub use reviewers::{ReviewersChange, apply_default_reviewers, merge_reviewers};
