use crate::error::{Error, Result};
use crate::types::{BranchRef, BranchingModel, PullRequestSettings, SonarSettings};

/// Pull request settings to overwrite. Unset fields keep their remote value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestUpdate {
    pub required_approvers: Option<u32>,
    pub required_successful_builds: Option<u32>,
    pub required_all_approvers: Option<bool>,
    pub required_all_tasks_complete: Option<bool>,
    pub unapprove_on_update: Option<bool>,
}

impl PullRequestUpdate {
    pub fn apply(&self, settings: &mut PullRequestSettings) {
        if let Some(n) = self.required_approvers {
            settings.required_approvers = n;
        }
        if let Some(n) = self.required_successful_builds {
            settings.required_successful_builds = n;
        }
        if let Some(b) = self.required_all_approvers {
            settings.required_all_approvers = b;
        }
        if let Some(b) = self.required_all_tasks_complete {
            settings.required_all_tasks_complete = b;
        }
        if let Some(b) = self.unapprove_on_update {
            settings.unapprove_on_update = b;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchTypeId {
    Bugfix,
    Feature,
    Hotfix,
    Release,
}

impl BranchTypeId {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "BUGFIX" => Some(Self::Bugfix),
            "FEATURE" => Some(Self::Feature),
            "HOTFIX" => Some(Self::Hotfix),
            "RELEASE" => Some(Self::Release),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchTypeUpdate {
    pub enabled: bool,
    /// New prefix; `None` keeps the current one.
    pub prefix: Option<String>,
}

/// Desired branching model. Every known branch type is set to its `enabled`
/// flag, so a type left out is disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchingModelUpdate {
    pub development_ref: Option<String>,
    pub production_ref: Option<String>,
    pub bugfix: BranchTypeUpdate,
    pub feature: BranchTypeUpdate,
    pub hotfix: BranchTypeUpdate,
    pub release: BranchTypeUpdate,
}

impl BranchingModelUpdate {
    fn for_type(&self, id: BranchTypeId) -> &BranchTypeUpdate {
        match id {
            BranchTypeId::Bugfix => &self.bugfix,
            BranchTypeId::Feature => &self.feature,
            BranchTypeId::Hotfix => &self.hotfix,
            BranchTypeId::Release => &self.release,
        }
    }

    /// Applies the update in place. Fails without touching `model` when it
    /// holds a branch type this tool does not know.
    pub fn apply(&self, model: &mut BranchingModel) -> Result<()> {
        if let Some(unknown) = model.types.iter().find(|t| BranchTypeId::from_id(&t.id).is_none()) {
            return Err(Error::UnsupportedBranchType(unknown.id.clone()));
        }

        if let Some(ref_id) = &self.development_ref {
            model.development = BranchRef {
                ref_id: Some(ref_id.clone()),
                use_default: false,
            };
        }
        if let Some(ref_id) = &self.production_ref {
            model.production = Some(BranchRef {
                ref_id: Some(ref_id.clone()),
                use_default: false,
            });
        }

        for branch_type in &mut model.types {
            let Some(id) = BranchTypeId::from_id(&branch_type.id) else {
                continue;
            };
            let update = self.for_type(id);
            branch_type.enabled = update.enabled;
            if let Some(prefix) = update.prefix.as_deref().filter(|p| !p.is_empty()) {
                branch_type.prefix = prefix.to_string();
            }
        }
        Ok(())
    }
}

/// Sonar project settings to write. Flags are always written; text values
/// only when given and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SonarUpdate {
    pub enabled: bool,
    pub master_project_key: Option<String>,
    pub project_base_key: Option<String>,
    pub analysis_mode: Option<String>,
    pub use_branch_feature: bool,
    pub show_issues_in_source: bool,
    pub show_only_new_or_changed_lines: bool,
    pub illegal_branch_char_replacement: Option<String>,
    pub project_cleanup_enabled: bool,
}

impl SonarUpdate {
    pub fn apply(&self, settings: &mut SonarSettings) {
        fn set_text(target: &mut String, value: Option<&String>) {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                target.clone_from(v);
            }
        }

        let project = &mut settings.project;
        project.sonar_enabled = self.enabled;
        project.use_sonar_branch_feature = self.use_branch_feature;
        project.show_issues_in_source = self.show_issues_in_source;
        project.show_only_new_or_changed_lines = self.show_only_new_or_changed_lines;
        project.project_cleanup_enabled = self.project_cleanup_enabled;
        set_text(&mut project.master_project_key, self.master_project_key.as_ref());
        set_text(&mut project.project_base_key, self.project_base_key.as_ref());
        set_text(&mut project.analysis_mode, self.analysis_mode.as_ref());
        set_text(
            &mut project.illegal_branch_char_replacement,
            self.illegal_branch_char_replacement.as_ref(),
        );
    }
}
