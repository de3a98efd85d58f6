//! Options for a reconciliation pass

use fsstate_fs::RobustnessConfig;

/// How rule paths may relate to their base directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PathPolicy {
    /// Every rule must resolve to an entry strictly inside its base
    /// directory. Absolute rule paths are rejected; `..` segments are allowed
    /// as long as the resolved target stays inside.
    #[default]
    Confined,
    /// Rule paths may leave the base directory. An absolute rule path
    /// replaces the base.
    Unrestricted,
}

/// Options for a reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    pub path_policy: PathPolicy,
    /// Settings for file content writes.
    pub robustness: RobustnessConfig,
}

impl ApplyOptions {
    pub fn with_path_policy(mut self, path_policy: PathPolicy) -> Self {
        self.path_policy = path_policy;
        self
    }

    pub fn with_robustness(mut self, robustness: RobustnessConfig) -> Self {
        self.robustness = robustness;
        self
    }
}
