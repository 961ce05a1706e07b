use crate::config::default_base_branch;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where and how the commit action publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Personal access token. Stored for the settings UI only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Working tree that gets committed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_folder: Option<PathBuf>,
    /// Branch commits target.
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
    /// Push to a fresh branch and link a pull-request compare page instead.
    #[serde(default)]
    pub create_pull_request: bool,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            project_folder: None,
            base_branch: default_base_branch(),
            create_pull_request: false,
        }
    }
}
