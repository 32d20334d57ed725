use serde::{Deserialize, Serialize};

/// An external analysis script, invoked by name with no arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub name: String,
    /// Path to the script or executable. `~` is expanded.
    pub command: String,
    /// Optional interpreter, e.g. `python3`, so scripts need no exec bit.
    #[serde(default)]
    pub interpreter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub scripts: Vec<ScriptEntry>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            scripts: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ToolsConfig {
    pub fn find(&self, name: &str) -> Option<&ScriptEntry> {
        self.scripts
            .iter()
            .find(|script| script.name.eq_ignore_ascii_case(name))
    }
}
