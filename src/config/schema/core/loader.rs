use super::Config;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::Path;

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        Self::load_or_init_in(&home.join(".herald"))
    }

    /// Load `config.toml` from `herald_dir`, writing defaults when absent.
    pub fn load_or_init_in(herald_dir: &Path) -> Result<Self> {
        let config_path = herald_dir.join("config.toml");
        let workspace_dir = herald_dir.join("workspace");

        if !herald_dir.exists() {
            fs::create_dir_all(herald_dir).context("Failed to create .herald directory")?;
        }
        fs::create_dir_all(workspace_dir.join("state"))
            .context("Failed to create workspace directory")?;

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path.clone_from(&config_path);
            config.workspace_dir = workspace_dir;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self {
                config_path,
                workspace_dir,
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}
