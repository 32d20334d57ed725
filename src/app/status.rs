use chrono::Utc;
use herald::config::{Config, PlatformsFile};
use herald::engine::{activity_snapshot, status_report};
use herald::storage::{HistoryStore, StateStore};

pub fn render_stats(config: &Config) -> String {
    let now = Utc::now();
    let state_dir = config.state_dir();
    let state = StateStore::new(&state_dir).load(now);
    let snapshot = activity_snapshot(&HistoryStore::new(&state_dir), now);

    let mut lines = vec![
        "◆ herald".to_string(),
        String::new(),
        format!("Version:        {}", env!("CARGO_PKG_VERSION")),
        format!("Workspace:      {}", config.workspace_dir.display()),
        format!("Config:         {}", config.config_path.display()),
        format!(
            "Oracle:         {} / {}",
            config.default_provider.as_deref().unwrap_or("openrouter"),
            config.default_model.as_deref().unwrap_or("(default)")
        ),
    ];

    let platforms = PlatformsFile::load_or_empty(&config.platforms_path());
    if platforms.platforms.is_empty() {
        lines.push("Platforms:      none (run `herald init`)".to_string());
    } else {
        lines.push("Platforms:".to_string());
        for platform in &platforms.platforms {
            lines.push(format!(
                "  {:<14}{} ({})",
                platform.name,
                platform.base_url,
                if platform.enabled { "enabled" } else { "disabled" }
            ));
        }
    }

    lines.push(String::new());
    lines.push(status_report(&state, snapshot, now));
    lines.join("\n")
}
