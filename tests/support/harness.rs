#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use herald::clock::{Clock, InstantSleeper, ManualClock, Sleeper};
use herald::config::{Config, PlatformConfig, PlatformsFile};
use herald::daemon::Heartbeat;
use herald::engine::{Agent, Ledger};
use herald::llm::{OracleRequest, Provider};
use herald::storage::{
    ActionHistoryRecord, AgentState, HistoryKind, HistoryStore, Journal,
};

pub const CHANNEL: &str = "moltbook";

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 14, 8, 0, 0).unwrap()
}

/// Replies in order, then repeats `fallback`. `None` entries fail the call.
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Option<String>>>,
    fallback: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedOracle {
    pub fn new(replies: &[&str], fallback: &str) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| Some((*r).to_string())).collect()),
            fallback: Some(fallback.to_string()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn always(reply: &str) -> Self {
        Self::new(&[], reply)
    }

    pub fn offline() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

impl Provider for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete<'a>(
        &'a self,
        request: &'a OracleRequest,
        _model: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        self.prompts.lock().unwrap().push(request.user_prompt.clone());
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        Box::pin(async move { next.ok_or_else(|| anyhow::anyhow!("oracle offline")) })
    }
}

/// An isolated workspace with a manual clock and a sleeper that never waits.
pub struct Workspace {
    pub tmp: TempDir,
    pub config: Config,
    pub clock: Arc<ManualClock>,
    pub sleeper: Arc<InstantSleeper>,
}

impl Workspace {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            workspace_dir: tmp.path().join("workspace"),
            config_path: tmp.path().join("config.toml"),
            ..Config::default()
        };
        std::fs::create_dir_all(config.state_dir()).unwrap();
        Self {
            tmp,
            config,
            clock: Arc::new(ManualClock::new(start())),
            sleeper: Arc::new(InstantSleeper::new()),
        }
    }

    pub fn with_platform(self, base_url: &str) -> Self {
        self.edit_platform(base_url, |_| {});
        self
    }

    pub fn edit_platform(&self, base_url: &str, edit: impl FnOnce(&mut PlatformConfig)) {
        let path = self.config.platforms_path();
        let mut file = PlatformsFile::load(&path).unwrap();
        let mut platform = PlatformConfig::new(CHANNEL, base_url, Some("test-key".into()));
        platform.username = Some("herald".into());
        edit(&mut platform);
        file.upsert(platform);
        file.save(&path).unwrap();
    }

    pub fn agent(&self, oracle: ScriptedOracle) -> Agent {
        Agent::new(
            self.config.clone(),
            Box::new(oracle),
            Arc::clone(&self.clock) as Arc<dyn Clock>,
            Arc::clone(&self.sleeper) as Arc<dyn Sleeper>,
        )
        .unwrap()
    }

    pub fn heartbeat(&self, oracle: ScriptedOracle) -> Heartbeat {
        Heartbeat::new(self.agent(oracle))
    }

    pub fn fresh_ledger(&self) -> Ledger {
        Ledger {
            state: AgentState::new(start()),
            journal: Journal::default(),
        }
    }

    pub fn history(&self) -> HistoryStore {
        HistoryStore::new(&self.config.state_dir())
    }

    pub fn seed_post(&self, id: &str, title: &str, content: &str, at: DateTime<Utc>) {
        self.history()
            .append(
                HistoryKind::Posts,
                ActionHistoryRecord {
                    id: id.into(),
                    channel: CHANNEL.into(),
                    title: title.into(),
                    content: content.into(),
                    fingerprint: herald::guard::fingerprint(content),
                    timestamp: at,
                    url: None,
                    target_id: None,
                },
            )
            .unwrap();
    }
}
