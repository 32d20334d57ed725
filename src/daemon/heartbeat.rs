use crate::config::TaskCategory;
use crate::engine::decision::is_failure;
use crate::engine::{Agent, Ledger, is_due};
use crate::storage::{JournalStore, StateStore};
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::watch;

/// Interval-gated tasks, in the order a cycle evaluates them.
const GATED_TASKS: [TaskCategory; 5] = [
    TaskCategory::Strategy,
    TaskCategory::Post,
    TaskCategory::Engagement,
    TaskCategory::Collaboration,
    TaskCategory::Analysis,
];

/// Owns the agent and its ledger for the life of the process.
///
/// State is loaded once here and written back after every cycle, so cycle
/// N+1 never observes a half-written cycle N.
pub struct Heartbeat {
    agent: Agent,
    states: StateStore,
    journals: JournalStore,
    ledger: Ledger,
}

impl Heartbeat {
    pub fn new(agent: Agent) -> Self {
        let state_dir = agent.config().state_dir();
        let states = StateStore::new(&state_dir);
        let journals = JournalStore::new(&state_dir);
        let ledger = Ledger {
            state: states.load(agent.clock().now()),
            journal: journals.load(),
        };
        Self {
            agent,
            states,
            journals,
            ledger,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// One heartbeat. Faults are recorded in the ledger, never raised.
    pub async fn run_cycle(&mut self) -> u64 {
        self.ledger.state.cycle_count += 1;
        let cycle = self.ledger.state.cycle_count;
        tracing::info!(cycle, "heartbeat");

        let outcome = AssertUnwindSafe(run_tasks(&self.agent, &mut self.ledger, cycle))
            .catch_unwind()
            .await;
        if outcome.is_err() {
            let now = self.agent.clock().now();
            tracing::error!(cycle, "heartbeat panicked");
            self.ledger
                .state
                .record_error(now, format!("cycle {cycle}: panic during heartbeat"));
        }

        self.persist();
        cycle
    }

    fn persist(&self) {
        if let Err(error) = self.states.save(&self.ledger.state) {
            tracing::error!(path = %self.states.path().display(), "saving agent state failed: {error:#}");
        }
        if let Err(error) = self.journals.save(&self.ledger.journal) {
            tracing::error!("saving journal failed: {error:#}");
        }
    }

    /// Run a cycle now, then one per period, until `max_cycles` or shutdown.
    ///
    /// Shutdown is honoured between cycles only. Returns the cycles run.
    pub async fn run(&mut self, max_cycles: Option<u64>, mut shutdown: watch::Receiver<bool>) -> u64 {
        let period = self.agent.config().heartbeat.period();
        let mut completed = 0;

        loop {
            let started = self.agent.clock().now();
            self.run_cycle().await;
            completed += 1;

            if max_cycles.is_some_and(|max| completed >= max) || *shutdown.borrow() {
                break;
            }

            let elapsed = (self.agent.clock().now() - started)
                .to_std()
                .unwrap_or_default();
            let pause = period.saturating_sub(elapsed);
            tracing::debug!(pause_secs = pause.as_secs(), "sleeping until next heartbeat");

            tokio::select! {
                () = self.agent.sleeper().sleep(pause) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
            if *shutdown.borrow() {
                break;
            }
        }
        tracing::info!(cycles = completed, "heartbeat loop stopped");
        completed
    }
}

async fn run_tasks(agent: &Agent, ledger: &mut Ledger, cycle: u64) {
    let schedule = &agent.config().schedule;

    for category in GATED_TASKS {
        let now = agent.clock().now();
        if !is_due(ledger.state.last_run(category), schedule.interval(category), now) {
            continue;
        }
        match agent.run_category(category, ledger).await {
            Ok(result) if is_failure(&result) => {
                tracing::warn!(%category, result = result.as_str(), "scheduled task failed");
                ledger
                    .state
                    .record_error(agent.clock().now(), format!("{category}: {result}"));
            }
            Ok(result) => tracing::info!(%category, result = result.as_str(), "scheduled task done"),
            Err(error) => {
                tracing::error!(%category, "scheduled task errored: {error:#}");
                ledger
                    .state
                    .record_error(agent.clock().now(), format!("{category}: {error:#}"));
            }
        }
    }

    if cycle % schedule.self_improvement_every.max(1) == 0 {
        agent.self_improvement(ledger);
    }
    if cycle % schedule.report_every.max(1) == 0 {
        agent.report(ledger);
    }

    match agent.decide_and_act(ledger).await {
        Ok(entry) if entry.success => tracing::info!(
            action = entry.action_type.as_str(),
            result = entry.result.as_str(),
            "cycle decision done"
        ),
        Ok(entry) => {
            tracing::warn!(
                action = entry.action_type.as_str(),
                result = entry.result.as_str(),
                "cycle decision failed"
            );
            ledger.state.record_error(
                agent.clock().now(),
                format!("{}: {}", entry.action_type, entry.result),
            );
        }
        Err(error) => {
            tracing::error!("cycle decision errored: {error:#}");
            ledger
                .state
                .record_error(agent.clock().now(), format!("decision: {error:#}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{InstantSleeper, ManualClock};
    use crate::config::Config;
    use crate::llm::{OracleRequest, Provider};
    use chrono::{TimeZone, Utc};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct RestingOracle;

    impl Provider for RestingOracle {
        fn name(&self) -> &str {
            "resting"
        }

        fn complete<'a>(
            &'a self,
            _request: &'a OracleRequest,
            _model: &'a str,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
            Box::pin(async { Ok(r#"{"reasoning":"nothing to do","action":"rest"}"#.to_string()) })
        }
    }

    fn heartbeat(tmp: &TempDir, sleeper: Arc<InstantSleeper>) -> Heartbeat {
        let config = Config {
            workspace_dir: tmp.path().to_path_buf(),
            ..Config::default()
        };
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 8, 1, 6, 0, 0).unwrap(),
        ));
        let agent = Agent::new(config, Box::new(RestingOracle), clock, sleeper).unwrap();
        Heartbeat::new(agent)
    }

    #[tokio::test]
    async fn runs_requested_cycles_with_full_pauses_between() {
        let tmp = TempDir::new().unwrap();
        let sleeper = Arc::new(InstantSleeper::new());
        let mut hb = heartbeat(&tmp, Arc::clone(&sleeper));
        let (_tx, rx) = watch::channel(false);

        let cycles = hb.run(Some(3), rx).await;

        assert_eq!(cycles, 3);
        assert_eq!(hb.ledger().state.cycle_count, 3);
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(30 * 60); 2]);
        assert_eq!(hb.ledger().state.counter("rest"), 3);
    }

    #[tokio::test]
    async fn shutdown_stops_after_current_cycle() {
        let tmp = TempDir::new().unwrap();
        let sleeper = Arc::new(InstantSleeper::new());
        let mut hb = heartbeat(&tmp, Arc::clone(&sleeper));
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        assert_eq!(hb.run(None, rx).await, 1);
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn state_survives_restart() {
        let tmp = TempDir::new().unwrap();
        let sleeper = Arc::new(InstantSleeper::new());
        let mut first = heartbeat(&tmp, Arc::clone(&sleeper));
        first.run_cycle().await;
        let saved = first.ledger().clone();

        let second = heartbeat(&tmp, sleeper);
        assert_eq!(second.ledger(), &saved);
    }
}
