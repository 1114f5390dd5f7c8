//! Reconciliation client.
//!
//! Polls a botwatch server on a fixed cadence, mirrors its bot list, and
//! derives event-log entries and downtime aggregates from status-update
//! actions. Derived records are persisted best-effort after every change.

mod api;
mod persist;
mod state;

pub use api::{ApiClient, ApiError};
pub use persist::{FileStore, DOWNTIME_KEY, EVENTS_KEY};
pub use state::{
    DowntimeMap, DowntimeRecord, Event, EventKind, EventMap, MonitorState, Severity,
};

use crate::config::Config;
use crate::store::{default_bots, Bot, BotStatus};

use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

/// Watcher error types.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Unknown bot: {0}")]
    UnknownBot(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Client-side monitor for one remote botwatch server.
pub struct Watcher {
    state: Arc<Mutex<MonitorState>>,
    api: ApiClient,
    persist: FileStore,
    poll_interval: Duration,
    stop_tx: broadcast::Sender<()>,
}

impl Watcher {
    /// Create a watcher for the given base URL.
    ///
    /// Bots start as the fixed fallback list; event and downtime maps start
    /// as one empty list per fallback bot, overlaid with whatever was
    /// previously persisted (malformed blobs fall back to the defaults).
    pub fn new(base_url: &str, config: &Config) -> Result<Self, WatchError> {
        let api = ApiClient::new(base_url, config.request_timeout)?;
        let persist = FileStore::new(&config.state_dir);

        let bots = default_bots();
        let events = persist.load_or(EVENTS_KEY, state::empty_map_for(&bots));
        let downtime = persist.load_or(DOWNTIME_KEY, state::empty_map_for(&bots));
        let state = MonitorState {
            bots,
            events,
            downtime,
        };

        let (stop_tx, _) = broadcast::channel(1);

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            api,
            persist,
            poll_interval: config.poll_interval,
            stop_tx,
        })
    }

    /// Start the poll loop: one immediate fetch, then one per interval.
    ///
    /// A failed poll keeps the previous state and waits for the next tick.
    pub fn start(&self) {
        let api = self.api.clone();
        let state = self.state.clone();
        let mut stop_rx = self.stop_tx.subscribe();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = stop_rx.recv() => {
                        break;
                    }
                    _ = interval.tick() => {
                        // A stop during an in-flight fetch discards the
                        // response instead of applying it late.
                        tokio::select! {
                            _ = stop_rx.recv() => {
                                break;
                            }
                            result = api.fetch_bots() => match result {
                                Ok(bots) if !bots.is_empty() => {
                                    state.lock().unwrap().apply_bots(bots);
                                }
                                Ok(_) => {
                                    tracing::debug!("Poll returned no bots; keeping previous state");
                                }
                                Err(e) => {
                                    tracing::warn!("Poll failed: {}", e);
                                }
                            }
                        }
                    }
                }
            }
        });
    }

    /// Tear down the poll loop; in-flight results are discarded.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(());
    }

    /// Ask the server to set a bot's status, then fold the authoritative
    /// record back into local state and derive the event and downtime
    /// entries for the transition.
    ///
    /// Errors propagate to the caller; local state is untouched on failure.
    pub async fn update_status(
        &self,
        bot_id: &str,
        new_status: BotStatus,
    ) -> Result<Bot, WatchError> {
        let old_status = {
            let state = self.state.lock().unwrap();
            state
                .bot(bot_id)
                .map(|b| b.status)
                .ok_or_else(|| WatchError::UnknownBot(bot_id.to_string()))?
        };

        let bot = self.api.update_bot(bot_id, new_status).await?;

        let (events, downtime) = {
            let mut state = self.state.lock().unwrap();
            state.replace_bot(bot.clone());
            state.record_transition(bot_id, old_status, new_status);
            (state.events.clone(), state.downtime.clone())
        };

        self.persist_async(EVENTS_KEY, events);
        if new_status == BotStatus::Offline && old_status != BotStatus::Offline {
            self.persist_async(DOWNTIME_KEY, downtime);
        }

        Ok(bot)
    }

    /// Snapshot of the current bot list.
    pub fn bots(&self) -> Vec<Bot> {
        self.state.lock().unwrap().bots.clone()
    }

    /// Snapshot of the per-bot event logs.
    pub fn events(&self) -> EventMap {
        self.state.lock().unwrap().events.clone()
    }

    /// Snapshot of the per-bot downtime records.
    pub fn downtime(&self) -> DowntimeMap {
        self.state.lock().unwrap().downtime.clone()
    }

    /// Schedule an asynchronous durable write; failure is logged and does
    /// not roll back the in-memory mutation.
    fn persist_async<T: Serialize + Send + 'static>(&self, key: &'static str, value: T) {
        let persist = self.persist.clone();
        tokio::spawn(async move {
            persist.save(key, &value);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::spawn_test_server;
    use chrono::Local;

    fn test_config(state_dir: &std::path::Path) -> Config {
        let mut cfg = Config::default();
        cfg.state_dir = state_dir.to_str().unwrap().to_string();
        cfg.poll_interval = Duration::from_millis(20);
        cfg.request_timeout = Duration::from_millis(500);
        cfg
    }

    #[tokio::test]
    async fn test_offline_scenario_for_bot_3() {
        let (base, _store) = spawn_test_server().await;
        let tmp = tempfile::tempdir().unwrap();
        let watcher = Watcher::new(&base, &test_config(tmp.path())).unwrap();

        let bot = watcher
            .update_status("bot-3", BotStatus::Offline)
            .await
            .unwrap();
        assert_eq!(bot.id, "bot-3");
        assert_eq!(bot.status, BotStatus::Offline);

        let local = watcher
            .bots()
            .into_iter()
            .find(|b| b.id == "bot-3")
            .unwrap();
        assert_eq!(local.last_update, bot.last_update);

        let events = watcher.events();
        assert_eq!(events["bot-3"].len(), 1);
        assert_eq!(events["bot-3"][0].kind, EventKind::StatusChange);
        assert_eq!(events["bot-3"][0].message, "Status changed to Offline");

        let downtime = watcher.downtime();
        assert_eq!(downtime["bot-3"].len(), 1);
        assert_eq!(downtime["bot-3"][0].incidents, 1);
        assert_eq!(downtime["bot-3"][0].severity, Severity::Low);
        assert_eq!(
            downtime["bot-3"][0].date,
            Local::now().format("%Y-%m-%d").to_string()
        );
    }

    #[tokio::test]
    async fn test_poll_replaces_local_state() {
        let (base, store) = spawn_test_server().await;
        let tmp = tempfile::tempdir().unwrap();
        let watcher = Watcher::new(&base, &test_config(tmp.path())).unwrap();

        store.update_bot("bot-1", "offline").unwrap();

        watcher.start();
        tokio::time::sleep(Duration::from_millis(150)).await;
        watcher.stop();

        let bot1 = watcher
            .bots()
            .into_iter()
            .find(|b| b.id == "bot-1")
            .unwrap();
        assert_eq!(bot1.status, BotStatus::Offline);
    }

    #[tokio::test]
    async fn test_poll_failures_keep_previous_state() {
        // Nothing listens here, so every poll fails.
        let tmp = tempfile::tempdir().unwrap();
        let watcher = Watcher::new("http://127.0.0.1:1", &test_config(tmp.path())).unwrap();
        let before = watcher.bots();

        watcher.start();
        tokio::time::sleep(Duration::from_millis(150)).await;
        watcher.stop();

        assert_eq!(watcher.bots(), before);
    }

    #[tokio::test]
    async fn test_update_errors_propagate_and_leave_state_unchanged() {
        let (base, _store) = spawn_test_server().await;
        let tmp = tempfile::tempdir().unwrap();
        let watcher = Watcher::new(&base, &test_config(tmp.path())).unwrap();

        let err = watcher
            .update_status("bot-9", BotStatus::Offline)
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::UnknownBot(_)));
        assert!(watcher.events().values().all(|v| v.is_empty()));
        assert!(watcher.downtime().values().all(|v| v.is_empty()));
    }

    #[tokio::test]
    async fn test_derived_state_survives_restart() {
        let (base, _store) = spawn_test_server().await;
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_config(tmp.path());

        let watcher = Watcher::new(&base, &cfg).unwrap();
        watcher
            .update_status("bot-2", BotStatus::Offline)
            .await
            .unwrap();

        // Wait for the scheduled writes to land.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let reloaded = Watcher::new(&base, &cfg).unwrap();
        assert_eq!(reloaded.events()["bot-2"].len(), 1);
        assert_eq!(reloaded.downtime()["bot-2"][0].incidents, 1);
    }

    #[test]
    fn test_new_watcher_defaults_without_persisted_state() {
        let tmp = tempfile::tempdir().unwrap();
        let watcher = tokio_test::block_on(async {
            Watcher::new("http://127.0.0.1:1", &test_config(tmp.path())).unwrap()
        });

        assert_eq!(watcher.bots().len(), 4);
        let events = watcher.events();
        assert_eq!(events.len(), 4);
        assert!(events.values().all(|v| v.is_empty()));
    }
}
