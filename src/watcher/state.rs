//! Local view state and event/downtime derivation.
//!
//! Events and downtime records are derived here and only here; the server
//! never sees them.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::store::{default_bots, Bot, BotStatus};

/// Severity tier for a day's downtime record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StatusChange,
    Restart,
    Error,
    Recovery,
}

/// Immutable log entry for one observed status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub message: String,
    pub details: String,
}

/// Per-day aggregate of offline incidents for one bot.
///
/// `totalDowntime` is minutes and stays 0 unless set externally; it is not
/// computed from elapsed time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DowntimeRecord {
    pub date: String,
    pub incidents: u32,
    pub total_downtime: u32,
    pub affected_services: Vec<String>,
    pub severity: Severity,
}

pub type EventMap = HashMap<String, Vec<Event>>;
pub type DowntimeMap = HashMap<String, Vec<DowntimeRecord>>;

/// One empty list per known bot id.
pub fn empty_map_for<T>(bots: &[Bot]) -> HashMap<String, Vec<T>> {
    bots.iter().map(|b| (b.id.clone(), Vec::new())).collect()
}

fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

fn event_stamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn event_id() -> String {
    // Millisecond stamps collide for rapid transitions; the suffix keeps
    // ids unique within the same instant.
    format!(
        "event-{}-{:04x}",
        Local::now().timestamp_millis(),
        rand::random::<u16>()
    )
}

/// In-memory view of the monitored bots plus derived records.
#[derive(Debug)]
pub struct MonitorState {
    pub bots: Vec<Bot>,
    pub events: EventMap,
    pub downtime: DowntimeMap,
}

impl MonitorState {
    /// Fallback state used until the first successful poll.
    pub fn new() -> Self {
        let bots = default_bots();
        let events = empty_map_for(&bots);
        let downtime = empty_map_for(&bots);
        Self {
            bots,
            events,
            downtime,
        }
    }

    /// Replace the bot list wholesale after a successful poll. An empty
    /// list is ignored so the previous state survives.
    pub fn apply_bots(&mut self, bots: Vec<Bot>) {
        if !bots.is_empty() {
            self.bots = bots;
        }
    }

    pub fn bot(&self, id: &str) -> Option<&Bot> {
        self.bots.iter().find(|b| b.id == id)
    }

    /// Swap in the server's post-update record for one bot.
    pub fn replace_bot(&mut self, bot: Bot) {
        if let Some(slot) = self.bots.iter_mut().find(|b| b.id == bot.id) {
            *slot = bot;
        }
    }

    /// Append the event for an observed transition and, when the bot moved
    /// into offline from a non-offline status, roll today's downtime record.
    ///
    /// Same-state transitions still produce an event but never touch
    /// downtime.
    pub fn record_transition(&mut self, bot_id: &str, old: BotStatus, new: BotStatus) {
        let event = Event {
            id: event_id(),
            timestamp: event_stamp(),
            kind: EventKind::StatusChange,
            message: format!("Status changed to {}", new.label()),
            details: format!("Changed from {} to {}", old, new),
        };
        self.events
            .entry(bot_id.to_string())
            .or_default()
            .insert(0, event);

        if new == BotStatus::Offline && old != BotStatus::Offline {
            self.record_incident(bot_id, &today());
        }
    }

    /// Create or increment the downtime record for the given day.
    fn record_incident(&mut self, bot_id: &str, date: &str) {
        let records = self.downtime.entry(bot_id.to_string()).or_default();
        match records.iter_mut().find(|r| r.date == date) {
            Some(record) => {
                record.incidents += 1;
                record.severity = if record.incidents >= 3 {
                    Severity::High
                } else {
                    Severity::Medium
                };
            }
            None => {
                records.insert(
                    0,
                    DowntimeRecord {
                        date: date.to_string(),
                        incidents: 1,
                        total_downtime: 0,
                        affected_services: vec!["Unknown Service".to_string()],
                        severity: Severity::Low,
                    },
                );
            }
        }
    }
}
