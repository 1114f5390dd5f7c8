//! In-memory state store implementation.

use chrono::{Local, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use thiserror::Error;

use super::models::{Bot, BotStatus, Visitor};

/// Store error types.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Bot not found: {0}")]
    BotNotFound(String),
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
}

/// Process-lifetime store for the bot map and the visitor log.
///
/// Constructed once at startup and shared as `Arc<StateStore>`; all state is
/// transient and resets on process restart.
pub struct StateStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    bots: HashMap<String, Bot>,
    visitors: Vec<Visitor>,
}

/// Timestamp format used for `lastUpdate` fields.
fn now_stamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M").to_string()
}

/// The fixed default set of monitored bots.
pub fn default_bots() -> Vec<Bot> {
    let stamp = now_stamp();
    [
        ("bot-1", "Ricochet", 98.5),
        ("bot-2", "Custom Bot Hosting", 99.2),
        ("bot-3", "Ricochet API", 85.3),
        ("bot-4", "Server", 92.1),
    ]
    .into_iter()
    .map(|(id, name, uptime)| Bot {
        id: id.to_string(),
        name: name.to_string(),
        status: BotStatus::Online,
        last_update: stamp.clone(),
        uptime,
    })
    .collect()
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// All bots, seeding the default set when the map is empty.
    ///
    /// Sorted by id so the order is stable across calls.
    pub fn list_bots(&self) -> Vec<Bot> {
        let mut inner = self.inner.lock().unwrap();
        if inner.bots.is_empty() {
            for bot in default_bots() {
                inner.bots.insert(bot.id.clone(), bot);
            }
        }
        let mut bots: Vec<Bot> = inner.bots.values().cloned().collect();
        bots.sort_by(|a, b| a.id.cmp(&b.id));
        bots
    }

    /// Set a bot's status, stamping `lastUpdate` with the current time.
    ///
    /// The previous status is not retained; no history is kept server-side.
    pub fn update_bot(&self, id: &str, status: &str) -> Result<Bot, StoreError> {
        let status =
            BotStatus::parse(status).ok_or_else(|| StoreError::InvalidStatus(status.to_string()))?;

        let mut inner = self.inner.lock().unwrap();
        let bot = inner
            .bots
            .get_mut(id)
            .ok_or_else(|| StoreError::BotNotFound(id.to_string()))?;
        bot.status = status;
        bot.last_update = now_stamp();
        Ok(bot.clone())
    }

    /// Append a visitor row unless the address is loopback.
    ///
    /// Never fails; visit recording must not block the parent request.
    pub fn record_visit(&self, ip: &str, user_agent: &str) {
        if let Ok(addr) = ip.parse::<IpAddr>() {
            if addr.is_loopback() {
                return;
            }
        }
        let mut inner = self.inner.lock().unwrap();
        inner.visitors.push(Visitor {
            ip: ip.to_string(),
            timestamp: Utc::now(),
            user_agent: user_agent.to_string(),
        });
    }

    /// One entry per distinct ip, keeping the most recently recorded row.
    pub fn list_visitors(&self) -> Vec<Visitor> {
        let inner = self.inner.lock().unwrap();
        let mut latest: HashMap<&str, &Visitor> = HashMap::new();
        for visitor in &inner.visitors {
            latest.insert(visitor.ip.as_str(), visitor);
        }
        let mut visitors: Vec<Visitor> = latest.into_values().cloned().collect();
        visitors.sort_by_key(|v| v.timestamp);
        visitors
    }
}
