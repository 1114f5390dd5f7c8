//! Core data types shared between the store and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a monitored bot. Operator-asserted, never probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    Online,
    Offline,
    Restarting,
}

impl BotStatus {
    /// Lowercase wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            BotStatus::Online => "online",
            BotStatus::Offline => "offline",
            BotStatus::Restarting => "restarting",
        }
    }

    /// Capitalized display label.
    pub fn label(&self) -> &'static str {
        match self {
            BotStatus::Online => "Online",
            BotStatus::Offline => "Offline",
            BotStatus::Restarting => "Restarting",
        }
    }

    /// Parse the lowercase wire form.
    pub fn parse(s: &str) -> Option<BotStatus> {
        match s {
            "online" => Some(BotStatus::Online),
            "offline" => Some(BotStatus::Offline),
            "restarting" => Some(BotStatus::Restarting),
            _ => None,
        }
    }
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A monitored bot record.
///
/// `uptime` is a static seed value and is never recomputed from recorded
/// events or downtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bot {
    pub id: String,
    pub name: String,
    pub status: BotStatus,
    pub last_update: String,
    pub uptime: f64,
}

/// One inbound request from a non-loopback address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visitor {
    pub ip: String,
    pub timestamp: DateTime<Utc>,
    pub user_agent: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in ["online", "offline", "restarting"] {
            let status = BotStatus::parse(s).unwrap();
            assert_eq!(status.as_str(), s);
        }
        assert!(BotStatus::parse("rebooting").is_none());
        assert!(BotStatus::parse("Online").is_none());
    }

    #[test]
    fn test_bot_wire_shape() {
        let bot = Bot {
            id: "bot-1".to_string(),
            name: "Ricochet".to_string(),
            status: BotStatus::Online,
            last_update: "2026-08-29 10:15".to_string(),
            uptime: 98.5,
        };
        let value = serde_json::to_value(&bot).unwrap();
        assert_eq!(value["status"], "online");
        assert_eq!(value["lastUpdate"], "2026-08-29 10:15");
        assert_eq!(value["uptime"], 98.5);
    }

    #[test]
    fn test_visitor_wire_shape() {
        let visitor = Visitor {
            ip: "203.0.113.5".to_string(),
            timestamp: Utc::now(),
            user_agent: "curl/8.0".to_string(),
        };
        let value = serde_json::to_value(&visitor).unwrap();
        assert_eq!(value["userAgent"], "curl/8.0");
        assert!(value["timestamp"].is_string());
    }
}
