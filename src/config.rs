//! Runtime configuration for the league server.

use once_cell::sync::Lazy;
use std::env;

use crate::membership::{ClanLeavePolicy, Policy};

#[derive(Debug)]
pub struct Settings {
    /// Size of the Postgres pool.
    pub db_max_connections: u32,
    /// What leaving a clan does to the player's teams in that clan.
    pub clan_leave_policy: ClanLeavePolicy,
    /// Whether an emptied team/clan takes its first pending requester in.
    pub promote_pending_on_empty: bool,
}

impl Settings {
    fn from_env() -> Self {
        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);

        let clan_leave_policy = env::var("CLAN_LEAVE_POLICY")
            .ok()
            .and_then(|v| match v.parse::<ClanLeavePolicy>() {
                Ok(p) => Some(p),
                Err(e) => {
                    log::warn!("{e}, falling back to cascade");
                    None
                }
            })
            .unwrap_or(ClanLeavePolicy::Cascade);

        let promote_pending_on_empty = env::var("PROMOTE_PENDING_ON_EMPTY")
            .ok()
            .and_then(|v| parse_flag(&v))
            .unwrap_or(true);

        Settings {
            db_max_connections,
            clan_leave_policy,
            promote_pending_on_empty,
        }
    }

    /// Engine policy derived from these settings.
    pub fn policy(&self) -> Policy {
        Policy {
            clan_leave: self.clan_leave_policy,
            promote_pending_on_empty: self.promote_pending_on_empty,
        }
    }
}

/// Accepts the usual spellings of an on/off switch.
pub fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);

pub fn settings() -> &'static Settings {
    &SETTINGS
}
