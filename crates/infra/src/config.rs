//! Runtime configuration loaded from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `CLUBLEDGER_BIND` | `127.0.0.1:8080` |
//! | `CLUBLEDGER_SWEEP_TIMES` | `22:00,23:00` (UTC) |
//! | `CLUBLEDGER_ACTIVITY_RETENTION_DAYS` | `180` |
//! | `CLUBLEDGER_RETENTION_TIME` | `03:00` (UTC) |
//! | `CLUBLEDGER_CONFLICT_RETRIES` | `5` |
//! | `CLUBLEDGER_SCHEDULER_POLL_MS` | `1000` |
//! | `CLUBLEDGER_PRINCIPALS` | empty |
//!
//! `CLUBLEDGER_PRINCIPALS` is a comma separated list of
//! `email:role|role[:member_uuid]`, e.g.
//! `ada@club.org:treasurer,bo@club.org:member:0190...`.

use std::net::SocketAddr;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use thiserror::Error;

use clubledger_auth::{Principal, Role};
use clubledger_core::MemberId;

use crate::jobs::DailySchedule;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_SWEEP_TIMES: &str = "22:00,23:00";
pub const DEFAULT_RETENTION_DAYS: i64 = 180;
pub const DEFAULT_RETENTION_TIME: &str = "03:00";
pub const DEFAULT_CONFLICT_RETRIES: u32 = 5;
pub const DEFAULT_SCHEDULER_POLL_MS: u64 = 1000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub bind_addr: SocketAddr,
    pub sweep_schedule: DailySchedule,
    pub retention: ChronoDuration,
    pub retention_schedule: DailySchedule,
    /// Attempts per command when the stream moves under us.
    pub conflict_retries: u32,
    pub scheduler_poll: Duration,
    pub principals: Vec<Principal>,
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; missing or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind = get("CLUBLEDGER_BIND", DEFAULT_BIND);
        let bind_addr = bind
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("CLUBLEDGER_BIND", &bind, e))?;

        let sweep = get("CLUBLEDGER_SWEEP_TIMES", DEFAULT_SWEEP_TIMES);
        let sweep_schedule = DailySchedule::parse(&sweep)
            .map_err(|e| ConfigError::invalid("CLUBLEDGER_SWEEP_TIMES", &sweep, e))?;

        let days = get("CLUBLEDGER_ACTIVITY_RETENTION_DAYS", &DEFAULT_RETENTION_DAYS.to_string());
        let retention_days = days
            .parse::<i64>()
            .map_err(|e| ConfigError::invalid("CLUBLEDGER_ACTIVITY_RETENTION_DAYS", &days, e))?;
        if retention_days < 1 {
            return Err(ConfigError::invalid(
                "CLUBLEDGER_ACTIVITY_RETENTION_DAYS",
                &days,
                "must be at least 1",
            ));
        }

        let retention_time = get("CLUBLEDGER_RETENTION_TIME", DEFAULT_RETENTION_TIME);
        let retention_schedule = DailySchedule::parse(&retention_time)
            .map_err(|e| ConfigError::invalid("CLUBLEDGER_RETENTION_TIME", &retention_time, e))?;

        let retries = get("CLUBLEDGER_CONFLICT_RETRIES", &DEFAULT_CONFLICT_RETRIES.to_string());
        let conflict_retries = retries
            .parse::<u32>()
            .map_err(|e| ConfigError::invalid("CLUBLEDGER_CONFLICT_RETRIES", &retries, e))?;
        if conflict_retries == 0 {
            return Err(ConfigError::invalid("CLUBLEDGER_CONFLICT_RETRIES", &retries, "must be at least 1"));
        }

        let poll = get("CLUBLEDGER_SCHEDULER_POLL_MS", &DEFAULT_SCHEDULER_POLL_MS.to_string());
        let poll_ms = poll
            .parse::<u64>()
            .map_err(|e| ConfigError::invalid("CLUBLEDGER_SCHEDULER_POLL_MS", &poll, e))?;
        if poll_ms == 0 {
            return Err(ConfigError::invalid("CLUBLEDGER_SCHEDULER_POLL_MS", &poll, "must be positive"));
        }

        let principals = parse_principals(&get("CLUBLEDGER_PRINCIPALS", ""))?;

        Ok(Self {
            bind_addr,
            sweep_schedule,
            retention: ChronoDuration::days(retention_days),
            retention_schedule,
            conflict_retries,
            scheduler_poll: Duration::from_millis(poll_ms),
            principals,
        })
    }
}

/// Parse `email:role|role[:member_uuid]` entries separated by commas.
pub fn parse_principals(raw: &str) -> Result<Vec<Principal>, ConfigError> {
    const KEY: &str = "CLUBLEDGER_PRINCIPALS";

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(3, ':');
            let email = parts.next().unwrap_or_default().trim();
            let roles = parts.next().unwrap_or_default();
            let member = parts.next();

            if email.is_empty() || !email.contains('@') {
                return Err(ConfigError::invalid(KEY, entry, "expected an email address"));
            }

            let roles: Vec<Role> = roles
                .split('|')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(|r| Role::new(r.to_ascii_lowercase()))
                .collect();
            if roles.is_empty() {
                return Err(ConfigError::invalid(KEY, entry, "at least one role is required"));
            }

            let display_name = email.split('@').next().unwrap_or(email);
            let mut principal = Principal::new(display_name, email.to_ascii_lowercase(), roles);

            if let Some(m) = member {
                let member_id = m
                    .trim()
                    .parse::<MemberId>()
                    .map_err(|e| ConfigError::invalid(KEY, entry, e))?;
                principal = principal.with_member(member_id);
            }
            Ok(principal)
        })
        .collect()
}
