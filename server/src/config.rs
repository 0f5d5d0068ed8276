use chrono::{FixedOffset, Offset, Utc};
use clap::Parser;
use larder_common::countdown::DEFAULT_TRASH_RETENTION_DAYS;

#[derive(Debug, Clone, Parser)]
#[command(name = "larder-server", about = "Food expiry tracker API")]
pub struct ServerConfig {
    /// Address to bind.
    #[arg(long, env = "BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// HTTP port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Shared secret for edits and deletes on items far from expiry.
    /// Without it those operations fail rather than run unprotected.
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// PostgreSQL connection string. Items are kept in memory when unset.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Days a trashed item is kept before it is due for purge.
    #[arg(long, env = "TRASH_RETENTION_DAYS", default_value_t = DEFAULT_TRASH_RETENTION_DAYS)]
    pub trash_retention_days: u64,

    /// Purge trashed items once their retention runs out.
    #[arg(long, env = "AUTO_PURGE")]
    pub auto_purge: bool,

    /// Seconds between auto-purge passes.
    #[arg(long, env = "PURGE_INTERVAL_SECS", default_value_t = 3600)]
    pub purge_interval_secs: u64,

    /// Offset from UTC, in minutes, at which calendar days start.
    #[arg(
        long,
        env = "UTC_OFFSET_MINUTES",
        default_value_t = 0,
        allow_hyphen_values = true,
        value_parser = clap::value_parser!(i32).range(-1439..=1439)
    )]
    pub utc_offset_minutes: i32,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn day_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}
