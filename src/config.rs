use anyhow::{Context, Result, anyhow};
use std::env;

use crate::services::entitlement::SeniorityTable;
use crate::services::routing::CeoLeavePolicy;

pub const DEFAULT_BASE_ALLOWANCE: i64 = 25;
pub const DEFAULT_SENIORITY_TIERS: &str = "5:2,10:4,15:6";
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub client_base_url: String,
    pub leave: LeavePolicy,
    pub max_page_size: u32,
}

/// Tunable leave rules. Changing these never requires touching the engine.
#[derive(Debug, Clone)]
pub struct LeavePolicy {
    pub default_base_allowance: i64,
    pub seniority: SeniorityTable,
    pub ceo_leave_policy: CeoLeavePolicy,
    pub final_authority_override: bool,
}

impl Default for LeavePolicy {
    fn default() -> Self {
        Self {
            default_base_allowance: DEFAULT_BASE_ALLOWANCE,
            seniority: SeniorityTable::default(),
            ceo_leave_policy: CeoLeavePolicy::default(),
            final_authority_override: true,
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("{} must be a boolean, got '{}'", key, other)),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env_only()
    }

    /// Load configuration from environment variables only (without loading .env files)
    /// This is useful for testing where you want to control the environment directly
    pub fn from_env_only() -> Result<Self> {
        let leave = LeavePolicy {
            default_base_allowance: var_or(
                "DEFAULT_BASE_ALLOWANCE",
                &DEFAULT_BASE_ALLOWANCE.to_string(),
            )
            .parse()
            .context("DEFAULT_BASE_ALLOWANCE must be an integer")?,
            seniority: var_or("SENIORITY_TIERS", DEFAULT_SENIORITY_TIERS)
                .parse()
                .map_err(|e: String| anyhow!("SENIORITY_TIERS: {}", e))?,
            ceo_leave_policy: var_or("CEO_LEAVE_POLICY", "self_assign")
                .parse()
                .map_err(|e: String| anyhow!("CEO_LEAVE_POLICY: {}", e))?,
            final_authority_override: parse_bool(
                "FINAL_AUTHORITY_OVERRIDE",
                &var_or("FINAL_AUTHORITY_OVERRIDE", "true"),
            )?,
        };

        if leave.default_base_allowance < 0 {
            return Err(anyhow!("DEFAULT_BASE_ALLOWANCE must not be negative"));
        }

        Ok(Config {
            database_url: var_or("DATABASE_URL", "sqlite:./leave_portal.db"),
            jwt_secret: var_or(
                "JWT_SECRET",
                "your-super-secret-jwt-key-change-this-in-production-12345",
            ),
            host: var_or("HOST", "127.0.0.1"),
            port: var_or("PORT", "8080").parse().unwrap_or(8080),
            environment: var_or("ENVIRONMENT", "development"),
            client_base_url: var_or("CLIENT_BASE_URL", "http://localhost:3000"),
            leave,
            max_page_size: var_or("MAX_PAGE_SIZE", &DEFAULT_MAX_PAGE_SIZE.to_string())
                .parse()
                .context("MAX_PAGE_SIZE must be a positive integer")?,
        })
    }

    pub fn test_config() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-jwt-secret-key-that-is-long-enough".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            client_base_url: "http://localhost:3000".to_string(),
            leave: LeavePolicy::default(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_accept_common_spellings() {
        for value in ["1", "true", "YES", " on "] {
            assert!(parse_bool("FLAG", value).unwrap());
        }
        for value in ["0", "False", "no", "off"] {
            assert!(!parse_bool("FLAG", value).unwrap());
        }

        let err = parse_bool("FLAG", "sometimes").unwrap_err();
        assert!(err.to_string().contains("FLAG"));
    }

    #[test]
    fn test_config_uses_default_policy() {
        let config = Config::test_config();

        assert!(!config.is_production());
        assert_eq!(config.leave.default_base_allowance, DEFAULT_BASE_ALLOWANCE);
        assert!(config.leave.final_authority_override);
    }
}
