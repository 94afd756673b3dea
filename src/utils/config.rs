// src/utils/config.rs
//! Runtime configuration read from the environment (after `.env` loading).

use log::info;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::fusion::passes::{FusionPass, SourceKind};

/// Bounded retry for reaching the database at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Where the Postgres store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            dbname: "geo".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
        }
    }
}

impl DbSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("POSTGRES_HOST").unwrap_or(defaults.host),
            port: env::var("POSTGRES_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            dbname: env::var("POSTGRES_DB").unwrap_or(defaults.dbname),
            user: env::var("POSTGRES_USER").unwrap_or(defaults.user),
            password: env::var("POSTGRES_PASSWORD").unwrap_or(defaults.password),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub region_table_path: PathBuf,
    pub municipality_extract_path: PathBuf,
    pub lau2_extract_path: PathBuf,
    pub nuts3_extract_path: PathBuf,
    pub district_codes_extract_path: PathBuf,
    pub unmatched_log_dir: PathBuf,
    pub db: DbSettings,
    pub pool_size: u32,
    pub retry: RetryPolicy,
}

fn path_var(name: &str, default: &str) -> PathBuf {
    PathBuf::from(env::var(name).unwrap_or_else(|_| default.to_string()))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            region_table_path: PathBuf::from("data/region_districts.json"),
            municipality_extract_path: PathBuf::from("uzemni-samosprava_obce.csv"),
            lau2_extract_path: PathBuf::from("zuj-name.csv"),
            nuts3_extract_path: PathBuf::from("CIS0100_CS.csv"),
            district_codes_extract_path: PathBuf::from("CIS0101_CS.csv"),
            unmatched_log_dir: PathBuf::from("."),
            db: DbSettings::default(),
            pool_size: 10,
            retry: RetryPolicy::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = RetryPolicy::default();
        Self {
            region_table_path: path_var("REGION_TABLE_PATH", "data/region_districts.json"),
            municipality_extract_path: path_var(
                "MUNICIPALITY_EXTRACT_PATH",
                "uzemni-samosprava_obce.csv",
            ),
            lau2_extract_path: path_var("LAU2_EXTRACT_PATH", "zuj-name.csv"),
            nuts3_extract_path: path_var("NUTS3_EXTRACT_PATH", "CIS0100_CS.csv"),
            district_codes_extract_path: path_var("DISTRICT_CODES_EXTRACT_PATH", "CIS0101_CS.csv"),
            unmatched_log_dir: path_var("UNMATCHED_LOG_DIR", "."),
            db: DbSettings::from_env(),
            pool_size: env::var("POSTGRES_POOL_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            retry: RetryPolicy {
                attempts: env::var("DB_CONNECT_ATTEMPTS")
                    .unwrap_or_else(|_| defaults.attempts.to_string())
                    .parse()
                    .unwrap_or(defaults.attempts),
                backoff: env::var("DB_CONNECT_BACKOFF_SECS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.backoff),
            },
        }
    }

    /// Source extract feeding a fusion pass.
    pub fn extract_for(&self, pass: &FusionPass) -> &PathBuf {
        match pass.source {
            SourceKind::MunicipalityRegistry => &self.municipality_extract_path,
            SourceKind::ZujRegistry => &self.lau2_extract_path,
            SourceKind::RegionCodeTable => &self.nuts3_extract_path,
            SourceKind::DistrictCodeTable => &self.district_codes_extract_path,
        }
    }

    pub fn log_config(&self) {
        info!("📁 Source extracts:");
        info!("   Region table: {}", self.region_table_path.display());
        info!("   Municipalities/ICO: {}", self.municipality_extract_path.display());
        info!("   ZUJ/LAU2: {}", self.lau2_extract_path.display());
        info!("   NUTS3 (CIS0100): {}", self.nuts3_extract_path.display());
        info!("   LAU1/RUIAN (CIS0101): {}", self.district_codes_extract_path.display());
        info!("   Unmatched reports: {}", self.unmatched_log_dir.display());
        info!(
            "🔌 DB {}@{}:{}/{}, pool size {}, connect attempts {}, backoff {:?}",
            self.db.user,
            self.db.host,
            self.db.port,
            self.db.dbname,
            self.pool_size,
            self.retry.attempts,
            self.retry.backoff
        );
    }
}
