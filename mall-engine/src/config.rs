//! Engine configuration.
//!
//! Everything is read from environment variables with sensible
//! defaults, so a bare `Config::from_env()` works in development.
//!
//! | Variable         | Default      | Purpose                                   |
//! |------------------|--------------|-------------------------------------------|
//! | `MALL_WORK_DIR`  | `./work_dir` | Data directory (database and logs)        |
//! | `MALL_LOG_LEVEL` | `info`       | Log filter when `RUST_LOG` is unset       |
//! | `MALL_LOG_JSON`  | `false`      | JSON log output (enable in production)    |
//! | `MALL_ENV`       | `development`| `production` enables file logging         |

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: PathBuf,
    pub log_level: String,
    pub log_json: bool,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            work_dir: env::var("MALL_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./work_dir")),
            log_level: env::var("MALL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: env::var("MALL_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            environment: env::var("MALL_ENV").unwrap_or_else(|_| "development".to_string()),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.work_dir.join("mall.redb")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.work_dir.join("logs")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
