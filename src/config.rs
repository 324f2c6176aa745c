use std::collections::HashMap;
use std::env;

/// Plan name → entitlement duration in days.
///
/// The plan set is deployment configuration, not a closed enum: codes carry
/// a plan name and the duration is resolved against this table at activation
/// time, so the table in effect when a device activates wins.
#[derive(Debug, Clone)]
pub struct PlanTable(HashMap<String, i64>);

impl PlanTable {
    pub fn new(days: HashMap<String, i64>) -> Self {
        Self(days)
    }

    pub fn contains(&self, plan: &str) -> bool {
        self.0.contains_key(plan)
    }

    pub fn duration_days(&self, plan: &str) -> Option<i64> {
        self.0.get(plan).copied()
    }

    pub fn duration(&self, plan: &str) -> Option<chrono::Duration> {
        self.duration_days(plan).map(chrono::Duration::days)
    }

    /// Plan names in stable order, for error messages and the admin surface.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for PlanTable {
    fn default() -> Self {
        Self(HashMap::from([
            ("monthly".to_string(), 30),
            ("quarterly".to_string(), 90),
            ("yearly".to_string(), 365),
            ("trial".to_string(), 7),
        ]))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// SHA-256 hex digest of the admin bearer token. None disables the
    /// admin surface entirely.
    pub admin_token_hash: Option<String>,
    pub plans: PlanTable,
    /// Upper bound on codes minted per generation request.
    pub generate_code_limit: i64,
    pub request_timeout_secs: u64,
    pub pool_size: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let plans = match env::var("PLAN_DURATIONS") {
            Ok(raw) => match serde_json::from_str::<HashMap<String, i64>>(&raw) {
                Ok(map) if !map.is_empty() => PlanTable::new(map),
                Ok(_) => {
                    tracing::warn!("PLAN_DURATIONS is empty, using default plan table");
                    PlanTable::default()
                }
                Err(err) => {
                    tracing::warn!(%err, "failed to parse PLAN_DURATIONS, using default plan table");
                    PlanTable::default()
                }
            },
            Err(_) => PlanTable::default(),
        };

        let generate_code_limit: i64 = env::var("GENERATE_CODE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        let request_timeout_secs: u64 = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let pool_size: u32 = env::var("POOL_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8);

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "glyphgate.db".to_string()),
            admin_token_hash: env::var("ADMIN_TOKEN_HASH").ok().filter(|h| !h.is_empty()),
            plans,
            generate_code_limit,
            request_timeout_secs,
            pool_size,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
