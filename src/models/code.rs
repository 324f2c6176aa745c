use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single-use activation code.
///
/// `redeemed_by` goes NULL → device id exactly once; revocation is the only
/// path back to NULL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationCode {
    pub code: String,
    /// Plan name, resolved against the configured plan table at activation.
    pub plan: String,
    pub redeemed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ActivationCode {
    pub fn is_redeemed(&self) -> bool {
        self.redeemed_by.is_some()
    }
}
