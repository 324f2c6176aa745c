use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Association between one device and the code it consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceBinding {
    pub device_id: String,
    pub activation_code: String,
    /// Snapshot of the code's plan at activation time.
    pub plan: String,
    pub activated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl DeviceBinding {
    /// A binding is active strictly before its expiry instant; at
    /// `expires_at` itself it is already expired.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> ActivationState {
        if self.is_active_at(now) {
            ActivationState::Activated
        } else {
            ActivationState::Expired
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationState {
    Unactivated,
    Activated,
    Expired,
}
