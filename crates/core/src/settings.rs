//! App-wide settings document.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::{self, PasswordError};
use crate::ledger::LedgerError;

/// Number of bags in one ton. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct BagsPerTon(Decimal);

impl BagsPerTon {
    /// Validates and wraps a conversion factor.
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidBagsPerTon(value))
        }
    }

    /// Returns the conversion factor.
    #[must_use]
    pub const fn get(self) -> Decimal {
        self.0
    }
}

impl Default for BagsPerTon {
    fn default() -> Self {
        Self(Decimal::from(20))
    }
}

impl TryFrom<Decimal> for BagsPerTon {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BagsPerTon> for Decimal {
    fn from(value: BagsPerTon) -> Self {
        value.0
    }
}

/// The singleton `settings` document.
///
/// `bagsPerTon` has no serde default: a document without it takes the
/// configured default from the settings repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Bags-per-ton conversion used by GL/GV billing.
    pub bags_per_ton: BagsPerTon,
    /// Argon2id PHC hash of the password gating the reports screen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports_password_hash: Option<String>,
}

impl Settings {
    /// Returns true if a reports password is set.
    #[must_use]
    pub const fn reports_locked(&self) -> bool {
        self.reports_password_hash.is_some()
    }

    /// Replaces the reports password. `None` or an empty string clears it.
    pub fn set_reports_password(&mut self, password: Option<&str>) -> Result<(), PasswordError> {
        self.reports_password_hash = match password.filter(|password| !password.is_empty()) {
            Some(password) => Some(auth::hash_password(password)?),
            None => None,
        };
        Ok(())
    }

    /// Returns true if `attempt` unlocks the reports screen. No password means unlocked.
    pub fn unlocks_reports(&self, attempt: &str) -> Result<bool, PasswordError> {
        match &self.reports_password_hash {
            Some(hash) => auth::verify_password(attempt, hash),
            None => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bags_per_ton_rejects_non_positive() {
        assert!(BagsPerTon::new(dec!(20)).is_ok());
        assert_eq!(
            BagsPerTon::new(dec!(0)),
            Err(LedgerError::InvalidBagsPerTon(dec!(0)))
        );
    }

    #[test]
    fn test_settings_need_bags_per_ton() {
        let result: Result<Settings, _> = serde_json::from_value(serde_json::json!({}));
        assert!(result.is_err());

        let settings: Settings =
            serde_json::from_value(serde_json::json!({ "bagsPerTon": "20" })).unwrap();
        assert!(!settings.reports_locked());
    }

    #[test]
    fn test_reports_password_round_trip() {
        let mut settings = Settings::default();
        assert!(settings.unlocks_reports("anything").unwrap());

        settings.set_reports_password(Some("cement123")).unwrap();
        let stored = serde_json::to_value(&settings).unwrap();
        assert!(stored.get("reportsPassword").is_none());
        assert_ne!(stored["reportsPasswordHash"], "cement123");
        assert!(settings.unlocks_reports("cement123").unwrap());
        assert!(!settings.unlocks_reports("cement").unwrap());

        settings.set_reports_password(Some("")).unwrap();
        assert!(!settings.reports_locked());
    }

    #[test]
    fn test_settings_rejects_zero_bags_per_ton() {
        let result: Result<Settings, _> =
            serde_json::from_value(serde_json::json!({ "bagsPerTon": "0" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_accepts_numeric_bags_per_ton() {
        let settings: Settings =
            serde_json::from_value(serde_json::json!({ "bagsPerTon": 25 })).unwrap();
        assert_eq!(settings.bags_per_ton.get(), dec!(25));
    }
}
