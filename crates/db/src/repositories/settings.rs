//! The singleton settings document.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use cemtrade_core::settings::{BagsPerTon, Settings};

use crate::error::RepositoryError;
use crate::records::{decode, encode};
use crate::store::{Collection, EntityStore, WriteBatch};

/// Id of the settings document.
pub const SETTINGS_ID: Uuid = Uuid::nil();

const BAGS_PER_TON_FIELD: &str = "bagsPerTon";

/// Repository for app-wide settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    store: Arc<dyn EntityStore>,
    default_bags_per_ton: BagsPerTon,
}

impl SettingsRepository {
    /// Creates a settings repository. `default_bags_per_ton` applies until
    /// the document is first written.
    #[must_use]
    pub const fn new(store: Arc<dyn EntityStore>, default_bags_per_ton: BagsPerTon) -> Self {
        Self {
            store,
            default_bags_per_ton,
        }
    }

    /// Returns the stored settings, or the defaults if none were saved.
    ///
    /// A stored document without `bagsPerTon` takes the configured default.
    pub async fn get_settings(&self) -> Result<Settings, RepositoryError> {
        match self.store.get(Collection::Settings, SETTINGS_ID).await? {
            Some(mut raw) => {
                if let Some(fields) = raw.as_object_mut() {
                    let missing = fields.get(BAGS_PER_TON_FIELD).is_none_or(Value::is_null);
                    if missing {
                        fields.insert(BAGS_PER_TON_FIELD.to_string(), encode(&self.default_bags_per_ton)?);
                    }
                }
                decode(raw)
            }
            None => Ok(Settings {
                bags_per_ton: self.default_bags_per_ton,
                reports_password_hash: None,
            }),
        }
    }

    /// Current bags-per-ton conversion.
    pub async fn bags_per_ton(&self) -> Result<BagsPerTon, RepositoryError> {
        Ok(self.get_settings().await?.bags_per_ton)
    }

    /// Sets the bags-per-ton conversion. Must be positive.
    pub async fn set_bags_per_ton(&self, value: Decimal) -> Result<Settings, RepositoryError> {
        let bags_per_ton = BagsPerTon::new(value)?;
        let settings = Settings {
            bags_per_ton,
            ..self.get_settings().await?
        };
        self.save(&settings).await?;
        info!(bags_per_ton = %value, "Updated bags per ton");
        Ok(settings)
    }

    /// Sets or clears the reports password. Only its Argon2id hash is stored.
    pub async fn set_reports_password(&self, password: Option<&str>) -> Result<Settings, RepositoryError> {
        let mut settings = self.get_settings().await?;
        settings.set_reports_password(password)?;
        self.save(&settings).await?;
        info!(enabled = settings.reports_locked(), "Updated reports password");
        Ok(settings)
    }

    /// Returns true if `attempt` unlocks the reports screen. No password set means unlocked.
    pub async fn verify_reports_password(&self, attempt: &str) -> Result<bool, RepositoryError> {
        let unlocked = self.get_settings().await?.unlocks_reports(attempt)?;
        if !unlocked {
            warn!("Rejected reports password");
        }
        Ok(unlocked)
    }

    async fn save(&self, settings: &Settings) -> Result<(), RepositoryError> {
        let mut batch = WriteBatch::new();
        batch.put(Collection::Settings, SETTINGS_ID, encode(settings)?);
        self.store.commit(batch).await?;
        Ok(())
    }
}
