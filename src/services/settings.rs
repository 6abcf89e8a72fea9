//! Store-wide settings persisted alongside the catalog
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::Store;
use crate::{EcommerceError, Result};

const SHIPPING_KEY: &str = "shipping";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingSettings {
    pub fee: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct SettingsService { store: Arc<dyn Store>, default_fee: i64, currency: String }

impl SettingsService {
    pub fn new(store: Arc<dyn Store>, default_fee: i64, currency: impl Into<String>) -> Self {
        Self { store, default_fee, currency: currency.into() }
    }

    /// Currency every stored amount is denominated in.
    pub fn currency(&self) -> &str { &self.currency }

    /// Falls back to the configured fee until an admin sets one.
    pub async fn shipping(&self) -> Result<ShippingSettings> {
        match self.store.load_setting(SHIPPING_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(ShippingSettings { fee: self.default_fee, updated_at: None }),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_shipping_fee(&self, fee: Option<i64>) -> Result<ShippingSettings> {
        let fee = fee.filter(|f| *f >= 0).ok_or_else(|| EcommerceError::validation("Invalid fee value"))?;
        let settings = ShippingSettings { fee, updated_at: Some(Utc::now()) };
        self.store.save_setting(SHIPPING_KEY, serde_json::to_value(&settings)?).await?;
        tracing::info!("shipping fee updated");
        Ok(settings)
    }
}
