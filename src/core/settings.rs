//! Payment settings and rate presets.
//!
//! The scalar annual amount lives in the key-value `payment_settings` table. Rate presets
//! map an inclusive month range to a monthly rate and are expanded into the month-to-rate
//! schedule consumed by year initialization. Both are seeded from config.toml.

use crate::{
    config::club::Config,
    entities::{PaymentRatePreset, PaymentSetting, payment_rate_preset, payment_setting},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::BTreeMap;
use tracing::info;

const ANNUAL_AMOUNT_KEY: &str = "annual_amount";

/// Reads a raw setting value.
pub async fn get_setting<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let setting = PaymentSetting::find()
        .filter(payment_setting::Column::Key.eq(key))
        .one(db)
        .await?;
    Ok(setting.map(|s| s.value))
}

/// Writes a raw setting value, replacing any previous value.
pub async fn set_setting<C>(db: &C, key: &str, value: String) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();

    let existing = PaymentSetting::find()
        .filter(payment_setting::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(setting) = existing {
        let mut active_model: payment_setting::ActiveModel = setting.into();
        active_model.value = Set(value);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_setting = payment_setting::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
            updated_at: Set(now),
            ..Default::default()
        };
        new_setting.insert(db).await?;
    }

    Ok(())
}

/// The configured annual membership amount, if any.
pub async fn get_annual_amount<C>(db: &C) -> Result<Option<f64>>
where
    C: ConnectionTrait,
{
    get_setting(db, ANNUAL_AMOUNT_KEY)
        .await?
        .map(|raw| {
            raw.parse::<f64>().map_err(|e| Error::Config {
                message: format!("Stored annual amount '{raw}' is not a number: {e}"),
            })
        })
        .transpose()
}

/// Stores the annual membership amount.
pub async fn set_annual_amount<C>(db: &C, amount: f64) -> Result<()>
where
    C: ConnectionTrait,
{
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    set_setting(db, ANNUAL_AMOUNT_KEY, amount.to_string()).await
}

/// Lists all rate presets in creation order.
pub async fn list_rate_presets<C>(db: &C) -> Result<Vec<payment_rate_preset::Model>>
where
    C: ConnectionTrait,
{
    PaymentRatePreset::find()
        .order_by_asc(payment_rate_preset::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a rate preset by name.
pub async fn get_rate_preset_by_name<C>(
    db: &C,
    name: &str,
) -> Result<Option<payment_rate_preset::Model>>
where
    C: ConnectionTrait,
{
    PaymentRatePreset::find()
        .filter(payment_rate_preset::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a preset or updates the one with the same name.
pub async fn upsert_rate_preset<C>(
    db: &C,
    name: &str,
    start_month: i32,
    end_month: i32,
    rate: f64,
) -> Result<payment_rate_preset::Model>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Rate preset name cannot be empty"));
    }
    for month in [start_month, end_month] {
        if !(1..=12).contains(&month) {
            return Err(Error::validation(format!(
                "Rate preset '{name}' month {month} is outside 1-12"
            )));
        }
    }
    if !rate.is_finite() || rate < 0.0 {
        return Err(Error::InvalidAmount { amount: rate });
    }

    if let Some(existing) = get_rate_preset_by_name(db, name).await? {
        let mut active_model: payment_rate_preset::ActiveModel = existing.into();
        active_model.start_month = Set(start_month);
        active_model.end_month = Set(end_month);
        active_model.rate = Set(rate);
        return Ok(active_model.update(db).await?);
    }

    let preset = payment_rate_preset::ActiveModel {
        name: Set(name.to_string()),
        start_month: Set(start_month),
        end_month: Set(end_month),
        rate: Set(rate),
        ..Default::default()
    };
    Ok(preset.insert(db).await?)
}

/// Months an inclusive preset range covers. A range whose end precedes its start wraps
/// around the new year, e.g. September through June.
#[must_use]
pub fn preset_months(start_month: i32, end_month: i32) -> Vec<u32> {
    let clamp = |m: i32| u32::try_from(m.clamp(1, 12)).unwrap_or(1);
    let (start, end) = (clamp(start_month), clamp(end_month));

    if start <= end {
        (start..=end).collect()
    } else {
        (start..=12).chain(1..=end).collect()
    }
}

/// Expands presets into a month-to-rate schedule. Later presets override earlier ones
/// where their ranges overlap; months no preset covers are absent.
#[must_use]
pub fn monthly_rates_from_presets(presets: &[payment_rate_preset::Model]) -> BTreeMap<u32, f64> {
    let mut rates = BTreeMap::new();
    for preset in presets {
        for month in preset_months(preset.start_month, preset.end_month) {
            rates.insert(month, preset.rate);
        }
    }
    rates
}

/// Counts of what [`seed_from_config`] wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Categories inserted
    pub categories_created: usize,
    /// Presets inserted or updated
    pub presets_saved: usize,
    /// Whether the annual amount was written
    pub annual_amount_set: bool,
}

/// Seeds categories, rate presets and the annual amount from configuration.
///
/// Existing categories (matched by name) are left as they are so administrator edits
/// survive re-running setup. Presets are updated in place.
pub async fn seed_from_config(db: &DatabaseConnection, config: &Config) -> Result<SeedSummary> {
    let txn = db.begin().await?;
    let mut summary = SeedSummary::default();

    let existing: Vec<String> = crate::core::category::get_all_categories(&txn)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();

    for category in &config.categories {
        if existing.iter().any(|name| name == category.name.trim()) {
            continue;
        }
        crate::core::category::create_category(
            &txn,
            &category.name,
            category.is_age_based,
            category.min_age,
            category.max_age,
        )
        .await?;
        summary.categories_created += 1;
    }

    for preset in &config.rate_presets {
        upsert_rate_preset(
            &txn,
            &preset.name,
            preset.start_month,
            preset.end_month,
            preset.rate,
        )
        .await?;
        summary.presets_saved += 1;
    }

    if let Some(amount) = config.payments.annual_amount {
        set_annual_amount(&txn, amount).await?;
        summary.annual_amount_set = true;
    }

    txn.commit().await?;

    info!(
        categories = summary.categories_created,
        presets = summary.presets_saved,
        "configuration seeded"
    );
    Ok(summary)
}
