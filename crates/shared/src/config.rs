//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Settlement configuration.
    pub settlement: SettlementConfig,
}

/// Settlement configuration.
///
/// All rates are fractions (0.20 = 20%).
#[derive(Debug, Clone, Deserialize)]
pub struct SettlementConfig {
    /// Default commission rate applied to freelance escrow releases when the
    /// order event carries none.
    #[serde(default = "default_commission_rate")]
    pub default_commission_rate: Decimal,
    /// Platform cut applied to re-ownership settlements.
    ///
    /// The business rule is unconfirmed, so this defaults to zero: the full
    /// resale amount goes to the old owner.
    #[serde(default = "default_reown_platform_cut")]
    pub reown_platform_cut: Decimal,
    /// Share of the commission paid out as a referral bonus when the order
    /// carries a referrer.
    #[serde(default = "default_referral_bonus_rate")]
    pub referral_bonus_rate: Decimal,
}

fn default_commission_rate() -> Decimal {
    Decimal::new(20, 2) // 0.20
}

fn default_reown_platform_cut() -> Decimal {
    Decimal::ZERO
}

fn default_referral_bonus_rate() -> Decimal {
    Decimal::ZERO
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            default_commission_rate: default_commission_rate(),
            reown_platform_cut: default_reown_platform_cut(),
            referral_bonus_rate: default_referral_bonus_rate(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TESSERA").separator("__"))
            .set_default("settlement.default_commission_rate", "0.20")?
            .set_default("settlement.reown_platform_cut", "0")?
            .set_default("settlement.referral_bonus_rate", "0")?
            .build()?;

        config.try_deserialize()
    }
}
