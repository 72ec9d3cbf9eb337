//! Lot configuration, fixed at construction time.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_TOTAL_SLOTS: u32 = 1000;
pub const DEFAULT_VIP_SLOTS: u32 = 100;
pub const DEFAULT_LEDGER_PATH: &str = "parking_logs.txt";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotConfig {
    /// Regular plus VIP slots
    pub total_slots: u32,
    /// The last `vip_slots` ids are VIP
    pub vip_slots: u32,
    pub ledger_path: PathBuf,
}

impl LotConfig {
    pub fn new(total_slots: u32, vip_slots: u32) -> Self {
        Self {
            total_slots,
            vip_slots,
            ..Self::default()
        }
    }

    pub fn with_ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_path = path.into();
        self
    }

    #[inline]
    pub fn regular_slots(&self) -> u32 {
        self.total_slots.saturating_sub(self.vip_slots)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_slots == 0 {
            return Err(ConfigError::NoSlots);
        }
        if self.vip_slots > self.total_slots {
            return Err(ConfigError::VipExceedsTotal {
                vip: self.vip_slots,
                total: self.total_slots,
            });
        }
        Ok(())
    }
}

impl Default for LotConfig {
    fn default() -> Self {
        Self {
            total_slots: DEFAULT_TOTAL_SLOTS,
            vip_slots: DEFAULT_VIP_SLOTS,
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_split() {
        let config = LotConfig::default();
        assert_eq!(config.regular_slots(), 900);
        assert_eq!(config.vip_slots, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert_eq!(LotConfig::new(0, 0).validate(), Err(ConfigError::NoSlots));
        assert_eq!(
            LotConfig::new(5, 6).validate(),
            Err(ConfigError::VipExceedsTotal { vip: 6, total: 5 })
        );
        assert!(LotConfig::new(5, 5).validate().is_ok());
        assert!(LotConfig::new(5, 0).validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: LotConfig = serde_json::from_str(r#"{ "vip_slots": 20 }"#).unwrap();
        assert_eq!(config.total_slots, DEFAULT_TOTAL_SLOTS);
        assert_eq!(config.vip_slots, 20);
        assert_eq!(config.ledger_path, PathBuf::from(DEFAULT_LEDGER_PATH));

        let config: LotConfig =
            serde_json::from_str(r#"{ "total_slots": 8, "ledger_path": "/var/lot.txt" }"#)
                .unwrap();
        assert_eq!(config, LotConfig::new(8, DEFAULT_VIP_SLOTS).with_ledger_path("/var/lot.txt"));
    }

    #[test]
    fn test_json_round_trip() {
        let config = LotConfig::new(40, 4).with_ledger_path("lot.txt");
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<LotConfig>(&json).unwrap(), config);
    }
}
