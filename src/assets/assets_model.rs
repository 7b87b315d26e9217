use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{Result, ValidationError};

/// How an asset is priced upstream: equities/ETFs vs crypto tokens.
/// Each kind is served by a distinct price source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetKind {
    Stock,
    Token,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Stock => "STOCK",
            AssetKind::Token => "TOKEN",
        }
    }
}

/// Classification metadata for one symbol in the tracked universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedAsset {
    /// Internal symbol, e.g. "BTC" or "COIN". Primary key across the engine.
    pub symbol: String,
    pub kind: AssetKind,
    /// Source-side identifier, e.g. "bitcoin" for a token priced by CoinGecko.
    /// Equals `symbol` for assets whose source uses the ticker directly.
    pub provider_id: String,
    pub platform: String,
    pub market: String,
    pub segment: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub target_allocation: Decimal,
}

/// The configured tracked-asset universe. Symbols outside this set are
/// ignored by position construction and never priced.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    assets: BTreeMap<String, TrackedAsset>,
}

impl AssetRegistry {
    pub fn new(assets: Vec<TrackedAsset>) -> Self {
        let assets = assets
            .into_iter()
            .map(|asset| (asset.symbol.clone(), asset))
            .collect();
        AssetRegistry { assets }
    }

    /// Loads the registry from its JSON representation (a list of assets).
    pub fn from_json(json: &str) -> Result<Self> {
        let assets: Vec<TrackedAsset> = serde_json::from_str(json)?;
        if assets.is_empty() {
            return Err(ValidationError::InvalidInput(
                "Asset registry must contain at least one asset".to_string(),
            )
            .into());
        }
        Ok(Self::new(assets))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.assets.contains_key(symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&TrackedAsset> {
        self.assets.get(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedAsset> {
        self.assets.values()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.assets.keys().cloned().collect()
    }

    pub fn of_kind(&self, kind: AssetKind) -> Vec<TrackedAsset> {
        self.assets
            .values()
            .filter(|asset| asset.kind == kind)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_roundtrips_from_json() {
        let json = r#"[
            {
                "symbol": "BTC",
                "kind": "TOKEN",
                "providerId": "bitcoin",
                "platform": "coinbase",
                "market": "CRYPTO",
                "segment": "Core",
                "description": "Bitcoin",
                "targetAllocation": 25.0
            },
            {
                "symbol": "COIN",
                "kind": "STOCK",
                "providerId": "COIN",
                "platform": "ibkr",
                "market": "NASDAQ",
                "segment": "Growth",
                "description": "Coinbase Global"
            }
        ]"#;

        let registry = AssetRegistry::from_json(json).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("BTC"));
        assert!(!registry.contains("DOGE"));
        assert_eq!(registry.get("BTC").unwrap().provider_id, "bitcoin");
        assert_eq!(registry.of_kind(AssetKind::Stock).len(), 1);
    }

    #[test]
    fn empty_registry_is_rejected() {
        assert!(AssetRegistry::from_json("[]").is_err());
    }
}
