use std::sync::Arc;

use rust_decimal::Decimal;
use tempfile::TempDir;

use tradebook_core::assets::{AssetKind, AssetRegistry, TrackedAsset};
use tradebook_core::db::{self, DbPool};

/// Fresh migrated database in a temp directory. Keep the `TempDir` alive
/// for the duration of the test or the file disappears underneath the pool.
pub fn setup_pool() -> (Arc<DbPool>, TempDir) {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp
        .path()
        .join("tradebook.db")
        .to_str()
        .unwrap()
        .to_string();

    db::init(&db_path).unwrap();
    let pool = db::create_pool(&db_path).unwrap();
    db::run_migrations(&pool).unwrap();

    (pool, tmp)
}

pub fn registry() -> Arc<AssetRegistry> {
    Arc::new(AssetRegistry::new(vec![
        TrackedAsset {
            symbol: "BTC".to_string(),
            kind: AssetKind::Token,
            provider_id: "bitcoin".to_string(),
            platform: "coinbase".to_string(),
            market: "CRYPTO".to_string(),
            segment: "Core".to_string(),
            description: "Bitcoin".to_string(),
            target_allocation: Decimal::ZERO,
        },
        TrackedAsset {
            symbol: "ETH".to_string(),
            kind: AssetKind::Token,
            provider_id: "ethereum".to_string(),
            platform: "coinbase".to_string(),
            market: "CRYPTO".to_string(),
            segment: "Growth".to_string(),
            description: "Ethereum".to_string(),
            target_allocation: Decimal::ZERO,
        },
    ]))
}
