pub(crate) mod assets_model;

pub use assets_model::{AssetKind, AssetRegistry, TrackedAsset};
