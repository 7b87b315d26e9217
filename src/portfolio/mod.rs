pub(crate) mod portfolio_errors;
pub(crate) mod portfolio_service;
pub(crate) mod portfolio_traits;
pub(crate) mod position_builder;
pub(crate) mod positions_model;
pub(crate) mod snapshot_repository;
pub(crate) mod snapshot_service;


pub use portfolio_errors::PortfolioError;
pub use portfolio_service::PortfolioService;
pub use portfolio_traits::SnapshotRepositoryTrait;
pub use position_builder::build_positions;
pub use positions_model::{
    EnrichedPosition, HistoricalPosition, HistoricalPositionDB, Lot, PerformancePoint, Position,
    PositionDB,
};
pub use snapshot_repository::SnapshotRepository;
pub use snapshot_service::SnapshotService;
