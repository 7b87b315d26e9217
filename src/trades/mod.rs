pub(crate) mod trades_constants;
pub(crate) mod trades_errors;
pub(crate) mod trades_model;
pub(crate) mod trades_repository;
pub(crate) mod trades_service;
pub(crate) mod trades_traits;


pub use trades_constants::*;
pub use trades_errors::TradeError;
pub use trades_model::{deterministic_trade_id, Trade, TradeAction, TradeDB};
pub use trades_repository::TradeRepository;
pub use trades_service::TradeService;
pub use trades_traits::{TradeRepositoryTrait, TradeSource};
