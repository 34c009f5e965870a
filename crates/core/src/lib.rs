//! Core of spread-watch: watchlist positions, option symbology, quotes and
//! strategy aggregation shared by the dashboard, exporter and recorder.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod format;
pub mod metrics;
pub mod position;
pub mod quotes;
pub mod recorder;
pub mod symbology;
pub mod traits;
pub mod watchlist;

pub use config::{
    AppConfig, ExportConfig, RecorderConfig, RefreshConfig, TastytradeConfig, WatchlistConfig,
};
pub use config_loader::ConfigLoader;
pub use error::WatchlistError;
pub use metrics::{
    compute_strategy_metrics, position_details, Pnl, PnlPercent, PositionDetail, PriceHistory,
    PriceTrend, StrategyMetrics,
};
pub use position::{group_positions, unique_symbols, Position, StrategyGroup};
pub use quotes::{lookup_quotes, Quote, QuoteBook};
pub use recorder::{QuoteRecorder, RecordSummary};
pub use symbology::{occ_to_streamer, streamer_to_occ, OptionContract, OptionRight, SymbolError};
pub use traits::MarketDataSource;
pub use watchlist::{load_watchlist, parse_watchlist, write_watchlist};
