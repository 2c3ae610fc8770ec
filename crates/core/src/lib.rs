pub mod config;
pub mod engine;
pub mod leaderboard;
pub mod metrics;
pub mod reconcile;
pub mod source;
pub mod testing;
pub mod ticket;

pub use config::{
    load_config, load_config_from_str, validate_config, CacheConfig, Config, ConfigError,
    EventbriteConfig, SanitizedConfig, ServerConfig, SheetsConfig,
};
pub use engine::{
    CacheGate, CachedSnapshot, Clock, EngineError, ResponseData, SystemClock, TicketEngine,
};
pub use leaderboard::{build_leaderboard, LeaderboardEntry};
pub use reconcile::{reconcile, CanonicalTicketSet, Reconciliation, SourceStats, TicketKey};
pub use source::{EventbriteSource, SheetsSource, SourceError, TicketSource};
pub use ticket::{NormalizedTicket, TicketOrigin};
