//! Domain types, classification, sync planning and configuration shared by
//! every `evtrack` crate.

pub mod app_config;
pub mod charger;
pub mod classify;
pub mod config;
pub mod error;
pub mod geo;
pub mod sink;
pub mod sync;

pub use app_config::AppConfig;
pub use charger::{ChargerDraft, ChargerRecord, ChargerRow, Connector, MatchStatus, RecordSource};
pub use classify::{summarize, tier, ChargingSummary, ChargingTier};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use error::{ConfigError, SinkError};
pub use geo::BoundingBox;
pub use sink::{ArtifactWriter, ChargerSink};
pub use sync::{dedup_last_wins, plan_sync, sync_to_sink, SyncOutcome, SyncPlan};
