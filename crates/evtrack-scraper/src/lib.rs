pub mod client;
pub mod error;
mod normalize;
pub mod reconcile;
pub mod retry;
pub mod session;
pub mod sources;
pub mod sweep;
mod throttle;

pub use client::{FetchClient, FetchSettings, MAX_PAGES};
pub use error::FetchError;
pub use reconcile::{Reconciler, Reconciliation};
pub use retry::RetryPolicy;
pub use session::{SweepSession, SweepStats};
pub use sources::catalog::{CatalogClient, OcmPoi};
pub use sources::places::{is_charger_place, NearbyResult, PlaceDetails, PlacesClient};
pub use sweep::{GridPoint, GridPoints, Tile, Tiles};
