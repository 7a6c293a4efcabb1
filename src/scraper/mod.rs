pub mod extractor;
pub mod maps_client;
pub mod orchestrator;
pub mod pacing;
pub mod source;

#[cfg(test)]
pub mod testing;

pub use maps_client::MapsClient;
pub use orchestrator::run_session;
pub use pacing::PacingPolicy;
pub use source::{ItemHandle, ListingField, ListingSource, SourceError};
