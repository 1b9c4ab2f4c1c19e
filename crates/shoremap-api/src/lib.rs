// shoremap-api: Async Rust client for the beach / POI / weather proxy endpoints

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::ProxyClient;
pub use error::Error;
pub use models::{RawRecord, WeatherPayload};
pub use transport::TransportConfig;
