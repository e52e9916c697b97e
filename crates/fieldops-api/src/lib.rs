// fieldops-api: Async Rust client for paged REST collections

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::{RestClient, UpdateMethod};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use types::{ListParams, Page, Pagination};
