//! Satellite imagery providers.
//!
//! A [`TileProvider`] performs exactly one attempt at one tile and reports
//! failures as a classified [`ProviderError`]. Retries live in the fetch
//! stage. The HTTP transport is abstracted behind [`HttpClient`] so tests can
//! script responses.

mod dry_run;
mod http;
mod static_maps;
mod types;

pub use dry_run::DryRunProvider;
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use static_maps::StaticMapsProvider;
pub use types::{Credential, ProviderError, TileProvider, TileQuery, REDACTED};

#[cfg(test)]
pub use http::tests::MockHttpClient;
