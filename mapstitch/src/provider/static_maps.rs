//! Static map imagery provider.
//!
//! Each tile is one GET against a static-map endpoint, centred on the tile's
//! latitude/longitude:
//!
//! `{base}?center={lat},{lon}&zoom={z}&size={n}x{n}&scale={s}&maptype=satellite&format=jpg&key={KEY}`
//!
//! The provider burns a watermark into the bottom rows of every image; the
//! fetch stage crops it off.

use tracing::trace;

use super::http::{HttpClient, HttpResponse};
use super::types::{Credential, ProviderError, TileProvider, TileQuery};
use crate::config::DEFAULT_PROVIDER_BASE_URL;

/// Longest slice of an error body kept in an error message.
const MAX_ERROR_BODY: usize = 200;

/// Satellite imagery from a static-map HTTP API.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use mapstitch::provider::{Credential, ReqwestClient, StaticMapsProvider};
///
/// let client = ReqwestClient::with_timeout(Duration::from_secs(15)).unwrap();
/// let key = Credential::new("YOUR_API_KEY").unwrap();
/// let provider = StaticMapsProvider::new(client, key);
/// ```
pub struct StaticMapsProvider<C: HttpClient> {
    http_client: C,
    base_url: String,
    credential: Credential,
}

impl<C: HttpClient> StaticMapsProvider<C> {
    /// Creates a provider against the default endpoint.
    pub fn new(http_client: C, credential: Credential) -> Self {
        Self::with_base_url(http_client, credential, DEFAULT_PROVIDER_BASE_URL)
    }

    pub fn with_base_url(http_client: C, credential: Credential, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('?').to_string(),
            credential,
        }
    }

    /// Builds the request URL for a tile.
    fn build_url(&self, query: &TileQuery) -> String {
        format!(
            "{}?center={:.10},{:.10}&zoom={}&size={}x{}&scale={}&maptype=satellite&format=jpg&key={}",
            self.base_url,
            query.lat,
            query.lon,
            query.zoom,
            query.size_px,
            query.size_px,
            query.scale,
            self.credential.expose()
        )
    }

    fn classify(&self, response: HttpResponse) -> Result<Vec<u8>, ProviderError> {
        if !response.is_success() {
            let body = String::from_utf8_lossy(&response.body);
            let message: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(ProviderError::Http {
                status: response.status,
                message,
            });
        }

        if !response.is_image() {
            return Err(ProviderError::NotAnImage {
                content_type: response.content_type.unwrap_or_else(|| "none".to_string()),
            });
        }

        if response.body.is_empty() {
            return Err(ProviderError::InvalidResponse("empty image body".to_string()));
        }

        Ok(response.body)
    }
}

impl<C: HttpClient> TileProvider for StaticMapsProvider<C> {
    fn fetch_tile(&self, query: &TileQuery) -> Result<Vec<u8>, ProviderError> {
        let url = self.build_url(query);
        trace!(
            row = query.row,
            col = query.col,
            url = %self.credential.redact(&url),
            "Requesting tile"
        );

        self.http_client
            .get(&url)
            .and_then(|response| self.classify(response))
            .map_err(|e| e.redacted(&self.credential))
    }

    fn name(&self) -> &str {
        "Static Maps"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::http::tests::MockHttpClient;

    fn query() -> TileQuery {
        TileQuery {
            row: 1,
            col: 2,
            lat: 51.5,
            lon: -0.125,
            zoom: 19,
            size_px: 640,
            scale: 2,
        }
    }

    fn provider(mock: MockHttpClient) -> StaticMapsProvider<MockHttpClient> {
        StaticMapsProvider::new(mock, Credential::new("test-key").unwrap())
    }

    #[test]
    fn test_url_parameters() {
        let p = provider(MockHttpClient::always(Ok(MockHttpClient::image(vec![1]))));
        let url = p.build_url(&query());

        assert!(url.starts_with(DEFAULT_PROVIDER_BASE_URL));
        assert!(url.contains("center=51.5000000000,-0.1250000000"));
        assert!(url.contains("zoom=19"));
        assert!(url.contains("size=640x640"));
        assert!(url.contains("scale=2"));
        assert!(url.contains("maptype=satellite"));
        assert!(url.contains("format=jpg"));
        assert!(url.ends_with("key=test-key"));
    }

    #[test]
    fn test_custom_base_url() {
        let p = StaticMapsProvider::with_base_url(
            MockHttpClient::always(Ok(MockHttpClient::image(vec![1]))),
            Credential::new("k").unwrap(),
            "http://localhost:8080/map?",
        );
        assert!(p.build_url(&query()).starts_with("http://localhost:8080/map?center="));
    }

    #[test]
    fn test_image_response_is_returned() {
        let p = provider(MockHttpClient::always(Ok(MockHttpClient::image(vec![9, 9]))));
        assert_eq!(p.fetch_tile(&query()).unwrap(), vec![9, 9]);
    }

    #[test]
    fn test_forbidden_is_permanent() {
        let p = provider(MockHttpClient::always(Ok(MockHttpClient::status(
            403,
            "The provided API key is invalid.",
        ))));
        let err = p.fetch_tile(&query()).unwrap_err();
        assert!(matches!(err, ProviderError::Http { status: 403, .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_html_body_is_not_an_image() {
        let p = provider(MockHttpClient::always(Ok(HttpResponse {
            status: 200,
            content_type: Some("text/html".into()),
            body: b"<html>".to_vec(),
        })));
        let err = p.fetch_tile(&query()).unwrap_err();
        assert!(matches!(err, ProviderError::NotAnImage { .. }));
    }

    #[test]
    fn test_errors_never_carry_the_key() {
        let p = provider(MockHttpClient::always(Ok(MockHttpClient::status(
            400,
            "bad request for key=test-key",
        ))));
        let msg = p.fetch_tile(&query()).unwrap_err().to_string();
        assert!(!msg.contains("test-key"));
        assert!(msg.contains("***REDACTED***"));
    }
}
