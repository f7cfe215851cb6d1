//! OpenRouteService-compatible directions and geocoding client.
//!
//! Wraps `reqwest` with typed request/response shapes, provider error
//! classification, and bounded retries for transient failures. The directions
//! endpoint may answer with either an encoded-polyline geometry or GeoJSON
//! feature coordinates; both shapes are modeled explicitly and normalized to
//! longitude/latitude [`Coordinate`]s at this boundary.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use reqwest::{header::AUTHORIZATION, Client, Response, Url};
use serde::{Deserialize, Serialize};
use shared::Coordinate;

use crate::retry::{self, RetryPolicy};

pub const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";

/// Snapping radius sent with point-to-point requests so start points
/// synthesized off-road still match the road network.
const SNAP_RADIUS_M: f64 = 1_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    FootHiking,
    CyclingRegular,
}

impl Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Profile::FootHiking => "foot-hiking",
            Profile::CyclingRegular => "cycling-regular",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("no match found for \"{0}\"")]
    NoMatch(String),

    #[error("response for {context} had unexpected shape: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("route geometry missing or undecodable: {0}")]
    Geometry(String),

    #[error("invalid provider URL: {0}")]
    BadUrl(String),
}

/// Seam between the candidate search and the external directions provider.
///
/// Production uses [`OrsClient`]; search tests substitute scripted
/// implementations so candidate walks run without the network.
pub trait RouteProvider: Send + Sync {
    /// Resolve a free-text destination to its best-match coordinate.
    fn geocode(&self, text: &str)
        -> impl Future<Output = Result<Coordinate, ProviderError>> + Send;

    /// Request a point-to-point route.
    fn directions(
        &self,
        start: Coordinate,
        end: Coordinate,
        profile: Profile,
    ) -> impl Future<Output = Result<Vec<Coordinate>, ProviderError>> + Send;

    /// Request a closed loop of roughly `length_m` meters starting and ending
    /// at `start`, shaped through `points` intermediate waypoints.
    fn round_trip(
        &self,
        start: Coordinate,
        profile: Profile,
        length_m: f64,
        points: u32,
    ) -> impl Future<Output = Result<Vec<Coordinate>, ProviderError>> + Send;
}

#[derive(Debug, Serialize)]
struct DirectionsBody {
    /// Longitude-first pairs, the provider's request convention.
    coordinates: Vec<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    radiuses: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<DirectionsOptions>,
}

#[derive(Debug, Serialize)]
struct DirectionsOptions {
    round_trip: RoundTripOptions,
}

#[derive(Debug, Serialize)]
struct RoundTripOptions {
    length: f64,
    points: u32,
    seed: u64,
}

/// The two response shapes the directions endpoint produces, discriminated by
/// structure: the JSON endpoint carries `routes` with encoded-polyline
/// geometry (latitude-first on the wire), the GeoJSON endpoint carries
/// `features` with longitude-first coordinate arrays.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DirectionsResponse {
    Encoded { routes: Vec<EncodedRoute> },
    GeoJson { features: Vec<LineFeature> },
}

#[derive(Debug, Deserialize)]
struct EncodedRoute {
    geometry: String,
}

#[derive(Debug, Deserialize)]
struct LineFeature {
    geometry: LineGeometry,
}

#[derive(Debug, Deserialize)]
struct LineGeometry {
    coordinates: Vec<[f64; 2]>,
}

impl DirectionsResponse {
    fn into_path(self) -> Result<Vec<Coordinate>, ProviderError> {
        match self {
            DirectionsResponse::Encoded { routes } => {
                let route = routes
                    .into_iter()
                    .next()
                    .ok_or_else(|| ProviderError::Geometry("response carried no routes".into()))?;
                let line = polyline::decode_polyline(&route.geometry, 5)
                    .map_err(|err| ProviderError::Geometry(err.to_string()))?;
                Ok(line
                    .coords()
                    .map(|c| Coordinate { lon: c.x, lat: c.y })
                    .collect())
            }
            DirectionsResponse::GeoJson { features } => {
                let feature = features
                    .into_iter()
                    .next()
                    .ok_or_else(|| ProviderError::Geometry("response carried no features".into()))?;
                Ok(feature
                    .geometry
                    .coordinates
                    .into_iter()
                    .map(|[lon, lat]| Coordinate { lon, lat })
                    .collect())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    features: Vec<PointFeature>,
}

#[derive(Debug, Deserialize)]
struct PointFeature {
    geometry: PointGeometry,
}

#[derive(Debug, Deserialize)]
struct PointGeometry {
    /// Longitude-first, GeoJSON convention.
    coordinates: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct OrsClient {
    client: Client,
    api_key: String,
    base_url: Url,
    retry: RetryPolicy,
}

impl OrsClient {
    /// Client pointed at the production OpenRouteService API.
    pub fn new(api_key: &str) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Client with a custom base URL (for pointing at a mock server in tests).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        // Normalise: a single trailing slash makes Url::join append segments
        // instead of replacing the last one.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalised).map_err(|_| ProviderError::BadUrl(base_url.to_owned()))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn post_directions(
        &self,
        profile: Profile,
        body: DirectionsBody,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        let url = self
            .base_url
            .join(&format!("v2/directions/{profile}"))
            .map_err(|_| ProviderError::BadUrl(self.base_url.to_string()))?;

        let response = retry::with_retries(self.retry, || {
            let request = self
                .client
                .post(url.clone())
                .header(AUTHORIZATION, self.api_key.as_str())
                .json(&body);
            async move { check_status(request.send().await?).await }
        })
        .await?;

        let text = response.text().await?;
        let parsed: DirectionsResponse =
            serde_json::from_str(&text).map_err(|source| ProviderError::Deserialize {
                context: format!("directions({profile})"),
                source,
            })?;
        parsed.into_path()
    }
}

impl RouteProvider for OrsClient {
    async fn geocode(&self, text: &str) -> Result<Coordinate, ProviderError> {
        let mut url = self
            .base_url
            .join("geocode/search")
            .map_err(|_| ProviderError::BadUrl(self.base_url.to_string()))?;
        url.query_pairs_mut()
            .append_pair("api_key", &self.api_key)
            .append_pair("text", text)
            .append_pair("size", "1");

        let response = retry::with_retries(self.retry, || {
            let request = self.client.get(url.clone());
            async move { check_status(request.send().await?).await }
        })
        .await?;

        let body = response.text().await?;
        let parsed: GeocodeResponse =
            serde_json::from_str(&body).map_err(|source| ProviderError::Deserialize {
                context: format!("geocode({text})"),
                source,
            })?;

        let feature = parsed
            .features
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NoMatch(text.to_owned()))?;
        let [lon, lat] = feature.geometry.coordinates;
        Ok(Coordinate { lon, lat })
    }

    async fn directions(
        &self,
        start: Coordinate,
        end: Coordinate,
        profile: Profile,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        let body = DirectionsBody {
            coordinates: vec![[start.lon, start.lat], [end.lon, end.lat]],
            radiuses: Some(vec![SNAP_RADIUS_M, SNAP_RADIUS_M]),
            options: None,
        };
        self.post_directions(profile, body).await
    }

    async fn round_trip(
        &self,
        start: Coordinate,
        profile: Profile,
        length_m: f64,
        points: u32,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        let body = DirectionsBody {
            coordinates: vec![[start.lon, start.lat]],
            radiuses: None,
            options: Some(DirectionsOptions {
                round_trip: RoundTripOptions {
                    length: length_m,
                    points,
                    seed: 0,
                },
            }),
        };
        self.post_directions(profile, body).await
    }
}

/// Map non-2xx responses to [`ProviderError::Api`], extracting the provider's
/// error message when the body carries one.
async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let raw = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&raw)
        .map(|body| body.error.message)
        .unwrap_or(raw);

    Err(ProviderError::Api {
        status: status.as_u16(),
        message,
    })
}
