//! Weather and destination-image lookups shown alongside a generated route.
//!
//! Both providers are strictly best-effort: any failure degrades to an empty
//! forecast or a fixed fallback image, and neither ever blocks or fails route
//! generation.

use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use shared::{Coordinate, DailyForecast};

pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com";
pub const UNSPLASH_BASE_URL: &str = "https://api.unsplash.com";

pub const FALLBACK_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1488646953014-85cb44e25828?w=800&h=500&fit=crop&auto=format";

/// Days of forecast surfaced to the caller.
const FORECAST_DAYS: usize = 3;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ForecastClient {
    client: Client,
    base_url: String,
}

impl Default for ForecastClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastClient {
    pub fn new() -> Self {
        Self::with_base_url(OPEN_METEO_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Three-day daily forecast for a coordinate; empty on any failure.
    pub async fn daily_forecast(&self, coord: Coordinate) -> Vec<DailyForecast> {
        match self.fetch(coord).await {
            Ok(forecast) => forecast,
            Err(err) => {
                tracing::warn!(error = %err, "weather forecast unavailable, continuing without it");
                Vec::new()
            }
        }
    }

    async fn fetch(&self, coord: Coordinate) -> Result<Vec<DailyForecast>, reqwest::Error> {
        let response = self
            .client
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&[
                ("latitude", coord.lat.to_string()),
                ("longitude", coord.lon.to_string()),
                (
                    "daily",
                    "temperature_2m_max,temperature_2m_min,precipitation_sum".to_owned(),
                ),
                ("timezone", "auto".to_owned()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: ForecastResponse = response.json().await?;
        let daily = body.daily;
        let len = daily
            .time
            .len()
            .min(daily.temperature_2m_max.len())
            .min(daily.temperature_2m_min.len())
            .min(daily.precipitation_sum.len());

        Ok((0..len.min(FORECAST_DAYS))
            .map(|i| DailyForecast {
                date: daily.time[i].clone(),
                temp_max: daily.temperature_2m_max[i],
                temp_min: daily.temperature_2m_min[i],
                precipitation: daily.precipitation_sum[i],
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<String>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    precipitation_sum: Vec<f64>,
}

pub struct ImageClient {
    client: Client,
    base_url: String,
    access_key: Option<String>,
}

impl Default for ImageClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageClient {
    /// Reads `UNSPLASH_ACCESS_KEY`; without it every lookup yields the
    /// fallback image.
    pub fn new() -> Self {
        Self::with_base_url(UNSPLASH_BASE_URL, env::var("UNSPLASH_ACCESS_KEY").ok())
    }

    pub fn with_base_url(base_url: &str, access_key: Option<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            access_key,
        }
    }

    /// Landscape photo URL for a destination; the fallback URL on any failure.
    ///
    /// The search term is the part before the first comma, so
    /// "Tbilisi, Georgia" searches for "Tbilisi".
    pub async fn destination_image(&self, destination: &str) -> String {
        let Some(access_key) = &self.access_key else {
            return FALLBACK_IMAGE_URL.to_owned();
        };

        let term = destination
            .split(',')
            .next()
            .unwrap_or(destination)
            .trim();
        if term.is_empty() {
            return FALLBACK_IMAGE_URL.to_owned();
        }

        match self.fetch(term, access_key).await {
            Ok(Some(url)) => url,
            Ok(None) => FALLBACK_IMAGE_URL.to_owned(),
            Err(err) => {
                tracing::warn!(error = %err, "destination image unavailable, using fallback");
                FALLBACK_IMAGE_URL.to_owned()
            }
        }
    }

    async fn fetch(&self, term: &str, access_key: &str) -> Result<Option<String>, reqwest::Error> {
        let response = self
            .client
            .get(format!("{}/search/photos", self.base_url))
            .query(&[
                ("query", term),
                ("per_page", "1"),
                ("orientation", "landscape"),
                ("client_id", access_key),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: PhotoSearchResponse = response.json().await?;
        Ok(body.results.into_iter().next().map(|photo| photo.urls.regular))
    }
}

#[derive(Debug, Deserialize)]
struct PhotoSearchResponse {
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

fn http_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}
