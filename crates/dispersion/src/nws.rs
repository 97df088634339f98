//! National Weather Service point-forecast client.
//!
//! `GET /points/{lat},{lon}` resolves the forecast grid; its
//! `properties.forecastHourly` link is then fetched and the first period not
//! yet started is used (the last period if all have started).

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use firesmoke_common::config::WeatherConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{DispersionError, Result};
use crate::wind::{RawWind, WindLookup};

/// One hourly forecast period.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastPeriod {
    #[serde(rename = "startTime")]
    pub start_time: DateTime<FixedOffset>,
    #[serde(rename = "windSpeed", default)]
    pub wind_speed: String,
    #[serde(rename = "windDirection", default)]
    pub wind_direction: String,
}

#[derive(Debug, Deserialize)]
struct HourlyForecast {
    properties: HourlyProperties,
}

#[derive(Debug, Deserialize)]
struct HourlyProperties {
    #[serde(default)]
    periods: Vec<ForecastPeriod>,
}

/// First period starting at or after `now`, else the last one.
pub fn select_period(periods: &[ForecastPeriod], now: DateTime<Utc>) -> Option<&ForecastPeriod> {
    periods
        .iter()
        .find(|p| p.start_time >= now)
        .or_else(|| periods.last())
}

pub struct NwsClient {
    client: Client,
    points_url: String,
}

impl NwsClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/geo+json"));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            points_url: config.points_url.clone(),
        })
    }

    fn points_url(&self, lat: f64, lon: f64) -> String {
        self.points_url
            .replace("{lat}", &format!("{:.4}", lat))
            .replace("{lon}", &format!("{:.4}", lon))
    }

    async fn get_json(&self, url: &str) -> Result<(StatusCode, Option<Value>)> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok((status, None));
        }
        if !status.is_success() {
            return Err(DispersionError::UpstreamStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok((status, Some(response.json().await?)))
    }
}

#[async_trait]
impl WindLookup for NwsClient {
    #[instrument(skip(self))]
    async fn lookup(&self, lat: f64, lon: f64) -> Result<Option<RawWind>> {
        let url = self.points_url(lat, lon);
        let (status, points) = self.get_json(&url).await?;

        let hourly_url = points.as_ref().and_then(|p| {
            p.pointer("/properties/forecastHourly")
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        let Some(hourly_url) = hourly_url else {
            warn!(status = status.as_u16(), "Points lookup did not resolve a forecast grid");
            return Ok(None);
        };

        debug!(url = %hourly_url, "Fetching hourly forecast");
        let (_, hourly) = self.get_json(&hourly_url).await?;
        let hourly = hourly.ok_or_else(|| DispersionError::UpstreamStatus {
            status: StatusCode::NOT_FOUND.as_u16(),
            url: hourly_url.clone(),
        })?;

        let forecast: HourlyForecast = serde_json::from_value(hourly)
            .map_err(|e| DispersionError::Payload(format!("hourly forecast: {}", e)))?;

        let now = Utc::now();
        let period = select_period(&forecast.properties.periods, now)
            .ok_or(DispersionError::EmptyForecast { lat, lon })?;
        if period.start_time < now {
            warn!("All forecast periods have started, using the last one");
        }

        Ok(Some(RawWind::new(
            period.wind_speed.clone(),
            period.wind_direction.clone(),
        )))
    }
}
