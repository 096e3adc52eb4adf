pub mod errors;
pub mod models;

use std::time::Duration;
use log::info;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use crate::manager_weather::errors::WeatherError;
use crate::manager_weather::models::{
    CurrentResponse, ForecastRequest, ForecastResponse, ProviderError, WeatherMode, WeatherReport,
};

/// Struct for fetching current conditions and forecasts from weatherstack
pub struct WeatherStack {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherStack {
    /// Returns a WeatherStack struct ready for fetching weather data
    ///
    /// # Arguments
    ///
    /// * 'base_url' - provider url without trailing endpoint, e.g. http://api.weatherstack.com
    /// * 'api_key' - provider access key
    /// * 'timeout' - request timeout
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<WeatherStack, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Fetches whatever the given mode asks for
    ///
    /// # Arguments
    ///
    /// * 'location' - free text location, city name or zip code
    /// * 'mode' - current conditions or a forecast window
    pub async fn fetch(&self, location: &str, mode: &WeatherMode) -> Result<WeatherReport, WeatherError> {
        match mode {
            WeatherMode::Current => Ok(WeatherReport::Current(self.fetch_current(location).await?)),
            WeatherMode::Forecast(request) =>
                Ok(WeatherReport::Forecast(self.fetch_forecast(location, request).await?)),
        }
    }

    /// Fetches current weather conditions for a location
    ///
    /// # Arguments
    ///
    /// * 'location' - free text location, city name or zip code
    pub async fn fetch_current(&self, location: &str) -> Result<CurrentResponse, WeatherError> {
        let location = check_location(location)?;

        self.get("current", vec![("query", location.to_string())]).await
    }

    /// Fetches a forecast for a location. The provider returns the days keyed by date,
    /// each with a list of hourly samples when hours are requested.
    ///
    /// # Arguments
    ///
    /// * 'location' - free text location, city name or zip code
    /// * 'request' - forecast days and optionally hourly samples per day
    pub async fn fetch_forecast(&self, location: &str, request: &ForecastRequest) -> Result<ForecastResponse, WeatherError> {
        let location = check_location(location)?;

        let mut params = vec![
            ("query", location.to_string()),
            ("forecast_days", request.days().to_string()),
        ];
        if let Some(hours) = request.hours() {
            params.push(("hours", hours.to_string()));
        }

        self.get("forecast", params).await
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, params: Vec<(&str, String)>) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        info!("requesting {} with {:?}", url, params);

        let req = self.client
            .get(url)
            .query(&[("access_key", self.api_key.as_str())])
            .query(&params)
            .send().await?;

        let status = req.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let json = req.text().await?;
        let document: Value = serde_json::from_str(&json)?;

        if let Some(error) = provider_error(&document) {
            return Err(WeatherError::Provider { code: error.code, info: error.info });
        }

        Ok(serde_json::from_value(document)?)
    }
}

fn check_location(location: &str) -> Result<&str, WeatherError> {
    let location = location.trim();
    if location.is_empty() {
        Err(WeatherError::InvalidRequest("no location given".to_string()))
    } else {
        Ok(location)
    }
}

/// Picks out the provider's error envelope, `{"success": false, "error": {...}}`
fn provider_error(document: &Value) -> Option<ProviderError> {
    if document.get("success").and_then(Value::as_bool) != Some(false) && document.get("error").is_none() {
        return None;
    }

    let error = document
        .get("error")
        .and_then(|e| serde_json::from_value::<ProviderError>(e.clone()).ok())
        .unwrap_or(ProviderError { code: 0, info: "request failed".to_string() });

    Some(error)
}
