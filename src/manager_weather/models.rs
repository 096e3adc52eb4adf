use std::collections::BTreeMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use crate::manager_weather::errors::WeatherError;

pub const MAX_FORECAST_DAYS: u8 = 14;
pub const HOUR_STEPS: [u8; 5] = [1, 3, 6, 12, 24];

/// Location the provider resolved the free text query to.
/// Coordinates come as strings from the provider, plain numbers are accepted as well.
#[serde_as]
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct QueryLocation {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub lat: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub lon: f64,
}

impl QueryLocation {
    /// "name, country" as resolved by the provider, if it sent a name
    pub fn display_name(&self) -> Option<String> {
        match (&self.name, &self.country) {
            (Some(name), Some(country)) if !country.is_empty() => Some(format!("{}, {}", name, country)),
            (Some(name), _) => Some(name.clone()),
            _ => None,
        }
    }
}

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub struct CurrentConditions {
    #[serde(default)]
    pub weather_descriptions: Vec<String>,
    #[serde(default)]
    pub weather_icons: Vec<String>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub temperature: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub humidity: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub wind_speed: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub pressure: f64,
    #[serde(rename = "cloudcover")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub cloud_cover: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CurrentResponse {
    pub current: CurrentConditions,
    #[serde(default)]
    pub location: Option<QueryLocation>,
}

/// One hourly sample of a forecast day. Every field is optional since partial
/// samples are filtered later on rather than failing the whole response.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ForecastHour {
    #[serde(default, deserialize_with = "lenient_text")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub wind_speed: Option<f64>,
    #[serde(default, rename = "chanceofrain", deserialize_with = "lenient_number")]
    pub chance_of_rain: Option<f64>,
    #[serde(default, rename = "chanceofsnow", deserialize_with = "lenient_number")]
    pub chance_of_snow: Option<f64>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ForecastDay {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub hourly: Vec<ForecastHour>,
}

/// Forecast response, days keyed by their date
#[derive(Deserialize, Debug, Clone)]
pub struct ForecastResponse {
    pub forecast: BTreeMap<String, ForecastDay>,
    #[serde(default)]
    pub location: Option<QueryLocation>,
}

/// Error envelope the provider sends, usually with a 200 status
#[derive(Deserialize, Debug)]
pub struct ProviderError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub info: String,
}

/// Validated forecast window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRequest {
    days: u8,
    hours: Option<u8>,
}

impl ForecastRequest {
    /// Returns a forecast request if the window is something the provider supports
    ///
    /// # Arguments
    ///
    /// * 'days' - number of forecast days, 1 to 14
    /// * 'hours' - optional number of hourly samples per day, one of 1, 3, 6, 12 or 24
    pub fn new(days: u8, hours: Option<u8>) -> Result<Self, WeatherError> {
        if days == 0 || days > MAX_FORECAST_DAYS {
            return Err(WeatherError::InvalidRequest(
                format!("forecast days must be between 1 and {}, got {}", MAX_FORECAST_DAYS, days)));
        }
        if let Some(h) = hours {
            if !HOUR_STEPS.contains(&h) {
                return Err(WeatherError::InvalidRequest(
                    format!("hours must be one of {:?}, got {}", HOUR_STEPS, h)));
            }
        }

        Ok(Self { days, hours })
    }

    pub fn days(&self) -> u8 {
        self.days
    }

    pub fn hours(&self) -> Option<u8> {
        self.hours
    }
}

/// What to ask the provider for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeatherMode {
    Current,
    Forecast(ForecastRequest),
}

#[derive(Debug, Clone)]
pub enum WeatherReport {
    Current(CurrentResponse),
    Forecast(ForecastResponse),
}

impl WeatherReport {
    pub fn location(&self) -> Option<&QueryLocation> {
        match self {
            WeatherReport::Current(c) => c.location.as_ref(),
            WeatherReport::Forecast(f) => f.location.as_ref(),
        }
    }
}

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn forecast_window_bounds() {
        assert!(ForecastRequest::new(1, None).is_ok());
        assert!(ForecastRequest::new(14, Some(24)).is_ok());
        assert!(ForecastRequest::new(0, None).unwrap_err().is_user_error());
        assert!(ForecastRequest::new(15, None).unwrap_err().is_user_error());
        for h in [0, 2, 4, 5, 7, 25] {
            assert!(ForecastRequest::new(3, Some(h)).is_err(), "hours {} accepted", h);
        }
    }

    #[test]
    fn coordinates_as_strings_or_numbers() {
        let a: QueryLocation = serde_json::from_value(json!({"name": "New York", "lat": "40.714", "lon": "-74.006"})).unwrap();
        let b: QueryLocation = serde_json::from_value(json!({"lat": 40.714, "lon": -74.006})).unwrap();
        assert_eq!(a.lat, b.lat);
        assert_eq!(a.lon, b.lon);
        assert_eq!(a.display_name().as_deref(), Some("New York"));
        assert_eq!(b.display_name(), None);
    }

    #[test]
    fn hourly_values_are_lenient() {
        let hour: ForecastHour = serde_json::from_value(json!({
            "time": 300,
            "temperature": "12",
            "humidity": "n/a",
            "chanceofrain": 40
        })).unwrap();

        assert_eq!(hour.time.as_deref(), Some("300"));
        assert_eq!(hour.temperature, Some(12.0));
        assert_eq!(hour.humidity, None);
        assert_eq!(hour.wind_speed, None);
        assert_eq!(hour.chance_of_rain, Some(40.0));
    }

    #[test]
    fn current_requires_all_metrics() {
        let ok = serde_json::from_value::<CurrentResponse>(json!({"current": {
            "temperature": 70, "humidity": 50, "wind_speed": 5, "pressure": 1012, "cloudcover": 20
        }}));
        assert!(ok.is_ok());
        assert!(ok.unwrap().location.is_none());

        let missing = serde_json::from_value::<CurrentResponse>(json!({"current": {"temperature": 70}}));
        assert!(missing.is_err());
    }
}
