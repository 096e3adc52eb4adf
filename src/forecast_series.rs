use std::fmt;
use std::str::FromStr;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use crate::manager_weather::models::{ForecastHour, ForecastRequest, ForecastResponse};

/// Forecast value that can be charted over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    #[default]
    Temperature,
    Humidity,
    WindSpeed,
    ChanceOfRain,
    ChanceOfSnow,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::WindSpeed,
        Metric::ChanceOfRain,
        Metric::ChanceOfSnow,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::WindSpeed => "Wind Speed",
            Metric::ChanceOfRain => "Chance of Rain",
            Metric::ChanceOfSnow => "Chance of Snow",
        }
    }

    pub fn value(&self, row: &ForecastRow) -> Option<f64> {
        match self {
            Metric::Temperature => row.temperature,
            Metric::Humidity => row.humidity,
            Metric::WindSpeed => row.wind_speed,
            Metric::ChanceOfRain => row.chance_of_rain,
            Metric::ChanceOfSnow => row.chance_of_snow,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::WindSpeed => "wind_speed",
            Metric::ChanceOfRain => "chance_of_rain",
            Metric::ChanceOfSnow => "chance_of_snow",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == s.trim())
            .ok_or_else(|| format!("unknown metric '{}'", s))
    }
}

/// One hourly forecast sample with a parsed timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRow {
    pub timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub chance_of_rain: Option<f64>,
    pub chance_of_snow: Option<f64>,
}

/// Number of samples left out of a series, per reason
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DroppedRows {
    pub malformed_timestamp: usize,
    pub missing_metric: usize,
    pub duplicate: usize,
}

impl DroppedRows {
    pub fn total(&self) -> usize {
        self.malformed_timestamp + self.missing_metric + self.duplicate
    }
}

/// Time ordered forecast samples for one metric
#[derive(Debug, Clone)]
pub struct ForecastSeries {
    pub metric: Metric,
    pub rows: Vec<ForecastRow>,
    pub dropped: DroppedRows,
}

impl ForecastSeries {
    /// Flattens the day -> hour structure of a forecast response into a series.
    ///
    /// Only the first `days` days (by date) and the first `hours` samples of each day are used.
    /// Samples without a parsable timestamp or without a value for the metric are left out and
    /// counted in `dropped`. The result is strictly increasing in time.
    ///
    /// # Arguments
    ///
    /// * 'response' - forecast response from the provider
    /// * 'request' - the forecast window that was asked for
    /// * 'metric' - the metric the series is for
    pub fn from_response(response: &ForecastResponse, request: &ForecastRequest, metric: Metric) -> Self {
        let mut dropped = DroppedRows::default();
        let mut rows: Vec<ForecastRow> = Vec::new();

        for (key, day) in response.forecast.iter().take(request.days() as usize) {
            let date_text = day.date.as_deref().unwrap_or(key);
            let date = NaiveDate::parse_from_str(date_text.trim(), "%Y-%m-%d").ok();
            let hours = request.hours().map(|h| h as usize).unwrap_or(day.hourly.len());

            for hour in day.hourly.iter().take(hours) {
                let Some(row) = date.and_then(|d| to_row(d, hour)) else {
                    dropped.malformed_timestamp += 1;
                    continue;
                };
                if metric.value(&row).is_none() {
                    dropped.missing_metric += 1;
                    continue;
                }
                rows.push(row);
            }
        }

        rows.sort_by_key(|r| r.timestamp);
        let before = rows.len();
        rows.dedup_by_key(|r| r.timestamp);
        dropped.duplicate = before - rows.len();

        Self { metric, rows, dropped }
    }

    /// Returns (timestamp, value) pairs for the series metric
    pub fn points(&self) -> Vec<(NaiveDateTime, f64)> {
        self.rows
            .iter()
            .filter_map(|r| self.metric.value(r).map(|v| (r.timestamp, v)))
            .collect()
    }
}

fn to_row(date: NaiveDate, hour: &ForecastHour) -> Option<ForecastRow> {
    let time = parse_hour(hour.time.as_deref()?)?;

    Some(ForecastRow {
        timestamp: date.and_time(time),
        date,
        time,
        temperature: hour.temperature,
        humidity: hour.humidity,
        wind_speed: hour.wind_speed,
        chance_of_rain: hour.chance_of_rain,
        chance_of_snow: hour.chance_of_snow,
    })
}

/// Parses an hour of day, either the provider's `HMM` form (0, 300, 1200) or `HH:MM`
fn parse_hour(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    if text.contains(':') {
        return NaiveTime::parse_from_str(text, "%H:%M").ok();
    }
    if text.is_empty() || text.len() > 4 || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let hhmm: u32 = text.parse().ok()?;
    NaiveTime::from_hms_opt(hhmm / 100, hhmm % 100, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use crate::manager_weather::models::ForecastDay;

    fn hour(time: &str, temperature: Option<f64>) -> ForecastHour {
        ForecastHour {
            time: Some(time.to_string()),
            temperature,
            humidity: Some(60.0),
            ..Default::default()
        }
    }

    fn response(days: &[(&str, Vec<ForecastHour>)]) -> ForecastResponse {
        let forecast: BTreeMap<String, ForecastDay> = days
            .iter()
            .map(|(date, hourly)| (date.to_string(), ForecastDay { date: Some(date.to_string()), hourly: hourly.clone() }))
            .collect();
        ForecastResponse { forecast, location: None }
    }

    fn full_day() -> Vec<ForecastHour> {
        (0..24).map(|h| hour(&(h * 100).to_string(), Some(h as f64))).collect()
    }

    #[test]
    fn two_days_of_six_hours() {
        let resp = response(&[
            ("2024-07-06", full_day()),
            ("2024-07-04", full_day()),
            ("2024-07-05", full_day()),
        ]);
        let request = ForecastRequest::new(2, Some(6)).unwrap();

        let series = ForecastSeries::from_response(&resp, &request, Metric::Temperature);

        assert_eq!(series.rows.len(), 12);
        assert!(series.rows.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(series.rows[0].date, NaiveDate::from_ymd_opt(2024, 7, 4).unwrap());
        assert_eq!(series.rows[11].date, NaiveDate::from_ymd_opt(2024, 7, 5).unwrap());
        assert_eq!(series.rows[11].time, NaiveTime::from_hms_opt(5, 0, 0).unwrap());
        assert_eq!(series.dropped.total(), 0);
    }

    #[test]
    fn all_hours_when_not_limited() {
        let resp = response(&[("2024-07-04", full_day())]);
        let request = ForecastRequest::new(14, None).unwrap();

        let series = ForecastSeries::from_response(&resp, &request, Metric::Temperature);
        assert_eq!(series.rows.len(), 24);
    }

    #[test]
    fn rows_missing_the_metric_are_counted_out() {
        let resp = response(&[("2024-07-04", vec![
            hour("0", Some(10.0)),
            hour("300", None),
            hour("600", Some(12.0)),
        ])]);
        let request = ForecastRequest::new(1, None).unwrap();

        let series = ForecastSeries::from_response(&resp, &request, Metric::Temperature);
        assert_eq!(series.points().iter().map(|p| p.1).collect::<Vec<_>>(), vec![10.0, 12.0]);
        assert_eq!(series.dropped.missing_metric, 1);

        let series = ForecastSeries::from_response(&resp, &request, Metric::Humidity);
        assert_eq!(series.rows.len(), 3);

        let series = ForecastSeries::from_response(&resp, &request, Metric::ChanceOfSnow);
        assert!(series.rows.is_empty());
        assert_eq!(series.dropped.missing_metric, 3);
    }

    #[test]
    fn malformed_timestamps_are_counted_out() {
        let mut bad_day = ForecastDay { date: Some("July 5th".to_string()), hourly: vec![hour("0", Some(1.0))] };
        let mut resp = response(&[("2024-07-04", vec![
            hour("0", Some(1.0)),
            hour("2500", Some(2.0)),
            hour("noon", Some(3.0)),
            ForecastHour { time: None, temperature: Some(4.0), ..Default::default() },
            hour("13:30", Some(5.0)),
        ])]);
        bad_day.hourly.push(hour("300", Some(6.0)));
        resp.forecast.insert("2024-07-05".to_string(), bad_day);
        let request = ForecastRequest::new(2, None).unwrap();

        let series = ForecastSeries::from_response(&resp, &request, Metric::Temperature);
        assert_eq!(series.points().iter().map(|p| p.1).collect::<Vec<_>>(), vec![1.0, 5.0]);
        assert_eq!(series.dropped.malformed_timestamp, 5);
    }

    #[test]
    fn duplicate_timestamps_keep_first() {
        let resp = response(&[("2024-07-04", vec![hour("300", Some(1.0)), hour("0300", Some(2.0))])]);
        let request = ForecastRequest::new(1, None).unwrap();

        let series = ForecastSeries::from_response(&resp, &request, Metric::Temperature);
        assert_eq!(series.rows.len(), 1);
        assert_eq!(series.rows[0].temperature, Some(1.0));
        assert_eq!(series.dropped.duplicate, 1);
    }

    #[test]
    fn hour_formats() {
        assert_eq!(parse_hour("0"), NaiveTime::from_hms_opt(0, 0, 0));
        assert_eq!(parse_hour("300"), NaiveTime::from_hms_opt(3, 0, 0));
        assert_eq!(parse_hour("2130"), NaiveTime::from_hms_opt(21, 30, 0));
        assert_eq!(parse_hour("07:15"), NaiveTime::from_hms_opt(7, 15, 0));
        assert_eq!(parse_hour("-100"), None);
        assert_eq!(parse_hour("12345"), None);
        assert_eq!(parse_hour(""), None);
    }

    #[test]
    fn metric_names() {
        for m in Metric::ALL {
            assert_eq!(m.to_string().parse::<Metric>().unwrap(), m);
        }
        assert!("pressure".parse::<Metric>().is_err());
        assert_eq!(Metric::ChanceOfRain.to_string(), "chance_of_rain");
    }
}
