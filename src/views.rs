use chrono::NaiveDateTime;
use serde::Serialize;
use crate::forecast_series::ForecastSeries;
use crate::manager_events::models::Event;
use crate::manager_weather::models::{CurrentConditions, QueryLocation};

pub const DEFAULT_ZOOM: u8 = 11;
pub const MAX_ZOOM: u8 = 20;
const MAP_STYLE: &str = "open-street-map";

/// Either a rendered view or a warning to show in its place
#[derive(Serialize, Debug)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Panel<T> {
    Ready(T),
    Warning { message: String },
}

impl<T> Panel<T> {
    pub fn warning<M: ToString>(message: M) -> Self {
        Panel::Warning { message: message.to_string() }
    }
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EventTableView {
    Empty { message: String },
    Table { columns: Vec<&'static str>, rows: Vec<[String; 4]> },
}

impl EventTableView {
    pub fn from_events(events: &[Event]) -> Self {
        if events.is_empty() {
            return EventTableView::Empty { message: "No planned events found".to_string() };
        }

        let rows = events
            .iter()
            .map(|e| [e.name.clone(), e.date.to_string(), e.time.clone(), e.place.clone()])
            .collect();

        EventTableView::Table { columns: vec!["name", "date", "time", "place"], rows }
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct Bar {
    pub label: &'static str,
    pub value: f64,
}

#[derive(Serialize, Debug)]
pub struct BarChart {
    pub title: String,
    pub bars: Vec<Bar>,
}

impl BarChart {
    /// One bar per current weather metric
    pub fn current_weather(current: &CurrentConditions) -> Self {
        let bars = vec![
            Bar { label: "Temperature", value: current.temperature },
            Bar { label: "Humidity", value: current.humidity },
            Bar { label: "Wind Speed", value: current.wind_speed },
            Bar { label: "Wind Pressure", value: current.pressure },
            Bar { label: "Cloud Cover", value: current.cloud_cover },
        ];

        Self { title: "Current Weather".to_string(), bars }
    }
}

#[derive(Serialize, Debug)]
pub struct WeatherSummary {
    pub description: String,
    pub icons: Vec<String>,
}

impl WeatherSummary {
    pub fn from_current(current: &CurrentConditions) -> Self {
        Self {
            description: current.weather_descriptions.join(", "),
            icons: current.weather_icons.clone(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct CurrentWeatherView {
    pub location: String,
    pub summary: WeatherSummary,
    pub chart: BarChart,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct Point {
    pub x: NaiveDateTime,
    pub y: f64,
}

#[derive(Serialize, Debug)]
pub struct LineChart {
    pub title: String,
    pub metric: String,
    pub points: Vec<Point>,
    pub warning: Option<String>,
}

impl LineChart {
    /// Chart of the series metric over time, with a data quality warning if samples were left out
    pub fn forecast(series: &ForecastSeries) -> Self {
        let points = series.points().into_iter().map(|(x, y)| Point { x, y }).collect();

        let dropped = series.dropped;
        let warning = if dropped.total() > 0 {
            Some(format!(
                "{} forecast samples left out ({} without a valid time, {} without {}, {} duplicates)",
                dropped.total(), dropped.malformed_timestamp, dropped.missing_metric,
                series.metric.label().to_lowercase(), dropped.duplicate,
            ))
        } else {
            None
        };

        Self {
            title: format!("{} forecast", series.metric.label()),
            metric: series.metric.to_string(),
            points,
            warning,
        }
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct MapView {
    pub label: String,
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
    pub style: &'static str,
}

impl MapView {
    /// Returns a one point map centered on the location
    ///
    /// # Arguments
    ///
    /// * 'location' - resolved query location
    /// * 'label' - hover text for the point
    /// * 'zoom' - zoom level, 0 to 20
    pub fn new(location: &QueryLocation, label: &str, zoom: u8) -> Result<Self, String> {
        if zoom > MAX_ZOOM {
            return Err(format!("zoom must be between 0 and {}, got {}", MAX_ZOOM, zoom));
        }

        Ok(Self {
            label: label.to_string(),
            lat: location.lat,
            lon: location.lon,
            zoom,
            style: MAP_STYLE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use crate::forecast_series::{DroppedRows, Metric};

    #[test]
    fn five_bars_for_current_weather() {
        let current: CurrentConditions = serde_json::from_value(json!({
            "temperature": 70, "humidity": 50, "wind_speed": 5, "pressure": 1012, "cloudcover": 20
        })).unwrap();

        let chart = BarChart::current_weather(&current);

        assert_eq!(chart.bars.len(), 5);
        let values: Vec<f64> = chart.bars.iter().map(|b| b.value).collect();
        assert_eq!(values, vec![70.0, 50.0, 5.0, 1012.0, 20.0]);
        assert_eq!(chart.bars[3].label, "Wind Pressure");
    }

    #[test]
    fn empty_event_table() {
        assert_eq!(
            EventTableView::from_events(&[]),
            EventTableView::Empty { message: "No planned events found".to_string() }
        );
    }

    #[test]
    fn event_table_rows() {
        let events = vec![Event {
            name: "Picnic".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 7, 4).unwrap(),
            time: "12:00".to_string(),
            place: "Park".to_string(),
        }];

        let json = serde_json::to_value(EventTableView::from_events(&events)).unwrap();
        assert_eq!(json["state"], "table");
        assert_eq!(json["rows"][0], json!(["Picnic", "2024-07-04", "12:00", "Park"]));
    }

    #[test]
    fn line_chart_warns_about_dropped_samples() {
        let mut series = ForecastSeries { metric: Metric::Humidity, rows: Vec::new(), dropped: DroppedRows::default() };
        assert!(LineChart::forecast(&series).warning.is_none());

        series.dropped.missing_metric = 2;
        let chart = LineChart::forecast(&series);
        assert_eq!(chart.title, "Humidity forecast");
        assert!(chart.warning.unwrap().starts_with("2 forecast samples left out"));
    }

    #[test]
    fn map_zoom_bounds() {
        let location = QueryLocation { name: None, country: None, lat: 48.85, lon: 2.35 };
        assert_eq!(MapView::new(&location, "Paris", 0).unwrap().zoom, 0);
        assert_eq!(MapView::new(&location, "Paris", 20).unwrap().style, "open-street-map");
        assert!(MapView::new(&location, "Paris", 21).is_err());
    }

    #[test]
    fn panel_serialization() {
        let panel: Panel<u8> = Panel::warning("weather unavailable");
        assert_eq!(serde_json::to_value(&panel).unwrap(), json!({"status": "warning", "message": "weather unavailable"}));
    }
}
