use actix_web::{get, post, web, Either, HttpResponse, Responder};
use actix_web::http::StatusCode;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use crate::AppState;
use crate::forecast_series::{ForecastSeries, Metric};
use crate::manager_events::errors::EventStoreError;
use crate::manager_events::models::{Event, NewEvent};
use crate::manager_weather::errors::WeatherError;
use crate::manager_weather::models::{ForecastRequest, WeatherMode, WeatherReport};
use crate::manager_weather::WeatherStack;
use crate::views::{
    BarChart, CurrentWeatherView, EventTableView, LineChart, MapView, Panel, WeatherSummary,
    DEFAULT_ZOOM, MAX_ZOOM,
};

const INDEX_HTML: &str = include_str!("../static/index.html");
const DEFAULT_FORECAST_DAYS: u32 = 3;

#[derive(Deserialize, Debug)]
struct LocationQuery {
    #[serde(default)]
    location: String,
}

#[derive(Deserialize, Debug)]
struct ForecastQuery {
    #[serde(default)]
    location: String,
    days: Option<u32>,
    hours: Option<u32>,
    metric: Option<String>,
}

#[derive(Deserialize, Debug)]
struct MapQuery {
    #[serde(default)]
    location: String,
    zoom: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct DashboardQuery {
    #[serde(default)]
    location: String,
    mode: Option<String>,
    days: Option<u32>,
    hours: Option<u32>,
    metric: Option<String>,
    zoom: Option<u32>,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum WeatherView {
    Current(CurrentWeatherView),
    Forecast(LineChart),
}

#[derive(Serialize, Debug)]
struct DashboardView {
    location: String,
    events: Panel<EventTableView>,
    weather: Panel<WeatherView>,
    map: Panel<MapView>,
}

#[derive(Serialize, Debug)]
struct Submitted {
    message: &'static str,
    count: usize,
}

/// A failure caught at a panel boundary, rendered as a warning in place of the panel
#[derive(Debug)]
struct Failure {
    message: String,
    bad_input: bool,
}

impl Failure {
    fn input<M: ToString>(message: M) -> Self {
        Failure { message: message.to_string(), bad_input: true }
    }

    fn upstream<M: ToString>(message: M) -> Self {
        Failure { message: message.to_string(), bad_input: false }
    }

    fn status(&self) -> StatusCode {
        if self.bad_input { StatusCode::BAD_REQUEST } else { StatusCode::OK }
    }
}

impl From<WeatherError> for Failure {
    fn from(e: WeatherError) -> Self {
        Failure { bad_input: e.is_user_error(), message: format!("weather unavailable: {}", e) }
    }
}

/// Registers all dashboard routes
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(list_events)
        .service(add_event)
        .service(current_weather)
        .service(forecast)
        .service(location_map)
        .service(dashboard);
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

#[get("/events")]
async fn list_events(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(events_panel(&data).await)
}

#[post("/events")]
async fn add_event(payload: Either<web::Json<NewEvent>, web::Form<NewEvent>>, data: web::Data<AppState>) -> impl Responder {
    let form = match payload {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };
    info!("{:?}", form);

    let result = match Event::try_from(form) {
        Ok(event) => {
            let store = data.events.lock().await;
            store.append(&data.list_name, &event)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(count) => {
            info!("event saved, {} planned events", count);
            HttpResponse::Created().json(Submitted { message: "Submitted", count })
        }
        Err(e) if e.is_user_error() => {
            warn!("rejected event: {}", e);
            HttpResponse::BadRequest().json(Panel::<()>::warning(format!("invalid event: {}", e)))
        }
        Err(e) => {
            error!("failed to save event: {}", e);
            HttpResponse::InternalServerError().json(Panel::<()>::warning(format!("could not save event: {}", e)))
        }
    }
}

#[get("/weather/current")]
async fn current_weather(params: web::Query<LocationQuery>, data: web::Data<AppState>) -> impl Responder {
    info!("{:?}", params);

    let result: Result<WeatherView, Failure> = async {
        let mode = WeatherMode::Current;
        let report = fetch_report(&data, &params.location, &mode).await?;
        weather_view(&params.location, &mode, &report, Metric::default())
    }.await;

    respond(result)
}

#[get("/weather/forecast")]
async fn forecast(params: web::Query<ForecastQuery>, data: web::Data<AppState>) -> impl Responder {
    info!("{:?}", params);

    let result: Result<WeatherView, Failure> = async {
        let mode = WeatherMode::Forecast(forecast_request(params.days, params.hours)?);
        let metric = parse_metric(params.metric.as_deref())?;
        let report = fetch_report(&data, &params.location, &mode).await?;
        weather_view(&params.location, &mode, &report, metric)
    }.await;

    respond(result)
}

#[get("/map")]
async fn location_map(params: web::Query<MapQuery>, data: web::Data<AppState>) -> impl Responder {
    info!("{:?}", params);

    let result: Result<MapView, Failure> = async {
        let zoom = zoom_level(params.zoom)?;
        let report = fetch_report(&data, &params.location, &WeatherMode::Current).await?;
        map_view(&params.location, &report, zoom)
    }.await;

    respond(result)
}

/// Renders every panel of the dashboard in one go. Each panel fails on its own,
/// a broken weather lookup still leaves the event table usable and vice versa.
#[get("/dashboard")]
async fn dashboard(params: web::Query<DashboardQuery>, data: web::Data<AppState>) -> impl Responder {
    info!("{:?}", params);

    let events = events_panel(&data).await;
    let location = params.location.trim().to_string();

    let (weather, map) = if location.is_empty() {
        let hint = "Enter your location to begin";
        (Panel::warning(hint), Panel::warning(hint))
    } else {
        let mode = dashboard_mode(&params);
        let current = WeatherMode::Current;
        match fetch_report(&data, &location, mode.as_ref().unwrap_or(&current)).await {
            Err(f) => (Panel::warning(&f.message), Panel::warning(&f.message)),
            Ok(report) => {
                let weather = mode.and_then(|mode| {
                    let metric = match mode {
                        WeatherMode::Forecast(_) => parse_metric(params.metric.as_deref())?,
                        WeatherMode::Current => Metric::default(),
                    };
                    weather_view(&location, &mode, &report, metric)
                });
                let map = zoom_level(params.zoom).and_then(|zoom| map_view(&location, &report, zoom));
                (to_panel(weather), to_panel(map))
            }
        }
    };

    HttpResponse::Ok().json(DashboardView { location, events, weather, map })
}

async fn events_panel(data: &AppState) -> Panel<EventTableView> {
    let store = data.events.lock().await;
    match store.load(&data.list_name) {
        Ok(events) => Panel::Ready(EventTableView::from_events(&events)),
        Err(e) => {
            warn!("failed to load events: {}", e);
            let message = match e {
                EventStoreError::NotFound(_) => "No planned events found, the event store is missing".to_string(),
                e => format!("could not load events: {}", e),
            };
            Panel::warning(message)
        }
    }
}

async fn fetch_report(data: &AppState, location: &str, mode: &WeatherMode) -> Result<WeatherReport, Failure> {
    let weather: &WeatherStack = data
        .weather
        .as_ref()
        .ok_or_else(|| Failure::upstream("weather unavailable: no weather API key configured"))?;

    weather.fetch(location, mode).await.map_err(|e| {
        warn!("weather lookup for '{}' failed: {}", location, e);
        Failure::from(e)
    })
}

fn weather_view(location: &str, mode: &WeatherMode, report: &WeatherReport, metric: Metric) -> Result<WeatherView, Failure> {
    match (report, mode) {
        (WeatherReport::Current(current), _) => Ok(WeatherView::Current(CurrentWeatherView {
            location: current
                .location
                .as_ref()
                .and_then(|l| l.display_name())
                .unwrap_or_else(|| location.trim().to_string()),
            summary: WeatherSummary::from_current(&current.current),
            chart: BarChart::current_weather(&current.current),
        })),
        (WeatherReport::Forecast(response), WeatherMode::Forecast(request)) => {
            let series = ForecastSeries::from_response(response, request, metric);
            let chart = LineChart::forecast(&series);
            if let Some(w) = &chart.warning {
                warn!("forecast for '{}': {}", location.trim(), w);
            }
            Ok(WeatherView::Forecast(chart))
        }
        (WeatherReport::Forecast(_), WeatherMode::Current) =>
            Err(Failure::upstream("weather unavailable: got a forecast for a current conditions request")),
    }
}

fn map_view(location: &str, report: &WeatherReport, zoom: u8) -> Result<MapView, Failure> {
    let coordinates = report
        .location()
        .ok_or_else(|| Failure::upstream(format!("no coordinates found for '{}'", location.trim())))?;

    MapView::new(coordinates, location.trim(), zoom).map_err(Failure::input)
}

/// Mode of the weather panel. Metric and zoom are checked by the panel that uses them,
/// so a bad value only blanks that one panel.
fn dashboard_mode(params: &DashboardQuery) -> Result<WeatherMode, Failure> {
    match params.mode.as_deref().map(str::trim) {
        None | Some("") | Some("current") => Ok(WeatherMode::Current),
        Some("forecast") => Ok(WeatherMode::Forecast(forecast_request(params.days, params.hours)?)),
        Some(other) => Err(Failure::input(format!("unknown mode '{}'", other))),
    }
}

fn forecast_request(days: Option<u32>, hours: Option<u32>) -> Result<ForecastRequest, Failure> {
    let days = days.unwrap_or(DEFAULT_FORECAST_DAYS);
    let days = u8::try_from(days)
        .map_err(|_| Failure::input(format!("forecast days must be between 1 and 14, got {}", days)))?;
    let hours = match hours {
        Some(h) => Some(u8::try_from(h)
            .map_err(|_| Failure::input(format!("hours must be one of [1, 3, 6, 12, 24], got {}", h)))?),
        None => None,
    };

    Ok(ForecastRequest::new(days, hours)?)
}

fn parse_metric(name: Option<&str>) -> Result<Metric, Failure> {
    match name {
        None | Some("") => Ok(Metric::default()),
        Some(name) => name.parse().map_err(Failure::input),
    }
}

fn zoom_level(zoom: Option<u32>) -> Result<u8, Failure> {
    let zoom = zoom.unwrap_or(DEFAULT_ZOOM as u32);
    u8::try_from(zoom)
        .ok()
        .filter(|z| *z <= MAX_ZOOM)
        .ok_or_else(|| Failure::input(format!("zoom must be between 0 and {}, got {}", MAX_ZOOM, zoom)))
}

fn to_panel<T>(result: Result<T, Failure>) -> Panel<T> {
    match result {
        Ok(view) => Panel::Ready(view),
        Err(f) => Panel::warning(f.message),
    }
}

fn respond<T: Serialize>(result: Result<T, Failure>) -> HttpResponse {
    match result {
        Ok(view) => HttpResponse::Ok().json(Panel::Ready(view)),
        Err(f) => HttpResponse::build(f.status()).json(Panel::<T>::warning(&f.message)),
    }
}
