mod errors;
mod logging;
mod initialization;
mod handlers;
mod manager_events;
mod manager_weather;
mod forecast_series;
mod views;

use std::sync::Arc;
use actix_web::{web, App, HttpServer};
use log::{info, warn};
use tokio::sync::Mutex;
use crate::errors::UnrecoverableError;
use crate::initialization::{api_key, config};
use crate::manager_events::EventStore;
use crate::manager_weather::WeatherStack;

pub struct AppState {
    pub events: Arc<Mutex<EventStore>>,
    pub list_name: String,
    pub weather: Option<WeatherStack>,
}

#[actix_web::main]
async fn main() -> Result<(), UnrecoverableError> {
    let config = config()?;

    let store = EventStore::new(&config.events.store_path);
    if config.events.create_if_missing {
        store.ensure_exists(&config.events.list_name)?;
    }
    info!("event store at {}", store.path().display());
    let events = Arc::new(Mutex::new(store));

    let weather = match api_key(&config.weather) {
        Some(key) => Some(WeatherStack::new(&config.weather.base_url, &key, config.weather.timeout())?),
        None => {
            warn!("{} is not set, weather and map panels are disabled", config.weather.api_key_env);
            None
        }
    };
    let state = web::Data::new(AppState {
        events,
        list_name: config.events.list_name.clone(),
        weather,
    });

    info!("listening on {}:{}", config.web_server.bind_address, config.web_server.bind_port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(handlers::routes)
    })
        .bind((config.web_server.bind_address, config.web_server.bind_port))?
        .run()
        .await?;

    Ok(())
}
