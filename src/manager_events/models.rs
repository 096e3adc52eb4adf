use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use crate::manager_events::errors::EventStoreError;

/// A planned event as persisted in the store document.
///
/// The date goes to disk as an ISO-8601 `YYYY-MM-DD` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub date: NaiveDate,
    pub time: String,
    pub place: String,
}

/// Raw event form as submitted by the user
#[derive(Debug, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub place: String,
}

impl TryFrom<NewEvent> for Event {
    type Error = EventStoreError;

    fn try_from(form: NewEvent) -> Result<Self, Self::Error> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(EventStoreError::InvalidRecord("event name is empty".to_string()));
        }

        let date = NaiveDate::parse_from_str(form.date.trim(), "%Y-%m-%d")?;

        // military time, seconds optional
        let time = form.time.trim();
        NaiveTime::parse_from_str(time, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
            .map_err(|_| EventStoreError::InvalidRecord(format!("invalid time of event: '{}'", time)))?;

        Ok(Event {
            name: name.to_string(),
            date,
            time: time.to_string(),
            place: form.place.trim().to_string(),
        })
    }
}
