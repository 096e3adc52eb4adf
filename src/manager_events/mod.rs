pub mod errors;
pub mod models;

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use log::info;
use serde::Serialize;
use serde_json::{Map, Value};
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;
use crate::manager_events::errors::EventStoreError;
use crate::manager_events::models::Event;

/// Struct for managing the json document holding planned events
///
/// The document is an object with one or more named lists of events, e.g.
/// `{"planned_events": [...]}`. Writes are done to a temporary file in the same
/// directory which is then renamed over the store, so a crash mid-write never leaves
/// a truncated document behind. Writers within the process must be serialized by the
/// caller (the web server keeps the store behind a mutex).
pub struct EventStore {
    path: PathBuf,
}

impl EventStore {
    /// Returns an EventStore working on the given file
    ///
    /// # Arguments
    ///
    /// * 'path' - path to the json store document
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the store document with an empty list if the file doesn't exist.
    /// An existing file is left untouched, also when another process creates it first.
    ///
    /// # Arguments
    ///
    /// * 'list_name' - name of the list to create
    pub fn ensure_exists(&self, list_name: &str) -> Result<(), EventStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut document = Map::new();
        document.insert(list_name.to_string(), Value::Array(Vec::new()));
        match self.write_temp(&document)?.persist_noclobber(&self.path) {
            Ok(_) => {
                info!("created event store {}", self.path.display());
                Ok(())
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(EventStoreError::from(e)),
        }
    }

    /// Appends an event to the named list and rewrites the whole document.
    /// Returns the number of events in the list after the append.
    ///
    /// Fails if the file is missing, isn't a json object or lacks the list.
    ///
    /// # Arguments
    ///
    /// * 'list_name' - name of the list to append to
    /// * 'record' - the event to append
    pub fn append(&self, list_name: &str, record: &Event) -> Result<usize, EventStoreError> {
        let mut document = self.read_document()?;

        let list = document
            .get_mut(list_name)
            .and_then(Value::as_array_mut)
            .ok_or_else(|| EventStoreError::MissingList(
                format!("no list '{}' in {}", list_name, self.path.display())))?;

        list.push(serde_json::to_value(record)?);
        let count = list.len();

        self.write_document(&document)?;

        Ok(count)
    }

    /// Loads all events in the named list. A document without the list gives an empty result.
    ///
    /// # Arguments
    ///
    /// * 'list_name' - name of the list to load
    pub fn load(&self, list_name: &str) -> Result<Vec<Event>, EventStoreError> {
        let mut document = self.read_document()?;

        match document.remove(list_name) {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(list) => Ok(serde_json::from_value(list)?),
        }
    }

    fn read_document(&self) -> Result<Map<String, Value>, EventStoreError> {
        let json = fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                EventStoreError::NotFound(format!("no event store at {}", self.path.display()))
            } else {
                EventStoreError::from(e)
            }
        })?;

        match serde_json::from_str(&json)? {
            Value::Object(document) => Ok(document),
            _ => Err(EventStoreError::Document(
                format!("top level of {} is not an object", self.path.display()))),
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<(), EventStoreError> {
        self.write_temp(document)?.persist(&self.path)?;

        Ok(())
    }

    /// Writes the pretty printed document to a synced temporary file next to the store
    fn write_temp(&self, document: &Map<String, Value>) -> Result<NamedTempFile, EventStoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let formatter = PrettyFormatter::with_indent(b"    ");
            let mut ser = serde_json::Serializer::with_formatter(tmp.as_file_mut(), formatter);
            document.serialize(&mut ser)?;
        }
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;

        Ok(tmp)
    }
}
