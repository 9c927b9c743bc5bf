use crate::error::AppError;
use crate::model::{Cattle, CattlePatch, Event, EventPatch, NewCattle, NewEvent};
use crate::storage::watch::{Subscription, Watchers};
use crate::storage::{CattleStore, EventStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::{Date, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "herd.json";
const STORE_ENV_VAR: &str = "HERD_STORE_PATH";

#[derive(Debug, Serialize, Deserialize)]
struct StoredHerd {
    schema_version: u32,
    #[serde(default)]
    cattle: Vec<Cattle>,
    #[serde(default)]
    events: Vec<Event>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HerdState {
    pub cattle: Vec<Cattle>,
    pub events: Vec<Event>,
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(data_dir()?.join(STORE_FILE_NAME))
}

pub(crate) fn data_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("herd"))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join("herd"))
    }
}

pub fn load_state(path: &Path) -> Result<HerdState, AppError> {
    if !path.exists() {
        debug!(path = %path.display(), "store file missing, starting empty");
        return Ok(HerdState::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::store_unavailable(format!("{}: {}", path.display(), err)))?;
    let stored: StoredHerd = serde_json::from_str(&content)?;

    if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    for event in &stored.events {
        if !stored.cattle.iter().any(|cattle| cattle.id == event.cattle_id) {
            return Err(AppError::invalid_data(format!(
                "event {} belongs to unknown cattle {}",
                event.id, event.cattle_id
            )));
        }
        event
            .validate()
            .map_err(|err| AppError::invalid_data(err.message().to_string()))?;
    }

    debug!(
        path = %path.display(),
        cattle = stored.cattle.len(),
        events = stored.events.len(),
        "loaded herd"
    );
    Ok(HerdState {
        cattle: stored.cattle,
        events: stored.events,
    })
}

pub fn save_state(path: &Path, state: &HerdState) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| AppError::store_unavailable(format!("{}: {}", parent.display(), err)))?;
    }

    let stored = StoredHerd {
        schema_version: SCHEMA_VERSION,
        cattle: state.cattle.clone(),
        events: state.events.clone(),
    };
    let content = serde_json::to_string_pretty(&stored)?;
    std::fs::write(path, content)
        .map_err(|err| AppError::store_unavailable(format!("{}: {}", path.display(), err)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)
            .map_err(|err| AppError::store_unavailable(err.to_string()))?;
    }

    debug!(path = %path.display(), "saved herd");
    Ok(())
}

/// Herd document on disk. Every call reads and rewrites the whole file; the
/// last writer wins.
pub struct JsonStore {
    path: PathBuf,
    watchers: Watchers,
}

impl JsonStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            watchers: Watchers::default(),
        }
    }

    pub fn open_default() -> Result<Self, AppError> {
        Ok(Self::open(store_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<HerdState, AppError> {
        load_state(&self.path)
    }

    fn modify<T>(
        &self,
        change: impl FnOnce(&mut HerdState) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut state = load_state(&self.path)?;
        let result = change(&mut state)?;
        save_state(&self.path, &state)?;
        Ok(result)
    }

    fn modify_cattle<T>(
        &self,
        change: impl FnOnce(&mut HerdState) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut snapshot = Vec::new();
        let result = self.modify(|state| {
            let result = change(state)?;
            snapshot = state.cattle.clone();
            Ok(result)
        })?;

        if !self.watchers.is_empty() {
            self.watchers.notify(&snapshot);
        }
        Ok(result)
    }
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::now_v7().simple())
}

fn require_id<'a>(field: &str, id: &'a str) -> Result<&'a str, AppError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input(format!("{field} is required")));
    }
    Ok(trimmed)
}

fn cattle_mut<'a>(state: &'a mut HerdState, id: &str) -> Result<&'a mut Cattle, AppError> {
    state
        .cattle
        .iter_mut()
        .find(|cattle| cattle.id == id)
        .ok_or_else(|| AppError::invalid_input("cattle not found"))
}

fn event_position(state: &HerdState, cattle_id: &str, event_id: &str) -> Result<usize, AppError> {
    if !state.cattle.iter().any(|cattle| cattle.id == cattle_id) {
        return Err(AppError::invalid_input("cattle not found"));
    }
    state
        .events
        .iter()
        .position(|event| event.cattle_id == cattle_id && event.id == event_id)
        .ok_or_else(|| AppError::invalid_input("event not found"))
}

impl EventStore for JsonStore {
    fn create_event(&self, cattle_id: &str, event: NewEvent) -> Result<Event, AppError> {
        let cattle_id = require_id("cattle id", cattle_id)?;
        let event = event.into_event(
            new_id("evt"),
            cattle_id.to_string(),
            OffsetDateTime::now_utc(),
        )?;

        self.modify(|state| {
            if !state.cattle.iter().any(|cattle| cattle.id == cattle_id) {
                return Err(AppError::invalid_input("cattle not found"));
            }
            state.events.push(event.clone());
            Ok(())
        })?;

        info!(cattle = cattle_id, event = %event.id, kind = ?event.kind, "event created");
        Ok(event)
    }

    fn list_events(&self, cattle_id: &str) -> Result<Vec<Event>, AppError> {
        let cattle_id = require_id("cattle id", cattle_id)?;
        let state = self.load()?;
        if !state.cattle.iter().any(|cattle| cattle.id == cattle_id) {
            return Err(AppError::invalid_input("cattle not found"));
        }

        Ok(state
            .events
            .into_iter()
            .filter(|event| event.cattle_id == cattle_id)
            .collect())
    }

    fn update_event(
        &self,
        cattle_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<Event, AppError> {
        let cattle_id = require_id("cattle id", cattle_id)?;
        let event_id = require_id("event id", event_id)?;

        self.modify(|state| {
            let index = event_position(state, cattle_id, event_id)?;
            let event = &mut state.events[index];
            event.apply(patch);
            event.validate()?;
            Ok(event.clone())
        })
    }

    fn delete_event(&self, cattle_id: &str, event_id: &str) -> Result<Event, AppError> {
        let cattle_id = require_id("cattle id", cattle_id)?;
        let event_id = require_id("event id", event_id)?;

        let removed = self.modify(|state| {
            let index = event_position(state, cattle_id, event_id)?;
            Ok(state.events.remove(index))
        })?;

        info!(cattle = cattle_id, event = event_id, "event deleted");
        Ok(removed)
    }
}

impl CattleStore for JsonStore {
    fn create_cattle(&self, cattle: NewCattle) -> Result<Cattle, AppError> {
        let cattle = cattle.into_cattle(new_id("cow"), OffsetDateTime::now_utc())?;

        self.modify_cattle(|state| {
            state.cattle.push(cattle.clone());
            Ok(())
        })?;

        info!(cattle = %cattle.id, name = %cattle.name, "cattle registered");
        Ok(cattle)
    }

    fn list_cattle(&self) -> Result<Vec<Cattle>, AppError> {
        Ok(self.load()?.cattle)
    }

    fn get_cattle(&self, id: &str) -> Result<Cattle, AppError> {
        let id = require_id("cattle id", id)?;
        self.load()?
            .cattle
            .into_iter()
            .find(|cattle| cattle.id == id)
            .ok_or_else(|| AppError::invalid_input("cattle not found"))
    }

    fn update_cattle(&self, id: &str, patch: &CattlePatch) -> Result<Cattle, AppError> {
        let id = require_id("cattle id", id)?;
        let patch = patch.clone().normalized()?;

        self.modify_cattle(|state| {
            let cattle = cattle_mut(state, id)?;
            cattle.apply(&patch);
            Ok(cattle.clone())
        })
    }

    fn delete_cattle(&self, id: &str) -> Result<Cattle, AppError> {
        let id = require_id("cattle id", id)?;

        let removed = self.modify_cattle(|state| {
            let index = state
                .cattle
                .iter()
                .position(|cattle| cattle.id == id)
                .ok_or_else(|| AppError::invalid_input("cattle not found"))?;
            state.events.retain(|event| event.cattle_id != id);
            Ok(state.cattle.remove(index))
        })?;

        info!(cattle = id, "cattle deleted with its events");
        Ok(removed)
    }

    fn set_next_injection(&self, id: &str, date: Option<Date>) -> Result<Cattle, AppError> {
        let current = self.get_cattle(id)?;
        if current.next_injection == date {
            return Ok(current);
        }

        self.modify_cattle(|state| {
            let cattle = cattle_mut(state, &current.id)?;
            cattle.next_injection = date;
            Ok(cattle.clone())
        })
    }

    fn subscribe_cattle<F>(&self, on_change: F) -> Result<Subscription, AppError>
    where
        F: Fn(&[Cattle]) + Send + Sync + 'static,
    {
        let current = self.list_cattle()?;
        on_change(&current);
        Ok(self.watchers.add(on_change))
    }
}
