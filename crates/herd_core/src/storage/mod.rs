pub mod json_store;
pub mod watch;

pub use json_store::JsonStore;
pub use watch::Subscription;

use crate::error::AppError;
use crate::model::{Cattle, CattlePatch, Event, EventPatch, NewCattle, NewEvent};
use time::Date;

/// Events scoped to the cattle record that owns them.
pub trait EventStore {
    /// Assigns `id`, `created_at` and `updated_at`.
    fn create_event(&self, cattle_id: &str, event: NewEvent) -> Result<Event, AppError>;

    fn list_events(&self, cattle_id: &str) -> Result<Vec<Event>, AppError>;

    /// Merges `patch` into the stored event and returns the result.
    fn update_event(
        &self,
        cattle_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<Event, AppError>;

    fn delete_event(&self, cattle_id: &str, event_id: &str) -> Result<Event, AppError>;

    fn get_event(&self, cattle_id: &str, event_id: &str) -> Result<Event, AppError> {
        self.list_events(cattle_id)?
            .into_iter()
            .find(|event| event.id == event_id)
            .ok_or_else(|| AppError::invalid_input("event not found"))
    }
}

pub trait CattleStore {
    fn create_cattle(&self, cattle: NewCattle) -> Result<Cattle, AppError>;

    fn list_cattle(&self) -> Result<Vec<Cattle>, AppError>;

    fn get_cattle(&self, id: &str) -> Result<Cattle, AppError>;

    fn update_cattle(&self, id: &str, patch: &CattlePatch) -> Result<Cattle, AppError>;

    /// Removes the cattle record together with its events.
    fn delete_cattle(&self, id: &str) -> Result<Cattle, AppError>;

    fn set_next_injection(&self, id: &str, date: Option<Date>) -> Result<Cattle, AppError>;

    /// Calls `on_change` with the current list now and after every cattle write
    /// made through this store.
    fn subscribe_cattle<F>(&self, on_change: F) -> Result<Subscription, AppError>
    where
        F: Fn(&[Cattle]) + Send + Sync + 'static;
}
