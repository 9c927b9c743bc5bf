use crate::error::AppError;
use crate::model::format_date;
use time::Date;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

/// An injection that needs attention today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub cattle_id: String,
    pub cattle_name: String,
    pub event_id: String,
    pub note: String,
    pub due: Date,
    /// One-off injection whose date has passed without completion.
    pub overdue: bool,
}

impl Reminder {
    pub fn summary(&self) -> String {
        format!("Injection due for {}", self.cattle_name)
    }

    pub fn body(&self) -> String {
        let when = if self.overdue { "overdue since" } else { "due" };
        format!("{} ({} {})", self.note, when, format_date(self.due))
    }
}

pub trait Notifier {
    fn notify(&self, reminder: &Reminder) -> Result<(), AppError>;

    fn notify_with_action(&self, reminder: &Reminder, action: &str) -> Result<(), AppError> {
        let _ = action;
        self.notify(reminder)
    }
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _reminder: &Reminder) -> Result<(), AppError> {
        Ok(())
    }
}

pub fn notifier_from_env() -> Result<Box<dyn Notifier>, AppError> {
    if std::env::var("HERD_DISABLE_NOTIFICATIONS").is_ok() {
        return Ok(Box::new(NoopNotifier));
    }

    match platform_notifier() {
        Ok(notifier) => Ok(notifier),
        Err(AppError::InvalidData(_)) => Ok(Box::new(NoopNotifier)),
        Err(other) => Err(other),
    }
}

const ACTION_PREFIX: &str = "calendar:";

pub fn activation_argument(cattle_id: &str) -> String {
    format!("{ACTION_PREFIX}{cattle_id}")
}

pub fn parse_activation_argument(argument: &str) -> Option<String> {
    argument
        .strip_prefix(ACTION_PREFIX)
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
}

/// Open the calendar of `cattle_id` in a new `herd` process.
pub fn launch_calendar(cattle_id: &str) -> Result<(), AppError> {
    let exe = std::env::current_exe().map_err(|err| AppError::invalid_data(err.to_string()))?;
    std::process::Command::new(exe)
        .arg("calendar")
        .arg(cattle_id)
        .spawn()
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    Ok(())
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}
