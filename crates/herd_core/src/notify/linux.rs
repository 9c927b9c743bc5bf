use crate::error::AppError;
use crate::notify::{Notifier, Reminder, launch_calendar};
use notify_rust::Notification;

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, reminder: &Reminder) -> Result<(), AppError> {
        self.notify_with_action(reminder, "")
    }

    fn notify_with_action(&self, reminder: &Reminder, action: &str) -> Result<(), AppError> {
        let mut notification = Notification::new();
        notification.summary(&reminder.summary());
        notification.body(&reminder.body());
        if !action.trim().is_empty() {
            notification.action(action, "Open calendar");
        }

        let handle = notification
            .show()
            .map_err(|err| AppError::invalid_data(err.to_string()))?;

        if !action.trim().is_empty() {
            let action_key = action.to_string();
            let cattle_id = reminder.cattle_id.clone();
            std::thread::spawn(move || {
                let _ = handle.wait_for_action(|selected| {
                    if selected == action_key || selected == "default" {
                        if let Err(err) = launch_calendar(&cattle_id) {
                            tracing::warn!(
                                cattle = %cattle_id,
                                error = %err,
                                "could not open calendar"
                            );
                        }
                    }
                });
            });
        }

        Ok(())
    }
}
