use crate::error::AppError;
use crate::notify::{Notifier, Reminder, launch_calendar, parse_activation_argument};
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, reminder: &Reminder) -> Result<(), AppError> {
        self.notify_with_action(reminder, "")
    }

    fn notify_with_action(&self, reminder: &Reminder, action: &str) -> Result<(), AppError> {
        let cattle_id = reminder.cattle_id.clone();
        let action_value = action.to_string();
        let mut toast = Toast::new(Toast::POWERSHELL_APP_ID)
            .title(&reminder.summary())
            .text1(&reminder.body())
            .text2(&reminder.cattle_id);

        if !action_value.trim().is_empty() {
            toast = toast.add_button("Open calendar", &action_value);
        }

        toast
            .on_activated(move |args| {
                let target = match args {
                    Some(args) if args == action_value => Some(cattle_id.clone()),
                    Some(args) if !args.trim().is_empty() => parse_activation_argument(&args),
                    _ => Some(cattle_id.clone()),
                };
                if let Some(id) = target
                    && let Err(err) = launch_calendar(&id)
                {
                    tracing::warn!(cattle = %id, error = %err, "could not open calendar");
                }
                Ok(())
            })
            .show()
            .map_err(|err| AppError::invalid_data(err.to_string()))?;
        Ok(())
    }
}
