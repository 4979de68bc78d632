/// Desktop notifications at interval boundaries
use log::warn;
use notify_rust::Notification;

pub const APP_TITLE: &str = "Pomodoro";

/// Best-effort side channel; implementations must not fail the caller.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Sends through the OS notification service.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, message: &str) {
        if let Err(e) = send_notification(message) {
            eprintln!("Failed to send notification: {}", e);
            warn!("notification `{message}` failed: {e}");
        }
    }
}

fn send_notification(message: &str) -> Result<(), Box<dyn std::error::Error>> {
    Notification::new()
        .summary(APP_TITLE)
        .body(message)
        .appname("pomodoro")
        .show()?;
    Ok(())
}
