//! User-visible notifications.

use notify_rust::Notification;

/// Fire-and-forget notification sink. Must never block the pipeline.
pub trait Notifier: Send + Sync {
    fn display(&self, title: &str, subtitle: Option<&str>);
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn display(&self, title: &str, subtitle: Option<&str>) {
        tracing::info!(title, subtitle = subtitle.unwrap_or_default(), "Notification");
    }
}

/// Shows a desktop notification via `notify-rust` (D-Bus on Linux, the
/// notification centre on macOS) and always logs it as well.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    fn notification(&self, title: &str, subtitle: Option<&str>) -> Notification {
        let mut notification = Notification::new();
        notification.appname(&self.app_name).summary(title);
        if let Some(body) = subtitle {
            notification.body(body);
        }
        notification
    }
}

impl Notifier for DesktopNotifier {
    fn display(&self, title: &str, subtitle: Option<&str>) {
        LogNotifier.display(title, subtitle);

        if let Err(e) = self.notification(title, subtitle).show() {
            tracing::warn!(error = %e, title, "Desktop notification could not be shown");
        }
    }
}
