use serde::Serialize;

/// Which page owns a saved-search collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingPage {
	RuleList,
	Triage,
}
impl TrackingPage {
	/// Events only carry a page discriminator for triage.
	pub fn is_untagged(&self) -> bool {
		matches!(self, Self::RuleList)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultAction {
	Set,
	Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackingAction {
	Save { has_default: bool, total_count: usize },
	Rename,
	Delete,
	SetDefault { action: DefaultAction },
	Apply { is_default: bool },
	AutoApply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackingEvent {
	#[serde(skip_serializing_if = "TrackingPage::is_untagged")]
	pub page: TrackingPage,
	#[serde(flatten)]
	pub action: TrackingAction,
}

/// Fire-and-forget analytics sink.
pub trait Tracker
where
	Self: Send + Sync,
{
	fn track(&self, event: &TrackingEvent);
}

/// User-facing error notifications, such as toasts.
pub trait Notifier
where
	Self: Send + Sync,
{
	fn notify_error(&self, message: &str);
}

/// Moves the page to a new location.
pub trait Navigator
where
	Self: Send + Sync,
{
	fn navigate(&self, location: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogTracker;
impl Tracker for LogTracker {
	fn track(&self, event: &TrackingEvent) {
		match serde_json::to_string(event) {
			Ok(payload) =>
				tracing::info!(target: "lookout::analytics", %payload, "Saved search event."),
			Err(err) => tracing::warn!(
				target: "lookout::analytics",
				error = %err,
				"Failed to encode saved search event."
			),
		}
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;
impl Notifier for LogNotifier {
	fn notify_error(&self, message: &str) {
		tracing::warn!(%message, "User notification.");
	}
}
