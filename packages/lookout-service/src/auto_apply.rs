use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

use crate::{Navigator, SavedSearchStore, TrackingAction, navigation};
use lookout_domain::{SavedSearch, triage};
use lookout_storage::SessionFlags;

/// How a page decides whether the user already has filters in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveFilterProbe {
	/// Filters or group-by keys count; the time range does not.
	Triage,
	/// A non-empty `search` parameter counts.
	RuleList,
}
impl ActiveFilterProbe {
	pub fn has_active_filters(self, query: &str) -> bool {
		match self {
			Self::Triage => triage::has_active_triage_state(query),
			Self::RuleList => triage::has_active_rule_list_filters(query),
		}
	}
}

/// Applies a page's default saved search on the first visit of a session.
pub struct AutoApplyDefault {
	flags: Arc<dyn SessionFlags>,
	session_flag: String,
	enabled: bool,
	probe: ActiveFilterProbe,
}
impl AutoApplyDefault {
	pub fn new(
		flags: Arc<dyn SessionFlags>,
		session_flag: impl Into<String>,
		enabled: bool,
		probe: ActiveFilterProbe,
	) -> Self {
		Self { flags, session_flag: session_flag.into(), enabled, probe }
	}

	pub fn rule_list(cfg: &lookout_config::Config, flags: Arc<dyn SessionFlags>) -> Self {
		Self::new(
			flags,
			cfg.pages.rule_list.session_flag.clone(),
			cfg.saved_searches.enabled,
			ActiveFilterProbe::RuleList,
		)
	}

	pub fn triage(cfg: &lookout_config::Config, flags: Arc<dyn SessionFlags>) -> Self {
		Self::new(
			flags,
			cfg.pages.triage.session_flag.clone(),
			cfg.saved_searches.enabled,
			ActiveFilterProbe::Triage,
		)
	}

	/// Starts a visit. Returns `None` when the page is already mounted in this session.
	///
	/// The session flag is checked and set in one step before this returns, so of two racing
	/// mounts exactly one starts a visit. Dropping the visit clears the flag again.
	pub fn mount(&self) -> Option<AutoApplyVisit> {
		if !self.flags.try_set(&self.session_flag) {
			return None;
		}

		Some(AutoApplyVisit {
			flags: self.flags.clone(),
			session_flag: self.session_flag.clone(),
			enabled: self.enabled,
			probe: self.probe,
			applying: AtomicBool::new(false),
		})
	}
}

pub struct AutoApplyVisit {
	flags: Arc<dyn SessionFlags>,
	session_flag: String,
	enabled: bool,
	probe: ActiveFilterProbe,
	applying: AtomicBool,
}
impl AutoApplyVisit {
	/// True only while the default is being fetched and applied.
	pub fn is_applying(&self) -> bool {
		self.applying.load(Ordering::SeqCst)
	}

	/// Applies the default saved search unless filters are already active.
	///
	/// There is no cancellation: dropping the returned future abandons the fetch and nothing
	/// is applied.
	pub async fn run(
		&self,
		store: &SavedSearchStore,
		current_query: &str,
		navigator: &dyn Navigator,
	) -> Option<SavedSearch> {
		if !self.enabled || self.probe.has_active_filters(current_query) {
			return None;
		}

		let _applying = ApplyingGuard::start(&self.applying);
		let default = store.default_search().await?;

		navigation::apply_saved_search(navigator, &store.config().base_path, &default.query);
		store.track(TrackingAction::AutoApply);

		tracing::info!(id = %default.id, "Auto-applied default saved search.");

		Some(default)
	}
}
impl Drop for AutoApplyVisit {
	fn drop(&mut self) {
		self.flags.clear(&self.session_flag);
	}
}

struct ApplyingGuard<'a>(&'a AtomicBool);
impl<'a> ApplyingGuard<'a> {
	fn start(flag: &'a AtomicBool) -> Self {
		flag.store(true, Ordering::SeqCst);

		Self(flag)
	}
}
impl Drop for ApplyingGuard<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::SeqCst);
	}
}
