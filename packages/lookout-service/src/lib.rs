pub mod auto_apply;
pub mod navigation;
pub mod store;
pub mod tracking;

mod error;

pub use auto_apply::{ActiveFilterProbe, AutoApplyDefault, AutoApplyVisit};
pub use error::{Error, Result};
pub use store::{LoadState, SavedSearchStore, StoreConfig};
pub use tracking::{
	DefaultAction, LogNotifier, LogTracker, Navigator, Notifier, Tracker, TrackingAction,
	TrackingEvent, TrackingPage,
};
