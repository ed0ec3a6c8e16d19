use std::{
	sync::{Arc, Barrier},
	thread,
	time::Duration,
};

use tokio::time;

use lookout_service::{
	ActiveFilterProbe, AutoApplyDefault, SavedSearchStore, TrackingAction, TrackingEvent,
	TrackingPage,
};
use lookout_storage::{KeyValueStore, MemorySessionFlags, ScopedStorage, SessionFlags};
use lookout_testkit::{
	GatedStore, NAMESPACE, RecordingNavigator, RecordingNotifier, RecordingTracker, StoreHarness,
	store_config,
};

const TRIAGE_FLAG: &str = "grafana.alerting.triagePage.visited";
const RULE_LIST_FLAG: &str = "grafana.alerting.ruleList.visited";

async fn triage_with_default() -> StoreHarness {
	let harness = StoreHarness::new(TrackingPage::Triage);
	let saved = harness
		.store
		.save_search("Critical by team", "var-filters=severity%7C%3D%7Ccritical&var-groupBy=team")
		.await
		.expect("Failed to save.");

	harness.store.set_default_search(Some(&saved.id)).await.expect("Failed to set default.");

	harness
}

fn triage_controller(flags: Arc<MemorySessionFlags>, enabled: bool) -> AutoApplyDefault {
	AutoApplyDefault::new(flags, TRIAGE_FLAG, enabled, ActiveFilterProbe::Triage)
}

/// Triage store whose first read blocks until the backend is released.
async fn gated_triage_store() -> (Arc<GatedStore>, Arc<RecordingTracker>, SavedSearchStore) {
	let backend = Arc::new(GatedStore::new());
	let tracker = Arc::new(RecordingTracker::default());

	backend
		.set_item(
			NAMESPACE,
			"triageSavedSearches",
			r#"[{"id":"d","name":"Default","query":"var-groupBy=team","isDefault":true,"createdAt":1}]"#,
		)
		.await
		.expect("Failed to seed.");

	let store = SavedSearchStore::new(
		store_config(TrackingPage::Triage),
		ScopedStorage::new(backend.clone(), NAMESPACE),
		tracker.clone(),
		Arc::new(RecordingNotifier::default()),
	);

	(backend, tracker, store)
}

/// Session flags that stall every call, widening any gap between check and set.
#[derive(Default)]
struct SlowFlags(MemorySessionFlags);
impl SessionFlags for SlowFlags {
	fn is_set(&self, key: &str) -> bool {
		thread::sleep(Duration::from_millis(20));

		self.0.is_set(key)
	}

	fn try_set(&self, key: &str) -> bool {
		thread::sleep(Duration::from_millis(20));

		self.0.try_set(key)
	}

	fn clear(&self, key: &str) {
		self.0.clear(key);
	}
}

#[tokio::test]
async fn applies_default_on_first_visit() {
	let harness = triage_with_default().await;
	let flags = Arc::new(MemorySessionFlags::new());
	let navigator = RecordingNavigator::default();
	let controller = triage_controller(flags.clone(), true);
	let visit = controller.mount().expect("First mount must start a visit.");

	assert!(flags.is_set(TRIAGE_FLAG));

	let applied = visit.run(&harness.store, "from=now-4h&to=now", &navigator).await;

	assert_eq!(applied.map(|search| search.name), Some("Critical by team".to_string()));
	assert!(!visit.is_applying());
	assert_eq!(
		navigator.locations(),
		vec![
			"/alerting/triage?var-filters=severity%7C%3D%7Ccritical&var-groupBy=team".to_string()
		]
	);
	assert_eq!(
		harness.tracker.events().last().copied(),
		Some(TrackingEvent { page: TrackingPage::Triage, action: TrackingAction::AutoApply })
	);
}

#[tokio::test]
async fn second_mount_in_same_session_is_skipped_until_unmount() {
	let flags = Arc::new(MemorySessionFlags::new());
	let controller = triage_controller(flags.clone(), true);
	let visit = controller.mount().expect("First mount must start a visit.");

	assert!(controller.mount().is_none());

	drop(visit);

	assert!(!flags.is_set(TRIAGE_FLAG));
	assert!(controller.mount().is_some());
}

#[tokio::test]
async fn active_filters_block_auto_apply() {
	let harness = triage_with_default().await;
	let navigator = RecordingNavigator::default();
	let controller = triage_controller(Arc::new(MemorySessionFlags::new()), true);
	let visit = controller.mount().expect("First mount must start a visit.");

	assert!(visit.run(&harness.store, "var-groupBy=severity", &navigator).await.is_none());
	assert!(navigator.locations().is_empty());
}

#[tokio::test]
async fn custom_time_range_alone_does_not_block_auto_apply() {
	let harness = triage_with_default().await;
	let navigator = RecordingNavigator::default();
	let controller = triage_controller(Arc::new(MemorySessionFlags::new()), true);
	let visit = controller.mount().expect("First mount must start a visit.");

	assert!(visit.run(&harness.store, "from=now-30d&to=now-1d", &navigator).await.is_some());
}

#[tokio::test]
async fn disabled_feature_never_applies() {
	let harness = triage_with_default().await;
	let navigator = RecordingNavigator::default();
	let controller = triage_controller(Arc::new(MemorySessionFlags::new()), false);
	let visit = controller.mount().expect("First mount must start a visit.");

	assert!(visit.run(&harness.store, "", &navigator).await.is_none());
	assert!(navigator.locations().is_empty());
}

#[tokio::test]
async fn no_default_means_nothing_to_apply() {
	let harness = StoreHarness::new(TrackingPage::RuleList);
	let navigator = RecordingNavigator::default();

	harness.store.save_search("not default", "search=state%3Afiring").await.expect("Failed to save.");

	let controller = AutoApplyDefault::new(
		Arc::new(MemorySessionFlags::new()),
		RULE_LIST_FLAG,
		true,
		ActiveFilterProbe::RuleList,
	);
	let visit = controller.mount().expect("First mount must start a visit.");

	assert!(visit.run(&harness.store, "", &navigator).await.is_none());
	assert!(!visit.is_applying());
	assert!(navigator.locations().is_empty());
}

#[tokio::test]
async fn rule_list_search_blocks_auto_apply() {
	let harness = StoreHarness::new(TrackingPage::RuleList);
	let navigator = RecordingNavigator::default();
	let saved = harness.store.save_search("mine", "search=owner%3Ame").await.expect("Failed to save.");

	harness.store.set_default_search(Some(&saved.id)).await.expect("Failed to set default.");

	let controller = AutoApplyDefault::new(
		Arc::new(MemorySessionFlags::new()),
		RULE_LIST_FLAG,
		true,
		ActiveFilterProbe::RuleList,
	);
	let visit = controller.mount().expect("First mount must start a visit.");

	assert!(visit.run(&harness.store, "search=team%3Aops", &navigator).await.is_none());
	assert_eq!(
		visit.run(&harness.store, "view=grouped", &navigator).await.map(|search| search.id),
		Some(saved.id)
	);
	assert_eq!(navigator.locations(), vec!["/alerting/list?search=owner%3Ame".to_string()]);
}

#[test]
fn racing_mounts_start_exactly_one_visit() {
	let controller = AutoApplyDefault::new(
		Arc::new(SlowFlags::default()),
		TRIAGE_FLAG,
		true,
		ActiveFilterProbe::Triage,
	);
	let barrier = Barrier::new(2);
	let visits = thread::scope(|scope| {
		let first = scope.spawn(|| {
			barrier.wait();

			controller.mount()
		});
		let second = scope.spawn(|| {
			barrier.wait();

			controller.mount()
		});

		[first, second].map(|handle| handle.join().expect("Mount thread panicked."))
	});

	assert_eq!(visits.iter().filter(|visit| visit.is_some()).count(), 1);
}

#[tokio::test]
async fn applying_flag_is_raised_while_the_default_is_fetched() {
	let (backend, tracker, store) = gated_triage_store().await;
	let navigator = RecordingNavigator::default();
	let controller = triage_controller(Arc::new(MemorySessionFlags::new()), true);
	let visit = controller.mount().expect("First mount must start a visit.");
	let mut run = Box::pin(visit.run(&store, "", &navigator));

	assert!(time::timeout(Duration::from_millis(20), &mut run).await.is_err());
	assert!(visit.is_applying());

	backend.release();

	let applied = run.await;

	assert_eq!(applied.map(|search| search.id), Some("d".to_string()));
	assert!(!visit.is_applying());
	assert_eq!(navigator.locations(), vec!["/alerting/triage?var-groupBy=team".to_string()]);
	assert_eq!(tracker.events().len(), 1);
}

#[tokio::test]
async fn unmount_mid_fetch_applies_nothing() {
	let (backend, tracker, store) = gated_triage_store().await;
	let navigator = RecordingNavigator::default();
	let flags = Arc::new(MemorySessionFlags::new());
	let controller = triage_controller(flags.clone(), true);
	let visit = controller.mount().expect("First mount must start a visit.");
	let mut run = Box::pin(visit.run(&store, "", &navigator));

	assert!(time::timeout(Duration::from_millis(20), &mut run).await.is_err());
	assert!(visit.is_applying());

	drop(run);

	assert!(!visit.is_applying());

	drop(visit);
	backend.release();
	tokio::task::yield_now().await;

	assert!(navigator.locations().is_empty());
	assert!(tracker.events().is_empty());
	assert!(!flags.is_set(TRIAGE_FLAG));
}
