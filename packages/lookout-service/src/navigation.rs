use crate::Navigator;
use lookout_domain::triage;

/// Navigates to `base_path` carrying the saved query string.
pub fn apply_saved_search(navigator: &dyn Navigator, base_path: &str, query: &str) {
	let location = triage::generate_url(query, base_path);

	tracing::debug!(%location, "Applying saved search.");

	navigator.navigate(&location);
}
