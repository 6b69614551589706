//! Matching a user-supplied application name against running applications.

use crate::capture::CapturableApplication;

/// Finds the application a user meant by `query`.
///
/// Matching ignores surrounding whitespace and case. An exact name match
/// wins; otherwise the first application (in `candidates` order) whose name
/// contains the query is chosen. An empty query never matches.
///
/// # Example
///
/// ```
/// use app_audio_recorder::capture::CapturableApplication;
/// use app_audio_recorder::target::match_application;
///
/// let apps = vec![
///     CapturableApplication::new("Apple Music", 100),
///     CapturableApplication::new("Safari", 200),
/// ];
/// let found = match_application("music", &apps).unwrap();
/// assert_eq!(found.name, "Apple Music");
/// ```
pub fn match_application<'a>(
    query: &str,
    candidates: &'a [CapturableApplication],
) -> Option<&'a CapturableApplication> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    let folded: Vec<String> = candidates.iter().map(|a| a.name.to_lowercase()).collect();

    let index = folded
        .iter()
        .position(|name| *name == query)
        .or_else(|| folded.iter().position(|name| name.contains(&query)))?;

    let found = &candidates[index];
    tracing::debug!(query = %query, matched = %found.name, pid = found.process_id, "matched application");
    Some(found)
}

/// Sorts applications by name, ignoring case.
pub fn sort_applications(applications: &mut [CapturableApplication]) {
    applications.sort_by_cached_key(|a| a.name.to_lowercase());
}
