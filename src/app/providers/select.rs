//! Orbit file selection
//!
//! Both providers return lists of orbit files whose validity windows may or
//! may not cover the acquisition instant once margins are applied. This
//! module narrows those lists to the files that actually qualify and orders
//! them so the first entry is the preferred download.

use chrono::{Duration, NaiveDateTime};
use tracing::trace;

use crate::app::models::{OrbitType, ValidityWindow};
use crate::app::products::OrbitFile;
use crate::constants::orbit;

/// The window an orbit file must cover to qualify for a reference instant
///
/// Precise files get a wide leading margin so that the file covering the
/// previous orbital revolution also qualifies; restituted files use a tight
/// margin on both sides.
pub fn required_window(reference: NaiveDateTime, orbit_type: OrbitType) -> ValidityWindow {
    let start =
        reference - Duration::from_std(orbit_type.start_margin()).unwrap_or_else(|_| Duration::zero());
    let stop = reference + Duration::from_std(orbit::STOP_MARGIN).unwrap_or_else(|_| Duration::zero());
    ValidityWindow { start, stop }
}

/// Keep the orbit files that fully cover the required window, ordered best
/// first
///
/// Files sharing an identical validity window are collapsed to the one with
/// the newest creation stamp; reprocessed uploads supersede earlier ones.
/// The survivors are sorted newest-created first.
pub fn select_covering(
    mut files: Vec<OrbitFile>,
    reference: NaiveDateTime,
    orbit_type: OrbitType,
) -> Vec<OrbitFile> {
    let required = required_window(reference, orbit_type);

    files.retain(|file| {
        let qualifies = file.orbit_type == orbit_type
            && file.window.start <= required.start
            && file.window.stop >= required.stop;
        if !qualifies {
            trace!(file = %file.file_name, "Orbit file does not cover required window");
        }
        qualifies
    });

    // Newest created wins within an identical validity window
    files.sort_by(|a, b| {
        (a.window.start, a.window.stop, b.created).cmp(&(b.window.start, b.window.stop, a.created))
    });
    files.dedup_by(|a, b| a.window == b.window);

    files.sort_by(|a, b| b.created.cmp(&a.created));
    files
}
