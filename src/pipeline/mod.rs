//! Change-detection pipeline.
//!
//! - `fingerprint`: content digests
//! - `aggregate`: group posts by page and cut the trailing window
//! - `diff`: find fingerprints not seen by the previous run
//! - `window_guard`: flag posts that slipped past the window
//! - `cycle`: one fetch → aggregate → diff → report → persist pass
//! - `watch`: the fixed-delay loop around cycles

pub mod aggregate;
pub mod cycle;
pub mod diff;
pub mod fingerprint;
pub mod watch;
pub mod window_guard;

pub use aggregate::{aggregate, build_window, page_number};
pub use cycle::{CycleOutcome, RunCoordinator, resolve_start_page};
pub use diff::{DiffEngine, DiffResult, calculate_diff};
pub use fingerprint::{Fingerprint, fingerprint};
pub use watch::{WatchOptions, WatchSummary, run_watch};
pub use window_guard::{WindowCheck, WindowGuard};
