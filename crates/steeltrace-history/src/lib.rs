//! SteelTrace History: run log and latency SLOs
//!
//! Every orchestration appends one `Run` to an NDJSON log. The SLO report is
//! then rebuilt from the whole log, never updated incrementally.
//!
//! # Example
//!
//! ```ignore
//! use steeltrace_history::{RunHistoryStore, SloReport};
//!
//! let store = RunHistoryStore::new("ops/slo_history.jsonl");
//! store.append(&run)?;
//! let history = store.load_all()?;
//! let report = SloReport::from_history(&history.runs, &run);
//! report.write_to(Path::new("ops/slo_report.json"))?;
//! ```

pub mod error;
pub mod report;
pub mod slo;
pub mod store;

pub use error::HistoryError;
pub use report::SloReport;
pub use slo::{p95, SloAggregator, StageLatency, SMALL_SAMPLE_THRESHOLD};
pub use store::{HistoryLoad, RunHistoryStore};
