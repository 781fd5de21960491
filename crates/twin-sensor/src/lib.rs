//! Activity acquisition for the digital twin.
//!
//! Collects the two raw telemetry feeds the timeline core consumes:
//! window-focus events from a local ActivityWatch server and browser
//! visits from the browser's own history database. Also owns the
//! sensor-log lifecycle: one JSON payload per sensing run, discovered
//! and parsed back for timeline processing.
//!
//! Acquisition degrades, it does not abort: an unreachable watcher or a
//! locked history file yields an empty feed with a warning, and the run
//! continues with whatever was captured.

pub mod aw;
pub mod history;
pub mod logs;

pub use aw::AwClient;
pub use logs::SensorLog;
