/*!
 * Progress tracking and notification fan-out.
 *
 * - `tracker`: per-task progress cells and the poll registry
 * - `broadcaster`: per-user push channel with liveness bookkeeping
 * - `messages`: wire shapes for the push channel
 */

// Re-export main types for easier usage
pub use self::broadcaster::ProgressBroadcaster;
pub use self::messages::{
    CONNECTION_TIMEOUT_SECS, HEARTBEAT_INTERVAL_SECS, NotificationMessage, now_rfc3339,
};
pub use self::tracker::{ProgressHandle, ProgressTracker, TaskProgress, TaskStatus};

// Submodules
pub mod broadcaster;
pub mod messages;
pub mod tracker;
