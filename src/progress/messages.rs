/*!
 * Push-channel message shapes.
 *
 * Every message carries an RFC 3339 timestamp. Clients answer heartbeats
 * with pongs; a connection that stays silent past the timeout is dead.
 */

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::progress::tracker::TaskStatus;

/// Seconds between heartbeats to connected clients
pub const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Seconds of client silence after which a connection counts as dead
pub const CONNECTION_TIMEOUT_SECS: u64 = 60;

/// A message on the push channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotificationMessage {
    /// Progress update for one task
    Progress {
        /// The task this update belongs to
        task_id: String,
        /// Progress in [0,100]
        progress: u8,
        /// Current task status
        status: TaskStatus,
        /// RFC 3339 timestamp
        timestamp: String,
    },
    /// A task failed
    Error {
        /// Captured error message (bounded length)
        error: String,
        /// The task that failed
        task_id: String,
        /// RFC 3339 timestamp
        timestamp: String,
    },
    /// Server liveness probe
    Heartbeat {
        /// RFC 3339 timestamp
        timestamp: String,
    },
    /// Client liveness answer
    Pong {
        /// RFC 3339 timestamp
        timestamp: String,
    },
}

impl NotificationMessage {
    /// Build a progress message stamped now
    pub fn progress(task_id: &str, progress: u8, status: TaskStatus) -> Self {
        Self::Progress {
            task_id: task_id.to_string(),
            progress,
            status,
            timestamp: now_rfc3339(),
        }
    }

    /// Build an error message stamped now
    pub fn error(task_id: &str, error: &str) -> Self {
        Self::Error {
            error: error.to_string(),
            task_id: task_id.to_string(),
            timestamp: now_rfc3339(),
        }
    }

    /// Build a heartbeat stamped now
    pub fn heartbeat() -> Self {
        Self::Heartbeat { timestamp: now_rfc3339() }
    }

    /// Build a pong stamped now
    pub fn pong() -> Self {
        Self::Pong { timestamp: now_rfc3339() }
    }
}

/// Current time as an RFC 3339 string
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
