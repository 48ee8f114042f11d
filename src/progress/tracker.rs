/*!
 * Task progress state.
 *
 * Each background run owns exactly one progress cell, written through a
 * `ProgressHandle` that only the run holds. Every transition updates the
 * poll registry unconditionally and then attempts a push to the owning
 * user's live connections, so no update is lost regardless of which channel
 * a client watches.
 */

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::errors::bounded_message;
use crate::progress::broadcaster::ProgressBroadcaster;
use crate::progress::messages::{NotificationMessage, now_rfc3339};

/// Lifecycle state of a background task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// The run is underway
    Processing,
    /// The run finished successfully (progress pinned to 100)
    Completed,
    /// The run failed (error captured, progress frozen)
    Failed,
}

impl TaskStatus {
    /// Whether this status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Poll-able progress record for one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskProgress {
    /// The task this record belongs to
    pub task_id: String,

    /// The user who submitted the task
    pub user_id: String,

    /// Lifecycle state
    pub status: TaskStatus,

    /// Progress in [0,100], non-decreasing until terminal
    pub progress: u8,

    /// Name of the step currently executing
    pub current_step: String,

    /// Human-readable status message
    pub message: String,

    /// RFC 3339 start time
    pub started_at: String,

    /// RFC 3339 completion time, set on terminal transition
    pub completed_at: Option<String>,

    /// Captured error, set on failure
    pub error: Option<String>,

    /// Summary of the run's result, set on completion
    pub result: Option<serde_json::Value>,

    /// Path of the persisted artifact, set on completion
    pub result_path: Option<String>,
}

impl TaskProgress {
    fn new(task_id: &str, user_id: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            user_id: user_id.to_string(),
            status: TaskStatus::Processing,
            progress: 0,
            current_step: "queued".to_string(),
            message: String::new(),
            started_at: now_rfc3339(),
            completed_at: None,
            error: None,
            result: None,
            result_path: None,
        }
    }
}

/// Registry of task progress cells plus the push channel
pub struct ProgressTracker {
    registry: Arc<RwLock<HashMap<String, TaskProgress>>>,
    broadcaster: ProgressBroadcaster,
}

impl ProgressTracker {
    /// Create a tracker pushing through the given broadcaster
    pub fn new(broadcaster: ProgressBroadcaster) -> Self {
        Self {
            registry: Arc::new(RwLock::new(HashMap::new())),
            broadcaster,
        }
    }

    /// Register a new task and hand its single writer to the caller
    pub fn start(&self, task_id: &str, user_id: &str) -> ProgressHandle {
        let progress = TaskProgress::new(task_id, user_id);
        self.registry
            .write()
            .insert(task_id.to_string(), progress);

        self.broadcaster.send_to_user(
            user_id,
            &NotificationMessage::progress(task_id, 0, TaskStatus::Processing),
        );

        ProgressHandle {
            task_id: task_id.to_string(),
            user_id: user_id.to_string(),
            registry: Arc::clone(&self.registry),
            broadcaster: self.broadcaster.clone(),
        }
    }

    /// Poll the current state of a task
    pub fn get(&self, task_id: &str) -> Option<TaskProgress> {
        self.registry.read().get(task_id).cloned()
    }

    /// All tasks of one user, most recent first
    pub fn tasks_for_user(&self, user_id: &str) -> Vec<TaskProgress> {
        let mut tasks: Vec<TaskProgress> = self
            .registry
            .read()
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        tasks
    }

    /// Drop finished tasks from the registry, returning how many were removed
    pub fn remove_terminal(&self) -> usize {
        let mut registry = self.registry.write();
        let before = registry.len();
        registry.retain(|_, t| !t.status.is_terminal());
        before - registry.len()
    }

    /// The broadcaster used for pushes
    pub fn broadcaster(&self) -> &ProgressBroadcaster {
        &self.broadcaster
    }
}

impl Clone for ProgressTracker {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            broadcaster: self.broadcaster.clone(),
        }
    }
}

/// The single writer for one task's progress cell.
///
/// Updates are clamped so observed progress never decreases, and terminal
/// states are final: writes after completion or failure are ignored with a
/// warning rather than resurrecting the task.
#[derive(Clone)]
pub struct ProgressHandle {
    task_id: String,
    user_id: String,
    registry: Arc<RwLock<HashMap<String, TaskProgress>>>,
    broadcaster: ProgressBroadcaster,
}

impl ProgressHandle {
    /// The task this handle writes
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// The owning user
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Record forward progress while processing
    pub fn update(&self, progress: u8, step: &str, message: &str) {
        let clamped = progress.min(100);
        let mut pushed: Option<NotificationMessage> = None;

        {
            let mut registry = self.registry.write();
            let Some(entry) = registry.get_mut(&self.task_id) else {
                return;
            };
            if entry.status.is_terminal() {
                warn!("Ignoring progress update for terminal task {}", self.task_id);
                return;
            }

            // monotonic until terminal
            entry.progress = entry.progress.max(clamped);
            entry.current_step = step.to_string();
            entry.message = message.to_string();
            pushed = Some(NotificationMessage::progress(
                &self.task_id,
                entry.progress,
                entry.status,
            ));
        }

        if let Some(message) = pushed {
            self.broadcaster.send_to_user(&self.user_id, &message);
        }
        debug!("Task {} progress: {} ({})", self.task_id, clamped, step);
    }

    /// Terminal success: pin progress to 100 and attach the result
    pub fn complete(&self, result: serde_json::Value, result_path: Option<String>) {
        {
            let mut registry = self.registry.write();
            let Some(entry) = registry.get_mut(&self.task_id) else {
                return;
            };
            if entry.status.is_terminal() {
                warn!("Ignoring completion of terminal task {}", self.task_id);
                return;
            }

            entry.status = TaskStatus::Completed;
            entry.progress = 100;
            entry.current_step = "done".to_string();
            entry.message = "Completed".to_string();
            entry.completed_at = Some(now_rfc3339());
            entry.result = Some(result);
            entry.result_path = result_path;
        }

        self.broadcaster.send_to_user(
            &self.user_id,
            &NotificationMessage::progress(&self.task_id, 100, TaskStatus::Completed),
        );
    }

    /// Terminal failure: freeze progress and capture a bounded error
    pub fn fail(&self, error: &str) {
        let captured = bounded_message(error);

        {
            let mut registry = self.registry.write();
            let Some(entry) = registry.get_mut(&self.task_id) else {
                return;
            };
            if entry.status.is_terminal() {
                warn!("Ignoring failure of terminal task {}", self.task_id);
                return;
            }

            entry.status = TaskStatus::Failed;
            entry.current_step = "failed".to_string();
            entry.message = captured.clone();
            entry.completed_at = Some(now_rfc3339());
            entry.error = Some(captured.clone());
        }

        // failures go out on both shapes: a status update and the error itself
        self.broadcaster.send_to_user(
            &self.user_id,
            &NotificationMessage::error(&self.task_id, &captured),
        );
        let progress = self
            .registry
            .read()
            .get(&self.task_id)
            .map(|e| e.progress)
            .unwrap_or(0);
        self.broadcaster.send_to_user(
            &self.user_id,
            &NotificationMessage::progress(&self.task_id, progress, TaskStatus::Failed),
        );
    }
}
