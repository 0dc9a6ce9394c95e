//! Scheduled-task registry — the client's read-through view of the task list.

use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use homedash_domain::device::Device;
use homedash_domain::error::HomeDashError;
use homedash_domain::id::TaskId;
use homedash_domain::session::SessionContext;
use homedash_domain::task::{ScheduledTask, TaskForm};
use homedash_domain::time;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::ports::{ConfirmationPrompt, TaskGateway};
use crate::sync::{PollOptions, PollingSynchronizer, Resource};

/// Question asked before cancelling a task.
pub const CANCEL_TASK_PROMPT: &str = "Are you sure you want to cancel this task?";

/// Default polling period of the task list.
pub const DEFAULT_TASK_INTERVAL: Duration = Duration::from_millis(10_000);

/// A task with its display fields resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub task: ScheduledTask,
    /// Name of the target device, or its raw id when the device is unknown.
    pub device_name: String,
    pub action_label: String,
    /// `scheduled_time` in the display offset, or verbatim when unparsable.
    pub formatted_time: String,
    pub executed: bool,
}

/// A task shown as executed never goes back to pending on screen, even if a
/// later snapshot says so.
fn latch_executed(
    shown: &[ScheduledTask],
    mut fetched: Vec<ScheduledTask>,
) -> Vec<ScheduledTask> {
    for task in fetched.iter_mut().filter(|task| !task.executed) {
        task.executed = shown
            .iter()
            .any(|previous| previous.executed && previous.task_id == task.task_id);
    }
    fetched
}

/// Scheduled tasks, refreshed periodically.
pub struct TaskRegistry<G: TaskGateway> {
    gateway: Arc<G>,
    session: SessionContext,
    tasks: PollingSynchronizer<ScheduledTask>,
    display_offset: FixedOffset,
}

impl<G: TaskGateway> TaskRegistry<G> {
    /// Start polling tasks every `interval`. Times are read and shown in
    /// `display_offset`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn mount(
        gateway: Arc<G>,
        session: SessionContext,
        interval: Duration,
        display_offset: FixedOffset,
    ) -> Self {
        let tasks = PollingSynchronizer::spawn_merged(
            PollOptions::new("tasks", interval),
            {
                let gateway = Arc::clone(&gateway);
                let session = session.clone();
                move || {
                    let gateway = Arc::clone(&gateway);
                    let session = session.clone();
                    async move { gateway.list_tasks(&session).await }
                }
            },
            latch_executed,
        );

        Self {
            gateway,
            session,
            tasks,
            display_offset,
        }
    }

    /// Tasks in server order, with names resolved against `devices`.
    #[must_use]
    pub fn views(&self, devices: &[Device]) -> Vec<TaskView> {
        self.tasks
            .snapshot()
            .items()
            .iter()
            .map(|task| TaskView {
                device_name: devices
                    .iter()
                    .find(|device| device.id == task.device_id)
                    .map_or_else(|| task.device_id.to_string(), |device| device.name.clone()),
                action_label: task.action.label().to_string(),
                formatted_time: time::format_for_display(&task.scheduled_time, &self.display_offset),
                executed: task.executed,
                task: task.clone(),
            })
            .collect()
    }

    /// Validate `form`, schedule the task and refresh the list.
    ///
    /// # Errors
    ///
    /// Returns [`HomeDashError::Validation`] without any network call when
    /// the device, date or time is missing or malformed; otherwise the
    /// gateway error. Either message is also shown in the banner.
    #[tracing::instrument(skip(self, form), fields(device_id = %form.device_id))]
    pub async fn schedule(&self, form: TaskForm) -> Result<ScheduledTask, HomeDashError> {
        let request = form
            .into_request(&self.display_offset)
            .map_err(|err| self.surface(err.into(), "Failed to create task"))?;
        let task = self
            .gateway
            .create_task(&self.session, &request)
            .await
            .map_err(|err| self.surface(err, "Failed to create task"))?;
        tracing::info!(task_id = %task.task_id, scheduled_time = %request.scheduled_time, "task scheduled");
        self.tasks.refetch().await;
        Ok(task)
    }

    /// Cancel a task once `prompt` accepts. The task stays listed until the
    /// refetch triggered by a successful cancel has been applied.
    ///
    /// Returns `false` when the user declined.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; its message is also shown in the banner.
    #[tracing::instrument(skip(self, prompt))]
    pub async fn cancel(
        &self,
        task_id: &TaskId,
        prompt: &impl ConfirmationPrompt,
    ) -> Result<bool, HomeDashError> {
        if !prompt.confirm(CANCEL_TASK_PROMPT) {
            return Ok(false);
        }
        self.gateway
            .cancel_task(&self.session, task_id)
            .await
            .map_err(|err| self.surface(err, "Failed to cancel task"))?;
        self.tasks.spawn_refetch();
        Ok(true)
    }

    #[must_use]
    pub fn snapshot(&self) -> Resource<ScheduledTask> {
        self.tasks.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Resource<ScheduledTask>> {
        self.tasks.subscribe()
    }

    #[must_use]
    pub fn updates(&self) -> WatchStream<Resource<ScheduledTask>> {
        self.tasks.updates()
    }

    #[must_use]
    pub fn error_banner(&self) -> Option<String> {
        self.tasks.snapshot().last_error().map(str::to_string)
    }

    pub fn dismiss_error(&self) {
        self.tasks.dismiss_error();
    }

    pub async fn refresh(&self) {
        self.tasks.refetch().await;
    }

    pub fn shutdown(&self) {
        self.tasks.shutdown();
    }

    fn surface(&self, err: HomeDashError, fallback: &str) -> HomeDashError {
        self.tasks.report_error(err.display_message(fallback));
        err
    }
}
