//! In-memory gateway used by the service tests.
//!
//! Behaves like a tiny version of the remote service: mutations change the
//! stored state, listings return it in insertion order. Individual
//! operations can be slowed down or made to fail.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use homedash_domain::device::{Brightness, Device, DeviceStatus, NewDevice, ToggleOutcome};
use homedash_domain::error::{HomeDashError, ServiceError};
use homedash_domain::id::{DeviceId, SessionId, TaskId};
use homedash_domain::integration::{
    Integration, IntegrationStats, IntegrationStatus, NewIntegration,
};
use homedash_domain::notification::Notification;
use homedash_domain::session::{Credentials, LoginOutcome, SessionContext};
use homedash_domain::task::{NewTask, ScheduledTask};

use crate::ports::{
    AuthGateway, DeviceGateway, IntegrationGateway, NotificationGateway, TaskGateway,
};

#[derive(Default)]
struct State {
    devices: Vec<Device>,
    tasks: Vec<ScheduledTask>,
    notifications: Vec<Notification>,
    integrations: Vec<Integration>,
    calls: Vec<&'static str>,
    brightness_writes: Vec<(DeviceId, u8)>,
    created_tasks: Vec<NewTask>,
    failures: HashMap<&'static str, VecDeque<HomeDashError>>,
    delays: HashMap<&'static str, Duration>,
    next_id: u32,
}

pub(crate) struct FakeGateway {
    state: Mutex<State>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }
}

pub(crate) fn session() -> SessionContext {
    SessionContext::new(SessionId::from("s1"), Some("u1".to_string()))
}

impl FakeGateway {
    pub(crate) fn with_devices(self, devices: Vec<Device>) -> Self {
        self.state.lock().unwrap().devices = devices;
        self
    }

    /// Replace the stored devices, as another client would.
    pub(crate) fn set_devices(&self, devices: Vec<Device>) {
        self.state.lock().unwrap().devices = devices;
    }

    pub(crate) fn with_tasks(self, tasks: Vec<ScheduledTask>) -> Self {
        self.state.lock().unwrap().tasks = tasks;
        self
    }

    pub(crate) fn with_notifications(self, notifications: Vec<Notification>) -> Self {
        self.state.lock().unwrap().notifications = notifications;
        self
    }

    pub(crate) fn with_integrations(self, integrations: Vec<Integration>) -> Self {
        self.state.lock().unwrap().integrations = integrations;
        self
    }

    /// Make the next call to `op` fail with `detail`.
    pub(crate) fn fail_next(&self, op: &'static str, detail: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(op)
            .or_default()
            .push_back(ServiceError::with_detail(detail).into());
    }

    /// Answer every call to `op` after `delay`.
    pub(crate) fn delay(&self, op: &'static str, delay: Duration) {
        self.state.lock().unwrap().delays.insert(op, delay);
    }

    pub(crate) fn calls(&self, op: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| **call == op)
            .count()
    }

    pub(crate) fn brightness_writes(&self) -> Vec<(DeviceId, u8)> {
        self.state.lock().unwrap().brightness_writes.clone()
    }

    pub(crate) fn created_tasks(&self) -> Vec<NewTask> {
        self.state.lock().unwrap().created_tasks.clone()
    }

    pub(crate) fn mark_executed(&self, task_id: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(task) = state.tasks.iter_mut().find(|t| t.task_id.as_str() == task_id) {
            task.executed = true;
        }
    }

    pub(crate) fn set_tasks(&self, tasks: Vec<ScheduledTask>) {
        self.state.lock().unwrap().tasks = tasks;
    }

    /// Run `op` against the state unless a failure was scripted for it, then
    /// answer after the configured delay.
    fn call<R: Send>(
        &self,
        op: &'static str,
        apply: impl FnOnce(&mut State) -> Result<R, HomeDashError>,
    ) -> impl Future<Output = Result<R, HomeDashError>> + Send {
        let mut state = self.state.lock().unwrap();
        state.calls.push(op);
        let delay = state.delays.get(op).copied().unwrap_or_default();
        let scripted = state.failures.get_mut(op).and_then(VecDeque::pop_front);
        let result = match scripted {
            Some(err) => Err(err),
            None => apply(&mut state),
        };
        drop(state);
        async move {
            tokio::time::sleep(delay).await;
            result
        }
    }
}

fn not_found(what: &str) -> HomeDashError {
    ServiceError {
        status: Some(404),
        detail: Some(format!("{what} not found")),
    }
    .into()
}

fn integration_mut<'a>(
    state: &'a mut State,
    name: &str,
) -> Result<&'a mut Integration, HomeDashError> {
    state
        .integrations
        .iter_mut()
        .find(|i| i.name == name)
        .ok_or_else(|| not_found("Integration"))
}

impl DeviceGateway for FakeGateway {
    fn list_devices(
        &self,
        _session: &SessionContext,
    ) -> impl Future<Output = Result<Vec<Device>, HomeDashError>> + Send {
        self.call("list_devices", |state| Ok(state.devices.clone()))
    }

    fn create_device(
        &self,
        _session: &SessionContext,
        device: &NewDevice,
    ) -> impl Future<Output = Result<Device, HomeDashError>> + Send {
        let device = device.clone();
        self.call("create_device", move |state| {
            state.next_id += 1;
            let created = Device::builder()
                .id(format!("device-{}", state.next_id))
                .kind(device.kind)
                .name(device.name)
                .status(DeviceStatus::Off)
                .build()?;
            state.devices.push(created.clone());
            Ok(created)
        })
    }

    fn set_brightness(
        &self,
        _session: &SessionContext,
        id: &DeviceId,
        brightness: Brightness,
    ) -> impl Future<Output = Result<Device, HomeDashError>> + Send {
        let id = id.clone();
        self.call("set_brightness", move |state| {
            state.brightness_writes.push((id.clone(), brightness.value()));
            let device = state
                .devices
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| not_found("Device"))?;
            device.brightness = Some(brightness);
            if brightness.is_positive() {
                device.is_on = Some(true);
                device.status = DeviceStatus::On;
            }
            Ok(device.clone())
        })
    }

    fn toggle_device(
        &self,
        _session: &SessionContext,
        id: &DeviceId,
    ) -> impl Future<Output = Result<ToggleOutcome, HomeDashError>> + Send {
        let id = id.clone();
        self.call("toggle_device", move |state| {
            let device = state
                .devices
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| not_found("Device"))?;
            let is_on = !device.reported_on();
            device.is_on = Some(is_on);
            device.status = if is_on {
                DeviceStatus::On
            } else {
                DeviceStatus::Off
            };
            device.brightness = Some(if is_on {
                Brightness::FULL
            } else {
                Brightness::OFF
            });
            Ok(ToggleOutcome {
                device_id: id,
                is_on,
                status: device.status,
            })
        })
    }

    fn delete_device(
        &self,
        _session: &SessionContext,
        id: &DeviceId,
    ) -> impl Future<Output = Result<(), HomeDashError>> + Send {
        let id = id.clone();
        self.call("delete_device", move |state| {
            let before = state.devices.len();
            state.devices.retain(|d| d.id != id);
            if state.devices.len() == before {
                return Err(not_found("Device"));
            }
            Ok(())
        })
    }
}

impl TaskGateway for FakeGateway {
    fn list_tasks(
        &self,
        _session: &SessionContext,
    ) -> impl Future<Output = Result<Vec<ScheduledTask>, HomeDashError>> + Send {
        self.call("list_tasks", |state| Ok(state.tasks.clone()))
    }

    fn create_task(
        &self,
        _session: &SessionContext,
        task: &NewTask,
    ) -> impl Future<Output = Result<ScheduledTask, HomeDashError>> + Send {
        let task = task.clone();
        self.call("create_task", move |state| {
            state.next_id += 1;
            let created = ScheduledTask {
                task_id: TaskId::from(format!("task-{}", state.next_id)),
                device_id: task.device_id.clone(),
                action: task.action.clone(),
                scheduled_time: task.scheduled_time.clone(),
                executed: false,
                created_at: None,
            };
            state.created_tasks.push(task);
            state.tasks.push(created.clone());
            Ok(created)
        })
    }

    fn cancel_task(
        &self,
        _session: &SessionContext,
        id: &TaskId,
    ) -> impl Future<Output = Result<(), HomeDashError>> + Send {
        let id = id.clone();
        self.call("cancel_task", move |state| {
            state.tasks.retain(|t| t.task_id != id);
            Ok(())
        })
    }
}

impl NotificationGateway for FakeGateway {
    fn list_notifications(
        &self,
        _session: &SessionContext,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Notification>, HomeDashError>> + Send {
        self.call("list_notifications", move |state| {
            Ok(state.notifications.iter().take(limit).cloned().collect())
        })
    }
}

impl IntegrationGateway for FakeGateway {
    fn list_integrations(
        &self,
        _session: &SessionContext,
    ) -> impl Future<Output = Result<Vec<Integration>, HomeDashError>> + Send {
        self.call("list_integrations", |state| Ok(state.integrations.clone()))
    }

    fn integration_stats(
        &self,
        _session: &SessionContext,
    ) -> impl Future<Output = Result<IntegrationStats, HomeDashError>> + Send {
        self.call("integration_stats", |state| {
            Ok(IntegrationStats {
                connected_count: state.integrations.iter().filter(|i| i.connected).count(),
                total_count: state.integrations.len(),
            })
        })
    }

    fn get_integration(
        &self,
        _session: &SessionContext,
        name: &str,
    ) -> impl Future<Output = Result<Integration, HomeDashError>> + Send {
        let name = name.to_string();
        self.call("get_integration", move |state| {
            integration_mut(state, &name).cloned()
        })
    }

    fn create_integration(
        &self,
        _session: &SessionContext,
        integration: &NewIntegration,
    ) -> impl Future<Output = Result<Integration, HomeDashError>> + Send {
        let request = integration.clone();
        self.call("create_integration", move |state| {
            let created = Integration {
                name: request.name,
                description: request.description,
                features: request.features.unwrap_or_default(),
                commands: request.commands.unwrap_or_default(),
                skills: Vec::new(),
                status: IntegrationStatus::Inactive,
                connected: false,
            };
            state.integrations.push(created.clone());
            Ok(created)
        })
    }

    fn toggle_integration(
        &self,
        _session: &SessionContext,
        name: &str,
    ) -> impl Future<Output = Result<Integration, HomeDashError>> + Send {
        let name = name.to_string();
        self.call("toggle_integration", move |state| {
            let integration = integration_mut(state, &name)?;
            integration.connected = !integration.connected;
            Ok(integration.clone())
        })
    }

    fn activate_integration(
        &self,
        _session: &SessionContext,
        name: &str,
    ) -> impl Future<Output = Result<Integration, HomeDashError>> + Send {
        let name = name.to_string();
        self.call("activate_integration", move |state| {
            let integration = integration_mut(state, &name)?;
            integration.status = IntegrationStatus::Active;
            Ok(integration.clone())
        })
    }

    fn deactivate_integration(
        &self,
        _session: &SessionContext,
        name: &str,
    ) -> impl Future<Output = Result<Integration, HomeDashError>> + Send {
        let name = name.to_string();
        self.call("deactivate_integration", move |state| {
            let integration = integration_mut(state, &name)?;
            integration.status = IntegrationStatus::Inactive;
            Ok(integration.clone())
        })
    }

    fn list_skills(
        &self,
        _session: &SessionContext,
        name: &str,
    ) -> impl Future<Output = Result<Vec<String>, HomeDashError>> + Send {
        let name = name.to_string();
        self.call("list_skills", move |state| {
            integration_mut(state, &name).map(|i| i.skills.clone())
        })
    }

    fn add_skill(
        &self,
        _session: &SessionContext,
        name: &str,
        skill: &str,
    ) -> impl Future<Output = Result<(), HomeDashError>> + Send {
        let name = name.to_string();
        let skill = skill.to_string();
        self.call("add_skill", move |state| {
            let integration = integration_mut(state, &name)?;
            if !integration.skills.contains(&skill) {
                integration.skills.push(skill);
            }
            Ok(())
        })
    }
}

impl AuthGateway for FakeGateway {
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<LoginOutcome, HomeDashError>> + Send {
        let accepted = credentials.username == "admin" && credentials.password == "password123";
        self.call("login", move |_| {
            Ok(if accepted {
                LoginOutcome {
                    success: true,
                    message: "Login successful".to_string(),
                    user_id: Some("u1".to_string()),
                    session_id: Some(SessionId::from("s1")),
                }
            } else {
                LoginOutcome {
                    success: false,
                    message: "Invalid username or password".to_string(),
                    user_id: None,
                    session_id: None,
                }
            })
        })
    }

    fn logout(
        &self,
        _session: &SessionContext,
    ) -> impl Future<Output = Result<(), HomeDashError>> + Send {
        self.call("logout", |_| Ok(()))
    }
}
