use crate::{
    constants::*,
    daemon::NotificationDaemon,
    handlers::messages::Message,
};
use cadenza_notifications_util::{ActionId, CloseReason, Notification};
use std::{
    collections::HashMap,
    num::NonZeroU32,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::error;
use zbus::{Connection, connection::Builder as ConnectionBuilder, interface, object_server::SignalEmitter};

/// Daemon events delivered to the main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Notified { id: u32, replaced: bool },
    Resolved { id: u32, reason: CloseReason },
}

/// Work for the bus task, from the interface, sender timers and the main loop.
#[derive(Debug)]
pub enum Input {
    Notified { id: u32, replaced: bool },
    CloseNotification(u32),
    Expired { id: u32, serial: u64 },
    Dismissed(u32),
    Invoke { id: u32, action: ActionId },
}

#[derive(Debug)]
struct Entry {
    notification: Notification,
    serial: u64,
}

#[derive(Debug)]
struct RegistryInner {
    entries: HashMap<u32, Entry>,
    next_id: NonZeroU32,
    next_serial: u64,
}

/// Notifications the bus side currently knows about, shared with the main
/// thread for synchronous lookups.
#[derive(Debug, Clone)]
pub struct Registry(Arc<Mutex<RegistryInner>>);

impl Default for Registry {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(RegistryInner {
            entries: HashMap::new(),
            next_id: NonZeroU32::MIN,
            next_serial: 0,
        })))
    }
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pick the id for a `Notify` call. A non-zero `replaces_id` is reused.
    fn allocate(&self, replaces_id: u32) -> u32 {
        if replaces_id != 0 {
            return replaces_id;
        }

        let mut inner = self.lock();
        loop {
            let id = inner.next_id;
            inner.next_id = id.checked_add(1).unwrap_or_else(|| {
                tracing::warn!("Notification ID overflowed");
                NonZeroU32::MIN
            });
            if !inner.entries.contains_key(&id.get()) {
                return id.get();
            }
        }
    }

    /// Store `notification`, returning the serial that identifies this version.
    fn insert(&self, notification: Notification) -> u64 {
        let mut inner = self.lock();
        let serial = inner.next_serial;
        inner.next_serial += 1;
        inner
            .entries
            .insert(notification.id, Entry { notification, serial });
        serial
    }

    pub fn get(&self, id: u32) -> Option<Notification> {
        self.lock().entries.get(&id).map(|e| e.notification.clone())
    }

    fn remove(&self, id: u32) -> Option<Notification> {
        self.lock().entries.remove(&id).map(|e| e.notification)
    }

    /// Remove `id` only if it has not been replaced since `serial` was issued.
    fn remove_if_current(&self, id: u32, serial: u64) -> bool {
        let mut inner = self.lock();
        match inner.entries.get(&id) {
            Some(entry) if entry.serial == serial => {
                inner.entries.remove(&id);
                true
            }
            _ => false,
        }
    }

}

#[derive(Debug)]
pub struct Conns {
    notifications: Connection,
    pub tx: UnboundedSender<Input>,
    rx: UnboundedReceiver<Input>,
}

impl Conns {
    pub async fn new(registry: Registry) -> zbus::Result<Self> {
        let (tx, rx) = unbounded_channel();

        for attempt in 1..=DBUS_CONNECT_ATTEMPTS {
            if let Some(conn) = ConnectionBuilder::session()
                .ok()
                .and_then(|conn| conn.name(DBUS_NAME).ok())
                .and_then(|conn| {
                    conn.serve_at(
                        DBUS_PATH,
                        Notifications {
                            tx: tx.clone(),
                            registry: registry.clone(),
                        },
                    )
                    .ok()
                })
                .map(ConnectionBuilder::build)
            {
                match conn.await {
                    Ok(conn) => {
                        return Ok(Self {
                            notifications: conn,
                            tx,
                            rx,
                        });
                    }
                    Err(err) => error!("Failed to build connection (attempt {attempt}): {err}"),
                }
            } else {
                error!("Failed to create connection at {DBUS_PATH} (attempt {attempt})");
            }
            tokio::time::sleep(Duration::from_millis(DBUS_RETRY_DELAY_MS)).await;
        }

        Err(zbus::Error::Failure(
            "Failed to create the dbus server".to_string(),
        ))
    }

    async fn emit_closed(&self, id: u32, reason: CloseReason) {
        let object_server = self.notifications.object_server();
        let Ok(iface_ref) = object_server.interface::<_, Notifications>(DBUS_PATH).await else {
            return;
        };
        if let Err(err) =
            Notifications::notification_closed(iface_ref.signal_emitter(), id, reason as u32).await
        {
            error!("Failed to signal closed notification {id}: {err}");
        }
    }

    async fn emit_action(&self, id: u32, action: &ActionId) {
        let object_server = self.notifications.object_server();
        let Ok(iface_ref) = object_server.interface::<_, Notifications>(DBUS_PATH).await else {
            return;
        };
        if let Err(err) =
            Notifications::action_invoked(iface_ref.signal_emitter(), id, &action.to_string()).await
        {
            error!("Failed to signal action {action} on notification {id}: {err}");
        }
    }
}

struct Start;
struct Waiting;

struct Machine<S> {
    registry: Registry,
    output: UnboundedSender<Message>,
    marker: core::marker::PhantomData<S>,
}

impl<S> Machine<S> {
    fn new(registry: Registry, output: UnboundedSender<Message>) -> Self {
        Self {
            registry,
            output,
            marker: core::marker::PhantomData,
        }
    }

    fn transition<Next>(self) -> Machine<Next> {
        Machine::<Next> {
            registry: self.registry,
            output: self.output,
            marker: core::marker::PhantomData,
        }
    }

    fn post(&self, event: Event) {
        if let Err(err) = self.output.send(Message::Daemon(event)) {
            error!("Failed to send notification event to main loop: {err}");
        }
    }
}

impl Machine<Start> {
    async fn exec(self) -> zbus::Result<(Machine<Waiting>, Conns)> {
        let conns = Conns::new(self.registry.clone()).await?;
        Ok((self.transition::<Waiting>(), conns))
    }
}

/// What the bus task does with one [`Input`].
#[derive(Debug, Default, PartialEq, Eq)]
struct Step {
    action: Option<(u32, ActionId)>,
    event: Option<Event>,
    closed: Option<(u32, CloseReason)>,
}

impl Step {
    fn resolve(id: u32, reason: CloseReason) -> Self {
        Self {
            event: Some(Event::Resolved { id, reason }),
            closed: Some((id, reason)),
            ..Self::default()
        }
    }
}

/// Apply `input` to the registry. Invoking an action resolves the
/// notification as dismissed unless it is resident.
fn step(registry: &Registry, input: Input) -> Step {
    match input {
        Input::Notified { id, replaced } => Step {
            event: Some(Event::Notified { id, replaced }),
            ..Step::default()
        },
        Input::CloseNotification(id) => {
            if registry.remove(id).is_some() {
                Step::resolve(id, CloseReason::CloseNotification)
            } else {
                tracing::debug!("CloseNotification for unknown id {id}");
                Step::default()
            }
        }
        Input::Expired { id, serial } => {
            if registry.remove_if_current(id, serial) {
                tracing::trace!("notification {id} expired");
                Step::resolve(id, CloseReason::Expired)
            } else {
                Step::default()
            }
        }
        Input::Dismissed(id) => Step {
            closed: Some((id, CloseReason::Dismissed)),
            ..Step::default()
        },
        Input::Invoke { id, action } => {
            let Some(notification) = registry.get(id) else {
                tracing::debug!("action {action} on unknown id {id}");
                return Step::default();
            };
            let mut step = if notification.resident() {
                Step::default()
            } else {
                registry.remove(id);
                Step::resolve(id, CloseReason::Dismissed)
            };
            step.action = Some((id, action));
            step
        }
    }
}

impl Machine<Waiting> {
    async fn exec(self, mut conns: Conns) {
        while let Some(next) = conns.rx.recv().await {
            let Step {
                action,
                event,
                closed,
            } = step(&self.registry, next);

            if let Some((id, action)) = action {
                conns.emit_action(id, &action).await;
            }
            if let Some(event) = event {
                self.post(event);
            }
            if let Some((id, reason)) = closed {
                conns.emit_closed(id, reason).await;
            }
        }
        tracing::debug!("notification input channel closed");
    }
}

/// Main-thread handle to the bus side.
#[derive(Debug, Clone)]
pub struct DbusDaemon {
    registry: Registry,
    tx: UnboundedSender<Input>,
}

impl DbusDaemon {
    fn send(&self, input: Input) {
        if let Err(err) = self.tx.send(input) {
            error!("Notification bus task gone, dropping {:?}", err.0);
        }
    }
}

impl NotificationDaemon for DbusDaemon {
    fn get_notification(&self, id: u32) -> Option<Notification> {
        self.registry.get(id)
    }

    fn dismiss(&self, id: u32) {
        if self.registry.remove(id).is_some() {
            self.send(Input::Dismissed(id));
        }
    }

    fn invoke(&self, id: u32, action: &ActionId) {
        self.send(Input::Invoke {
            id,
            action: action.clone(),
        });
    }
}

/// Claim the notifications bus name and start serving it.
///
/// Events are posted to `output` for the life of the process.
pub async fn start(output: UnboundedSender<Message>) -> zbus::Result<DbusDaemon> {
    let registry = Registry::default();
    let (waiting, conns) = Machine::<Start>::new(registry.clone(), output).exec().await?;
    let daemon = DbusDaemon {
        registry,
        tx: conns.tx.clone(),
    };

    tokio::spawn(waiting.exec(conns));
    tracing::info!("serving {DBUS_NAME} at {DBUS_PATH}");
    Ok(daemon)
}

pub struct Notifications {
    tx: UnboundedSender<Input>,
    registry: Registry,
}

impl Notifications {
    fn send(&self, input: Input) {
        if let Err(err) = self.tx.send(input) {
            tracing::error!("Failed to send notification input: {}", err);
        }
    }
}

#[interface(name = "org.freedesktop.Notifications")]
impl Notifications {
    async fn close_notification(&self, id: u32) {
        self.send(Input::CloseNotification(id));
    }

    /// "actions"	The server will provide the specified actions to the user.
    /// "body"	Supports body text.
    /// "persistence"	Notifications are retained until acknowledged or removed by the user or recalled by the sender.
    async fn get_capabilities(&self) -> Vec<&'static str> {
        vec!["actions", "body", "persistence"]
    }

    #[zbus(out_args("name", "vendor", "version", "spec_version"))]
    async fn get_server_information(
        &self,
    ) -> (&'static str, &'static str, &'static str, &'static str) {
        (SERVER_NAME, SERVER_VENDOR, VERSION, PROTOCOL_VERSION)
    }

    /// replaces_id	UINT32	The optional notification ID that this notification replaces. A value of 0 means that this notification won't replace any existing notifications.
    ///
    /// expire_timeout	INT32	Milliseconds after which the notification closes on its own. -1 leaves it to the server, 0 means never.
    #[allow(clippy::too_many_arguments)]
    async fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, zbus::zvariant::Value<'_>>,
        expire_timeout: i32,
    ) -> u32 {
        let id = self.registry.allocate(replaces_id);
        let n = Notification::new(
            app_name,
            id,
            app_icon,
            summary,
            body,
            actions,
            hints,
            expire_timeout,
        );
        let serial = self.registry.insert(n);

        if let Ok(ms @ 1..) = u64::try_from(expire_timeout) {
            let tx = self.tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                _ = tx.send(Input::Expired { id, serial });
            });
        }

        self.send(Input::Notified {
            id,
            replaced: replaces_id != 0,
        });

        id
    }

    #[zbus(signal)]
    async fn action_invoked(
        signal_ctxt: &SignalEmitter<'_>,
        id: u32,
        action_key: &str,
    ) -> zbus::Result<()>;

    /// id	UINT32	The ID of the notification that was closed.
    /// reason	UINT32	1 expired, 2 dismissed by the user, 3 closed by CloseNotification, 4 undefined.
    #[zbus(signal)]
    async fn notification_closed(
        signal_ctxt: &SignalEmitter<'_>,
        id: u32,
        reason: u32,
    ) -> zbus::Result<()>;
}
