use crate::{
    daemon::{Disconnected, NotificationDaemon},
    handlers::messages::Message,
    state::{
        center::{MonitorId, NotificationCenterState},
        lifecycle::NotificationLifecycleManager,
    },
    subscriptions::{
        control::{self, ControlServer, Request},
        notifications::{self, Event},
    },
    views::{center::CenterView, popup::PopupView, tile::NotificationTile},
};
use anyhow::Result;
use cadenza_notifications_config::NotificationsConfig;
use cadenza_notifications_util::{Derived, Subscription};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tracing::{error, info};

const TILE_TOOLTIP: &str = "Notifications";

/// Main-loop state: the lifecycle manager plus everything that observes it.
pub struct App {
    manager: NotificationLifecycleManager,
    center: NotificationCenterState,
    popups: PopupView,
    center_view: CenterView,
    tiles: Vec<NotificationTile>,
    placements: Vec<Derived<bool>>,
    _watchers: Vec<Subscription>,
}

impl App {
    pub fn new(
        daemon: Box<dyn NotificationDaemon>,
        config: NotificationsConfig,
        tx: UnboundedSender<Message>,
        monitors: Vec<MonitorId>,
    ) -> Self {
        let manager = NotificationLifecycleManager::new(daemon, config, tx);
        let center = NotificationCenterState::new();
        let popups = PopupView::new(&manager, &center);
        let center_view = CenterView::new(&manager, &center);

        let tiles: Vec<NotificationTile> = monitors
            .into_iter()
            .map(|monitor| NotificationTile::new(monitor, &manager, &center, TILE_TOOLTIP))
            .collect();

        let mut watchers = vec![popups.visible().subscribe(|visible| {
            tracing::debug!("popup stack {}", if *visible { "shown" } else { "hidden" });
        })];

        let mut placements = Vec::with_capacity(tiles.len());
        for tile in &tiles {
            let monitor = tile.monitor().clone();
            let badge_monitor = monitor.clone();
            watchers.push(tile.badge().subscribe(move |badge| {
                tracing::trace!("tile on {badge_monitor} badge {badge:?}");
            }));

            let placement = center_view.visible_on(monitor.clone());
            watchers.push(placement.subscribe(move |visible| {
                tracing::debug!("center on {monitor} visible={visible}");
            }));
            placements.push(placement);
        }

        Self {
            manager,
            center,
            popups,
            center_view,
            tiles,
            placements,
            _watchers: watchers,
        }
    }

    pub fn update(&mut self, message: Message) {
        match message {
            Message::Daemon(Event::Notified { id, replaced }) => {
                self.manager.on_notified(id, replaced);
            }
            Message::Daemon(Event::Resolved { id, reason }) => {
                tracing::trace!("notification {id} resolved: {reason:?}");
                self.manager.on_resolved(id);
            }
            Message::PopupExpired { id, generation } => {
                self.manager.on_popup_expired(id, generation);
            }
            Message::Control { request, reply } => {
                let answer = self.handle_request(&request);
                if reply.send(answer).is_err() {
                    tracing::debug!("control client left before the reply");
                }
            }
        }
    }

    fn handle_request(&mut self, line: &str) -> String {
        let request = match line.parse::<Request>() {
            Ok(request) => request,
            Err(reply) => {
                tracing::warn!("{reply}");
                return reply;
            }
        };

        match request {
            Request::NotiAct => match self.manager.latest_id() {
                Some(id) => self.manager.invoke_default_action(id),
                None => tracing::debug!("noti-act with no active notifications"),
            },
            Request::ToggleCenter(monitor) => {
                match self.tiles.iter().find(|tile| *tile.monitor() == monitor) {
                    Some(tile) => tile.click(),
                    None => self.center.toggle(monitor),
                }
            }
            Request::DismissAll => self.manager.dismiss_all(),
            Request::ClearHistory => self.manager.clear_history(),
            Request::Invoke { id, action } => self.manager.invoke_action(id, &action),
            Request::Status => return self.status(),
        }
        crate::constants::CONTROL_ACK.to_string()
    }

    /// `active=2 popups=1 history=5 center=eDP-1 tiles=1/2`
    fn status(&self) -> String {
        let center = match self.center.active_monitor() {
            Some(monitor) if self.center.is_visible() => monitor.to_string(),
            _ => "hidden".to_string(),
        };
        let showing = self.placements.iter().filter(|shown| shown.get()).count();

        format!(
            "active={} popups={} history={} center={center} tiles={showing}/{}",
            self.center_view.entries().with(Vec::len),
            self.popups.popups().with(Vec::len),
            self.center_view.history().with(Vec::len),
            self.tiles.len(),
        )
    }
}

/// Serve notifications until interrupted.
pub async fn run(config: NotificationsConfig, monitors: Vec<MonitorId>) -> Result<()> {
    let (tx, mut rx) = unbounded_channel();
    let server = ControlServer::bind(control::socket_path())?;

    let daemon: Box<dyn NotificationDaemon> = match notifications::start(tx.clone()).await {
        Ok(daemon) => Box::new(daemon),
        Err(err) => {
            error!("Notification daemon unavailable, continuing without it: {err}");
            Box::new(Disconnected)
        }
    };

    let mut app = App::new(daemon, config, tx.clone(), monitors);

    let control_tx = tx.clone();
    tokio::spawn(async move {
        if let Err(err) = server.run(control_tx).await {
            error!("control socket stopped: {err:#}");
        }
    });

    loop {
        tokio::select! {
            Some(message) = rx.recv() => app.update(message),
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, shutting down");
                break;
            }
        }
    }

    Ok(())
}
