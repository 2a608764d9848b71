use crate::collaborators::Collaborators;
use crate::config::ClientConfig;
use crate::dispatch::{DispatchQueue, DispatchSender, NetworkEvent};
use crate::game::GameState;
use crate::transport::{ConnectError, Connection, SendError};
use log::{error, info, warn};
use shared::WireMessage;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, MissedTickBehavior};

/// Longest step fed to the simulation, so a stalled loop does not teleport
/// everything on resume.
const MAX_TICK_DT: f32 = 0.1;

/// Headless client: owns the connection and the simulation and drives both
/// from one tick loop.
pub struct Client {
    config: ClientConfig,
    connection: Option<Connection>,
    events: DispatchSender<NetworkEvent>,
    game_state: GameState,
}

impl Client {
    /// Connects to the configured server and logs in.
    pub async fn new(config: ClientConfig, out: Collaborators) -> Result<Self, ConnectError> {
        let (events, queue) = DispatchQueue::bounded(config.queue_capacity);
        let connection =
            Connection::connect_with(&config.host, config.port, events.clone()).await?;
        let game_state = GameState::new(&config, queue, out);

        let client = Client {
            config,
            connection: Some(connection),
            events,
            game_state,
        };
        client.login().await;
        Ok(client)
    }

    async fn login(&self) {
        let login = WireMessage::login(&self.config.player_id, self.config.player_template);
        if let Err(e) = self.send(&login).await {
            error!("Login failed: {}", e);
        } else {
            info!("Logged in as {}", self.config.player_id);
        }
    }

    pub async fn send(&self, message: &WireMessage) -> Result<(), SendError> {
        match &self.connection {
            Some(connection) => connection.send(message).await,
            None => Err(SendError::NotConnected),
        }
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn game_state_mut(&mut self) -> &mut GameState {
        &mut self.game_state
    }

    /// Ticks until Ctrl+C, reconnecting after drops when enabled.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut tick_interval = interval(self.config.tick_duration());
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();

        let (reconnect_tx, mut reconnect_rx) = mpsc::channel::<Result<Connection, ConnectError>>(1);
        let mut reconnecting = false;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        info!("Running at {} Hz", self.config.tick_rate);

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32().min(MAX_TICK_DT);
                    last_tick = now;

                    self.game_state.tick(dt);
                    self.sync_connection_state();

                    if !self.game_state.is_connected() && self.connection.is_some() {
                        if let Some(connection) = self.connection.take() {
                            connection.close().await;
                        }
                        if !self.config.reconnect {
                            warn!("Connection lost and reconnect is disabled; stopping");
                            break;
                        }
                    }

                    if self.connection.is_none() && self.config.reconnect && !reconnecting {
                        reconnecting = true;
                        self.spawn_reconnect(reconnect_tx.clone());
                    }
                }

                Some(result) = reconnect_rx.recv() => {
                    reconnecting = false;
                    match result {
                        Ok(connection) => {
                            self.connection = Some(connection);
                            self.game_state.set_connected(true);
                            self.login().await;
                        }
                        Err(e) => warn!("Reconnect failed: {}", e),
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutting down client...");
                    break;
                }
            }
        }

        if let Some(connection) = self.connection.take() {
            if let Err(e) = connection.send(&WireMessage::logout(&self.config.player_id)).await {
                warn!("Logout not sent: {}", e);
            }
            connection.close().await;
        }

        Ok(())
    }

    /// Reports a connection the transport gave up on, e.g. after a failed
    /// send, to the simulation as a disconnect.
    fn sync_connection_state(&mut self) {
        let Some(connection) = &self.connection else {
            return;
        };
        if !connection.is_connected() && self.game_state.is_connected() {
            let reason = format!("connection to {} lost", connection.peer());
            self.game_state.apply_event(NetworkEvent::Disconnected { reason });
        }
    }

    fn spawn_reconnect(&self, done: mpsc::Sender<Result<Connection, ConnectError>>) {
        let host = self.config.host.clone();
        let port = self.config.port;
        let delay: Duration = self.config.reconnect_delay;
        let events = self.events.clone();

        info!("Reconnecting in {:.1}s...", delay.as_secs_f32());
        tokio::spawn(async move {
            sleep(delay).await;
            let result = Connection::connect_with(&host, port, events).await;
            if done.send(result).await.is_err() {
                warn!("Reconnect result dropped; client stopped");
            }
        });
    }
}
