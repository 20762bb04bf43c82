//! One-shot resynchronisation with the server after a restart.

use std::sync::Arc;

use skirmish_net::SharedProjection;

use crate::machine::Lobby;
use crate::matchmaking::{LobbyPhase, LobbySnapshot, MatchmakingApi, QueueStatusReport};

/// Asks the server where this player stands and replays it into a [`Lobby`].
pub struct RecoveryClient {
    api: Arc<dyn MatchmakingApi>,
    projection: SharedProjection,
}

impl RecoveryClient {
    /// `projection` receives the game id when recovery finds a game starting.
    pub fn new(api: Arc<dyn MatchmakingApi>, projection: SharedProjection) -> Self {
        Self { api, projection }
    }

    /// Issue a single status request and apply the answer.
    ///
    /// Returns the report when it moved the lobby out of idle. Failures are
    /// logged and leave the lobby untouched. A countdown that is already
    /// running is never restarted, so calling this twice is harmless.
    pub async fn recover(&self, lobby: &Lobby) -> Option<QueueStatusReport> {
        let report = match self.api.status().await {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Queue status recovery failed: {e}");
                return None;
            }
        };

        match &report {
            QueueStatusReport::Idle => return None,
            QueueStatusReport::Searching {
                players_in_queue,
                estimated_wait_seconds,
            } => {
                log::info!("Recovered queue search ({players_in_queue} in queue)");
                lobby.resume_searching(*players_in_queue, *estimated_wait_seconds);
            }
            QueueStatusReport::Lobby(snapshot) => {
                log::info!("Recovered lobby in {:?} phase", snapshot.phase);
                restore_roster(lobby, snapshot);
                if snapshot.phase == LobbyPhase::Starting {
                    if let Some(lobby_id) = &snapshot.lobby_id {
                        lobby.set_lobby_id(lobby_id.clone());
                    }
                    self.enter_starting(lobby);
                } else {
                    lobby.match_found(snapshot.lobby_id.clone());
                }
            }
            QueueStatusReport::GameStarting { game_id } => {
                log::info!("Recovered starting game {game_id}");
                lobby.set_game_id(game_id.clone());
                self.projection.lock().set_game_id(game_id);
                self.enter_starting(lobby);
            }
        }
        Some(report)
    }

    fn enter_starting(&self, lobby: &Lobby) {
        lobby.all_picks_complete();
        lobby.start_countdown_if_idle(lobby.config().recovery_countdown_secs);
    }
}

fn restore_roster(lobby: &Lobby, snapshot: &LobbySnapshot) {
    lobby.set_team_info(snapshot.team.clone(), snapshot.players.clone());
    for player in &snapshot.players {
        if let Some(hero_id) = &player.hero_id {
            lobby.hero_picked(&player.player_id, hero_id);
        }
    }
}
