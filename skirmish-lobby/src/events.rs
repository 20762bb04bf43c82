//! Lobby-channel events pushed by the server over the game socket.

use serde::Deserialize;
use serde_json::Value;
use skirmish_net::{ConnectionManager, SubscriberToken};

use crate::machine::Lobby;
use crate::state::{QueueEntry, RosterEntry};

/// Lobby-related frames pushed by the game server, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum LobbyEvent {
    QueueUpdate {
        #[serde(default)]
        players_in_queue: u32,
        #[serde(default)]
        estimated_wait_seconds: Option<u32>,
        #[serde(default)]
        roster: Option<Vec<QueueEntry>>,
        #[serde(default)]
        bots_filling: Option<bool>,
        #[serde(default)]
        bots_count: Option<u32>,
        #[serde(default)]
        match_size: Option<u32>,
    },
    MatchFound {
        #[serde(default)]
        lobby_id: Option<String>,
    },
    TeamInfo {
        #[serde(default)]
        team: Option<String>,
        #[serde(default)]
        players: Vec<RosterEntry>,
    },
    HeroPicked {
        player_id: String,
        hero_id: String,
    },
    AllPicksComplete,
    Countdown {
        seconds: u32,
    },
    GameStarting {
        game_id: String,
    },
}

impl LobbyEvent {
    /// Parse a raw frame. Anything that is not a well-formed lobby event
    /// yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }
}

impl Lobby {
    /// Feed one server event into the state machine.
    pub fn apply_event(&self, event: LobbyEvent) {
        match event {
            LobbyEvent::QueueUpdate {
                players_in_queue,
                estimated_wait_seconds,
                roster,
                bots_filling,
                bots_count,
                match_size,
            } => {
                self.set_queue_info(players_in_queue, estimated_wait_seconds);
                if let Some(roster) = roster {
                    self.set_queue_roster(roster);
                }
                if let Some(filling) = bots_filling {
                    self.set_bots_filling(filling, bots_count.unwrap_or(0));
                }
                if let Some(match_size) = match_size {
                    self.set_match_size(match_size);
                }
            }
            LobbyEvent::MatchFound { lobby_id } => self.match_found(lobby_id),
            LobbyEvent::TeamInfo { team, players } => self.set_team_info(team, players),
            LobbyEvent::HeroPicked { player_id, hero_id } => {
                self.hero_picked(&player_id, &hero_id)
            }
            LobbyEvent::AllPicksComplete => self.all_picks_complete(),
            LobbyEvent::Countdown { seconds } => self.start_countdown(seconds),
            LobbyEvent::GameStarting { game_id } => {
                self.set_game_id(game_id);
                self.all_picks_complete();
            }
        }
    }

    /// Feed every lobby event arriving on `connection` into this lobby.
    ///
    /// The subscriber holds the lobby weakly; once the lobby is dropped the
    /// frames are ignored.
    pub fn attach(&self, connection: &ConnectionManager) -> SubscriberToken {
        let lobby = self.downgrade();
        connection.subscribe(move |inbound| {
            let Some(event) = LobbyEvent::from_value(&inbound.raw) else {
                return;
            };
            if let Some(shared) = lobby.upgrade() {
                Lobby::from_shared(shared).apply_event(event);
            }
        })
    }
}
