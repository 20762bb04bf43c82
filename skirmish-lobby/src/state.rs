//! Lobby phase and the state it carries.
//!
//! # Phase Diagram
//!
//! ```text
//! ┌──────┐ join  ┌───────────┐ match  ┌───────┐ 1.5s  ┌─────────┐ picks  ┌──────────┐
//! │ Idle │──────▶│ Searching │───────▶│ Found │──────▶│ Picking │───────▶│ Starting │
//! └──────┘       └───────────┘        └───────┘       └─────────┘        └──────────┘
//!    ▲                                    │ picks complete (race)              ▲
//!    │                                    └────────────────────────────────────┘
//!    │
//!    └──────────── leave / reset (from any phase) ─────────────────────────────
//! ```
//!
//! Phases only move forward. Recovery may enter the chain part-way (e.g.
//! Idle → Found, Idle → Starting); the only backward move is a reset.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Players per match unless the server says otherwise.
pub const DEFAULT_MATCH_SIZE: u32 = 10;

/// Pre-match phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    #[default]
    Idle,
    Searching,
    Found,
    Picking,
    Starting,
}

impl QueueStatus {
    /// Transition table. Staying put is always allowed; returning to `Idle`
    /// is not a transition but a reset.
    pub fn can_advance_to(self, next: QueueStatus) -> bool {
        use QueueStatus::*;
        match (self, next) {
            (current, next) if current == next => true,
            (Idle, Searching | Found | Picking | Starting) => true,
            (Searching, Found | Picking | Starting) => true,
            (Found, Picking | Starting) => true,
            (Picking, Starting) => true,
            _ => false,
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Searching => "searching",
            Self::Found => "found",
            Self::Picking => "picking",
            Self::Starting => "starting",
        };
        f.write_str(name)
    }
}

/// A player in the formed lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub player_id: String,
    pub display_name: String,
    #[serde(default)]
    pub hero_id: Option<String>,
    pub team: String,
}

impl RosterEntry {
    pub fn new(
        player_id: impl Into<String>,
        display_name: impl Into<String>,
        team: impl Into<String>,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            display_name: display_name.into(),
            hero_id: None,
            team: team.into(),
        }
    }

    pub fn with_hero(mut self, hero_id: impl Into<String>) -> Self {
        self.hero_id = Some(hero_id.into());
        self
    }
}

/// A player shown in the pre-match queue list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub username: String,
    pub mmr_bracket: String,
}

/// Everything the lobby UI reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyState {
    pub queue_status: QueueStatus,
    pub mode: Option<String>,
    pub queue_time_seconds: u32,
    pub countdown_seconds: u32,
    pub players_in_queue: u32,
    pub estimated_wait_seconds: Option<u32>,
    pub lobby_id: Option<String>,
    pub game_id: Option<String>,
    pub team: Option<String>,
    pub picked_heroes: BTreeMap<String, String>,
    pub team_roster: Vec<RosterEntry>,
    pub queue_roster: Vec<QueueEntry>,
    pub bots_filling: bool,
    pub bots_count: u32,
    pub match_size: u32,
}

impl Default for LobbyState {
    fn default() -> Self {
        Self {
            queue_status: QueueStatus::Idle,
            mode: None,
            queue_time_seconds: 0,
            countdown_seconds: 0,
            players_in_queue: 0,
            estimated_wait_seconds: None,
            lobby_id: None,
            game_id: None,
            team: None,
            picked_heroes: BTreeMap::new(),
            team_roster: Vec::new(),
            queue_roster: Vec::new(),
            bots_filling: false,
            bots_count: 0,
            match_size: DEFAULT_MATCH_SIZE,
        }
    }
}

impl LobbyState {
    /// Move to `next` if the transition table allows it.
    pub fn advance(&mut self, next: QueueStatus) -> bool {
        if !self.queue_status.can_advance_to(next) {
            log::debug!("Ignoring lobby transition {} -> {next}", self.queue_status);
            return false;
        }
        if self.queue_status != next {
            log::info!("Lobby {} -> {next}", self.queue_status);
            self.queue_status = next;
        }
        true
    }

    /// Back to a fresh idle state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_rostered(&self, player_id: &str) -> bool {
        self.team_roster.iter().any(|p| p.player_id == player_id)
    }

    /// Upsert a pick and mirror it into the roster.
    ///
    /// Once a roster is known, picks for players outside it are ignored.
    pub fn record_pick(&mut self, player_id: &str, hero_id: &str) -> bool {
        if !self.team_roster.is_empty() && !self.is_rostered(player_id) {
            log::warn!("Ignoring pick for unknown player {player_id}");
            return false;
        }
        self.picked_heroes
            .insert(player_id.to_string(), hero_id.to_string());
        for entry in self
            .team_roster
            .iter_mut()
            .filter(|p| p.player_id == player_id)
        {
            entry.hero_id = Some(hero_id.to_string());
        }
        true
    }

    /// Replace the roster. Picks of players no longer present are dropped;
    /// heroes already carried by roster entries are adopted as picks, and
    /// surviving picks are written back onto their entries.
    pub fn replace_roster(&mut self, team: Option<String>, roster: Vec<RosterEntry>) {
        self.team = team;
        self.team_roster = roster;
        let roster = &self.team_roster;
        self.picked_heroes
            .retain(|player_id, _| roster.iter().any(|p| &p.player_id == player_id));
        for entry in &mut self.team_roster {
            match &entry.hero_id {
                Some(hero_id) => {
                    self.picked_heroes
                        .insert(entry.player_id.clone(), hero_id.clone());
                }
                None => entry.hero_id = self.picked_heroes.get(&entry.player_id).cloned(),
            }
        }
    }
}
