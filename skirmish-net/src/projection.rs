//! Game-state projection seam.
//!
//! The live match state is owned outside this crate. The router only needs
//! the narrow write interface below; [`GameView`] is a plain in-memory
//! implementation for headless clients and tests.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::protocol::{GameEvent, TickSnapshot};

/// Write side of the externally owned game state.
pub trait GameProjection: Send {
    fn set_game_id(&mut self, game_id: &str);
    fn set_player_id(&mut self, player_id: &str);
    /// Replace (full) or merge (delta) the current snapshot.
    fn apply_tick(&mut self, snapshot: TickSnapshot);
    fn append_events(&mut self, events: Vec<GameEvent>);
    fn push_announcement(&mut self, text: String);
    fn finish_game(&mut self, winner: Option<String>, stats: Value);
}

/// Projection handle shared between the connection layer and its owner.
pub type SharedProjection = Arc<Mutex<dyn GameProjection>>;

/// Wrap a projection for sharing.
pub fn shared<P: GameProjection + 'static>(projection: P) -> Arc<Mutex<P>> {
    Arc::new(Mutex::new(projection))
}

/// Outcome of a finished match.
#[derive(Debug, Clone, PartialEq)]
pub struct GameResult {
    pub winner: Option<String>,
    pub stats: Value,
}

/// In-memory projection.
#[derive(Debug, Clone, Default)]
pub struct GameView {
    pub game_id: Option<String>,
    pub player_id: Option<String>,
    pub snapshot: Option<TickSnapshot>,
    pub events: Vec<GameEvent>,
    pub announcements: Vec<String>,
    pub result: Option<GameResult>,
}

impl GameView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&self) -> Option<u64> {
        self.snapshot.as_ref().map(|s| s.tick)
    }
}

impl GameProjection for GameView {
    fn set_game_id(&mut self, game_id: &str) {
        self.game_id = Some(game_id.to_string());
    }

    fn set_player_id(&mut self, player_id: &str) {
        self.player_id = Some(player_id.to_string());
    }

    fn apply_tick(&mut self, snapshot: TickSnapshot) {
        match &mut self.snapshot {
            Some(current) if !snapshot.full => {
                current.tick = snapshot.tick;
                current.state.extend(snapshot.state);
            }
            _ => self.snapshot = Some(snapshot),
        }
    }

    fn append_events(&mut self, events: Vec<GameEvent>) {
        self.events.extend(events);
    }

    fn push_announcement(&mut self, text: String) {
        self.announcements.push(text);
    }

    fn finish_game(&mut self, winner: Option<String>, stats: Value) {
        self.result = Some(GameResult { winner, stats });
    }
}
