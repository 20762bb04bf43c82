//! # skirmish-lobby: matchmaking and pre-game lobby
//!
//! Tracks the player's way from the queue into a match and keeps it in step
//! with the server across socket drops and restarts.
//!
//! ```text
//!  join_queue / leave_queue        GET /api/queue/status
//!            │                              │
//!            ▼                              ▼
//!  ┌──────────────────┐  replay   ┌────────────────┐
//!  │ Lobby            │ ◄──────── │ RecoveryClient │
//!  │ (state + timers) │           └────────────────┘
//!  └──────────────────┘
//!            ▲
//!            │ LobbyEvent (lobby channel frames)
//!  ┌──────────────────┐
//!  │ ConnectionManager│
//!  └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: phases, roster, the state snapshot
//! - [`machine`]: the [`Lobby`] state machine
//! - [`timers`]: cancel-before-replace timer slots
//! - [`matchmaking`]: HTTP queue API
//! - [`recovery`]: restart resynchronisation
//! - [`events`]: lobby-channel events

pub mod error;
pub mod events;
pub mod machine;
pub mod matchmaking;
pub mod recovery;
pub mod state;
pub mod timers;

pub use error::LobbyError;
pub use events::LobbyEvent;
pub use machine::{Lobby, LobbyConfig};
pub use matchmaking::{
    HttpMatchmaking, JoinResponse, LobbyPhase, LobbySnapshot, MatchmakingApi, QueueStatusReport,
};
pub use recovery::RecoveryClient;
pub use state::{LobbyState, QueueEntry, QueueStatus, RosterEntry, DEFAULT_MATCH_SIZE};
