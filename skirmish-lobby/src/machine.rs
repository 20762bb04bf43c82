//! The lobby state machine and its timers.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{interval_at, sleep_until, Instant};

use crate::error::LobbyError;
use crate::matchmaking::MatchmakingApi;
use crate::state::{LobbyState, QueueEntry, QueueStatus, RosterEntry};
use crate::timers::TimerSlot;

/// Lobby timing.
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// How long the "match found" screen shows before picking opens
    pub found_to_picking_delay: Duration,
    /// Period of the queue clock and the countdown ticker
    pub tick: Duration,
    /// Countdown started when recovery lands in the starting phase
    pub recovery_countdown_secs: u32,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            found_to_picking_delay: Duration::from_millis(1500),
            tick: Duration::from_secs(1),
            recovery_countdown_secs: 3,
        }
    }
}

impl LobbyConfig {
    /// Set how long Found lasts before picking opens.
    pub fn with_found_to_picking_delay(mut self, delay: Duration) -> Self {
        self.found_to_picking_delay = delay;
        self
    }

    /// Set the queue clock and countdown period.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Set the countdown used when recovery lands in Starting.
    pub fn with_recovery_countdown(mut self, seconds: u32) -> Self {
        self.recovery_countdown_secs = seconds;
        self
    }
}

#[derive(Default)]
struct Inner {
    state: LobbyState,
    /// Bumped on every reset so an in-flight join can tell it was abandoned
    epoch: u64,
    queue_clock: TimerSlot,
    countdown: TimerSlot,
    pick_delay: TimerSlot,
}

impl Inner {
    fn cancel_timers(&mut self) {
        self.queue_clock.cancel();
        self.countdown.cancel();
        self.pick_delay.cancel();
    }
}

pub(crate) struct LobbyShared {
    config: LobbyConfig,
    api: Arc<dyn MatchmakingApi>,
    inner: Mutex<Inner>,
}

/// Pre-match state machine.
///
/// Cheap to clone; clones drive the same lobby. Timer tasks only hold weak
/// references, so dropping the last clone stops them. Must be used from
/// within a Tokio runtime: phase changes that arm a timer (`join_queue`,
/// `match_found`, `start_countdown`, `resume_searching`) spawn tasks.
#[derive(Clone)]
pub struct Lobby {
    pub(crate) shared: Arc<LobbyShared>,
}

impl Lobby {
    pub fn new(api: Arc<dyn MatchmakingApi>, config: LobbyConfig) -> Self {
        Self {
            shared: Arc::new(LobbyShared {
                config,
                api,
                inner: Mutex::new(Inner::default()),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Arc<LobbyShared>) -> Self {
        Self { shared }
    }

    pub(crate) fn downgrade(&self) -> Weak<LobbyShared> {
        Arc::downgrade(&self.shared)
    }

    /// Get the lobby timing.
    pub fn config(&self) -> &LobbyConfig {
        &self.shared.config
    }

    /// Enter the queue for `mode`.
    ///
    /// Allowed from Idle or Searching. Returns the queue size reported by the
    /// server. On failure the state is left untouched. If the lobby is reset
    /// while the request is in flight the join is not applied and
    /// [`LobbyError::JoinAbandoned`] is returned.
    pub async fn join_queue(&self, mode: &str) -> Result<u32, LobbyError> {
        let epoch = {
            let inner = self.shared.inner.lock();
            let from = inner.state.queue_status;
            if !matches!(from, QueueStatus::Idle | QueueStatus::Searching) {
                return Err(LobbyError::InvalidTransition {
                    from,
                    to: QueueStatus::Searching,
                });
            }
            inner.epoch
        };

        let response = self.shared.api.join(mode).await?;
        if !response.success {
            return Err(LobbyError::JoinRejected {
                mode: mode.to_string(),
            });
        }

        let mut inner = self.shared.inner.lock();
        if inner.epoch != epoch {
            log::info!("Lobby reset while joining '{mode}', not entering queue");
            return Err(LobbyError::JoinAbandoned {
                mode: mode.to_string(),
            });
        }
        if !matches!(
            inner.state.queue_status,
            QueueStatus::Idle | QueueStatus::Searching
        ) {
            // A match arrived while the join was in flight; the lobby is
            // already past the queue, so the join counts as done.
            return Ok(response.queue_size);
        }
        inner.state.advance(QueueStatus::Searching);
        inner.state.mode = Some(mode.to_string());
        inner.state.players_in_queue = response.queue_size;
        inner.state.queue_time_seconds = 0;
        self.start_queue_clock(&mut inner);
        log::info!("Joined {mode} queue ({} in queue)", response.queue_size);
        Ok(response.queue_size)
    }

    /// Leave the queue. The server call may fail; the local lobby is reset
    /// regardless.
    pub async fn leave_queue(&self) {
        if let Err(e) = self.shared.api.leave().await {
            log::warn!("Queue leave request failed: {e}");
        }
        self.reset();
    }

    /// A match was formed. Ignored once the lobby is past Found.
    pub fn match_found(&self, lobby_id: Option<String>) {
        let mut inner = self.shared.inner.lock();
        if !inner.state.advance(QueueStatus::Found) {
            return;
        }
        if lobby_id.is_some() {
            inner.state.lobby_id = lobby_id;
        }

        let lobby = self.downgrade();
        let deadline = Instant::now() + self.shared.config.found_to_picking_delay;
        inner
            .pick_delay
            .replace(|generation| tokio::spawn(open_picking_at(lobby, generation, deadline)));
    }

    /// Record a hero pick. Ignored for players outside a known roster.
    pub fn hero_picked(&self, player_id: &str, hero_id: &str) {
        self.shared.inner.lock().state.record_pick(player_id, hero_id);
    }

    /// Every player locked in. Stops the queue clock and moves to Starting.
    pub fn all_picks_complete(&self) {
        let mut inner = self.shared.inner.lock();
        inner.queue_clock.cancel();
        inner.pick_delay.cancel();
        inner.state.advance(QueueStatus::Starting);
    }

    /// Replace the team and roster, keeping picks of players still present.
    pub fn set_team_info(&self, team: Option<String>, roster: Vec<RosterEntry>) {
        self.shared.inner.lock().state.replace_roster(team, roster);
    }

    /// (Re)start the pre-game countdown from `seconds`.
    pub fn start_countdown(&self, seconds: u32) {
        let mut inner = self.shared.inner.lock();
        self.start_countdown_locked(&mut inner, seconds);
    }

    /// Start a countdown unless one is already running. Returns whether it
    /// started.
    pub fn start_countdown_if_idle(&self, seconds: u32) -> bool {
        let mut inner = self.shared.inner.lock();
        if inner.countdown.is_active() {
            return false;
        }
        self.start_countdown_locked(&mut inner, seconds);
        true
    }

    /// Check whether the countdown ticker is armed.
    pub fn countdown_running(&self) -> bool {
        self.shared.inner.lock().countdown.is_active()
    }

    /// Back to Idle with every field at its default and no timers running.
    pub fn reset(&self) {
        let mut inner = self.shared.inner.lock();
        inner.cancel_timers();
        inner.state.reset();
        inner.epoch += 1;
    }

    /// Stop all timers, keeping the state as is.
    pub fn dispose(&self) {
        self.shared.inner.lock().cancel_timers();
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> LobbyState {
        self.shared.inner.lock().state.clone()
    }

    /// Current phase.
    pub fn status(&self) -> QueueStatus {
        self.shared.inner.lock().state.queue_status
    }

    /// Update queue population and estimated wait.
    pub fn set_queue_info(&self, players_in_queue: u32, estimated_wait_seconds: Option<u32>) {
        let mut inner = self.shared.inner.lock();
        inner.state.players_in_queue = players_in_queue;
        inner.state.estimated_wait_seconds = estimated_wait_seconds;
    }

    /// Replace the pre-match queue list.
    pub fn set_queue_roster(&self, entries: Vec<QueueEntry>) {
        self.shared.inner.lock().state.queue_roster = entries;
    }

    /// Toggle bot backfill. The count is cleared when filling stops.
    pub fn set_bots_filling(&self, filling: bool, count: u32) {
        let mut inner = self.shared.inner.lock();
        inner.state.bots_filling = filling;
        inner.state.bots_count = if filling { count } else { 0 };
    }

    /// Set the number of players per match.
    pub fn set_match_size(&self, match_size: u32) {
        self.shared.inner.lock().state.match_size = match_size;
    }

    /// Record the game the lobby hands off to.
    pub fn set_game_id(&self, game_id: impl Into<String>) {
        self.shared.inner.lock().state.game_id = Some(game_id.into());
    }

    /// Record the server-side lobby id.
    pub fn set_lobby_id(&self, lobby_id: impl Into<String>) {
        self.shared.inner.lock().state.lobby_id = Some(lobby_id.into());
    }

    /// Put the lobby back in the queue without contacting the server, e.g.
    /// after a restart. The queue clock restarts from zero.
    pub fn resume_searching(&self, players_in_queue: u32, estimated_wait_seconds: Option<u32>) {
        let mut inner = self.shared.inner.lock();
        if !inner.state.advance(QueueStatus::Searching) {
            return;
        }
        inner.state.players_in_queue = players_in_queue;
        inner.state.estimated_wait_seconds = estimated_wait_seconds;
        inner.state.queue_time_seconds = 0;
        self.start_queue_clock(&mut inner);
    }

    fn start_queue_clock(&self, inner: &mut Inner) {
        let lobby = self.downgrade();
        let period = self.shared.config.tick;
        let start = Instant::now() + period;
        inner.queue_clock.replace(|generation| {
            tokio::spawn(run_queue_clock(lobby, generation, start, period))
        });
    }

    fn start_countdown_locked(&self, inner: &mut Inner, seconds: u32) {
        inner.state.countdown_seconds = seconds;
        if seconds == 0 {
            inner.countdown.cancel();
            return;
        }
        let lobby = self.downgrade();
        let period = self.shared.config.tick;
        let start = Instant::now() + period;
        inner.countdown.replace(|generation| {
            tokio::spawn(run_countdown(lobby, generation, start, period))
        });
    }
}

/// Ticks are anchored at `start`, fixed when the clock was scheduled rather
/// than when this task first runs.
async fn run_queue_clock(
    lobby: Weak<LobbyShared>,
    generation: u64,
    start: Instant,
    period: Duration,
) {
    let mut ticker = interval_at(start, period);
    loop {
        ticker.tick().await;
        if !bump_queue_clock(&lobby, generation) {
            return;
        }
    }
}

fn bump_queue_clock(lobby: &Weak<LobbyShared>, generation: u64) -> bool {
    let Some(shared) = lobby.upgrade() else {
        return false;
    };
    let mut inner = shared.inner.lock();
    if !inner.queue_clock.is_current(generation) {
        return false;
    }
    inner.state.queue_time_seconds = inner.state.queue_time_seconds.saturating_add(1);
    true
}

async fn run_countdown(
    lobby: Weak<LobbyShared>,
    generation: u64,
    start: Instant,
    period: Duration,
) {
    let mut ticker = interval_at(start, period);
    loop {
        ticker.tick().await;
        if !step_countdown(&lobby, generation) {
            return;
        }
    }
}

/// One countdown step. Returns false once the ticker should stop.
fn step_countdown(lobby: &Weak<LobbyShared>, generation: u64) -> bool {
    let Some(shared) = lobby.upgrade() else {
        return false;
    };
    let mut inner = shared.inner.lock();
    if !inner.countdown.is_current(generation) {
        return false;
    }
    let remaining = inner.state.countdown_seconds.saturating_sub(1);
    inner.state.countdown_seconds = remaining;
    if remaining == 0 {
        inner.countdown.release(generation);
        return false;
    }
    true
}

async fn open_picking_at(lobby: Weak<LobbyShared>, generation: u64, deadline: Instant) {
    sleep_until(deadline).await;
    let Some(shared) = lobby.upgrade() else {
        return;
    };
    let mut inner = shared.inner.lock();
    if !inner.pick_delay.release(generation) {
        return;
    }
    if inner.state.queue_status == QueueStatus::Found {
        inner.state.advance(QueueStatus::Picking);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchmaking::{JoinResponse, QueueStatusReport};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct MockApi {
        queue_size: u32,
        reject: bool,
        fail_leave: bool,
        /// Holds every join until notified
        gate: Option<Arc<Notify>>,
        joins: AtomicU32,
        leaves: AtomicU32,
    }

    #[async_trait]
    impl MatchmakingApi for MockApi {
        async fn join(&self, _mode: &str) -> Result<JoinResponse, LobbyError> {
            self.joins.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(JoinResponse {
                success: !self.reject,
                queue_size: self.queue_size,
            })
        }

        async fn leave(&self) -> Result<(), LobbyError> {
            self.leaves.fetch_add(1, Ordering::SeqCst);
            if self.fail_leave {
                return Err(LobbyError::JoinRejected {
                    mode: "leave".into(),
                });
            }
            Ok(())
        }

        async fn status(&self) -> Result<QueueStatusReport, LobbyError> {
            Ok(QueueStatusReport::Idle)
        }
    }

    fn lobby_with(api: MockApi) -> (Lobby, Arc<MockApi>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let api = Arc::new(api);
        (Lobby::new(api.clone(), LobbyConfig::default()), api)
    }

    fn lobby() -> Lobby {
        lobby_with(MockApi::default()).0
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    /// Advance paused time one second at a time, letting timers run.
    async fn elapse_secs(secs: u32) {
        for _ in 0..secs {
            tokio::time::advance(Duration::from_secs(1)).await;
            settle().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_queue_counts_queue_time() {
        let (lobby, api) = lobby_with(MockApi {
            queue_size: 3,
            ..Default::default()
        });

        assert_eq!(lobby.join_queue("quick_3v3").await.unwrap(), 3);
        let state = lobby.snapshot();
        assert_eq!(state.queue_status, QueueStatus::Searching);
        assert_eq!(state.queue_time_seconds, 0);

        elapse_secs(3).await;

        let state = lobby.snapshot();
        assert_eq!(state.queue_status, QueueStatus::Searching);
        assert_eq!(state.players_in_queue, 3);
        assert_eq!(state.queue_time_seconds, 3);
        assert_eq!(state.mode.as_deref(), Some("quick_3v3"));
        assert_eq!(api.joins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejoin_restarts_queue_clock() {
        let lobby = lobby();
        lobby.join_queue("ranked").await.unwrap();
        elapse_secs(5).await;
        lobby.join_queue("ranked").await.unwrap();
        elapse_secs(2).await;
        assert_eq!(lobby.snapshot().queue_time_seconds, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_during_join_abandons_it() {
        let gate = Arc::new(Notify::new());
        let (lobby, api) = lobby_with(MockApi {
            gate: Some(gate.clone()),
            ..Default::default()
        });

        let reset = async {
            settle().await;
            lobby.reset();
            gate.notify_one();
        };
        let (result, ()) = tokio::join!(lobby.join_queue("ranked"), reset);

        assert!(matches!(result, Err(LobbyError::JoinAbandoned { mode }) if mode == "ranked"));
        assert_eq!(api.joins.load(Ordering::SeqCst), 1);
        assert_eq!(lobby.snapshot(), LobbyState::default());
        elapse_secs(2).await;
        assert_eq!(lobby.snapshot().queue_time_seconds, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_rejected_leaves_state() {
        let (lobby, _api) = lobby_with(MockApi {
            reject: true,
            ..Default::default()
        });
        let err = lobby.join_queue("ranked").await.unwrap_err();
        assert!(matches!(err, LobbyError::JoinRejected { .. }));
        assert_eq!(lobby.snapshot(), LobbyState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_from_later_phase_is_refused_without_request() {
        let (lobby, api) = lobby_with(MockApi::default());
        lobby.match_found(Some("L1".into()));

        let err = lobby.join_queue("ranked").await.unwrap_err();
        assert!(matches!(
            err,
            LobbyError::InvalidTransition {
                from: QueueStatus::Found,
                to: QueueStatus::Searching
            }
        ));
        assert_eq!(api.joins.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_found_moves_to_picking_after_delay() {
        let lobby = lobby();
        lobby.match_found(Some("L1".into()));
        assert_eq!(lobby.status(), QueueStatus::Found);
        assert_eq!(lobby.snapshot().lobby_id.as_deref(), Some("L1"));

        tokio::time::advance(Duration::from_millis(1400)).await;
        settle().await;
        assert_eq!(lobby.status(), QueueStatus::Found);

        tokio::time::advance(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(lobby.status(), QueueStatus::Picking);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_due_from_when_armed() {
        let lobby = lobby();
        lobby.match_found(None);
        lobby.start_countdown(3);
        // Time moves before the timer tasks get polled
        tokio::time::advance(Duration::from_millis(1500)).await;
        settle().await;

        let state = lobby.snapshot();
        assert_eq!(state.queue_status, QueueStatus::Picking);
        assert_eq!(state.countdown_seconds, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_timing() {
        let config = LobbyConfig::default()
            .with_tick(Duration::from_millis(500))
            .with_found_to_picking_delay(Duration::from_millis(200));
        let lobby = Lobby::new(Arc::new(MockApi::default()), config);
        assert_eq!(lobby.config().tick, Duration::from_millis(500));

        lobby.match_found(None);
        tokio::time::advance(Duration::from_millis(200)).await;
        settle().await;
        assert_eq!(lobby.status(), QueueStatus::Picking);

        lobby.start_countdown(4);
        for _ in 0..2 {
            tokio::time::advance(Duration::from_millis(500)).await;
            settle().await;
        }
        assert_eq!(lobby.snapshot().countdown_seconds, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_picks_complete_before_delay_ends_in_starting() {
        let lobby = lobby();
        lobby.join_queue("ranked").await.unwrap();
        lobby.match_found(None);
        lobby.all_picks_complete();
        assert_eq!(lobby.status(), QueueStatus::Starting);

        elapse_secs(3).await;
        let state = lobby.snapshot();
        assert_eq!(state.queue_status, QueueStatus::Starting);
        assert_eq!(state.queue_time_seconds, 0, "queue clock stopped");
    }

    #[tokio::test(start_paused = true)]
    async fn test_match_found_ignored_once_picking() {
        let lobby = lobby();
        lobby.match_found(Some("L1".into()));
        elapse_secs(2).await;
        assert_eq!(lobby.status(), QueueStatus::Picking);

        lobby.match_found(Some("L2".into()));
        assert_eq!(lobby.status(), QueueStatus::Picking);
        assert_eq!(lobby.snapshot().lobby_id.as_deref(), Some("L1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_floors_at_zero_and_stops() {
        let lobby = lobby();
        lobby.start_countdown(2);
        assert!(lobby.countdown_running());

        elapse_secs(5).await;
        assert_eq!(lobby.snapshot().countdown_seconds, 0);
        assert!(!lobby.countdown_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_countdown_replaces_first() {
        let lobby = lobby();
        lobby.start_countdown(10);
        elapse_secs(2).await;
        assert_eq!(lobby.snapshot().countdown_seconds, 8);

        lobby.start_countdown(5);
        assert_eq!(lobby.snapshot().countdown_seconds, 5);
        elapse_secs(1).await;
        assert_eq!(lobby.snapshot().countdown_seconds, 4);
        elapse_secs(4).await;
        assert_eq!(lobby.snapshot().countdown_seconds, 0);
        assert!(!lobby.countdown_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_if_idle_respects_running_countdown() {
        let lobby = lobby();
        assert!(lobby.start_countdown_if_idle(3));
        elapse_secs(1).await;
        assert!(!lobby.start_countdown_if_idle(3));
        assert_eq!(lobby.snapshot().countdown_seconds, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_countdown_does_not_tick() {
        let lobby = lobby();
        lobby.start_countdown(0);
        assert!(!lobby.countdown_running());
        elapse_secs(2).await;
        assert_eq!(lobby.snapshot().countdown_seconds, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hero_picks_mirror_into_roster() {
        let lobby = lobby();
        lobby.set_team_info(
            Some("blue".into()),
            vec![
                RosterEntry::new("p1", "Ada", "blue"),
                RosterEntry::new("p2", "Bo", "blue"),
            ],
        );
        lobby.hero_picked("p1", "echo");
        lobby.hero_picked("p1", "echo");
        lobby.hero_picked("p3", "volt");

        let state = lobby.snapshot();
        assert_eq!(state.picked_heroes.len(), 1);
        assert_eq!(state.team_roster[0].hero_id.as_deref(), Some("echo"));
        assert_eq!(state.team_roster[1].hero_id, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_resets_even_when_request_fails() {
        let (lobby, api) = lobby_with(MockApi {
            fail_leave: true,
            ..Default::default()
        });
        lobby.join_queue("ranked").await.unwrap();
        lobby.set_match_size(6);
        lobby.set_bots_filling(true, 3);
        lobby.set_queue_roster(vec![QueueEntry {
            username: "ada".into(),
            mmr_bracket: "gold".into(),
        }]);
        lobby.start_countdown(9);

        lobby.leave_queue().await;
        assert_eq!(api.leaves.load(Ordering::SeqCst), 1);
        assert_eq!(lobby.snapshot(), LobbyState::default());
        assert!(!lobby.countdown_running());

        elapse_secs(3).await;
        assert_eq!(lobby.snapshot(), LobbyState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_pending_pick_delay() {
        let lobby = lobby();
        lobby.match_found(None);
        lobby.reset();
        elapse_secs(2).await;
        assert_eq!(lobby.status(), QueueStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_keeps_state() {
        let lobby = lobby();
        lobby.join_queue("ranked").await.unwrap();
        elapse_secs(2).await;
        lobby.start_countdown(5);
        lobby.dispose();
        elapse_secs(3).await;

        let state = lobby.snapshot();
        assert_eq!(state.queue_status, QueueStatus::Searching);
        assert_eq!(state.queue_time_seconds, 2);
        assert_eq!(state.countdown_seconds, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_searching_copies_counts() {
        let lobby = lobby();
        lobby.resume_searching(7, Some(45));
        elapse_secs(1).await;

        let state = lobby.snapshot();
        assert_eq!(state.queue_status, QueueStatus::Searching);
        assert_eq!(state.players_in_queue, 7);
        assert_eq!(state.estimated_wait_seconds, Some(45));
        assert_eq!(state.queue_time_seconds, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bots_filling_clears_count() {
        let lobby = lobby();
        lobby.set_bots_filling(true, 4);
        assert_eq!(lobby.snapshot().bots_count, 4);
        lobby.set_bots_filling(false, 4);
        let state = lobby.snapshot();
        assert!(!state.bots_filling);
        assert_eq!(state.bots_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_lobby_stops_timers() {
        let lobby = lobby();
        lobby.join_queue("ranked").await.unwrap();
        let weak = lobby.downgrade();
        drop(lobby);
        elapse_secs(2).await;
        assert!(weak.upgrade().is_none());
    }
}
