//! Per-session dashboard state.
//!
//! Each browser session owns one [`DashboardSession`]. Refresh requests are
//! registered with [`DashboardSession::begin`], which bumps the requested
//! generation immediately, and committed with [`DashboardSession::commit`],
//! which only succeeds while that generation is still the latest. Refresh
//! work itself is serialized by the session's async lock.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex, MutexGuard};

use crate::api::{DashboardView, RefreshGeneration, RefreshTrigger, SessionId, SessionSnapshot};
use crate::db::QueryContext;
use crate::models::DateRange;

/// Buffered updates per subscriber before the slowest one starts lagging.
const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// A registered refresh request.
#[derive(Debug, Clone)]
pub struct RefreshTicket {
    pub generation: RefreshGeneration,
    pub trigger: RefreshTrigger,
    pub range: DateRange,
    pub ctx: QueryContext,
}

#[derive(Debug)]
struct SessionState {
    range: DateRange,
    requested: RefreshGeneration,
    committed: RefreshGeneration,
    trigger: Option<RefreshTrigger>,
    view: Option<DashboardView>,
    ctx: QueryContext,
    touched_at: Instant,
}

pub struct DashboardSession {
    id: SessionId,
    state: RwLock<SessionState>,
    refresh_lock: Mutex<()>,
    updates: broadcast::Sender<SessionSnapshot>,
}

impl DashboardSession {
    pub fn new(id: SessionId, range: DateRange, ctx: QueryContext) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            id,
            state: RwLock::new(SessionState {
                range,
                requested: RefreshGeneration::default(),
                committed: RefreshGeneration::default(),
                trigger: None,
                view: None,
                ctx,
                touched_at: Instant::now(),
            }),
            refresh_lock: Mutex::new(()),
            updates,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn range(&self) -> DateRange {
        self.state.read().range
    }

    /// Register a refresh. A new range or context replaces the session's.
    pub fn begin(
        &self,
        trigger: RefreshTrigger,
        range: Option<DateRange>,
        ctx: Option<QueryContext>,
    ) -> RefreshTicket {
        let mut state = self.state.write();
        state.requested = state.requested.next();
        if let Some(range) = range {
            state.range = range;
        }
        if let Some(ctx) = ctx {
            state.ctx = ctx;
        }
        if trigger != RefreshTrigger::Timer {
            state.touched_at = Instant::now();
        }
        RefreshTicket {
            generation: state.requested,
            trigger,
            range: state.range,
            ctx: state.ctx.clone(),
        }
    }

    /// True while no newer refresh has been registered.
    pub fn is_current(&self, generation: RefreshGeneration) -> bool {
        self.state.read().requested == generation
    }

    /// Store `view` if `ticket` is still the latest request and notify
    /// subscribers. Returns `None` when the ticket was superseded.
    pub fn commit(&self, ticket: &RefreshTicket, view: DashboardView) -> Option<SessionSnapshot> {
        let snapshot = {
            let mut state = self.state.write();
            if state.requested != ticket.generation {
                return None;
            }
            state.committed = ticket.generation;
            state.trigger = Some(ticket.trigger);
            state.view = Some(view);
            self.snapshot_of(&state)
        };
        // No receivers is fine.
        let _ = self.updates.send(snapshot.clone());
        Some(snapshot)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_of(&self.state.read())
    }

    fn snapshot_of(&self, state: &SessionState) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            range: state.range,
            generation: state.committed,
            trigger: state.trigger,
            view: state.view.clone(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    /// Open update streams, i.e. pages currently watching this session.
    pub fn watchers(&self) -> usize {
        self.updates.receiver_count()
    }

    /// Wait for exclusive refresh rights on this session.
    pub async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh_lock.lock().await
    }

    pub fn touch(&self) {
        self.state.write().touched_at = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.state.read().touched_at.elapsed()
    }
}

impl std::fmt::Debug for DashboardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardSession")
            .field("id", &self.id)
            .field("state", &*self.state.read())
            .finish()
    }
}

/// In-memory session map.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Arc<DashboardSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with a fresh id.
    pub fn create(&self, range: DateRange, ctx: QueryContext) -> Arc<DashboardSession> {
        let session = Arc::new(DashboardSession::new(SessionId::new(), range, ctx));
        self.sessions.write().insert(session.id(), session.clone());
        session
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<DashboardSession>> {
        self.sessions.read().get(id).cloned()
    }

    pub fn remove(&self, id: &SessionId) -> Option<Arc<DashboardSession>> {
        self.sessions.write().remove(id)
    }

    pub fn all(&self) -> Vec<Arc<DashboardSession>> {
        self.sessions.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Drop sessions idle for longer than `max_idle` that nobody is
    /// watching. Returns how many went.
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| session.watchers() > 0 || session.idle_for() <= max_idle);
        before - sessions.len()
    }
}
