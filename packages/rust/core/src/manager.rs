//! Registry of live sessions.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use larder_shared::{LarderError, Result, SessionId};

use crate::graph::{ConversationGraph, SilentProgress, TurnProgress};
use crate::payload::TurnResult;
use crate::session::SessionState;

/// Serves many independent sessions over one shared graph.
///
/// Each session sits behind its own lock, so concurrent turns of different
/// sessions run in parallel while turns of one session are serialized.
pub struct SessionManager {
    graph: Arc<ConversationGraph>,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<SessionState>>>>,
}

impl SessionManager {
    pub fn new(graph: Arc<ConversationGraph>) -> Self {
        Self {
            graph,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn graph(&self) -> &ConversationGraph {
        &self.graph
    }

    /// Open a new session in `Start`.
    pub async fn start_session(&self) -> SessionId {
        let session = SessionState::new();
        let id = session.id();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        info!(session = %id, "session started");
        id
    }

    /// Run one turn of session `id`.
    ///
    /// Fails only with [`LarderError::UnknownSession`]; turn-level problems
    /// are reported in the returned [`TurnResult`].
    pub async fn submit_turn(&self, id: SessionId, text: &str) -> Result<TurnResult> {
        self.submit_turn_with_progress(id, text, &SilentProgress)
            .await
    }

    /// Like [`submit_turn`](Self::submit_turn), reporting progress.
    #[instrument(skip_all, fields(session = %id))]
    pub async fn submit_turn_with_progress(
        &self,
        id: SessionId,
        text: &str,
        progress: &dyn TurnProgress,
    ) -> Result<TurnResult> {
        let session = self.session(id).await?;
        let mut state = session.lock().await;
        Ok(self
            .graph
            .submit_turn_with_progress(&mut state, text, progress)
            .await)
    }

    /// Discard a session. Returns whether it existed.
    pub async fn end_session(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session = %id, "session ended");
        } else {
            debug!(session = %id, "end requested for unknown session");
        }
        removed
    }

    /// Copy of the session's current state.
    pub async fn snapshot(&self, id: SessionId) -> Result<SessionState> {
        let session = self.session(id).await?;
        let state = session.lock().await;
        Ok(state.clone())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn session(&self, id: SessionId) -> Result<Arc<Mutex<SessionState>>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| LarderError::UnknownSession { id: id.to_string() })
    }
}
