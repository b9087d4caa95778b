use std::collections::HashMap;

use tracing::{debug, info};

use crate::identity::CrawlerIdentity;
use crate::session::{ClassifiedSession, VirtualSession};

/// Default proximity window for folding single-visit sessions.
pub const DEFAULT_WINDOW_SECS: i64 = 3600;

/// Folds raw sessions belonging to the same crawler or repeat bot into virtual sessions.
///
/// - Crawler and preview sessions are folded by [`CrawlerIdentity`] alone, whatever
///   the gap between them.
/// - Single-visit sessions of any other category are folded into the first registered
///   virtual session with the same identity that has a request within the window.
/// - Multi-visit sessions are never folded into anything.
#[derive(Debug, Clone)]
pub struct SessionMerger {
    window_secs: i64,
}

/// Result of a merge pass.
#[derive(Debug, Clone, Default)]
pub struct Merged {
    /// Sorted by `last` ascending, each history sorted by timestamp.
    pub sessions: Vec<VirtualSession>,
    /// Number of raw sessions folded into an existing virtual session.
    pub folded: usize,
}

/// Mutable state of one merge pass.
#[derive(Default)]
struct MergeContext {
    /// Crawler identity -> id of the virtual session representing it.
    crawlers: HashMap<CrawlerIdentity, String>,
    /// Virtual session id -> position in `sessions`.
    by_id: HashMap<String, usize>,
    /// Virtual sessions in registration order.
    sessions: Vec<VirtualSession>,
    folded: usize,
}

impl MergeContext {
    fn register(&mut self, session: ClassifiedSession, identity: CrawlerIdentity) -> &str {
        let index = self.sessions.len();
        self.by_id.insert(session.session.id.clone(), index);
        self.sessions.push(VirtualSession::register(session, identity));
        &self.sessions[index].id
    }

    fn fold_into(&mut self, target: &str, session: ClassifiedSession) {
        // Every id handed out by `register` is indexed.
        let index = self.by_id[target];
        debug!(into = target, from = %session.session.id, "Folding session");
        self.sessions[index].absorb(session);
        self.folded += 1;
    }

    /// First virtual session, in registration order, with `identity` and a request near `timestamp`.
    fn find_nearby(
        &self,
        identity: &CrawlerIdentity,
        timestamp: i64,
        window_secs: i64,
    ) -> Option<String> {
        self.sessions
            .iter()
            .find(|vs| vs.identity() == identity && vs.has_request_near(timestamp, window_secs))
            .map(|vs| vs.id.clone())
    }

    fn finish(self) -> Merged {
        let mut sessions = self.sessions;
        for session in &mut sessions {
            session.history.sort_by_key(|r| r.timestamp);
        }
        sessions.sort_by_key(|s| s.last);
        Merged {
            sessions,
            folded: self.folded,
        }
    }
}

impl Default for SessionMerger {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SECS)
    }
}

impl SessionMerger {
    pub fn new(window_secs: i64) -> Self {
        Self { window_secs }
    }

    pub fn window_secs(&self) -> i64 {
        self.window_secs
    }

    /// Merge `sessions` into virtual sessions. Sessions are processed in ascending
    /// `last` order; ties keep their input order.
    pub fn merge(&self, mut sessions: Vec<ClassifiedSession>) -> Merged {
        sessions.sort_by_key(|s| s.session.last);

        let mut ctx = MergeContext::default();
        for session in sessions {
            let identity = CrawlerIdentity::of(&session.session);

            if session.ua.category.is_crawler_like() {
                match ctx.crawlers.get(&identity).cloned() {
                    Some(target) => ctx.fold_into(&target, session),
                    None => {
                        let id = ctx.register(session, identity.clone()).to_string();
                        ctx.crawlers.insert(identity, id);
                    }
                }
            } else if session.session.visits == 1 {
                let timestamp = session
                    .session
                    .last_request()
                    .map_or(session.session.last, |r| r.timestamp);
                match ctx.find_nearby(&identity, timestamp, self.window_secs) {
                    Some(target) => ctx.fold_into(&target, session),
                    None => {
                        ctx.register(session, identity);
                    }
                }
            } else {
                ctx.register(session, identity);
            }
        }

        let merged = ctx.finish();
        info!(
            virtual_sessions = merged.sessions.len(),
            folded = merged.folded,
            "Merge pass complete"
        );
        merged
    }
}
