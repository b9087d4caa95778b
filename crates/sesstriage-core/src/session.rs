use serde::Serialize;

use sesstriage_sessions::{RawSession, Request};

use crate::identity::CrawlerIdentity;
use crate::ua::{classify, UaFacts};

/// A raw session together with the facts derived from its user agent.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedSession {
    pub session: RawSession,
    pub ua: UaFacts,
}

impl ClassifiedSession {
    pub fn classify(session: RawSession) -> Self {
        let ua = classify(session.useragent.as_deref());
        Self { session, ua }
    }
}

/// The merged view of one visitor or crawler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualSession {
    /// Id of the first raw session registered for this visitor.
    pub id: String,
    pub useragent: Option<String>,
    /// Sum over all merged sessions.
    pub visits: u64,
    /// Latest `last` over all merged sessions.
    pub last: i64,
    pub user: Option<serde_json::Value>,
    pub ua: UaFacts,
    /// Ids of the raw sessions folded into this one, in fold order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merged: Vec<String>,
    pub history: Vec<Request>,
    #[serde(skip)]
    pub(crate) identity: CrawlerIdentity,
}

impl VirtualSession {
    pub(crate) fn register(classified: ClassifiedSession, identity: CrawlerIdentity) -> Self {
        let ClassifiedSession { session, ua } = classified;
        Self {
            id: session.id,
            useragent: session.useragent,
            visits: session.visits,
            last: session.last,
            user: session.user,
            ua,
            merged: Vec::new(),
            history: session.history,
            identity,
        }
    }

    /// Fold another session's visits and requests into this one.
    pub(crate) fn absorb(&mut self, other: ClassifiedSession) {
        let session = other.session;
        self.visits = self.visits.saturating_add(session.visits);
        self.last = self.last.max(session.last);
        self.history.extend(session.history);
        self.merged.push(session.id);
    }

    /// Whether any request lies within `window_secs` of `timestamp`.
    pub(crate) fn has_request_near(&self, timestamp: i64, window_secs: i64) -> bool {
        let Ok(window) = u64::try_from(window_secs) else {
            return false;
        };
        self.history
            .iter()
            .any(|r| r.timestamp.abs_diff(timestamp) <= window)
    }

    pub fn identity(&self) -> &CrawlerIdentity {
        &self.identity
    }

    /// Number of raw sessions this virtual session represents.
    pub fn source_count(&self) -> usize {
        1 + self.merged.len()
    }

    /// View this session as a raw record again, e.g. to feed it through another pass.
    pub fn into_raw(self) -> RawSession {
        RawSession {
            id: self.id,
            useragent: self.useragent,
            visits: self.visits,
            last: self.last,
            history: self.history,
            user: self.user,
        }
    }
}
