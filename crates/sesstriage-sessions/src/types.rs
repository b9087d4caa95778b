use serde::{Deserialize, Serialize};

/// A single HTTP request recorded in a session's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Position within the originating session, 0-based.
    pub seq: u32,
    /// Epoch seconds.
    pub timestamp: i64,
    pub host: Option<String>,
    /// Client address, used when the host is missing.
    pub address: Option<String>,
    /// Id of the session this request was recorded in.
    pub session: String,
}

impl Request {
    /// The host if present and non-empty, otherwise the client address.
    pub fn host_or_address(&self) -> Option<&str> {
        match self.host.as_deref() {
            Some(host) if !host.is_empty() => Some(host),
            _ => self.address.as_deref(),
        }
    }
}

/// A decoded session record, one per file in the session directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSession {
    pub id: String,
    /// `None` when the stored user agent is missing or not a string.
    pub useragent: Option<String>,
    pub visits: u64,
    /// Epoch seconds of the most recent activity.
    pub last: i64,
    /// Requests ordered by sequence number.
    pub history: Vec<Request>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
}

impl RawSession {
    /// The most recent request by arrival order.
    pub fn last_request(&self) -> Option<&Request> {
        self.history.last()
    }

    /// Sort history by sequence number.
    pub fn order_history(&mut self) {
        self.history.sort_by_key(|r| r.seq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(host: Option<&str>, address: Option<&str>) -> Request {
        Request {
            seq: 0,
            timestamp: 0,
            host: host.map(str::to_string),
            address: address.map(str::to_string),
            session: "s".to_string(),
        }
    }

    #[test]
    fn test_host_preferred_over_address() {
        let r = request(Some("www.example.com"), Some("192.0.2.1"));
        assert_eq!(r.host_or_address(), Some("www.example.com"));
    }

    #[test]
    fn test_empty_host_falls_back_to_address() {
        assert_eq!(
            request(Some(""), Some("192.0.2.1")).host_or_address(),
            Some("192.0.2.1")
        );
        assert_eq!(
            request(None, Some("192.0.2.1")).host_or_address(),
            Some("192.0.2.1")
        );
        assert_eq!(request(None, None).host_or_address(), None);
    }
}
