use std::net::Ipv4Addr;

use serde::Serialize;
use tracing::warn;

use sesstriage_sessions::RawSession;

/// Grouping key for repeat non-browser traffic: `"{top-level host}#{user agent}"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct CrawlerIdentity(String);

impl CrawlerIdentity {
    /// Derive the identity from the last request's host and the session's user agent.
    /// A missing host is reported and the client address is used instead.
    pub fn of(session: &RawSession) -> Self {
        let host = match session.last_request() {
            Some(request) => {
                if request.host.as_deref().map_or(true, str::is_empty) {
                    warn!(
                        session = %session.id,
                        seq = request.seq,
                        address = ?request.address,
                        "Last request has no host, grouping by address"
                    );
                }
                request.host_or_address().unwrap_or_default()
            }
            None => {
                warn!(session = %session.id, "Session has no requests to derive a host from");
                ""
            }
        };

        Self::from_parts(host, session.useragent.as_deref().unwrap_or_default())
    }

    pub fn from_parts(host: &str, useragent: &str) -> Self {
        Self(format!("{}#{}", top_level(host), useragent))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CrawlerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The host without its leftmost label, or an IPv4 address without its last octet.
pub fn top_level(host: &str) -> &str {
    if host.parse::<Ipv4Addr>().is_ok() {
        return host.rsplit_once('.').map_or(host, |(network, _)| network);
    }
    host.split_once('.').map_or(host, |(_, rest)| rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sesstriage_sessions::Request;

    fn session(host: Option<&str>, address: Option<&str>, ua: Option<&str>) -> RawSession {
        RawSession {
            id: "s1".to_string(),
            useragent: ua.map(str::to_string),
            visits: 1,
            last: 100,
            history: vec![
                Request {
                    seq: 0,
                    timestamp: 50,
                    host: Some("ignored.example.org".to_string()),
                    address: None,
                    session: "s1".to_string(),
                },
                Request {
                    seq: 1,
                    timestamp: 100,
                    host: host.map(str::to_string),
                    address: address.map(str::to_string),
                    session: "s1".to_string(),
                },
            ],
            user: None,
        }
    }

    #[test]
    fn test_top_level_strips_leftmost_label() {
        assert_eq!(top_level("news.example.com"), "example.com");
        assert_eq!(top_level("a.b.example.co.uk"), "b.example.co.uk");
        assert_eq!(top_level("localhost"), "localhost");
    }

    #[test]
    fn test_top_level_ipv4_drops_last_octet() {
        assert_eq!(top_level("203.0.113.5"), "203.0.113");
        // Not a valid IPv4 literal, treated as a host name.
        assert_eq!(top_level("999.0.113.5"), "0.113.5");
    }

    #[test]
    fn test_identity_uses_last_request_host() {
        let id = CrawlerIdentity::of(&session(
            Some("crawl-1.googlebot.com"),
            Some("66.249.66.1"),
            Some("Googlebot"),
        ));
        assert_eq!(id.as_str(), "googlebot.com#Googlebot");
    }

    #[test]
    fn test_identity_falls_back_to_address() {
        let id = CrawlerIdentity::of(&session(None, Some("203.0.113.5"), Some("curl/7.68.0")));
        assert_eq!(id.as_str(), "203.0.113#curl/7.68.0");

        let id = CrawlerIdentity::of(&session(Some(""), Some("203.0.113.5"), None));
        assert_eq!(id.as_str(), "203.0.113#");
    }

    #[test]
    fn test_identity_without_requests() {
        let mut s = session(None, None, Some("x"));
        s.history.clear();
        assert_eq!(CrawlerIdentity::of(&s).as_str(), "#x");
    }
}
