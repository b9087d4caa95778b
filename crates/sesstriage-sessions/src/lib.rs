pub mod parser;
pub mod php;
pub mod store;
pub mod types;

pub use parser::{decode_session, parse_session};
pub use php::unserialize_session;
pub use store::{LoadedSessions, SessionStore, SkippedRecord, DEFAULT_PREFIX};
pub use types::{RawSession, Request};
