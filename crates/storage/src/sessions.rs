#![forbid(unsafe_code)]

use parking_lot::Mutex;
use std::collections::HashMap;

/// An authenticated subject with an absolute expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub subject: String,
    pub expires_at_ms: i64,
}

impl Session {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// Token-keyed sessions. Time is passed in so callers and tests control it.
pub trait SessionStore: Send + Sync {
    fn create(&self, subject: &str, now_ms: i64) -> Session;

    /// Returns the live session for `token`. Expired entries are dropped.
    fn lookup(&self, token: &str, now_ms: i64) -> Option<Session>;

    fn expire(&self, token: &str) -> bool;

    /// Drops every expired session and returns how many went.
    fn sweep(&self, now_ms: i64) -> usize;
}

#[derive(Debug)]
pub struct MemorySessionStore {
    ttl_ms: i64,
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new(ttl_ms: i64) -> Self {
        Self {
            ttl_ms: ttl_ms.max(0),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// TTL given in whole seconds, as configuration states it.
    pub fn with_ttl_seconds(seconds: u64) -> Self {
        Self::new(i64::try_from(seconds.saturating_mul(1000)).unwrap_or(i64::MAX))
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self, subject: &str, now_ms: i64) -> Session {
        let mut sessions = self.sessions.lock();
        let token = loop {
            let token = new_token();
            if !sessions.contains_key(&token) {
                break token;
            }
        };
        let session = Session {
            token: token.clone(),
            subject: subject.to_string(),
            expires_at_ms: now_ms.saturating_add(self.ttl_ms),
        };
        sessions.insert(token, session.clone());
        session
    }

    fn lookup(&self, token: &str, now_ms: i64) -> Option<Session> {
        let mut sessions = self.sessions.lock();
        let session = sessions.get(token)?;
        if session.is_expired(now_ms) {
            sessions.remove(token);
            return None;
        }
        Some(session.clone())
    }

    fn expire(&self, token: &str) -> bool {
        self.sessions.lock().remove(token).is_some()
    }

    fn sweep(&self, now_ms: i64) -> usize {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now_ms));
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::debug!(removed, "expired sessions swept");
        }
        removed
    }
}

/// 24 random bytes as 48 lowercase hex characters.
fn new_token() -> String {
    let bytes: [u8; 24] = rand::random();
    let mut out = String::with_capacity(48);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
