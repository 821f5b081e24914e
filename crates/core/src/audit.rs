use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::message::SessionId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Receive,
    Classify,
    Route,
    Handle,
    Complete,
    Fail,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receive => "receive",
            Self::Classify => "classify",
            Self::Route => "route",
            Self::Handle => "handle",
            Self::Complete => "complete",
            Self::Fail => "fail",
        }
    }
}

/// What a stage asks the log to record. The log itself assigns the timestamp
/// and the hash chain links.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub session_id: SessionId,
    pub component: String,
    pub action: AuditAction,
    pub detail: String,
}

impl AuditRecord {
    pub fn new(
        session_id: SessionId,
        component: impl Into<String>,
        action: AuditAction,
        detail: impl Into<String>,
    ) -> Self {
        Self { session_id, component: component.into(), action, detail: detail.into() }
    }
}

/// Append-only decision trail entry. Once appended it is never mutated or
/// removed; each entry links to the previous one in its session so the trail
/// is verifiable after the fact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub session_id: SessionId,
    pub component: String,
    pub action: AuditAction,
    pub detail: String,
    pub prev_hash: Option<String>,
    pub entry_hash: String,
}

pub trait AuditLog: Send + Sync {
    fn append(&self, record: AuditRecord);
    fn entries_for_session(&self, session_id: &SessionId) -> Vec<AuditEntry>;
    fn entries_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<AuditEntry>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    pub session_id: SessionId,
    pub valid: bool,
    pub verified_entries: usize,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<AuditEntry>,
    // last entry hash per session, avoids rescanning on every append
    heads: HashMap<String, String>,
}

/// Process-wide shared log. Appends take a single mutually-exclusive critical
/// section, so concurrent sessions never interleave a partial write and each
/// session's own sub-sequence stays in causal order.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    state: Mutex<LogState>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.lock_state().entries.clone()
    }

    /// Walks a session's hash chain and reports the first broken link, if any.
    pub fn verify_session(&self, session_id: &SessionId) -> ChainVerification {
        let entries = self.entries_for_session(session_id);
        if entries.is_empty() {
            return ChainVerification {
                session_id: session_id.clone(),
                valid: false,
                verified_entries: 0,
                failure_reason: Some("no audit entries found for session".to_owned()),
            };
        }

        let mut previous_hash: Option<String> = None;
        for (index, entry) in entries.iter().enumerate() {
            if entry.prev_hash != previous_hash {
                return ChainVerification {
                    session_id: session_id.clone(),
                    valid: false,
                    verified_entries: index,
                    failure_reason: Some(format!("previous hash mismatch at entry {index}")),
                };
            }

            let computed = hash_entry_material(
                session_id,
                &entry.component,
                entry.action,
                &entry.detail,
                entry.timestamp,
                entry.prev_hash.as_deref(),
            );
            if computed != entry.entry_hash {
                return ChainVerification {
                    session_id: session_id.clone(),
                    valid: false,
                    verified_entries: index,
                    failure_reason: Some(format!("entry hash mismatch at entry {index}")),
                };
            }

            previous_hash = Some(entry.entry_hash.clone());
        }

        ChainVerification {
            session_id: session_id.clone(),
            valid: true,
            verified_entries: entries.len(),
            failure_reason: None,
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, LogState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl AuditLog for InMemoryAuditLog {
    fn append(&self, record: AuditRecord) {
        let mut state = self.lock_state();
        let timestamp = Utc::now();
        let prev_hash = state.heads.get(&record.session_id.0).cloned();
        let entry_hash = hash_entry_material(
            &record.session_id,
            &record.component,
            record.action,
            &record.detail,
            timestamp,
            prev_hash.as_deref(),
        );
        state.heads.insert(record.session_id.0.clone(), entry_hash.clone());
        state.entries.push(AuditEntry {
            timestamp,
            session_id: record.session_id,
            component: record.component,
            action: record.action,
            detail: record.detail,
            prev_hash,
            entry_hash,
        });
    }

    fn entries_for_session(&self, session_id: &SessionId) -> Vec<AuditEntry> {
        self.lock_state()
            .entries
            .iter()
            .filter(|entry| &entry.session_id == session_id)
            .cloned()
            .collect()
    }

    fn entries_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<AuditEntry> {
        self.lock_state()
            .entries
            .iter()
            .filter(|entry| entry.timestamp >= start && entry.timestamp <= end)
            .cloned()
            .collect()
    }
}

fn hash_entry_material(
    session_id: &SessionId,
    component: &str,
    action: AuditAction,
    detail: &str,
    timestamp: DateTime<Utc>,
    prev_hash: Option<&str>,
) -> String {
    let material = format!(
        "{}|{}|{}|{}|{}|{}",
        session_id.0,
        component,
        action.as_str(),
        detail,
        timestamp.to_rfc3339(),
        prev_hash.unwrap_or(""),
    );
    let digest = Sha256::digest(material.as_bytes());
    let mut output = String::with_capacity(digest.len() * 2);
    for byte in digest {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}
