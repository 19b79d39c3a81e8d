//! # Session Helpers
//!
//! Pure operations on inventory sessions: the append-only observation log
//! and the checker's queue of sessions waiting for verification.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::{SessionWithZone, ZoneId, ZoneState};

/// Appends a closing note to a session's observation log.
///
/// ## Format
/// ```text
/// <existing observations>
/// [closed 2026-10-19T08:30:00Z] <note>
/// ```
/// With `with_header` off only a non-empty note is appended.
pub fn append_closing_note(
    existing: &str,
    note: &str,
    closed_at: DateTime<Utc>,
    with_header: bool,
) -> String {
    let note = note.trim();

    let line = if with_header {
        let header = format!(
            "[closed {}]",
            closed_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        if note.is_empty() {
            header
        } else {
            format!("{header} {note}")
        }
    } else if note.is_empty() {
        return existing.to_string();
    } else {
        note.to_string()
    };

    if existing.is_empty() {
        line
    } else {
        format!("{existing}\n{line}")
    }
}

/// Picks the sessions a checker should see.
///
/// One session per zone in `in_verification`, the most recently started
/// when a zone has several. Sessions superseded by a newer one on their zone
/// are skipped. Result is ordered by zone id.
pub fn pending_verifications(sessions: Vec<SessionWithZone>) -> Vec<SessionWithZone> {
    let mut latest: BTreeMap<ZoneId, SessionWithZone> = BTreeMap::new();

    for candidate in sessions
        .into_iter()
        .filter(|s| s.zone.state == ZoneState::InVerification && s.is_current())
    {
        let replace = match latest.get(&candidate.zone.id) {
            None => true,
            Some(current) => {
                (candidate.session.started_at, candidate.session.id)
                    > (current.session.started_at, current.session.id)
            }
        };
        if replace {
            latest.insert(candidate.zone.id, candidate);
        }
    }

    latest.into_values().collect()
}
