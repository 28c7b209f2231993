//! Queue navigation as pure functions over `(tracks, current_id)`.
//!
//! The queue pointer is always re-derived by id lookup, never stored as a
//! raw index. The queue can be replaced wholesale when the user switches
//! browsing context, so a cached index could outlive the list it indexed.

use crate::models::Track;

/// "Previous" past this point into a track restarts it instead of moving.
pub const RESTART_THRESHOLD_SECS: f64 = 3.0;

pub fn index_of(queue: &[Track], current_id: &str) -> Option<usize> {
    queue.iter().position(|t| t.id == current_id)
}

/// Next entry after the current track, wrapping to the front past the end.
/// An id that is no longer in the queue also lands on the front entry.
pub fn next<'a>(queue: &'a [Track], current_id: &str) -> Option<&'a Track> {
    if queue.is_empty() {
        return None;
    }
    let next_idx = match index_of(queue, current_id) {
        Some(i) if i + 1 < queue.len() => i + 1,
        _ => 0,
    };
    queue.get(next_idx)
}

#[derive(Debug, PartialEq)]
pub enum PrevAction<'a> {
    /// Seek the current track back to zero; the pointer does not move.
    Restart,
    Jump(&'a Track),
}

/// Previous entry, or a restart of the current track when more than
/// [`RESTART_THRESHOLD_SECS`] have already elapsed in it.
pub fn previous<'a>(
    queue: &'a [Track],
    current_id: &str,
    elapsed_secs: f64,
) -> Option<PrevAction<'a>> {
    if queue.is_empty() {
        return None;
    }
    if elapsed_secs > RESTART_THRESHOLD_SECS {
        return Some(PrevAction::Restart);
    }
    let prev_idx = match index_of(queue, current_id) {
        Some(i) if i > 0 => i - 1,
        _ => queue.len() - 1,
    };
    queue.get(prev_idx).map(PrevAction::Jump)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track::new(id, format!("Title {}", id), "Artist", "")
    }

    fn abc() -> Vec<Track> {
        vec![track("a"), track("b"), track("c")]
    }

    #[test]
    fn next_walks_forward_and_wraps() {
        let q = abc();
        assert_eq!(next(&q, "a").unwrap().id, "b");
        assert_eq!(next(&q, "b").unwrap().id, "c");
        assert_eq!(next(&q, "c").unwrap().id, "a");
    }

    #[test]
    fn next_on_empty_queue_returns_none() {
        assert_eq!(next(&[], "a"), None);
    }

    #[test]
    fn next_with_unknown_id_starts_from_front() {
        let q = abc();
        assert_eq!(next(&q, "ghost").unwrap().id, "a");
    }

    #[test]
    fn previous_walks_back_and_wraps() {
        let q = abc();
        assert_eq!(previous(&q, "b", 1.0), Some(PrevAction::Jump(&q[0])));
        assert_eq!(previous(&q, "a", 0.0), Some(PrevAction::Jump(&q[2])));
    }

    #[test]
    fn previous_deep_into_track_restarts_in_place() {
        let q = abc();
        assert_eq!(previous(&q, "b", 3.5), Some(PrevAction::Restart));
        // exactly at the threshold still moves the pointer
        assert_eq!(previous(&q, "b", 3.0), Some(PrevAction::Jump(&q[0])));
    }

    #[test]
    fn previous_on_empty_queue_returns_none() {
        assert_eq!(previous(&[], "a", 10.0), None);
    }

    #[test]
    fn duplicate_ids_resolve_to_first_occurrence() {
        let q = vec![track("a"), track("b"), track("a")];
        assert_eq!(index_of(&q, "a"), Some(0));
        assert_eq!(next(&q, "a").unwrap().id, "b");
    }
}
