use crate::models::{SyncMeta, Transaction};

/// Remote wins only when local is clean and the delta is not older than the
/// last server timestamp known for that id.
pub fn accepts_delta(local: Option<&Transaction>, delta_ts: i64) -> bool {
    match local {
        None => true,
        Some(l) if l.sync.dirty => false,
        Some(l) => delta_ts >= l.sync.server_version(),
    }
}

/// Merge one pulled delta against the local row. Returns the clean row to
/// store, or `None` when local state must be kept.
///
/// A delta without a server timestamp is stamped with `now`.
pub fn merge_delta(local: Option<&Transaction>, mut delta: Transaction, now: i64) -> Option<Transaction> {
    let delta_ts = delta.sync.server_version();
    if !accepts_delta(local, delta_ts) {
        return None;
    }
    let applied_ts = if delta_ts > 0 { delta_ts } else { now };
    delta.normalize_savings();
    delta.sync = SyncMeta::clean(applied_ts, now, delta.sync.deleted);
    Some(delta)
}
