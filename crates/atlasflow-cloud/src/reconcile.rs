//! Merging API responses back into state records
//!
//! The remote API is not transparent: secrets are write-only and come back
//! empty or obfuscated, and optional fields are echoed as empty strings
//! whether or not the user ever set them. The helpers here encode the rules
//! every resource handler applies when it turns a response into state:
//!
//! - sensitive fields keep the caller's stored value ([`keep_sensitive`])
//! - optional fields without a default are only refreshed when state already
//!   holds a value ([`overwrite_if_set`])
//! - server-computed fields are always overwritten (plain assignment)
//!
//! List-valued blocks use a count gate: if the API returns a different
//! number of items than state holds, the list was changed elsewhere (or is
//! being imported) and every item is rebuilt from the response alone.

use std::collections::{HashMap, HashSet};

/// Empty strings from the API mean "absent"
pub fn null_if_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// [`null_if_empty`] for values the API may omit entirely
pub fn opt_null_if_empty(value: Option<&str>) -> Option<String> {
    value.and_then(null_if_empty)
}

/// Carry a write-only value forward from state
pub fn keep_sensitive(current: &Option<String>) -> Option<String> {
    opt_null_if_empty(current.as_deref())
}

/// Refresh an optional field only if the user configured it
pub fn overwrite_if_set<T, U>(current: &Option<T>, remote: Option<U>) -> Option<U> {
    if current.is_some() { remote } else { None }
}

/// How a list was reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMerge {
    /// Counts differed; every item was rebuilt from the response
    Rebuilt,
    /// Items were paired by position
    Positional,
    /// Items were paired by server-issued key
    Keyed,
}

/// Items that may carry a server-issued identity
pub trait ServerKeyed {
    fn server_key(&self) -> Option<&str>;
}

/// Reconcile a list block by position
///
/// `rebuild` builds a state item from the response alone; `merge` combines
/// a response item with the state item at the same position.
pub fn reconcile_list<R, S>(
    remote: &[R],
    current: &[S],
    rebuild: impl Fn(&R) -> S,
    merge: impl Fn(&R, &S) -> S,
) -> Vec<S> {
    if remote.len() != current.len() {
        return remote.iter().map(rebuild).collect();
    }
    remote
        .iter()
        .zip(current)
        .map(|(r, s)| merge(r, s))
        .collect()
}

/// Reconcile a list block, pairing by server key where that is unambiguous
///
/// The count gate applies first, exactly as in [`reconcile_list`]. With
/// equal counts, items are paired by [`ServerKeyed::server_key`] when every
/// item on both sides has a key and the key sets are identical; otherwise
/// they are paired by position. Output order follows the response.
pub fn reconcile_keyed_list<R, S>(
    remote: &[R],
    current: &[S],
    rebuild: impl Fn(&R) -> S,
    merge: impl Fn(&R, &S) -> S,
) -> (Vec<S>, ListMerge)
where
    R: ServerKeyed,
    S: ServerKeyed,
{
    if remote.len() != current.len() {
        return (remote.iter().map(rebuild).collect(), ListMerge::Rebuilt);
    }

    if let Some(by_key) = index_by_key(current) {
        let remote_keys: Option<HashSet<&str>> =
            remote.iter().map(|r| r.server_key()).collect();
        let state_keys: HashSet<&str> = by_key.keys().copied().collect();
        if remote_keys.as_ref() == Some(&state_keys) && state_keys.len() == remote.len() {
            let merged = remote
                .iter()
                .map(|r| {
                    // keys were checked above
                    let key = r.server_key().unwrap_or_default();
                    merge(r, by_key[key])
                })
                .collect();
            return (merged, ListMerge::Keyed);
        }
    }

    let merged = remote
        .iter()
        .zip(current)
        .map(|(r, s)| merge(r, s))
        .collect();
    (merged, ListMerge::Positional)
}

fn index_by_key<S: ServerKeyed>(items: &[S]) -> Option<HashMap<&str, &S>> {
    let mut index = HashMap::with_capacity(items.len());
    for item in items {
        if index.insert(item.server_key()?, item).is_some() {
            return None;
        }
    }
    Some(index)
}

/// Reconcile an at-most-one block (e.g. a threshold)
///
/// An absent response block yields an empty list. An empty state list means
/// the block was created elsewhere or is being imported, so it is rebuilt.
pub fn reconcile_single<R, S>(
    remote: Option<&R>,
    current: &[S],
    rebuild: impl Fn(&R) -> S,
    merge: impl Fn(&R, &S) -> S,
) -> Vec<S> {
    match (remote, current.first()) {
        (None, _) => Vec::new(),
        (Some(r), None) => vec![rebuild(r)],
        (Some(r), Some(s)) => vec![merge(r, s)],
    }
}
