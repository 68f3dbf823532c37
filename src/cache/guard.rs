//! Cancellation Guard
//!
//! Races an entry-store operation against the caller's [`CancelToken`].
//!
//! The operation runs on its own task. If the token fires first the caller
//! gets [`CacheError::Cancelled`] right away, but the task is detached rather
//! than aborted: a mutation that already started still lands.

use std::sync::Arc;

use crate::cache::EntryStore;
use crate::error::{CacheError, Result};
use crate::token::CancelToken;

/// Runs `op` against `store` unless `token` fires first.
///
/// An already-fired token short-circuits before the store is touched.
pub(crate) async fn run_guarded<T, F>(
    token: &CancelToken,
    store: &Arc<EntryStore>,
    op: F,
) -> Result<T>
where
    F: FnOnce(&EntryStore) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    token.check()?;

    let store = Arc::clone(store);
    let task = tokio::spawn(async move { op(&store) });

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(CacheError::Cancelled),
        joined = task => match joined {
            Ok(result) => result,
            Err(err) => Err(CacheError::Internal(format!("store task failed: {}", err))),
        },
    }
}
