//! Primary/replica read routing.
//!
//! Reads normally go to the replica. Code that must see its own fresh
//! writes runs inside [`with_primary`], which pins reads to the primary for
//! the duration of one future. The pin is task-local: it ends when the
//! future completes, returns an error, panics or is dropped, and it never
//! affects other tasks sharing the worker thread.

use std::future::Future;

tokio::task_local! {
    static PINNED: ();
}

/// Where a read should be served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRoute {
    Primary,
    Replica,
}

/// Run `fut` with reads pinned to the primary store.
pub async fn with_primary<F>(fut: F) -> F::Output
where
    F: Future,
{
    PINNED.scope((), fut).await
}

/// Whether the current task is pinned to the primary store.
pub fn is_pinned() -> bool {
    PINNED.try_with(|_| ()).is_ok()
}

/// Route for a read issued from the current task.
pub fn current_route() -> ReadRoute {
    if is_pinned() {
        ReadRoute::Primary
    } else {
        ReadRoute::Replica
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unpinned_by_default() {
        assert!(!is_pinned());
        assert_eq!(current_route(), ReadRoute::Replica);
    }

    #[tokio::test]
    async fn test_pin_scoped_to_future() {
        let inside = with_primary(async { current_route() }).await;
        assert_eq!(inside, ReadRoute::Primary);
        assert_eq!(current_route(), ReadRoute::Replica);
    }

    #[tokio::test]
    async fn test_pin_released_after_error() {
        let result: Result<(), &str> = with_primary(async {
            assert!(is_pinned());
            Err("boom")
        })
        .await;
        assert!(result.is_err());
        assert!(!is_pinned());
    }

    #[tokio::test]
    async fn test_pin_does_not_leak_into_spawned_tasks() {
        let spawned = with_primary(async { tokio::spawn(async { is_pinned() }).await.unwrap() })
            .await;
        assert!(!spawned);
    }
}
