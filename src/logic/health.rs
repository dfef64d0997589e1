use std::time::Duration;

use crate::store::HealthStore;

/// Whether the store answers a ping within `timeout`.
///
/// Refused connections, query errors and timeouts all count as offline.
/// Never fails the caller.
pub async fn is_database_online<S: HealthStore + ?Sized>(store: &S, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, store.ping()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            log::warn!("Database health check failed: {:#}", e);
            false
        }
        Err(_) => {
            log::warn!("Database health check timed out after {:?}", timeout);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn test_online() {
        let store = InMemoryStore::new();
        assert!(is_database_online(&store, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let store = InMemoryStore::new();
        store.set_online(false);
        assert!(!is_database_online(&store, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_timeout() {
        let store = InMemoryStore::new();
        store.set_ping_delay(Some(Duration::from_millis(200)));
        assert!(!is_database_online(&store, Duration::from_millis(10)).await);
    }
}
