use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::Network;
use crate::types::{Poll, PollOption, VoteRecord};

/// Identity of one cached query; the network is always part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    PollCount(Network),
    Poll(Network, u64),
    PollOptions(Network, u64, u64),
    AllPolls(Network, u64),
    HasVoted(Network, u64, String),
    Vote(Network, u64, String),
}

impl QueryKey {
    /// Poll id for per-poll keys.
    pub fn poll_id(&self) -> Option<u64> {
        match self {
            QueryKey::Poll(_, id)
            | QueryKey::PollOptions(_, id, _)
            | QueryKey::HasVoted(_, id, _)
            | QueryKey::Vote(_, id, _) => Some(*id),
            QueryKey::PollCount(_) | QueryKey::AllPolls(_, _) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    Count(u64),
    Poll(Option<Poll>),
    Options(Vec<PollOption>),
    Polls(Vec<Poll>),
    Flag(bool),
    Vote(Option<VoteRecord>),
}

/// How long each kind of query result is served before refetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub poll_count: Duration,
    pub poll: Duration,
    pub poll_options: Duration,
    pub all_polls: Duration,
    pub has_voted: Duration,
    pub vote: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            poll_count: Duration::from_secs(30),
            poll: Duration::from_secs(10),
            poll_options: Duration::from_secs(10),
            all_polls: Duration::from_secs(30),
            has_voted: Duration::from_secs(5),
            vote: Duration::from_secs(5),
        }
    }
}

impl CacheTtls {
    pub fn for_key(&self, key: &QueryKey) -> Duration {
        match key {
            QueryKey::PollCount(_) => self.poll_count,
            QueryKey::Poll(_, _) => self.poll,
            QueryKey::PollOptions(_, _, _) => self.poll_options,
            QueryKey::AllPolls(_, _) => self.all_polls,
            QueryKey::HasVoted(_, _, _) => self.has_voted,
            QueryKey::Vote(_, _, _) => self.vote,
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: CachedValue,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<QueryKey, Entry>,
    invalidations: HashMap<QueryKey, u64>,
}

#[derive(Debug, Default)]
pub struct QueryCache {
    ttls: CacheTtls,
    inner: Mutex<Inner>,
}

impl QueryCache {
    pub fn new(ttls: CacheTtls) -> Self {
        Self {
            ttls,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn ttls(&self) -> &CacheTtls {
        &self.ttls
    }

    /// Fresh value for `key`; stale entries are dropped on the way.
    pub async fn get(&self, key: &QueryKey) -> Option<CachedValue> {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;
        let fresh = match inner.entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => None,
            None => return None,
        };
        match fresh {
            Some(value) => {
                tracing::debug!(?key, "cache hit");
                Some(value)
            }
            None => {
                inner.entries.remove(key);
                None
            }
        }
    }

    pub async fn insert(&self, key: QueryKey, value: CachedValue) {
        let expires_at = Instant::now() + self.ttls.for_key(&key);
        let mut inner = self.inner.lock().await;
        inner.entries.insert(key, Entry { value, expires_at });
    }

    async fn invalidate_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&QueryKey) -> bool,
    {
        let mut inner = self.inner.lock().await;
        let doomed: Vec<QueryKey> = inner
            .entries
            .keys()
            .filter(|k| predicate(k))
            .cloned()
            .collect();
        for key in &doomed {
            inner.entries.remove(key);
            *inner.invalidations.entry(key.clone()).or_insert(0) += 1;
        }
        doomed.len()
    }

    /// Drops the detail entry for `(network, poll_id)` plus every options,
    /// has-voted and vote entry for that poll id.
    pub async fn invalidate_poll(&self, network: Network, poll_id: u64) -> usize {
        let removed = self
            .invalidate_where(|key| match key {
                QueryKey::Poll(net, id) => *net == network && *id == poll_id,
                QueryKey::PollOptions(_, id, _)
                | QueryKey::HasVoted(_, id, _)
                | QueryKey::Vote(_, id, _) => *id == poll_id,
                QueryKey::PollCount(_) | QueryKey::AllPolls(_, _) => false,
            })
            .await;
        tracing::debug!(%network, poll_id, removed, "invalidated poll queries");
        removed
    }

    /// Drops every aggregate entry (all polls, poll count) on every network.
    pub async fn invalidate_all(&self) -> usize {
        let removed = self
            .invalidate_where(|key| matches!(key, QueryKey::AllPolls(_, _) | QueryKey::PollCount(_)))
            .await;
        tracing::debug!(removed, "invalidated aggregate poll queries");
        removed
    }

    /// Number of times `key` has been removed by an invalidation.
    pub async fn invalidation_count(&self, key: &QueryKey) -> u64 {
        self.inner
            .lock()
            .await
            .invalidations
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.get(key).await.is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.inner.lock().await.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NET: Network = Network::Testnet;

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        tokio::time::pause();
        let cache = QueryCache::default();
        cache.insert(QueryKey::PollCount(NET), CachedValue::Count(3)).await;
        assert_eq!(
            cache.get(&QueryKey::PollCount(NET)).await,
            Some(CachedValue::Count(3))
        );

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(cache.contains(&QueryKey::PollCount(NET)).await);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!cache.contains(&QueryKey::PollCount(NET)).await);
        assert!(cache.is_empty().await, "stale entry dropped on read");
    }

    #[tokio::test]
    async fn test_has_voted_ttl_shorter_than_poll() {
        tokio::time::pause();
        let cache = QueryCache::default();
        let voted = QueryKey::HasVoted(NET, 1, "ST1VOTER".into());
        cache.insert(QueryKey::Poll(NET, 1), CachedValue::Poll(None)).await;
        cache.insert(voted.clone(), CachedValue::Flag(true)).await;

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(cache.contains(&QueryKey::Poll(NET, 1)).await);
        assert!(!cache.contains(&voted).await);
    }

    #[tokio::test]
    async fn test_invalidate_poll_scope() {
        let cache = QueryCache::default();
        let keys = [
            QueryKey::Poll(NET, 1),
            QueryKey::PollOptions(NET, 1, 3),
            QueryKey::HasVoted(NET, 1, "ST1VOTER".into()),
            QueryKey::Poll(NET, 2),
            QueryKey::Poll(Network::Mainnet, 1),
            QueryKey::PollCount(NET),
        ];
        for key in &keys {
            cache.insert(key.clone(), CachedValue::Flag(true)).await;
        }

        assert_eq!(cache.invalidate_poll(NET, 1).await, 3);
        assert!(!cache.contains(&keys[0]).await);
        assert!(!cache.contains(&keys[1]).await);
        assert!(!cache.contains(&keys[2]).await);
        assert!(cache.contains(&keys[3]).await, "other poll untouched");
        assert!(cache.contains(&keys[4]).await, "other network's detail untouched");
        assert!(cache.contains(&keys[5]).await, "aggregates untouched");
        assert_eq!(cache.invalidation_count(&keys[0]).await, 1);
        assert_eq!(cache.invalidation_count(&keys[3]).await, 0);
    }

    #[tokio::test]
    async fn test_invalidate_all_scope() {
        let cache = QueryCache::default();
        cache.insert(QueryKey::PollCount(NET), CachedValue::Count(2)).await;
        cache.insert(QueryKey::AllPolls(NET, 2), CachedValue::Polls(vec![])).await;
        cache.insert(QueryKey::PollCount(Network::Mainnet), CachedValue::Count(9)).await;
        cache.insert(QueryKey::Poll(NET, 1), CachedValue::Poll(None)).await;

        assert_eq!(cache.invalidate_all().await, 3);
        assert_eq!(cache.len().await, 1);
        assert!(cache.contains(&QueryKey::Poll(NET, 1)).await);
    }

    #[test]
    fn test_poll_id_of_keys() {
        assert_eq!(QueryKey::PollOptions(NET, 4, 2).poll_id(), Some(4));
        assert_eq!(QueryKey::AllPolls(NET, 4).poll_id(), None);
    }
}
