//! Rotating proxy pool shared by all workers

use crate::HarvestError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Semaphore;

/// A FIFO pool of proxy URLs
///
/// `acquire` takes from the front and `release` appends to the back. The
/// semaphore holds one permit per queued proxy, so an acquirer that wins a
/// permit is guaranteed to find a proxy in the queue; when the pool is empty
/// acquirers wait until some worker releases one.
///
/// Once every proxy has been discarded the pool closes and all waiting and
/// future acquirers fail with [`HarvestError::PoolClosed`].
pub struct ProxyPool {
    proxies: Mutex<VecDeque<String>>,
    available: Semaphore,
    // queued plus leased proxies
    live: AtomicUsize,
}

impl ProxyPool {
    /// Creates a pool holding the given proxies in order
    pub fn new(proxies: Vec<String>) -> Self {
        let available = Semaphore::new(proxies.len());
        let live = AtomicUsize::new(proxies.len());
        Self {
            proxies: Mutex::new(proxies.into()),
            available,
            live,
        }
    }

    /// Removes and returns the proxy at the front of the pool
    ///
    /// Waits without limit while the pool is empty, unless the pool has been
    /// closed because no proxies are left at all.
    pub async fn acquire(&self) -> Result<String, HarvestError> {
        let permit = self
            .available
            .acquire()
            .await
            .map_err(|_| HarvestError::PoolClosed)?;
        permit.forget();

        self.lock()
            .pop_front()
            .ok_or(HarvestError::PoolClosed)
    }

    /// Acquires a proxy wrapped in a guard that returns it on drop
    pub async fn lease(&self) -> Result<ProxyLease<'_>, HarvestError> {
        let proxy = self.acquire().await?;
        Ok(ProxyLease {
            pool: self,
            proxy: Some(proxy),
        })
    }

    /// Returns a proxy to the back of the pool
    pub fn release(&self, proxy: String) {
        self.lock().push_back(proxy);
        self.available.add_permits(1);
    }

    /// Number of proxies currently in the pool
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once every proxy has been discarded
    pub fn is_closed(&self) -> bool {
        self.available.is_closed()
    }

    /// Copy of the pool contents, front first
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    fn retire(&self, proxy: &str) {
        let remaining = self.live.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        if remaining == 0 {
            tracing::warn!("Discarded {}, the last proxy; closing the pool", proxy);
            self.available.close();
        } else {
            tracing::debug!("Discarded {}, {} proxies left", proxy, remaining);
        }
    }

    // A poisoned queue is still structurally valid: every push and pop
    // completes before the guard drops.
    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.proxies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A proxy checked out of a [`ProxyPool`]
///
/// Dropping the lease puts the proxy back at the tail of the pool, so a
/// worker that bails out early, by error or by panic, never loses it.
pub struct ProxyLease<'a> {
    pool: &'a ProxyPool,
    proxy: Option<String>,
}

impl ProxyLease<'_> {
    pub fn proxy(&self) -> &str {
        self.proxy.as_deref().unwrap_or_default()
    }

    /// Returns the proxy to the pool now
    pub fn release(self) {
        drop(self);
    }

    /// Withdraws the proxy from rotation for good
    ///
    /// Discarding the last live proxy closes the pool.
    pub fn discard(mut self) -> String {
        let proxy = self.proxy.take().unwrap_or_default();
        self.pool.retire(&proxy);
        proxy
    }
}

impl Drop for ProxyLease<'_> {
    fn drop(&mut self) {
        if let Some(proxy) = self.proxy.take() {
            self.pool.release(proxy);
        }
    }
}
