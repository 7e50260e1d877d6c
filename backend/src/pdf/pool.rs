//! Bounded pool of browser processes

use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info, warn};

use super::{BrowserHandle, BrowserLauncher, PdfError};

/// Snapshot of pool usage for the health endpoint
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PoolStatus {
    pub size: usize,
    pub launched: usize,
    pub idle: usize,
    pub in_use: usize,
    pub closed: bool,
}

/// Hands out browser handles, at most `size` at a time
///
/// Browsers are launched on first demand and reused afterwards. A caller
/// that finds its browser broken calls [`PooledBrowser::discard`] so the next
/// caller gets a fresh process.
pub struct BrowserPool {
    launcher: Arc<dyn BrowserLauncher>,
    idle: Mutex<Vec<Box<dyn BrowserHandle>>>,
    permits: Semaphore,
    size: usize,
    launched: AtomicUsize,
    closed: AtomicBool,
}

impl BrowserPool {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, size: usize) -> Self {
        let size = size.max(1);
        Self {
            launcher,
            idle: Mutex::new(Vec::with_capacity(size)),
            permits: Semaphore::new(size),
            size,
            launched: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Wait for a free slot and return a ready browser
    pub async fn acquire(&self) -> Result<PooledBrowser<'_>, PdfError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PdfError::PoolClosed);
        }
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| PdfError::PoolClosed)?;

        let reused = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let handle = match reused {
            Some(handle) => handle,
            None => {
                let handle = self.launcher.launch().await?;
                let launched = self.launched.fetch_add(1, Ordering::AcqRel) + 1;
                info!(launched, size = self.size, "Browser launched");
                handle
            }
        };

        Ok(PooledBrowser {
            pool: self,
            handle: Some(handle),
            _permit: permit,
        })
    }

    /// Stop handing out browsers and terminate the idle ones. Browsers still
    /// in use are terminated when they are returned.
    pub async fn close(&self) {
        let idle: Vec<_> = {
            let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
            if self.closed.swap(true, Ordering::AcqRel) {
                return;
            }
            idle.drain(..).collect()
        };
        self.permits.close();
        for handle in idle {
            self.launched.fetch_sub(1, Ordering::AcqRel);
            if let Err(e) = handle.close().await {
                warn!(error = %e, "Failed to close browser");
            }
        }
        info!("Browser pool closed");
    }

    pub fn health(&self) -> PoolStatus {
        let idle = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        let launched = self.launched.load(Ordering::Acquire);
        PoolStatus {
            size: self.size,
            launched,
            idle,
            in_use: launched.saturating_sub(idle),
            closed: self.closed.load(Ordering::Acquire),
        }
    }

    fn release(&self, handle: Box<dyn BrowserHandle>) {
        {
            let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
            if !self.closed.load(Ordering::Acquire) {
                idle.push(handle);
                return;
            }
        }
        self.launched.fetch_sub(1, Ordering::AcqRel);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = handle.close().await {
                        warn!(error = %e, "Failed to close returned browser");
                    }
                });
            }
            Err(_) => debug!("No runtime to close returned browser; dropping it"),
        }
    }
}

/// A browser borrowed from the pool; returned on drop
pub struct PooledBrowser<'a> {
    pool: &'a BrowserPool,
    handle: Option<Box<dyn BrowserHandle>>,
    _permit: SemaphorePermit<'a>,
}

impl PooledBrowser<'_> {
    /// Take the browser out of the pool for good. The caller closes it; the
    /// slot is freed for a newly launched browser.
    pub fn discard(mut self) -> Box<dyn BrowserHandle> {
        self.pool.launched.fetch_sub(1, Ordering::AcqRel);
        // Only `discard` and `drop` take the handle, and both consume self.
        match self.handle.take() {
            Some(handle) => handle,
            None => unreachable!("pooled browser without a handle"),
        }
    }
}

impl Deref for PooledBrowser<'_> {
    type Target = dyn BrowserHandle;

    fn deref(&self) -> &Self::Target {
        match &self.handle {
            Some(handle) => handle.as_ref(),
            None => unreachable!("pooled browser without a handle"),
        }
    }
}

impl Drop for PooledBrowser<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.pool.release(handle);
        }
    }
}
