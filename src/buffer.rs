//! Pooled byte buffers used to assemble one encoded line at a time.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;

/// Capacity given to a freshly allocated buffer.
const INITIAL_CAPACITY: usize = 1024;

/// Buffers that grew beyond this are dropped instead of being pooled.
const MAX_POOLED_CAPACITY: usize = 16 << 10;

static GLOBAL_POOL: Lazy<Arc<BufferPool>> = Lazy::new(|| Arc::new(BufferPool::new()));

/// A free list of byte buffers.
///
/// The pool is safe to share between threads; the lock is held only to push
/// or pop a single buffer. Individual buffers are owned exclusively by
/// whoever acquired them.
#[derive(Debug, Default)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide pool used by handlers that were not given one.
    pub fn global() -> Arc<BufferPool> {
        Arc::clone(&GLOBAL_POOL)
    }

    /// Take a zero-length buffer from the pool, allocating if it is empty.
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let reused = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let mut buf = reused.unwrap_or_else(|| Vec::with_capacity(INITIAL_CAPACITY));
        buf.clear();
        PooledBuffer {
            buf,
            pool: Arc::clone(self),
        }
    }

    /// Number of buffers currently waiting in the free list.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn put(&self, buf: Vec<u8>) {
        if buf.capacity() > MAX_POOLED_CAPACITY {
            return;
        }
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(buf);
    }
}

/// A buffer on loan from a [`BufferPool`].
///
/// Dereferences to `Vec<u8>` for appending. The buffer goes back to its pool
/// when dropped, so it is returned exactly once on every path.
#[derive(Debug)]
pub struct PooledBuffer {
    buf: Vec<u8>,
    pool: Arc<BufferPool>,
}

impl PooledBuffer {
    /// Return the buffer to its pool now.
    pub fn release(self) {
        drop(self);
    }
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.put(std::mem::take(&mut self.buf));
    }
}
