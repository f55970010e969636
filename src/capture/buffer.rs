//! Receive-buffer pool for capture sessions.
//!
//! Each session owns a small pool of reusable receive buffers. A buffer is
//! taken for every armed receive and handed back to the pool when the
//! [`PooledBuffer`] guard drops, on every exit path of the receive cycle.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::CaptureError;

/// Largest receive a session will size a buffer for (maximum IP datagram).
pub const MAX_RECEIVE_SIZE: usize = 65_535;

/// Default receive size (0x4000).
pub const DEFAULT_RECEIVE_SIZE: usize = 0x4000;

type Slots = Arc<Mutex<Vec<Vec<u8>>>>;

/// A receive buffer checked out of a [`BufferPool`].
pub struct PooledBuffer {
    data: Vec<u8>,
    pool: Slots,
}

impl PooledBuffer {
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let mut buffer = std::mem::take(&mut self.data);
        buffer.clear();
        if buffer.capacity() <= MAX_RECEIVE_SIZE * 2 {
            self.pool.lock().push(buffer);
        }
    }
}

/// A pool of receive buffers of one fixed size.
pub struct BufferPool {
    buffers: Slots,
    buffer_size: usize,
}

impl BufferPool {
    /// Creates a pool holding `pool_size` buffers of `buffer_size` bytes each.
    ///
    /// `buffer_size` is clamped to [`MAX_RECEIVE_SIZE`].
    pub fn new(pool_size: usize, buffer_size: usize) -> Self {
        let buffer_size = buffer_size.min(MAX_RECEIVE_SIZE);
        let buffers: Vec<Vec<u8>> = (0..pool_size)
            .map(|_| Vec::with_capacity(buffer_size))
            .collect();

        Self {
            buffers: Arc::new(Mutex::new(buffers)),
            buffer_size,
        }
    }

    /// Takes a zero-filled buffer of the pool's receive size.
    ///
    /// An exhausted pool allocates a fresh buffer; allocation failure is
    /// reported instead of aborting the process.
    pub fn acquire(&self) -> Result<PooledBuffer, CaptureError> {
        let mut data = self.buffers.lock().pop().unwrap_or_default();
        data.try_reserve_exact(self.buffer_size)
            .map_err(|_| CaptureError::BufferAllocation(self.buffer_size))?;
        data.resize(self.buffer_size, 0);

        Ok(PooledBuffer {
            data,
            pool: Arc::clone(&self.buffers),
        })
    }

    #[cfg(test)]
    fn idle(&self) -> usize {
        self.buffers.lock().len()
    }
}
