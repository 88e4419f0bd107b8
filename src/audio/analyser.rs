//! Analysis tap: the graph-side ring of recent samples.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Most recent `fft_size` mono samples seen by the analyser node
struct TapBuffer {
    ring: Vec<f32>,
    write_pos: usize,
    populated: bool,
}

/// Non-destructive read point in the signal graph
///
/// The graph writes every processed block; the sampler copies the latest
/// window out on each render tick.
#[derive(Clone)]
pub struct AnalysisTap {
    inner: Arc<Mutex<TapBuffer>>,
    fft_size: usize,
}

impl AnalysisTap {
    pub(crate) fn new(fft_size: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TapBuffer {
                ring: vec![0.0; fft_size],
                write_pos: 0,
                populated: false,
            })),
            fft_size,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TapBuffer> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Append a block of mono samples
    pub(crate) fn write(&self, block: &[f32]) {
        if block.is_empty() {
            return;
        }
        let mut tap = self.lock();
        let len = tap.ring.len();
        // Only the tail of an oversized block can survive
        let block = &block[block.len().saturating_sub(len)..];
        for &sample in block {
            let pos = tap.write_pos;
            tap.ring[pos] = sample;
            tap.write_pos = (pos + 1) % len;
        }
        tap.populated = true;
    }

    /// Copy the latest window, oldest sample first, into `dest`
    ///
    /// Returns `false` (leaving `dest` untouched) if no audio has arrived yet.
    pub fn copy_latest(&self, dest: &mut [f32]) -> bool {
        let tap = self.lock();
        if !tap.populated {
            return false;
        }
        let (newer, older) = tap.ring.split_at(tap.write_pos);
        for (d, s) in dest.iter_mut().zip(older.iter().chain(newer)) {
            *d = *s;
        }
        true
    }
}
