use parking_lot::Mutex;

/// Unbounded, thread-safe accumulator of captured samples.
///
/// The capture worker appends, consumers drain. Both go through one mutex, so
/// an append and a drain never interleave: every sample lands in exactly one
/// drain result, in capture order.
///
/// There is no capacity limit. A consumer that stops draining lets the buffer
/// grow by 96 KB per second of audio.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    samples: Vec<i16>,
    drained: u64,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `samples` in order.
    pub fn append(&self, samples: &[i16]) {
        if samples.is_empty() {
            return;
        }
        self.inner.lock().samples.extend_from_slice(samples);
    }

    /// Remove and return everything accumulated since the last drain.
    ///
    /// Returns an empty vector when nothing is buffered.
    pub fn drain_all(&self) -> Vec<i16> {
        let mut inner = self.inner.lock();
        let samples = std::mem::take(&mut inner.samples);
        inner.drained += samples.len() as u64;
        samples
    }

    /// Discard the buffered samples and zero the drained count.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.samples.clear();
        inner.samples.shrink_to_fit();
        inner.drained = 0;
    }

    /// Samples handed out by `drain_all` since creation or the last `clear`.
    pub fn total_drained(&self) -> u64 {
        self.inner.lock().drained
    }

    /// Number of buffered samples.
    pub fn len(&self) -> usize {
        self.inner.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().samples.is_empty()
    }
}
