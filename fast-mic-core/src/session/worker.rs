use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::session::CaptureDiagnostics;
use crate::processing::sample_buffer::SampleBuffer;
use crate::traits::audio_source::AudioSource;
use crate::traits::capture_delegate::CaptureDelegate;

/// How the capture loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// The run flag was cleared.
    Stopped,
    /// A device read failed; the loop ended early.
    Failed(CaptureError),
}

/// Everything the capture thread needs besides the source.
pub struct WorkerContext {
    pub buffer: Arc<SampleBuffer>,
    pub diagnostics: Arc<Mutex<CaptureDiagnostics>>,
    pub delegate: Option<Arc<dyn CaptureDelegate>>,
    pub scratch_size: usize,
}

/// Producer thread: reads the source and appends into the sample buffer
/// until its run flag is cleared.
///
/// The thread owns the source while it runs and hands it back on
/// [`join`](Self::join), so nothing else can touch the device mid-read.
pub struct CaptureWorker<S: AudioSource> {
    running: Arc<AtomicBool>,
    handle: thread::JoinHandle<(S, WorkerExit)>,
}

impl<S: AudioSource> CaptureWorker<S> {
    /// Spawn the capture thread. The source must already be streaming.
    ///
    /// If the thread cannot be spawned the source is dropped with it.
    pub fn spawn(mut source: S, ctx: WorkerContext) -> Result<Self, CaptureError> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || {
                log::debug!("Capture worker started, scratch buffer {} samples", ctx.scratch_size);
                let exit = capture_loop(&mut source, &flag, &ctx);
                if let WorkerExit::Failed(ref e) = exit {
                    log::error!("Capture worker stopped on device error: {}", e);
                    ctx.diagnostics.lock().last_error = Some(e.to_string());
                    if let Some(ref delegate) = ctx.delegate {
                        delegate.on_error(e);
                    }
                }
                log::debug!("Capture worker exiting");
                (source, exit)
            })
            .map_err(|e| CaptureError::Device(format!("failed to spawn capture thread: {}", e)))?;

        Ok(Self { running, handle })
    }

    /// Whether the capture loop has ended (stopped or failed).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Clear the run flag without waiting.
    pub fn signal_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Clear the run flag and wait for the thread, getting the source back.
    ///
    /// Returns after at most one more device read.
    pub fn join(self) -> Result<(S, WorkerExit), CaptureError> {
        self.signal_stop();
        self.handle
            .join()
            .map_err(|_| CaptureError::device("capture thread panicked"))
    }
}

fn capture_loop<S: AudioSource>(
    source: &mut S,
    running: &AtomicBool,
    ctx: &WorkerContext,
) -> WorkerExit {
    let mut scratch = vec![0i16; ctx.scratch_size.max(1)];

    while running.load(Ordering::SeqCst) {
        let count = match source.read(&mut scratch) {
            Ok(count) => count.min(scratch.len()),
            Err(e) => return WorkerExit::Failed(e),
        };

        // Only the first `count` samples are fresh; the rest may be left over
        // from an earlier, longer read.
        if count > 0 {
            ctx.buffer.append(&scratch[..count]);
        }

        let mut diag = ctx.diagnostics.lock();
        diag.device_reads += 1;
        if count == 0 {
            diag.empty_reads += 1;
        } else {
            diag.samples_captured += count as u64;
        }
    }

    WorkerExit::Stopped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::CaptureConfig;
    use crate::test_support::{wait_until, ReadStep, ScriptedBackend};
    use crate::traits::audio_source::AudioBackend;

    struct Fixture {
        buffer: Arc<SampleBuffer>,
        diagnostics: Arc<Mutex<CaptureDiagnostics>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                buffer: Arc::new(SampleBuffer::new()),
                diagnostics: Arc::new(Mutex::new(CaptureDiagnostics::default())),
            }
        }

        fn context(&self, scratch_size: usize) -> WorkerContext {
            WorkerContext {
                buffer: Arc::clone(&self.buffer),
                diagnostics: Arc::clone(&self.diagnostics),
                delegate: None,
                scratch_size,
            }
        }
    }

    fn streaming_source(backend: &ScriptedBackend) -> crate::test_support::ScriptedSource {
        let mut source = backend.open(&CaptureConfig::default()).unwrap();
        source.start_streaming().unwrap();
        source
    }

    #[test]
    fn appends_reads_in_order() {
        let backend = ScriptedBackend::new().with_reads([
            ReadStep::Samples(vec![1, 2, 3]),
            ReadStep::Samples(vec![]),
            ReadStep::Samples(vec![4, 5]),
        ]);
        let fixture = Fixture::new();
        let worker = CaptureWorker::spawn(streaming_source(&backend), fixture.context(8)).unwrap();

        assert!(wait_until(|| fixture.buffer.len() == 5));
        let (_source, exit) = worker.join().unwrap();

        assert_eq!(exit, WorkerExit::Stopped);
        assert_eq!(fixture.buffer.drain_all(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn short_read_appends_only_fresh_samples() {
        let backend = ScriptedBackend::new().with_reads([
            ReadStep::Samples(vec![10, 11, 12, 13, 14]),
            ReadStep::Samples(vec![20, 21]),
        ]);
        let fixture = Fixture::new();
        let worker = CaptureWorker::spawn(streaming_source(&backend), fixture.context(8)).unwrap();

        assert!(wait_until(|| backend.script_exhausted() && fixture.buffer.len() >= 7));
        worker.join().unwrap();

        assert_eq!(fixture.buffer.drain_all(), vec![10, 11, 12, 13, 14, 20, 21]);
    }

    #[test]
    fn device_error_ends_loop_and_is_recorded() {
        let backend = ScriptedBackend::new().with_reads([
            ReadStep::Samples(vec![1, 2]),
            ReadStep::Fail("device unplugged".into()),
            ReadStep::Samples(vec![3, 4]),
        ]);
        let fixture = Fixture::new();
        let worker = CaptureWorker::spawn(streaming_source(&backend), fixture.context(8)).unwrap();

        assert!(wait_until(|| worker.is_finished()));
        let (_source, exit) = worker.join().unwrap();

        assert_eq!(exit, WorkerExit::Failed(CaptureError::device("device unplugged")));
        assert_eq!(fixture.buffer.drain_all(), vec![1, 2]);
        assert_eq!(
            fixture.diagnostics.lock().last_error.as_deref(),
            Some("device error: device unplugged")
        );
    }

    #[test]
    fn counts_reads_and_samples() {
        let backend = ScriptedBackend::new().with_reads([
            ReadStep::Samples(vec![1, 2, 3]),
            ReadStep::Samples(vec![4]),
        ]);
        let fixture = Fixture::new();
        let worker = CaptureWorker::spawn(streaming_source(&backend), fixture.context(8)).unwrap();

        assert!(wait_until(|| fixture.diagnostics.lock().empty_reads > 0));
        worker.join().unwrap();

        let diag = fixture.diagnostics.lock().clone();
        assert_eq!(diag.samples_captured, 4);
        assert!(diag.device_reads >= 3);
        assert_eq!(diag.last_error, None);
    }

    #[test]
    fn join_returns_source_and_stops_writes() {
        let backend = ScriptedBackend::new().endless(vec![7; 4]);
        let fixture = Fixture::new();
        let worker = CaptureWorker::spawn(streaming_source(&backend), fixture.context(4)).unwrap();

        assert!(wait_until(|| fixture.buffer.len() >= 8));
        let (mut source, exit) = worker.join().unwrap();
        assert_eq!(exit, WorkerExit::Stopped);

        fixture.buffer.drain_all();
        let reads = backend.reads();
        std::thread::sleep(std::time::Duration::from_millis(10));

        assert!(fixture.buffer.is_empty());
        assert_eq!(backend.reads(), reads);
        assert!(source.stop_streaming().is_ok());
    }
}
