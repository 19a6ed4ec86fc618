//! Raw PCM over TCP.
//!
//! One client at a time. Capture starts when a client connects and stops when
//! it disconnects; in between every drained batch is written as
//! little-endian i16.

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;

use fast_mic_core::processing::pcm;
use fast_mic_core::{AudioBackend, CaptureController, CaptureDelegate, CaptureError, CaptureState};

/// Records worker failures so the client session can end.
#[derive(Default)]
pub struct SessionWatch {
    failure: Mutex<Option<String>>,
}

impl SessionWatch {
    fn take_failure(&self) -> Option<String> {
        self.failure.lock().take()
    }
}

impl CaptureDelegate for SessionWatch {
    fn on_state_changed(&self, state: CaptureState) {
        log::debug!("Capture {}", state.as_str());
    }

    fn on_error(&self, error: &CaptureError) {
        *self.failure.lock() = Some(error.to_string());
    }
}

pub fn run<B: AudioBackend>(
    mut controller: CaptureController<B>,
    listen: &str,
    poll_interval: Duration,
) -> Result<()> {
    let listener =
        TcpListener::bind(listen).with_context(|| format!("failed to listen on {}", listen))?;
    log::info!("Listening on {}", listener.local_addr()?);

    let watch = Arc::new(SessionWatch::default());
    controller.set_delegate(watch.clone());

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Accept failed: {}", e);
                continue;
            }
        };
        serve_connection(&mut controller, stream, poll_interval, &watch);
    }
    Ok(())
}

/// Run one client session to completion and leave the controller idle.
pub fn serve_connection<B: AudioBackend>(
    controller: &mut CaptureController<B>,
    stream: TcpStream,
    poll_interval: Duration,
    watch: &SessionWatch,
) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".into());
    log::info!("Client connected: {}", peer);

    match stream_samples(controller, stream, poll_interval, watch) {
        Err(e) if matches!(e.downcast_ref::<CaptureError>(), Some(CaptureError::PermissionDenied)) => {
            log::error!("Microphone access denied. Grant it in the OS privacy settings.");
        }
        Err(e) => log::info!("Client {} session ended: {:#}", peer, e),
        Ok(()) => {}
    }

    if let Err(e) = controller.stop() {
        log::warn!("Failed to stop capture: {}", e);
    }
    log::info!("Client disconnected: {}", peer);
}

fn stream_samples<B: AudioBackend>(
    controller: &mut CaptureController<B>,
    mut stream: TcpStream,
    poll_interval: Duration,
    watch: &SessionWatch,
) -> Result<()> {
    stream.set_nodelay(true)?;
    watch.take_failure();
    controller.start()?;

    loop {
        thread::sleep(poll_interval);

        let samples = controller.poll();
        if !samples.is_empty() {
            stream
                .write_all(&pcm::to_le_bytes(&samples))
                .context("client write failed")?;
        }

        if let Some(failure) = watch.take_failure() {
            bail!("capture failed: {}", failure);
        }
    }
}
