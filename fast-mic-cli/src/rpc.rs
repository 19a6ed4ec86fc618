//! JSON-lines front end for the method channel.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use fast_mic_core::{AudioBackend, MethodChannel};

/// Answer one response line per request line until `input` ends, then stop
/// capture.
pub fn run<B, R, W>(channel: &mut MethodChannel<B>, input: R, mut output: W) -> Result<()>
where
    B: AudioBackend,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line.context("failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = channel.handle_line(&line);
        serde_json::to_writer(&mut output, &response).context("failed to encode response")?;
        output.write_all(b"\n")?;
        output.flush()?;
    }

    log::info!("Input closed, stopping capture");
    channel
        .controller_mut()
        .stop()
        .context("failed to stop capture")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use fast_mic_core::{CaptureController, CaptureState};

    use super::*;
    use crate::test_backend::ToneBackend;

    fn responses(output: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(output)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn answers_each_request_line() {
        let mut channel = MethodChannel::new(CaptureController::new(ToneBackend::new(500)));
        let input = concat!(
            "{\"id\":1,\"method\":\"start\"}\n",
            "\n",
            "{\"id\":2,\"method\":\"status\"}\n",
            "{\"id\":3,\"method\":\"getVersion\"}\n",
            "not json\n",
            "{\"id\":4,\"method\":\"stop\"}\n",
        );
        let mut output = Vec::new();

        run(&mut channel, input.as_bytes(), &mut output).unwrap();

        let lines = responses(&output);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0]["status"], "success");
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["result"]["state"], "recording");
        assert_eq!(lines[2]["status"], "not_implemented");
        assert_eq!(lines[3]["code"], "BAD_REQUEST");
        assert_eq!(lines[4]["status"], "success");
    }

    #[test]
    fn eof_stops_capture() {
        let mut channel = MethodChannel::new(CaptureController::new(ToneBackend::new(500)));
        let mut output = Vec::new();

        run(&mut channel, "{\"method\":\"start\"}\n".as_bytes(), &mut output).unwrap();

        assert_eq!(channel.controller().state(), CaptureState::Idle);
        assert!(!channel.controller().is_worker_alive());
    }
}
