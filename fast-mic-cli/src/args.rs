use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand};

use fast_mic_core::CaptureConfig;
use fast_mic_device::CpalOptions;

#[derive(Parser, Debug)]
#[command(name = "fast-mic")]
#[command(about = "Low-latency 48 kHz mono microphone capture", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub capture: CaptureArgs,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Answer start/poll/stop/status requests as JSON lines on stdin/stdout
    Rpc,
    /// Stream captured samples (little-endian i16) to one TCP client at a time
    Serve(ServeArgs),
    /// List input devices
    Devices(DevicesArgs),
}

#[derive(ClapArgs, Debug)]
pub struct CaptureArgs {
    /// Input device name (default: host default input)
    #[arg(long, global = true)]
    pub device: Option<String>,

    /// Worker read size in samples (default: the device minimum)
    #[arg(long, global = true)]
    pub buffer_size: Option<usize>,

    /// Do not gate background noise
    #[arg(long, global = true)]
    pub no_noise_suppression: bool,

    /// How long one device read waits for data
    #[arg(long, global = true, default_value_t = 100)]
    pub read_timeout_ms: u64,
}

impl CaptureArgs {
    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            buffer_size: self.buffer_size,
            noise_suppression: !self.no_noise_suppression,
            ..Default::default()
        }
    }

    pub fn backend_options(&self) -> CpalOptions {
        CpalOptions {
            device_name: self.device.clone(),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:4800")]
    pub listen: String,

    /// Interval between buffer drains
    #[arg(long, default_value_t = 20)]
    pub poll_interval_ms: u64,
}

#[derive(ClapArgs, Debug)]
pub struct DevicesArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}
