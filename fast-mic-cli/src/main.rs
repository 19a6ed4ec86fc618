mod args;
mod rpc;
mod serve;
#[cfg(test)]
mod test_backend;

use std::io;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;

use fast_mic_core::{CaptureController, MethodChannel};
use fast_mic_device::{list_input_devices, CpalBackend};

use args::{CaptureArgs, Cli, CliCommand, DevicesArgs};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        CliCommand::Rpc => {
            let controller = build_controller(&cli.capture)?;
            let mut channel = MethodChannel::new(controller);
            rpc::run(&mut channel, io::stdin().lock(), io::stdout().lock())
        }
        CliCommand::Serve(serve_args) => {
            let controller = build_controller(&cli.capture)?;
            serve::run(
                controller,
                &serve_args.listen,
                Duration::from_millis(serve_args.poll_interval_ms.max(1)),
            )
        }
        CliCommand::Devices(devices_args) => print_devices(&devices_args),
    }
}

fn build_controller(capture: &CaptureArgs) -> Result<CaptureController<CpalBackend>> {
    let config = capture.capture_config();
    config
        .validate()
        .map_err(|e| anyhow!("invalid capture options: {}", e))?;

    let backend = CpalBackend::with_options(capture.backend_options());
    Ok(CaptureController::with_config(backend, config))
}

fn print_devices(args: &DevicesArgs) -> Result<()> {
    let devices = list_input_devices()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No input devices found.");
    }
    for device in &devices {
        let marker = if device.is_default { "*" } else { " " };
        println!("{} {}", marker, device.name);
    }
    Ok(())
}
