//! Audiobridge - real-time audio callback bridge
//!
//! Command-line front end: meters the default input device through a
//! [`LevelMeter`] callback, optionally playing the (gain-adjusted) audio back.

use anyhow::Result;
use audiobridge::meter::{LevelMeter, LevelReadout};
use audiobridge::{AudioBridge, CpalBackend, MockBackend, StreamConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Interactive,
    Run,
    Test,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("audiobridge=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut save_path: Option<PathBuf> = None;
    let mut overrides: Vec<(&'static str, String)> = Vec::new();
    let mut output = false;
    let mut drop_frames = false;
    let mut mode = Mode::Interactive;
    let mut i = 1;

    while i < args.len() {
        let flag = args[i].as_str();
        let key = match flag {
            "--version" | "-v" => {
                println!("audiobridge {}", audiobridge::VERSION);
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--output" => {
                output = true;
                i += 1;
                continue;
            }
            "--drop-frames" => {
                drop_frames = true;
                i += 1;
                continue;
            }
            "--run" => {
                mode = Mode::Run;
                i += 1;
                continue;
            }
            "--test" => {
                mode = Mode::Test;
                i += 1;
                continue;
            }
            "--config" => "config",
            "--save-config" => "save-config",
            "--sample-rate" | "-r" => "sample-rate",
            "--frame-size" | "-f" => "frame-size",
            "--channels" | "-n" => "channels",
            "--width" | "-w" => "width",
            "--gain" | "-g" => "gain",
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                return Ok(());
            }
        };

        if i + 1 >= args.len() {
            eprintln!("Error: {} requires a value", flag);
            return Ok(());
        }
        let value = args[i + 1].clone();
        match key {
            "config" => config_path = Some(PathBuf::from(value)),
            "save-config" => save_path = Some(PathBuf::from(value)),
            _ => overrides.push((key, value)),
        }
        i += 2;
    }

    let mut config = match &config_path {
        Some(path) => StreamConfig::from_path(path)?,
        None => StreamConfig::default(),
    };
    config.output_enabled |= output;
    config.drop_frames |= drop_frames;
    for (key, value) in &overrides {
        if let Err(e) = apply_override(&mut config, key, value) {
            eprintln!("Error: {}", e);
            return Ok(());
        }
    }

    if let Some(path) = &save_path {
        config.save(path)?;
        println!("Config saved to {}", path.display());
    }

    print_banner(&config);

    match mode {
        Mode::Test => run_test(config),
        Mode::Run => run_until_interrupted(config),
        Mode::Interactive => interactive_mode(config),
    }
}

fn apply_override(config: &mut StreamConfig, key: &str, value: &str) -> Result<()> {
    let invalid = || anyhow::anyhow!("Invalid value for --{}: {}", key, value);
    match key {
        "sample-rate" => config.sample_rate = value.parse().map_err(|_| invalid())?,
        "frame-size" => config.frame_size = value.parse().map_err(|_| invalid())?,
        "channels" => config.channels = value.parse().map_err(|_| invalid())?,
        "width" => config.sample_width = value.parse().map_err(|_| invalid())?,
        "gain" => {
            let gain: f64 = value.parse().map_err(|_| invalid())?;
            config.extra_params.insert("gain", gain);
        }
        _ => return Err(invalid()),
    }
    Ok(())
}

fn print_help() {
    println!("Usage: audiobridge [OPTIONS]");
    println!();
    println!("Options:");
    println!("      --config PATH       Load stream config from a JSON file");
    println!("      --save-config PATH  Write the effective config to a JSON file");
    println!("  -r, --sample-rate RATE  Sample rate in Hz (default: 22050)");
    println!("  -f, --frame-size N      Samples per callback frame (default: 1024)");
    println!("  -n, --channels N        Input channel count (default: 1)");
    println!("  -w, --width BYTES       Sample width, 1-4 bytes (default: 2)");
    println!("  -g, --gain GAIN         Gain applied to played-back audio");
    println!("      --output            Play processed audio on the default output");
    println!("      --drop-frames       Skip the callback for late frames");
    println!("      --run               Start immediately and run until Ctrl+C");
    println!("      --test              Run the callback once on generated noise");
    println!("  -v, --version           Show version");
    println!("  -h, --help              Show this help");
    println!();
    println!("Examples:");
    println!("  audiobridge --run --output -g 0.5");
    println!("  audiobridge --test -f 1024");
    println!();
    println!("Without --run or --test, starts in interactive mode.");
}

fn print_banner(config: &StreamConfig) {
    println!("╔════════════════════════════════════════════════════════════╗");
    println!(
        "║        Audiobridge v{} - Real-time Callback Bridge      ║",
        audiobridge::VERSION
    );
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();
    println!(
        "Stream: {} Hz, {} frames x {} ch, {}-bit, output {}, drop {}",
        config.sample_rate,
        config.frame_size,
        config.channels,
        config.sample_width * 8,
        if config.output_enabled { "on" } else { "off" },
        if config.drop_frames { "on" } else { "off" },
    );
    println!();
}

/// Exercise the callback without starting any hardware
fn run_test(config: StreamConfig) -> Result<()> {
    let meter = LevelMeter::new();
    let readout = meter.readout();
    let bridge = AudioBridge::open(&MockBackend::new(), config, meter)?;

    let result = bridge.test_callback(None)?;
    println!(
        "Callback OK: {} samples metered, RMS {:.3} ({:.1} dBFS), peak {:.3}",
        bridge.config().frame_size,
        readout.rms(),
        readout.rms_db(),
        readout.peak()
    );
    match result {
        Some(replacement) => println!("Callback replaced the frame ({} samples)", replacement.len()),
        None => println!("Callback left the frame untouched"),
    }

    bridge.close();
    Ok(())
}

fn open_device(config: StreamConfig) -> Result<(AudioBridge, LevelReadout)> {
    if let Some(name) = CpalBackend::default_input_name() {
        println!("Input device: {}", name);
    }
    let meter = LevelMeter::new();
    let readout = meter.readout();
    let bridge = AudioBridge::open(&CpalBackend::new(), config, meter)?;
    Ok((bridge, readout))
}

fn run_until_interrupted(config: StreamConfig) -> Result<()> {
    let (bridge, readout) = match open_device(config) {
        Ok(opened) => opened,
        Err(e) => {
            error!("Failed to open audio device: {}", e);
            println!("Error: {}", e);
            return Ok(());
        }
    };

    if let Err(e) = bridge.start() {
        error!("Failed to start stream: {}", e);
        println!("Error: {}", e);
        return Ok(());
    }

    println!("Bridge running. Press Ctrl+C to stop.");
    println!();
    println!("Status:");
    println!("────────────────────────────────────────");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .ok();

    let mut last_status = String::new();
    while running.load(Ordering::SeqCst) {
        let status_line = status_line(&bridge, &readout);
        // Only print if changed (reduce spam)
        if status_line != last_status {
            println!("{}", status_line);
            last_status = status_line;
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    println!();
    println!("Stopping...");
    bridge.stop()?;
    finish(bridge)
}

fn interactive_mode(config: StreamConfig) -> Result<()> {
    println!("Interactive Mode");
    println!("────────────────────────────────────────");
    println!();

    let (bridge, readout) = match open_device(config) {
        Ok(opened) => opened,
        Err(e) => {
            error!("Failed to open audio device: {}", e);
            println!("Error: {}", e);
            return Ok(());
        }
    };

    println!("Press Enter to start/stop the stream, q + Enter to quit.");
    let mut input = String::new();
    loop {
        print!(
            "[{}] > ",
            if bridge.is_active() { "running" } else { "stopped" }
        );
        io::stdout().flush()?;

        input.clear();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        match input.trim() {
            "q" | "quit" => break,
            "" => {
                let active = !bridge.is_active();
                if let Err(e) = bridge.set_state(active) {
                    println!("Error: {}", e);
                }
                println!("{}", status_line(&bridge, &readout));
            }
            other => println!("Unknown command: {}", other),
        }
    }

    finish(bridge)
}

fn status_line(bridge: &AudioBridge, readout: &LevelReadout) -> String {
    let stats = bridge.stats();
    format!(
        "Level: {:>6.1} dBFS | Peak: {:>5.3} | Frames: {:>7} | Dropped: {:>5} | Failed: {:>4} | Overruns: {:>4} | Latency: {:>6.2}ms",
        readout.rms_db(),
        readout.peak(),
        stats.frames_admitted,
        stats.frames_dropped,
        stats.frames_failed,
        stats.output_overruns,
        stats.last_input_latency * 1000.0
    )
}

/// Close the bridge and print final counters as JSON
fn finish(bridge: AudioBridge) -> Result<()> {
    let stats = bridge.stats();
    bridge.close();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    println!("Done.");
    Ok(())
}
