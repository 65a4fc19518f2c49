use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use pedalboard::app::{spawn_console, App};
use pedalboard::audio::{AudioEngine, AudioHost, CpalHost, EngineConfig};
use pedalboard::command::{parse_assignment, parse_effect, Command, CommandSource};
use pedalboard::fx::{EffectChain, ParamStore};
use pedalboard::render::{render_file, DEFAULT_TAIL_SECONDS};

/// Pedalboard - real-time guitar effects processor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// List capture devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Capture device name (default input if omitted)
    #[arg(long)]
    device: Option<String>,

    /// Enable an effect at startup (repeatable)
    #[arg(long, value_name = "EFFECT")]
    enable: Vec<String>,

    /// Set a parameter at startup, e.g. --set reverb_mix=0.4 (repeatable)
    #[arg(long, value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Master volume (0.0 - 2.0)
    #[arg(long)]
    volume: Option<f32>,

    /// Capacity of the capture and render rings, in frames
    #[arg(long, default_value_t = EngineConfig::default().ring_frames)]
    ring_frames: usize,

    /// Sleep between polls when no audio is ready, in milliseconds
    #[arg(long, default_value_t = 1)]
    idle_poll_ms: u64,

    /// Process a WAV file offline instead of live audio
    #[arg(long, num_args = 2, value_names = ["IN", "OUT"])]
    render: Option<Vec<PathBuf>>,

    /// Silence appended to offline renders, in seconds
    #[arg(long, default_value_t = DEFAULT_TAIL_SECONDS)]
    tail_secs: f32,

    /// Process until interrupted without reading commands from stdin
    #[arg(long)]
    no_console: bool,
}

/// Apply --enable / --set / --volume to the store
fn apply_startup_args(args: &Args, params: &ParamStore) -> Result<()> {
    for name in &args.enable {
        let effect = parse_effect(name)?;
        params.set_enabled(effect, true);
    }
    for assignment in &args.set {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{}'", assignment))?;
        if let Command::SetParam { param, value } = parse_assignment(key.trim(), value.trim())? {
            let stored = params.set(param, value);
            log::debug!("{} = {}", param.key(), stored);
        }
    }
    if let Some(volume) = args.volume {
        params.set_master_volume(volume);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let params = Arc::new(ParamStore::new());
    apply_startup_args(&args, &params)?;

    if let Some(paths) = &args.render {
        let [input, output] = paths.as_slice() else {
            return Err(anyhow!("--render takes an input and an output path"));
        };
        let mut chain = EffectChain::new(Arc::clone(&params), 44100.0);
        let result = render_file(input, output, &mut chain, args.tail_secs)?;
        println!(
            "Rendered {:.2}s ({} ch @ {} Hz) to {}",
            result.duration_secs,
            result.channels,
            result.sample_rate,
            output.display()
        );
        return Ok(());
    }

    let config = EngineConfig {
        ring_frames: args.ring_frames,
        idle_poll: Duration::from_millis(args.idle_poll_ms),
    };
    let host = CpalHost::new(config.ring_frames);

    if args.list_devices {
        let devices = host.input_devices().context("Failed to list input devices")?;
        println!("Input devices:");
        for device in devices {
            let marker = if device.is_default { "*" } else { " " };
            println!(
                "{} {} ({} ch @ {} Hz)",
                marker, device.name, device.channels, device.sample_rate
            );
        }
        return Ok(());
    }

    let engine = AudioEngine::new(host, params, config);
    let mut app = App::new(engine).exit_on_fault(args.no_console);
    let start = Command::StartProcessing {
        device: args.device.clone(),
    };

    if args.no_console {
        // Runs until the process is killed or the stream faults
        let reply = app.apply(start, CommandSource::Cli)?;
        println!("{}", reply);
        app.run()
    } else {
        match app.apply(start, CommandSource::Cli) {
            Ok(reply) => println!("{}", reply),
            Err(err) => eprintln!("error: {:#}", err),
        }
        println!("Type 'help' for commands.");
        let _console = spawn_console(app.sender())?;
        app.run()
    }
}
