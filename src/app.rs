use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::audio::{AudioEngine, AudioHost, LoopStats, StreamFormat};
use crate::command::{
    parse_line, Command, CommandBus, CommandReceiver, CommandSender, CommandSource, Received,
};
use crate::event::EventLog;
use crate::fx::{EffectKind, ParamId, ParamSnapshot, ParamStore};

/// How often the controller wakes up to notice a faulted session
const REAP_INTERVAL: Duration = Duration::from_millis(100);

/// `status` output
#[derive(Debug, Serialize)]
pub struct Status<'a> {
    pub running: bool,
    pub device: Option<&'a str>,
    pub format: Option<StreamFormat>,
    pub params: ParamSnapshot,
    pub last_session: Option<&'a LoopStats>,
}

/// Controller: owns the engine and applies commands from the bus
pub struct App<H: AudioHost> {
    engine: AudioEngine<H>,
    params: Arc<ParamStore>,
    command_sender: CommandSender,
    command_receiver: CommandReceiver,
    event_log: EventLog,
    should_quit: bool,
    exit_on_fault: bool,
}

impl<H: AudioHost> App<H> {
    pub fn new(engine: AudioEngine<H>) -> Self {
        let bus = CommandBus::new();
        let params = Arc::clone(engine.params());
        Self {
            engine,
            params,
            command_sender: bus.sender(),
            command_receiver: bus.receiver(),
            event_log: EventLog::new(),
            should_quit: false,
            exit_on_fault: false,
        }
    }

    /// Leave [`run`](Self::run) when a session ends on a stream fault
    pub fn exit_on_fault(mut self, exit: bool) -> Self {
        self.exit_on_fault = exit;
        self
    }

    /// Sender for control surfaces
    pub fn sender(&self) -> CommandSender {
        self.command_sender.clone()
    }

    pub fn engine(&self) -> &AudioEngine<H> {
        &self.engine
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Apply one command and return the text to show the user
    pub fn apply(&mut self, command: Command, source: CommandSource) -> Result<String> {
        let reply = match &command {
            Command::SetParam { param, value } => {
                let stored = self.params.set(*param, *value);
                format!("{} = {}", param.key(), stored)
            }
            Command::SetEnabled { effect, enabled } => {
                self.params.set_enabled(*effect, *enabled);
                format!("{} {}", effect.key(), if *enabled { "on" } else { "off" })
            }
            Command::ToggleEffect(effect) => {
                let on = self.params.toggle(*effect);
                format!("{} {}", effect.key(), if on { "on" } else { "off" })
            }
            Command::ResetAll => {
                self.params.reset_all();
                "all effects reset to defaults".to_string()
            }
            Command::ListDevices => {
                let devices = self.engine.input_devices().context("listing input devices")?;
                if devices.is_empty() {
                    "no input devices".to_string()
                } else {
                    devices
                        .iter()
                        .map(|d| {
                            let marker = if d.is_default { "*" } else { " " };
                            format!("{} {} ({} ch @ {} Hz)", marker, d.name, d.channels, d.sample_rate)
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            Command::StartProcessing { device } => {
                let format = self
                    .engine
                    .start_processing(device.as_deref())
                    .context("starting processing")?;
                format!(
                    "processing {} ch @ {} Hz",
                    format.channels, format.sample_rate
                )
            }
            Command::StopProcessing => match self.engine.stop() {
                Some(stats) => format!(
                    "stopped: {} buffers, {} dropped, {} capture overruns",
                    stats.buffers_processed, stats.buffers_dropped, stats.capture_overruns
                ),
                None => "not running".to_string(),
            },
            Command::Status => {
                let status = Status {
                    running: self.engine.is_running(),
                    device: self.engine.device(),
                    format: self.engine.format(),
                    params: self.params.snapshot(),
                    last_session: self.engine.last_stats(),
                };
                serde_json::to_string_pretty(&status)?
            }
            Command::History(n) => self
                .event_log
                .recent(*n)
                .map(|e| format!("#{} [{}] {} -> {}", e.id, e.source.name(), e.command.description(), e.outcome))
                .collect::<Vec<_>>()
                .join("\n"),
            Command::Help => format!(
                "{}\neffects: {}\nparameters:\n{}",
                crate::command::parse::HELP,
                EffectKind::ALL.map(|e| e.key()).join(", "),
                param_table()
            ),
            Command::Quit => {
                self.should_quit = true;
                "bye".to_string()
            }
        };

        self.event_log.log(command, source, reply.clone());
        Ok(reply)
    }

    /// Process commands until `quit` or every sender is gone
    pub fn run(&mut self) -> Result<()> {
        while !self.should_quit {
            match self.command_receiver.recv_timeout(REAP_INTERVAL) {
                Received::Command(command, source) => match self.apply(command, source) {
                    Ok(reply) if !reply.is_empty() => println!("{}", reply),
                    Ok(_) => {}
                    Err(err) => eprintln!("error: {:#}", err),
                },
                Received::Timeout => {
                    if let Some(stats) = self.engine.reap() {
                        if let Some(fault) = stats.fault {
                            eprintln!("processing stopped: {}", fault);
                            self.should_quit |= self.exit_on_fault;
                        }
                    }
                }
                Received::Closed => break,
            }
        }
        self.engine.stop();
        Ok(())
    }
}

/// Read console lines on a background thread and forward them to the bus.
/// End of input sends `quit`.
pub fn spawn_console(sender: CommandSender) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("pedalboard-console".into())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_line(&line) {
                    Ok(command) => {
                        let quit = command == Command::Quit;
                        sender.send(command, CommandSource::Console);
                        if quit {
                            return;
                        }
                    }
                    Err(err) => eprintln!("{}", err),
                }
            }
            sender.send(Command::Quit, CommandSource::Console);
        })
        .context("Failed to spawn console thread")
}

/// Key, range and default of every parameter
pub fn param_table() -> String {
    ParamId::ALL
        .iter()
        .map(|p| {
            let (min, max, default) = p.range();
            format!("  {:<20} {:>7} .. {:<7} default {}", p.key(), min, max, default)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
