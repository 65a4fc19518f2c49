use serde::{Deserialize, Serialize};

use crate::fx::{EffectKind, ParamId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandSource {
    Console,
    Cli,
}

impl CommandSource {
    pub fn name(&self) -> &'static str {
        match self {
            CommandSource::Console => "console",
            CommandSource::Cli => "cli",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    // Parameters
    SetParam { param: ParamId, value: f32 },
    SetEnabled { effect: EffectKind, enabled: bool },
    ToggleEffect(EffectKind),
    ResetAll,

    // Session
    ListDevices,
    StartProcessing { device: Option<String> },
    StopProcessing,

    // Console
    Status,
    History(usize),
    Help,
    Quit,
}

impl Command {
    /// Returns true if this command should be logged to event log
    pub fn is_loggable(&self) -> bool {
        !matches!(
            self,
            Command::Status | Command::History(_) | Command::Help | Command::ListDevices
        )
    }

    /// Human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            Command::SetParam { param, value } => {
                format!("Set {} to {:.3}", param.name(), value)
            }
            Command::SetEnabled { effect, enabled } => {
                let state = if *enabled { "on" } else { "off" };
                format!("Turn {} {}", effect.name(), state)
            }
            Command::ToggleEffect(effect) => format!("Toggle {}", effect.name()),
            Command::ResetAll => "Reset all effects".to_string(),
            Command::ListDevices => "List input devices".to_string(),
            Command::StartProcessing { device } => match device {
                Some(name) => format!("Start processing on '{}'", name),
                None => "Start processing on default input".to_string(),
            },
            Command::StopProcessing => "Stop processing".to_string(),
            Command::Status => "Status".to_string(),
            Command::History(n) => format!("Show last {} events", n),
            Command::Help => "Help".to_string(),
            Command::Quit => "Quit".to_string(),
        }
    }
}
