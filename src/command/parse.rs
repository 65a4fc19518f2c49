use thiserror::Error;

use super::types::Command;
use crate::fx::{EffectKind, ParamId};

const DEFAULT_HISTORY: usize = 20;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    #[error("unknown parameter '{0}'")]
    UnknownParam(String),

    #[error("unknown effect '{0}'")]
    UnknownEffect(String),

    #[error("'{0}' is not a number")]
    BadNumber(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Parse one console line such as `set chorus_rate 2.5` or `on reverb`
pub fn parse_line(line: &str) -> Result<Command, ParseError> {
    let mut words = line.split_whitespace();
    let verb = words.next().ok_or(ParseError::Empty)?;
    let rest: Vec<&str> = words.collect();
    let verb = verb.to_ascii_lowercase();

    match verb.as_str() {
        "set" => match rest.as_slice() {
            [key, value] => parse_assignment(key, value),
            _ => Err(ParseError::Usage("set <param> <value>")),
        },
        "on" | "off" | "toggle" => {
            let [name] = rest.as_slice() else {
                return Err(ParseError::Usage("on|off|toggle <effect>"));
            };
            let effect = parse_effect(name)?;
            Ok(match verb.as_str() {
                "toggle" => Command::ToggleEffect(effect),
                v => Command::SetEnabled {
                    effect,
                    enabled: v == "on",
                },
            })
        }
        "reset" => Ok(Command::ResetAll),
        "devices" => Ok(Command::ListDevices),
        "start" => Ok(Command::StartProcessing {
            device: (!rest.is_empty()).then(|| rest.join(" ")),
        }),
        "stop" => Ok(Command::StopProcessing),
        "status" => Ok(Command::Status),
        "history" => match rest.as_slice() {
            [] => Ok(Command::History(DEFAULT_HISTORY)),
            [n] => n
                .parse()
                .map(Command::History)
                .map_err(|_| ParseError::BadNumber(n.to_string())),
            _ => Err(ParseError::Usage("history [count]")),
        },
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

/// Parse `key` and `value` into a parameter change. Also used for `--set KEY=VALUE`.
pub fn parse_assignment(key: &str, value: &str) -> Result<Command, ParseError> {
    let param = ParamId::from_key(key).ok_or_else(|| ParseError::UnknownParam(key.to_string()))?;
    let value: f32 = value
        .parse()
        .map_err(|_| ParseError::BadNumber(value.to_string()))?;
    Ok(Command::SetParam { param, value })
}

pub fn parse_effect(name: &str) -> Result<EffectKind, ParseError> {
    EffectKind::from_key(name).ok_or_else(|| ParseError::UnknownEffect(name.to_string()))
}

pub const HELP: &str = "\
commands:
  set <param> <value>     change a parameter (values are clamped)
  on|off|toggle <effect>  enable or disable an effect
  reset                   restore all defaults
  devices                 list input devices
  start [device]          start processing (default input if omitted)
  stop                    stop processing
  status                  print parameters as JSON
  history [n]             show recent changes
  quit                    exit";
