use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};

use super::types::{Command, CommandSource};

const QUEUE_DEPTH: usize = 256;

/// Central command bus between the control surfaces and the controller
pub struct CommandBus {
    tx: Sender<(Command, CommandSource)>,
    rx: Receiver<(Command, CommandSource)>,
}

impl CommandBus {
    pub fn new() -> Self {
        let (tx, rx) = bounded(QUEUE_DEPTH);
        Self { tx, rx }
    }

    /// Get a sender that can be cloned and shared
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            tx: self.tx.clone(),
        }
    }

    /// Get a receiver for the controller
    pub fn receiver(&self) -> CommandReceiver {
        CommandReceiver {
            rx: self.rx.clone(),
        }
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable sender for dispatching commands
#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<(Command, CommandSource)>,
}

impl CommandSender {
    /// Send a command (non-blocking, drops if buffer full)
    pub fn send(&self, cmd: Command, source: CommandSource) -> bool {
        match self.tx.try_send((cmd, source)) {
            Ok(()) => true,
            Err(TrySendError::Full((cmd, _))) => {
                log::warn!("command queue full, dropping '{}'", cmd.description());
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// What a receiver saw while waiting
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Command(Command, CommandSource),
    Timeout,
    /// Every sender is gone
    Closed,
}

/// Receiver for consuming commands
#[derive(Clone)]
pub struct CommandReceiver {
    rx: Receiver<(Command, CommandSource)>,
}

impl CommandReceiver {
    /// Wait up to `timeout` for the next command
    pub fn recv_timeout(&self, timeout: Duration) -> Received {
        match self.rx.recv_timeout(timeout) {
            Ok((cmd, source)) => Received::Command(cmd, source),
            Err(RecvTimeoutError::Timeout) => Received::Timeout,
            Err(RecvTimeoutError::Disconnected) => Received::Closed,
        }
    }
}
