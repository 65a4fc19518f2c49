use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::command::{Command, CommandSource};

const DEFAULT_CAPACITY: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub source: CommandSource,
    pub command: Command,
    /// What the controller actually did, e.g. the clamped value
    pub outcome: String,
}

/// Ring buffer of recently applied commands
pub struct EventLog {
    events: VecDeque<Event>,
    next_id: u64,
    max_events: usize,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(DEFAULT_CAPACITY)),
            next_id: 1,
            max_events: max_events.max(1),
        }
    }

    /// Record an applied command. Read-only commands are skipped; returns
    /// the new event id otherwise.
    pub fn log(
        &mut self,
        command: Command,
        source: CommandSource,
        outcome: impl Into<String>,
    ) -> Option<u64> {
        if !command.is_loggable() {
            return None;
        }

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let id = self.next_id;
        self.next_id += 1;
        self.events.push_back(Event {
            id,
            timestamp,
            source,
            command,
            outcome: outcome.into(),
        });

        while self.events.len() > self.max_events {
            self.events.pop_front();
        }
        Some(id)
    }

    /// All events since a given ID
    pub fn get_events_since(&self, since_id: u64) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| e.id > since_id)
            .cloned()
            .collect()
    }

    /// The last `n` events, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Event> {
        self.events.iter().skip(self.events.len().saturating_sub(n))
    }

    pub fn latest_id(&self) -> u64 {
        self.events.back().map(|e| e.id).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::EffectKind;

    #[test]
    fn oldest_events_fall_off() {
        let mut log = EventLog::with_capacity(3);
        for _ in 0..5 {
            log.log(Command::ToggleEffect(EffectKind::Chorus), CommandSource::Console, "on");
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.latest_id(), 5);
        let ids: Vec<u64> = log.recent(10).map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
    }

    #[test]
    fn queries_are_not_logged() {
        let mut log = EventLog::new();
        assert_eq!(log.log(Command::Status, CommandSource::Console, ""), None);
        assert!(log.is_empty());
        assert_eq!(log.log(Command::ResetAll, CommandSource::Cli, "defaults"), Some(1));
        assert_eq!(log.get_events_since(0).len(), 1);
    }
}
