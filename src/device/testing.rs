//! In-memory doubles for sessions and connectors.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{DeviceConnector, DeviceError, DeviceSession, DeviceTarget};
use crate::routeros::{self, Command, Record};

#[derive(Debug, Default)]
struct SessionLog {
    issued: Vec<Command>,
    closes: usize,
}

/// Replies with canned records keyed by `path` or `path#interface`. Unknown commands return no
/// records. Clones share the same command log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSession {
    responses: HashMap<String, Vec<Record>>,
    failing: HashSet<String>,
    log: Arc<Mutex<SessionLog>>,
}

impl ScriptedSession {
    pub fn with_records(mut self, key: &str, records: Vec<Record>) -> Self {
        self.responses.insert(key.to_string(), records);
        self
    }

    pub fn with_traffic(self, interface: &str, rx: &str, tx: &str) -> Self {
        self.with_records(
            &format!("/interface/monitor-traffic#{interface}"),
            vec![Record::from_pairs([
                ("name", interface),
                ("rx-bits-per-second", rx),
                ("tx-bits-per-second", tx),
            ])],
        )
    }

    /// One record per probe; `None` is a timed-out probe.
    pub fn with_ping(self, interface: &str, times: &[Option<&str>]) -> Self {
        let records = times
            .iter()
            .map(|t| match t {
                Some(t) => Record::from_pairs([("time", *t)]),
                None => Record::from_pairs([("status", "timeout")]),
            })
            .collect();
        self.with_records(&format!("/ping#{interface}"), records)
    }

    /// Makes the command keyed by `key` fail with a trap.
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    pub fn issued(&self) -> Vec<Command> {
        self.log.lock().unwrap().issued.clone()
    }

    pub fn close_count(&self) -> usize {
        self.log.lock().unwrap().closes
    }

    fn keys(command: &Command) -> Vec<String> {
        let mut keys = Vec::with_capacity(2);
        if let Some(interface) = command.get("interface") {
            keys.push(format!("{}#{interface}", command.path()));
        }
        keys.push(command.path().to_string());
        keys
    }
}

#[async_trait]
impl DeviceSession for ScriptedSession {
    async fn run(&mut self, command: &Command) -> Result<Vec<Record>, DeviceError> {
        self.log.lock().unwrap().issued.push(command.clone());

        let keys = Self::keys(command);
        if keys.iter().any(|k| self.failing.contains(k)) {
            return Err(DeviceError::Command(routeros::Error::Trap {
                category: None,
                message: format!("scripted failure for {}", command.path()),
            }));
        }
        Ok(keys
            .iter()
            .find_map(|k| self.responses.get(k))
            .cloned()
            .unwrap_or_default())
    }

    async fn close(self: Box<Self>) {
        self.log.lock().unwrap().closes += 1;
    }
}

/// Hands out scripted sessions by device address. Unknown addresses fail to connect.
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    sessions: HashMap<String, ScriptedSession>,
    opened: Mutex<Vec<String>>,
}

impl ScriptedConnector {
    pub fn with_device(mut self, address: &str, session: ScriptedSession) -> Self {
        self.sessions.insert(address.to_string(), session);
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceConnector for ScriptedConnector {
    async fn open(&self, target: &DeviceTarget) -> Result<Box<dyn DeviceSession>, DeviceError> {
        self.opened.lock().unwrap().push(target.address.clone());
        match self.sessions.get(&target.address) {
            Some(session) => Ok(Box::new(session.clone())),
            None => Err(DeviceError::ConnectFailed {
                address: target.endpoint(),
                source: routeros::Error::Timeout(10),
            }),
        }
    }
}
