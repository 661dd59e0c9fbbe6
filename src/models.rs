//! Data models for the AMAS console.
//!
//! Request templates mirror the message shapes the gateway accepts; they are
//! only used to pre-fill the editor and impose nothing on what is sent.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Local};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::wire::{ExchangeOutcome, Target};

/// Gateway command presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Command {
    #[default]
    #[serde(rename = "auth")]
    Auth,
    #[serde(rename = "heartBeat")]
    HeartBeat,
    #[serde(rename = "execute")]
    Execute,
}

impl Command {
    /// All presets in selector order.
    pub fn all() -> &'static [Command] {
        &[Command::Auth, Command::HeartBeat, Command::Execute]
    }

    /// Wire name, as used in the `cmd` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Auth => "auth",
            Command::HeartBeat => "heartBeat",
            Command::Execute => "execute",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Command::Auth => Command::HeartBeat,
            Command::HeartBeat => Command::Execute,
            Command::Execute => Command::Auth,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Command::Auth => Command::Execute,
            Command::HeartBeat => Command::Auth,
            Command::Execute => Command::HeartBeat,
        }
    }

    /// Example request for this command.
    pub fn template(&self) -> Value {
        let value = match self {
            Command::Auth => serde_json::to_value(AuthRequest::default()),
            Command::HeartBeat => serde_json::to_value(HeartbeatRequest::default()),
            Command::Execute => serde_json::to_value(ExecuteRequest::default()),
        };
        value.unwrap_or_default()
    }

    /// Example request rendered with 2-space indentation.
    pub fn template_text(&self) -> String {
        let template = self.template();
        serde_json::to_string_pretty(&template).unwrap_or_else(|_| template.to_string())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::all()
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| {
                format!(
                    "Unknown command '{}' (expected one of: auth, heartBeat, execute)",
                    s
                )
            })
    }
}

/// `auth` request: opens a gateway session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub cmd: String,
    pub access_key: String,
    pub req_no: String,
    pub ip_addr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_addr: Option<String>,
}

impl Default for AuthRequest {
    fn default() -> Self {
        Self {
            cmd: Command::Auth.as_str().to_string(),
            access_key: "test_user1".to_string(),
            req_no: "test_1".to_string(),
            ip_addr: "127.0.0.1".to_string(),
            mac_addr: None,
        }
    }
}

/// `heartBeat` request: keeps a session alive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub cmd: String,
    pub session_id: String,
}

impl Default for HeartbeatRequest {
    fn default() -> Self {
        Self {
            cmd: Command::HeartBeat.as_str().to_string(),
            session_id: "abcde12345".to_string(),
        }
    }
}

/// `execute` request: runs a command through the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub cmd: String,
    pub command: String,
    pub params: Value,
}

impl Default for ExecuteRequest {
    fn default() -> Self {
        Self {
            cmd: Command::Execute.as_str().to_string(),
            command: "ping".to_string(),
            params: serde_json::json!({ "target": "127.0.0.1" }),
        }
    }
}

/// One completed exchange, kept for the History tab.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRecord {
    pub timestamp: DateTime<Local>,
    pub target: Target,
    /// `cmd` field of the request, if it had one.
    pub command: Option<String>,
    /// Request text as it was in the editor.
    pub request_text: String,
    /// Header plus compact body, as sent.
    pub framed: String,
    pub outcome: ExchangeOutcome,
    pub elapsed: Duration,
}

impl ExchangeRecord {
    pub fn status_label(&self) -> &'static str {
        if self.outcome.is_success() {
            "OK"
        } else {
            "FAILED"
        }
    }

    /// Display color for the status column.
    pub fn status_color(&self) -> Color {
        match &self.outcome {
            ExchangeOutcome::Response { length_mismatch: Some(_), .. } => Color::Yellow,
            ExchangeOutcome::Response { .. } => Color::Green,
            ExchangeOutcome::Failed(_) => Color::Red,
        }
    }

    pub fn time_display(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    pub fn command_display(&self) -> &str {
        self.command.as_deref().unwrap_or("-")
    }

    pub fn elapsed_display(&self) -> String {
        format!("{}ms", self.elapsed.as_millis())
    }
}

/// Bounded exchange history, newest first.
#[derive(Debug, Clone)]
pub struct History {
    records: VecDeque<ExchangeRecord>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Add a record, dropping the oldest once the limit is reached.
    pub fn push(&mut self, record: ExchangeRecord) {
        self.records.push_front(record);
        self.records.truncate(self.limit);
    }

    pub fn get(&self, index: usize) -> Option<&ExchangeRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExchangeRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ResponseBody;
    use pretty_assertions::assert_eq;

    fn record(n: usize) -> ExchangeRecord {
        ExchangeRecord {
            timestamp: Local::now(),
            target: Target::default(),
            command: Some(format!("cmd{}", n)),
            request_text: "{}".to_string(),
            framed: "(00000002){}".to_string(),
            outcome: ExchangeOutcome::Failed("Error: refused".to_string()),
            elapsed: Duration::from_millis(3),
        }
    }

    #[test]
    fn test_auth_template_text() {
        assert_eq!(
            Command::Auth.template_text(),
            "{\n  \"cmd\": \"auth\",\n  \"accessKey\": \"test_user1\",\n  \"reqNo\": \"test_1\",\n  \"ipAddr\": \"127.0.0.1\"\n}"
        );
    }

    #[test]
    fn test_heartbeat_template_text() {
        assert_eq!(
            Command::HeartBeat.template_text(),
            "{\n  \"cmd\": \"heartBeat\",\n  \"sessionId\": \"abcde12345\"\n}"
        );
    }

    #[test]
    fn test_execute_template_has_nested_params() {
        let template = Command::Execute.template();
        assert_eq!(template["cmd"], "execute");
        assert_eq!(template["command"], "ping");
        assert_eq!(template["params"]["target"], "127.0.0.1");
    }

    #[test]
    fn test_template_cmd_matches_wire_name() {
        for command in Command::all() {
            assert_eq!(command.template()["cmd"], command.as_str());
        }
    }

    #[test]
    fn test_auth_mac_addr_serialized_when_set() {
        let auth = AuthRequest {
            mac_addr: Some("00:11:22:33:44:55".to_string()),
            ..AuthRequest::default()
        };
        let value = serde_json::to_value(&auth).unwrap();
        assert_eq!(value["macAddr"], "00:11:22:33:44:55");
    }

    #[test]
    fn test_command_cycle() {
        let mut command = Command::Auth;
        for _ in 0..Command::all().len() {
            command = command.next();
        }
        assert_eq!(command, Command::Auth);
        assert_eq!(Command::Auth.prev(), Command::Execute);
    }

    #[test]
    fn test_command_from_str() {
        assert_eq!("heartbeat".parse::<Command>(), Ok(Command::HeartBeat));
        assert_eq!("execute".parse::<Command>(), Ok(Command::Execute));
        assert!("logout".parse::<Command>().is_err());
    }

    #[test]
    fn test_history_is_bounded_and_newest_first() {
        let mut history = History::new(2);
        for n in 0..3 {
            history.push(record(n));
        }

        assert_eq!(history.len(), 2);
        assert_eq!(history.get(0).unwrap().command_display(), "cmd2");
        assert_eq!(history.get(1).unwrap().command_display(), "cmd1");
    }

    #[test]
    fn test_record_status() {
        let mut rec = record(0);
        assert_eq!(rec.status_label(), "FAILED");
        assert_eq!(rec.status_color(), Color::Red);

        rec.outcome = ExchangeOutcome::Response {
            body: ResponseBody::Raw("hello".to_string()),
            raw: "(00000005)hello".to_string(),
            length_mismatch: None,
        };
        assert_eq!(rec.status_label(), "OK");
        assert_eq!(rec.status_color(), Color::Green);
    }
}
