//! Replay scripts: timestamped check-in/check-out rows read from CSV.
//!
//! ```text
//! timestamp,action,plate,vip
//! 2024-03-01T08:02:00,in,KA-01-1234,false
//! 2024-03-01T09:40:00,out,KA-01-1234,
//! ```

use std::io::Read;

use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::warn;

use crate::command::Command;
use crate::ledger::parse_timestamp;

#[derive(Debug, Deserialize)]
pub struct ScriptRow {
    pub timestamp: String,
    pub action: String,
    pub plate: String,
    #[serde(default)]
    pub vip: Option<bool>,
}

/// A command with the wall-clock time it happened at
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimedCommand {
    pub at: NaiveDateTime,
    pub command: Command,
}

impl ScriptRow {
    /// Convert a raw row to a typed command; `None` for unknown actions or
    /// bad timestamps
    pub fn to_command(&self) -> Option<TimedCommand> {
        let at = parse_timestamp(&self.timestamp)?;
        let command = match self.action.trim().to_ascii_lowercase().as_str() {
            "in" | "check-in" | "checkin" => {
                Command::check_in(self.plate.clone(), self.vip.unwrap_or(false))
            }
            "out" | "check-out" | "checkout" => Command::check_out(self.plate.clone()),
            _ => return None,
        };
        Some(TimedCommand { at, command })
    }
}

/// Read a whole script, skipping rows that do not parse.
pub fn read_script(reader: impl Read) -> Vec<TimedCommand> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut commands = Vec::new();
    for (line, row) in rdr.deserialize::<ScriptRow>().enumerate() {
        match row.map(|r| r.to_command()) {
            Ok(Some(cmd)) => commands.push(cmd),
            Ok(None) => warn!(line = line + 2, "unrecognised script row skipped"),
            Err(e) => warn!(line = line + 2, error = %e, "unreadable script row skipped"),
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_script() {
        let input = "\
timestamp,action,plate,vip
2024-03-01T08:02:00,in,KA-01,false
2024-03-01T08:05,IN,VIP-1,true
2024-03-01T09:40:00,out,KA-01,
2024-03-01T09:41:00,park,KA-02,false
not-a-time,in,KA-03,false
";
        let cmds = read_script(input.as_bytes());
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[0].command, Command::check_in("KA-01", false));
        assert_eq!(cmds[1].command, Command::check_in("VIP-1", true));
        assert_eq!(cmds[2].command, Command::check_out("KA-01"));
        assert!(cmds[0].at < cmds[1].at && cmds[1].at < cmds[2].at);
    }
}
