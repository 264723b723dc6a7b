//! Logical commands understood by the execution engine.

use std::fmt;

/// The command a bridge call executes.
///
/// For [`RequestType::CustomCommand`] the argument list carries the command
/// name as its first element; the other variants supply their own name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    CustomCommand,
    Info,
    Ping,
    ScriptFlush,
}

impl RequestType {
    /// Leading tokens of the command, before the caller's arguments.
    pub fn prefix(&self) -> &'static [&'static str] {
        match self {
            RequestType::CustomCommand => &[],
            RequestType::Info => &["INFO"],
            RequestType::Ping => &["PING"],
            RequestType::ScriptFlush => &["SCRIPT", "FLUSH"],
        }
    }

    /// Full command line: prefix tokens followed by `args`.
    pub fn command_line(&self, args: &[String]) -> Vec<String> {
        self.prefix()
            .iter()
            .map(|s| (*s).to_string())
            .chain(args.iter().cloned())
            .collect()
    }

    /// Name used in logs and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            RequestType::CustomCommand => "custom_command",
            RequestType::Info => "info",
            RequestType::Ping => "ping",
            RequestType::ScriptFlush => "script_flush",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
