//! Line parser for the `%`-prefixed command protocol.
//!
//! A line is split on whitespace into a verb and its arguments. The verb is
//! mapped onto the closed [`Command`] enum; anything unrecognized becomes
//! [`Command::Unknown`]. Argument counts are not checked here, the dispatcher
//! owns that so each command can produce its own usage message.
//!
//! Blank lines produce no command at all and must not be dispatched.
use log::trace;

/// The sigil every command verb starts with.
pub const COMMAND_SIGIL: char = '%';

/// A parsed client command. Each variant carries its raw argument tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect(Vec<String>),
    Join(Vec<String>),
    Post(Vec<String>),
    Users(Vec<String>),
    Leave(Vec<String>),
    Message(Vec<String>),
    Exit(Vec<String>),
    Groups(Vec<String>),
    GroupJoin(Vec<String>),
    GroupPost(Vec<String>),
    GroupUsers(Vec<String>),
    GroupLeave(Vec<String>),
    GroupMessage(Vec<String>),
    /// Verb as received, including its sigil if any.
    Unknown(String),
}

impl Command {
    /// Protocol verb for logging.
    pub fn verb(&self) -> &str {
        match self {
            Command::Connect(_) => "%connect",
            Command::Join(_) => "%join",
            Command::Post(_) => "%post",
            Command::Users(_) => "%users",
            Command::Leave(_) => "%leave",
            Command::Message(_) => "%message",
            Command::Exit(_) => "%exit",
            Command::Groups(_) => "%groups",
            Command::GroupJoin(_) => "%groupjoin",
            Command::GroupPost(_) => "%grouppost",
            Command::GroupUsers(_) => "%groupusers",
            Command::GroupLeave(_) => "%groupleave",
            Command::GroupMessage(_) => "%groupmessage",
            Command::Unknown(v) => v,
        }
    }

    /// Argument tokens; empty for [`Command::Unknown`].
    pub fn args(&self) -> &[String] {
        match self {
            Command::Connect(a)
            | Command::Join(a)
            | Command::Post(a)
            | Command::Users(a)
            | Command::Leave(a)
            | Command::Message(a)
            | Command::Exit(a)
            | Command::Groups(a)
            | Command::GroupJoin(a)
            | Command::GroupPost(a)
            | Command::GroupUsers(a)
            | Command::GroupLeave(a)
            | Command::GroupMessage(a) => a,
            Command::Unknown(_) => &[],
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse one line (line terminators already stripped or not).
    ///
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(&self, raw: &str) -> Option<Command> {
        let mut tokens = raw.split_whitespace();
        let verb = tokens.next()?;
        let args: Vec<String> = tokens.map(str::to_string).collect();
        // Verbs are case-sensitive
        let cmd = match verb.strip_prefix(COMMAND_SIGIL) {
            Some("connect") => Command::Connect(args),
            Some("join") => Command::Join(args),
            Some("post") => Command::Post(args),
            Some("users") => Command::Users(args),
            Some("leave") => Command::Leave(args),
            Some("message") => Command::Message(args),
            Some("exit") => Command::Exit(args),
            Some("groups") => Command::Groups(args),
            Some("groupjoin") => Command::GroupJoin(args),
            Some("grouppost") => Command::GroupPost(args),
            Some("groupusers") => Command::GroupUsers(args),
            Some("groupleave") => Command::GroupLeave(args),
            Some("groupmessage") => Command::GroupMessage(args),
            _ => Command::Unknown(verb.to_string()),
        };
        trace!("Parsed {} from '{}'", cmd.verb(), raw.trim());
        Some(cmd)
    }
}
