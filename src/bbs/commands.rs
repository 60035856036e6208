//! Command dispatch for the bulletin board protocol.
//!
//! [`CommandProcessor`] takes one parsed [`Command`], the connection's
//! [`Session`] and the shared [`BoardRegistry`], and produces exactly one
//! [`Reply`]. Every failure is a typed [`CommandError`] whose `Display` is the
//! protocol text sent back to the client; no error escapes a single command, so
//! a bad request never ends the connection.
//!
//! Argument rules:
//! - Commands without arguments ignore any extra tokens.
//! - `%post` and `%grouppost` join the trailing arguments into the content.
//! - Group identifiers may span several tokens (`%groupjoin Group Alpha`); see
//!   [`BoardRegistry::resolve_leading`].
//!
//! A session holds its username on the public board and on each group it
//! joined. `%leave`, a `%join` under a different name and disconnect all give
//! those holds back, never more than once per board.
use log::{debug, info};
use std::sync::Arc;
use thiserror::Error;

use super::parser::{Command, CommandParser};
use super::session::Session;
use crate::board::{BoardError, BoardRegistry, GroupBoard};
use crate::logutil::{escape_args, escape_log};
use crate::metrics;

pub const NO_USERS: &str = "No users in the group.";
pub const NO_GROUPS: &str = "No groups available.";
pub const UNKNOWN_COMMAND: &str = "Unknown command.";
pub const GOODBYE: &str = "Goodbye!";

/// Protocol-level failures. The message of each variant is the reply text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// Wrong argument count or shape.
    #[error("Error: {0}")]
    Usage(&'static str),

    #[error("Error: You are not currently joined to leave.")]
    NotJoined,

    #[error("Error: You must join the bulletin board first using %join <username>.")]
    MustJoinFirst,

    #[error("Error: Unknown group '{0}'.")]
    UnknownGroup(String),

    #[error("Error: You are not a member of {0}.")]
    NotGroupMember(String),

    #[error("Message not found.")]
    NotFound,

    /// A numeric argument failed to parse.
    #[error("Error: Invalid parameters.")]
    InvalidParameters,
}

impl From<BoardError> for CommandError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::NotFound(_) => CommandError::NotFound,
            BoardError::UnknownGroup(g) => CommandError::UnknownGroup(g),
        }
    }
}

/// One response line (possibly containing embedded newlines).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// The connection should close after this reply is written.
    pub close: bool,
}

impl Reply {
    fn text(text: String) -> Self {
        Reply { text, close: false }
    }
}

fn parse_message_id(raw: &str) -> Result<u64, CommandError> {
    raw.parse::<u64>().map_err(|_| CommandError::InvalidParameters)
}

fn user_list(users: Vec<String>) -> String {
    if users.is_empty() {
        NO_USERS.to_string()
    } else {
        users.join("\n")
    }
}

/// Processes protocol commands against the shared boards.
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    registry: Arc<BoardRegistry>,
    parser: CommandParser,
}

impl CommandProcessor {
    pub fn new(registry: Arc<BoardRegistry>) -> Self {
        CommandProcessor {
            registry,
            parser: CommandParser::new(),
        }
    }

    pub fn registry(&self) -> &BoardRegistry {
        &self.registry
    }

    /// Parse and process one raw line. Blank lines produce no reply.
    pub fn process_line(&self, session: &mut Session, line: &str) -> Option<Reply> {
        let command = self.parser.parse(line)?;
        Some(self.process(session, command))
    }

    /// Process a command and return its reply
    pub fn process(&self, session: &mut Session, command: Command) -> Reply {
        metrics::inc_commands();
        session.update_activity();
        debug!(
            "Session {}: Processing command: {} {}",
            session.id,
            escape_log(command.verb()),
            escape_args(command.args())
        );

        let close = matches!(command, Command::Exit(_));
        match self.execute(session, command) {
            Ok(text) => Reply { text, close },
            Err(e) => {
                metrics::inc_error_replies();
                debug!("Session {}: {}", session.id, e);
                Reply::text(e.to_string())
            }
        }
    }

    fn execute(&self, session: &mut Session, command: Command) -> Result<String, CommandError> {
        match command {
            Command::Connect(args) => self.handle_connect(&args),
            Command::Join(args) => self.handle_join(session, &args),
            Command::Post(args) => self.handle_post(session, &args),
            Command::Users(_) => Ok(user_list(self.registry.public().list_users())),
            Command::Leave(_) => self.handle_leave(session),
            Command::Message(args) => self.handle_message(&args),
            Command::Exit(_) => {
                info!("Session {}: {} requested exit", session.id, escape_log(&session.display_name()));
                Ok(GOODBYE.to_string())
            }
            Command::Groups(_) => Ok(self.render_groups()),
            Command::GroupJoin(args) => self.handle_group_join(session, &args),
            Command::GroupPost(args) => self.handle_group_post(session, &args),
            Command::GroupUsers(args) => self.handle_group_users(&args),
            Command::GroupLeave(args) => self.handle_group_leave(session, &args),
            Command::GroupMessage(args) => self.handle_group_message(&args),
            Command::Unknown(verb) => {
                metrics::inc_unknown_commands();
                debug!("Session {}: unknown verb {}", session.id, escape_log(&verb));
                Ok(UNKNOWN_COMMAND.to_string())
            }
        }
    }

    fn handle_connect(&self, args: &[String]) -> Result<String, CommandError> {
        match args {
            [address, port] => Ok(format!(
                "Connected to the bulletin board server at {}:{}.",
                address, port
            )),
            _ => Err(CommandError::Usage("%connect requires address and port.")),
        }
    }

    fn handle_join(&self, session: &mut Session, args: &[String]) -> Result<String, CommandError> {
        let [username] = args else {
            return Err(CommandError::Usage(
                "Incorrect parameters for %join. Usage: %join <username>.",
            ));
        };
        if session.username.as_deref() == Some(username.as_str()) {
            return Ok(format!("{} has joined the bulletin board.", username));
        }
        if let Some(previous) = session.leave() {
            self.release_holdings(session, &previous);
            info!(
                "Session {}: {} rejoined as {}",
                session.id,
                escape_log(&previous),
                escape_log(username)
            );
        }
        if self.registry.public().add_user(username) {
            info!("Session {}: {} joined the public board", session.id, escape_log(username));
        }
        session.join(username.clone());
        Ok(format!("{} has joined the bulletin board.", username))
    }

    fn handle_post(&self, session: &Session, args: &[String]) -> Result<String, CommandError> {
        const USAGE: &str =
            "Incorrect parameters for %post. Usage: %post <sender> <date> <subject> <content>.";
        let (sender, post_date, subject, body) = match args {
            [sender, post_date, subject, body @ ..] if !body.is_empty() => {
                (sender, post_date, subject, body)
            }
            _ => return Err(CommandError::Usage(USAGE)),
        };
        let public = self.registry.public();
        if !public.has_user(sender) {
            return Err(CommandError::MustJoinFirst);
        }
        let id = public.add_post(sender, post_date, subject, &body.join(" "));
        metrics::inc_posts();
        info!(
            "Session {}: {} posted message {} ({})",
            session.id,
            escape_log(sender),
            id,
            escape_log(subject)
        );
        Ok(format!("Message posted with ID {}", id))
    }

    fn handle_leave(&self, session: &mut Session) -> Result<String, CommandError> {
        let username = session.leave().ok_or(CommandError::NotJoined)?;
        self.release_holdings(session, &username);
        info!("Session {}: {} left the public board", session.id, escape_log(&username));
        Ok(format!("{} has left the bulletin board.", username))
    }

    fn handle_message(&self, args: &[String]) -> Result<String, CommandError> {
        let [raw_id] = args else {
            return Err(CommandError::Usage("%message requires a message ID."));
        };
        let id = parse_message_id(raw_id)?;
        Ok(self.registry.public().get_message(id)?)
    }

    fn render_groups(&self) -> String {
        let groups = self.registry.list_groups();
        if groups.is_empty() {
            return NO_GROUPS.to_string();
        }
        groups
            .iter()
            .map(|(id, name)| format!("ID: {}, Name: {}", id, name))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Resolve a group that must consume every argument.
    fn resolve_whole(&self, args: &[String], usage: &'static str) -> Result<&GroupBoard, CommandError> {
        if args.is_empty() {
            return Err(CommandError::Usage(usage));
        }
        let (group, rest) = self.registry.resolve_leading(args, 0)?;
        if !rest.is_empty() {
            return Err(CommandError::Usage(usage));
        }
        Ok(group)
    }

    fn handle_group_join(&self, session: &mut Session, args: &[String]) -> Result<String, CommandError> {
        let group = self.resolve_whole(args, "%groupjoin requires group ID/name.")?;
        let username = session.username.clone().ok_or(CommandError::MustJoinFirst)?;
        if !session.is_member(&group.id) {
            group.board.add_user(&username);
            session.join_group(&group.id);
        }
        info!(
            "Session {}: {} joined group {}",
            session.id,
            escape_log(&username),
            escape_log(&group.id)
        );
        Ok(format!("{} has joined {}.", username, group.name))
    }

    fn handle_group_post(&self, session: &Session, args: &[String]) -> Result<String, CommandError> {
        const USAGE: &str = "%grouppost requires group ID, subject, and content.";
        if args.len() < 3 {
            return Err(CommandError::Usage(USAGE));
        }
        let (group, rest) = self.registry.resolve_leading(args, 2)?;
        let username = session.username.as_deref().ok_or(CommandError::MustJoinFirst)?;
        if !session.is_member(&group.id) {
            return Err(CommandError::NotGroupMember(group.name.clone()));
        }
        let (subject, body) = match rest {
            [subject, body @ ..] if !body.is_empty() => (subject, body),
            _ => return Err(CommandError::Usage(USAGE)),
        };
        let post_date = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let id = group.board.add_post(username, &post_date, subject, &body.join(" "));
        metrics::inc_posts();
        info!(
            "Session {}: {} posted message {} to group {} ({})",
            session.id,
            escape_log(username),
            id,
            escape_log(&group.id),
            escape_log(subject)
        );
        Ok(format!("Message posted to {} with ID {}", group.name, id))
    }

    fn handle_group_users(&self, args: &[String]) -> Result<String, CommandError> {
        let group = self.resolve_whole(args, "%groupusers requires group ID/name.")?;
        Ok(user_list(group.board.list_users()))
    }

    fn handle_group_leave(&self, session: &mut Session, args: &[String]) -> Result<String, CommandError> {
        let group = self.resolve_whole(args, "%groupleave requires group ID/name.")?;
        let username = session.username.clone().ok_or(CommandError::NotJoined)?;
        if session.leave_group(&group.id) {
            group.board.remove_user(&username);
        }
        info!(
            "Session {}: {} left group {}",
            session.id,
            escape_log(&username),
            escape_log(&group.id)
        );
        Ok(format!("{} has left {}.", username, group.name))
    }

    fn handle_group_message(&self, args: &[String]) -> Result<String, CommandError> {
        const USAGE: &str = "%groupmessage requires group ID and message ID.";
        if args.len() < 2 {
            return Err(CommandError::Usage(USAGE));
        }
        let (group, rest) = self.registry.resolve_leading(args, 1)?;
        let [raw_id] = rest else {
            return Err(CommandError::Usage(USAGE));
        };
        let id = parse_message_id(raw_id)?;
        Ok(group.board.get_message(id)?)
    }

    /// Give up the public and group holds taken under `username`. The session
    /// keeps no group memberships afterwards.
    fn release_holdings(&self, session: &mut Session, username: &str) {
        let groups = session.take_groups();
        self.registry.release_user(username, &groups);
    }

    /// Release everything a finished session still holds on the shared boards.
    pub fn release_session(&self, session: &Session) {
        if let Some(username) = &session.username {
            self.registry.release_user(username, &session.member_groups);
            info!(
                "Session {}: released {} from public board and {} group(s)",
                session.id,
                escape_log(username),
                session.member_groups.len()
            );
        }
    }
}
