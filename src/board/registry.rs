//! Process-wide holder of the public board and the configured group boards.
//!
//! The set of groups is fixed when the registry is built; lookups never create
//! boards. Identifiers are matched exactly against a group's id or its name.
use super::{Board, BoardError};
use log::trace;

/// A group board: a [`Board`] plus its configured identity.
#[derive(Debug)]
pub struct GroupBoard {
    pub id: String,
    pub name: String,
    pub board: Board,
}

impl GroupBoard {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        GroupBoard {
            id: id.into(),
            name: name.into(),
            board: Board::new(),
        }
    }

    pub fn matches(&self, identifier: &str) -> bool {
        self.id == identifier || self.name == identifier
    }
}

#[derive(Debug, Default)]
pub struct BoardRegistry {
    public: Board,
    groups: Vec<GroupBoard>,
}

impl BoardRegistry {
    /// Build a registry from `(id, name)` pairs, kept in the given order.
    pub fn new<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        BoardRegistry {
            public: Board::new(),
            groups: groups
                .into_iter()
                .map(|(id, name)| GroupBoard::new(id, name))
                .collect(),
        }
    }

    pub fn public(&self) -> &Board {
        &self.public
    }

    pub fn groups(&self) -> &[GroupBoard] {
        &self.groups
    }

    /// `(id, name)` for every group in configuration order.
    pub fn list_groups(&self) -> Vec<(String, String)> {
        self.groups
            .iter()
            .map(|g| (g.id.clone(), g.name.clone()))
            .collect()
    }

    pub fn resolve_group(&self, identifier: &str) -> Result<&GroupBoard, BoardError> {
        self.groups
            .iter()
            .find(|g| g.matches(identifier))
            .ok_or_else(|| BoardError::UnknownGroup(identifier.to_string()))
    }

    /// Resolve a group from the leading arguments of a command.
    ///
    /// Group names may contain spaces, so the longest run of leading arguments
    /// (joined by single spaces) that names a group wins, while still leaving at
    /// least `min_rest` arguments for the command itself. Returns the group and
    /// the arguments left over after the identifier. When nothing matches the
    /// error carries the first argument.
    pub fn resolve_leading<'a>(
        &self,
        args: &'a [String],
        min_rest: usize,
    ) -> Result<(&GroupBoard, &'a [String]), BoardError> {
        let max_take = args.len().saturating_sub(min_rest);
        for take in (1..=max_take).rev() {
            let candidate = args[..take].join(" ");
            if let Ok(group) = self.resolve_group(&candidate) {
                trace!("Resolved group '{}' from {} argument(s)", group.name, take);
                return Ok((group, &args[take..]));
            }
        }
        Err(BoardError::UnknownGroup(
            args.first().cloned().unwrap_or_default(),
        ))
    }

    /// Drop one hold of `name` on the public board and on each of the given groups.
    pub fn release_user<'g>(&self, name: &str, group_ids: impl IntoIterator<Item = &'g String>) {
        self.public.remove_user(name);
        for id in group_ids {
            if let Ok(group) = self.resolve_group(id) {
                group.board.remove_user(name);
            }
        }
    }
}
