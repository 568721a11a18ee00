use std::fmt;

use snafu::{OptionExt, Snafu, ensure};

use crate::namespace::TreeError;

/// Every command the session understands. The table is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    List,
    ChangeDirectory,
    MakeDirectory,
    RemoveDirectory,
    Touch,
    Remove,
    PrintWorkingDirectory,
    Write,
    Read,
    Move,
    Copy,
    Exit,
}

#[derive(Debug, Clone, Copy)]
enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl CommandKind {
    pub const ALL: [CommandKind; 12] = [
        CommandKind::List,
        CommandKind::ChangeDirectory,
        CommandKind::MakeDirectory,
        CommandKind::RemoveDirectory,
        CommandKind::Touch,
        CommandKind::Remove,
        CommandKind::PrintWorkingDirectory,
        CommandKind::Write,
        CommandKind::Read,
        CommandKind::Move,
        CommandKind::Copy,
        CommandKind::Exit,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::List => "ls",
            CommandKind::ChangeDirectory => "cd",
            CommandKind::MakeDirectory => "mkdir",
            CommandKind::RemoveDirectory => "rmdir",
            CommandKind::Touch => "touch",
            CommandKind::Remove => "rm",
            CommandKind::PrintWorkingDirectory => "pwd",
            CommandKind::Write => "write",
            CommandKind::Read => "read",
            CommandKind::Move => "mv",
            CommandKind::Copy => "cp",
            CommandKind::Exit => "exit",
        }
    }

    pub fn usage(self) -> &'static str {
        match self {
            CommandKind::List => "ls",
            CommandKind::ChangeDirectory => "cd <name|..>",
            CommandKind::MakeDirectory => "mkdir <name>",
            CommandKind::RemoveDirectory => "rmdir <name>",
            CommandKind::Touch => "touch <name>",
            CommandKind::Remove => "rm <name>",
            CommandKind::PrintWorkingDirectory => "pwd",
            CommandKind::Write => "write <name> <text...>",
            CommandKind::Read => "read <name>",
            CommandKind::Move => "mv <old> <new>",
            CommandKind::Copy => "cp <old> <new>",
            CommandKind::Exit => "exit",
        }
    }

    fn arity(self) -> Arity {
        match self {
            CommandKind::List | CommandKind::PrintWorkingDirectory => Arity::Exact(0),
            // Anything after `exit` is ignored.
            CommandKind::Exit => Arity::AtLeast(0),
            CommandKind::ChangeDirectory
            | CommandKind::MakeDirectory
            | CommandKind::RemoveDirectory
            | CommandKind::Touch
            | CommandKind::Remove
            | CommandKind::Read => Arity::Exact(1),
            CommandKind::Move | CommandKind::Copy => Arity::Exact(2),
            CommandKind::Write => Arity::AtLeast(1),
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name used by `cd` to move to the parent.
pub const PARENT_MARKER: &str = "..";

/// Whether an entry called `name` can be given as a single command argument
/// and does not shadow `cd ..`.
pub fn is_addressable_name(name: &str) -> bool {
    !name.is_empty() && name != PARENT_MARKER && !name.chars().any(char::is_whitespace)
}

/// A fully parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    ChangeDirectory { target: String },
    MakeDirectory { name: String },
    RemoveDirectory { name: String },
    Touch { name: String },
    Remove { name: String },
    PrintWorkingDirectory,
    Write { name: String, text: String },
    Read { name: String },
    Move { old_name: String, new_name: String },
    Copy { old_name: String, new_name: String },
    Exit,
}

impl Command {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    ///
    /// Tokens are separated by single spaces, so consecutive spaces produce
    /// empty tokens. For `write` the tokens after the name are joined back
    /// with single spaces, which restores the original text.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let mut tokens = line.split(' ');
        let name = tokens.next().unwrap_or_default();
        let args = tokens.collect::<Vec<_>>();

        let kind = CommandKind::from_name(name).context(UnknownCommandSnafu { name })?;
        ensure!(
            kind.arity().accepts(args.len()),
            WrongAritySnafu {
                command: kind.name(),
                usage: kind.usage(),
            }
        );

        let arg = |index: usize| args[index].to_string();
        let command = match kind {
            CommandKind::List => Command::List,
            CommandKind::ChangeDirectory => Command::ChangeDirectory { target: arg(0) },
            CommandKind::MakeDirectory => Command::MakeDirectory { name: arg(0) },
            CommandKind::RemoveDirectory => Command::RemoveDirectory { name: arg(0) },
            CommandKind::Touch => Command::Touch { name: arg(0) },
            CommandKind::Remove => Command::Remove { name: arg(0) },
            CommandKind::PrintWorkingDirectory => Command::PrintWorkingDirectory,
            CommandKind::Write => Command::Write {
                name: arg(0),
                text: args[1..].join(" "),
            },
            CommandKind::Read => Command::Read { name: arg(0) },
            CommandKind::Move => Command::Move {
                old_name: arg(0),
                new_name: arg(1),
            },
            CommandKind::Copy => Command::Copy {
                old_name: arg(0),
                new_name: arg(1),
            },
            CommandKind::Exit => Command::Exit,
        };

        Ok(Some(command))
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::List => CommandKind::List,
            Command::ChangeDirectory { .. } => CommandKind::ChangeDirectory,
            Command::MakeDirectory { .. } => CommandKind::MakeDirectory,
            Command::RemoveDirectory { .. } => CommandKind::RemoveDirectory,
            Command::Touch { .. } => CommandKind::Touch,
            Command::Remove { .. } => CommandKind::Remove,
            Command::PrintWorkingDirectory => CommandKind::PrintWorkingDirectory,
            Command::Write { .. } => CommandKind::Write,
            Command::Read { .. } => CommandKind::Read,
            Command::Move { .. } => CommandKind::Move,
            Command::Copy { .. } => CommandKind::Copy,
            Command::Exit => CommandKind::Exit,
        }
    }

    /// User facing message for a tree failure raised while running this command.
    pub fn failure_message(&self, error: &TreeError) -> String {
        use TreeError::{AlreadyExistsError, NotEmptyError, NotFoundError};

        match (self, error) {
            (
                Command::ChangeDirectory { .. } | Command::RemoveDirectory { .. },
                NotFoundError { name },
            ) => format!("No such directory: {name}"),
            (Command::RemoveDirectory { .. }, NotEmptyError { name }) => {
                format!("Directory '{name}' is not empty.")
            }
            (Command::MakeDirectory { .. }, AlreadyExistsError { name }) => {
                format!("Directory already exists: {name}")
            }
            (Command::Touch { .. }, AlreadyExistsError { name }) => {
                format!("File already exists: {name}")
            }
            (
                Command::Remove { .. } | Command::Write { .. } | Command::Read { .. },
                NotFoundError { name },
            ) => format!("No such file: {name}"),
            (Command::Move { .. } | Command::Copy { .. }, NotFoundError { name }) => {
                format!("No such file or directory: {name}")
            }
            (Command::Move { .. } | Command::Copy { .. }, AlreadyExistsError { name }) => {
                format!("Name already exists: {name}")
            }
            (_, other) => other.to_string(),
        }
    }
}

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum CommandError {
    #[snafu(display("Unknown command: {}", name))]
    UnknownCommandError { name: String },
    #[snafu(display("Wrong number of arguments for '{}'. Usage: {}", command, usage))]
    WrongArityError { command: String, usage: String },
}
