use std::io::{BufRead, Write};

use colored::Colorize;
use snafu::{ResultExt, Snafu};
use tracing::{debug, info};

use crate::namespace::{NamespaceTree, NodeId, TreeError};

use super::command::{Command, PARENT_MARKER};

pub const DEFAULT_PROMPT: &str = "> ";

const INVALID_UTF8_MESSAGE: &str = "Input is not valid UTF-8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub prompt: String,
    /// Print failure lines in red.
    pub colorize: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            prompt: DEFAULT_PROMPT.to_string(),
            colorize: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Terminated,
}

/// Owns the tree and the cursor into it.
#[derive(Debug)]
pub struct Session {
    tree: NamespaceTree,
    current: NodeId,
    state: SessionState,
    options: SessionOptions,
}

impl Session {
    pub fn new(tree: NamespaceTree, options: SessionOptions) -> Self {
        let current = tree.root();
        Session {
            tree,
            current,
            state: SessionState::Running,
            options,
        }
    }

    #[cfg(test)]
    pub fn tree(&self) -> &NamespaceTree {
        &self.tree
    }

    #[cfg(test)]
    pub fn current(&self) -> NodeId {
        self.current
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Reads and executes lines until `exit` or end of input.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        mut output: W,
    ) -> Result<(), SessionError> {
        info!("Session started");
        let mut buffer = Vec::new();

        while self.state == SessionState::Running {
            write!(output, "{}", self.options.prompt).context(OutputSnafu)?;
            output.flush().context(OutputSnafu)?;

            buffer.clear();
            let read = input.read_until(b'\n', &mut buffer).context(InputSnafu)?;
            if read == 0 {
                debug!("Reached end of input");
                if !self.options.prompt.is_empty() {
                    writeln!(output).context(OutputSnafu)?;
                }
                self.state = SessionState::Terminated;
                break;
            }

            match std::str::from_utf8(&buffer) {
                Ok(line) => self.execute_line(line, &mut output)?,
                Err(error) => {
                    debug!("Rejected input line that is not UTF-8: {}", error);
                    self.report_failure(&mut output, INVALID_UTF8_MESSAGE)?;
                }
            }
        }

        output.flush().context(OutputSnafu)?;
        info!("Session terminated");
        Ok(())
    }

    /// Executes a single input line, writing its result to `output`.
    pub fn execute_line<W: Write>(&mut self, line: &str, output: &mut W) -> Result<(), SessionError> {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(()),
            Err(error) => {
                debug!("Rejected input line {:?}: {}", line.trim(), error);
                return self.report_failure(output, &error.to_string());
            }
        };

        debug!("Dispatching {:?}", command);
        match self.dispatch(&command) {
            Ok(lines) => {
                for text in lines {
                    writeln!(output, "{text}").context(OutputSnafu)?;
                }
                Ok(())
            }
            Err(error) => {
                debug!("Command '{}' failed: {}", command.kind(), error);
                self.report_failure(output, &command.failure_message(&error))
            }
        }
    }

    fn dispatch(&mut self, command: &Command) -> Result<Vec<String>, TreeError> {
        let here = self.current;

        match command {
            Command::List => Ok(self
                .tree
                .list(here)?
                .iter()
                .map(ToString::to_string)
                .collect()),
            Command::ChangeDirectory { target } => {
                // A child literally named `..` takes precedence over ascending.
                self.current = match self.tree.descend(here, target) {
                    Ok(child) => child,
                    Err(TreeError::NotFoundError { .. }) if target == PARENT_MARKER => {
                        self.tree.ascend(here)?
                    }
                    Err(error) => return Err(error),
                };
                Ok(Vec::new())
            }
            Command::MakeDirectory { name } => {
                self.tree.make_container(here, name)?;
                Ok(Vec::new())
            }
            Command::RemoveDirectory { name } => {
                self.tree.remove_container(here, name)?;
                Ok(Vec::new())
            }
            Command::Touch { name } => {
                self.tree.make_leaf(here, name)?;
                Ok(Vec::new())
            }
            Command::Remove { name } => {
                self.tree.remove_leaf(here, name)?;
                Ok(Vec::new())
            }
            Command::PrintWorkingDirectory => {
                Ok(vec![self.tree.current_path(here)?.to_string()])
            }
            Command::Write { name, text } => {
                self.tree.write_content(here, name, text.as_str())?;
                Ok(Vec::new())
            }
            Command::Read { name } => Ok(vec![self.tree.read_content(here, name)?.to_string()]),
            Command::Move { old_name, new_name } => {
                self.tree.rename(here, old_name, new_name)?;
                Ok(Vec::new())
            }
            Command::Copy { old_name, new_name } => {
                self.tree.duplicate(here, old_name, new_name)?;
                Ok(Vec::new())
            }
            Command::Exit => {
                self.state = SessionState::Terminated;
                Ok(Vec::new())
            }
        }
    }

    fn report_failure<W: Write>(&self, output: &mut W, message: &str) -> Result<(), SessionError> {
        if self.options.colorize {
            writeln!(output, "{}", message.red()).context(OutputSnafu)
        } else {
            writeln!(output, "{message}").context(OutputSnafu)
        }
    }
}

#[derive(Debug, Snafu)]
pub enum SessionError {
    #[snafu(display("Failed to read from the session input"))]
    InputError { source: std::io::Error },
    #[snafu(display("Failed to write to the session output"))]
    OutputError { source: std::io::Error },
}
