//! Prompt words and the commands they select
//!
//! A line is split into a command word and an optional argument. The word is
//! looked up in a `CommandTable` built from the enabled command set, so a new
//! command only needs a new table entry.

use std::collections::HashMap;
use std::path::PathBuf;

use bkt_core::CommandKind;

/// Word that ends the session; always enabled
pub const EXIT_WORD: &str = "exit";

/// One user request, built per loop iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Download(String),
    Upload(PathBuf),
    Delete(String),
    Exit,
    /// Unknown, disabled or malformed input, kept verbatim
    Invalid(String),
}

/// Result of parsing one prompt line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Ready(Command),
    /// The word was valid but its argument must be read from a second prompt
    NeedsArgument(CommandKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Run(CommandKind),
    Exit,
}

/// Mapping from prompt words to commands
#[derive(Debug, Clone)]
pub struct CommandTable {
    words: HashMap<&'static str, Action>,
    order: Vec<CommandKind>,
}

impl CommandTable {
    /// Build a table offering `enabled` (in that order) plus `exit`
    pub fn new(enabled: &[CommandKind]) -> Self {
        let mut words = HashMap::new();
        let mut order = Vec::new();
        for &kind in enabled {
            if words.insert(kind.word(), Action::Run(kind)).is_none() {
                order.push(kind);
            }
        }
        words.insert(EXIT_WORD, Action::Exit);
        Self { words, order }
    }

    /// The main prompt, e.g. `Enter 'list', 'delete' or 'exit':`
    pub fn prompt(&self) -> String {
        let mut quoted: Vec<String> = self
            .order
            .iter()
            .map(|kind| format!("'{}'", kind.word()))
            .collect();
        quoted.push(format!("'{EXIT_WORD}'"));

        let last = quoted.pop().unwrap_or_default();
        if quoted.is_empty() {
            format!("Enter {last}:")
        } else {
            format!("Enter {} or {last}:", quoted.join(", "))
        }
    }

    /// Parse a trimmed prompt line
    pub fn parse(&self, line: &str) -> Parsed {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let action = self.words.get(word.to_ascii_lowercase().as_str()).copied();
        let invalid = || Parsed::Ready(Command::Invalid(line.to_string()));

        match action {
            None => invalid(),
            Some(Action::Exit) if rest.is_empty() => Parsed::Ready(Command::Exit),
            Some(Action::Run(CommandKind::List)) if rest.is_empty() => {
                Parsed::Ready(Command::List)
            }
            Some(Action::Exit) | Some(Action::Run(CommandKind::List)) => invalid(),
            Some(Action::Run(kind)) if rest.is_empty() => Parsed::NeedsArgument(kind),
            Some(Action::Run(kind)) => Parsed::Ready(with_argument(kind, rest)),
        }
    }
}

/// Complete a command whose argument was read from its own prompt
pub fn with_argument(kind: CommandKind, argument: &str) -> Command {
    let argument = argument.trim();
    if argument.is_empty() {
        return Command::Invalid(kind.word().to_string());
    }
    match kind {
        CommandKind::List => Command::Invalid(format!("{} {argument}", kind.word())),
        CommandKind::Download => Command::Download(argument.to_string()),
        CommandKind::Upload => Command::Upload(PathBuf::from(argument)),
        CommandKind::Delete => Command::Delete(argument.to_string()),
    }
}

/// Second prompt asking for a command's argument
pub fn argument_prompt(kind: CommandKind) -> &'static str {
    match kind {
        CommandKind::Delete => "Enter the object key to delete:",
        CommandKind::Download => "Enter the object key to download:",
        CommandKind::Upload => "Enter the local file path to upload:",
        CommandKind::List => "",
    }
}
