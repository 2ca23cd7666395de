//! Interactive session loop
//!
//! The session is the only stateful part of bkt. It moves between three
//! states until the user exits or the bucket can no longer be listed:
//!
//! ```text
//! Listing -> AwaitingCommand -> Dispatching -> Listing
//!                 ^                  |
//!                 +---- invalid -----+
//! ```
//!
//! Executor failures are reported and the loop continues; a listing failure
//! ends the session.

mod command;
mod input;

use std::fmt::Display;
use std::ops::ControlFlow;
use std::path::PathBuf;

use bkt_core::{Error, Listing, ObjectStore, OnEmpty, Result, SessionSettings};
use serde::Serialize;
use tokio::io::AsyncBufRead;

pub use command::{argument_prompt, with_argument, Command, CommandTable, Parsed, EXIT_WORD};
pub use input::LineReader;

use crate::commands::{download, ls, rm, upload};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Printed for unknown, disabled or incomplete input
pub const INVALID_MESSAGE: &str = "Invalid command. Please try again.";

/// How a session ended
#[derive(Debug)]
pub enum SessionEnd {
    /// The user typed `exit` or closed the input
    Exited,
    /// The bucket was empty and the session is configured to stop on that
    EmptyBucket,
    /// The bucket could not be listed
    ListingFailed(Error),
    /// Reading user input failed
    InputFailed(Error),
}

impl SessionEnd {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SessionEnd::Exited | SessionEnd::EmptyBucket => ExitCode::Success,
            SessionEnd::ListingFailed(e) | SessionEnd::InputFailed(e) => ExitCode::from_error(e),
        }
    }
}

#[derive(Debug)]
enum State {
    Listing,
    AwaitingCommand,
    Dispatching(Command),
}

type Transition = ControlFlow<SessionEnd, State>;

/// One interactive run against a single bucket
pub struct Session<'a, S: ?Sized> {
    store: &'a S,
    bucket: String,
    settings: SessionSettings,
    table: CommandTable,
    formatter: Formatter,
    download_dir: PathBuf,
}

impl<'a, S> Session<'a, S>
where
    S: ObjectStore + ?Sized,
{
    pub fn new(
        store: &'a S,
        bucket: impl Into<String>,
        settings: SessionSettings,
        formatter: Formatter,
    ) -> Self {
        let table = CommandTable::new(&settings.commands);
        Self {
            store,
            bucket: bucket.into(),
            settings,
            table,
            formatter,
            download_dir: PathBuf::from("."),
        }
    }

    /// Directory downloads are written into (default: the working directory)
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Run until the user exits or the session fails
    pub async fn run<R>(&self, input: &mut LineReader<R>) -> SessionEnd
    where
        R: AsyncBufRead + Unpin,
    {
        let mut state = State::Listing;
        loop {
            tracing::debug!(?state, "session state");
            let transition = match state {
                State::Listing => self.list().await,
                State::AwaitingCommand => self.await_command(input).await,
                State::Dispatching(command) => self.dispatch(command).await,
            };
            match transition {
                ControlFlow::Continue(next) => state = next,
                ControlFlow::Break(end) => {
                    tracing::debug!(?end, "session ended");
                    return end;
                }
            }
        }
    }

    async fn list(&self) -> Transition {
        match ls::execute(self.store, &self.bucket, &self.settings, &self.formatter).await {
            Ok(Listing::Empty) if matches!(self.settings.on_empty, OnEmpty::Exit) => {
                ControlFlow::Break(SessionEnd::EmptyBucket)
            }
            Ok(_) => ControlFlow::Continue(State::AwaitingCommand),
            Err(e) => {
                tracing::error!(bucket = %self.bucket, "listing failed: {e}");
                self.formatter.error(&format!("Failed to list bucket contents: {e}"));
                ControlFlow::Break(SessionEnd::ListingFailed(e))
            }
        }
    }

    async fn await_command<R>(&self, input: &mut LineReader<R>) -> Transition
    where
        R: AsyncBufRead + Unpin,
    {
        self.formatter.println(&self.table.prompt());
        let line = match input.read_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return ControlFlow::Continue(State::Dispatching(Command::Exit)),
            Err(e) => return ControlFlow::Break(SessionEnd::InputFailed(e.into())),
        };

        let command = match self.table.parse(&line) {
            Parsed::Ready(command) => command,
            Parsed::NeedsArgument(kind) => {
                self.formatter.println(argument_prompt(kind));
                match input.read_line().await {
                    Ok(Some(argument)) => with_argument(kind, &argument),
                    Ok(None) => Command::Exit,
                    Err(e) => return ControlFlow::Break(SessionEnd::InputFailed(e.into())),
                }
            }
        };
        ControlFlow::Continue(State::Dispatching(command))
    }

    async fn dispatch(&self, command: Command) -> Transition {
        let output = self.formatter.config();
        match command {
            Command::Exit => return ControlFlow::Break(SessionEnd::Exited),
            Command::List => {}
            Command::Invalid(raw) => {
                tracing::debug!(input = %raw, "invalid command");
                if self.formatter.is_json() {
                    self.formatter.error(INVALID_MESSAGE);
                } else {
                    self.formatter.println(INVALID_MESSAGE);
                }
                return ControlFlow::Continue(State::AwaitingCommand);
            }
            Command::Download(key) => {
                let result =
                    download::execute(self.store, &self.bucket, &key, &self.download_dir, output)
                        .await;
                self.report("downloading object", result);
            }
            Command::Upload(path) => {
                let result = upload::execute(self.store, &self.bucket, &path, output).await;
                self.report("uploading file", result);
            }
            Command::Delete(key) => {
                let result = rm::execute(self.store, &self.bucket, &key).await;
                self.report("deleting object", result);
            }
        }
        ControlFlow::Continue(State::Listing)
    }

    fn report<T: Serialize + Display>(&self, action: &str, result: Result<T>) {
        match result {
            Ok(outcome) => self.formatter.output(&outcome),
            Err(e) => {
                tracing::warn!("error {action}: {e}");
                self.formatter.error(&format!("Error {action}: {e}"));
            }
        }
    }
}
