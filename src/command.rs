//! Command verbs and line parsing.
//!
//! Case folding happens exactly once, in [`parse_input`], when the client
//! turns a typed line into a [`Command`]. Lines on the wire are always
//! canonical uppercase, and the server matches them exactly.

use std::fmt;

use crate::protocol::verb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    List,
    Upload,
    Download,
    Exit,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::List => verb::LIST,
            Verb::Upload => verb::UPLOAD,
            Verb::Download => verb::DOWNLOAD,
            Verb::Exit => verb::EXIT,
        }
    }

    /// Case-insensitive match of a typed verb.
    pub fn parse(word: &str) -> Option<Verb> {
        match word.to_ascii_uppercase().as_str() {
            verb::LIST => Some(Verb::List),
            verb::UPLOAD => Some(Verb::Upload),
            verb::DOWNLOAD => Some(Verb::Download),
            verb::EXIT => Some(Verb::Exit),
            _ => None,
        }
    }

    pub fn takes_argument(self) -> bool {
        matches!(self, Verb::Upload | Verb::Download)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verb with its (possibly empty) argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    pub argument: String,
}

impl Command {
    pub fn new(verb: Verb, argument: impl Into<String>) -> Self {
        Self {
            verb,
            argument: argument.into(),
        }
    }

    pub fn bare(verb: Verb) -> Self {
        Self::new(verb, String::new())
    }

    /// Wire form: `VERB` or `VERB ARGUMENT`.
    pub fn line(&self) -> String {
        if self.argument.is_empty() {
            self.verb.as_str().to_string()
        } else {
            format!("{} {}", self.verb, self.argument)
        }
    }
}

/// What the server makes of a received line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Command(Command),
    /// Nothing but padding; ignored silently.
    Empty,
    Unknown(String),
}

impl Request {
    /// Exact, case-sensitive match against the canonical forms.
    pub fn from_line(line: &str) -> Request {
        if line.trim().is_empty() {
            return Request::Empty;
        }
        if line == verb::LIST {
            return Request::Command(Command::bare(Verb::List));
        }
        if line == verb::EXIT {
            return Request::Command(Command::bare(Verb::Exit));
        }
        if let Some(name) = strip_verb(line, verb::UPLOAD) {
            return Request::Command(Command::new(Verb::Upload, name));
        }
        if let Some(name) = strip_verb(line, verb::DOWNLOAD) {
            return Request::Command(Command::new(Verb::Download, name));
        }
        Request::Unknown(line.to_string())
    }
}

// `VERB <rest>`: the verb followed by a single space
fn strip_verb<'a>(line: &'a str, verb: &str) -> Option<&'a str> {
    line.strip_prefix(verb)?.strip_prefix(' ')
}

/// What the client makes of a typed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Blank,
    Command(Command),
    /// UPLOAD/DOWNLOAD typed without a file name.
    MissingArgument(Verb),
    Invalid(String),
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim_end_matches(['\r', '\n']).trim();
    if line.is_empty() {
        return Input::Blank;
    }
    let (word, argument) = line.split_once(' ').unwrap_or((line, ""));
    let Some(verb) = Verb::parse(word) else {
        return Input::Invalid(word.to_string());
    };
    if !verb.takes_argument() {
        return Input::Command(Command::bare(verb));
    }
    if argument.trim().is_empty() {
        return Input::MissingArgument(verb);
    }
    Input::Command(Command::new(verb, argument))
}
