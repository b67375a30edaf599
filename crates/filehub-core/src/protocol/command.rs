//! Command-line splitting and the client command vocabulary.
//!
//! Every client turn is one framed string holding the raw command line. The
//! line is split at the first space: everything before it is the command
//! token, everything after it (trimmed) is the single parameter.
//!
//! ```text
//! "files MyDocs"  ->  command = "files", parameter = "MyDocs"
//! "bye"           ->  command = "bye",   parameter = "bye"
//! ```
//!
//! The second case is kept as-is for compatibility with existing clients: a
//! line without a space uses the whole line as both token and parameter.

/// A command line split into its token and parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub command: String,
    pub parameter: String,
}

/// Splits `line` at the first space character.
///
/// # Examples
///
/// ```rust
/// use filehub_core::protocol::command::split_command;
///
/// let line = split_command("search  report.pdf ");
/// assert_eq!(line.command, "search");
/// assert_eq!(line.parameter, "report.pdf");
/// ```
pub fn split_command(line: &str) -> CommandLine {
    match line.find(' ') {
        Some(idx) => CommandLine {
            command: line[..idx].to_string(),
            parameter: line[idx + 1..].trim().to_string(),
        },
        None => CommandLine {
            command: line.to_string(),
            parameter: line.to_string(),
        },
    }
}

/// Commands understood by a client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ends the session.
    Bye,
    /// Lists catalogue names and the current selection.
    Catalogs,
    /// Selects the named catalogue.
    Use(String),
    /// Lists files of the currently selected catalogue.
    CurrentCatalogFiles,
    /// Lists files of the named catalogue.
    Files(String),
    /// Searches the current catalogue for an exact file name.
    Search(String),
    /// Starts the upload sub-protocol; the path follows as a second frame.
    Send,
}

impl Command {
    /// Maps a split line onto a known command. Matching is case-sensitive.
    ///
    /// Returns `None` for unrecognized tokens.
    pub fn parse(line: &CommandLine) -> Option<Self> {
        let command = match line.command.as_str() {
            "bye" => Command::Bye,
            "catalogs" => Command::Catalogs,
            "use" => Command::Use(line.parameter.clone()),
            "currcat_files" => Command::CurrentCatalogFiles,
            "files" => Command::Files(line.parameter.clone()),
            "search" => Command::Search(line.parameter.clone()),
            "send" => Command::Send,
            _ => return None,
        };
        Some(command)
    }

    /// Returns the wire token for this command.
    pub fn token(&self) -> &'static str {
        match self {
            Command::Bye => "bye",
            Command::Catalogs => "catalogs",
            Command::Use(_) => "use",
            Command::CurrentCatalogFiles => "currcat_files",
            Command::Files(_) => "files",
            Command::Search(_) => "search",
            Command::Send => "send",
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
