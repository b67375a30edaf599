//! Per-session command dispatch.
//!
//! `ClientSession` owns everything one connected client can change: the
//! currently selected catalogue and the last few commands it issued. It
//! turns each incoming command line into an [`Action`] for the network
//! layer to carry out, and never touches the socket itself.
//!
//! # Phases
//!
//! ```text
//!   Connected ──greet()──▶ Active ──"bye"──▶ Closing ──mark_closed()──▶ Closed
//!                            │                  ▲
//!                            └──read failure────┘   (driven by the network layer)
//! ```
//!
//! Browsing commands (`catalogs`, `use`, `currcat_files`, `files`, `search`)
//! are answered entirely here. `send` needs more bytes from the connection,
//! so it is returned as [`Action::ReceiveFile`] carrying the destination the
//! upload should land in.

use std::sync::{Arc, Mutex, PoisonError};

use filehub_core::domain::{CatalogueEntry, CatalogueRegistry, CommandHistory};
use filehub_core::protocol::{replies, split_command, Command};
use tracing::debug;

use super::roster::{SessionProfile, SharedHistory};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Accepted, greeting not yet sent.
    Connected,
    /// Serving commands.
    Active,
    /// `bye` received or the connection failed; cleanup pending.
    Closing,
    /// Unregistered and released.
    Closed,
}

/// What the network layer must do after a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send this text back to the client.
    Reply(String),
    /// Run the upload sub-protocol. `None` means no catalogue is selected.
    ReceiveFile { destination: Option<CatalogueEntry> },
    /// End the session without a reply.
    Close,
}

/// State of one connected client.
pub struct ClientSession {
    profile: SessionProfile,
    catalogs: Arc<CatalogueRegistry>,
    current: Option<CatalogueEntry>,
    history: SharedHistory,
    phase: SessionPhase,
}

impl ClientSession {
    pub fn new(profile: SessionProfile, catalogs: Arc<CatalogueRegistry>) -> Self {
        Self {
            profile,
            catalogs,
            current: None,
            history: Arc::new(Mutex::new(CommandHistory::new())),
            phase: SessionPhase::Connected,
        }
    }

    pub fn profile(&self) -> &SessionProfile {
        &self.profile
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_catalogue(&self) -> Option<&CatalogueEntry> {
        self.current.as_ref()
    }

    /// Handle to this session's history, for the roster.
    pub fn history(&self) -> SharedHistory {
        Arc::clone(&self.history)
    }

    /// Recorded command lines, oldest first.
    pub fn recent_commands(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries()
    }

    /// Moves to `Active` and returns the greeting to send.
    pub fn greet(&mut self) -> String {
        self.phase = SessionPhase::Active;
        replies::greeting(&self.profile.display_name)
    }

    /// Interprets one command line.
    ///
    /// Recognized commands are recorded before they run; unrecognized ones
    /// are answered and forgotten.
    pub fn handle_line(&mut self, line: &str) -> Action {
        if self.phase != SessionPhase::Active {
            return Action::Close;
        }

        let Some(command) = Command::parse(&split_command(line)) else {
            debug!("{}: unrecognized line {line:?}", self.profile.display_name);
            return Action::Reply(replies::UNRECOGNIZED_COMMAND.to_string());
        };

        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(line);

        self.execute(command)
    }

    /// Marks cleanup as finished.
    pub fn mark_closed(&mut self) {
        self.phase = SessionPhase::Closed;
    }

    /// Moves to `Closing` after a connection failure.
    pub fn begin_closing(&mut self) {
        if self.phase != SessionPhase::Closed {
            self.phase = SessionPhase::Closing;
        }
    }

    fn execute(&mut self, command: Command) -> Action {
        match command {
            Command::Bye => {
                self.phase = SessionPhase::Closing;
                Action::Close
            }
            Command::Catalogs => Action::Reply(self.catalogue_listing()),
            Command::Use(name) => match self.catalogs.resolve(&name) {
                Some(entry) => {
                    self.current = Some(entry.clone());
                    Action::Reply(replies::catalogue_selected(&name))
                }
                None => Action::Reply(replies::CATALOGUE_NOT_FOUND.to_string()),
            },
            Command::CurrentCatalogFiles => match &self.current {
                Some(entry) => Action::Reply(self.file_listing(entry)),
                None => Action::Reply(replies::NO_CATALOGUE_SELECTED.to_string()),
            },
            Command::Files(name) => match self.catalogs.resolve(&name) {
                Some(entry) => Action::Reply(self.file_listing(entry)),
                None => Action::Reply(replies::CATALOGUE_NOT_FOUND.to_string()),
            },
            Command::Search(file_name) => match &self.current {
                Some(entry) => Action::Reply(self.search_listing(entry, &file_name)),
                None => Action::Reply(replies::NO_CATALOGUE_SELECTED.to_string()),
            },
            Command::Send => Action::ReceiveFile {
                destination: self.current.clone(),
            },
        }
    }

    fn catalogue_listing(&self) -> String {
        let mut lines: Vec<String> = self
            .catalogs
            .list_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        lines.push(match &self.current {
            Some(entry) => replies::current_catalogue(&entry.name),
            None => replies::NO_DIRECTORY_SELECTED.to_string(),
        });
        replies::listing(&lines)
    }

    fn file_listing(&self, entry: &CatalogueEntry) -> String {
        let files = self.catalogs.list_files(entry);
        if files.is_empty() {
            replies::EMPTY_CATALOGUE.to_string()
        } else {
            replies::listing(&files)
        }
    }

    fn search_listing(&self, entry: &CatalogueEntry, file_name: &str) -> String {
        let hits = self.catalogs.search(entry, file_name);
        if hits.is_empty() {
            return replies::NO_FILE_FOUND.to_string();
        }
        let lines: Vec<String> = hits
            .iter()
            .map(|hit| replies::search_hit(&hit.file_name, &hit.path))
            .collect();
        replies::listing(&lines)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use filehub_core::protocol::frame::MAX_FRAMED_STRING_LEN;
    use std::net::SocketAddr;
    use tempfile::TempDir;
    use uuid::Uuid;

    struct Fixture {
        _dirs: Vec<TempDir>,
        registry: Arc<CatalogueRegistry>,
    }

    /// Two catalogues: `A` with `x.txt` twice (top level and nested), `B` empty.
    fn make_fixture() -> Fixture {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        std::fs::write(a.path().join("x.txt"), b"top").unwrap();
        std::fs::create_dir(a.path().join("sub")).unwrap();
        std::fs::write(a.path().join("sub").join("x.txt"), b"nested")
            .unwrap();
        std::fs::write(a.path().join("y.txt"), b"other").unwrap();
        let registry = CatalogueRegistry::from_pairs([("A", a.path()), ("B", b.path())]);
        Fixture {
            _dirs: vec![a, b],
            registry: Arc::new(registry),
        }
    }

    fn make_session(registry: &Arc<CatalogueRegistry>) -> ClientSession {
        let profile = SessionProfile {
            id: Uuid::new_v4(),
            display_name: "Client_1".to_string(),
            peer: SocketAddr::from(([127, 0, 0, 1], 50_000)),
            connected_at: Utc::now(),
        };
        let mut session = ClientSession::new(profile, Arc::clone(registry));
        session.greet();
        session
    }

    fn reply(action: Action) -> String {
        match action {
            Action::Reply(text) => text,
            other => panic!("expected a reply, got {other:?}"),
        }
    }

    #[test]
    fn test_greet_moves_to_active() {
        let fixture = make_fixture();
        let profile = SessionProfile {
            id: Uuid::new_v4(),
            display_name: "Client_9".to_string(),
            peer: SocketAddr::from(([127, 0, 0, 1], 1)),
            connected_at: Utc::now(),
        };
        let mut session = ClientSession::new(profile, fixture.registry);
        assert_eq!(session.phase(), SessionPhase::Connected);

        assert_eq!(session.greet(), "Hello, Client_9");
        assert_eq!(session.phase(), SessionPhase::Active);
    }

    #[test]
    fn test_catalogs_before_use_reports_no_directory() {
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);

        let text = reply(session.handle_line("catalogs"));

        assert_eq!(text, "A\nB\nNo directory selected yet!");
    }

    #[test]
    fn test_use_then_catalogs_reports_current() {
        // Arrange
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);

        // Act
        let selected = reply(session.handle_line("use A"));
        let listing = reply(session.handle_line("catalogs"));

        // Assert
        assert_eq!(
            selected,
            "Successfully updated current catalogue. Current catalogue is: A"
        );
        assert_eq!(listing.lines().last(), Some("current catalog: A"));
    }

    #[test]
    fn test_use_unknown_leaves_selection_unchanged() {
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);
        session.handle_line("use A");

        let text = reply(session.handle_line("use Missing"));

        assert_eq!(text, replies::CATALOGUE_NOT_FOUND);
        assert_eq!(
            session.current_catalogue().map(|c| c.name.as_str()),
            Some("A")
        );
    }

    #[test]
    fn test_currcat_files_before_use() {
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);
        assert_eq!(
            reply(session.handle_line("currcat_files")),
            replies::NO_CATALOGUE_SELECTED
        );
    }

    #[test]
    fn test_search_before_use() {
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);
        assert_eq!(
            reply(session.handle_line("search x.txt")),
            replies::NO_CATALOGUE_SELECTED
        );
    }

    #[test]
    fn test_currcat_files_lists_nested_files() {
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);
        session.handle_line("use A");

        let text = reply(session.handle_line("currcat_files"));

        let mut names: Vec<&str> = text.lines().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["x.txt", "x.txt", "y.txt"]);
    }

    #[test]
    fn test_files_of_empty_catalogue() {
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);
        assert_eq!(
            reply(session.handle_line("files B")),
            replies::EMPTY_CATALOGUE
        );
    }

    #[test]
    fn test_files_of_huge_catalogue_fits_one_frame() {
        // Arrange: 1200 files with 65-character names
        let big = TempDir::new().unwrap();
        for i in 0..1200 {
            std::fs::write(big.path().join(format!("{i:0>61}.bin")), b"")
                .unwrap();
        }
        let registry = Arc::new(CatalogueRegistry::from_pairs([("big", big.path())]));
        let mut session = make_session(&registry);

        // Act
        let text = reply(session.handle_line("files big"));

        // Assert
        assert!(text.len() <= MAX_FRAMED_STRING_LEN);
        assert!(text.lines().last().unwrap().ends_with(" more)"));
    }

    #[test]
    fn test_files_of_unknown_catalogue() {
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);
        assert_eq!(
            reply(session.handle_line("files Nope")),
            replies::CATALOGUE_NOT_FOUND
        );
    }

    #[test]
    fn test_search_reports_every_match_with_absolute_path() {
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);
        session.handle_line("use A");

        let text = reply(session.handle_line("search x.txt"));

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let root = fixture
            .registry
            .resolve("A")
            .unwrap()
            .root
            .display()
            .to_string();
        assert!(lines
            .iter()
            .all(|l| l.starts_with("found x.txt on path: ") && l.contains(&root)));
    }

    #[test]
    fn test_search_without_match() {
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);
        session.handle_line("use A");
        assert_eq!(
            reply(session.handle_line("search missing.bin")),
            replies::NO_FILE_FOUND
        );
    }

    #[test]
    fn test_unrecognized_is_not_recorded() {
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);

        let text = reply(session.handle_line("dance now"));

        assert_eq!(text, replies::UNRECOGNIZED_COMMAND);
        assert!(session.recent_commands().is_empty());
    }

    #[test]
    fn test_history_keeps_last_three_lines_in_order() {
        // Arrange
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);

        // Act
        for line in ["catalogs", "use A", "files A", "search x.txt"] {
            session.handle_line(line);
        }

        // Assert
        assert_eq!(
            session.recent_commands(),
            vec!["use A", "files A", "search x.txt"]
        );
    }

    #[test]
    fn test_history_is_shared_with_roster_handle() {
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);
        let handle = session.history();

        session.handle_line("catalogs");

        assert_eq!(handle.lock().unwrap().entries(), vec!["catalogs"]);
    }

    #[test]
    fn test_send_without_catalogue_has_no_destination() {
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);
        assert_eq!(
            session.handle_line("send /tmp/a.txt"),
            Action::ReceiveFile { destination: None }
        );
    }

    #[test]
    fn test_send_targets_current_catalogue() {
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);
        session.handle_line("use B");

        let action = session.handle_line("send /tmp/a.txt");

        let expected = fixture.registry.resolve("B").cloned();
        assert_eq!(action, Action::ReceiveFile { destination: expected });
    }

    #[test]
    fn test_bye_closes_and_is_recorded() {
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);

        assert_eq!(session.handle_line("bye"), Action::Close);
        assert_eq!(session.phase(), SessionPhase::Closing);
        assert_eq!(session.recent_commands(), vec!["bye"]);
    }

    #[test]
    fn test_lines_after_closing_are_ignored() {
        let fixture = make_fixture();
        let mut session = make_session(&fixture.registry);
        session.handle_line("bye");

        assert_eq!(session.handle_line("catalogs"), Action::Close);
        session.mark_closed();
        assert_eq!(session.phase(), SessionPhase::Closed);
    }
}
