//! Reply texts shared by the server and client.
//!
//! Replies carry no status code: the text itself is the outcome. Keeping the
//! strings in one place lets the client recognise the few replies it reacts
//! to, and lets tests assert on them without copying literals around.

use super::frame::MAX_FRAMED_STRING_LEN;

/// Room kept at the end of a cut listing for its `... (N more)` line.
const MORE_LINES_RESERVE: usize = 32;

/// Prefix for every broadcast delivered through the roster.
pub const BROADCAST_PREFIX: &str = "[SERVER]";

pub const UNRECOGNIZED_COMMAND: &str = "Unrecognized command!";
pub const CATALOGUE_NOT_FOUND: &str = "Haven't found any catalogue with given name";
pub const NO_CATALOGUE_SELECTED: &str = "No catalogues chosen yet!";
pub const NO_DIRECTORY_SELECTED: &str = "No directory selected yet!";
pub const NO_FILE_FOUND: &str = "No such file found.";
pub const EMPTY_CATALOGUE: &str = "No files in catalogue.";
pub const PATH_NOT_A_FILE: &str = "Provided path doesn't contain any files";
pub const FILE_RECEIVED: &str = "File sent successfully";
pub const FILE_ALREADY_EXISTS: &str = "This file already exists!";
pub const INVALID_FILE_NAME: &str = "Invalid file name!";
pub const STORE_FAILED: &str = "Could not store the file on the server!";

/// Greeting sent right after a connection is accepted.
pub fn greeting(display_name: &str) -> String {
    format!("Hello, {display_name}")
}

/// Confirmation for a successful `use`.
pub fn catalogue_selected(name: &str) -> String {
    format!("Successfully updated current catalogue. Current catalogue is: {name}")
}

/// Trailer line of the `catalogs` listing when a catalogue is selected.
pub fn current_catalogue(name: &str) -> String {
    format!("current catalog: {name}")
}

/// One `search` hit.
pub fn search_hit(file_name: &str, path: &std::path::Path) -> String {
    format!("found {file_name} on path: {}", path.display())
}

/// Wraps `message` the way broadcasts appear on the wire.
pub fn broadcast(message: &str) -> String {
    format!("{BROADCAST_PREFIX} {message}")
}

pub fn user_connected(display_name: &str) -> String {
    format!("New user connected: {display_name}")
}

pub fn user_disconnected(display_name: &str) -> String {
    format!("User disconnected: {display_name}")
}

/// Last line of a listing that was cut to fit one frame.
pub fn more_lines(count: usize) -> String {
    format!("... ({count} more)")
}

/// Joins `lines` with newlines into a reply that always fits one frame.
///
/// When the full listing is too long, lines are kept from the front and the
/// rest are counted in a final [`more_lines`] line.
pub fn listing<S: AsRef<str>>(lines: &[S]) -> String {
    let full_len: usize = lines.iter().map(|l| l.as_ref().len() + 1).sum();
    if full_len.saturating_sub(1) <= MAX_FRAMED_STRING_LEN {
        let parts: Vec<&str> = lines.iter().map(|l| l.as_ref()).collect();
        return parts.join("\n");
    }

    let budget = MAX_FRAMED_STRING_LEN - MORE_LINES_RESERVE;
    let mut text = String::new();
    let mut kept = 0;
    for line in lines {
        let line = line.as_ref();
        let separator = usize::from(kept > 0);
        if text.len() + separator + line.len() > budget {
            break;
        }
        if kept > 0 {
            text.push('\n');
        }
        text.push_str(line);
        kept += 1;
    }
    if kept > 0 {
        text.push('\n');
    }
    text.push_str(&more_lines(lines.len() - kept));
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_prefixes_server_tag() {
        assert_eq!(
            broadcast(&user_connected("Client_3")),
            "[SERVER] New user connected: Client_3"
        );
    }

    #[test]
    fn test_search_hit_includes_absolute_path() {
        let line = search_hit("a.txt", std::path::Path::new("/srv/docs/a.txt"));
        assert_eq!(line, "found a.txt on path: /srv/docs/a.txt");
    }

    #[test]
    fn test_listing_joins_short_lists_unchanged() {
        assert_eq!(listing(&["a.txt", "b.txt"]), "a.txt\nb.txt");
        assert_eq!(listing::<&str>(&[]), "");
    }

    #[test]
    fn test_listing_cuts_long_lists_to_one_frame() {
        // Arrange: 1200 lines of 65 bytes, well past the frame limit
        let lines: Vec<String> = (0..1200).map(|i| format!("{i:0>65}")).collect();

        // Act
        let text = listing(&lines);

        // Assert
        assert!(text.len() <= MAX_FRAMED_STRING_LEN);
        let kept = text.lines().count() - 1;
        assert_eq!(text.lines().next(), Some(lines[0].as_str()));
        assert_eq!(text.lines().last(), Some(more_lines(1200 - kept).as_str()));
    }

    #[test]
    fn test_listing_with_single_oversized_line_counts_it() {
        let huge = "x".repeat(MAX_FRAMED_STRING_LEN + 1);

        assert_eq!(listing(&[huge]), "... (1 more)");
    }
}
