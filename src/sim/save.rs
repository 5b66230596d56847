/// Per-user progress records.
///
/// ## What is stored
///
///   The level index, plus a snapshot of the token grid at save time.
///   On load only the level index is used: the level restarts from its
///   initial layout and the snapshot is discarded.
///
/// ## File format
///   Key-value lines. Snapshot data follows `has_snapshot=1`.
///
///   ```text
///   level=2
///   has_snapshot=1
///   width=7
///   height=7
///   token_row=
///   token_row=  @ B
///   ...
///   ```
///
/// Records live in a `ProgressStore`, one slot per user. `FileStore` keeps
/// each slot in `<user>_progress.dat` under the save directory.

#[cfg(test)]
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use crate::domain::grid::Grid;
use crate::domain::tile::Token;
use crate::error::SaveError;
use crate::sim::session::Session;

// ══════════════════════════════════════════════════════════════
// Public types
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressRecord {
    pub level: usize,
    pub snapshot: Option<Grid<Token>>,
}

/// A user-keyed slot store for serialized records.
pub trait ProgressStore {
    /// `Ok(None)` when the user has no record.
    fn read(&self, user: &str) -> io::Result<Option<String>>;
    /// Replace the user's record.
    fn write(&mut self, user: &str, content: &str) -> io::Result<()>;
}

// ══════════════════════════════════════════════════════════════
// Save / load
// ══════════════════════════════════════════════════════════════

/// Persist the session's progress for `user`. Guests cannot save.
pub fn save_progress(
    store: &mut dyn ProgressStore,
    user: Option<&str>,
    session: &Session,
) -> Result<(), SaveError> {
    let user = user.ok_or(SaveError::Unauthenticated)?;
    let record = ProgressRecord {
        level: session.current_level_number(),
        snapshot: Some(session.state().tokens().clone()),
    };
    store.write(user, &serialize(&record))?;
    log::info!("saved progress for {user}: level {}", record.level + 1);
    Ok(())
}

/// Fetch `user`'s record. Missing user, missing record, unreadable slot and
/// unparsable content all come back as `None`.
pub fn load_progress(store: &dyn ProgressStore, user: Option<&str>) -> Option<ProgressRecord> {
    let user = user?;
    let content = match store.read(user) {
        Ok(Some(c)) => c,
        Ok(None) => {
            log::debug!("no saved progress for {user}");
            return None;
        }
        Err(e) => {
            log::warn!("could not read progress for {user}: {e}");
            return None;
        }
    };
    let record = parse_record(&content);
    if record.is_none() {
        log::warn!("progress record for {user} is unreadable; ignoring it");
    }
    record
}

// ══════════════════════════════════════════════════════════════
// Stores
// ══════════════════════════════════════════════════════════════

/// One file per user in a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    fn path_for(&self, user: &str) -> PathBuf {
        self.dir.join(format!("{}_progress.dat", escape_user(user)))
    }
}

impl ProgressStore for FileStore {
    fn read(&self, user: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(user)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, user: &str, content: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(user), content)
    }
}

/// In-memory slots; nothing survives the process.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
impl ProgressStore for MemoryStore {
    fn read(&self, user: &str) -> io::Result<Option<String>> {
        Ok(self.slots.get(user).cloned())
    }

    fn write(&mut self, user: &str, content: &str) -> io::Result<()> {
        self.slots.insert(user.to_string(), content.to_string());
        Ok(())
    }
}

/// Map a user name onto a filename stem. `[A-Za-z0-9_-]` pass through;
/// every other byte becomes `%XX`, so distinct names never collide.
fn escape_user(user: &str) -> String {
    let mut out = String::with_capacity(user.len());
    for b in user.bytes() {
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

fn serialize(record: &ProgressRecord) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(&format!("level={}\n", record.level));

    if let Some(snap) = &record.snapshot {
        out.push_str("has_snapshot=1\n");
        out.push_str(&format!("width={}\n", snap.cols()));
        out.push_str(&format!("height={}\n", snap.rows()));
        for r in 0..snap.rows() {
            let s: String = snap.row(r).iter().map(|t| t.to_char()).collect();
            out.push_str(&format!("token_row={}\n", s));
        }
    }

    out
}

fn parse_record(content: &str) -> Option<ProgressRecord> {
    let mut level = None;
    let mut has_snapshot = false;
    let mut width: usize = 0;
    let mut height: usize = 0;
    let mut rows: Vec<Vec<Token>> = vec![];

    for line in content.lines() {
        // token rows keep their spaces, so only strip line endings here
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(val) = line.strip_prefix("level=") {
            level = val.trim().parse().ok();
        } else if line.trim() == "has_snapshot=1" {
            has_snapshot = true;
        } else if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("token_row=") {
            // Writers may strip trailing spaces; pad back to `width`.
            let row: Option<Vec<Token>> = val
                .chars()
                .chain(std::iter::repeat(' '))
                .take(width.max(val.chars().count()))
                .map(Token::from_char)
                .collect();
            match row {
                Some(r) => rows.push(r),
                None => has_snapshot = false,
            }
        }
    }

    let snapshot = if has_snapshot && rows.len() == height {
        Grid::from_rows(rows).filter(|g| g.cols() == width)
    } else {
        None
    };

    Some(ProgressRecord { level: level?, snapshot })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sim::level::Catalog;

    /// A store whose every read and write fails, like an unwritable save dir.
    pub(crate) struct FailingStore;

    impl ProgressStore for FailingStore {
        fn read(&self, _user: &str) -> io::Result<Option<String>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read denied"))
        }

        fn write(&mut self, _user: &str, _content: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "write denied"))
        }
    }

    fn session(user: Option<&str>) -> Session {
        Session::new(Catalog::embedded().unwrap(), user.map(String::from)).unwrap()
    }

    #[test]
    fn write_failure_is_reported_as_io() {
        let mut store = FailingStore;
        let s = session(Some("dora"));
        let err = save_progress(&mut store, Some("dora"), &s).unwrap_err();
        assert!(matches!(err, SaveError::Io(ref e) if e.kind() == io::ErrorKind::PermissionDenied));
    }

    #[test]
    fn read_failure_loads_nothing() {
        assert_eq!(load_progress(&FailingStore, Some("dora")), None);
    }

    #[test]
    fn guest_cannot_save_and_nothing_is_written() {
        let mut store = MemoryStore::new();
        let s = session(None);
        let err = save_progress(&mut store, None, &s).unwrap_err();
        assert!(matches!(err, SaveError::Unauthenticated));
        assert!(store.is_empty());
    }

    #[test]
    fn guest_load_is_none() {
        let mut store = MemoryStore::new();
        store.write("alice", "level=1\n").unwrap();
        assert_eq!(load_progress(&store, None), None);
    }

    #[test]
    fn unknown_user_load_is_none() {
        let store = MemoryStore::new();
        assert_eq!(load_progress(&store, Some("nobody")), None);
    }

    #[test]
    fn save_writes_level_and_snapshot() {
        let mut store = MemoryStore::new();
        let s = session(Some("alice"));
        save_progress(&mut store, Some("alice"), &s).unwrap();

        let record = load_progress(&store, Some("alice")).unwrap();
        assert_eq!(record.level, 0);
        assert_eq!(record.snapshot.as_ref(), Some(s.state().tokens()));
    }

    #[test]
    fn later_save_overwrites_earlier() {
        let mut store = MemoryStore::new();
        store.write("bob", "level=3\n").unwrap();
        let s = session(Some("bob"));
        save_progress(&mut store, Some("bob"), &s).unwrap();
        assert_eq!(load_progress(&store, Some("bob")).unwrap().level, 0);
    }

    #[test]
    fn record_without_level_is_rejected() {
        assert_eq!(parse_record("has_snapshot=1\n"), None);
        assert_eq!(parse_record("level=abc\n"), None);
    }

    #[test]
    fn record_without_snapshot_parses() {
        assert_eq!(
            parse_record("level=4\n"),
            Some(ProgressRecord { level: 4, snapshot: None }),
        );
    }

    #[test]
    fn trimmed_token_rows_are_padded() {
        let record = parse_record("level=0\nhas_snapshot=1\nwidth=3\nheight=2\ntoken_row= @\ntoken_row=B\n").unwrap();
        let snap = record.snapshot.unwrap();
        assert_eq!(snap.dims(), (2, 3));
        assert_eq!(snap.row(0), &[Token::Empty, Token::Player, Token::Empty]);
        assert_eq!(snap.row(1), &[Token::Box, Token::Empty, Token::Empty]);
    }

    #[test]
    fn bad_snapshot_is_dropped_but_level_kept() {
        let record = parse_record("level=2\nhas_snapshot=1\nwidth=2\nheight=1\ntoken_row=?!\n").unwrap();
        assert_eq!(record.level, 2);
        assert_eq!(record.snapshot, None);
    }

    #[test]
    fn escape_user_is_filename_safe() {
        assert_eq!(escape_user("alice_01-x"), "alice_01-x");
        assert_eq!(escape_user("../etc"), "%2E%2E%2Fetc");
        assert_eq!(escape_user("a b"), "a%20b");
        assert_ne!(escape_user("a%20b"), escape_user("a b"));
    }

    #[test]
    fn file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("sokoterm-save-test-{}", std::process::id()));
        let mut store = FileStore::new(dir.clone());
        assert_eq!(store.read("carol").unwrap(), None);

        store.write("carol", "level=2\n").unwrap();
        assert_eq!(store.read("carol").unwrap().as_deref(), Some("level=2\n"));
        assert!(dir.join("carol_progress.dat").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
