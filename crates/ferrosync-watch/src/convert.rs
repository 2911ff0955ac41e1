//! Conversion of notify events into ferrosync change events

use ferrosync_types::{ChangeEvent, ChangeKind, EntryType};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Translates notify events for one watched root
///
/// Deleted and moved-away entries are gone from disk, so the translator
/// remembers every directory it has seen under the root and answers from that
/// set instead.
#[derive(Debug, Default)]
pub struct EventTranslator {
    recursive: bool,
    known_dirs: HashSet<PathBuf>,
}

impl EventTranslator {
    /// Translator that knows no directories yet
    pub fn new(recursive: bool) -> Self {
        Self {
            recursive,
            known_dirs: HashSet::new(),
        }
    }

    /// Translator seeded with the directories currently under `root`
    pub fn seeded(root: &Path, recursive: bool) -> Self {
        let mut translator = Self::new(recursive);
        translator.remember_tree(root);
        translator
    }

    /// Whether `path` is remembered as a directory
    pub fn is_known_dir(&self, path: &Path) -> bool {
        self.known_dirs.contains(path)
    }

    /// Translate one notify event into zero or more change events
    ///
    /// Access notifications and backend-specific `Other` events carry no
    /// change to sync and produce nothing.
    pub fn translate(&mut self, event: &Event) -> Vec<ChangeEvent> {
        match event.kind {
            EventKind::Create(kind) => self.per_path(event, ChangeKind::Created, |t, path| {
                match kind {
                    CreateKind::Folder => {
                        t.known_dirs.insert(path.to_path_buf());
                        EntryType::Directory
                    }
                    CreateKind::File => {
                        t.known_dirs.remove(path);
                        EntryType::File
                    }
                    _ => t.observe(path),
                }
            }),
            EventKind::Remove(kind) => self.per_path(event, ChangeKind::Deleted, |t, path| {
                let entry = t.forget(path);
                if kind == RemoveKind::Folder {
                    EntryType::Directory
                } else {
                    entry
                }
            }),
            EventKind::Modify(ModifyKind::Name(mode)) => self.rename(event, mode),
            EventKind::Modify(_) | EventKind::Any => {
                self.per_path(event, ChangeKind::Modified, Self::observe)
            }
            EventKind::Access(_) | EventKind::Other => Vec::new(),
        }
    }

    fn rename(&mut self, event: &Event, mode: RenameMode) -> Vec<ChangeEvent> {
        let tracker = event.tracker();
        let changes = match (mode, event.paths.as_slice()) {
            (RenameMode::Both, [from, to]) => {
                let was_dir = self.forget(from) == EntryType::Directory;
                let entry = if was_dir || to.is_dir() {
                    self.remember_tree(to);
                    EntryType::Directory
                } else {
                    EntryType::File
                };
                vec![ChangeEvent::new(ChangeKind::Moved, entry, from.clone()).with_dest_path(to.clone())]
            }
            (RenameMode::From, _) => self.per_path(event, ChangeKind::Moved, Self::forget),
            (RenameMode::To, _) => self.per_path(event, ChangeKind::Moved, Self::arrive),
            // Backends that cannot tell the halves apart report each path alone
            _ => self.per_path(event, ChangeKind::Moved, |t, path| {
                if path.exists() {
                    t.arrive(path)
                } else {
                    t.forget(path)
                }
            }),
        };

        changes
            .into_iter()
            .map(|change| change.with_tracker(tracker))
            .collect()
    }

    fn per_path<F>(&mut self, event: &Event, kind: ChangeKind, mut entry_of: F) -> Vec<ChangeEvent>
    where
        F: FnMut(&mut Self, &Path) -> EntryType,
    {
        event
            .paths
            .iter()
            .map(|path| ChangeEvent::new(kind, entry_of(self, path), path.clone()))
            .collect()
    }

    /// Probe a path that should still exist, updating the directory set
    fn observe(&mut self, path: &Path) -> EntryType {
        if path.is_dir() {
            self.known_dirs.insert(path.to_path_buf());
            EntryType::Directory
        } else if path.exists() {
            self.known_dirs.remove(path);
            EntryType::File
        } else if self.known_dirs.contains(path) {
            EntryType::Directory
        } else {
            EntryType::File
        }
    }

    /// Like `observe`, but a directory brings its whole subtree along
    fn arrive(&mut self, path: &Path) -> EntryType {
        let entry = self.observe(path);
        if entry == EntryType::Directory {
            self.remember_tree(path);
        }
        entry
    }

    /// Drop `path` and everything under it; returns what it was
    fn forget(&mut self, path: &Path) -> EntryType {
        let was_dir = self.known_dirs.contains(path);
        self.known_dirs.retain(|dir| !dir.starts_with(path));
        if was_dir {
            EntryType::Directory
        } else {
            EntryType::File
        }
    }

    fn remember_tree(&mut self, root: &Path) {
        let walker = if self.recursive {
            WalkDir::new(root)
        } else {
            WalkDir::new(root).max_depth(1)
        };
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_dir() {
                self.known_dirs.insert(entry.into_path());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, DataChange, MetadataKind};
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn event(kind: EventKind, paths: &[&Path]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, path| event.add_path(path.to_path_buf()))
    }

    fn rename(mode: RenameMode, paths: &[&Path], tracker: usize) -> Event {
        event(EventKind::Modify(ModifyKind::Name(mode)), paths).set_tracker(tracker)
    }

    #[rstest]
    #[case(EventKind::Create(CreateKind::File), ChangeKind::Created, EntryType::File)]
    #[case(EventKind::Create(CreateKind::Folder), ChangeKind::Created, EntryType::Directory)]
    #[case(EventKind::Remove(RemoveKind::File), ChangeKind::Deleted, EntryType::File)]
    #[case(EventKind::Remove(RemoveKind::Folder), ChangeKind::Deleted, EntryType::Directory)]
    #[case(EventKind::Remove(RemoveKind::Any), ChangeKind::Deleted, EntryType::File)]
    #[case(
        EventKind::Modify(ModifyKind::Data(DataChange::Content)),
        ChangeKind::Modified,
        EntryType::File
    )]
    #[case(
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
        ChangeKind::Modified,
        EntryType::File
    )]
    #[case(
        EventKind::Modify(ModifyKind::Name(RenameMode::From)),
        ChangeKind::Moved,
        EntryType::File
    )]
    fn test_kind_mapping(
        #[case] kind: EventKind,
        #[case] expected_kind: ChangeKind,
        #[case] expected_entry: EntryType,
    ) {
        let path = Path::new("/nonexistent/repo/a.txt");
        let changes = EventTranslator::new(true).translate(&event(kind, &[path]));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, expected_kind);
        assert_eq!(changes[0].entry_type, expected_entry);
        assert_eq!(changes[0].path, path);
    }

    #[test]
    fn test_access_events_ignored() {
        let mut translator = EventTranslator::new(true);
        let path = Path::new("/nonexistent/repo/a.txt");
        assert!(translator
            .translate(&event(EventKind::Access(AccessKind::Read), &[path]))
            .is_empty());
        assert!(translator.translate(&event(EventKind::Other, &[path])).is_empty());
    }

    #[test]
    fn test_rename_both_carries_destination_and_tracker() {
        let changes = EventTranslator::new(true).translate(&rename(
            RenameMode::Both,
            &[Path::new("/nonexistent/old.txt"), Path::new("/nonexistent/new.txt")],
            7,
        ));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Moved);
        assert_eq!(changes[0].path, PathBuf::from("/nonexistent/old.txt"));
        assert_eq!(changes[0].dest_path, Some(PathBuf::from("/nonexistent/new.txt")));
        assert_eq!(changes[0].tracker, Some(7));
    }

    #[test]
    fn test_modified_directory_is_detected() {
        let temp_dir = TempDir::new().unwrap();

        let changes = EventTranslator::new(true)
            .translate(&event(EventKind::Modify(ModifyKind::Any), &[temp_dir.path()]));
        assert_eq!(changes[0].entry_type, EntryType::Directory);
    }

    #[test]
    fn test_one_change_per_path() {
        let changes = EventTranslator::new(true).translate(&event(
            EventKind::Create(CreateKind::File),
            &[Path::new("/nonexistent/a"), Path::new("/nonexistent/b")],
        ));
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn test_seeded_directories_survive_removal() {
        let temp_dir = TempDir::new().unwrap();
        let gone = temp_dir.path().join("gone");
        let nested = gone.join("inner");
        fs::create_dir_all(&nested).unwrap();

        let mut translator = EventTranslator::seeded(temp_dir.path(), true);
        assert!(translator.is_known_dir(&nested));
        fs::remove_dir_all(&gone).unwrap();

        // the poll watcher cannot say what was removed
        let changes = translator.translate(&event(EventKind::Remove(RemoveKind::Any), &[&gone]));
        assert_eq!(changes[0].entry_type, EntryType::Directory);
        assert!(!translator.is_known_dir(&gone));
        assert!(!translator.is_known_dir(&nested));

        let again = translator.translate(&event(EventKind::Remove(RemoveKind::Any), &[&gone]));
        assert_eq!(again[0].entry_type, EntryType::File);
    }

    #[test]
    fn test_moved_away_directory_keeps_its_type() {
        let temp_dir = TempDir::new().unwrap();
        let old = temp_dir.path().join("olddir");
        let new = temp_dir.path().join("newdir");
        fs::create_dir(&old).unwrap();
        fs::write(old.join("file.txt"), "x").unwrap();

        let mut translator = EventTranslator::seeded(temp_dir.path(), true);
        fs::rename(&old, &new).unwrap();

        let from = translator.translate(&rename(RenameMode::From, &[&old], 3));
        assert_eq!(from[0].entry_type, EntryType::Directory);
        assert_eq!(from[0].tracker, Some(3));

        let to = translator.translate(&rename(RenameMode::To, &[&new], 3));
        assert_eq!(to[0].entry_type, EntryType::Directory);
        assert!(translator.is_known_dir(&new));
        assert!(!translator.is_known_dir(&old));
    }

    #[test]
    fn test_both_moves_subtree() {
        let temp_dir = TempDir::new().unwrap();
        let old = temp_dir.path().join("olddir");
        let new = temp_dir.path().join("newdir");
        fs::create_dir_all(old.join("sub")).unwrap();

        let mut translator = EventTranslator::seeded(temp_dir.path(), true);
        fs::rename(&old, &new).unwrap();

        let changes = translator.translate(&rename(RenameMode::Both, &[&old, &new], 9));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].entry_type, EntryType::Directory);
        assert!(translator.is_known_dir(&new.join("sub")));
        assert!(!translator.is_known_dir(&old.join("sub")));
    }

    #[test]
    fn test_non_recursive_seed_stays_shallow() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let translator = EventTranslator::seeded(temp_dir.path(), false);
        assert!(translator.is_known_dir(&temp_dir.path().join("a")));
        assert!(!translator.is_known_dir(&nested));
    }

    #[test]
    fn test_file_replacing_directory_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("entry");
        fs::create_dir(&path).unwrap();

        let mut translator = EventTranslator::seeded(temp_dir.path(), true);
        fs::remove_dir(&path).unwrap();
        fs::write(&path, "now a file").unwrap();

        let changes = translator.translate(&event(EventKind::Create(CreateKind::Any), &[&path]));
        assert_eq!(changes[0].entry_type, EntryType::File);
        assert!(!translator.is_known_dir(&path));
    }
}
