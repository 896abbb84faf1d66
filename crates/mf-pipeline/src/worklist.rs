//! The worklist: pending conversion jobs for one session.
//!
//! Jobs are kept in insertion order and are unique by their identity key (the
//! case-insensitive absolute source path). Once the list is non-empty every
//! job shares the active [`MediaKind`]. When the list is empty, the first
//! valid file decides the kind.
//!
//! The worklist is owned by the caller and mutated from a single thread; it
//! must not change while a batch built from it is running.

use std::path::{Component, Path, PathBuf};

use mf_core::{classify, ClassificationMismatch, MediaKind};

use crate::observer::{Observers, SubscriptionId};

/// Normalized identity of a source path: absolute, with `.` and `..`
/// resolved lexically, then lowercased.
///
/// Symlinks are not followed, so a link and its target stay distinct.
pub fn identity_key(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized.to_string_lossy().to_lowercase()
}

/// A pending conversion of one source file. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    source_path: PathBuf,
    kind: MediaKind,
    key: String,
}

impl Job {
    /// Create a job for `source_path` classified as `kind`.
    pub fn new(source_path: impl Into<PathBuf>, kind: MediaKind) -> Self {
        let source_path = source_path.into();
        let key = identity_key(&source_path);
        Self {
            source_path,
            kind,
            key,
        }
    }

    /// The source file, as supplied by the caller.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// The media kind of the source.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Identity key used for deduplication and removal.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Result of [`Worklist::try_add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The file matched the active kind and was appended.
    Accepted,
    /// The list was empty, so the file's kind became the active kind.
    AcceptedWithKindSwitch {
        /// Previous active kind.
        from: MediaKind,
        /// New active kind.
        to: MediaKind,
    },
    /// A job with the same identity key already exists. Not an error.
    RejectedDuplicate,
    /// The file is not of a usable kind.
    Rejected(ClassificationMismatch),
}

impl AddOutcome {
    /// Whether a job was appended.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted | Self::AcceptedWithKindSwitch { .. })
    }
}

/// Aggregate of a [`Worklist::add_all`] call, for a single user notice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    /// Number of jobs appended.
    pub accepted: usize,
    /// Number of silently ignored duplicates.
    pub duplicates: usize,
    /// Set when the first accepted file switched the active kind.
    pub switched_to: Option<MediaKind>,
    /// Files that were rejected, in input order.
    pub rejected: Vec<ClassificationMismatch>,
}

impl AddReport {
    /// Whether any file was discarded because of its kind.
    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Result of [`Worklist::select_input_kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindSelection {
    /// The requested kind was already active.
    Unchanged,
    /// The list was empty; the kind changed without prompting.
    Switched,
    /// The user confirmed; existing jobs were discarded and the kind changed.
    Cleared {
        /// Number of jobs discarded.
        discarded: usize,
    },
    /// The user refused; the previous kind stays active.
    Reverted,
}

/// Yes/no collaborator asked before a kind change discards pending jobs.
///
/// Closures of the form `|current, requested, pending| -> bool` implement it.
pub trait ConfirmClear {
    /// Return `true` to discard `pending` jobs of kind `current` and switch
    /// to `requested`.
    fn confirm_clear(&self, current: MediaKind, requested: MediaKind, pending: usize) -> bool;
}

impl<F> ConfirmClear for F
where
    F: Fn(MediaKind, MediaKind, usize) -> bool,
{
    fn confirm_clear(&self, current: MediaKind, requested: MediaKind, pending: usize) -> bool {
        self(current, requested, pending)
    }
}

/// Ordered, deduplicated collection of pending jobs.
#[derive(Debug)]
pub struct Worklist {
    jobs: Vec<Job>,
    active_kind: MediaKind,
    observers: Observers<usize>,
}

impl Default for Worklist {
    fn default() -> Self {
        Self::new(MediaKind::Image)
    }
}

impl Worklist {
    /// Create an empty worklist expecting files of `kind`.
    pub fn new(kind: MediaKind) -> Self {
        Self {
            jobs: Vec::new(),
            active_kind: kind,
            observers: Observers::new(),
        }
    }

    /// The kind new files must match.
    pub fn active_kind(&self) -> MediaKind {
        self.active_kind
    }

    /// Number of pending jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no jobs are pending.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Read-only view of the jobs in insertion order.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Owned copy of the jobs in insertion order.
    pub fn snapshot(&self) -> Vec<Job> {
        self.jobs.clone()
    }

    /// Whether a job with the same identity as `path` is present.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        let key = identity_key(path.as_ref());
        self.jobs.iter().any(|job| job.key == key)
    }

    /// Register a callback receiving the job count after every mutation.
    pub fn subscribe(
        &mut self,
        callback: impl Fn(usize) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn changed(&self) {
        self.observers.notify(self.jobs.len());
    }

    /// Change the active kind.
    ///
    /// A non-empty list holding another kind is only cleared if `confirm`
    /// agrees; otherwise the current kind stays active.
    pub fn select_input_kind(
        &mut self,
        kind: MediaKind,
        confirm: &dyn ConfirmClear,
    ) -> KindSelection {
        if kind == self.active_kind {
            return KindSelection::Unchanged;
        }

        if self.jobs.is_empty() {
            self.active_kind = kind;
            return KindSelection::Switched;
        }

        let pending = self.jobs.len();
        if confirm.confirm_clear(self.active_kind, kind, pending) {
            tracing::debug!("Discarding {pending} {} jobs for {kind}", self.active_kind);
            self.jobs.clear();
            self.active_kind = kind;
            self.changed();
            KindSelection::Cleared { discarded: pending }
        } else {
            KindSelection::Reverted
        }
    }

    /// Classify `path` and append it if it fits.
    pub fn try_add(&mut self, path: impl AsRef<Path>) -> AddOutcome {
        let path = path.as_ref();

        let Some(kind) = classify(path) else {
            return AddOutcome::Rejected(ClassificationMismatch::UnknownExtension {
                path: path.to_path_buf(),
            });
        };

        let mut outcome = AddOutcome::Accepted;
        if kind != self.active_kind {
            if !self.jobs.is_empty() {
                return AddOutcome::Rejected(ClassificationMismatch::KindMismatch {
                    path: path.to_path_buf(),
                    expected: self.active_kind,
                    found: kind,
                });
            }
            outcome = AddOutcome::AcceptedWithKindSwitch {
                from: self.active_kind,
                to: kind,
            };
            self.active_kind = kind;
        }

        let job = Job::new(path, kind);
        if self.jobs.iter().any(|existing| existing.key == job.key) {
            return AddOutcome::RejectedDuplicate;
        }

        self.jobs.push(job);
        self.changed();
        outcome
    }

    /// Add several paths, collecting the outcomes into one report.
    pub fn add_all<I, P>(&mut self, paths: I) -> AddReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut report = AddReport::default();
        for path in paths {
            match self.try_add(path) {
                AddOutcome::Accepted => report.accepted += 1,
                AddOutcome::AcceptedWithKindSwitch { to, .. } => {
                    report.accepted += 1;
                    report.switched_to = Some(to);
                }
                AddOutcome::RejectedDuplicate => report.duplicates += 1,
                AddOutcome::Rejected(mismatch) => report.rejected.push(mismatch),
            }
        }
        report
    }

    /// Remove the job with identity `key`. No-op if absent.
    pub fn remove(&mut self, key: &str) -> Option<Job> {
        let index = self.jobs.iter().position(|job| job.key == key)?;
        let job = self.jobs.remove(index);
        self.changed();
        Some(job)
    }

    /// Remove the job for `path`, matched case-insensitively.
    pub fn remove_path(&mut self, path: impl AsRef<Path>) -> Option<Job> {
        self.remove(&identity_key(path.as_ref()))
    }

    /// Discard every job. The active kind is kept.
    pub fn clear(&mut self) {
        self.jobs.clear();
        self.changed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    fn names(list: &Worklist) -> Vec<String> {
        list.jobs()
            .iter()
            .map(|j| j.source_path().file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn never(_: MediaKind, _: MediaKind, _: usize) -> bool {
        panic!("confirmation should not be requested")
    }

    #[test]
    fn duplicates_are_ignored_in_order() {
        let mut list = Worklist::new(MediaKind::Image);
        assert_eq!(list.try_add("a.png"), AddOutcome::Accepted);
        assert_eq!(list.try_add("b.jpg"), AddOutcome::Accepted);
        assert_eq!(list.try_add("a.png"), AddOutcome::RejectedDuplicate);
        assert_eq!(names(&list), ["a.png", "b.jpg"]);
    }

    #[test]
    fn identity_key_resolves_dot_segments() {
        assert_eq!(identity_key(Path::new("dir/../a.png")), identity_key(Path::new("a.png")));
        assert_eq!(identity_key(Path::new("./b/./c.jpg")), identity_key(Path::new("b/c.jpg")));
        assert_ne!(identity_key(Path::new("x/a.png")), identity_key(Path::new("a.png")));

        let mut list = Worklist::new(MediaKind::Image);
        list.try_add("/photos/raw/../Beach.png");
        assert_eq!(list.try_add("/photos/beach.PNG"), AddOutcome::RejectedDuplicate);
    }

    #[test]
    fn duplicate_detection_is_case_insensitive() {
        let mut list = Worklist::new(MediaKind::Image);
        list.try_add("/photos/Holiday.PNG");
        assert_eq!(list.try_add("/PHOTOS/holiday.png"), AddOutcome::RejectedDuplicate);
        assert_eq!(list.len(), 1);
        assert!(list.contains("/photos/HOLIDAY.png"));
    }

    #[test]
    fn first_file_decides_kind() {
        let mut list = Worklist::new(MediaKind::Audio);
        assert_eq!(
            list.try_add("clip.mp4"),
            AddOutcome::AcceptedWithKindSwitch {
                from: MediaKind::Audio,
                to: MediaKind::Video,
            }
        );
        assert_eq!(list.active_kind(), MediaKind::Video);

        match list.try_add("song.mp3") {
            AddOutcome::Rejected(ClassificationMismatch::KindMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, MediaKind::Video);
                assert_eq!(found, MediaKind::Audio);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn unknown_extension_rejected_even_when_empty() {
        let mut list = Worklist::new(MediaKind::Image);
        assert!(matches!(
            list.try_add("notes.txt"),
            AddOutcome::Rejected(ClassificationMismatch::UnknownExtension { .. })
        ));
        assert!(list.is_empty());
        assert_eq!(list.active_kind(), MediaKind::Image);
    }

    #[test]
    fn accepted_kinds_always_match_active_kind() {
        let mut list = Worklist::new(MediaKind::Image);
        let inputs = [
            "x.wav", "y.png", "z.flac", "w.mkv", "v.ogg", "u.txt", "x.WAV", "t.wma",
        ];
        for p in inputs {
            list.try_add(p);
        }
        assert_eq!(list.active_kind(), MediaKind::Audio);
        assert!(list.jobs().iter().all(|j| j.kind() == list.active_kind()));
        let keys: HashSet<&str> = list.jobs().iter().map(Job::key).collect();
        assert_eq!(keys.len(), list.len());
        assert_eq!(names(&list), ["x.wav", "z.flac", "v.ogg", "t.wma"]);
    }

    #[test]
    fn select_kind_on_empty_list_switches_without_prompt() {
        let mut list = Worklist::new(MediaKind::Image);
        assert_eq!(list.select_input_kind(MediaKind::Image, &never), KindSelection::Unchanged);
        assert_eq!(list.select_input_kind(MediaKind::Video, &never), KindSelection::Switched);
        assert_eq!(list.active_kind(), MediaKind::Video);
    }

    #[test]
    fn select_kind_confirmed_clears() {
        let mut list = Worklist::new(MediaKind::Image);
        list.add_all(["a.png", "b.gif"]);

        let asked = Arc::new(Mutex::new(None));
        let a = Arc::clone(&asked);
        let confirm = move |current: MediaKind, requested: MediaKind, pending: usize| {
            *a.lock().unwrap() = Some((current, requested, pending));
            true
        };

        assert_eq!(
            list.select_input_kind(MediaKind::Audio, &confirm),
            KindSelection::Cleared { discarded: 2 }
        );
        assert!(list.is_empty());
        assert_eq!(list.active_kind(), MediaKind::Audio);
        assert_eq!(
            *asked.lock().unwrap(),
            Some((MediaKind::Image, MediaKind::Audio, 2))
        );
    }

    #[test]
    fn select_kind_refused_reverts() {
        let mut list = Worklist::new(MediaKind::Image);
        list.try_add("a.png");
        let refuse = |_: MediaKind, _: MediaKind, _: usize| false;
        assert_eq!(list.select_input_kind(MediaKind::Video, &refuse), KindSelection::Reverted);
        assert_eq!(list.active_kind(), MediaKind::Image);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn remove_by_key_and_path() {
        let mut list = Worklist::new(MediaKind::Image);
        list.add_all(["a.png", "b.png", "c.png"]);

        let key = list.jobs()[1].key().to_string();
        let removed = list.remove(&key).unwrap();
        assert_eq!(removed.source_path(), Path::new("b.png"));
        assert!(list.remove(&key).is_none());

        assert!(list.remove_path("A.PNG").is_some());
        assert_eq!(names(&list), ["c.png"]);
    }

    #[test]
    fn every_mutation_notifies_count() {
        let counts = Arc::new(Mutex::new(Vec::new()));
        let mut list = Worklist::new(MediaKind::Image);
        let c = Arc::clone(&counts);
        let id = list.subscribe(move |n| c.lock().unwrap().push(n));

        list.try_add("a.png");
        list.try_add("b.png");
        list.try_add("a.png"); // duplicate: no mutation
        list.try_add("c.mp3"); // mismatch: no mutation
        list.remove_path("a.png");
        list.remove_path("missing.png"); // no-op
        list.clear();

        assert_eq!(*counts.lock().unwrap(), vec![1, 2, 1, 0]);

        assert!(list.unsubscribe(id));
        list.try_add("d.png");
        assert_eq!(counts.lock().unwrap().len(), 4);
    }

    #[test]
    fn add_all_reports_rejections() {
        let mut list = Worklist::new(MediaKind::Image);
        let report = list.add_all(["a.mp3", "b.wav", "c.png", "b.wav", "d.doc"]);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.switched_to, Some(MediaKind::Audio));
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].path(), Path::new("c.png"));
        assert!(report.has_rejections());
    }

    #[test]
    fn identity_key_is_absolute_and_lowercase() {
        let key = identity_key(Path::new("Some/Dir/File.PNG"));
        assert!(Path::new(&key).is_absolute());
        assert!(key.ends_with("some/dir/file.png") || key.ends_with("some\\dir\\file.png"));
    }
}
