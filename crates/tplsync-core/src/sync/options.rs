//! Per-run sync options

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::report::FileProgress;

type Clock<'a> = Box<dyn Fn() -> DateTime<Utc> + 'a>;
type ProgressCallback<'a> = Box<dyn FnMut(&FileProgress) + 'a>;

/// Options for one [`super::SyncEngine::sync`] run
pub struct SyncOptions<'a> {
    /// Directory relative rule paths resolve against
    pub root_dir: PathBuf,

    /// Lock file location, `<root>/tplsync.lock` when unset
    pub lock_path: Option<PathBuf>,

    /// Merge mode applied to every rule, ahead of the rule's own value
    pub mode_override: Option<String>,

    /// Backup strategy applied to every rule, ahead of the rule's own value
    pub backup_override: Option<String>,

    /// Classify only; write no targets, backups or lock file
    pub dry_run: bool,

    /// Profile whose rules are appended after the base rules
    pub profile: Option<String>,

    clock: Option<Clock<'a>>,
    on_file: Option<ProgressCallback<'a>>,
}

impl<'a> SyncOptions<'a> {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            lock_path: None,
            mode_override: None,
            backup_override: None,
            dry_run: false,
            profile: None,
            clock: None,
            on_file: None,
        }
    }

    pub fn lock_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_path = Some(path.into());
        self
    }

    pub fn mode_override(mut self, mode: impl Into<String>) -> Self {
        self.mode_override = Some(mode.into());
        self
    }

    pub fn backup_override(mut self, backup: impl Into<String>) -> Self {
        self.backup_override = Some(backup.into());
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Use `clock` for backup names and lock timestamps
    pub fn clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'a) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Call `callback` after each rule is processed
    pub fn on_file(mut self, callback: impl FnMut(&FileProgress) + 'a) -> Self {
        self.on_file = Some(Box::new(callback));
        self
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        match &self.clock {
            Some(clock) => clock(),
            None => Utc::now(),
        }
    }

    pub(crate) fn notify(&mut self, progress: &FileProgress) {
        if let Some(callback) = self.on_file.as_mut() {
            callback(progress);
        }
    }
}

impl fmt::Debug for SyncOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOptions")
            .field("root_dir", &self.root_dir)
            .field("lock_path", &self.lock_path)
            .field("mode_override", &self.mode_override)
            .field("backup_override", &self.backup_override)
            .field("dry_run", &self.dry_run)
            .field("profile", &self.profile)
            .field("clock", &self.clock.is_some())
            .field("on_file", &self.on_file.is_some())
            .finish()
    }
}
