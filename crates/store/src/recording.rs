//! In-memory [`AclSystem`] that records every call it receives.
//!
//! Tests seed files with [`RecordingSystem::with_file`], script failures with
//! [`RecordingSystem::fail_next`], run store operations, and inspect
//! [`RecordingSystem::calls`] to check which native calls were made.

use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use codec::{ExtendedCodec, NativeCodec, PosixAcl, PosixCodec};
use platform::ExtendedAce;

use crate::system::{AclSystem, FileStat};

/// Native call observed by a [`RecordingSystem`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Op {
    /// [`AclSystem::stat`].
    Stat,
    /// [`AclSystem::read`].
    Read,
    /// [`AclSystem::write_access`].
    WriteAccess,
    /// [`AclSystem::write_default`].
    WriteDefault,
    /// [`AclSystem::remove_default`].
    RemoveDefault,
}

impl Op {
    /// Returns `true` for calls that change the filesystem.
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        matches!(self, Self::WriteAccess | Self::WriteDefault | Self::RemoveDefault)
    }
}

/// How a native structure splits into the parts the store writes separately.
pub trait RecordedRaw: Clone + Default {
    /// Replaces the access part of `self` with that of `from`.
    fn store_access(&mut self, from: &Self);
    /// Replaces the default part of `self` with that of `from`.
    fn store_default(&mut self, from: &Self);
    /// Drops the default part.
    fn drop_default(&mut self);
    /// Permission bits an access write leaves on the file, or `None` when the
    /// write does not touch them.
    fn written_mode(&self) -> Option<u32>;
    /// Refreshes the structure with the file's current permission bits.
    fn sync_mode(&mut self, mode: u32);
}

impl RecordedRaw for PosixAcl {
    fn store_access(&mut self, from: &Self) {
        self.access.clone_from(&from.access);
        self.mode = from.mode;
    }

    fn store_default(&mut self, from: &Self) {
        self.default.clone_from(&from.default);
    }

    fn drop_default(&mut self) {
        self.default = None;
    }

    fn written_mode(&self) -> Option<u32> {
        Some(self.mode)
    }

    fn sync_mode(&mut self, mode: u32) {
        self.mode = mode;
    }
}

impl RecordedRaw for Vec<ExtendedAce> {
    fn store_access(&mut self, from: &Self) {
        self.clone_from(from);
    }

    fn store_default(&mut self, _from: &Self) {}

    fn drop_default(&mut self) {}

    fn written_mode(&self) -> Option<u32> {
        None
    }

    fn sync_mode(&mut self, _mode: u32) {}
}

struct Recorded<R> {
    files: BTreeMap<PathBuf, (FileStat, R)>,
    calls: Vec<(Op, PathBuf)>,
    failures: VecDeque<(Op, io::ErrorKind)>,
}

/// Recording double for [`AclSystem`], generic over the codec it serves.
pub struct RecordingSystem<C: NativeCodec> {
    state: Mutex<Recorded<C::Raw>>,
    codec: PhantomData<C>,
}

/// Recording double with POSIX semantics.
pub type RecordingPosix = RecordingSystem<PosixCodec>;

/// Recording double with macOS extended semantics.
pub type RecordingExtended = RecordingSystem<ExtendedCodec>;

impl<C> RecordingSystem<C>
where
    C: NativeCodec,
    C::Raw: RecordedRaw,
{
    /// Creates a system with no files.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Recorded {
                files: BTreeMap::new(),
                calls: Vec::new(),
                failures: VecDeque::new(),
            }),
            codec: PhantomData,
        }
    }

    /// Adds a file whose ACL is derived from `mode`.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, mode: u32, is_dir: bool) -> Self {
        let stat = FileStat {
            mode,
            uid: 0,
            gid: 0,
            is_dir,
        };
        self.lock().files.insert(path.into(), (stat, C::Raw::default()));
        self
    }

    /// Adds a file with an explicit native ACL.
    #[must_use]
    pub fn with_native(self, path: impl Into<PathBuf>, stat: FileStat, raw: C::Raw) -> Self {
        self.lock().files.insert(path.into(), (stat, raw));
        self
    }

    /// Makes the next call of kind `op` fail with `kind`. Scripted failures
    /// are consumed in order.
    pub fn fail_next(&self, op: Op, kind: io::ErrorKind) {
        self.lock().failures.push_back((op, kind));
    }

    /// Returns every call made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<(Op, PathBuf)> {
        self.lock().calls.clone()
    }

    /// Returns the kinds of calls made so far.
    #[must_use]
    pub fn ops(&self) -> Vec<Op> {
        self.lock().calls.iter().map(|(op, _)| *op).collect()
    }

    /// Counts calls that changed the filesystem, including failed ones.
    #[must_use]
    pub fn mutations(&self) -> usize {
        self.lock().calls.iter().filter(|(op, _)| op.is_mutating()).count()
    }

    /// Returns the stored native ACL of `path`.
    #[must_use]
    pub fn native(&self, path: &Path) -> Option<C::Raw> {
        self.lock().files.get(path).map(|(_, raw)| raw.clone())
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Recorded<C::Raw>> {
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn enter(&self, op: Op, path: &Path) -> io::Result<MutexGuard<'_, Recorded<C::Raw>>> {
        let mut state = self.lock();
        state.calls.push((op, path.to_path_buf()));
        let scripted = state
            .failures
            .iter()
            .position(|(failing, _)| *failing == op)
            .and_then(|position| state.failures.remove(position));
        match scripted {
            Some((_, kind)) => Err(io::Error::from(kind)),
            None => Ok(state),
        }
    }

    fn with_file_mut<T>(
        &self,
        op: Op,
        path: &Path,
        action: impl FnOnce(&mut FileStat, &mut C::Raw) -> T,
    ) -> io::Result<T> {
        let mut state = self.enter(op, path)?;
        let (stat, raw) = state
            .files
            .get_mut(path)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        Ok(action(stat, raw))
    }
}

impl<C> Default for RecordingSystem<C>
where
    C: NativeCodec,
    C::Raw: RecordedRaw,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C> AclSystem for RecordingSystem<C>
where
    C: NativeCodec,
    C::Raw: RecordedRaw,
{
    type Codec = C;

    const SEPARATE_DEFAULT: bool = matches!(C::LAYOUT, model::Layout::Posix1e);

    fn stat(&self, path: &Path, _follow_symlinks: bool) -> io::Result<FileStat> {
        self.with_file_mut(Op::Stat, path, |stat, _| *stat)
    }

    fn read(&self, path: &Path, _stat: &FileStat, _follow: bool) -> io::Result<C::Raw> {
        self.with_file_mut(Op::Read, path, |stat, raw| {
            let mut raw = raw.clone();
            raw.sync_mode(stat.mode & 0o777);
            raw
        })
    }

    fn write_access(&self, path: &Path, raw: &C::Raw, _follow: bool) -> io::Result<()> {
        self.with_file_mut(Op::WriteAccess, path, |stat, stored| {
            stored.store_access(raw);
            if let Some(mode) = raw.written_mode() {
                stat.mode = (stat.mode & !0o777) | (mode & 0o777);
            }
        })
    }

    fn write_default(&self, path: &Path, raw: &C::Raw, _follow: bool) -> io::Result<()> {
        self.with_file_mut(Op::WriteDefault, path, |_, stored| stored.store_default(raw))
    }

    fn remove_default(&self, path: &Path, _follow: bool) -> io::Result<()> {
        self.with_file_mut(Op::RemoveDefault, path, |_, stored| stored.drop_default())
    }
}
