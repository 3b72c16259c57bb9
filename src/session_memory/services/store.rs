//! Session memory service: start, status, stop and record access.

use crate::session_memory::{
    adapters::sqlite::{OpenMode, SqliteMemoryFile, SqliteStoreError},
    domain::{
        ArchiveFile, LIVE_STORE_FILE, MemoryRecord, SessionDomainError, SessionName,
        SessionState, SessionStatusReport, SessionSummary, archive_file_name, is_archive_name,
    },
};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use chrono::DateTime;
use mockable::Clock;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for session memory operations.
#[derive(Debug, Clone, Error)]
pub enum SessionStoreError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] SessionDomainError),

    /// No directory exists for the session.
    #[error("session '{0}' not found")]
    NotFound(SessionName),

    /// The session exists but has no live store.
    #[error("session '{0}' has no active store")]
    NotActive(SessionName),

    /// The named archive does not exist in the session directory.
    #[error("archive '{archive}' not found for session '{session}'")]
    ArchiveNotFound {
        /// Session name.
        session: SessionName,
        /// Archive file name.
        archive: String,
    },

    /// A store could not be read as a session database.
    #[error("session store is unreadable: {0}")]
    StoreCorruption(SqliteStoreError),

    /// Filesystem operation failed.
    #[error("session filesystem operation failed at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        source: Arc<io::Error>,
    },

    /// Persistence failed outside of a corrupt-store condition.
    #[error("session persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SessionStoreError {
    fn io(path: &Utf8Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_owned(),
            source: Arc::new(source),
        }
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Result type for session memory operations.
pub type SessionStoreResult<T> = Result<T, SessionStoreError>;

/// Durable per-session record store rooted at one directory.
///
/// Layout: `<root>/<session>/memory.db` while active, plus
/// `memory_<unix seconds>[_<n>].db.bak` archives. `SQLite` work runs on the
/// blocking pool.
///
/// A session is owned by one writer at a time. Concurrent writers to the
/// same session, from this process or another, are not supported.
#[derive(Debug)]
pub struct SessionMemoryStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    root: Utf8PathBuf,
    clock: Arc<C>,
}

impl<C> Clone for SessionMemoryStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> SessionMemoryStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Creates a store rooted at `root`. Nothing is created until a session
    /// starts.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>, clock: Arc<C>) -> Self {
        Self {
            root: root.into(),
            clock,
        }
    }

    /// Returns the session root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    async fn run_blocking<F, T>(&self, operation: F) -> SessionStoreResult<T>
    where
        F: FnOnce(&Self) -> SessionStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || operation(&store))
            .await
            .map_err(SessionStoreError::persistence)?
    }

    /// Starts `name`, creating its directory and live store if needed.
    ///
    /// Starting an active session is a no-op. Starting an archived session
    /// creates a fresh live store beside its archives. When initialisation
    /// fails, anything this call created is removed again.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError`] for invalid names, filesystem failures
    /// or when the store cannot be initialised.
    pub async fn start(&self, name: &str) -> SessionStoreResult<Utf8PathBuf> {
        let session = SessionName::new(name)?;
        self.run_blocking(move |store| store.start_blocking(&session))
            .await
    }

    fn start_blocking(&self, session: &SessionName) -> SessionStoreResult<Utf8PathBuf> {
        Dir::create_ambient_dir_all(&self.root, ambient_authority())
            .map_err(|err| SessionStoreError::io(&self.root, err))?;
        let root = self.open_root()?;

        let session_path = self.root.join(session.as_str());
        let created_dir = !root
            .try_exists(session.as_str())
            .map_err(|err| SessionStoreError::io(&session_path, err))?;
        if created_dir {
            root.create_dir(session.as_str())
                .map_err(|err| SessionStoreError::io(&session_path, err))?;
        }

        let store_path = session_path.join(LIVE_STORE_FILE);
        let relative_store = Utf8Path::new(session.as_str()).join(LIVE_STORE_FILE);
        let created_store = !root
            .try_exists(&relative_store)
            .map_err(|err| SessionStoreError::io(&store_path, err))?;
        let initialised = SqliteMemoryFile::open(&store_path, OpenMode::Create)
            .and_then(|mut file| file.initialise());

        if let Err(err) = initialised {
            warn!(session = %session, error = %err, "session store initialisation failed");
            if created_dir {
                if let Err(cleanup) = root.remove_dir_all(session.as_str()) {
                    warn!(session = %session, error = %cleanup, "failed to remove session directory");
                }
            } else if created_store
                && let Err(cleanup) = root.remove_file(&relative_store)
            {
                warn!(session = %session, error = %cleanup, "failed to remove partial store");
            }
            return Err(SessionStoreError::persistence(err));
        }

        if created_store {
            info!(session = %session, path = %store_path, "session started");
        } else {
            debug!(session = %session, "session already active");
        }
        Ok(store_path)
    }

    /// Summarises every session under the root.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::StoreCorruption`] when a live store cannot
    /// be read, or [`SessionStoreError::Io`] for filesystem failures.
    pub async fn status(&self) -> SessionStoreResult<SessionStatusReport> {
        self.run_blocking(Self::status_blocking).await
    }

    fn status_blocking(&self) -> SessionStoreResult<SessionStatusReport> {
        let root = match Dir::open_ambient_dir(&self.root, ambient_authority()) {
            Ok(root) => root,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(SessionStatusReport::NoSessions);
            }
            Err(err) => return Err(SessionStoreError::io(&self.root, err)),
        };

        let mut summaries = Vec::new();
        for session in session_directories(&root, &self.root)? {
            summaries.push(self.summarise(&root, session)?);
        }

        if summaries.is_empty() {
            return Ok(SessionStatusReport::NoSessions);
        }
        Ok(SessionStatusReport::Sessions(summaries))
    }

    fn summarise(&self, root: &Dir, session: SessionName) -> SessionStoreResult<SessionSummary> {
        let session_path = self.root.join(session.as_str());
        let directory = root
            .open_dir(session.as_str())
            .map_err(|err| SessionStoreError::io(&session_path, err))?;
        let archives = archive_names(&directory, &session_path)?;

        let store_path = session_path.join(LIVE_STORE_FILE);
        let has_live_store = directory
            .try_exists(LIVE_STORE_FILE)
            .map_err(|err| SessionStoreError::io(&store_path, err))?;
        if !has_live_store {
            return Ok(SessionSummary {
                name: session,
                state: SessionState::Archived,
                record_count: None,
                archives,
            });
        }

        let record_count = SqliteMemoryFile::open(&store_path, OpenMode::ReadOnly)
            .and_then(|mut file| file.count())
            .map_err(SessionStoreError::StoreCorruption)?;
        Ok(SessionSummary {
            name: session,
            state: SessionState::Active,
            record_count: Some(record_count),
            archives,
        })
    }

    /// Stops `name` by renaming its live store to a timestamped archive.
    ///
    /// The archive is named `memory_<unix seconds>.db.bak`; when that name is
    /// taken, `memory_<unix seconds>_<n>.db.bak` with the smallest free `n`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::NotFound`] for unknown sessions and
    /// [`SessionStoreError::NotActive`] when no live store exists; neither
    /// has side effects.
    pub async fn stop(&self, name: &str) -> SessionStoreResult<ArchiveFile> {
        let session = SessionName::new(name)?;
        self.run_blocking(move |store| store.stop_blocking(session))
            .await
    }

    fn stop_blocking(&self, session: SessionName) -> SessionStoreResult<ArchiveFile> {
        let directory = self.open_active_session(&session)?;
        let seconds = self.clock.utc().timestamp();

        let mut counter = None;
        let mut candidate = archive_file_name(seconds, counter);
        let session_path = self.root.join(session.as_str());
        while directory
            .try_exists(&candidate)
            .map_err(|err| SessionStoreError::io(&session_path, err))?
        {
            let next = counter.map_or(1, |n: u32| n.saturating_add(1));
            counter = Some(next);
            candidate = archive_file_name(seconds, counter);
        }

        let archive = ArchiveFile::new(session, candidate)?;
        directory
            .rename(LIVE_STORE_FILE, &directory, archive.file_name())
            .map_err(|err| SessionStoreError::io(&session_path.join(LIVE_STORE_FILE), err))?;
        info!(session = %archive.session(), archive = %archive.file_name(), "session archived");
        Ok(archive)
    }

    /// Appends a record to the live store of `name`, stamped with the
    /// current time at millisecond precision.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::NotFound`] or
    /// [`SessionStoreError::NotActive`] when the session cannot accept
    /// records, or a persistence error when the insert fails.
    pub async fn append(
        &self,
        name: &str,
        role: &str,
        content: &str,
    ) -> SessionStoreResult<MemoryRecord> {
        let session = SessionName::new(name)?;
        let millis = self.clock.utc().timestamp_millis();
        let timestamp = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            SessionStoreError::persistence(io::Error::other("clock out of range"))
        })?;
        let record = MemoryRecord {
            timestamp,
            role: role.to_owned(),
            content: content.to_owned(),
        };

        self.run_blocking(move |store| {
            store.open_active_session(&session)?;
            let mut file = SqliteMemoryFile::open(&store.live_store_path(&session), OpenMode::ReadWrite)
                .map_err(SessionStoreError::persistence)?;
            file.insert(&record).map_err(SessionStoreError::persistence)?;
            debug!(session = %session, role = %record.role, "record appended");
            Ok(record)
        })
        .await
    }

    /// Returns the records of the live store of `name` in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::NotFound`] or
    /// [`SessionStoreError::NotActive`] when no live store exists, and
    /// [`SessionStoreError::StoreCorruption`] when it cannot be read.
    pub async fn records(&self, name: &str) -> SessionStoreResult<Vec<MemoryRecord>> {
        let session = SessionName::new(name)?;
        self.run_blocking(move |store| {
            store.open_active_session(&session)?;
            read_records(&store.live_store_path(&session))
        })
        .await
    }

    /// Returns the records held in an archive of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::NotFound`] for unknown sessions,
    /// [`SessionStoreError::ArchiveNotFound`] for missing archives and
    /// [`SessionStoreError::StoreCorruption`] when the archive is unreadable.
    pub async fn archived_records(
        &self,
        name: &str,
        archive: &str,
    ) -> SessionStoreResult<Vec<MemoryRecord>> {
        let session = SessionName::new(name)?;
        let archive_file = ArchiveFile::new(session, archive)?;
        self.run_blocking(move |store| {
            let owner = archive_file.session();
            let owner_path = store.root.join(owner.as_str());
            let directory = store.open_session(owner)?;
            let present = directory
                .try_exists(archive_file.file_name())
                .map_err(|err| SessionStoreError::io(&owner_path, err))?;
            if !present {
                return Err(SessionStoreError::ArchiveNotFound {
                    session: owner.clone(),
                    archive: archive_file.file_name().to_owned(),
                });
            }
            read_records(&owner_path.join(archive_file.file_name()))
        })
        .await
    }

    fn open_root(&self) -> SessionStoreResult<Dir> {
        Dir::open_ambient_dir(&self.root, ambient_authority())
            .map_err(|err| SessionStoreError::io(&self.root, err))
    }

    fn open_session(&self, session: &SessionName) -> SessionStoreResult<Dir> {
        let root = match Dir::open_ambient_dir(&self.root, ambient_authority()) {
            Ok(root) => root,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(SessionStoreError::NotFound(session.clone()));
            }
            Err(err) => return Err(SessionStoreError::io(&self.root, err)),
        };
        match root.open_dir(session.as_str()) {
            Ok(directory) => Ok(directory),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(SessionStoreError::NotFound(session.clone()))
            }
            Err(err) => Err(SessionStoreError::io(
                &self.root.join(session.as_str()),
                err,
            )),
        }
    }

    fn open_active_session(&self, session: &SessionName) -> SessionStoreResult<Dir> {
        let directory = self.open_session(session)?;
        let active = directory
            .try_exists(LIVE_STORE_FILE)
            .map_err(|err| SessionStoreError::io(&self.live_store_path(session), err))?;
        if !active {
            return Err(SessionStoreError::NotActive(session.clone()));
        }
        Ok(directory)
    }

    fn live_store_path(&self, session: &SessionName) -> Utf8PathBuf {
        self.root.join(session.as_str()).join(LIVE_STORE_FILE)
    }
}

fn read_records(path: &Utf8Path) -> SessionStoreResult<Vec<MemoryRecord>> {
    SqliteMemoryFile::open(path, OpenMode::ReadOnly)
        .and_then(|mut file| file.records())
        .map_err(SessionStoreError::StoreCorruption)
}

/// Lists session directories under the root, sorted by name.
///
/// Entries that are not directories or whose names are not valid session
/// names are ignored.
fn session_directories(root: &Dir, root_path: &Utf8Path) -> SessionStoreResult<Vec<SessionName>> {
    let mut sessions = Vec::new();
    for listed in root
        .entries()
        .map_err(|err| SessionStoreError::io(root_path, err))?
    {
        let entry = listed.map_err(|err| SessionStoreError::io(root_path, err))?;
        if !entry.file_type().is_ok_and(|kind| kind.is_dir()) {
            continue;
        }
        let Ok(file_name) = entry.file_name() else {
            continue;
        };
        match SessionName::new(file_name.clone()) {
            Ok(session) if session.as_str() == file_name => sessions.push(session),
            _ => debug!(entry = %file_name, "ignoring non-session directory"),
        }
    }
    sessions.sort();
    Ok(sessions)
}

fn archive_names(directory: &Dir, path: &Utf8Path) -> SessionStoreResult<Vec<String>> {
    let mut archives = Vec::new();
    for listed in directory
        .entries()
        .map_err(|err| SessionStoreError::io(path, err))?
    {
        let entry = listed.map_err(|err| SessionStoreError::io(path, err))?;
        if let Ok(file_name) = entry.file_name()
            && is_archive_name(&file_name)
        {
            archives.push(file_name);
        }
    }
    archives.sort();
    Ok(archives)
}
