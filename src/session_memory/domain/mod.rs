//! Domain model for session memory.

mod archive;
mod error;
mod name;
mod record;
mod status;

pub use archive::{
    ARCHIVE_PREFIX, ARCHIVE_SUFFIX, ArchiveFile, LIVE_STORE_FILE, archive_file_name,
};
pub(crate) use archive::is_archive_name;
pub use error::SessionDomainError;
pub use name::SessionName;
pub use record::MemoryRecord;
pub use status::{SessionState, SessionStatusReport, SessionSummary};
