//! Service layer hosting all change-log operations.
//!
//! `TallyService` wraps `TallyDb` (raw database access) and carries the
//! read-side defaults. All repo methods are implemented as
//! `impl TallyService` blocks under `repos/`.

use tally_config::TallyConfig;

use crate::TallyDb;
use crate::error::DatabaseError;

/// Default page size when neither the filter nor the config sets one.
const DEFAULT_PER_PAGE: u32 = 25;

/// Orchestrates ledger writes, snapshot collection, propagation, and reads.
///
/// Explicitly constructed at the composition root and passed to mutation
/// handlers — the store handle is never process-global.
pub struct TallyService {
    db: TallyDb,
    default_per_page: u32,
}

impl TallyService {
    /// Create a new service wrapping a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` — Path to the libSQL database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = TallyDb::open_local(db_path).await?;
        Ok(Self {
            db,
            default_per_page: DEFAULT_PER_PAGE,
        })
    }

    /// Create a service from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn from_config(config: &TallyConfig) -> Result<Self, DatabaseError> {
        let db = TallyDb::open_local(&config.database.path).await?;
        Ok(Self {
            db,
            default_per_page: config.general.per_page,
        })
    }

    /// Create from an existing `TallyDb` (for testing).
    #[must_use]
    pub const fn from_db(db: TallyDb) -> Self {
        Self {
            db,
            default_per_page: DEFAULT_PER_PAGE,
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &TallyDb {
        &self.db
    }

    /// The page size used when a query filter does not set one.
    #[must_use]
    pub const fn default_per_page(&self) -> u32 {
        self.default_per_page
    }
}
