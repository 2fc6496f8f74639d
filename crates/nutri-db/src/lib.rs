//! # nutri-db
//!
//! Local persistence for the nutri resolution core: user overrides, the
//! barcode result cache, and the search result cache.
//!
//! Uses the `libsql` crate (v0.9.29) against a single local database file.
//! [`NutriDb`] is the libSQL-backed store; [`MemoryStore`] keeps the same
//! state in process memory. Both implement [`FoodStore`], which is what the
//! orchestrators depend on.

pub mod error;
pub mod helpers;
pub mod memory;
mod migrations;
pub mod repos;
pub mod store;

#[cfg(test)]
mod test_support;

pub use error::DatabaseError;
pub use memory::MemoryStore;
pub use store::FoodStore;

use libsql::Builder;

/// libSQL database handle holding the override and cache tables.
pub struct NutriDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl NutriDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Creates parent directories for file paths and runs migrations.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created, the
    /// database cannot be opened, or migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        if path != ":memory:" {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DatabaseError::Other(anyhow::anyhow!(
                            "create database directory {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
        }
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        let nutri_db = Self { db, conn };
        nutri_db.run_migrations().await?;
        tracing::debug!(path, "opened nutri store");
        Ok(nutri_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }
}

impl std::fmt::Debug for NutriDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NutriDb").finish_non_exhaustive()
    }
}
