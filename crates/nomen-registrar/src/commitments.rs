use std::path::Path;

use nomen_core::constants::{DEFAULT_MIN_COMMITMENT_AGE_SECS, DEFAULT_MIN_NAME_LENGTH};
use nomen_core::error::RegistryError;
use nomen_core::types::{CommitmentId, Timestamp};

/// Persistent commitment table plus registrar configuration, backed by sled.
///
/// Trees:
///   commitments — CommitmentId bytes → i64 big-endian commit timestamp
///   config      — utf8 key bytes     → big-endian integer
///
/// At most one live (hash → timestamp) pair exists per hash; a second
/// commit before consumption fails. Commitments carry no payment and no
/// name binding beyond the hash itself.
pub struct CommitmentStore {
    _db: sled::Db,
    commitments: sled::Tree,
    config: sled::Tree,
}

fn storage_err(e: impl std::fmt::Display) -> RegistryError {
    RegistryError::Storage(e.to_string())
}

impl CommitmentStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let db = sled::open(path).map_err(storage_err)?;
        let commitments = db.open_tree("commitments").map_err(storage_err)?;
        let config = db.open_tree("config").map_err(storage_err)?;
        Ok(Self { _db: db, commitments, config })
    }

    // ── Commitments ──────────────────────────────────────────────────────────

    pub fn get(&self, id: &CommitmentId) -> Result<Option<Timestamp>, RegistryError> {
        match self.commitments.get(id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes);
                Ok(Some(Timestamp::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    /// Store `(id, now)`; fails if an unconsumed commitment already exists.
    pub fn insert_new(&self, id: &CommitmentId, now: Timestamp) -> Result<(), RegistryError> {
        if self.get(id)?.is_some() {
            return Err(RegistryError::CommitmentExists);
        }
        self.commitments
            .insert(id.as_bytes(), now.to_be_bytes().as_ref())
            .map_err(storage_err)?;
        Ok(())
    }

    /// Consume a commitment. Removing an absent id is a no-op.
    pub fn remove(&self, id: &CommitmentId) -> Result<(), RegistryError> {
        self.commitments.remove(id.as_bytes()).map_err(storage_err)?;
        Ok(())
    }

    // ── Configuration ────────────────────────────────────────────────────────

    pub fn min_commitment_age(&self) -> Result<Timestamp, RegistryError> {
        match self.config.get(b"min_commitment_age").map_err(storage_err)? {
            Some(bytes) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes);
                Ok(Timestamp::from_be_bytes(arr))
            }
            None => Ok(DEFAULT_MIN_COMMITMENT_AGE_SECS),
        }
    }

    pub fn set_min_commitment_age(&self, secs: Timestamp) -> Result<(), RegistryError> {
        self.config
            .insert(b"min_commitment_age", secs.to_be_bytes().as_ref())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn min_length(&self) -> Result<usize, RegistryError> {
        match self.config.get(b"min_length").map_err(storage_err)? {
            Some(bytes) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes);
                Ok(u64::from_be_bytes(arr) as usize)
            }
            None => Ok(DEFAULT_MIN_NAME_LENGTH),
        }
    }

    pub fn set_min_length(&self, len: usize) -> Result<(), RegistryError> {
        self.config
            .insert(b"min_length", (len as u64).to_be_bytes().as_ref())
            .map_err(storage_err)?;
        Ok(())
    }
}
