use std::path::Path;

use nomen_core::error::RegistryError;
use nomen_core::event::Event;
use nomen_core::record::NameRecord;
use nomen_core::types::{Address, LabelId};

/// Persistent registry database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees (analogous to column families):
///   records    — LabelId bytes → bincode(NameRecord)
///   counts     — Address bytes → u64 big-endian (names per owner)
///   approvals  — LabelId bytes → Address bytes (per-name delegate)
///   registrars — Address bytes → [] (membership set)
///   renewers   — Address bytes → [] (membership set)
///   events     — u64 big-endian sequence → bincode(Event)
///   meta       — utf8 key bytes → raw bytes
pub struct RegistryDb {
    _db: sled::Db,
    records: sled::Tree,
    counts: sled::Tree,
    approvals: sled::Tree,
    registrars: sled::Tree,
    renewers: sled::Tree,
    events: sled::Tree,
    meta: sled::Tree,
}

fn storage_err(e: impl std::fmt::Display) -> RegistryError {
    RegistryError::Storage(e.to_string())
}

fn codec_err(e: impl std::fmt::Display) -> RegistryError {
    RegistryError::Serialization(e.to_string())
}

impl RegistryDb {
    /// Open or create the registry database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let db = sled::open(path).map_err(storage_err)?;
        let records    = db.open_tree("records").map_err(storage_err)?;
        let counts     = db.open_tree("counts").map_err(storage_err)?;
        let approvals  = db.open_tree("approvals").map_err(storage_err)?;
        let registrars = db.open_tree("registrars").map_err(storage_err)?;
        let renewers   = db.open_tree("renewers").map_err(storage_err)?;
        let events     = db.open_tree("events").map_err(storage_err)?;
        let meta       = db.open_tree("meta").map_err(storage_err)?;
        Ok(Self { _db: db, records, counts, approvals, registrars, renewers, events, meta })
    }

    // ── Records ──────────────────────────────────────────────────────────────

    pub fn get_record(&self, id: &LabelId) -> Result<Option<NameRecord>, RegistryError> {
        match self.records.get(id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(codec_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_record(&self, record: &NameRecord) -> Result<(), RegistryError> {
        let bytes = bincode::serialize(record).map_err(codec_err)?;
        self.records
            .insert(record.label_id.as_bytes(), bytes)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn remove_record(&self, id: &LabelId) -> Result<(), RegistryError> {
        self.records.remove(id.as_bytes()).map_err(storage_err)?;
        Ok(())
    }

    // ── Per-owner counts ─────────────────────────────────────────────────────

    pub fn count_of(&self, owner: &Address) -> Result<u64, RegistryError> {
        match self.counts.get(owner.as_bytes()).map_err(storage_err)? {
            Some(bytes) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes);
                Ok(u64::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn increment_count(&self, owner: &Address) -> Result<(), RegistryError> {
        let next = self.count_of(owner)? + 1;
        self.counts
            .insert(owner.as_bytes(), next.to_be_bytes().as_ref())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn decrement_count(&self, owner: &Address) -> Result<(), RegistryError> {
        let next = self.count_of(owner)?.saturating_sub(1);
        if next == 0 {
            self.counts.remove(owner.as_bytes()).map_err(storage_err)?;
        } else {
            self.counts
                .insert(owner.as_bytes(), next.to_be_bytes().as_ref())
                .map_err(storage_err)?;
        }
        Ok(())
    }

    // ── Approvals ────────────────────────────────────────────────────────────

    pub fn approved(&self, id: &LabelId) -> Result<Option<Address>, RegistryError> {
        match self.approvals.get(id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => {
                let mut arr = [0u8; 20];
                arr.copy_from_slice(&bytes);
                Ok(Some(Address::from_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    pub fn set_approval(&self, id: &LabelId, delegate: Address) -> Result<(), RegistryError> {
        self.approvals
            .insert(id.as_bytes(), delegate.as_bytes().as_ref())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn clear_approval(&self, id: &LabelId) -> Result<(), RegistryError> {
        self.approvals.remove(id.as_bytes()).map_err(storage_err)?;
        Ok(())
    }

    // ── Role sets ────────────────────────────────────────────────────────────

    pub fn is_registrar(&self, who: &Address) -> bool {
        self.registrars.contains_key(who.as_bytes()).unwrap_or(false)
    }

    pub fn add_registrar(&self, who: &Address) -> Result<(), RegistryError> {
        self.registrars
            .insert(who.as_bytes(), b"".as_ref())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn remove_registrar(&self, who: &Address) -> Result<(), RegistryError> {
        self.registrars.remove(who.as_bytes()).map_err(storage_err)?;
        Ok(())
    }

    pub fn is_renewer(&self, who: &Address) -> bool {
        self.renewers.contains_key(who.as_bytes()).unwrap_or(false)
    }

    pub fn add_renewer(&self, who: &Address) -> Result<(), RegistryError> {
        self.renewers
            .insert(who.as_bytes(), b"".as_ref())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn remove_renewer(&self, who: &Address) -> Result<(), RegistryError> {
        self.renewers.remove(who.as_bytes()).map_err(storage_err)?;
        Ok(())
    }

    // ── Event log ────────────────────────────────────────────────────────────

    pub fn append_event(&self, event: &Event) -> Result<(), RegistryError> {
        let seq = match self.meta.get(b"event_seq").map_err(storage_err)? {
            Some(bytes) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes);
                u64::from_be_bytes(arr)
            }
            None => 0,
        };
        let bytes = bincode::serialize(event).map_err(codec_err)?;
        self.events
            .insert(seq.to_be_bytes().as_ref(), bytes)
            .map_err(storage_err)?;
        self.meta
            .insert(b"event_seq", (seq + 1).to_be_bytes().as_ref())
            .map_err(storage_err)?;
        Ok(())
    }

    /// All events in application order.
    pub fn events(&self) -> Result<Vec<Event>, RegistryError> {
        let mut out = Vec::new();
        for item in self.events.iter() {
            let (_, bytes) = item.map_err(storage_err)?;
            out.push(bincode::deserialize(&bytes).map_err(codec_err)?);
        }
        Ok(out)
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), RegistryError> {
        self._db.flush().map_err(storage_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomen_core::event::Event;

    fn temp_db(name: &str) -> RegistryDb {
        let dir = std::env::temp_dir().join(format!("nomen_registry_db_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        RegistryDb::open(&dir).expect("open temp db")
    }

    #[test]
    fn record_round_trip() {
        let db = temp_db("record_rt");
        let rec = NameRecord::new(LabelId::from_bytes([1; 32]), Address::from_bytes([2; 20]), 42);
        db.put_record(&rec).unwrap();
        db.flush().unwrap();
        assert_eq!(db.get_record(&rec.label_id).unwrap(), Some(rec.clone()));
        db.remove_record(&rec.label_id).unwrap();
        assert_eq!(db.get_record(&rec.label_id).unwrap(), None);
    }

    #[test]
    fn counts_saturate_at_zero() {
        let db = temp_db("counts");
        let owner = Address::from_bytes([3; 20]);
        assert_eq!(db.count_of(&owner).unwrap(), 0);
        db.increment_count(&owner).unwrap();
        db.increment_count(&owner).unwrap();
        assert_eq!(db.count_of(&owner).unwrap(), 2);
        db.decrement_count(&owner).unwrap();
        db.decrement_count(&owner).unwrap();
        db.decrement_count(&owner).unwrap();
        assert_eq!(db.count_of(&owner).unwrap(), 0);
    }

    #[test]
    fn role_sets_are_independent() {
        let db = temp_db("roles");
        let who = Address::from_bytes([4; 20]);
        db.add_registrar(&who).unwrap();
        assert!(db.is_registrar(&who));
        assert!(!db.is_renewer(&who));
        db.remove_registrar(&who).unwrap();
        assert!(!db.is_registrar(&who));
    }

    #[test]
    fn events_preserve_order() {
        let db = temp_db("events");
        let id = LabelId::from_bytes([5; 32]);
        db.append_event(&Event::ExpirationChanged { label_id: id, expiration: 1 }).unwrap();
        db.append_event(&Event::ExpirationChanged { label_id: id, expiration: 2 }).unwrap();
        let events = db.events().unwrap();
        assert_eq!(
            events,
            vec![
                Event::ExpirationChanged { label_id: id, expiration: 1 },
                Event::ExpirationChanged { label_id: id, expiration: 2 },
            ]
        );
    }
}
