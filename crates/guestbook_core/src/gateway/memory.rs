//! In-memory gateway.

use super::{GatewayError, GatewayResult, PersistenceGateway};
use crate::schema::{CanonicalRecords, RawRecords};

/// Gateway holding the stored table in memory.
///
/// Reads and writes can be switched to fail, which makes it the test double
/// for unreadable or read-only stores.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    stored: Option<RawRecords>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

impl MemoryGateway {
    /// Empty store: reads return `Ok(None)`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: RawRecords) -> Self {
        Self {
            stored: Some(records),
            ..Self::default()
        }
    }

    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn stored(&self) -> Option<&RawRecords> {
        self.stored.as_ref()
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl PersistenceGateway for MemoryGateway {
    fn read(&self) -> GatewayResult<Option<RawRecords>> {
        if self.fail_reads {
            return Err(GatewayError::Unavailable(
                "memory store is marked unreadable".to_string(),
            ));
        }
        Ok(self.stored.clone())
    }

    fn write(&mut self, records: &CanonicalRecords) -> GatewayResult<()> {
        if self.fail_writes {
            return Err(GatewayError::PermissionDenied(
                "memory store is read-only".to_string(),
            ));
        }
        self.stored = Some(records.to_raw());
        self.writes += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryGateway;
    use crate::gateway::PersistenceGateway;
    use crate::model::ledger::Ledger;
    use crate::schema::CanonicalSchema;

    #[test]
    fn write_then_read_returns_canonical_table() {
        let mut gateway = MemoryGateway::new();
        assert_eq!(gateway.read().unwrap(), None);

        let schema = CanonicalSchema::current();
        gateway
            .write(&Ledger::default_sample().to_canonical(&schema))
            .unwrap();

        let stored = gateway.read().unwrap().unwrap();
        assert_eq!(stored.columns().len(), schema.len());
        assert_eq!(stored.row_count(), 3);
        assert_eq!(gateway.write_count(), 1);
    }

    #[test]
    fn failing_writes_keep_previous_content() {
        let mut gateway = MemoryGateway::new();
        gateway.set_fail_writes(true);
        let schema = CanonicalSchema::current();
        assert!(gateway
            .write(&Ledger::default_sample().to_canonical(&schema))
            .is_err());
        assert!(gateway.stored().is_none());
        assert_eq!(gateway.write_count(), 0);
    }
}
