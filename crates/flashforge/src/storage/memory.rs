//! In-process slot backend.

use std::collections::HashMap;

use super::{check_quota, Slot};
use crate::error::Result;

/// Slot storage held in a `HashMap`.
///
/// Nothing survives the process; used as the durable-slot fake in tests and
/// for throwaway sessions. An optional byte quota makes writes fail the way
/// a full browser storage area would.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    values: HashMap<String, String>,
    quota: Option<usize>,
    writes: usize,
}

impl MemorySlot {
    /// Create an empty slot store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty slot store that rejects values larger than `quota` bytes.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Create a slot store with `value` already stored under `key`.
    #[must_use]
    pub fn seeded(key: &str, value: &str) -> Self {
        let mut slot = Self::new();
        slot.values.insert(key.to_string(), value.to_string());
        slot
    }

    /// Change the quota for subsequent writes.
    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl Slot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        check_quota(key, value, self.quota)?;
        self.values.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_new_is_empty() {
        let slot = MemorySlot::new();
        assert_eq!(slot.read("deck").unwrap(), None);
        assert_eq!(slot.write_count(), 0);
    }

    #[test]
    fn test_seeded() {
        let slot = MemorySlot::seeded("deck", "[]");
        assert_eq!(slot.read("deck").unwrap().as_deref(), Some("[]"));
        assert_eq!(slot.write_count(), 0);
    }

    #[test]
    fn test_write_counts() {
        let mut slot = MemorySlot::new();
        slot.write("deck", "a").unwrap();
        slot.write("deck", "b").unwrap();
        assert_eq!(slot.write_count(), 2);
        assert_eq!(slot.read("deck").unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn test_quota_failure_keeps_old_value() {
        let mut slot = MemorySlot::with_quota(3);
        slot.write("deck", "abc").unwrap();

        let err = slot.write("deck", "abcd").unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded { .. }));
        assert_eq!(slot.read("deck").unwrap().as_deref(), Some("abc"));
        assert_eq!(slot.write_count(), 1);
    }

    #[test]
    fn test_set_quota_lifts_limit() {
        let mut slot = MemorySlot::with_quota(1);
        assert!(slot.write("deck", "ab").is_err());

        slot.set_quota(None);
        assert!(slot.write("deck", "ab").is_ok());
    }
}
