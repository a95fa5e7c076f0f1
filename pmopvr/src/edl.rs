//! Edit decision lists attached to recordings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdlType {
    /// Section removed from playback.
    Cut,
    /// Section played without sound.
    Mute,
    /// Scene marker.
    Scene,
    /// Commercial break, skipped automatically.
    CommBreak,
}

/// One edit decision, with bounds in milliseconds from the start of the
/// recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdlEntry {
    pub start_ms: i64,
    pub end_ms: i64,
    pub kind: EdlType,
}

impl EdlEntry {
    pub fn new(start_ms: i64, end_ms: i64, kind: EdlType) -> Self {
        Self {
            start_ms,
            end_ms,
            kind,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start_ms >= 0 && self.end_ms >= self.start_ms
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

/// Drops invalid entries and sorts the rest by start time.
pub fn normalize(mut entries: Vec<EdlEntry>) -> Vec<EdlEntry> {
    entries.retain(EdlEntry::is_valid);
    entries.sort_by_key(|entry| entry.start_ms);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let entries = vec![
            EdlEntry::new(60_000, 90_000, EdlType::CommBreak),
            EdlEntry::new(5_000, 1_000, EdlType::Cut),
            EdlEntry::new(0, 2_000, EdlType::Mute),
        ];
        let normalized = normalize(entries);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].kind, EdlType::Mute);
        assert_eq!(normalized[1].duration_ms(), 30_000);
    }
}
