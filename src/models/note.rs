use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved note, persisted in the notes file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub value: String,
    pub date: SystemTime,
}

impl Note {
    /// New note stamped with the current time.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            value: value.into(),
            date: SystemTime::now(),
        }
    }
}

/// Notes ordered newest first, for display.
pub fn newest_first(notes: &[Note]) -> Vec<Note> {
    let mut sorted = notes.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_newest_first() {
        let older = Note {
            date: SystemTime::UNIX_EPOCH + Duration::from_secs(10),
            ..Note::new("older")
        };
        let newer = Note {
            date: SystemTime::UNIX_EPOCH + Duration::from_secs(20),
            ..Note::new("newer")
        };

        let sorted = newest_first(&[older.clone(), newer.clone()]);
        assert_eq!(sorted, vec![newer, older]);
    }

    #[test]
    fn test_note_json_shape() {
        let note = Note::new("hello");
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["value"], "hello");
        assert!(json["date"]["secs_since_epoch"].is_u64());
    }
}
