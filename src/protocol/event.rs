use serde::{Deserialize, Serialize};

use super::types::Item;

/// Type of change carried by a push notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Insert,
    Update,
    Delete,
}

/// Real-time change event delivered over the push channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub type_: ChangeType,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub item: Option<Item>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_insert_event() {
        let event: ChangeEvent = serde_json::from_str(
            r#"{"type":"insert","id":"7","item":{"_id":"7","text":"New"}}"#,
        )
        .unwrap();
        assert_eq!(event.type_, ChangeType::Insert);
        assert_eq!(event.id, "7");
        assert_eq!(event.item, Some(Item::with_id("7", "New")));
    }

    #[test]
    fn test_parses_delete_event_without_payload() {
        let event: ChangeEvent = serde_json::from_str(r#"{"type":"delete","id":"3"}"#).unwrap();
        assert_eq!(event.type_, ChangeType::Delete);
        assert_eq!(event.item, None);
    }

    #[test]
    fn test_control_frames_are_not_events() {
        assert!(serde_json::from_str::<ChangeEvent>(r#"{"type":"subscribed"}"#).is_err());
    }
}
