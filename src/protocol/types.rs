use serde::{Deserialize, Serialize};

/// A text-bearing record tracked by the Booklist service.
///
/// `id` is assigned by the server on first save; an item without an id has
/// never been persisted. Items are value records: an update replaces the
/// whole entry, nothing is mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    pub text: String,
}

impl Item {
    /// A new, not yet persisted item.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
        }
    }

    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            text: text.into(),
        }
    }

    /// Whether the server has assigned this item an id.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsaved_item_serializes_without_id() {
        let item = Item::new("The Name of the Rose");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json, serde_json::json!({"text": "The Name of the Rose"}));
    }

    #[test]
    fn test_persisted_item_round_trips_wire_id() {
        let item = Item::with_id("65a1", "Foucault's Pendulum");
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"_id\":\"65a1\""));

        let back: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_deserializes_without_id_field() {
        let item: Item = serde_json::from_str(r#"{"text":"Baudolino"}"#).unwrap();
        assert_eq!(item.id, None);
        assert!(!item.is_persisted());
    }
}
