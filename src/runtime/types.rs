use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event an overlay emits through its host instance when one of the
/// outcome callbacks runs, each carrying an optional payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum OverlayEvent {
    /// The overlay resolved successfully
    Confirm { value: Option<Value> },
    /// The overlay was dismissed
    Cancel { value: Option<Value> },
}

impl OverlayEvent {
    /// The payload carried by either event kind
    pub fn value(&self) -> Option<&Value> {
        match self {
            OverlayEvent::Confirm { value } | OverlayEvent::Cancel { value } => value.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_serializes_tagged() {
        let event = OverlayEvent::Confirm {
            value: Some(json!(42)),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "confirm");
        assert_eq!(json["value"], 42);
    }

    #[test]
    fn test_event_value_accessor() {
        let event = OverlayEvent::Cancel { value: None };
        assert!(event.value().is_none());

        let event = OverlayEvent::Confirm {
            value: Some(json!("ok")),
        };
        assert_eq!(event.value(), Some(&json!("ok")));
    }
}
