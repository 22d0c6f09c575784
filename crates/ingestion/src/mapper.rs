//! EnvelopeMapper - raw JSON events to outbound messages

use contracts::{ContractError, MessageMapper, OutboundMessage, RawEvent, UnitSpec};
use serde_json::{Map, Value};

/// Wraps each JSON object of an event into one outbound message.
///
/// An object yields one message, an array one message per element. Null
/// fields are stripped, so an object of nulls becomes an empty message.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeMapper;

impl EnvelopeMapper {
    pub fn new() -> Self {
        Self
    }

    fn envelope(unit: &UnitSpec, value: Value) -> Result<OutboundMessage, ContractError> {
        let Value::Object(fields) = value else {
            return Err(ContractError::mapping(
                unit.subject.as_str(),
                format!("expected a JSON object, got {}", kind_of(&value)),
            ));
        };
        let body: Map<String, Value> = fields.into_iter().filter(|(_, v)| !v.is_null()).collect();

        Ok(OutboundMessage {
            dimension: unit.dimension.clone(),
            subject: unit.subject.clone(),
            sub_key: unit.sub_key.clone(),
            body,
        })
    }
}

impl MessageMapper for EnvelopeMapper {
    fn map(&self, event: &RawEvent, unit: &UnitSpec) -> Result<Vec<OutboundMessage>, ContractError> {
        let value: Value = serde_json::from_str(&event.payload)
            .map_err(|e| ContractError::mapping(unit.subject.as_str(), e.to_string()))?;

        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| Self::envelope(unit, item))
                .collect(),
            other => Ok(vec![Self::envelope(unit, other)?]),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> UnitSpec {
        UnitSpec::with_sub_key("SiteA".into(), "WorkOrderCutoff".into(), "03")
    }

    #[test]
    fn test_object_maps_to_one_message() {
        let event = RawEvent::new(r#"{"WorkOrder":"WO-1","Closed":null}"#);
        let messages = EnvelopeMapper.map(&event, &unit()).unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sub_key.as_deref(), Some("03"));
        assert_eq!(messages[0].body.len(), 1);
        assert!(!messages[0].body.contains_key("Closed"));
    }

    #[test]
    fn test_array_maps_to_many() {
        let event = RawEvent::new(r#"[{"a":1},{"b":null},{"c":3}]"#);
        let messages = EnvelopeMapper.map(&event, &unit()).unwrap();

        assert_eq!(messages.len(), 3);
        assert!(messages[1].is_empty());
    }

    #[test]
    fn test_non_json_is_mapping_error() {
        let err = EnvelopeMapper.map(&RawEvent::new("not json"), &unit()).unwrap_err();
        assert!(matches!(err, ContractError::Mapping { .. }));
    }

    #[test]
    fn test_scalar_is_mapping_error() {
        let err = EnvelopeMapper.map(&RawEvent::new("42"), &unit()).unwrap_err();
        assert!(err.to_string().contains("a number"));
    }
}
