use serde_json::Value;

const REFERENCE_KEYS: [&str; 4] = ["reference", "quote_id", "quoteId", "id"];
const MESSAGE_KEYS: [&str; 2] = ["message", "error"];

/// Reads the optional lead reference out of a 2xx body. Numbers are accepted
/// because some lead endpoints return integer row ids.
pub fn reference_from_body(body: &str) -> Option<String> {
    let value = parse_object(body)?;
    REFERENCE_KEYS.iter().find_map(|key| match value.get(*key)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

/// Reads the optional human-readable message out of an error body.
pub fn message_from_body(body: &str) -> Option<String> {
    let value = parse_object(body)?;
    MESSAGE_KEYS.iter().find_map(|key| match value.get(*key)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        _ => None,
    })
}

fn parse_object(body: &str) -> Option<Value> {
    serde_json::from_str::<Value>(body).ok().filter(Value::is_object)
}

#[cfg(test)]
mod tests {
    use super::{message_from_body, reference_from_body};

    #[test]
    fn reference_keys_are_checked_in_order() {
        assert_eq!(
            reference_from_body(r#"{"reference":"Q-77","id":"row-1"}"#).as_deref(),
            Some("Q-77")
        );
        assert_eq!(reference_from_body(r#"{"quoteId":"Q-78"}"#).as_deref(), Some("Q-78"));
        assert_eq!(reference_from_body(r#"{"id":1042}"#).as_deref(), Some("1042"));
        assert_eq!(
            reference_from_body(r#"{"reference":"  ","id":"row-9"}"#).as_deref(),
            Some("row-9")
        );
    }

    #[test]
    fn missing_or_unparseable_bodies_yield_nothing() {
        assert_eq!(reference_from_body(""), None);
        assert_eq!(reference_from_body("OK"), None);
        assert_eq!(reference_from_body(r#"["Q-1"]"#), None);
        assert_eq!(reference_from_body(r#"{"success":true}"#), None);
    }

    #[test]
    fn message_falls_back_to_error_key() {
        assert_eq!(
            message_from_body(r#"{"message":"Service area not recognized"}"#).as_deref(),
            Some("Service area not recognized")
        );
        assert_eq!(
            message_from_body(r#"{"error":"rate limited"}"#).as_deref(),
            Some("rate limited")
        );
        assert_eq!(message_from_body(r#"{"message":""}"#), None);
        assert_eq!(message_from_body("<html>502</html>"), None);
    }
}
