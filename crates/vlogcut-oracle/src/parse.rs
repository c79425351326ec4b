//! Tolerant parsing of oracle answers.
//!
//! Language models wrap JSON in prose or markdown fences. The ranking answer
//! is taken to be everything between the first `[` and the last `]`; if that
//! slice is not a JSON array the whole answer is rejected.

use serde_json::Value;
use tracing::debug;

use vlogcut_models::{parse_timestamp, CandidateInterval};

/// Extract candidate intervals from a raw ranking answer.
///
/// Returns `None` when no JSON array can be found or parsed. Array elements
/// that are not objects, or whose `start`/`end` cannot be read as timestamps,
/// are skipped. No clamping or bounds checks happen here.
pub fn parse_candidate_array(raw: &str, source_id: &str) -> Option<Vec<CandidateInterval>> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end <= start {
        return None;
    }

    let items: Vec<Value> = match serde_json::from_str(&raw[start..=end]) {
        Ok(items) => items,
        Err(e) => {
            debug!(source = source_id, "Oracle answer is not a JSON array: {}", e);
            return None;
        }
    };

    let candidates = items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let start_secs = value_as_seconds(obj.get("start")?)?;
            let end_secs = value_as_seconds(obj.get("end")?)?;
            let reason = obj
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string();
            Some(CandidateInterval::new(source_id, start_secs, end_secs, reason))
        })
        .collect();

    Some(candidates)
}

fn value_as_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => parse_timestamp(s).ok(),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite() && *v >= 0.0),
        _ => None,
    }
}

/// Clean a free-text caption: trim whitespace, surrounding quotes and fences.
pub fn clean_caption(raw: &str) -> Option<String> {
    let text = raw.trim().trim_matches('`').trim();
    let text = text.trim_matches(|c| c == '"' || c == '\'').trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array_surrounded_by_prose() {
        let raw = r#"Sure! Here are the best moments:
```json
[
  {"start": "00:01:30", "end": "00:01:35", "reason": "Key dialogue"},
  {"start": "00:03:20", "end": "00:03:26", "reason": "Reaction"}
]
```
Let me know if you need more."#;

        let candidates = parse_candidate_array(raw, "part1").unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].source_id, "part1");
        assert_eq!(candidates[0].start_secs, 90.0);
        assert_eq!(candidates[0].end_secs, 95.0);
        assert_eq!(candidates[1].reason, "Reaction");
    }

    #[test]
    fn test_numeric_and_short_timestamps() {
        let raw = r#"[{"start": 12, "end": 17.5}, {"start": "1:00", "end": "1:04"}]"#;
        let candidates = parse_candidate_array(raw, "p").unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].end_secs, 17.5);
        assert_eq!(candidates[0].reason, "");
        assert_eq!(candidates[1].start_secs, 60.0);
    }

    #[test]
    fn test_bad_elements_are_skipped() {
        let raw = r#"[{"start": "00:00:05"}, "text", {"start": "bogus", "end": "00:00:09"}, {"start": "00:00:10", "end": "00:00:14", "reason": "ok"}]"#;
        let candidates = parse_candidate_array(raw, "p").unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].reason, "ok");
    }

    #[test]
    fn test_unparseable_answers() {
        assert!(parse_candidate_array("no json here", "p").is_none());
        assert!(parse_candidate_array("] before [", "p").is_none());
        assert!(parse_candidate_array("[not, valid json]", "p").is_none());
        assert_eq!(parse_candidate_array("[]", "p").unwrap().len(), 0);
    }

    #[test]
    fn test_clean_caption() {
        assert_eq!(
            clean_caption("  \"Friends cheer as the rocket lifts off\"\n").as_deref(),
            Some("Friends cheer as the rocket lifts off")
        );
        assert!(clean_caption("   ").is_none());
    }
}
