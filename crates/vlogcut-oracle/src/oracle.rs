//! Oracle interfaces and the LLM-backed implementation.
//!
//! The selector and enhancer only see [`IntervalOracle`]. Any error it
//! returns is treated by callers as "oracle unavailable" for that unit of
//! work.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use vlogcut_models::{CandidateInterval, IntervalBounds};

use crate::client::{GeminiClient, OracleConfig};
use crate::error::{OracleError, OracleResult};
use crate::parse::{clean_caption, parse_candidate_array};
use crate::retry::{retry_async, RetryPolicy, Sleeper, TokioSleeper};

const RANK_SYSTEM_PROMPT: &str = "You are a video editor expert at selecting the best moments from content. \
You must respect duration constraints strictly. Return only valid JSON.";

const DESCRIBE_SYSTEM_PROMPT: &str = "You are a video editor creating brief, punchy descriptions for video \
segments. Keep it concise and engaging.";

/// A single text-generation call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Raw text-generation backend.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> OracleResult<String>;
}

/// Ask the oracle to pick moments from one source.
#[derive(Debug, Clone)]
pub struct RankRequest {
    pub source_id: String,
    pub narrative: String,
    /// Rendered chunk digest (`HH:MM:SS (12.0s): text` lines)
    pub content_digest: String,
    pub target_secs: f64,
    pub available_secs: f64,
    pub bounds: IntervalBounds,
}

/// Ask the oracle for a caption of one interval.
#[derive(Debug, Clone)]
pub struct DescribeRequest {
    pub source_id: String,
    pub start_time: String,
    pub end_time: String,
    pub narrative: String,
    pub dialogue: String,
    pub visuals: String,
}

/// Ranking and captioning service used by interval selection.
#[async_trait]
pub trait IntervalOracle: Send + Sync {
    /// Candidate intervals for one source. Unparseable answers are errors.
    async fn rank_intervals(&self, request: &RankRequest) -> OracleResult<Vec<CandidateInterval>>;

    /// A short caption for one interval.
    async fn describe_interval(&self, request: &DescribeRequest) -> OracleResult<String>;
}

/// [`IntervalOracle`] backed by a [`TextModel`] with retries.
pub struct LlmOracle {
    model: Box<dyn TextModel>,
    rank_model: String,
    describe_model: String,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl LlmOracle {
    pub fn new(model: Box<dyn TextModel>, config: &OracleConfig) -> Self {
        Self {
            model,
            rank_model: config.rank_model.clone(),
            describe_model: config.describe_model.clone(),
            retry: RetryPolicy::default().with_max_attempts(config.max_attempts),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Build a Gemini-backed oracle, or `None` when no API key is configured.
    pub fn from_config(config: &OracleConfig) -> OracleResult<Option<Self>> {
        if !config.is_enabled() {
            info!("No oracle API key configured, interval selection will use the fallback heuristic");
            return Ok(None);
        }
        let client = GeminiClient::new(config)?;
        Ok(Some(Self::new(Box::new(client), config)))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    async fn complete_with_retry(&self, operation: &str, request: CompletionRequest) -> OracleResult<String> {
        retry_async(&self.retry, self.sleeper.as_ref(), operation, || {
            self.model.complete(&request)
        })
        .await
    }
}

#[async_trait]
impl IntervalOracle for LlmOracle {
    async fn rank_intervals(&self, request: &RankRequest) -> OracleResult<Vec<CandidateInterval>> {
        let completion = CompletionRequest {
            model: self.rank_model.clone(),
            system: Some(RANK_SYSTEM_PROMPT.to_string()),
            prompt: build_rank_prompt(request),
            max_tokens: 600,
            temperature: 0.3,
        };

        let raw = self.complete_with_retry("rank_intervals", completion).await?;
        let candidates = parse_candidate_array(&raw, &request.source_id).ok_or_else(|| {
            OracleError::invalid_response(format!(
                "no JSON array in ranking answer for {}",
                request.source_id
            ))
        })?;

        debug!(
            source = %request.source_id,
            count = candidates.len(),
            "Oracle proposed candidate intervals"
        );
        Ok(candidates)
    }

    async fn describe_interval(&self, request: &DescribeRequest) -> OracleResult<String> {
        let completion = CompletionRequest {
            model: self.describe_model.clone(),
            system: Some(DESCRIBE_SYSTEM_PROMPT.to_string()),
            prompt: build_describe_prompt(request),
            max_tokens: 80,
            temperature: 0.7,
        };

        let raw = self.complete_with_retry("describe_interval", completion).await?;
        clean_caption(&raw).ok_or_else(|| OracleError::invalid_response("empty caption"))
    }
}

/// Truncate to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn build_rank_prompt(request: &RankRequest) -> String {
    let bounds = &request.bounds;
    format!(
        r#"Based on this narrative story:
"{narrative}"

I need to select the BEST {target:.1} seconds of content from video "{source}" (out of {available:.1}s available).

Content with timestamps and durations:
{digest}

CONSTRAINTS:
- Total selected duration must be approximately {target:.1} seconds
- Each interval should be {min}-{suggested} seconds long (no longer than {max}s!)
- Select the most engaging, story-relevant, or emotionally impactful moments
- Prioritize quality over quantity

Return ONLY a JSON array of objects like:
[
  {{"start": "00:01:30", "end": "00:01:35", "reason": "Key dialogue/moment"}},
  {{"start": "00:03:20", "end": "00:03:25", "reason": "Important visual/reaction"}}
]
"#,
        narrative = truncate_chars(&request.narrative, 400),
        target = request.target_secs,
        source = request.source_id,
        available = request.available_secs,
        digest = request.content_digest,
        min = bounds.min,
        suggested = bounds.suggested,
        max = bounds.max,
    )
}

fn build_describe_prompt(request: &DescribeRequest) -> String {
    format!(
        r#"Based on this narrative context:
"{narrative}"

This video segment from {source} ({start} to {end}) contains:
Dialogue/Audio: {dialogue}
Visuals: {visuals}

Generate a concise, engaging description (15-25 words) of what's happening in this segment. Focus on the main action, emotion, or story beat. Make it punchy and descriptive for video editing.
"#,
        narrative = truncate_chars(&request.narrative, 1000),
        source = request.source_id,
        start = request.start_time,
        end = request.end_time,
        dialogue = request.dialogue,
        visuals = request.visuals,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RecordingSleeper;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays scripted answers and records prompts.
    struct ScriptedModel {
        answers: Mutex<Vec<OracleResult<String>>>,
        calls: AtomicU32,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(answers: Vec<OracleResult<String>>) -> Self {
            Self {
                answers: Mutex::new(answers),
                calls: AtomicU32::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextModel for Arc<ScriptedModel> {
        async fn complete(&self, request: &CompletionRequest) -> OracleResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(request.prompt.clone());
            let mut answers = self.answers.lock().unwrap();
            if answers.is_empty() {
                Err(OracleError::unavailable("script exhausted"))
            } else {
                answers.remove(0)
            }
        }
    }

    fn rank_request() -> RankRequest {
        RankRequest {
            source_id: "part1".into(),
            narrative: "A day at the beach".into(),
            content_digest: "00:00:00 (15.0s): Alice: look at the waves".into(),
            target_secs: 15.0,
            available_secs: 60.0,
            bounds: IntervalBounds::from_suggested(5.0),
        }
    }

    fn oracle_with(model: Arc<ScriptedModel>, sleeper: Arc<RecordingSleeper>) -> LlmOracle {
        LlmOracle::new(Box::new(model), &OracleConfig::default()).with_sleeper(sleeper)
    }

    #[tokio::test]
    async fn test_rank_retries_then_parses() {
        let model = Arc::new(ScriptedModel::new(vec![
            Err(OracleError::request_failed("503")),
            Ok(r#"Here you go: [{"start": "00:00:02", "end": "00:00:07", "reason": "Waves"}]"#.into()),
        ]));
        let sleeper = Arc::new(RecordingSleeper::new());
        let oracle = oracle_with(model.clone(), sleeper.clone());

        let candidates = oracle.rank_intervals(&rank_request()).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].source_id, "part1");
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        assert_eq!(sleeper.delays().len(), 1);

        let prompt = model.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("BEST 15.0 seconds"));
        assert!(prompt.contains("3-5 seconds long (no longer than 7s!)"));
    }

    #[tokio::test]
    async fn test_rank_rejects_prose_without_array() {
        let model = Arc::new(ScriptedModel::new(vec![Ok("I cannot help with that.".into())]));
        let oracle = oracle_with(model.clone(), Arc::new(RecordingSleeper::new()));

        let err = oracle.rank_intervals(&rank_request()).await.unwrap_err();
        assert!(matches!(err, OracleError::InvalidResponse(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_describe_cleans_caption() {
        let model = Arc::new(ScriptedModel::new(vec![Ok("\"Waves crash as Alice laughs\"\n".into())]));
        let oracle = oracle_with(model, Arc::new(RecordingSleeper::new()));

        let caption = oracle
            .describe_interval(&DescribeRequest {
                source_id: "part1".into(),
                start_time: "00:00:02".into(),
                end_time: "00:00:07".into(),
                narrative: "A day at the beach".into(),
                dialogue: "Alice: look at the waves".into(),
                visuals: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(caption, "Waves crash as Alice laughs");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
