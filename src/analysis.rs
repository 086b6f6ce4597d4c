use crate::models::JournalEntry;
use crate::sentiment;
use crate::stats::date_key;
use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const OVERALL_WINDOW: usize = 15;
pub const RECENT_WINDOW: usize = 10;
const EXCERPT_CHARS: usize = 150;
const MAX_OUTPUT_TOKENS: u32 = 200;
const TEMPERATURE: f32 = 0.7;
const EMPTY_RESPONSE_TEXT: &str = "Analysis in progress...";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: String,
    pub sentiment: f64,
    pub mood: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub overall_summary: String,
    pub recent_status: String,
    pub chart_data: Vec<ChartPoint>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generator returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed generator response")]
    MalformedResponse,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Gemini `generateContent` over REST.
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);
        let body = GenerateRequest {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
                temperature: TEMPERATURE,
            },
        };

        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|_| GenerationError::MalformedResponse)?;
        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or(GenerationError::MalformedResponse)?;
        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().map(|part| part.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            Ok(EMPTY_RESPONSE_TEXT.to_string())
        } else {
            Ok(text)
        }
    }
}

/// Summarises `entries` (oldest first) with the generator, or with the
/// templated fallback when there is no generator or any call fails.
pub async fn analyze(
    entries: &[JournalEntry],
    generator: Option<&dyn TextGenerator>,
) -> AnalysisResult {
    let chart_data = chart_points(entries);

    let Some(generator) = generator else {
        debug!("no text generator configured, using templated analysis");
        return fallback_analysis(entries, chart_data);
    };

    let overall_prompt = overall_summary_prompt(entries);
    let recent_prompt = recent_status_prompt(entries);

    match tokio::try_join!(
        generator.generate(&overall_prompt),
        generator.generate(&recent_prompt)
    ) {
        Ok((overall_summary, recent_status)) => AnalysisResult {
            overall_summary,
            recent_status,
            chart_data,
        },
        Err(err) => {
            warn!("text generation failed, using templated analysis: {err}");
            fallback_analysis(entries, chart_data)
        }
    }
}

pub fn chart_points(entries: &[JournalEntry]) -> Vec<ChartPoint> {
    entries
        .iter()
        .map(|entry| ChartPoint {
            date: local_date(entry),
            sentiment: sentiment::score(&entry.content),
            mood: entry.mood.value(),
        })
        .collect()
}

fn local_date(entry: &JournalEntry) -> String {
    date_key(entry.created_at.with_timezone(&Local).date_naive())
}

fn last(entries: &[JournalEntry], n: usize) -> &[JournalEntry] {
    &entries[entries.len().saturating_sub(n)..]
}

fn entry_lines(entries: &[JournalEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            let excerpt: String = entry.content.chars().take(EXCERPT_CHARS).collect();
            format!(
                "Date: {}, Mood: {}/5, Content: {}...",
                local_date(entry),
                entry.mood.value(),
                excerpt
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn overall_summary_prompt(entries: &[JournalEntry]) -> String {
    format!(
        "You are a compassionate AI wellness coach. Analyze these journal entries and provide an \
         encouraging 3-sentence summary of the person's overall emotional growth and journey. \
         Focus on patterns, improvements, and resilience. Be warm and supportive.\n\n\
         Journal Entries:\n{}\n\nProvide a supportive growth summary:",
        entry_lines(last(entries, OVERALL_WINDOW))
    )
}

pub fn recent_status_prompt(entries: &[JournalEntry]) -> String {
    format!(
        "You are a caring AI wellness assistant. Based on these recent journal entries, provide a \
         warm 2-sentence summary of this person's current emotional state. Acknowledge both \
         challenges and victories with empathy.\n\n\
         Recent Entries:\n{}\n\nCurrent emotional status:",
        entry_lines(last(entries, RECENT_WINDOW))
    )
}

fn average_mood(entries: &[JournalEntry]) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    let sum: u32 = entries.iter().map(|entry| u32::from(entry.mood.value())).sum();
    f64::from(sum) / entries.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodBand {
    High,
    Balanced,
    Struggling,
}

impl MoodBand {
    pub fn from_average(average: f64) -> Self {
        if average >= 4.0 {
            MoodBand::High
        } else if average >= 3.0 {
            MoodBand::Balanced
        } else {
            MoodBand::Struggling
        }
    }
}

fn overall_template(band: MoodBand) -> &'static str {
    match band {
        MoodBand::High => {
            "Your journey radiates positivity and emotional strength! You're consistently \
             maintaining high emotional wellbeing and building resilience through your \
             thoughtful reflections."
        }
        MoodBand::Balanced => {
            "Your emotional journey shows healthy balance and wisdom. You're navigating life's \
             complexities with grace and developing strong emotional intelligence through \
             regular self-reflection."
        }
        MoodBand::Struggling => {
            "Your courage in documenting both challenges and victories shows incredible \
             strength. Every entry demonstrates your commitment to growth and healing."
        }
    }
}

fn recent_template(band: MoodBand) -> &'static str {
    match band {
        MoodBand::High => {
            "you've been in a wonderful emotional space, showing positivity and emotional \
             strength. Your recent reflections demonstrate growth and self-awareness."
        }
        MoodBand::Balanced => {
            "you've maintained good emotional balance while processing life's experiences. \
             Your consistent journaling shows wisdom in working through various feelings."
        }
        MoodBand::Struggling => {
            "you've been courageously working through some challenges, which demonstrates \
             real emotional maturity. Your commitment to self-reflection during difficult \
             times shows incredible resilience."
        }
    }
}

pub fn fallback_analysis(entries: &[JournalEntry], chart_data: Vec<ChartPoint>) -> AnalysisResult {
    let overall_band = MoodBand::from_average(average_mood(entries));
    let recent_band = MoodBand::from_average(average_mood(last(entries, RECENT_WINDOW)));

    AnalysisResult {
        overall_summary: format!(
            "Through your {} journal entries, you've shown remarkable dedication to \
             self-reflection and emotional growth. {}",
            entries.len(),
            overall_template(overall_band)
        ),
        recent_status: format!("In your recent entries, {}", recent_template(recent_band)),
        chart_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mood;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn entries(moods: &[i64]) -> Vec<JournalEntry> {
        let start = Utc::now() - Duration::days(moods.len() as i64);
        moods
            .iter()
            .enumerate()
            .map(|(i, mood)| JournalEntry {
                id: i as u64 + 1,
                created_at: start + Duration::days(i as i64),
                mood: Mood::new(*mood).unwrap(),
                content: format!("entry {i} felt happy"),
                user_id: Uuid::nil(),
            })
            .collect()
    }

    struct Echo {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("generated {} chars", prompt.len()))
        }
    }

    struct Broken;

    #[async_trait]
    impl TextGenerator for Broken {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::MalformedResponse)
        }
    }

    #[test]
    fn fallback_high_average_selects_positive_template() {
        let list = entries(&[5, 4]);
        let result = fallback_analysis(&list, chart_points(&list));
        assert!(result
            .overall_summary
            .starts_with("Through your 2 journal entries"));
        assert!(result
            .overall_summary
            .ends_with(overall_template(MoodBand::High)));
        assert!(result.recent_status.ends_with(recent_template(MoodBand::High)));
    }

    #[test]
    fn fallback_bands_follow_thresholds() {
        assert_eq!(MoodBand::from_average(4.5), MoodBand::High);
        assert_eq!(MoodBand::from_average(4.0), MoodBand::High);
        assert_eq!(MoodBand::from_average(3.2), MoodBand::Balanced);
        assert_eq!(MoodBand::from_average(2.9), MoodBand::Struggling);
    }

    #[test]
    fn fallback_recent_uses_last_ten_entries() {
        let mut moods = vec![5; 20];
        moods.extend([1; 10]);
        let list = entries(&moods);
        let result = fallback_analysis(&list, Vec::new());
        // 20 fives and 10 ones average to 3.67.
        assert!(result
            .overall_summary
            .ends_with(overall_template(MoodBand::Balanced)));
        assert!(result
            .recent_status
            .ends_with(recent_template(MoodBand::Struggling)));
    }

    #[test]
    fn prompts_cover_their_windows() {
        let list = entries(&[3; 20]);
        let overall = overall_summary_prompt(&list);
        let recent = recent_status_prompt(&list);
        assert_eq!(overall.matches("Mood: 3/5").count(), OVERALL_WINDOW);
        assert_eq!(recent.matches("Mood: 3/5").count(), RECENT_WINDOW);
    }

    #[test]
    fn prompt_truncates_content() {
        let mut list = entries(&[4]);
        list[0].content = "x".repeat(400);
        let prompt = recent_status_prompt(&list);
        assert!(prompt.contains(&format!("Content: {}...", "x".repeat(150))));
        assert!(!prompt.contains(&"x".repeat(151)));
    }

    #[tokio::test]
    async fn analyze_uses_generator_for_both_prompts() {
        let list = entries(&[2, 3, 4]);
        let generator = Echo {
            calls: AtomicUsize::new(0),
        };
        let result = analyze(&list, Some(&generator as &dyn TextGenerator)).await;
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
        assert!(result.overall_summary.starts_with("generated"));
        assert!(result.recent_status.starts_with("generated"));
        assert_eq!(result.chart_data.len(), 3);
        assert!(result.chart_data.iter().all(|point| point.sentiment > 0.0));
    }

    #[tokio::test]
    async fn analyze_falls_back_on_failure() {
        let list = entries(&[5, 4]);
        let result = analyze(&list, Some(&Broken as &dyn TextGenerator)).await;
        assert!(result
            .overall_summary
            .ends_with(overall_template(MoodBand::High)));
        assert_eq!(result.chart_data.len(), 2);
    }

    #[tokio::test]
    async fn analyze_without_generator_is_templated() {
        let list = entries(&[1, 2]);
        let result = analyze(&list, None).await;
        assert!(result
            .overall_summary
            .ends_with(overall_template(MoodBand::Struggling)));
        assert_eq!(
            result.chart_data.iter().map(|p| p.mood).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    mod gemini {
        use super::super::*;
        use super::entries;
        use axum::{
            extract::{Path, Query, State},
            http::StatusCode,
            response::{IntoResponse, Response},
            routing::post,
            Json, Router,
        };
        use serde_json::{json, Value};
        use std::collections::HashMap;
        use std::sync::{Arc, Mutex};
        use std::time::Duration;

        #[derive(Clone, Default)]
        struct Captured {
            body: Arc<Mutex<Option<Value>>>,
            key: Arc<Mutex<Option<String>>>,
        }

        fn reply(text: &str) -> Response {
            Json(json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }))
                .into_response()
        }

        /// Answers according to the model name in `/models/{model}:generateContent`.
        async fn generate_content(
            State(captured): State<Captured>,
            Path(call): Path<String>,
            Query(query): Query<HashMap<String, String>>,
            Json(body): Json<Value>,
        ) -> Response {
            *captured.body.lock().unwrap() = Some(body);
            *captured.key.lock().unwrap() = query.get("key").cloned();

            let Some((model, "generateContent")) = call.split_once(':') else {
                return StatusCode::NOT_FOUND.into_response();
            };
            match model {
                "ok" => reply("Keep going."),
                "empty" => reply("  "),
                "fail" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    reply("too late")
                }
                _ => "not json at all".into_response(),
            }
        }

        async fn spawn_fake() -> (String, Captured) {
            let captured = Captured::default();
            let app = Router::new()
                .route("/models/:call", post(generate_content))
                .with_state(captured.clone());
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            (format!("http://{addr}"), captured)
        }

        async fn client(model: &str, timeout: Duration) -> (GeminiClient, Captured) {
            let (base, captured) = spawn_fake().await;
            let http = crate::state::http_client(timeout).unwrap();
            (GeminiClient::new(http, base, model, "test-key"), captured)
        }

        #[tokio::test]
        async fn sends_prompt_with_generation_config() {
            let (gemini, captured) = client("ok", Duration::from_secs(5)).await;
            let text = gemini.generate("How was my week?").await.unwrap();
            assert_eq!(text, "Keep going.");

            let body = captured.body.lock().unwrap().clone().unwrap();
            assert_eq!(body["contents"][0]["role"], "user");
            assert_eq!(body["contents"][0]["parts"][0]["text"], "How was my week?");
            assert_eq!(body["generationConfig"]["maxOutputTokens"], 200);
            let temperature = body["generationConfig"]["temperature"].as_f64().unwrap();
            assert!((temperature - 0.7).abs() < 1e-6);
            assert_eq!(captured.key.lock().unwrap().as_deref(), Some("test-key"));
        }

        #[tokio::test]
        async fn blank_text_becomes_placeholder() {
            let (gemini, _) = client("empty", Duration::from_secs(5)).await;
            assert_eq!(gemini.generate("prompt").await.unwrap(), EMPTY_RESPONSE_TEXT);
        }

        #[tokio::test]
        async fn error_status_and_garbage_body_are_errors() {
            let (gemini, _) = client("fail", Duration::from_secs(5)).await;
            match gemini.generate("prompt").await {
                Err(GenerationError::Status { status, body }) => {
                    assert_eq!(status, 500);
                    assert_eq!(body, "boom");
                }
                other => panic!("expected status error, got {other:?}"),
            }

            let (gemini, _) = client("garbage", Duration::from_secs(5)).await;
            assert!(matches!(
                gemini.generate("prompt").await,
                Err(GenerationError::MalformedResponse)
            ));
        }

        #[tokio::test]
        async fn analyze_falls_back_when_upstream_fails() {
            let list = entries(&[5, 4]);
            let (gemini, _) = client("fail", Duration::from_secs(5)).await;
            let result = analyze(&list, Some(&gemini as &dyn TextGenerator)).await;
            assert!(result
                .overall_summary
                .ends_with(overall_template(MoodBand::High)));
            assert_eq!(result.chart_data.len(), 2);
        }

        #[tokio::test]
        async fn analyze_falls_back_when_upstream_hangs() {
            let list = entries(&[1, 2]);
            let (gemini, _) = client("slow", Duration::from_millis(200)).await;
            assert!(matches!(
                gemini.generate("prompt").await,
                Err(GenerationError::Http(_))
            ));

            let result = analyze(&list, Some(&gemini as &dyn TextGenerator)).await;
            assert!(result
                .overall_summary
                .ends_with(overall_template(MoodBand::Struggling)));
        }
    }
}
