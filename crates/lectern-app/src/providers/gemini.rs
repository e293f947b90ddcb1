//! Gemini API provider
//!
//! Implements both `ContentProvider` and `SpeechProvider` against the Gemini
//! `generateContent` REST endpoint. Lesson content is forced into JSON with a
//! response schema; narration audio comes back as a base64 PCM payload.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::gemini::{CONTENT_MODEL, DEFAULT_BASE_URL, TTS_MODEL, TTS_VOICE};
use crate::data::types::LessonContent;
use crate::error::{AppError, Result};
use crate::network::HttpClient;

use super::traits::{ContentProvider, SpeechProvider};

// =============================================================================
// Internal API response types (serde)
// =============================================================================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

impl GenerateContentResponse {
    /// First text part of the first candidate, if any
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| p.text.as_deref())
    }

    /// First inline data payload of the first candidate, if any
    fn first_inline_data(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| p.inline_data.as_ref().map(|d| d.data.as_str()))
    }
}

// =============================================================================
// GeminiProvider
// =============================================================================

/// Gemini API provider for lesson content and narration speech
pub struct GeminiProvider {
    client: HttpClient,
    base_url: String,
    api_key: String,
}

impl GeminiProvider {
    /// Create a provider using the default API server
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Create a provider with a custom base URL (for testing or proxies)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Build the generateContent URL for a model
    fn url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// The lesson-generation prompt (Mandarin, mirroring the course register)
    fn lesson_prompt(topic: &str) -> String {
        format!(
            "请创建一个关于 \"{topic}\" 的结构化迷你网课。\n\
             课程应包含正好 5 张幻灯片。\n\
             对于每张幻灯片，请提供：\n\
             1. 一个吸引人的中文标题。\n\
             2. 3-4 个总结关键概念的简洁中文要点。\n\
             3. 老师朗读的讲稿 (script)。讲稿应口语化、亲切、专业、具有教育意义，\
             长度约为 60-80 个字。以普通话口吻撰写，适合老师讲解。\n\
             请输出严格合法的 JSON 格式。"
        )
    }

    /// Response schema forcing the LessonContent wire shape
    fn lesson_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "topic": { "type": "STRING" },
                "slides": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "title": { "type": "STRING" },
                            "bulletPoints": {
                                "type": "ARRAY",
                                "items": { "type": "STRING" }
                            },
                            "script": {
                                "type": "STRING",
                                "description": "老师的中文口语讲稿"
                            }
                        },
                        "required": ["title", "bulletPoints", "script"]
                    }
                }
            },
            "required": ["topic", "slides"]
        })
    }
}

impl ContentProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    fn generate_lesson(&self, topic: &str) -> Result<LessonContent> {
        let body = json!({
            "contents": [{ "parts": [{ "text": Self::lesson_prompt(topic) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": Self::lesson_schema(),
            }
        });

        let resp: GenerateContentResponse =
            self.client
                .post_json(&self.url(CONTENT_MODEL), &self.api_key, &body)?;

        let text = resp
            .first_text()
            .ok_or_else(|| AppError::Provider("no content generated".to_string()))?;

        let lesson: LessonContent = serde_json::from_str(text)
            .map_err(|e| AppError::Provider(format!("malformed lesson JSON: {e}")))?;

        lesson.validate().map_err(AppError::Provider)?;
        Ok(lesson)
    }
}

impl SpeechProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    fn synthesize(&self, script: &str) -> Result<Vec<u8>> {
        let body = json!({
            "contents": [{ "parts": [{ "text": script }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": TTS_VOICE }
                    }
                }
            }
        });

        let resp: GenerateContentResponse =
            self.client
                .post_json(&self.url(TTS_MODEL), &self.api_key, &body)?;

        let payload = resp
            .first_inline_data()
            .ok_or_else(|| AppError::Provider("no audio generated".to_string()))?;

        let bytes = BASE64
            .decode(payload)
            .map_err(|e| AppError::Provider(format!("invalid audio payload: {e}")))?;

        if bytes.is_empty() {
            return Err(AppError::Provider("empty audio payload".to_string()));
        }
        Ok(bytes)
    }
}

// =============================================================================
// Tests
// =============================================================================
