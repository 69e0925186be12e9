use crate::models::{clamp_intensity, SceneAnalysis};
use crate::moods::{Mood, MOOD_TABLE};
use providers::{JsonPrompt, LlmProvider, ProviderRegistry};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Scene classifier backed by an external language model.
///
/// `classify` never fails: timeouts, transport errors, malformed JSON and
/// unknown moods all resolve to [`SceneAnalysis::fallback`].
#[derive(Clone)]
pub struct MoodClassifier {
    provider: Option<Arc<dyn LlmProvider>>,
    timeout: Duration,
    temperature: f32,
}

impl MoodClassifier {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self {
            provider: Some(provider),
            timeout,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Looks the provider up by name (or the registry's preferred one). A
    /// missing provider is logged and every call falls back.
    pub fn from_registry(registry: &ProviderRegistry, name: Option<&str>, timeout: Duration) -> Self {
        let provider = match registry.llm(name) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(error = %e, "no llm provider available, classification will use the fallback mood");
                None
            }
        };
        Self {
            provider,
            timeout,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub async fn classify(&self, scene: &str) -> SceneAnalysis {
        let Some(provider) = &self.provider else {
            return SceneAnalysis::fallback("no provider configured");
        };
        let prompt = JsonPrompt {
            system: system_prompt(),
            user: scene.to_string(),
            temperature: self.temperature,
        };

        let completion = match tokio::time::timeout(self.timeout, provider.complete_json(&prompt)).await {
            Ok(Ok(c)) => c,
            Ok(Err(e)) => {
                warn!(error = %e, "scene analysis request failed");
                return SceneAnalysis::fallback(&format!("provider error: {e}"));
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "scene analysis timed out");
                return SceneAnalysis::fallback("timed out");
            }
        };

        match parse_analysis(&completion.content) {
            Ok(analysis) => {
                info!(
                    primary = %analysis.primary_mood,
                    secondary = ?analysis.secondary_mood,
                    intensity = analysis.intensity,
                    "scene analysed"
                );
                analysis
            }
            Err(cause) => {
                warn!(cause = %cause, "unusable scene analysis");
                SceneAnalysis::fallback(&cause)
            }
        }
    }
}

pub fn system_prompt() -> String {
    let mut moods = String::new();
    for entry in MOOD_TABLE.iter() {
        moods.push_str(&format!("- {} ({})\n", entry.mood, entry.gloss));
    }
    format!(
        r#"당신은 게임 스토리 분석 전문가입니다.
주어진 에피소드나 씬 설명을 분석하여 적합한 배경음악의 무드를 추천해주세요.

사용 가능한 무드:
{moods}
중요:
1. "호기심"이나 "궁금증"은 'mysterious' 또는 'curious'를 선택하세요 (horror 아님)
2. "긴장"은 'suspense' 또는 'tension'을 선택하세요 (horror 아님)
3. "두려움"이나 "공포"가 명시적으로 있을 때만 'horror'를 선택하세요

JSON 형식으로 응답해주세요:
{{
  "primary_mood": "무드명",
  "secondary_mood": "무드명 또는 null",
  "intensity": 0.0-1.0,
  "emotional_tags": ["감정태그들"],
  "reasoning": "선택 이유 설명"
}}"#
    )
}

/// Fields are kept as raw JSON values and checked one by one.
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    primary_mood: Option<Value>,
    #[serde(default)]
    secondary_mood: Option<Value>,
    #[serde(default)]
    intensity: Option<Value>,
    #[serde(default)]
    emotional_tags: Option<Value>,
    #[serde(default)]
    reasoning: Option<Value>,
}

/// Parses the model's JSON answer. Only a missing or unknown primary mood is
/// an error; the other fields are sanitised.
pub fn parse_analysis(raw: &str) -> Result<SceneAnalysis, String> {
    let body = strip_code_fence(raw);
    let parsed: RawAnalysis =
        serde_json::from_str(body).map_err(|e| format!("malformed response: {e}"))?;

    let primary_raw = match parsed.primary_mood {
        Some(Value::String(s)) => s,
        Some(other) => return Err(format!("primary_mood is not a string: {other}")),
        None => return Err("response has no primary_mood".to_string()),
    };
    let primary: Mood = primary_raw
        .parse()
        .map_err(|_| format!("unrecognized primary_mood {primary_raw:?}"))?;

    let secondary = match parsed.secondary_mood {
        Some(Value::String(s)) => match s.trim() {
            "" | "null" | "none" | "None" => None,
            other => match other.parse::<Mood>() {
                Ok(m) => Some(m),
                Err(_) => {
                    debug!(secondary = %other, "dropping unrecognized secondary mood");
                    None
                }
            },
        },
        Some(Value::Null) | None => None,
        Some(other) => {
            debug!(secondary = %other, "dropping non-string secondary mood");
            None
        }
    };

    let intensity = parsed
        .intensity
        .as_ref()
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .map(clamp_intensity)
        .unwrap_or(0.5);

    let tags = match parsed.emotional_tags {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => vec![s],
        _ => Vec::new(),
    };

    let reasoning = match parsed.reasoning {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    Ok(SceneAnalysis::new(primary, secondary, intensity, tags, reasoning))
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
