//! Gemini `generateContent` wire format.
//!
//! Citation metadata comes back loosely typed; it is narrowed into
//! [`GroundingChunk`] here and nowhere else.

use geomind_core::Coordinates;
use serde::{Deserialize, Serialize};

use crate::types::{GroundingChunk, Message, Mode, Role};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmptyObject {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum Tool {
    GoogleMaps(EmptyObject),
    GoogleSearch(EmptyObject),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ToolConfig {
    pub retrieval_config: RetrievalConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RetrievalConfig {
    pub lat_lng: LatLng,
}

#[derive(Debug, Serialize)]
pub(crate) struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl GenerateContentRequest {
    /// History turns in order, then the new prompt as a final user turn.
    pub fn build(
        prompt: &str,
        history: &[Message],
        mode: Mode,
        location: Option<Coordinates>,
    ) -> Self {
        let contents = history
            .iter()
            .map(|msg| Content {
                role: msg.role.as_str(),
                parts: vec![Part {
                    text: msg.text.clone(),
                }],
            })
            .chain(std::iter::once(Content {
                role: Role::User.as_str(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }))
            .collect();

        let (tools, tool_config) = if mode.is_grounded() {
            (
                vec![
                    Tool::GoogleMaps(EmptyObject {}),
                    Tool::GoogleSearch(EmptyObject {}),
                ],
                location.map(|c| ToolConfig {
                    retrieval_config: RetrievalConfig {
                        lat_lng: LatLng {
                            latitude: c.lat,
                            longitude: c.lng,
                        },
                    },
                }),
            )
        } else {
            (Vec::new(), None)
        };

        Self {
            contents,
            tools,
            tool_config,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    pub content: Option<CandidateContent>,
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidatePart {
    pub text: Option<String>,
    #[serde(default)]
    pub thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroundingMetadata {
    pub grounding_chunks: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct RawChunk {
    web: Option<RawWeb>,
    maps: Option<RawMaps>,
}

#[derive(Debug, Deserialize)]
struct RawWeb {
    uri: String,
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMaps {
    uri: String,
    title: String,
    place_id: Option<String>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, joined. `None` when there are none.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }

    /// Citations of the first candidate, or `None` when it carries no
    /// citation metadata at all.
    pub fn grounding_chunks(&self) -> Option<Vec<GroundingChunk>> {
        let raw = self
            .candidates
            .first()?
            .grounding_metadata
            .as_ref()?
            .grounding_chunks
            .as_ref()?;

        Some(raw.iter().filter_map(narrow_chunk).collect())
    }
}

fn narrow_chunk(value: &serde_json::Value) -> Option<GroundingChunk> {
    let raw: RawChunk = serde_json::from_value(value.clone()).ok()?;
    if let Some(web) = raw.web {
        return Some(GroundingChunk::Web {
            uri: web.uri,
            title: web.title,
        });
    }
    raw.maps.map(|maps| GroundingChunk::Maps {
        uri: maps.uri,
        title: maps.title,
        place_id: maps.place_id,
    })
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}
