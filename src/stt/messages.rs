use serde::{Deserialize, Serialize};

/// One recognition hypothesis inside a streaming result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alternative {
    #[serde(default)]
    pub text: String,
}

/// Inbound message on the recognition socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingResult {
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
    #[serde(rename = "final", default)]
    pub is_final: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

impl StreamingResult {
    /// Finalized non-empty transcript carried by this message, if any.
    /// Interim results and empty alternatives yield `None`.
    pub fn final_text(&self) -> Option<&str> {
        if !self.is_final {
            return None;
        }
        let text = self.alternatives.first()?.text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
