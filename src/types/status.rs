//! Application readiness status

use serde::{Deserialize, Serialize};

/// Process-wide readiness of the prediction backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Nothing has answered yet
    #[default]
    Loading,
    /// A trained model is available
    Ready,
    /// Backend reachable but untrained, or unreachable
    WaitingForData,
}

impl Status {
    /// Map a `/health` status token.
    ///
    /// `ready` and `waiting_for_data` pass through; anything else means
    /// the backend is not usable yet.
    pub fn from_probe_token(token: &str) -> Self {
        match token {
            "ready" => Self::Ready,
            _ => Self::WaitingForData,
        }
    }

    /// Map the `dataset_ready` flag of a configuration response.
    pub const fn from_dataset_ready(dataset_ready: bool) -> Self {
        if dataset_ready {
            Self::Ready
        } else {
            Self::WaitingForData
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::WaitingForData => "waiting_for_data",
        }
    }

    /// Status tag shown to the operator.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Loading => "Loading…",
            Self::Ready => "Model Ready",
            Self::WaitingForData => "Waiting for Dataset",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_tokens_map_to_status() {
        assert_eq!(Status::from_probe_token("ready"), Status::Ready);
        assert_eq!(Status::from_probe_token("waiting_for_data"), Status::WaitingForData);
        assert_eq!(Status::from_probe_token("degraded"), Status::WaitingForData);
        assert_eq!(Status::from_probe_token(""), Status::WaitingForData);
    }

    #[test]
    fn display_uses_wire_tokens() {
        assert_eq!(Status::Loading.to_string(), "loading");
        assert_eq!(Status::Ready.to_string(), "ready");
        assert_eq!(Status::WaitingForData.to_string(), "waiting_for_data");
        assert_eq!(
            serde_json::to_string(&Status::WaitingForData).unwrap(),
            "\"waiting_for_data\""
        );
    }
}
