//! Typed clients for the individual proxy endpoints.

pub mod audio;
pub mod chat;
pub mod deepfake;
pub mod image;
pub mod tokens;
pub mod video;

pub use audio::{AudioClient, AudioRequest};
pub use chat::{ChatClient, ChatMessage, ChatRequest};
pub use deepfake::{DeepfakeClient, DeepfakeRequest};
pub use image::{ImageClient, ImageRequest};
pub use tokens::{EarnResponse, TokenClient, TokenData};
pub use video::{VideoClient, VideoRequest};

/// Paths of the proxy endpoints, relative to the base URL.
pub mod paths {
    pub const IMAGE: &str = "/image";
    pub const IMAGE_FETCH: &str = "/image-fetch";
    pub const VIDEO: &str = "/video";
    pub const VIDEO_STATUS: &str = "/video-status";
    pub const VIDEO_FETCH: &str = "/video-fetch";
    pub const DEEPFAKE_SWAP: &str = "/deepfake-swap";
    pub const DEEPFAKE_FETCH: &str = "/deepfake-fetch";
    pub const AUDIO: &str = "/asmr";
    pub const AUDIO_FETCH: &str = "/asmr-fetch";
    pub const CHAT: &str = "/chat";
    pub const EARN_TOKENS: &str = "/earn-tokens";
    pub const GET_TOKEN_DATA: &str = "/get-token-data";
}

/// Serialize a request struct into a JSON body.
pub(crate) fn to_body<T: serde::Serialize>(request: &T) -> Result<serde_json::Value, genproxy_core::ClientError> {
    serde_json::to_value(request)
        .map_err(|e| genproxy_core::ClientError::InvalidRequest(e.to_string()))
}
