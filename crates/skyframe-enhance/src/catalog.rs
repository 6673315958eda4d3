//! Enhancement model catalogue.
//!
//! Clients select a model by short key. Each key maps to a Replicate model
//! slug plus a description surfaced in the model listing endpoint.

/// An AI enhancement model offered to clients.
#[derive(Debug, Clone, Copy)]
pub struct EnhanceModel {
    /// Short key clients pass when creating a job.
    pub key: &'static str,
    /// Replicate model slug.
    pub slug: &'static str,
    /// Human readable description for the model listing.
    pub description: &'static str,
}

/// Model key used when a job request does not name one.
pub const DEFAULT_MODEL_KEY: &str = "upscale";

/// Models exposed by the API, in listing order.
pub const MODELS: &[EnhanceModel] = &[
    EnhanceModel {
        key: "upscale",
        slug: "lucataco/real-esrgan-video",
        description: "General purpose video upscale, free-tier friendly",
    },
    EnhanceModel {
        key: "upscale_premium",
        slug: "topazlabs/video-upscale",
        description: "Premium quality upscale, paid",
    },
];

/// Look up a model by its key.
pub fn find_model(key: &str) -> Option<&'static EnhanceModel> {
    MODELS.iter().find(|m| m.key == key)
}
