pub mod client;
pub mod normalize;

pub use client::{HttpInferenceClient, PoseClassifier};
pub use normalize::{normalize, DEFAULT_CONFIDENCE_PERCENT, MAX_FEEDBACK_LINES};
