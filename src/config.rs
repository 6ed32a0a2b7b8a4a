use std::time::Duration;

/// Engine tunables with the defaults the live view shipped with.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Remote classifier endpoint; expects a multipart POST with an `image`
    /// field and answers JSON.
    pub endpoint: String,

    /// Fixed cadence of the sampling scheduler.
    pub sample_period: Duration,

    /// Hard timeout for one inference request.
    pub request_timeout: Duration,

    /// Cadence of the session clock, independent of sampling.
    pub clock_period: Duration,

    /// Detections retained for display, oldest evicted first.
    pub history_capacity: usize,

    /// Resolution requested from the camera.
    pub preferred_width: u32,
    pub preferred_height: u32,

    /// JPEG quality for sampled frames (0-100).
    pub jpeg_quality: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000/predict".to_string(),
            sample_period: Duration::from_millis(2000),
            request_timeout: Duration::from_secs(10),
            clock_period: Duration::from_secs(1),
            history_capacity: 5,
            preferred_width: 640,
            preferred_height: 480,
            jpeg_quality: 80,
        }
    }
}

impl EngineConfig {
    /// Defaults, with the endpoint overridable via `POSELIVE_ENDPOINT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(endpoint) = std::env::var("POSELIVE_ENDPOINT") {
            if !endpoint.is_empty() {
                config.endpoint = endpoint;
            }
        }
        config
    }
}
