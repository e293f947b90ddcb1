//! Configuration constants for lectern app services

/// Gemini API configuration
pub mod gemini {
    /// Default API server
    pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// Model used for structured lesson generation
    pub const CONTENT_MODEL: &str = "gemini-2.5-flash";

    /// Model used for speech synthesis
    pub const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

    /// Prebuilt voice for narration (clear neutral tone, works well for
    /// Mandarin scripts)
    pub const TTS_VOICE: &str = "Kore";

    /// Environment variable holding the API credential
    pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
}

/// Lesson content contract
pub mod lesson {
    /// Number of slides a generated lesson must contain
    pub const SLIDE_COUNT: usize = 5;

    /// Maximum bullet points accepted per slide (the prompt asks for 3-4)
    pub const MAX_BULLETS: usize = 6;

    /// Quick-pick topics shown on the start screen
    pub const QUICK_TOPICS: [&str; 4] = [
        "量子力学入门",
        "2025 AI 趋势",
        "制作完美酸面包",
        "罗马帝国史",
    ];
}

/// Network-related configuration
pub mod network {
    /// User agent for HTTP requests
    pub const USER_AGENT: &str = concat!("Lectern/", env!("CARGO_PKG_VERSION"));

    /// Connection timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Read timeout in seconds — lesson generation can take a while
    pub const READ_TIMEOUT_SECS: u64 = 120;
}
