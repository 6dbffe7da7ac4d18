// Completion backends

pub mod gemini;

pub use gemini::GeminiBackend;
