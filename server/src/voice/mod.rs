mod service;

pub use service::VoiceService;
