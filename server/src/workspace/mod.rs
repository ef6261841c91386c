mod service;

pub use service::WorkspaceService;
