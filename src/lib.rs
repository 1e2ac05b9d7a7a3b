pub mod asset;
pub mod config;
pub mod constants;
pub mod display;
pub mod error;
pub mod logger;
pub mod probe;
pub mod retry;
pub mod service;
pub mod session;

pub use asset::{size_kib, CompressedAsset, CompressionResponse, ImageAsset, PreviewRef, SourceFile};
pub use config::{ClientConfig, Parameters, RetryPolicy};
pub use error::{ErrorKind, Result, SessionError};
pub use probe::{probe_dimensions, read_dimensions};
pub use retry::RetryingService;
pub use service::{CompressionRequest, CompressionService, HttpCompressionService};
pub use session::{CompressionSession, RequestId, SelectOutcome, SessionCore, SessionState};
