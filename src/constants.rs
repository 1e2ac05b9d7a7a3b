use std::time::Duration;

pub const DEFAULT_SCALE_PERCENT: i32 = 100;
pub const DEFAULT_QUALITY: i32 = 60;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const COMPRESS_ENDPOINT: &str = "/api/compress";

// Multipart field names expected by the compression service
pub const IMAGE_FIELD: &str = "image";
pub const SCALE_FIELD: &str = "scale";
pub const QUALITY_FIELD: &str = "quality";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RESPONSE_DEADLINE: Duration = Duration::from_secs(120);

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(250);
pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(4);

/// Maximum file size accepted for upload (100MB)
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

pub const BYTES_PER_KIB: f64 = 1024.0;

pub const PROGRESS_SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";

// Common output message prefixes
pub const ORIGINAL_PREFIX: &str = "📊";
pub const COMPRESSED_PREFIX: &str = "📈";
pub const RATIO_PREFIX: &str = "🎯";
pub const SUCCESS_PREFIX: &str = "✅";
pub const WARNING_PREFIX: &str = "⚠️";
pub const ERROR_PREFIX: &str = "❌";
pub const INFO_PREFIX: &str = "📋";
