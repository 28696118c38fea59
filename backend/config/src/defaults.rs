//! Default values for every setting.

pub const DEFAULT_APP_NAME: &str = "PaddleOCR-VL Service";

pub const DEFAULT_APP_VERSION: &str = "1.0.0";

pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 8000;

pub const DEFAULT_API_V1_PREFIX: &str = "/api/v1";

/// 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Kept low: each extraction pins GPU memory for its whole duration.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 3;

pub const DEFAULT_ADMISSION_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 600;

pub const DEFAULT_ENGINE_COMMAND: &str = "paddleocr";

pub const DEFAULT_GPU_PROBE_COMMAND: &str = "nvidia-smi";

pub const DEFAULT_DEVICE: &str = "gpu";

pub const DEFAULT_LOG_LEVEL: &str = "info";
