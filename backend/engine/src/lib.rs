//! `docscan-engine` — the PaddleOCR-VL engine behind docscan.
//!
//! The model itself is an external dependency. This crate only knows how to
//! check that it can run (GPU present, CLI installed) and how to invoke it
//! on a staged file.

pub mod exec;
pub mod gpu;
pub mod output;
pub mod paddle;

pub use gpu::{GpuDevice, parse_device_list, probe_gpus};
pub use paddle::{PaddleOcrVlConfig, PaddleOcrVlEngine, PaddleOcrVlFactory};
