//! Upload handling for docscan: which documents are accepted, and where
//! their bytes live while the engine reads them.

pub mod mime_detect;
pub mod staging;

pub use mime_detect::{
    ALLOWED_EXTENSIONS, allowed_extensions_display, detect_mime_type, is_allowed_extension,
    is_pdf, normalized_extension,
};
pub use staging::{StagingError, TempArtifact};
