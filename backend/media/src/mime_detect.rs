//! Document type detection for uploads.
//!
//! The allow-list is extension based: the engine dispatches on the file
//! suffix, so the staged file keeps the uploaded extension.

use std::path::Path;

/// Extensions the engine accepts, lowercase with the leading dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".bmp", ".tiff", ".tif", ".pdf"];

/// Lowercased extension of a file name, including the dot (`"Scan.PDF"` → `".pdf"`).
///
/// Returns `None` when there is no extension. Any directory part a client
/// sneaks into the name is ignored.
pub fn normalized_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
}

/// Whether a normalized extension (see [`normalized_extension`]) is accepted.
pub fn is_allowed_extension(extension: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&extension)
}

/// The allow-list as shown in client error messages.
pub fn allowed_extensions_display() -> String {
    ALLOWED_EXTENSIONS.join(", ")
}

/// Detect MIME type by file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "bmp"          => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "pdf"          => "application/pdf",
        _              => "application/octet-stream",
    }
}

/// Whether a path names a PDF (multi-page input for the engine).
pub fn is_pdf(path: &Path) -> bool {
    detect_mime_type(path) == "application/pdf"
}
