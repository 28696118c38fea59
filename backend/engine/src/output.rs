//! Reading the engine's saved results.
//!
//! `paddleocr doc_parser --save_path DIR` writes one `<stem>_res.json` per
//! page (PDFs) or per image. The files are returned as-is, ordered by their
//! `page_index` field and then by name.

use std::path::Path;

use docscan_core::EngineError;
use serde_json::Value;
use tracing::{debug, warn};

/// Load every `*.json` file directly inside `dir`.
pub async fn collect_json_results(dir: &Path) -> Result<Vec<Value>, EngineError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut pages: Vec<(u64, String, Value)> = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if !is_json || !entry.file_type().await?.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let raw = tokio::fs::read(&path).await?;
        let value: Value = serde_json::from_slice(&raw).map_err(|e| {
            warn!(file = %name, error = %e, "Engine wrote invalid JSON");
            EngineError::Output(format!("{name}: {e}"))
        })?;

        let page = page_index(&value);
        debug!(file = %name, page, "Loaded engine result");
        pages.push((page, name, value));
    }

    pages.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
    Ok(pages.into_iter().map(|(_, _, value)| value).collect())
}

/// `page_index` is null for single images; those sort first.
fn page_index(value: &Value) -> u64 {
    value.get("page_index").and_then(Value::as_u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, value: &Value) {
        std::fs::write(dir.join(name), serde_json::to_vec(value).unwrap()).unwrap();
    }

    #[tokio::test]
    async fn orders_pages_numerically() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "doc_10_res.json", &json!({ "page_index": 10 }));
        write(dir.path(), "doc_2_res.json", &json!({ "page_index": 2 }));
        write(dir.path(), "doc_0_res.json", &json!({ "page_index": 0 }));
        std::fs::write(dir.path().join("doc_0_res.md"), "# markdown").unwrap();

        let results = collect_json_results(dir.path()).await.unwrap();
        let pages: Vec<_> = results.iter().map(|v| v["page_index"].as_u64().unwrap()).collect();
        assert_eq!(pages, [0, 2, 10]);
    }

    #[tokio::test]
    async fn single_image_has_null_page_index() {
        let dir = tempfile::tempdir().unwrap();
        let page = json!({
            "page_index": null,
            "parsing_res_list": [{ "block_label": "text", "block_content": "Invoice #42" }]
        });
        write(dir.path(), "upload_res.json", &page);

        let results = collect_json_results(dir.path()).await.unwrap();
        assert_eq!(results, vec![page]);
    }

    #[tokio::test]
    async fn invalid_json_is_output_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken_res.json"), "{ not json").unwrap();

        let err = collect_json_results(dir.path()).await.unwrap_err();
        assert!(matches!(err, EngineError::Output(_)));
    }
}
