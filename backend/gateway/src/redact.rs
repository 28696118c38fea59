//! Scrubs server-side paths out of engine results.
//!
//! The engine echoes its input path (`input_path`) in every page it returns.
//! Clients only ever see the name they uploaded.

use serde_json::Value;

/// Replace every occurrence of `staged` inside string values with `upload_name`.
pub fn redact_staged_path(value: &mut Value, staged: &str, upload_name: &str) {
    if staged.is_empty() {
        return;
    }
    match value {
        Value::String(s) if s.contains(staged) => *s = s.replace(staged, upload_name),
        Value::Array(items) => {
            for item in items {
                redact_staged_path(item, staged, upload_name);
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                redact_staged_path(item, staged, upload_name);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replaces_nested_paths_only() {
        let staged = "/tmp/docscan-upload-k3j9.pdf";
        let mut page = json!({
            "input_path": staged,
            "page_index": 1,
            "parsing_res_list": [
                { "block_label": "text", "block_content": "Total: 42" },
                { "block_label": "image", "block_image_path": format!("{staged}_img_0.png") }
            ]
        });

        redact_staged_path(&mut page, staged, "invoice.pdf");

        assert_eq!(page["input_path"], "invoice.pdf");
        assert_eq!(page["page_index"], 1);
        assert_eq!(page["parsing_res_list"][0]["block_content"], "Total: 42");
        assert_eq!(
            page["parsing_res_list"][1]["block_image_path"],
            "invoice.pdf_img_0.png"
        );
    }
}
