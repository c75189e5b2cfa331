//! Catalog entry model.
//!
//! Field names follow the catalog's JSON encoding (camelCase), which is also
//! the shape records keep once they are cached.

use serde::{Deserialize, Deserializer, Serialize, de};

/// Key field declared for catalog collections.
pub const CATALOG_KEY_FIELD: &str = "id";

/// One e-book in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub file_extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Byte count. Accepts a JSON number or a decimal string.
    #[serde(deserialize_with = "size_from_number_or_string")]
    pub size: u64,
    #[serde(default)]
    pub created_time: String,
    #[serde(default)]
    pub modified_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_content_link: Option<String>,
}

impl CatalogEntry {
    /// Size in mebibytes, formatted with two decimals (e.g. `8.11 MB`).
    pub fn display_size(&self) -> String {
        format!("{:.2} MB", self.size as f64 / (1024.0 * 1024.0))
    }
}

fn size_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawSize {
        Number(u64),
        Text(String),
    }

    match RawSize::deserialize(deserializer)? {
        RawSize::Number(n) => Ok(n),
        RawSize::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| de::Error::custom(format!("size `{s}` is not a non-negative integer"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_drive_export() {
        let json = r#"{
            "kind": "drive#file",
            "fileExtension": "epub",
            "mimeType": "application/epub+zip",
            "webViewLink": "https://drive.example.com/file/d/145q/view",
            "webContentLink": "https://drive.example.com/uc?id=145q&export=download",
            "size": "8506621",
            "id": "145q",
            "name": "세이노의 가르침.epub",
            "createdTime": "2023-09-03T13:49:07.467Z",
            "modifiedTime": "2023-09-03T13:23:38.000Z"
        }"#;

        let entry: CatalogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, "145q");
        assert_eq!(entry.size, 8_506_621);
        assert_eq!(entry.file_extension, "epub");
        assert_eq!(entry.mime_type.as_deref(), Some("application/epub+zip"));
    }

    #[test]
    fn test_size_as_number() {
        let entry: CatalogEntry = serde_json::from_str(r#"{"id":"a","name":"Alpha","size":10}"#).unwrap();
        assert_eq!(entry.size, 10);
        assert!(entry.web_view_link.is_none());
    }

    #[test]
    fn test_size_rejects_garbage() {
        let err = serde_json::from_str::<CatalogEntry>(r#"{"id":"a","name":"Alpha","size":"ten"}"#).unwrap_err();
        assert!(err.to_string().contains("ten"));
    }

    #[test]
    fn test_serializes_size_as_number() {
        let entry: CatalogEntry = serde_json::from_str(r#"{"id":"a","name":"Alpha","size":"10"}"#).unwrap();
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["size"], serde_json::json!(10));
        assert_eq!(value["fileExtension"], serde_json::json!(""));
    }

    #[test]
    fn test_display_size() {
        let entry = CatalogEntry {
            id: "a".into(),
            name: "Alpha".into(),
            file_extension: "pdf".into(),
            mime_type: None,
            size: 8_506_621,
            created_time: String::new(),
            modified_time: String::new(),
            web_view_link: None,
            web_content_link: None,
        };
        assert_eq!(entry.display_size(), "8.11 MB");
    }
}
