//! Catalog JSON decoding.

use serde_json::Value;
use shelf_core::{CatalogEntry, Error};

/// Decode the catalog entry contents: a JSON array of catalog entries.
///
/// A malformed element fails the whole decode with an error naming its
/// index, so a broken snapshot never reaches the store.
pub fn decode_catalog(json: &[u8]) -> Result<Vec<CatalogEntry>, Error> {
    let json = json.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(json);

    let document: Value = serde_json::from_slice(json).map_err(|e| Error::CatalogDecode(e.to_string()))?;

    let Value::Array(items) = document else {
        return Err(Error::CatalogDecode("expected a JSON array of catalog entries".into()));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let id = item.get("id").and_then(Value::as_str).map(str::to_owned);
            serde_json::from_value::<CatalogEntry>(item).map_err(|e| match id {
                Some(id) => Error::CatalogDecode(format!("entry {index} (`{id}`): {e}")),
                None => Error::CatalogDecode(format!("entry {index}: {e}")),
            })
        })
        .collect()
}
