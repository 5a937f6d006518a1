use crate::error::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// One tabular row from a vendor export: column name → raw string value.
pub type RawRecord = BTreeMap<String, String>;

/// Load every `*.json` export file under `dir`, in filename order.
///
/// Each file holds an array of records (objects of string values). Vendor
/// CSV exports are converted upstream; this source only consumes the
/// column-map shape.
pub async fn load_records(dir: impl AsRef<Path>) -> Result<Vec<RawRecord>> {
    let dir = dir.as_ref();
    let mut paths = Vec::new();

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut records = Vec::new();
    for path in paths {
        log::info!("Loading {}", path.display());
        let bytes = tokio::fs::read(&path).await?;
        let mut rows: Vec<RawRecord> = serde_json::from_slice(&bytes)?;
        records.append(&mut rows);
    }

    Ok(records)
}
