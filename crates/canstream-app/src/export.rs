use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use canstream_common::CanstreamError;
use canstream_ui::CanLogStore;

/// Write the CAN log as CSV. A directory gets a generated file name.
pub fn export_csv(store: &CanLogStore, path: &Path) -> canstream_common::Result<PathBuf> {
    let path = if path.is_dir() {
        path.join(store.export_file_name())
    } else {
        path.to_path_buf()
    };
    let file = File::create(&path)?;
    store
        .write_csv(BufWriter::new(file))
        .map_err(|e| CanstreamError::Ui(format!("CSV export failed: {e}")))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canstream_ui::SignalMap;
    use serde_json::json;

    #[test]
    fn directory_gets_generated_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = CanLogStore::new(10, SignalMap::default());

        let written = export_csv(&store, dir.path()).unwrap();
        assert_eq!(written, dir.path().join("can_log_empty.csv"));
        assert_eq!(
            std::fs::read_to_string(&written).unwrap(),
            "timestamp,id,extended,dlc,data,interpreted,value\n"
        );
    }

    #[test]
    fn file_path_is_used_as_given() {
        let dir = tempfile::tempdir().unwrap();
        let store = CanLogStore::new(10, SignalMap::default());
        store
            .ingest(&json!({"timestamp": "t1", "id": "0x300", "data": "F6"}))
            .unwrap();

        let path = dir.path().join("frames.csv");
        assert_eq!(export_csv(&store, &path).unwrap(), path);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("t1,0x300,,,F6,Temperature: -10.00 °C,-10\n"));
    }
}
