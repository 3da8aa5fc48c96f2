use crate::io::atomic_write;
use anyhow::{Context, Result};
use recoflow_core::Vocabulary;
use std::path::Path;
use tracing::info;

pub fn save_vocabulary(path: &Path, vocabulary: &Vocabulary) -> Result<()> {
    let json = serde_json::to_vec_pretty(vocabulary)?;
    atomic_write(path, &json)?;
    info!(
        path = %path.display(),
        version = vocabulary.version(),
        users = vocabulary.num_users(),
        items = vocabulary.num_items(),
        "saved vocabulary"
    );
    Ok(())
}

/// Load a vocabulary artifact; an unknown format version is an error
pub fn load_vocabulary(path: &Path) -> Result<Vocabulary> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading vocabulary {}", path.display()))?;
    let vocabulary: Vocabulary = serde_json::from_str(&data)
        .with_context(|| format!("parsing vocabulary {}", path.display()))?;
    Ok(vocabulary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recoflow_core::VOCABULARY_FORMAT;

    #[test]
    fn test_vocabulary_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocabulary.json");

        let mut vocab = Vocabulary::new();
        vocab.intern_user("u1");
        vocab.intern_item("10");
        vocab.intern_item("20");

        save_vocabulary(&path, &vocab).unwrap();
        let loaded = load_vocabulary(&path).unwrap();
        assert_eq!(loaded, vocab);
        assert_eq!(loaded.item_index("20"), Some(1));
    }

    #[test]
    fn test_unknown_format_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocabulary.json");
        let doc = serde_json::json!({
            "format": VOCABULARY_FORMAT + 1,
            "version": 1,
            "users": [],
            "items": []
        });
        std::fs::write(&path, doc.to_string()).unwrap();

        let err = load_vocabulary(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing vocabulary"));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_vocabulary(&dir.path().join("absent.json")).is_err());
    }
}
