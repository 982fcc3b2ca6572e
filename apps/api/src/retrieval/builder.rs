//! Index Builder — turns the question dataset into a persisted embedding index.
//!
//! This is the only write path for the index. It is an offline batch job and
//! replaces the stored index wholesale.

use std::fs::File;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::retrieval::embedding::{validate_embeddings, Embedder};
use crate::retrieval::error::IndexError;
use crate::retrieval::models::{annotate_question, IndexEntry, QuestionMetadata, QuestionRecord};
use crate::retrieval::store::{IndexManifest, IndexStore, StoredIndex, INDEX_FORMAT_VERSION};

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub build_id: Uuid,
    pub entry_count: usize,
    /// Records dropped because their question text was blank.
    pub skipped: usize,
    pub dimensions: usize,
    pub model: String,
}

/// Reads the question dataset (CSV with a header row).
pub fn load_records(path: &Path) -> Result<Vec<QuestionRecord>, IndexError> {
    let file = File::open(path).map_err(|e| IndexError::io(path, e))?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    for row in reader.deserialize::<QuestionRecord>() {
        let record = row.map_err(|source| IndexError::Dataset {
            path: path.to_path_buf(),
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Embeds every non-blank record and swaps the result in as the new index.
///
/// Fails with [`IndexError::EmptyInput`] before touching storage when no
/// record survives filtering, so an existing index is never replaced by an
/// empty one.
pub async fn build_index(
    records: Vec<QuestionRecord>,
    embedder: &dyn Embedder,
    store: &dyn IndexStore,
    batch_size: usize,
    source: &str,
) -> Result<BuildReport, IndexError> {
    let total = records.len();
    let units: Vec<(String, QuestionMetadata)> = records
        .iter()
        .filter_map(|record| {
            let text = record.question()?;
            let metadata = record.metadata();
            Some((annotate_question(text, &metadata), metadata))
        })
        .collect();
    let skipped = total - units.len();

    if units.is_empty() {
        warn!("index build aborted: all {total} records have blank question text");
        return Err(IndexError::EmptyInput);
    }

    info!(
        "building question index: {} records ({skipped} skipped) with model {}",
        units.len(),
        embedder.model_id()
    );

    let contents: Vec<String> = units.iter().map(|(content, _)| content.clone()).collect();
    let mut embeddings = Vec::with_capacity(contents.len());
    for batch in contents.chunks(batch_size.max(1)) {
        let vectors = embedder.embed_batch(batch).await?;
        validate_embeddings(batch.len(), &vectors)?;
        embeddings.extend(vectors);
    }

    // Batches are validated one by one; this also rejects drift between batches.
    let dimensions = validate_embeddings(contents.len(), &embeddings)?;

    let entries: Vec<IndexEntry> = units
        .into_iter()
        .zip(embeddings)
        .map(|((content, metadata), embedding)| IndexEntry {
            content,
            metadata,
            embedding,
        })
        .collect();

    let manifest = IndexManifest {
        format_version: INDEX_FORMAT_VERSION,
        build_id: Uuid::new_v4(),
        model: embedder.model_id().to_string(),
        dimensions,
        entry_count: entries.len(),
        built_at: Utc::now(),
        source: source.to_string(),
    };
    let report = BuildReport {
        build_id: manifest.build_id,
        entry_count: manifest.entry_count,
        skipped,
        dimensions,
        model: manifest.model.clone(),
    };

    store.write(&StoredIndex { manifest, entries })?;

    info!(
        "question index {} written to {}: {} entries, {} dimensions",
        report.build_id,
        store.location().display(),
        report.entry_count,
        report.dimensions
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::store::FsIndexStore;
    use crate::retrieval::test_support::StubEmbedder;

    fn stub() -> StubEmbedder {
        StubEmbedder::new(vec![
            ("A", vec![1.0, 0.0, 0.0]),
            ("B", vec![0.0, 1.0, 0.0]),
            ("C", vec![0.0, 0.0, 1.0]),
        ])
    }

    #[tokio::test]
    async fn test_build_filters_blank_questions() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsIndexStore::new(dir.path().join("db"));
        let records = vec![
            QuestionRecord::new("A", "X", "신입", "백엔드"),
            QuestionRecord::new("", "Y", "경력", "프론트엔드"),
            QuestionRecord::new("   ", "Z", "경력", "데이터"),
            QuestionRecord {
                text: None,
                ..QuestionRecord::new("", "W", "신입", "AI")
            },
        ];

        let report = build_index(records, &stub(), &store, 8, "inline").await.unwrap();
        assert_eq!(report.entry_count, 1);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.dimensions, 3);

        let stored = store.read().unwrap();
        assert_eq!(stored.entries.len(), 1);
        assert_eq!(
            stored.entries[0].content,
            "A [기업명: X, 경력: 신입, 직무: 백엔드]"
        );
        assert_eq!(stored.manifest.model, "stub-embedder");
    }

    #[tokio::test]
    async fn test_build_batches_embedding_calls() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsIndexStore::new(dir.path().join("db"));
        let embedder = stub();
        let records = vec![
            QuestionRecord::new("A", "X", "신입", "백엔드"),
            QuestionRecord::new("B", "X", "신입", "백엔드"),
            QuestionRecord::new("C", "X", "신입", "백엔드"),
        ];

        build_index(records, &embedder, &store, 2, "inline").await.unwrap();
        assert_eq!(embedder.batch_sizes(), vec![2, 1]);
        assert_eq!(store.read().unwrap().entries.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_rebuild_keeps_existing_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsIndexStore::new(dir.path().join("db"));
        let first = build_index(
            vec![QuestionRecord::new("A", "X", "신입", "백엔드")],
            &stub(),
            &store,
            8,
            "inline",
        )
        .await
        .unwrap();

        let err = build_index(
            vec![QuestionRecord::new("  ", "X", "신입", "백엔드")],
            &stub(),
            &store,
            8,
            "inline",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, IndexError::EmptyInput));

        let stored = store.read().unwrap();
        assert_eq!(stored.manifest.build_id, first.build_id);
        assert_eq!(stored.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_embedding_failure_leaves_existing_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsIndexStore::new(dir.path().join("db"));
        let first = build_index(
            vec![QuestionRecord::new("A", "X", "신입", "백엔드")],
            &stub(),
            &store,
            8,
            "inline",
        )
        .await
        .unwrap();

        let err = build_index(
            vec![QuestionRecord::new("B", "X", "신입", "백엔드")],
            &StubEmbedder::failing(),
            &store,
            8,
            "inline",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, IndexError::Embedding(_)));
        assert_eq!(store.read().unwrap().manifest.build_id, first.build_id);
    }

    #[test]
    fn test_load_records_reads_korean_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset_question.csv");
        std::fs::write(
            &path,
            "질문,기업명,경력,직무\n\
             본인의 강점은 무엇인가요?,카카오,신입,백엔드\n\
             ,라인,경력,iOS\n\
             \"협업 경험을 말해주세요, 구체적으로\",쿠팡,경력,데이터\n",
        )
        .unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].question(), Some("본인의 강점은 무엇인가요?"));
        assert_eq!(records[0].company, "카카오");
        assert_eq!(records[0].experience_level, "신입");
        assert_eq!(records[0].role, "백엔드");
        assert!(records[1].question().is_none());
        assert_eq!(records[2].question(), Some("협업 경험을 말해주세요, 구체적으로"));
    }

    #[test]
    fn test_load_records_missing_file_is_io_error_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.csv");
        match load_records(&path) {
            Err(IndexError::Io { path: failing, .. }) => assert_eq!(failing, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
