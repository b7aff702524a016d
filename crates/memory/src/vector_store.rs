//! Vector collection contract (spec.md §6.3) and the in-memory brute-force
//! implementation this core ships with. A real ANN-backed collection can
//! swap in behind the same trait without touching `MemoryManager`.

use serde::{Deserialize, Serialize};

use crate::schema::{Record, RecordMetadata};

/// Result of a similarity query: parallel arrays, closest first.
#[derive(Debug, Default, Clone)]
pub struct QueryResult {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub metadatas: Vec<RecordMetadata>,
    pub distances: Vec<f32>,
}

pub trait VectorCollection: Send {
    fn add(&mut self, id: String, embedding: Vec<f32>, document: String, metadata: RecordMetadata);
    fn query(&self, embedding: &[f32], n: usize) -> QueryResult;
    fn get(&self) -> Vec<Record>;
    fn persist(&self) -> anyhow::Result<()>;
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedRecords {
    records: Vec<Record>,
}

/// Brute-force cosine-similarity store backed by a JSON file. Adequate at the
/// record counts a single-agent conversational core accumulates; an ANN
/// index would be the drop-in replacement behind `VectorCollection`.
pub struct InMemoryCollection {
    path: std::path::PathBuf,
    records: Vec<Record>,
}

impl InMemoryCollection {
    pub fn load_or_create(path: impl Into<std::path::PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let records = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<PersistedRecords>(&raw)?.records,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, records })
    }
}

impl VectorCollection for InMemoryCollection {
    fn add(&mut self, id: String, embedding: Vec<f32>, document: String, metadata: RecordMetadata) {
        self.records.push(Record {
            id,
            document,
            metadata,
            embedding,
        });
    }

    fn query(&self, embedding: &[f32], n: usize) -> QueryResult {
        let mut scored: Vec<(f32, &Record)> = self
            .records
            .iter()
            .map(|r| (cosine_similarity(embedding, &r.embedding), r))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut out = QueryResult::default();
        for (score, record) in scored.into_iter().take(n) {
            out.ids.push(record.id.clone());
            out.documents.push(record.document.clone());
            out.metadatas.push(record.metadata.clone());
            out.distances.push(1.0 - score);
        }
        out
    }

    fn get(&self) -> Vec<Record> {
        self.records.clone()
    }

    fn persist(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = PersistedRecords {
            records: self.records.clone(),
        };
        let raw = serde_json::to_string_pretty(&payload)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}
