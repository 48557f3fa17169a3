use std::io::{BufWriter, Cursor, Write};
use std::path::PathBuf;

use lopdf::{Document, Object, ObjectId};
use thiserror::Error;

use crate::services::workspace::StagedFile;

/// Destination for the finalized document, selected by the caller.
#[derive(Debug, Clone)]
pub enum Sink {
    /// Materialize the finalized bytes in memory.
    Memory,
    /// Write the finalized document to the given path, normally a location
    /// inside the request workspace.
    File(PathBuf),
}

/// The single output PDF produced by one request.
#[derive(Debug)]
pub enum MergedArtifact {
    Memory(Vec<u8>),
    File(PathBuf),
}

impl MergedArtifact {
    /// The finalized bytes, read back from disk for file sinks.
    pub fn into_bytes(self) -> Result<Vec<u8>, MergeError> {
        match self {
            Self::Memory(bytes) => Ok(bytes),
            Self::File(path) => {
                std::fs::read(&path).map_err(|e| MergeError::Finalize(e.to_string()))
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("no staged documents to merge")]
    NoInputs,

    #[error("failed to load {name}: {reason}")]
    InvalidDocument { name: String, reason: String },

    #[error("document {name} has no pages")]
    EmptyDocument { name: String },

    #[error("merge failed: {0}")]
    Structure(String),

    #[error("failed to finalize merged document: {0}")]
    Finalize(String),

    #[error("merge task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Appends staged documents page by page, in submission order, into a
/// single output document.
pub struct PdfMerger;

impl PdfMerger {
    pub fn new() -> Self {
        Self
    }

    /// Merge the staged documents into `sink`.
    ///
    /// Every input is parsed before any output is produced; one unreadable
    /// document fails the whole operation and nothing reaches the sink.
    pub async fn merge(
        &self,
        inputs: &[StagedFile],
        sink: Sink,
    ) -> Result<MergedArtifact, MergeError> {
        if inputs.is_empty() {
            return Err(MergeError::NoInputs);
        }

        let inputs: Vec<(String, PathBuf)> = inputs
            .iter()
            .map(|f| (f.original_name.clone(), f.path.clone()))
            .collect();

        // lopdf parses and serializes synchronously; keep the runtime free
        // while the whole merge runs.
        tokio::task::spawn_blocking(move || merge_blocking(&inputs, sink)).await?
    }
}

impl Default for PdfMerger {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_blocking(
    inputs: &[(String, PathBuf)],
    sink: Sink,
) -> Result<MergedArtifact, MergeError> {
    let mut documents = Vec::with_capacity(inputs.len());

    for (name, path) in inputs {
        let doc = Document::load(path).map_err(|e| MergeError::InvalidDocument {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        if doc.get_pages().is_empty() {
            return Err(MergeError::EmptyDocument { name: name.clone() });
        }

        documents.push(doc);
    }

    let merged = concat_documents(documents)?;
    finalize(merged, sink)
}

/// Splice every document's pages, in order, into the first document's
/// page tree.
fn concat_documents(documents: Vec<Document>) -> Result<Document, MergeError> {
    let mut documents = documents.into_iter();
    let Some(mut merged) = documents.next() else {
        return Err(MergeError::NoInputs);
    };

    let pages_root = pages_root_id(&merged)?;
    let mut max_id = merged.max_id;

    for mut doc in documents {
        // Shift object ids past the merged document's range
        doc.renumber_objects_with(max_id + 1);
        max_id = doc.max_id;

        let doc_pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        merged.objects.extend(doc.objects);

        append_to_page_tree(&mut merged, pages_root, &doc_pages)?;
    }

    merged.prune_objects();
    merged.renumber_objects();
    merged.compress();

    Ok(merged)
}

fn pages_root_id(doc: &Document) -> Result<ObjectId, MergeError> {
    let catalog = doc
        .catalog()
        .map_err(|e| MergeError::Structure(format!("missing catalog: {e}")))?;

    catalog
        .get(b"Pages")
        .and_then(|pages| pages.as_reference())
        .map_err(|e| MergeError::Structure(format!("missing page tree root: {e}")))
}

fn append_to_page_tree(
    merged: &mut Document,
    pages_root: ObjectId,
    page_ids: &[ObjectId],
) -> Result<(), MergeError> {
    // Reparent the incoming pages; their original Pages node is left
    // unreferenced and pruned later.
    for &page_id in page_ids {
        match merged.get_object_mut(page_id) {
            Ok(Object::Dictionary(page)) => page.set("Parent", pages_root),
            _ => {
                return Err(MergeError::Structure(format!(
                    "page object {page_id:?} is not a dictionary"
                )));
            }
        }
    }

    let pages = merged
        .get_object_mut(pages_root)
        .map_err(|e| MergeError::Structure(format!("failed to resolve page tree root: {e}")))?;

    let Object::Dictionary(dict) = pages else {
        return Err(MergeError::Structure(
            "page tree root is not a dictionary".to_string(),
        ));
    };

    let kids = dict
        .get_mut(b"Kids")
        .map_err(|_| MergeError::Structure("page tree root has no Kids array".to_string()))?;

    let Object::Array(kids) = kids else {
        return Err(MergeError::Structure("Kids is not an array".to_string()));
    };

    for &page_id in page_ids {
        kids.push(Object::Reference(page_id));
    }

    let count = dict.get(b"Count").and_then(|c| c.as_i64()).unwrap_or(0);
    dict.set("Count", Object::Integer(count + page_ids.len() as i64));

    Ok(())
}

fn finalize(mut merged: Document, sink: Sink) -> Result<MergedArtifact, MergeError> {
    match sink {
        Sink::Memory => {
            let mut cursor = Cursor::new(Vec::new());
            merged
                .save_to(&mut cursor)
                .map_err(|e| MergeError::Finalize(e.to_string()))?;
            Ok(MergedArtifact::Memory(cursor.into_inner()))
        }
        Sink::File(path) => {
            let file =
                std::fs::File::create(&path).map_err(|e| MergeError::Finalize(e.to_string()))?;
            let mut writer = BufWriter::new(file);
            merged
                .save_to(&mut writer)
                .map_err(|e| MergeError::Finalize(e.to_string()))?;
            writer
                .flush()
                .map_err(|e| MergeError::Finalize(e.to_string()))?;
            Ok(MergedArtifact::File(path))
        }
    }
}
