//! Reassembly of completed transcripts into recording order.
//!
//! Ordering is by sequence index, never by completion time. Indices whose
//! jobs permanently failed have no `TranscriptResult` and are omitted from
//! both the listing and the notes document; an empty transcript from a
//! completed job stays in the document but is not printed.

use crate::defaults;
use crate::transcribe::run_state::TranscriptResult;
use serde::Serialize;
use std::collections::BTreeMap;

/// The final JSON document: `{"notes": {"<5-digit-index>": "<text>"}}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct NotesDocument {
    pub notes: BTreeMap<String, String>,
}

/// Order results strictly ascending by sequence index.
pub fn assemble(results: &BTreeMap<u32, TranscriptResult>) -> Vec<(u32, String)> {
    results
        .values()
        .map(|r| (r.seq, r.text.clone()))
        .collect()
}

/// Build the notes document with zero-padded index keys.
pub fn notes_document(results: &BTreeMap<u32, TranscriptResult>) -> NotesDocument {
    let notes = results
        .values()
        .map(|r| {
            (
                format!("{:0width$}", r.seq, width = defaults::SEQ_PAD),
                r.text.clone(),
            )
        })
        .collect();
    NotesDocument { notes }
}

/// Printable `"<index>: <text>"` lines, omitting empty transcripts.
pub fn render_lines(results: &BTreeMap<u32, TranscriptResult>) -> Vec<String> {
    assemble(results)
        .into_iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|(seq, text)| format!("{seq}: {text}"))
        .collect()
}
