//! RAG answering: turns retrieved chunks into an LLM answer with sources.

use crate::types::{AskOptions, RankedChunk};
use ragpack_core::PackResult;
use ragpack_llm::{LlmHandle, LlmRequest};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Minimum score for high-confidence answering.
/// Scores below this trigger cautious language in the system prompt.
pub const CONFIDENCE_THRESHOLD: f32 = 0.30;

/// Maximum snippet length (in graphemes) for source references.
const MAX_SNIPPET_LENGTH: usize = 150;

/// Where part of an answer came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Original filename (e.g. "gamedex.md")
    pub source: String,

    pub document_id: String,

    /// Human-readable location within the source, e.g. "chunk 3"
    pub location: String,

    /// Short evidence snippet
    pub snippet: String,
}

/// An answer synthesized from retrieved chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    pub answer: String,

    pub sources: Vec<SourceRef>,

    /// `provider:model` that produced the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<String>,

    /// Highest retrieval score; drives `low_confidence`
    pub max_score: f32,

    pub low_confidence: bool,
}

impl RagAnswer {
    pub fn new(answer: String, sources: Vec<SourceRef>, max_score: f32) -> Self {
        Self {
            answer,
            sources,
            llm: None,
            max_score,
            low_confidence: max_score < CONFIDENCE_THRESHOLD,
        }
    }

    /// Response when no chunk cleared the relevance cutoff.
    pub fn no_information(question: &str) -> Self {
        Self {
            answer: format!(
                "I could not find information about \"{}\" in the available documents.",
                question
            ),
            sources: Vec::new(),
            llm: None,
            max_score: 0.0,
            low_confidence: true,
        }
    }
}

/// Generate an answer for `question` from already ranked chunks.
pub async fn answer(
    question: &str,
    ranked: Vec<RankedChunk>,
    llm: &LlmHandle,
    options: &AskOptions,
) -> PackResult<RagAnswer> {
    let relevant: Vec<RankedChunk> = ranked
        .into_iter()
        .filter(|c| c.score >= options.min_score)
        .collect();

    if relevant.is_empty() {
        tracing::info!(
            "No relevant chunks found (all scores below {:.2} threshold)",
            options.min_score
        );
        return Ok(RagAnswer::no_information(question));
    }

    let max_score = relevant.first().map(|c| c.score).unwrap_or(0.0);
    let low_confidence = max_score < CONFIDENCE_THRESHOLD;
    if low_confidence {
        tracing::warn!(
            "Best retrieval score {:.3} is below {:.2}; answering cautiously",
            max_score,
            CONFIDENCE_THRESHOLD
        );
    }

    let descriptor = llm.descriptor();
    let request = LlmRequest::new(
        build_user_prompt(question, &build_context(&relevant)),
        descriptor.model.clone(),
    )
    .with_system(build_system_prompt(low_confidence))
    .with_temperature(options.temperature)
    .with_max_tokens(options.max_tokens)
    .with_context(relevant.iter().map(|c| c.text.clone()).collect());

    tracing::debug!(
        "Generating answer with {} from {} chunks (max score {:.3})",
        descriptor.label(),
        relevant.len(),
        max_score
    );

    let response = llm.complete(&request).await?;

    let mut result = RagAnswer::new(response.content, map_chunks_to_sources(&relevant), max_score);
    result.llm = Some(descriptor.label());
    Ok(result)
}

/// Build context string from chunks for the LLM prompt.
fn build_context(chunks: &[RankedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[Document {}]\n{}", i + 1, chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

fn build_user_prompt(question: &str, context: &str) -> String {
    format!(
        "User question:\n{}\n\nRelevant context from documents:\n{}",
        question, context
    )
}

fn build_system_prompt(low_confidence: bool) -> String {
    let mut prompt = String::from(
        "You are a knowledge assistant answering from a portable document pack.\n\n",
    );

    if low_confidence {
        prompt.push_str(
            "Note: The retrieved information may not directly answer this question. \
             Be cautious and clear about what the documents do and do not state.\n\n",
        );
    }

    prompt.push_str(
        "Instructions:\n\
         - Provide a clear, direct answer based only on the context provided\n\
         - Do not mention \"chunks\", \"embeddings\", \"context\" or document numbers\n\
         - Answer as if you had read the original documents directly\n\
         - If the context suggests but does not confirm something, say so\n\
         - If the context does not contain the answer, state: \"I could not find this information in the available documents.\"\n\
         - Keep your response concise and factual\n",
    );

    prompt
}

/// One reference per (document, chunk), in ranking order.
fn map_chunks_to_sources(chunks: &[RankedChunk]) -> Vec<SourceRef> {
    let mut seen = HashSet::new();
    chunks
        .iter()
        .filter(|c| seen.insert((c.document_id.clone(), c.chunk_index)))
        .map(|c| SourceRef {
            source: c.filename.clone(),
            document_id: c.document_id.clone(),
            location: format!("chunk {}", c.chunk_index + 1),
            snippet: truncate_snippet(&c.text, MAX_SNIPPET_LENGTH),
        })
        .collect()
}

/// Truncate to `max_len` graphemes, preferring a word boundary.
fn truncate_snippet(text: &str, max_len: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= max_len {
        return text.to_string();
    }

    let truncated: String = graphemes[..max_len].concat();
    match truncated.rfind(char::is_whitespace) {
        Some(last_space) if last_space > 0 => format!("{}...", truncated[..last_space].trim_end()),
        _ => format!("{}...", truncated),
    }
}
