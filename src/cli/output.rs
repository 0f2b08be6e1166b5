use std::fmt::Write as FmtWrite;
use std::path::PathBuf;

use serde::Serialize;

use crate::models::{EmbeddingSummary, OutputFormat, SearchResults};
use crate::services::{EmbedStats, ProcessStats};

const PREVIEW_CHARS: usize = 200;

pub trait Formatter {
    fn format_process_stats(&self, stats: &ProcessStats, artifact: Option<&PathBuf>) -> String;
    fn format_embed_stats(&self, stats: &EmbedStats, collection: &str) -> String;
    fn format_search_results(&self, results: &SearchResults) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub embedding_model: String,
    pub embedding_url: String,
    pub api_key_configured: bool,
    pub vector_store_url: String,
    pub vector_store_connected: bool,
    pub collection: String,
    pub collection_exists: bool,
    pub points: u64,
    pub vector_size: Option<u64>,
    pub documents_artifact: PathBuf,
    pub documents_artifact_present: bool,
    pub last_run: Option<EmbeddingSummary>,
}

fn preview(text: &str) -> String {
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        format!("{}...", head)
    } else {
        head
    }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_process_stats(&self, stats: &ProcessStats, artifact: Option<&PathBuf>) -> String {
        let mut output = String::new();
        writeln!(output, "Processing Complete").unwrap();
        writeln!(output, "-------------------").unwrap();
        writeln!(output, "Files scanned:   {}", stats.files_scanned).unwrap();
        writeln!(output, "Files processed: {}", stats.files_processed).unwrap();
        writeln!(output, "Files skipped:   {}", stats.files_skipped).unwrap();
        writeln!(output, "Chunks created:  {}", stats.chunks_created).unwrap();
        writeln!(output, "Duration:        {}ms", stats.duration_ms).unwrap();
        if let Some(path) = artifact {
            writeln!(output, "Output:          {}", path.display()).unwrap();
        }
        output
    }

    fn format_embed_stats(&self, stats: &EmbedStats, collection: &str) -> String {
        let mut output = String::new();
        writeln!(output, "Embedding Complete").unwrap();
        writeln!(output, "------------------").unwrap();
        writeln!(output, "Collection:        {}", collection).unwrap();
        writeln!(output, "Documents:         {}", stats.documents).unwrap();
        writeln!(output, "Chunks:            {}", stats.chunks).unwrap();
        writeln!(output, "Points stored:     {}", stats.stored).unwrap();
        writeln!(output, "Failed embeddings: {}", stats.failed_embeddings).unwrap();
        if stats.placeholders > 0 {
            writeln!(output, "  Zero placeholders: {}", stats.placeholders).unwrap();
        }
        if stats.skipped > 0 {
            writeln!(output, "  Skipped chunks:    {}", stats.skipped).unwrap();
        }
        writeln!(output, "Duration:          {}ms", stats.duration_ms).unwrap();
        output
    }

    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("No results found for: {}\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "Search results for: \"{}\"", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in {}ms\n",
            results.results.len(),
            results.duration_ms
        )
        .unwrap();

        for (i, hit) in results.results.iter().enumerate() {
            writeln!(output, "{}. [Score: {:.3}]", i + 1, hit.score).unwrap();
            writeln!(
                output,
                "   Source: {} (chunk {})",
                hit.payload.source_file, hit.payload.chunk_index
            )
            .unwrap();
            writeln!(output, "   ---").unwrap();
            for line in preview(&hit.payload.text).lines() {
                writeln!(output, "   {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let key_status = if status.api_key_configured {
            "[API KEY SET]"
        } else {
            "[NO API KEY]"
        };
        writeln!(output, "Embedding:     {} {}", status.embedding_model, key_status).unwrap();
        writeln!(output, "  URL:         {}", status.embedding_url).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(output, "Vector Store:  Qdrant {}", vector_status).unwrap();
        writeln!(output, "  URL:         {}", status.vector_store_url).unwrap();
        writeln!(output, "  Collection:  {}", status.collection).unwrap();
        if status.vector_store_connected {
            if status.collection_exists {
                writeln!(output, "  Points:      {}", status.points).unwrap();
                if let Some(size) = status.vector_size {
                    writeln!(output, "  Vector size: {}", size).unwrap();
                }
            } else {
                writeln!(output, "  (collection not created yet)").unwrap();
            }
        }
        writeln!(output).unwrap();

        let artifact_status = if status.documents_artifact_present {
            "[PRESENT]"
        } else {
            "[MISSING]"
        };
        writeln!(
            output,
            "Processed:     {} {}",
            status.documents_artifact.display(),
            artifact_status
        )
        .unwrap();
        if let Some(ref run) = status.last_run {
            writeln!(
                output,
                "  Last run:    {} documents, {} chunks, {} failed",
                run.total_documents, run.total_chunks, run.failed_embeddings
            )
            .unwrap();
        }

        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        let mut text =
            rendered.unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string());
        text.push('\n');
        text
    }
}

impl Formatter for JsonFormatter {
    fn format_process_stats(&self, stats: &ProcessStats, artifact: Option<&PathBuf>) -> String {
        self.render(&serde_json::json!({
            "stats": stats,
            "output": artifact,
        }))
    }

    fn format_embed_stats(&self, stats: &EmbedStats, collection: &str) -> String {
        self.render(&serde_json::json!({
            "collection": collection,
            "stats": stats,
        }))
    }

    fn format_search_results(&self, results: &SearchResults) -> String {
        self.render(results)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        self.render(status)
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", serde_json::json!({ "message": message }))
    }

    fn format_error(&self, error: &str) -> String {
        format!("{}\n", serde_json::json!({ "error": error }))
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_process_stats(&self, stats: &ProcessStats, artifact: Option<&PathBuf>) -> String {
        let mut output = String::new();
        writeln!(output, "## Processing Complete\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Files scanned | {} |", stats.files_scanned).unwrap();
        writeln!(output, "| Files processed | {} |", stats.files_processed).unwrap();
        writeln!(output, "| Files skipped | {} |", stats.files_skipped).unwrap();
        writeln!(output, "| Chunks created | {} |", stats.chunks_created).unwrap();
        writeln!(output, "| Duration | {}ms |", stats.duration_ms).unwrap();
        if let Some(path) = artifact {
            writeln!(output, "\n**Output:** `{}`", path.display()).unwrap();
        }
        output
    }

    fn format_embed_stats(&self, stats: &EmbedStats, collection: &str) -> String {
        let mut output = String::new();
        writeln!(output, "## Embedding Complete\n").unwrap();
        writeln!(output, "**Collection:** `{}`\n", collection).unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Documents | {} |", stats.documents).unwrap();
        writeln!(output, "| Chunks | {} |", stats.chunks).unwrap();
        writeln!(output, "| Points stored | {} |", stats.stored).unwrap();
        writeln!(output, "| Failed embeddings | {} |", stats.failed_embeddings).unwrap();
        writeln!(output, "| Zero placeholders | {} |", stats.placeholders).unwrap();
        writeln!(output, "| Skipped chunks | {} |", stats.skipped).unwrap();
        writeln!(output, "| Duration | {}ms |", stats.duration_ms).unwrap();
        output
    }

    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("## No results found\n\nQuery: `{}`\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "## Search Results\n").unwrap();
        writeln!(output, "**Query:** `{}`\n", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in {}ms\n",
            results.results.len(),
            results.duration_ms
        )
        .unwrap();

        for (i, hit) in results.results.iter().enumerate() {
            writeln!(output, "### {}. Score: {:.3}\n", i + 1, hit.score).unwrap();
            writeln!(
                output,
                "**Source:** `{}` (chunk {})\n",
                hit.payload.source_file, hit.payload.chunk_index
            )
            .unwrap();
            writeln!(output, "```").unwrap();
            writeln!(output, "{}", hit.payload.text).unwrap();
            writeln!(output, "```\n").unwrap();
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Status\n").unwrap();

        let key_status = if status.api_key_configured { "✅" } else { "❌" };
        writeln!(output, "### Embedding {}\n", key_status).unwrap();
        writeln!(output, "- **Model:** {}", status.embedding_model).unwrap();
        writeln!(output, "- **URL:** `{}`\n", status.embedding_url).unwrap();

        let vector_status = if status.vector_store_connected {
            "✅"
        } else {
            "❌"
        };
        writeln!(output, "### Vector Store (Qdrant) {}\n", vector_status).unwrap();
        writeln!(output, "- **URL:** `{}`", status.vector_store_url).unwrap();
        writeln!(output, "- **Collection:** {}", status.collection).unwrap();
        writeln!(output, "- **Points:** {}\n", status.points).unwrap();

        let artifact_status = if status.documents_artifact_present {
            "✅"
        } else {
            "❌"
        };
        writeln!(output, "### Processed Documents {}\n", artifact_status).unwrap();
        writeln!(output, "- **Path:** `{}`", status.documents_artifact.display()).unwrap();
        if let Some(ref run) = status.last_run {
            writeln!(
                output,
                "- **Last run:** {} documents, {} chunks, {} failed",
                run.total_documents, run.total_chunks, run.failed_embeddings
            )
            .unwrap();
        }

        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryPayload, ScoredEntry};

    fn hit(text: &str) -> ScoredEntry {
        ScoredEntry {
            id: "0".to_string(),
            score: 0.8123,
            payload: EntryPayload {
                text: text.to_string(),
                source_file: "manual.pdf".to_string(),
                source_type: "pdf".to_string(),
                file_hash: "f".repeat(64),
                processed_at: "2024-01-01T00:00:00+00:00".to_string(),
                chunk_index: 3,
                token_count: 500,
                start_token_offset: 1350,
                end_token_offset: 1850,
            },
        }
    }

    #[test]
    fn test_text_preview_truncated() {
        let long = "é".repeat(250);
        let results = SearchResults::new("q".into(), "kb".into(), vec![hit(&long)], 12);
        let out = TextFormatter.format_search_results(&results);
        assert!(out.contains("[Score: 0.812]"));
        assert!(out.contains("manual.pdf (chunk 3)"));
        assert!(out.contains(&format!("{}...", "é".repeat(200))));
        assert!(!out.contains(&"é".repeat(201)));
    }

    #[test]
    fn test_empty_results() {
        let results = SearchResults::new("nothing".into(), "kb".into(), vec![], 1);
        assert_eq!(
            TextFormatter.format_search_results(&results),
            "No results found for: nothing\n"
        );
    }

    #[test]
    fn test_json_process_stats() {
        let stats = ProcessStats {
            files_scanned: 3,
            files_processed: 2,
            files_skipped: 1,
            chunks_created: 9,
            duration_ms: 5,
        };
        let path = PathBuf::from("processed/processed_documents.json");
        let out = JsonFormatter::new(false).format_process_stats(&stats, Some(&path));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["stats"]["files_processed"], 2);
        assert_eq!(value["output"], "processed/processed_documents.json");
    }

    #[test]
    fn test_embed_stats_mentions_failures() {
        let stats = EmbedStats {
            documents: 1,
            chunks: 4,
            failed_embeddings: 2,
            stored: 4,
            placeholders: 2,
            ..Default::default()
        };
        let out = TextFormatter.format_embed_stats(&stats, "kb");
        assert!(out.contains("Failed embeddings: 2"));
        assert!(out.contains("Zero placeholders: 2"));
        assert!(!out.contains("Skipped chunks"));

        let md = MarkdownFormatter.format_embed_stats(&stats, "kb");
        assert!(md.contains("| Failed embeddings | 2 |"));
    }
}
