// Corpus loading from disk.
//
// Accepted formats, picked by extension:
//   .json   an array of strings or of {"id"?, "content"} objects
//   .jsonl  one string or object per line
//   other   plain text, one document per non-empty line

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::models::InputDocument;

/// A record as it may appear in JSON input.
#[derive(Deserialize)]
#[serde(untagged)]
enum Record {
    Text(String),
    Object {
        #[serde(default)]
        id: Option<serde_json::Value>,
        #[serde(alias = "text")]
        content: String,
    },
}

impl From<Record> for InputDocument {
    fn from(record: Record) -> Self {
        match record {
            Record::Text(content) => InputDocument::new(content),
            Record::Object { id, content } => InputDocument {
                // numeric ids are common in exported datasets
                id: id.and_then(|v| match v {
                    serde_json::Value::String(s) => Some(s),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                }),
                content,
            },
        }
    }
}

/// Load documents from `path`.
pub fn load_documents(path: &Path) -> Result<Vec<InputDocument>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    let docs = match ext.as_deref() {
        Some("json") => parse_json(&raw)
            .with_context(|| format!("Failed to parse {} as JSON", path.display()))?,
        Some("jsonl") => parse_jsonl(&raw)
            .with_context(|| format!("Failed to parse {} as JSON lines", path.display()))?,
        _ => parse_lines(&raw),
    };

    info!(documents = docs.len(), path = %path.display(), "Loaded documents");
    Ok(docs)
}

pub fn parse_json(raw: &str) -> Result<Vec<InputDocument>> {
    let records: Vec<Record> = serde_json::from_str(raw)?;
    Ok(records.into_iter().map(InputDocument::from).collect())
}

pub fn parse_jsonl(raw: &str) -> Result<Vec<InputDocument>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<Record>(line)
                .map(InputDocument::from)
                .with_context(|| format!("line {}", i + 1))
        })
        .collect()
}

pub fn parse_lines(raw: &str) -> Vec<InputDocument> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(InputDocument::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_strings_and_objects() {
        let docs = parse_json(r#"["plain", {"id": 7, "content": "numbered"}, {"text": "aliased"}]"#)
            .unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0], InputDocument::new("plain"));
        assert_eq!(docs[1], InputDocument::with_id("7", "numbered"));
        assert_eq!(docs[2].content, "aliased");
        assert!(docs[2].id.is_none());
    }

    #[test]
    fn test_jsonl_skips_blank_lines() {
        let docs = parse_jsonl("{\"id\": \"a\", \"content\": \"one\"}\n\n\"two\"\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id.as_deref(), Some("a"));
    }

    #[test]
    fn test_jsonl_reports_bad_line() {
        let err = parse_jsonl("\"ok\"\n{broken\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_plain_text_one_per_line() {
        let docs = parse_lines("first doc\n\n  second doc  \n");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].content, "second doc");
    }

    #[test]
    fn test_load_by_extension() {
        let path = std::env::temp_dir().join("topicmap-input-test.json");
        std::fs::write(&path, r#"["a", "b"]"#).unwrap();
        let docs = load_documents(&path).unwrap();
        assert_eq!(docs.len(), 2);
        std::fs::remove_file(&path).unwrap();
    }
}
