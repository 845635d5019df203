// ============================================================
// Layer 4 — bAbI Story Loader
// ============================================================
// Parses the plain-text bAbI format into Story values.
//
// Format:
//   Every line starts with a line number followed by a space.
//   Numbering restarts at 1 at the beginning of each story.
//   Question lines carry two or three tab-separated fields:
//
//     <n> <question text>\t<answer>\t<supporting line ids>
//
//   Supporting ids are space separated and may be absent.
//
// Example:
//   1 Mary moved to the bathroom.
//   2 John went to the hallway.
//   3 Where is Mary? \tbathroom\t1
//
// Malformed lines are reported with file name and line number
// instead of being skipped silently: a silently-shifted story
// would train on the wrong memory.
//
// Reference: Weston et al. (2015) bAbI tasks
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::story::{Story, StoryLine};
use crate::domain::traits::StorySource;

/// Loads all stories from a single bAbI text file.
pub struct BabiLoader {
    path: PathBuf,
}

impl BabiLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl StorySource for BabiLoader {
    fn load_all(&self) -> Result<Vec<Story>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read story file '{}'", self.path.display()))?;

        let stories = parse_stories(&self.path.display().to_string(), &content)?;

        tracing::info!(
            "Loaded {} stories ({} facts, {} questions) from '{}'",
            stories.len(),
            stories.iter().map(|s| s.facts().count()).sum::<usize>(),
            stories.iter().map(Story::question_count).sum::<usize>(),
            self.path.display()
        );
        Ok(stories)
    }
}

/// Parse the full text of a bAbI file.
/// `source` only appears in error messages.
pub fn parse_stories(source: &str, content: &str) -> Result<Vec<Story>> {
    let mut stories = Vec::new();
    let mut current = Story::new(0);

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let parsed = parse_line(line)
            .with_context(|| format!("{}:{}: malformed line '{}'", source, idx + 1, line))?;

        // Line 1 marks the start of a new story
        if parsed.line_no() == 1 && !current.is_empty() {
            let next_id = stories.len() + 1;
            stories.push(std::mem::replace(&mut current, Story::new(next_id)));
        }
        current.push(parsed);
    }

    if !current.is_empty() {
        stories.push(current);
    }

    Ok(stories)
}

fn parse_line(line: &str) -> Result<StoryLine> {
    let (number, rest) = match line.split_once(char::is_whitespace) {
        Some(parts) => parts,
        None => bail!("expected '<line number> <text>'"),
    };

    let line_no: usize = number
        .parse()
        .with_context(|| format!("invalid line number '{number}'"))?;

    if !rest.contains('\t') {
        return Ok(StoryLine::Fact { line_no, text: rest.trim().to_string() });
    }

    let mut fields = rest.split('\t');
    let text   = fields.next().unwrap_or_default().trim();
    let answer = fields.next().map(str::trim).unwrap_or_default();
    if answer.is_empty() {
        bail!("question without an answer");
    }

    let supporting = fields
        .next()
        .unwrap_or_default()
        .split_whitespace()
        .map(|id| id.parse::<usize>().with_context(|| format!("invalid supporting id '{id}'")))
        .collect::<Result<Vec<_>>>()?;

    Ok(StoryLine::Question {
        line_no,
        text:   text.to_string(),
        answer: answer.to_string(),
        supporting,
    })
}

/// Parse a free-form fact list for the `ask` command.
/// One fact per line; a leading bAbI-style line number is dropped.
pub fn parse_facts(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| match l.split_once(char::is_whitespace) {
            Some((n, rest)) if n.parse::<usize>().is_ok() => rest.trim().to_string(),
            _ => l.to_string(),
        })
        .collect()
}
