// ============================================================
// Layer 3 — Story Domain Type
// ============================================================
// A bAbI story is a numbered sequence of lines. Most lines are
// facts ("Mary moved to the bathroom."); some are questions
// with an answer and the ids of the facts that support it.
//
// Line numbers restart at 1 for every new story, and questions
// share the numbering with facts:
//
//   1 Mary moved to the bathroom.
//   2 John went to the hallway.
//   3 Where is Mary?        bathroom        1
//
// Reference: Weston et al. (2015) Towards AI-Complete QA

use serde::{Deserialize, Serialize};

use crate::domain::qa_pair::QaPair;

/// One numbered line of a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoryLine {
    /// A statement that is written into memory
    Fact {
        line_no: usize,
        text:    String,
    },

    /// A question about the facts seen so far
    Question {
        line_no:    usize,
        text:       String,
        answer:     String,
        /// Line numbers of the facts needed to answer.
        /// Parsed for completeness; training only uses the answer.
        supporting: Vec<usize>,
    },
}

impl StoryLine {
    pub fn line_no(&self) -> usize {
        match self {
            StoryLine::Fact { line_no, .. } | StoryLine::Question { line_no, .. } => *line_no,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Position of the story in its source file (0-based)
    pub id:    usize,
    pub lines: Vec<StoryLine>,
}

impl Story {
    pub fn new(id: usize) -> Self {
        Self { id, lines: Vec::new() }
    }

    pub fn push(&mut self, line: StoryLine) {
        self.lines.push(line);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All facts of the story, in order
    pub fn facts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|l| match l {
            StoryLine::Fact { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn question_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, StoryLine::Question { .. }))
            .count()
    }

    /// Flatten the story into one QaPair per question.
    /// Each pair sees every fact that appears before the question,
    /// including facts that come after earlier questions.
    pub fn qa_pairs(&self) -> Vec<QaPair> {
        let mut facts: Vec<String> = Vec::new();
        let mut pairs = Vec::new();

        for line in &self.lines {
            match line {
                StoryLine::Fact { text, .. } => facts.push(text.clone()),
                StoryLine::Question { line_no, text, answer, supporting } => {
                    pairs.push(QaPair {
                        story:      self.id,
                        line_no:    *line_no,
                        facts:      facts.clone(),
                        question:   text.clone(),
                        answer:     answer.clone(),
                        supporting: supporting.clone(),
                    });
                }
            }
        }

        pairs
    }
}
