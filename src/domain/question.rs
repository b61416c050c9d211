// ============================================================
// Layer 3 — Question / Answer Records
// ============================================================
// The raw records produced by the corpus loaders.
//
// A LiveQA question owns its list of judged answers. Each answer
// carries the relevance score assigned by the assessors; scores
// of 3 and above count as a "good" answer for training.
//
// Reference: TREC LiveQA 2015 relevance judgments

use serde::{Deserialize, Serialize};

/// Answers scored at or above this value are treated as correct.
pub const GOOD_ANSWER_SCORE: i32 = 3;

/// One question from the judgments file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Numeric TREC record id (the digits before the `q` suffix)
    pub record_id: String,

    /// The question id assigned by the source site
    pub qid: String,

    pub title: String,

    /// Question body, may be empty
    pub content: String,

    pub main_category: String,
    pub sub_category: String,
}

impl Question {
    /// Title and body joined the way they are fed to the encoder.
    pub fn full_text(&self) -> String {
        format!("{}{}", self.title, self.content)
    }
}

/// One judged answer belonging to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub qid:      String,
    pub score:    i32,
    pub text:     String,
    pub resource: String,
}

impl Answer {
    pub fn new(
        qid:      impl Into<String>,
        score:    i32,
        text:     impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            qid:      qid.into(),
            score,
            text:     text.into(),
            resource: resource.into(),
        }
    }

    pub fn is_good(&self) -> bool {
        self.score >= GOOD_ANSWER_SCORE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_good_threshold() {
        assert!(Answer::new("q", 3, "yes", "r").is_good());
        assert!(Answer::new("q", 4, "yes", "r").is_good());
        assert!(!Answer::new("q", 2, "no", "r").is_good());
    }

    #[test]
    fn test_full_text_concatenates_title_and_body() {
        let q = Question {
            record_id:     "1".into(),
            qid:           "abc".into(),
            title:         "Why is the sky blue?".into(),
            content:       " Asking for a friend".into(),
            main_category: "Science".into(),
            sub_category:  "Physics".into(),
        };
        assert_eq!(q.full_text(), "Why is the sky blue? Asking for a friend");
    }
}
