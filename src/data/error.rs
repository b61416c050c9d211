use thiserror::Error;

/// Failures raised while reading or sampling a corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: {reason}")]
    MalformedLine {
        file:   String,
        line:   usize,
        reason: String,
    },

    #[error("{file}:{line}: answer refers to unknown question record '{record_id}'")]
    UnknownQuestion {
        file:      String,
        line:      usize,
        record_id: String,
    },

    #[error("expected {expected} questions but parsed {found} questions and {answer_lists} answer lists")]
    UnexpectedQuestionCount {
        expected:     usize,
        found:        usize,
        answer_lists: usize,
    },

    #[error("token '{0}' is not in the corpus vocabulary")]
    UnknownToken(String),

    #[error("answer id {0} is not in the answer pool")]
    UnknownAnswer(u32),

    #[error("need {needed} negative answers but only {available} are eligible")]
    NotEnoughNegatives { needed: usize, available: usize },

    #[error("download of '{url}' failed: {reason}")]
    Download { url: String, reason: String },
}

impl CorpusError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io { path: path.display().to_string(), source }
    }

    pub(crate) fn malformed(file: &str, line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedLine { file: file.to_string(), line, reason: reason.into() }
    }
}
