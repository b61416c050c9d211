// ============================================================
// Layer 4 — InsuranceQA Corpus Loader
// ============================================================
// InsuranceQA ships as token-id text files:
//
//   vocabulary               idx_17 \t premium
//   answers.label.token_idx  12 \t idx_3 idx_17 idx_9 ...
//   question.train...        idx_5 idx_2 ... \t 12 981
//   question.test{1,2}...    12 \t idx_5 idx_2 ... \t 12 44 981 ...
//
// Corpus token ids are translated to words through `vocabulary`,
// then to rows of the pretrained embedding table. Words without a
// vector map to the table's OOV row.
//
// Everything is loaded once into an InsuranceQaCorpus value that
// the sampler borrows; nothing lives in globals.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::data::error::CorpusError;
use crate::infra::embeddings::EmbeddingTable;

pub const VOCABULARY_FILE: &str = "vocabulary";
pub const ANSWERS_FILE: &str = "answers.label.token_idx";

/// The label files of the distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InsuranceQaSplit {
    Train,
    Test1,
    Test2,
}

/// How a label file lays out its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelFileKind {
    /// `<question tokens> \t <good ids>`
    Train,
    /// `<good ids> \t <question tokens> \t <pool ids>`
    Pool,
}

impl InsuranceQaSplit {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Train => "question.train.token_idx.label",
            Self::Test1 => "question.test1.label.token_idx.pool",
            Self::Test2 => "question.test2.label.token_idx.pool",
        }
    }

    pub fn kind(self) -> LabelFileKind {
        match self {
            Self::Train => LabelFileKind::Train,
            Self::Test1 | Self::Test2 => LabelFileKind::Pool,
        }
    }
}

/// One question from a label file, already in embedding ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledQuestion {
    pub question: Vec<u32>,
    /// Correct answer ids, in file order
    pub good:     Vec<u32>,
    /// Candidate answer ids; empty for the training split
    pub pool:     Vec<u32>,
}

/// Vocabulary translation plus the shared answer pool.
#[derive(Debug, Clone)]
pub struct InsuranceQaCorpus {
    dir:        PathBuf,
    /// corpus token id (`idx_N`) → embedding row
    token_rows: HashMap<String, u32>,
    /// answer id → embedding rows
    answers:    BTreeMap<u32, Vec<u32>>,
    oov_index:  u32,
}

impl InsuranceQaCorpus {
    pub fn load(dir: impl Into<PathBuf>, embeddings: &EmbeddingTable) -> Result<Self, CorpusError> {
        let dir = dir.into();

        let vocab_path = dir.join(VOCABULARY_FILE);
        let token_rows = parse_vocabulary(&read(&vocab_path)?, VOCABULARY_FILE, embeddings)?;

        let mut corpus = Self {
            dir,
            token_rows,
            answers: BTreeMap::new(),
            oov_index: embeddings.oov_index(),
        };

        let answers_path = corpus.dir.join(ANSWERS_FILE);
        corpus.answers = corpus.parse_answers(&read(&answers_path)?, ANSWERS_FILE)?;

        tracing::info!(
            "Loaded InsuranceQA vocabulary of {} tokens and {} answers",
            corpus.token_rows.len(),
            corpus.answers.len()
        );
        Ok(corpus)
    }

    /// Parse one label file of the given split.
    pub fn questions(&self, split: InsuranceQaSplit) -> Result<Vec<LabeledQuestion>, CorpusError> {
        let path = self.dir.join(split.file_name());
        let questions = self.parse_labels(&read(&path)?, split.file_name(), split.kind())?;
        tracing::info!("Loaded {} questions from '{}'", questions.len(), split.file_name());
        Ok(questions)
    }

    pub fn answer(&self, id: u32) -> Result<&[u32], CorpusError> {
        self.answers
            .get(&id)
            .map(Vec::as_slice)
            .ok_or(CorpusError::UnknownAnswer(id))
    }

    /// All answer ids in ascending order.
    pub fn answer_ids(&self) -> Vec<u32> {
        self.answers.keys().copied().collect()
    }

    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }

    /// Padding value for InsuranceQA sequences.
    pub fn oov_index(&self) -> u32 {
        self.oov_index
    }

    /// Translate space-separated `idx_N` tokens into embedding rows.
    pub fn convert_tokens(&self, tokens: &str) -> Result<Vec<u32>, CorpusError> {
        tokens
            .split_whitespace()
            .map(|t| {
                self.token_rows
                    .get(t)
                    .copied()
                    .ok_or_else(|| CorpusError::UnknownToken(t.to_string()))
            })
            .collect()
    }

    fn parse_answers(&self, text: &str, file: &str) -> Result<BTreeMap<u32, Vec<u32>>, CorpusError> {
        let mut answers = BTreeMap::new();
        for (i, line) in text.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let (id, tokens) = line
                .split_once('\t')
                .ok_or_else(|| CorpusError::malformed(file, i + 1, "expected '<id>\\t<tokens>'"))?;
            let id = parse_id(id, file, i + 1)?;
            answers.insert(id, self.convert_tokens(tokens)?);
        }
        Ok(answers)
    }

    fn parse_labels(
        &self,
        text: &str,
        file: &str,
        kind: LabelFileKind,
    ) -> Result<Vec<LabeledQuestion>, CorpusError> {
        let mut out = Vec::new();
        for (i, line) in text.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let line_no = i + 1;
            let fields: Vec<&str> = line.split('\t').collect();

            let (question, good, pool) = match (kind, fields.as_slice()) {
                (LabelFileKind::Train, [q, a]) => (*q, *a, None),
                (LabelFileKind::Pool, [a, q, g]) => (*q, *a, Some(*g)),
                _ => {
                    return Err(CorpusError::malformed(
                        file,
                        line_no,
                        format!("unexpected number of columns: {}", fields.len()),
                    ))
                }
            };

            let good = parse_ids(good, file, line_no)?;
            if good.is_empty() {
                return Err(CorpusError::malformed(file, line_no, "no correct answers listed"));
            }
            let pool = match pool {
                Some(p) => parse_ids(p, file, line_no)?,
                None => Vec::new(),
            };

            out.push(LabeledQuestion {
                question: self.convert_tokens(question)?,
                good,
                pool,
            });
        }
        Ok(out)
    }
}

/// The candidates for one pooled question: first correct answer, then every
/// pool id that is not correct, deduplicated, in file order.
pub fn pool_candidates(question: &LabeledQuestion) -> Vec<u32> {
    let good: HashSet<u32> = question.good.iter().copied().collect();
    let mut seen = HashSet::new();

    let mut candidates = vec![question.good[0]];
    for &id in &question.pool {
        if !good.contains(&id) && seen.insert(id) {
            candidates.push(id);
        }
    }
    candidates
}

fn read(path: &Path) -> Result<String, CorpusError> {
    fs::read_to_string(path).map_err(|e| CorpusError::io(path, e))
}

fn parse_vocabulary(
    text:       &str,
    file:       &str,
    embeddings: &EmbeddingTable,
) -> Result<HashMap<String, u32>, CorpusError> {
    let mut rows = HashMap::new();
    for (i, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let (token, word) = line
            .split_once('\t')
            .ok_or_else(|| CorpusError::malformed(file, i + 1, "expected '<idx>\\t<word>'"))?;
        rows.insert(token.to_string(), embeddings.index_or_oov(word));
    }
    Ok(rows)
}

fn parse_id(s: &str, file: &str, line: usize) -> Result<u32, CorpusError> {
    s.trim()
        .parse()
        .map_err(|_| CorpusError::malformed(file, line, format!("invalid answer id '{}'", s)))
}

fn parse_ids(s: &str, file: &str, line: usize) -> Result<Vec<u32>, CorpusError> {
    s.split_whitespace().map(|id| parse_id(id, file, line)).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A tiny InsuranceQA layout: 4 words, 5 answers, 2 train and 1 test question.
    pub(crate) fn write_fixture(dir: &Path) -> EmbeddingTable {
        fs::write(
            dir.join(VOCABULARY_FILE),
            "idx_1\tpolicy\nidx_2\tcover\nidx_3\tflood\nidx_4\tzzyzx\n",
        )
        .unwrap();
        fs::write(
            dir.join(ANSWERS_FILE),
            "1\tidx_1 idx_2\n2\tidx_3\n3\tidx_1 idx_3\n4\tidx_2\n5\tidx_4\n",
        )
        .unwrap();
        fs::write(
            dir.join(InsuranceQaSplit::Train.file_name()),
            "idx_1 idx_3\t1 3\nidx_2\t4\n",
        )
        .unwrap();
        fs::write(
            dir.join(InsuranceQaSplit::Test1.file_name()),
            "2\tidx_3 idx_1\t5 2 4 4 1\n",
        )
        .unwrap();

        EmbeddingTable::from_entries(vec![
            ("policy".to_string(), vec![1.0, 0.0]),
            ("cover".to_string(), vec![0.0, 1.0]),
            ("flood".to_string(), vec![1.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_answers_are_translated_to_embedding_rows() {
        let dir    = tempfile::TempDir::new().unwrap();
        let table  = write_fixture(dir.path());
        let corpus = InsuranceQaCorpus::load(dir.path(), &table).unwrap();

        assert_eq!(corpus.answer_count(), 5);
        assert_eq!(corpus.answer(1).unwrap(), &[0, 1]);
        // "zzyzx" has no vector → OOV row
        assert_eq!(corpus.answer(5).unwrap(), &[table.oov_index()]);
        assert_eq!(corpus.oov_index(), 3);
    }

    #[test]
    fn test_train_labels() {
        let dir    = tempfile::TempDir::new().unwrap();
        let table  = write_fixture(dir.path());
        let corpus = InsuranceQaCorpus::load(dir.path(), &table).unwrap();

        let qs = corpus.questions(InsuranceQaSplit::Train).unwrap();
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].question, vec![0, 2]);
        assert_eq!(qs[0].good, vec![1, 3]);
        assert!(qs[0].pool.is_empty());
    }

    #[test]
    fn test_pool_labels_and_candidates() {
        let dir    = tempfile::TempDir::new().unwrap();
        let table  = write_fixture(dir.path());
        let corpus = InsuranceQaCorpus::load(dir.path(), &table).unwrap();

        let qs = corpus.questions(InsuranceQaSplit::Test1).unwrap();
        assert_eq!(qs[0].good, vec![2]);
        assert_eq!(qs[0].pool, vec![5, 2, 4, 4, 1]);
        assert_eq!(pool_candidates(&qs[0]), vec![2, 5, 4, 1]);
    }

    #[test]
    fn test_unknown_corpus_token_is_an_error() {
        let dir    = tempfile::TempDir::new().unwrap();
        let table  = write_fixture(dir.path());
        let corpus = InsuranceQaCorpus::load(dir.path(), &table).unwrap();
        assert!(matches!(
            corpus.convert_tokens("idx_1 idx_99"),
            Err(CorpusError::UnknownToken(t)) if t == "idx_99"
        ));
    }

    #[test]
    fn test_wrong_column_count_is_malformed() {
        let dir   = tempfile::TempDir::new().unwrap();
        let table = write_fixture(dir.path());
        fs::write(dir.path().join(InsuranceQaSplit::Test2.file_name()), "1\tidx_1\n").unwrap();

        let corpus = InsuranceQaCorpus::load(dir.path(), &table).unwrap();
        assert!(matches!(
            corpus.questions(InsuranceQaSplit::Test2),
            Err(CorpusError::MalformedLine { line: 1, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir   = tempfile::TempDir::new().unwrap();
        let table = EmbeddingTable::from_entries(vec![("a".to_string(), vec![1.0])]).unwrap();
        assert!(matches!(
            InsuranceQaCorpus::load(dir.path(), &table),
            Err(CorpusError::Io { .. })
        ));
    }
}
