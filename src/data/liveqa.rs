// ============================================================
// Layer 4 — LiveQA Corpus Loader
// ============================================================
// Parses the TREC LiveQA 2015 relevance judgments.
//
// The file interleaves two kinds of lines:
//
//   question line (tab separated, 7+ fields):
//     <trec id>q \t <qid> \t \t <title> \t <body> \t <main cat> \t <sub cat>
//
//   answer line (5 fields, separated by backtick-tab-backtick):
//     <trec id>q `\t` <qid> `\t` <score> `\t` <answer> `\t` <resource>
//
// Answer lines belong to the question record named in their
// first field. The full corpus has exactly 1087 questions; the
// loader checks that count so any drift in the file format is
// caught before training on a half-parsed corpus.
//
// Reference: TREC 2015 LiveQA track, qrels ver2

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::data::{download::download_to_file, error::CorpusError, splitter::hold_out_tail};
use crate::domain::question::{Answer, Question};

pub const LIVEQA_FILE_NAME: &str = "liveqa-2015-rels.txt";

pub const LIVEQA_URL: &str =
    "https://raw.githubusercontent.com/codekansas/ml/master/theano_stuff/ir/LiveQA2015-qrels-ver2.txt";

/// Number of questions in the published judgments file.
pub const LIVEQA_QUESTION_COUNT: usize = 1087;

const ANSWER_DELIMITER: &str = "`\t`";

/// Questions and their judged answers, both keyed by TREC record id.
#[derive(Debug, Clone, Default)]
pub struct LiveQaCorpus {
    pub questions: BTreeMap<String, Question>,
    pub answers:   BTreeMap<String, Vec<Answer>>,
}

impl LiveQaCorpus {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Each question with its answers, in record id order.
    pub fn iter(&self) -> impl Iterator<Item = (&Question, &[Answer])> {
        self.questions.iter().map(move |(id, q)| {
            let answers = self.answers.get(id).map(Vec::as_slice).unwrap_or(&[]);
            (q, answers)
        })
    }

    /// All text the dictionary should see: body, title, then every answer.
    pub fn texts(&self) -> Vec<&str> {
        let mut texts = Vec::new();
        for q in self.questions.values() {
            texts.push(q.content.as_str());
            texts.push(q.title.as_str());
        }
        for answers in self.answers.values() {
            texts.extend(answers.iter().map(|a| a.text.as_str()));
        }
        texts
    }

    /// Move the last `val_fraction` of questions (record id order), with
    /// their answers, into a second corpus. Returns (head, held out).
    pub fn split_tail(mut self, val_fraction: f64) -> (LiveQaCorpus, LiveQaCorpus) {
        let ids: Vec<String> = self.questions.keys().cloned().collect();
        let (_, held_ids)    = hold_out_tail(ids, val_fraction);

        let mut held = LiveQaCorpus::default();
        for id in held_ids {
            if let Some(answers) = self.answers.remove(&id) {
                held.answers.insert(id.clone(), answers);
            }
            if let Some(question) = self.questions.remove(&id) {
                held.questions.insert(id, question);
            }
        }
        (self, held)
    }
}

/// Reads the judgments file, downloading it first if it is missing.
pub struct LiveQaLoader {
    path:               PathBuf,
    url:                String,
    expected_questions: Option<usize>,
}

impl LiveQaLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path:               path.into(),
            url:                LIVEQA_URL.to_string(),
            expected_questions: Some(LIVEQA_QUESTION_COUNT),
        }
    }

    /// `None` disables the record-count check (useful for subsets).
    pub fn with_expected_questions(mut self, expected: Option<usize>) -> Self {
        self.expected_questions = expected;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn load(&self) -> Result<LiveQaCorpus, CorpusError> {
        if !self.path.exists() {
            tracing::warn!("'{}' not found, downloading", self.path.display());
            download_to_file(&self.url, &self.path)?;
        }

        let text = fs::read_to_string(&self.path)
            .map_err(|e| CorpusError::io(&self.path, e))?;
        let name = file_label(&self.path);

        let corpus = parse_liveqa(&text, &name, self.expected_questions)?;
        tracing::info!(
            "Loaded {} LiveQA questions with {} answers",
            corpus.len(),
            corpus.answers.values().map(Vec::len).sum::<usize>()
        );
        Ok(corpus)
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("liveqa")
        .to_string()
}

/// Parse the judgments text. `file` is only used in error messages.
pub fn parse_liveqa(
    text:     &str,
    file:     &str,
    expected: Option<usize>,
) -> Result<LiveQaCorpus, CorpusError> {
    let mut corpus = LiveQaCorpus::default();

    for (i, line) in text.split(['\n', '\r']).enumerate() {
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }

        if let Some(question) = parse_question_line(line) {
            corpus.answers.insert(question.record_id.clone(), Vec::new());
            corpus.questions.insert(question.record_id.clone(), question);
            continue;
        }

        let (record_id, answer) = parse_answer_line(line, file, line_no)?;
        match corpus.answers.get_mut(&record_id) {
            Some(list) => {
                if let Some(q) = corpus.questions.get(&record_id) {
                    if q.qid != answer.qid {
                        tracing::warn!(
                            "{file}:{line_no}: answer from '{}' names qid '{}' but question {record_id} is '{}'",
                            answer.resource, answer.qid, q.qid
                        );
                    }
                }
                list.push(answer)
            }
            None => {
                return Err(CorpusError::UnknownQuestion {
                    file: file.to_string(),
                    line: line_no,
                    record_id,
                })
            }
        }
    }

    if let Some(expected) = expected {
        let found = corpus.questions.len();
        if found != expected || corpus.answers.len() != expected {
            return Err(CorpusError::UnexpectedQuestionCount {
                expected,
                found,
                answer_lists: corpus.answers.len(),
            });
        }
    }

    Ok(corpus)
}

/// Returns `None` when the line does not have the question shape.
fn parse_question_line(line: &str) -> Option<Question> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 7 {
        return None;
    }

    let record_id = fields[0].strip_suffix('q')?;
    if record_id.is_empty() || !record_id.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let qid = fields[1];
    if qid.is_empty() || !qid.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    if !fields[2].is_empty() {
        return None;
    }

    let n = fields.len();
    let title = fields[3];
    let (main_category, sub_category) = (fields[n - 2], fields[n - 1]);
    if title.is_empty() || main_category.is_empty() || sub_category.is_empty() {
        return None;
    }

    Some(Question {
        record_id:     record_id.to_string(),
        qid:           qid.to_string(),
        title:         title.to_string(),
        // the body absorbs any tabs between the title and the categories
        content:       fields[4..n - 2].join("\t"),
        main_category: main_category.to_string(),
        sub_category:  sub_category.to_string(),
    })
}

fn parse_answer_line(line: &str, file: &str, line_no: usize) -> Result<(String, Answer), CorpusError> {
    let fields: Vec<&str> = line.split(ANSWER_DELIMITER).collect();
    if fields.len() != 5 {
        return Err(CorpusError::malformed(
            file,
            line_no,
            format!("expected 5 answer fields, found {}", fields.len()),
        ));
    }

    // the record id carries a one-character suffix, e.g. "1234q"
    let mut record_id = fields[0].to_string();
    record_id.pop();

    let score: i32 = fields[2].trim().parse().map_err(|_| {
        CorpusError::malformed(file, line_no, format!("invalid score '{}'", fields[2]))
    })?;

    Ok((record_id, Answer::new(fields[1], score, fields[3], fields[4])))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
1001q\tyq01\t\tHow do cats purr?\tI always wondered.\tPets\tCats
1001q`\t`yq01`\t`4`\t`They vibrate their larynx.`\t`yahoo
1001q`\t`yq01`\t`1`\t`No idea.`\t`yahoo
1001q`\t`yq01`\t`2`\t`Magic.`\t`yahoo
1002q\tyq02\t\tBest pizza topping?\t\tFood\tPizza
1002q`\t`yq02`\t`3`\t`Mushrooms.`\t`yahoo
";

    #[test]
    fn test_parses_questions_and_answers() {
        let corpus = parse_liveqa(SAMPLE, "sample", None).unwrap();
        assert_eq!(corpus.questions.len(), 2);
        assert_eq!(corpus.questions.len(), corpus.answers.len());

        let q = &corpus.questions["1001"];
        assert_eq!(q.qid, "yq01");
        assert_eq!(q.title, "How do cats purr?");
        assert_eq!(q.content, "I always wondered.");
        assert_eq!(q.main_category, "Pets");
        assert_eq!(q.sub_category, "Cats");

        let answers = &corpus.answers["1001"];
        assert_eq!(answers.len(), 3);
        assert_eq!(answers[0].score, 4);
        assert_eq!(answers[0].text, "They vibrate their larynx.");
        assert_eq!(answers[0].resource, "yahoo");
    }

    #[test]
    fn test_empty_body_is_allowed() {
        let corpus = parse_liveqa(SAMPLE, "sample", None).unwrap();
        assert_eq!(corpus.questions["1002"].content, "");
    }

    #[test]
    fn test_carriage_returns_split_lines() {
        let text = SAMPLE.replace('\n', "\r\n");
        let corpus = parse_liveqa(&text, "sample", None).unwrap();
        assert_eq!(corpus.answers["1001"].len(), 3);
    }

    #[test]
    fn test_count_mismatch_is_fatal() {
        let err = parse_liveqa(SAMPLE, "sample", Some(LIVEQA_QUESTION_COUNT)).unwrap_err();
        assert!(matches!(
            err,
            CorpusError::UnexpectedQuestionCount { expected: 1087, found: 2, .. }
        ));
    }

    #[test]
    fn test_count_match_passes() {
        assert!(parse_liveqa(SAMPLE, "sample", Some(2)).is_ok());
    }

    #[test]
    fn test_malformed_answer_line() {
        let text = "1001q\tyq01\t\tTitle\tBody\tA\tB\nnot an answer line\n";
        let err = parse_liveqa(text, "sample", None).unwrap_err();
        assert!(matches!(err, CorpusError::MalformedLine { line: 2, .. }));
    }

    #[test]
    fn test_answer_for_unknown_question() {
        let text = "9999q`\t`yq`\t`3`\t`text`\t`res\n";
        let err = parse_liveqa(text, "sample", None).unwrap_err();
        assert!(matches!(err, CorpusError::UnknownQuestion { .. }));
    }

    #[test]
    fn test_loader_reads_existing_file() {
        let dir  = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(LIVEQA_FILE_NAME);
        std::fs::write(&path, SAMPLE).unwrap();

        let corpus = LiveQaLoader::new(&path)
            .with_expected_questions(Some(2))
            .load()
            .unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.iter().count(), 2);
    }

    #[test]
    fn test_missing_file_with_unreachable_url_leaves_nothing_behind() {
        let dir  = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing.txt");

        let err = LiveQaLoader::new(&path)
            .with_url("http://127.0.0.1:9/liveqa.txt")
            .with_expected_questions(None)
            .load()
            .unwrap_err();

        assert!(matches!(err, CorpusError::Download { .. }));
        assert!(!path.exists());
        assert!(!path.with_extension("part").exists());
    }

    #[test]
    fn test_split_tail_holds_out_last_questions() {
        let corpus       = parse_liveqa(SAMPLE, "sample", None).unwrap();
        let (head, held) = corpus.split_tail(0.5);

        assert_eq!(head.questions.keys().collect::<Vec<_>>(), vec!["1001"]);
        assert_eq!(held.questions.keys().collect::<Vec<_>>(), vec!["1002"]);
        assert_eq!(head.answers["1001"].len(), 3);
        assert_eq!(held.answers["1002"].len(), 1);
        assert!(!head.answers.contains_key("1002"));
    }

    #[test]
    fn test_texts_cover_questions_and_answers() {
        let corpus = parse_liveqa(SAMPLE, "sample", None).unwrap();
        // 2 bodies + 2 titles + 4 answers
        assert_eq!(corpus.texts().len(), 8);
    }
}
