// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `evaluate` and `rank`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::str::FromStr;

use crate::application::train_use_case::TrainConfig;
use crate::data::{insuranceqa::InsuranceQaSplit, liveqa::{LIVEQA_QUESTION_COUNT, LIVEQA_URL}, CorpusFormat};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the attention LSTM ranker
    Train(TrainArgs),

    /// Report accuracy and MRR for a trained checkpoint
    Evaluate(EvaluateArgs),

    /// Order candidate answers for a question
    Rank(RankArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Which corpus format `--data-path` points at
    #[arg(long, value_enum, default_value = "liveqa")]
    pub corpus: CorpusFormat,

    /// LiveQA judgments file (downloaded if missing) or InsuranceQA directory
    #[arg(long, default_value = "data/liveqa-2015-rels.txt")]
    pub data_path: String,

    /// Directory for checkpoints, config, vocabulary and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Pretrained word vectors in word2vec text format (required for InsuranceQA)
    #[arg(long)]
    pub embeddings_path: Option<String>,

    /// LiveQA vocabulary file [default: <checkpoint-dir>/vocabulary.json]
    #[arg(long)]
    pub vocabulary_path: Option<String>,

    /// Where to fetch the LiveQA judgments when `--data-path` is missing
    #[arg(long, default_value = LIVEQA_URL)]
    pub liveqa_url: String,

    /// Number of LiveQA questions the judgments file must contain
    #[arg(long, default_value_t = LIVEQA_QUESTION_COUNT)]
    pub expected_questions: usize,

    /// Skip the LiveQA question-count check
    #[arg(long)]
    pub skip_count_check: bool,

    /// Every question and answer is padded or truncated to this many tokens
    /// [default: 100 for liveqa, 40 for insuranceqa]
    #[arg(long)]
    pub max_len: Option<usize>,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 24)]
    pub epochs: usize,

    /// RMSProp learning rate
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Ignored when --embeddings-path is given; the vectors set the width
    #[arg(long, default_value_t = 128)]
    pub embed_dim: usize,

    /// LSTM units per direction
    #[arg(long, default_value_t = 256)]
    pub hidden_dim: usize,

    /// Hinge loss margin
    #[arg(long, default_value_t = 0.2)]
    pub margin: f64,

    /// Fraction of questions held out (the last ones) for validation and evaluation
    #[arg(long, default_value_t = 0.2)]
    pub val_split: f64,

    /// Seed for negative sampling, the split and loader shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            format:             a.corpus,
            data_path:          a.data_path,
            checkpoint_dir:     a.checkpoint_dir,
            embeddings_path:    a.embeddings_path,
            vocabulary_path:    a.vocabulary_path,
            liveqa_url:         a.liveqa_url,
            expected_questions: (!a.skip_count_check).then_some(a.expected_questions),
            max_len:            a.max_len.unwrap_or_else(|| a.corpus.default_max_len()),
            batch_size:         a.batch_size,
            epochs:             a.epochs,
            lr:                 a.lr,
            embed_dim:          a.embed_dim,
            hidden_dim:         a.hidden_dim,
            margin:             a.margin,
            val_split:          a.val_split,
            seed:               a.seed,
            vocab_size:         0,
        }
    }
}

/// `--n-eval` value: a count, or `all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalCount(pub Option<usize>);

impl FromStr for EvalCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self(None));
        }
        s.parse::<usize>()
            .map(|n| Self(Some(n)))
            .map_err(|_| format!("expected a number or 'all', got '{s}'"))
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// InsuranceQA label file to evaluate (LiveQA ignores this)
    #[arg(long, value_enum, default_value = "test1")]
    pub split: InsuranceQaSplit,

    /// Evaluate only the last N triples and pools, or `all`
    #[arg(long, default_value = "512")]
    pub n_eval: EvalCount,
}

#[derive(Args, Debug)]
pub struct RankArgs {
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long)]
    pub question: String,

    /// A candidate answer; repeat the flag for each candidate
    #[arg(long = "answer", required = true)]
    pub answers: Vec<String>,
}
