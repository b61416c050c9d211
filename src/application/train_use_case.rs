// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run:
//
//   Step 1: Load the corpus and its encoder   (Layer 4 / 6)
//             LiveQA      → Dictionary built from the corpus text
//             InsuranceQA → pretrained EmbeddingTable
//   Step 2: Hold out the last questions       (Layer 4 - data)
//   Step 3: Build hinge-loss triples per side (Layer 4 - data)
//   Step 4: Save the resolved config          (Layer 6 - infra)
//   Step 5: Run the training loop             (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{ensure, Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::{
    dataset::TripleDataset,
    insuranceqa::{InsuranceQaCorpus, InsuranceQaSplit},
    liveqa::{LiveQaLoader, LIVEQA_FILE_NAME, LIVEQA_QUESTION_COUNT, LIVEQA_URL},
    sampler::{insuranceqa_triples, liveqa_triples},
    splitter::hold_out_tail,
    CorpusFormat,
};
use crate::domain::sample::RankingTriple;
use crate::infra::{
    checkpoint::CheckpointManager,
    dictionary::Dictionary,
    embeddings::{EmbeddingMatrix, EmbeddingTable},
};
use crate::ml::{model::AttentionQaConfig, trainer::run_training};

// ─── Training Configuration ──────────────────────────────────────────────────
// Saved to train_config.json before training. `vocab_size`, `embed_dim`
// and `vocabulary_path` hold the values resolved from the data, so the
// file alone is enough to rebuild the model and its encoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub format:             CorpusFormat,
    /// LiveQA judgments file, or the InsuranceQA directory
    pub data_path:          String,
    pub checkpoint_dir:     String,
    /// word2vec text file; required for InsuranceQA
    pub embeddings_path:    Option<String>,
    /// LiveQA dictionary; defaults to <checkpoint_dir>/vocabulary.json
    pub vocabulary_path:    Option<String>,
    /// Download source when the LiveQA file is missing
    #[serde(default = "default_liveqa_url")]
    pub liveqa_url:         String,
    /// LiveQA record-count check; `None` disables it
    pub expected_questions: Option<usize>,
    pub max_len:            usize,
    pub batch_size:         usize,
    pub epochs:             usize,
    pub lr:                 f64,
    pub embed_dim:          usize,
    pub hidden_dim:         usize,
    pub margin:             f64,
    pub val_split:          f64,
    pub seed:               u64,
    pub vocab_size:         usize,
}

fn default_liveqa_url() -> String {
    LIVEQA_URL.to_string()
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            format:             CorpusFormat::LiveQa,
            data_path:          format!("data/{LIVEQA_FILE_NAME}"),
            checkpoint_dir:     "checkpoints".to_string(),
            embeddings_path:    None,
            vocabulary_path:    None,
            liveqa_url:         default_liveqa_url(),
            expected_questions: Some(LIVEQA_QUESTION_COUNT),
            max_len:            CorpusFormat::LiveQa.default_max_len(),
            batch_size:         128,
            epochs:             24,
            lr:                 1e-4,
            embed_dim:          128,
            hidden_dim:         256,
            margin:             0.2,
            val_split:          0.2,
            seed:               42,
            vocab_size:         0,
        }
    }
}

impl TrainConfig {
    pub fn model_config(&self) -> AttentionQaConfig {
        AttentionQaConfig::new(self.vocab_size, self.max_len, self.embed_dim, self.hidden_dim)
            .with_margin(self.margin)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_len >= 2, "max_len must be at least 2, got {}", self.max_len);
        ensure!(self.batch_size > 0, "batch_size must be positive");
        ensure!(self.hidden_dim > 0 && self.embed_dim > 0, "layer sizes must be positive");
        ensure!(
            (0.0..1.0).contains(&self.val_split),
            "val_split must be in [0, 1), got {}",
            self.val_split
        );
        Ok(())
    }

    /// Loader for the configured LiveQA file, shared by train and evaluate.
    pub fn liveqa_loader(&self) -> LiveQaLoader {
        LiveQaLoader::new(&self.data_path)
            .with_url(self.liveqa_url.clone())
            .with_expected_questions(self.expected_questions)
    }

    /// Where the LiveQA dictionary lives for this run.
    pub fn resolved_vocabulary_path(&self) -> PathBuf {
        match &self.vocabulary_path {
            Some(p) => PathBuf::from(p),
            None    => PathBuf::from(&self.checkpoint_dir).join("vocabulary.json"),
        }
    }
}

/// Train and held-out triples plus the sizes the model must be built with.
/// The held-out triples come only from the trailing `val_split` questions.
pub(crate) struct PreparedCorpus {
    pub(crate) train:      Vec<RankingTriple>,
    pub(crate) val:        Vec<RankingTriple>,
    pub(crate) vocab_size: usize,
    pub(crate) embeddings: Option<EmbeddingMatrix>,
}

pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let mut cfg = self.config.clone();
        cfg.validate()?;

        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        let mut rng      = StdRng::seed_from_u64(cfg.seed);

        // ── Steps 1–3: corpus, encoder, held-out questions, triples ─────────
        let prepared = match cfg.format {
            CorpusFormat::LiveQa      => prepare_liveqa(&mut cfg, &mut rng)?,
            CorpusFormat::InsuranceQa => prepare_insuranceqa(&cfg, &mut rng)?,
        };
        ensure!(!prepared.train.is_empty(), "No training triples could be built from '{}'", cfg.data_path);
        tracing::info!("Split: {} train, {} validation", prepared.train.len(), prepared.val.len());

        cfg.vocab_size = prepared.vocab_size;
        if let Some(matrix) = &prepared.embeddings {
            cfg.embed_dim = matrix.dim;
        }

        // ── Step 4: save config for evaluate / rank ──────────────────────────
        ckpt_manager.save_config(&cfg)?;

        // ── Step 5: training loop (Layer 5) ──────────────────────────────────
        run_training(
            &cfg,
            prepared.embeddings.as_ref(),
            TripleDataset::new(prepared.train),
            TripleDataset::new(prepared.val),
            &ckpt_manager,
        )
    }
}

pub(crate) fn prepare_liveqa(cfg: &mut TrainConfig, rng: &mut StdRng) -> Result<PreparedCorpus> {
    let corpus = cfg.liveqa_loader().load()?;

    let vocab_path = cfg.resolved_vocabulary_path();
    let dictionary = Dictionary::load_or_build(&vocab_path, &corpus.texts())?;
    cfg.vocabulary_path = Some(vocab_path.display().to_string());
    tracing::info!("Vocabulary has {} tokens", dictionary.len());

    // the dictionary sees every text; only the head questions are trained on
    let (head, held_out) = corpus.split_tail(cfg.val_split);
    let train = liveqa_triples(&head, &dictionary, cfg.max_len)?;
    let val   = liveqa_triples(&held_out, &dictionary, cfg.max_len)?;

    let embeddings = match &cfg.embeddings_path {
        Some(path) => {
            let table = EmbeddingTable::load(Path::new(path))?;
            let (matrix, hits) = table.aligned_to(&dictionary, rng);
            tracing::info!("{} of {} vocabulary tokens have pretrained vectors", hits, dictionary.len());
            Some(matrix)
        }
        None => None,
    };

    Ok(PreparedCorpus { train, val, vocab_size: dictionary.len(), embeddings })
}

pub(crate) fn prepare_insuranceqa(cfg: &TrainConfig, rng: &mut StdRng) -> Result<PreparedCorpus> {
    let path = cfg
        .embeddings_path
        .as_deref()
        .context("InsuranceQA training needs --embeddings-path")?;

    let table     = EmbeddingTable::load(Path::new(path))?;
    let corpus    = InsuranceQaCorpus::load(&cfg.data_path, &table)?;
    let questions = corpus.questions(InsuranceQaSplit::Train)?;
    tracing::info!(
        "Loaded {} training questions over {} answers",
        questions.len(),
        corpus.answer_count()
    );

    let (head, held_out) = hold_out_tail(questions, cfg.val_split);
    let train = insuranceqa_triples(&corpus, &head, cfg.max_len, rng)?;
    let val   = insuranceqa_triples(&corpus, &held_out, cfg.max_len, rng)?;

    Ok(PreparedCorpus { train, val, vocab_size: table.len(), embeddings: Some(table.matrix()) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::insuranceqa::tests::write_fixture;

    #[test]
    fn test_default_hyperparameters() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.batch_size, 128);
        assert_eq!(cfg.epochs, 24);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.max_len, 100);
        assert!((cfg.margin - 0.2).abs() < 1e-12);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let short = TrainConfig { max_len: 1, ..TrainConfig::default() };
        assert!(short.validate().is_err());

        let split = TrainConfig { val_split: 1.0, ..TrainConfig::default() };
        assert!(split.validate().is_err());
    }

    #[test]
    fn test_vocabulary_path_defaults_to_checkpoint_dir() {
        let cfg = TrainConfig { checkpoint_dir: "ckpt".into(), ..TrainConfig::default() };
        assert_eq!(cfg.resolved_vocabulary_path(), PathBuf::from("ckpt").join("vocabulary.json"));

        let custom = TrainConfig { vocabulary_path: Some("v.json".into()), ..cfg };
        assert_eq!(custom.resolved_vocabulary_path(), PathBuf::from("v.json"));
    }

    #[test]
    fn test_model_config_carries_sizes() {
        let cfg = TrainConfig { vocab_size: 50, max_len: 6, embed_dim: 4, hidden_dim: 3, margin: 0.1, ..TrainConfig::default() };
        let model = cfg.model_config();
        assert_eq!(model.vocab_size, 50);
        assert_eq!(model.encoding_dim(), 18);
        assert!((model.margin - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_config_without_liveqa_url_uses_default() {
        let mut json = serde_json::to_value(TrainConfig::default()).unwrap();
        json.as_object_mut().unwrap().remove("liveqa_url");

        let cfg: TrainConfig = serde_json::from_value(json).unwrap();
        assert_eq!(cfg.liveqa_url, LIVEQA_URL);
    }

    #[test]
    fn test_insuranceqa_requires_embeddings() {
        let cfg = TrainConfig { format: CorpusFormat::InsuranceQa, ..TrainConfig::default() };
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        assert!(prepare_insuranceqa(&cfg, &mut rng).is_err());
    }

    #[test]
    fn test_prepare_insuranceqa_resolves_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let table = write_fixture(dir.path());

        let emb_path = dir.path().join("vectors.txt");
        std::fs::write(&emb_path, "policy 0.1 0.2\ncover 0.3 0.4\nflood 0.5 0.6\n").unwrap();

        let cfg = TrainConfig {
            format:          CorpusFormat::InsuranceQa,
            data_path:       dir.path().display().to_string(),
            embeddings_path: Some(emb_path.display().to_string()),
            max_len:         4,
            ..TrainConfig::default()
        };
        let mut rng  = StdRng::seed_from_u64(cfg.seed);
        let prepared = prepare_insuranceqa(&cfg, &mut rng).unwrap();

        // idx_1 has two good answers, idx_2 has one; 20% of two questions rounds to none
        assert_eq!(prepared.train.len(), 3);
        assert!(prepared.val.is_empty());
        assert_eq!(prepared.vocab_size, table.len());
        assert_eq!(prepared.embeddings.unwrap().dim, 2);
    }
}
