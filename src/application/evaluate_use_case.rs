// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a trained checkpoint:
//
//   accuracy — fraction of the last N triples whose good answer
//              outscores the bad one
//   MRR      — mean reciprocal rank of the correct answer over the
//              last N candidate pools
//
// The corpus is rebuilt from the saved TrainConfig. Only questions
// training never saw are scored: for LiveQA and the InsuranceQA
// train split that is the trailing `val_split` fraction training
// held out; InsuranceQA test1 / test2 are separate label files.
// The InsuranceQA train split has no pools, so only accuracy is
// reported there.

use anyhow::Result;
use burn::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use std::fmt;

use crate::application::{text_encoder::TextEncoder, train_use_case::TrainConfig};
use crate::data::{
    insuranceqa::{InsuranceQaCorpus, InsuranceQaSplit, LabelFileKind},
    sampler::{insuranceqa_pools, insuranceqa_triples, liveqa_pools, liveqa_triples},
    splitter::hold_out_tail,
    CorpusFormat,
};
use crate::domain::{
    ranking::{accuracy_by_margin, last_n, mean_reciprocal_rank},
    sample::{EvaluationPool, RankingTriple},
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::scorer::Scorer;

type InferBackend = burn::backend::Wgpu;

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub triples:  usize,
    pub accuracy: f64,
    pub pools:    usize,
    /// `None` when no pools were evaluated
    pub mrr:      Option<f64>,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "accuracy = {:.4} over {} triples", self.accuracy, self.triples)?;
        match self.mrr {
            Some(mrr) => write!(f, "\nMRR      = {:.4} over {} pools", mrr, self.pools),
            None      => write!(f, "\nMRR      = n/a (no candidate pools)"),
        }
    }
}

pub struct EvaluateUseCase {
    checkpoint_dir: String,
    split:          InsuranceQaSplit,
    n_eval:         Option<usize>,
}

impl EvaluateUseCase {
    pub fn new(checkpoint_dir: impl Into<String>, split: InsuranceQaSplit, n_eval: Option<usize>) -> Self {
        Self { checkpoint_dir: checkpoint_dir.into(), split, n_eval }
    }

    pub fn execute(&self) -> Result<EvaluationReport> {
        let ckpt = CheckpointManager::open(&self.checkpoint_dir)?;
        let cfg  = ckpt.load_config()?;

        let encoder          = TextEncoder::from_config(&cfg)?;
        let (triples, pools) = self.build_samples(&cfg, &encoder)?;
        tracing::info!("Built {} triples and {} pools for evaluation", triples.len(), pools.len());

        let device = burn::backend::wgpu::WgpuDevice::default();
        let scorer = Scorer::<InferBackend>::from_checkpoint(&ckpt, device)?
            .with_batch_size(cfg.batch_size);

        evaluate(&scorer, &encoder, last_n(&triples, self.n_eval), last_n(&pools, self.n_eval))
    }

    fn build_samples(
        &self,
        cfg:     &TrainConfig,
        encoder: &TextEncoder,
    ) -> Result<(Vec<RankingTriple>, Vec<EvaluationPool>)> {
        match cfg.format {
            CorpusFormat::LiveQa => {
                let (_, held_out) = cfg.liveqa_loader().load()?.split_tail(cfg.val_split);
                Ok((
                    liveqa_triples(&held_out, encoder, cfg.max_len)?,
                    liveqa_pools(&held_out, encoder, cfg.max_len)?,
                ))
            }
            CorpusFormat::InsuranceQa => {
                let TextEncoder::Embeddings(table) = encoder else {
                    anyhow::bail!("InsuranceQA checkpoint must use pretrained embeddings");
                };
                let corpus        = InsuranceQaCorpus::load(&cfg.data_path, table)?;
                let mut questions = corpus.questions(self.split)?;
                if self.split == InsuranceQaSplit::Train {
                    questions = hold_out_tail(questions, cfg.val_split).1;
                }

                let mut rng = StdRng::seed_from_u64(cfg.seed);
                let triples = insuranceqa_triples(&corpus, &questions, cfg.max_len, &mut rng)?;
                let pools = match self.split.kind() {
                    LabelFileKind::Pool  => insuranceqa_pools(&corpus, &questions, cfg.max_len)?,
                    LabelFileKind::Train => Vec::new(),
                };
                Ok((triples, pools))
            }
        }
    }
}

/// Accuracy-by-margin over `triples` and MRR over `pools`.
/// Each pool's question and top candidate are logged at debug level.
pub fn evaluate<B: Backend>(
    scorer:  &Scorer<B>,
    encoder: &TextEncoder,
    triples: &[RankingTriple],
    pools:   &[EvaluationPool],
) -> Result<EvaluationReport> {
    let (good, bad) = scorer.score_triples(triples)?;
    let accuracy    = accuracy_by_margin(&good, &bad);

    let pool_scores = pools
        .iter()
        .map(|p| scorer.score_pool(p))
        .collect::<Result<Vec<_>>>()?;

    for (scores, pool) in pool_scores.iter().zip(pools) {
        if let Some(top) = best_index(scores) {
            tracing::debug!(
                "Q: {} | top: {} | correct: {}",
                encoder.decode(&pool.question),
                encoder.decode(&pool.candidates[top]),
                top == pool.correct_index,
            );
        }
    }

    let mrr = (!pools.is_empty()).then(|| {
        mean_reciprocal_rank(
            pool_scores
                .iter()
                .zip(pools)
                .map(|(scores, p)| (scores.as_slice(), p.correct_index)),
        )
    });

    Ok(EvaluationReport { triples: triples.len(), accuracy, pools: pools.len(), mrr })
}

fn best_index(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
}
