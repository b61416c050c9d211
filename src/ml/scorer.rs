// ============================================================
// Layer 5 — Scorer
// ============================================================
// The two-input inference path: loads a trained checkpoint and
// returns cos(q, a) for padded (question, answer) id sequences.
//
// Rows are pushed through the model in fixed-size batches, so
// large evaluation pools never need one giant tensor.

use anyhow::{ensure, Result};
use burn::prelude::*;

use crate::data::batcher::stack_sequences;
use crate::domain::sample::{EvaluationPool, RankingTriple};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::AttentionQaModel;

pub const SCORE_BATCH_SIZE: usize = 128;

pub struct Scorer<B: Backend> {
    model:      AttentionQaModel<B>,
    device:     B::Device,
    batch_size: usize,
}

impl<B: Backend> Scorer<B> {
    pub fn new(model: AttentionQaModel<B>, device: B::Device) -> Self {
        Self { model, device, batch_size: SCORE_BATCH_SIZE }
    }

    /// Rebuilds the architecture from train_config.json, then loads the newest weights.
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, device: B::Device) -> Result<Self> {
        let cfg   = ckpt_manager.load_config()?;
        let model = cfg.model_config().init::<B>(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint '{}'", ckpt_manager.dir().display());
        Ok(Self::new(model, device))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// One score per row. Both slices must have equal length.
    pub fn score(&self, questions: &[&[u32]], answers: &[&[u32]]) -> Result<Vec<f32>> {
        ensure!(
            questions.len() == answers.len(),
            "{} questions but {} answers",
            questions.len(),
            answers.len()
        );

        let mut scores = Vec::with_capacity(questions.len());
        for (q_chunk, a_chunk) in questions.chunks(self.batch_size).zip(answers.chunks(self.batch_size)) {
            let q = stack_sequences::<B>(q_chunk, &self.device);
            let a = stack_sequences::<B>(a_chunk, &self.device);

            let batch: Vec<f32> = self
                .model
                .score(q, a)
                .into_data()
                .convert::<f32>()
                .to_vec()
                .map_err(|e| anyhow::anyhow!("Cannot read scores: {e:?}"))?;
            scores.extend(batch);
        }
        Ok(scores)
    }

    /// Scores of every candidate in the pool, in candidate order.
    pub fn score_pool(&self, pool: &EvaluationPool) -> Result<Vec<f32>> {
        let questions: Vec<&[u32]> = vec![pool.question.as_slice(); pool.len()];
        let answers:   Vec<&[u32]> = pool.candidates.iter().map(Vec::as_slice).collect();
        self.score(&questions, &answers)
    }

    /// (good scores, bad scores) for each triple.
    pub fn score_triples(&self, triples: &[RankingTriple]) -> Result<(Vec<f32>, Vec<f32>)> {
        let questions: Vec<&[u32]> = triples.iter().map(|t| t.question.as_slice()).collect();
        let good:      Vec<&[u32]> = triples.iter().map(|t| t.good.as_slice()).collect();
        let bad:       Vec<&[u32]> = triples.iter().map(|t| t.bad.as_slice()).collect();

        Ok((self.score(&questions, &good)?, self.score(&questions, &bad)?))
    }
}
