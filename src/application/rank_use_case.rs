// ============================================================
// Layer 2 — RankUseCase
// ============================================================
// Orders free-text candidate answers for one question with a
// trained checkpoint:
//
//   1. encode + pad the question and every candidate
//   2. score each (question, candidate) pair with the 2-input graph
//   3. sort by score, best first

use anyhow::Result;
use burn::prelude::*;

use crate::application::text_encoder::TextEncoder;
use crate::domain::traits::AnswerRanker;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::scorer::Scorer;

type InferBackend = burn::backend::Wgpu;

pub struct RankUseCase<B: Backend> {
    scorer:  Scorer<B>,
    encoder: TextEncoder,
    max_len: usize,
}

impl RankUseCase<InferBackend> {
    /// Loads the model and its encoder from a checkpoint directory.
    pub fn open(checkpoint_dir: &str) -> Result<Self> {
        let ckpt    = CheckpointManager::open(checkpoint_dir)?;
        let cfg     = ckpt.load_config()?;
        let encoder = TextEncoder::from_config(&cfg)?;
        let device  = burn::backend::wgpu::WgpuDevice::default();
        let scorer  = Scorer::from_checkpoint(&ckpt, device)?;
        Ok(Self::new(scorer, encoder, cfg.max_len))
    }
}

impl<B: Backend> RankUseCase<B> {
    pub fn new(scorer: Scorer<B>, encoder: TextEncoder, max_len: usize) -> Self {
        Self { scorer, encoder, max_len }
    }
}

impl<B: Backend> AnswerRanker for RankUseCase<B> {
    fn rank(&self, question: &str, candidates: &[String]) -> Result<Vec<(usize, f32)>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let question = self.encoder.encode_padded(question, self.max_len)?;
        let answers  = candidates
            .iter()
            .map(|c| self.encoder.encode_padded(c, self.max_len))
            .collect::<Result<Vec<_>>>()?;

        let questions: Vec<&[u32]> = vec![question.as_slice(); answers.len()];
        let answers:   Vec<&[u32]> = answers.iter().map(Vec::as_slice).collect();
        let scores = self.scorer.score(&questions, &answers)?;

        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        tracing::debug!("Ranked {} candidates, best score {:.4}", ranked.len(), ranked[0].1);
        Ok(ranked)
    }
}
