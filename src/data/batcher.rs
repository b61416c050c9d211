// ============================================================
// Layer 4 — Triple Batcher
// ============================================================
// Implements Burn's Batcher trait to stack RankingTriples into
// tensors for the hinge-loss graph.
//
//   Input:  Vec of N triples, every sequence of length S
//   Output: three [N, S] id tensors
//
// Sequences are padded upstream, so stacking is a flatten and
// a reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::domain::sample::RankingTriple;

#[derive(Debug, Clone)]
pub struct TripleBatch<B: Backend> {
    /// [batch_size, max_len]
    pub questions: Tensor<B, 2, Int>,

    /// [batch_size, max_len]
    pub good_answers: Tensor<B, 2, Int>,

    /// [batch_size, max_len]
    pub bad_answers: Tensor<B, 2, Int>,
}

#[derive(Clone, Debug)]
pub struct TripleBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TripleBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

/// Stack equal-length id sequences into a `[rows, len]` Int tensor.
pub fn stack_sequences<B: Backend>(seqs: &[&[u32]], device: &B::Device) -> Tensor<B, 2, Int> {
    let rows = seqs.len();
    let len  = seqs.first().map(|s| s.len()).unwrap_or(0);
    let flat: Vec<i64> = seqs
        .iter()
        .flat_map(|s| s.iter().map(|&x| x as i64))
        .collect();
    Tensor::from_data(TensorData::new(flat, [rows, len]), device)
}

impl<B: Backend> Batcher<RankingTriple, TripleBatch<B>> for TripleBatcher<B> {
    fn batch(&self, items: Vec<RankingTriple>) -> TripleBatch<B> {
        let questions: Vec<&[u32]> = items.iter().map(|t| t.question.as_slice()).collect();
        let good:      Vec<&[u32]> = items.iter().map(|t| t.good.as_slice()).collect();
        let bad:       Vec<&[u32]> = items.iter().map(|t| t.bad.as_slice()).collect();

        TripleBatch {
            questions:    stack_sequences(&questions, &self.device),
            good_answers: stack_sequences(&good, &self.device),
            bad_answers:  stack_sequences(&bad, &self.device),
        }
    }
}
