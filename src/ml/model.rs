// ============================================================
// Layer 5 — Attention QA Ranking Model
// ============================================================
// Scores a (question, answer) pair by cosine similarity between a
// pooled question encoding and an attention-conditioned answer
// encoding.
//
//   question ids ─► Embedding ─► LSTM ⟶ ┐
//                              LSTM ⟵ ─┴► concat ► maxpool(2) ► flatten = q
//
//   answer ids ──► Embedding ─► AttnLSTM ⟶ (q) ┐
//                              AttnLSTM ⟵ (q) ─┴► concat ► maxpool(2) ► flatten = a
//
//   score(q, a) = cos(q, a)
//
// Training graph: hinge loss over (question, good, bad) triples,
//   L = mean(max(0, margin − cos(q, a⁺) + cos(q, a⁻)))
// Inference graph: `score` with two inputs.
//
// Both graphs share one set of weights, so a checkpoint written by
// the trainer is directly usable for ranking.

use anyhow::{ensure, Result};
use burn::{
    module::Param,
    nn::{Embedding, EmbeddingConfig, Lstm, LstmConfig},
    prelude::*,
    tensor::TensorData,
};

use crate::infra::embeddings::EmbeddingMatrix;
use crate::ml::attention_lstm::{AttentionLstm, AttentionLstmConfig};

/// Added under the square roots of the cosine norms so all-zero
/// encodings score 0 instead of NaN.
const COSINE_EPS: f64 = 1e-8;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct AttentionQaConfig {
    pub vocab_size: usize,
    /// Padded length of every question and answer
    pub max_len:    usize,
    pub embed_dim:  usize,
    /// Units per LSTM direction
    pub hidden_dim: usize,
    #[config(default = 0.2)]
    pub margin:     f64,
}

impl AttentionQaConfig {
    /// Width of a pooled encoding: floor(max_len / 2) steps × 2 directions × hidden.
    pub fn encoding_dim(&self) -> usize {
        (self.max_len / 2) * 2 * self.hidden_dim
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> AttentionQaModel<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embed_dim).init(device);
        self.assemble(embedding, device)
    }

    /// Same as `init`, with the embedding table seeded from pretrained vectors.
    /// The rows stay trainable.
    pub fn init_with_embeddings<B: Backend>(
        &self,
        matrix: &EmbeddingMatrix,
        device: &B::Device,
    ) -> Result<AttentionQaModel<B>> {
        ensure!(
            matrix.rows == self.vocab_size && matrix.dim == self.embed_dim,
            "embedding matrix is {}x{} but the model expects {}x{}",
            matrix.rows, matrix.dim, self.vocab_size, self.embed_dim,
        );

        let mut embedding = EmbeddingConfig::new(self.vocab_size, self.embed_dim).init(device);
        let weights = Tensor::<B, 2>::from_data(
            TensorData::new(matrix.values.clone(), [matrix.rows, matrix.dim]),
            device,
        );
        embedding.weight = Param::from_tensor(weights);

        Ok(self.assemble(embedding, device))
    }

    fn assemble<B: Backend>(&self, embedding: Embedding<B>, device: &B::Device) -> AttentionQaModel<B> {
        let d_q = self.encoding_dim();
        AttentionQaModel {
            embedding,
            question_forward:  LstmConfig::new(self.embed_dim, self.hidden_dim, true).init(device),
            question_backward: LstmConfig::new(self.embed_dim, self.hidden_dim, true).init(device),
            answer_forward:    AttentionLstmConfig::new(self.embed_dim, self.hidden_dim, d_q).init(device),
            answer_backward:   AttentionLstmConfig::new(self.embed_dim, self.hidden_dim, d_q)
                .with_reverse(true)
                .init(device),
            margin: self.margin,
        }
    }
}

#[derive(Module, Debug)]
pub struct AttentionQaModel<B: Backend> {
    /// Shared by questions and answers
    pub embedding:         Embedding<B>,
    pub question_forward:  Lstm<B>,
    pub question_backward: Lstm<B>,
    pub answer_forward:    AttentionLstm<B>,
    pub answer_backward:   AttentionLstm<B>,
    pub margin:            f64,
}

pub struct RankingOutput<B: Backend> {
    /// cos(q, a⁺): [batch]
    pub good_scores: Tensor<B, 1>,
    /// cos(q, a⁻): [batch]
    pub bad_scores:  Tensor<B, 1>,
}

impl<B: Backend> AttentionQaModel<B> {
    /// question_ids: [batch, max_len] → [batch, encoding_dim]
    pub fn encode_question(&self, question_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let x = self.embedding.forward(question_ids);

        let (forward, _)  = self.question_forward.forward(x.clone(), None);
        // Backward pass reads the sequence reversed and keeps that order
        let (backward, _) = self.question_backward.forward(x.flip([1]), None);

        pool_pairs(Tensor::cat(vec![forward, backward], 2))
    }

    /// answer_ids: [batch, max_len], question: [batch, encoding_dim]
    /// → [batch, encoding_dim]
    pub fn encode_answer(&self, answer_ids: Tensor<B, 2, Int>, question: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.embedding.forward(answer_ids);

        let forward  = self.answer_forward.forward(x.clone(), question.clone());
        let backward = self.answer_backward.forward(x, question);

        pool_pairs(Tensor::cat(vec![forward, backward], 2))
    }

    /// Inference graph: cosine score for each (question, answer) row.
    pub fn score(&self, question_ids: Tensor<B, 2, Int>, answer_ids: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        let q = self.encode_question(question_ids);
        let a = self.encode_answer(answer_ids, q.clone());
        cosine_similarity(q, a)
    }

    /// Training graph: one question encoding scored against both answers.
    pub fn forward(
        &self,
        question_ids: Tensor<B, 2, Int>,
        good_ids:     Tensor<B, 2, Int>,
        bad_ids:      Tensor<B, 2, Int>,
    ) -> RankingOutput<B> {
        let q    = self.encode_question(question_ids);
        let good = self.encode_answer(good_ids, q.clone());
        let bad  = self.encode_answer(bad_ids, q.clone());

        RankingOutput {
            good_scores: cosine_similarity(q.clone(), good),
            bad_scores:  cosine_similarity(q, bad),
        }
    }

    pub fn forward_loss(
        &self,
        question_ids: Tensor<B, 2, Int>,
        good_ids:     Tensor<B, 2, Int>,
        bad_ids:      Tensor<B, 2, Int>,
    ) -> (Tensor<B, 1>, RankingOutput<B>) {
        let output = self.forward(question_ids, good_ids, bad_ids);
        let loss   = hinge_loss(output.good_scores.clone(), output.bad_scores.clone(), self.margin);
        (loss, output)
    }
}

/// Max over non-overlapping windows of 2 along time, then flatten.
/// An odd trailing step is dropped.
///
/// x: [batch, seq_len, features] → [batch, (seq_len / 2) * features]
pub fn pool_pairs<B: Backend>(x: Tensor<B, 3>) -> Tensor<B, 2> {
    let [batch, seq_len, features] = x.dims();
    let steps = seq_len / 2;

    x.slice([0..batch, 0..steps * 2, 0..features])
        .reshape([batch, steps, 2, features])
        .max_dim(2)
        .reshape([batch, steps * features])
}

/// Row-wise cosine similarity. a, b: [batch, d] → [batch]
pub fn cosine_similarity<B: Backend>(a: Tensor<B, 2>, b: Tensor<B, 2>) -> Tensor<B, 1> {
    let [batch, _] = a.dims();

    let dot    = (a.clone() * b.clone()).sum_dim(1);
    let norm_a = (a.clone() * a).sum_dim(1).add_scalar(COSINE_EPS).sqrt();
    let norm_b = (b.clone() * b).sum_dim(1).add_scalar(COSINE_EPS).sqrt();

    (dot / (norm_a * norm_b)).reshape([batch])
}

/// mean(max(0, margin − good + bad)) → scalar tensor of shape [1]
pub fn hinge_loss<B: Backend>(good: Tensor<B, 1>, bad: Tensor<B, 1>, margin: f64) -> Tensor<B, 1> {
    (bad - good).add_scalar(margin).clamp_min(0.0).mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn ids(rows: &[&[i64]]) -> Tensor<TestBackend, 2, Int> {
        let cols = rows[0].len();
        let flat: Vec<i64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Tensor::from_data(TensorData::new(flat, [rows.len(), cols]), &Default::default())
    }

    fn floats(values: &[f32]) -> Tensor<TestBackend, 1> {
        Tensor::from_data(TensorData::new(values.to_vec(), [values.len()]), &Default::default())
    }

    fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_scalar()
    }

    fn small_config() -> AttentionQaConfig {
        AttentionQaConfig::new(10, 5, 4, 3)
    }

    #[test]
    fn test_encoding_dim_drops_odd_step() {
        // 5 steps pool into 2 windows of 2 directions × 3 units
        assert_eq!(small_config().encoding_dim(), 12);
    }

    #[test]
    fn test_encoding_shapes() {
        let device = Default::default();
        let model  = small_config().init::<TestBackend>(&device);

        let q = model.encode_question(ids(&[&[1, 2, 3, 0, 0], &[4, 5, 0, 0, 0]]));
        assert_eq!(q.dims(), [2, 12]);

        let a = model.encode_answer(ids(&[&[6, 7, 8, 9, 0], &[1, 0, 0, 0, 0]]), q);
        assert_eq!(a.dims(), [2, 12]);
    }

    #[test]
    fn test_forward_loss_is_scalar_and_non_negative() {
        let device = Default::default();
        let model  = small_config().init::<TestBackend>(&device);

        let (loss, output) = model.forward_loss(
            ids(&[&[1, 2, 3, 0, 0]]),
            ids(&[&[4, 5, 0, 0, 0]]),
            ids(&[&[6, 7, 8, 0, 0]]),
        );
        assert_eq!(output.good_scores.dims(), [1]);
        assert!(scalar(loss) >= 0.0);
    }

    #[test]
    fn test_scores_are_cosines() {
        let device = Default::default();
        let model  = small_config().init::<TestBackend>(&device);

        let scores: Vec<f32> = model
            .score(ids(&[&[1, 2, 0, 0, 0], &[3, 0, 0, 0, 0]]), ids(&[&[4, 5, 6, 0, 0], &[7, 8, 0, 0, 0]]))
            .into_data()
            .to_vec()
            .unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores.iter().all(|s| (-1.0001..=1.0001).contains(s)));
    }

    #[test]
    fn test_pretrained_embeddings_are_loaded() {
        let device = Default::default();
        let config = AttentionQaConfig::new(3, 2, 2, 2);
        let matrix = EmbeddingMatrix { rows: 3, dim: 2, values: vec![0.0, 0.0, 1.0, 2.0, 3.0, 4.0] };

        let model = config.init_with_embeddings::<TestBackend>(&matrix, &device).unwrap();
        let weights: Vec<f32> = model.embedding.weight.val().into_data().to_vec().unwrap();
        assert_eq!(weights, matrix.values);
    }

    #[test]
    fn test_pretrained_embeddings_shape_mismatch() {
        let device = Default::default();
        let config = AttentionQaConfig::new(4, 2, 2, 2);
        let matrix = EmbeddingMatrix { rows: 3, dim: 2, values: vec![0.0; 6] };
        assert!(config.init_with_embeddings::<TestBackend>(&matrix, &device).is_err());
    }

    #[test]
    fn test_pool_pairs_takes_window_max() {
        let device = Default::default();
        // [1, 3, 2]: steps (1, 2) then (3, 4), odd step 5 dropped
        let x = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(vec![1.0f32, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0, 5.0, 50.0], [1, 5, 2]),
            &device,
        );
        let pooled: Vec<f32> = pool_pairs(x).into_data().to_vec().unwrap();
        assert_eq!(pooled, vec![2.0, 20.0, 4.0, 40.0]);
    }

    #[test]
    fn test_identical_vectors_have_cosine_one() {
        let device = Default::default();
        let a = Tensor::<TestBackend, 2>::from_data(TensorData::new(vec![1.0f32, 2.0, 3.0], [1, 3]), &device);
        let cos = scalar(cosine_similarity(a.clone(), a));
        assert!((cos - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_vector_has_cosine_zero() {
        let device = Default::default();
        let a = Tensor::<TestBackend, 2>::zeros([1, 3], &device);
        let b = Tensor::<TestBackend, 2>::ones([1, 3], &device);
        assert_eq!(scalar(cosine_similarity(a, b)), 0.0);
    }

    #[test]
    fn test_hinge_loss_values() {
        // max(0, 0.2 - 1 + 0) = 0, max(0, 0.2 - 0 + 0.5) = 0.7 → mean 0.35
        let loss = scalar(hinge_loss(floats(&[1.0, 0.0]), floats(&[0.0, 0.5]), 0.2));
        assert!((loss - 0.35).abs() < 1e-6);
    }

    #[test]
    fn test_hinge_loss_zero_when_margin_met() {
        let loss = scalar(hinge_loss(floats(&[0.9]), floats(&[0.1]), 0.2));
        assert_eq!(loss, 0.0);
    }
}
