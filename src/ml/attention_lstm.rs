// ============================================================
// Layer 5 — Attention-Gated LSTM
// ============================================================
// An LSTM whose hidden state is re-weighted at every step by how
// well it matches an external "attention" vector, here the pooled
// question representation.
//
// Per timestep, with q = W_m · question + b_m computed once:
//
//   i, f, g, o = split(W · x_t + U · h_{t-1} + b)
//   c_t  = σ(f) ⊙ c_{t-1} + σ(i) ⊙ tanh(g)
//   h'   = σ(o) ⊙ tanh(c_t)
//   m    = tanh((U_a · h') ⊙ q + b_a)
//   s    = σ(U_s · m + b_s)
//   h_t  = h' ⊙ s
//
// The gated h_t is both the emitted output and the recurrent state.
// With `reverse` set the sequence is consumed back to front and the
// outputs stay in that reversed order.
//
// Reference: Tan et al. (2016) "Improved Representation Learning
//            for Question Answer Matching"

use burn::{
    module::Param,
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::sigmoid,
};

#[derive(Config, Debug)]
pub struct AttentionLstmConfig {
    pub d_input:     usize,
    pub d_hidden:    usize,
    /// Width of the attention vector passed to `forward`
    pub d_attention: usize,
    #[config(default = false)]
    pub reverse:     bool,
}

impl AttentionLstmConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> AttentionLstm<B> {
        let h = self.d_hidden;
        AttentionLstm {
            input_gates:      LinearConfig::new(self.d_input, 4 * h).init(device),
            hidden_gates:     LinearConfig::new(h, 4 * h).with_bias(false).init(device),
            attention_proj:   LinearConfig::new(self.d_attention, h).init(device),
            hidden_attention: LinearConfig::new(h, h).with_bias(false).init(device),
            attention_bias:   Param::from_tensor(Tensor::zeros([h], device)),
            attention_score:  LinearConfig::new(h, h).init(device),
            d_hidden:         h,
            reverse:          self.reverse,
        }
    }
}

#[derive(Module, Debug)]
pub struct AttentionLstm<B: Backend> {
    /// W, b: input → 4 gates
    pub input_gates:      Linear<B>,
    /// U: previous hidden → 4 gates
    pub hidden_gates:     Linear<B>,
    /// W_m, b_m
    pub attention_proj:   Linear<B>,
    /// U_a
    pub hidden_attention: Linear<B>,
    /// b_a
    pub attention_bias:   Param<Tensor<B, 1>>,
    /// U_s, b_s
    pub attention_score:  Linear<B>,
    pub d_hidden:         usize,
    pub reverse:          bool,
}

impl<B: Backend> AttentionLstm<B> {
    /// x: [batch, seq_len, d_input], attention: [batch, d_attention]
    /// → [batch, seq_len, d_hidden]
    pub fn forward(&self, x: Tensor<B, 3>, attention: Tensor<B, 2>) -> Tensor<B, 3> {
        let [batch, seq_len, _] = x.dims();
        let h_dim  = self.d_hidden;
        let device = x.device();

        let x = if self.reverse { x.flip([1]) } else { x };

        // Input projections for every timestep at once
        let x_gates = self.input_gates.forward(x); // [batch, seq_len, 4h]
        let q       = self.attention_proj.forward(attention);
        let b_a     = self.attention_bias.val().unsqueeze::<2>();

        let mut h = Tensor::<B, 2>::zeros([batch, h_dim], &device);
        let mut c = Tensor::<B, 2>::zeros([batch, h_dim], &device);
        let mut outputs = Vec::with_capacity(seq_len);

        for t in 0..seq_len {
            let gates = x_gates
                .clone()
                .slice([0..batch, t..t + 1, 0..4 * h_dim])
                .reshape([batch, 4 * h_dim])
                + self.hidden_gates.forward(h);
            let gate = |k: usize| gates.clone().slice([0..batch, k * h_dim..(k + 1) * h_dim]);

            let i = sigmoid(gate(0));
            let f = sigmoid(gate(1));
            let g = gate(2).tanh();
            let o = sigmoid(gate(3));

            c = f * c + i * g;
            let h_lstm = o * c.clone().tanh();

            let m = (self.hidden_attention.forward(h_lstm.clone()) * q.clone() + b_a.clone()).tanh();
            let s = sigmoid(self.attention_score.forward(m));
            h = h_lstm * s;

            outputs.push(h.clone().reshape([batch, 1, h_dim]));
        }

        Tensor::cat(outputs, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_output_shape() {
        let device = Default::default();
        let lstm = AttentionLstmConfig::new(4, 3, 6).init::<TestBackend>(&device);

        let x   = Tensor::<TestBackend, 3>::ones([2, 5, 4], &device);
        let att = Tensor::<TestBackend, 2>::ones([2, 6], &device);
        assert_eq!(lstm.forward(x, att).dims(), [2, 5, 3]);
    }

    #[test]
    fn test_gated_outputs_are_bounded() {
        // |h'| < 1 and s ∈ (0, 1), so every output lies in (-1, 1)
        let device = Default::default();
        let lstm = AttentionLstmConfig::new(3, 4, 2)
            .with_reverse(true)
            .init::<TestBackend>(&device);

        let x   = Tensor::<TestBackend, 3>::random([3, 6, 3], burn::tensor::Distribution::Default, &device);
        let att = Tensor::<TestBackend, 2>::random([3, 2], burn::tensor::Distribution::Default, &device);
        let out: Vec<f32> = lstm.forward(x, att).into_data().to_vec().unwrap();
        assert!(out.iter().all(|v| v.abs() < 1.0));
    }
}
