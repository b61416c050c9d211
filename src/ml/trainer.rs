// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop over ranking triples using Burn's
// DataLoader and RMSProp.
//
// Key Burn points:
//   - Training runs on an AutodiffBackend (Autodiff<Wgpu> in the CLI)
//   - model.valid() returns the model on the inner backend
//   - the validation batcher must use that inner backend too
//   - val accuracy counts triples with cos(q, a⁺) > cos(q, a⁻)
//
// Every epoch writes a checkpoint and one metrics.csv row.
//
// Reference: Burn Book §5, Tieleman & Hinton (2012) RMSProp

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer, RmsPropConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::TripleBatcher, dataset::TripleDataset};
use crate::infra::{
    checkpoint::CheckpointManager,
    embeddings::EmbeddingMatrix,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::model::{AttentionQaModel, RankingOutput};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Builds the model on the default WGPU device and trains it.
pub fn run_training(
    cfg:           &TrainConfig,
    embeddings:    Option<&EmbeddingMatrix>,
    train_dataset: TripleDataset,
    val_dataset:   TripleDataset,
    ckpt_manager:  &CheckpointManager,
) -> Result<()> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);

    let model_cfg = cfg.model_config();
    let model: AttentionQaModel<MyBackend> = match embeddings {
        Some(matrix) => model_cfg.init_with_embeddings(matrix, &device)?,
        None         => model_cfg.init(&device),
    };
    tracing::info!(
        "Model ready: vocab={}, embed_dim={}, hidden_dim={}, max_len={}",
        cfg.vocab_size, cfg.embed_dim, cfg.hidden_dim, cfg.max_len,
    );

    train_loop(cfg, model, train_dataset, val_dataset, ckpt_manager, device)?;
    Ok(())
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    mut model:     AttentionQaModel<B>,
    train_dataset: TripleDataset,
    val_dataset:   TripleDataset,
    ckpt_manager:  &CheckpointManager,
    device:        B::Device,
) -> Result<AttentionQaModel<B>> {
    let metrics = MetricsLogger::new(ckpt_manager.dir())?;

    // ── RMSProp optimiser ─────────────────────────────────────────────────────
    // v = α*v + (1-α)*g²
    // θ = θ - lr * g / (√v + ε)
    let optim_cfg = RmsPropConfig::new()
        .with_alpha(0.9)
        .with_epsilon(1e-8)
        .with_momentum(0.0);
    let mut optim = optim_cfg.init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_batcher = TripleBatcher::<B>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend, no autodiff overhead) ───────────
    let val_batcher = TripleBatcher::<B::InnerBackend>::new(device.clone());
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(
                batch.questions,
                batch.good_answers,
                batch.bad_answers,
            );

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut val_loss_sum  = 0.0f64;
        let mut val_batches   = 0usize;
        let mut correct       = 0usize;
        let mut total_samples = 0usize;

        for batch in val_loader.iter() {
            total_samples += batch.questions.dims()[0];

            let (loss, output) = model_valid.forward_loss(
                batch.questions,
                batch.good_answers,
                batch.bad_answers,
            );
            val_loss_sum += loss.into_scalar().elem::<f64>();
            val_batches  += 1;
            correct      += count_ranked_correctly(output);
        }

        let avg_val_loss = if val_batches   > 0 { val_loss_sum / val_batches as f64 } else { f64::NAN };
        let val_accuracy = if total_samples > 0 { correct as f64 / total_samples as f64 } else { 0.0 };

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.1}%",
            epoch, cfg.epochs, avg_train_loss, avg_val_loss, val_accuracy * 100.0,
        );

        metrics.log(&EpochMetrics::new(epoch, avg_train_loss, avg_val_loss, val_accuracy))?;
        ckpt_manager.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    tracing::info!("Training complete!");
    Ok(model)
}

/// Triples whose good answer strictly outscored the bad one.
fn count_ranked_correctly<B: Backend>(output: RankingOutput<B>) -> usize {
    output
        .good_scores
        .greater(output.bad_scores)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}
