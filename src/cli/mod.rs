// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
//   1. `train`    — build triples from a corpus and train the ranker
//   2. `evaluate` — accuracy and MRR of a trained checkpoint
//   3. `rank`     — order candidate answers for one question
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, RankArgs, TrainArgs};

use crate::domain::traits::AnswerRanker;

#[derive(Parser, Debug)]
#[command(
    name = "attention-qa",
    version = "0.1.0",
    about = "Train an attention LSTM answer ranker on LiveQA or InsuranceQA, then evaluate or rank answers."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Routes only; never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Rank(args)     => run_rank(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}' ({:?})", args.data_path, args.corpus);
    let checkpoint_dir = args.checkpoint_dir.clone();

    TrainUseCase::new(args.into()).execute()?;

    println!("Training complete. Checkpoints saved to '{checkpoint_dir}'.");
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let report = EvaluateUseCase::new(args.checkpoint_dir, args.split, args.n_eval.0).execute()?;
    println!("{report}");
    Ok(())
}

fn run_rank(args: RankArgs) -> Result<()> {
    use crate::application::rank_use_case::RankUseCase;

    let ranker = RankUseCase::open(&args.checkpoint_dir)?;
    let ranked = ranker.rank(&args.question, &args.answers)?;

    println!("\nQuestion: {}", args.question);
    for (position, (index, score)) in ranked.iter().enumerate() {
        println!("{:>3}. [{:+.4}] {}", position + 1, score, args.answers[*index]);
    }
    Ok(())
}
