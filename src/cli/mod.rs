// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and dispatches to Layer 2.
// This is the only layer that prints results for the user.
//
//   memnet-qa train <train_file> [epochs]
//   memnet-qa eval  <file>
//   memnet-qa ask   --story <file> --question <text>

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{AskArgs, Commands, EvalArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "memnet-qa",
    version,
    about = "Train an end-to-end memory network on bAbI stories, then ask it questions."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Eval(args)  => run_eval(args),
            Commands::Ask(args)   => run_ask(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.train_file);

    let report = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Training complete. Train accuracy {:.1}% ({})",
        report.train.accuracy() * 100.0,
        report.train
    );
    if let Some(test) = report.test {
        println!("Test accuracy {:.1}% ({})", test.accuracy() * 100.0, test);
    }
    Ok(())
}

fn run_eval(args: EvalArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let report = EvaluateUseCase::new(args.checkpoint_dir).execute(&args.file)?;
    println!("{}", report);
    println!("Accuracy {:.1}%, mean loss {:.4}", report.accuracy() * 100.0, report.mean_loss());
    Ok(())
}

fn run_ask(args: AskArgs) -> Result<()> {
    use crate::application::ask_use_case::AskUseCase;

    let use_case = AskUseCase::new(&args.checkpoint_dir)?;
    let (facts, answer) = use_case.answer_file(&args.story, &args.question)?;

    println!("\nAnswer: {} (p={:.3})", answer.word, answer.confidence);

    if !facts.is_empty() {
        println!("\nAttention per hop:");
        for (i, fact) in facts.iter().enumerate() {
            let weights: Vec<String> = answer
                .attention
                .iter()
                .map(|hop| format!("{:.2}", hop[i]))
                .collect();
            println!("  [{}] {}  {}", weights.join(" "), i + 1, fact);
        }

        let last_hop = answer.attention.len().saturating_sub(1);
        if let Some(focus) = answer.focus(last_hop) {
            println!("\nMost attended fact: {}", facts[focus]);
        }
    }
    Ok(())
}
