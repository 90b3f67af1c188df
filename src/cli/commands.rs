use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `roundtable` - refine a question, debate it with three models, summarize.
#[derive(Parser, Debug)]
#[command(name = "roundtable")]
#[command(version)]
#[command(about = "Multi-model debate pipeline over OpenRouter.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.roundtable/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Invoke a single role once
    Role {
        /// refiner, debater_a, debater_b, debater_c or summarizer
        role: String,

        /// User prompt
        #[arg(short, long)]
        prompt: String,

        /// Explicit model (disables pool fallback unless --fallback is given)
        #[arg(short, long)]
        model: Option<String>,

        /// Allow pool fallback even with an explicit model
        #[arg(long, conflicts_with = "no_fallback")]
        fallback: bool,

        /// Never fall back to other pool models
        #[arg(long)]
        no_fallback: bool,

        /// System prompt
        #[arg(short, long)]
        system: Option<String>,

        /// Temperature (0.0 - 2.0)
        #[arg(short, long)]
        temperature: Option<f64>,

        /// Completion budget, still bounded by the configured cap
        #[arg(long)]
        max_tokens: Option<u32>,
    },

    /// Run refiner, debate rounds and summary end to end
    Debate {
        /// Raw request to refine and debate
        #[arg(short, long)]
        prompt: String,

        /// Extra context for round 2 and the summary
        #[arg(short, long)]
        addendum: Option<String>,

        /// Summarize after round 1
        #[arg(long)]
        skip_round2: bool,

        /// Use the prompt as-is instead of refining it
        #[arg(long)]
        no_refine: bool,

        /// Write the session transcript as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the model pool and what each role resolves to
    Models,
}
