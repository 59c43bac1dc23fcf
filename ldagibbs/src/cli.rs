//Copyright 2024 Felix Engl
//
//Licensed under the Apache License, Version 2.0 (the "License");
//you may not use this file except in compliance with the License.
//You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
//Unless required by applicable law or agreed to in writing, software
//distributed under the License is distributed on an "AS IS" BASIS,
//WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//See the License for the specific language governing permissions and
//limitations under the License.

use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};
use ldagibbs_topicmodel::config::ModelKind;
use log::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "ldagibbs")]
#[command(about = "Collapsed Gibbs sampling for labeled, document typed and prototype seeded topic models.")]
#[command(version)]
pub struct Cli {
    /// The level of detail in logging events (1 = warn, 2 = info, 3 = debug, 4 = trace).
    #[arg(long, global = true, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub logging: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn level_filter(&self) -> LevelFilter {
        match self.logging {
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Train a model on a tab separated corpus.
    Train(TrainArgs),
    /// Infer the topics of unseen documents with a trained model.
    Infer(InferArgs),
    /// Show the most frequent words of every topic.
    Topics(TopicsArgs),
}

#[derive(Debug, Args)]
pub struct TrainArgs {
    /// The file with the training documents.
    #[arg(short, long)]
    pub file: PathBuf,
    /// Where to write the trained model, a `.gz` suffix compresses it.
    #[arg(short, long)]
    pub model: PathBuf,
    /// The number of sampling iterations.
    #[arg(short, long)]
    pub iterations: usize,
    /// The model variant, defaults to the config file or `labeled`.
    #[arg(long)]
    pub kind: Option<ModelKind>,
    /// Alpha parameter: smoothing over the topics of a document.
    #[arg(long)]
    pub alpha: Option<f64>,
    /// The sum of alpha over all topics, replaces `--alpha`.
    #[arg(long, conflicts_with = "alpha")]
    pub alpha_sum: Option<f64>,
    /// Beta parameter: smoothing over the unigram distribution.
    #[arg(long)]
    pub beta: Option<f64>,
    /// Gamma parameter: smoothing over the type distribution.
    #[arg(long)]
    pub gamma: Option<f64>,
    /// The number of (regular) topics of the unsupervised kinds.
    #[arg(long)]
    pub topics: Option<usize>,
    /// A file with one prototype topic and its words per line.
    #[arg(long)]
    pub prototypes: Option<PathBuf>,
    #[arg(long)]
    pub seed: Option<u64>,
    /// A json file with a model config, the other flags override it.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Where to write the topic distributions of the training documents.
    #[arg(long)]
    pub distributions: Option<PathBuf>,
    /// Where to write the most frequent words of every topic.
    #[arg(long)]
    pub topic_words: Option<PathBuf>,
    #[arg(long, default_value_t = 20)]
    pub top_words: usize,
    /// Save the intermediate model to this file while training.
    #[arg(long, visible_alias = "intermediate-results")]
    pub checkpoint: Option<PathBuf>,
    /// The number of iterations between two intermediate models.
    #[arg(long, default_value_t = 100)]
    pub checkpoint_every: usize,
}

#[derive(Debug, Args)]
pub struct InferArgs {
    /// The file with the unseen documents.
    #[arg(short, long)]
    pub file: PathBuf,
    /// The trained model.
    #[arg(short, long)]
    pub model: PathBuf,
    /// The number of sampling iterations per document.
    #[arg(short, long)]
    pub iterations: usize,
    /// Where to write the topic distributions, stdout if missing.
    #[arg(long)]
    pub distributions: Option<PathBuf>,
    /// Start with the most frequent topic of every word instead of a random one.
    #[arg(long)]
    pub point_estimate: bool,
    /// Replaces the trained alpha for the unseen documents.
    #[arg(long)]
    pub alpha: Option<f64>,
}

#[derive(Debug, Args)]
pub struct TopicsArgs {
    /// The trained model.
    #[arg(short, long)]
    pub model: PathBuf,
    #[arg(long, default_value_t = 20)]
    pub top_words: usize,
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;
    use clap::Parser;
    use log::LevelFilter;
    use ldagibbs_topicmodel::config::ModelKind;
    use crate::cli::{Cli, Commands};

    #[test]
    fn parses_a_training_call(){
        let cli = Cli::try_parse_from([
            "ldagibbs", "train", "-f", "corpus.tsv", "-m", "model.bin", "-i", "100",
            "--kind", "Typed", "--beta", "0.05", "--logging", "3",
        ]).unwrap();
        assert_eq!(LevelFilter::Debug, cli.level_filter());
        let Commands::Train(args) = cli.command else { panic!("Expected the train command!") };
        assert_eq!(Some(ModelKind::Typed), args.kind);
        assert_eq!(Some(0.05), args.beta);
        assert_eq!(100, args.iterations);
        assert_eq!(20, args.top_words);
        assert_eq!(None, args.checkpoint);
    }

    #[test]
    fn parses_checkpoints(){
        let cli = Cli::try_parse_from([
            "ldagibbs", "train", "-f", "corpus.tsv", "-m", "model.bin", "-i", "500",
            "--intermediate-results", "partial.bin.gz",
        ]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("Expected the train command!") };
        assert_eq!(Some(PathBuf::from("partial.bin.gz")), args.checkpoint);
        assert_eq!(100, args.checkpoint_every);
    }

    #[test]
    fn rejects_bad_levels_and_kinds(){
        assert!(Cli::try_parse_from(["ldagibbs", "topics", "-m", "m.bin", "--logging", "5"]).is_err());
        assert!(Cli::try_parse_from(["ldagibbs", "train", "-f", "c", "-m", "m", "-i", "1", "--kind", "hdp"]).is_err());
        assert!(Cli::try_parse_from(["ldagibbs", "train", "-f", "c", "-m", "m", "-i", "1", "--alpha", "1", "--alpha-sum", "2"]).is_err());
    }
}
