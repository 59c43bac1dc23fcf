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

use std::fs::File;
use std::io::{stdout, BufReader};
use std::path::Path;
use thiserror::Error;
use ldagibbs_toolkit::fs::write_atomically;
use ldagibbs_topicmodel::config::{AlphaPrior, ConfigError, GibbsConfig, InferenceInit};
use ldagibbs_topicmodel::corpus::{Corpus, CorpusReadError};
use ldagibbs_topicmodel::enums::{ReadError, WriteError};
use ldagibbs_topicmodel::model::{Checkpoints, GibbsTopicModel, ModelError};
use ldagibbs_topicmodel::prototypes::{read_prototypes, PrototypeReadError};
use crate::cli::{InferArgs, TopicsArgs, TrainArgs};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Corpus(#[from] CorpusReadError),
    #[error(transparent)]
    Prototypes(#[from] PrototypeReadError),
    #[error("Failed to read the config: {0}")]
    ConfigFile(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// The config file (or the default config) with the flags applied.
pub fn build_config(args: &TrainArgs) -> Result<GibbsConfig, CommandError> {
    let mut config: GibbsConfig = match &args.config {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => GibbsConfig::default()
    };
    if let Some(kind) = args.kind {
        config.kind = kind;
    }
    if let Some(alpha) = args.alpha {
        config.alpha = AlphaPrior::Symmetric(alpha);
    }
    if let Some(alpha_sum) = args.alpha_sum {
        config.alpha = AlphaPrior::Sum(alpha_sum);
    }
    if let Some(beta) = args.beta {
        config.beta = beta;
    }
    if let Some(gamma) = args.gamma {
        config.gamma = gamma;
    }
    if let Some(topics) = args.topics {
        config.num_topics = topics;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(path) = &args.prototypes {
        config.prototypes = read_prototypes(path)?;
    }
    config.validate()?;
    Ok(config)
}

fn write_distributions(model: &GibbsTopicModel, corpus: &Corpus, path: &Path) -> Result<(), CommandError> {
    write_atomically(path, |out| model.write_topic_distributions(out, corpus))?;
    log::info!("Wrote the topic distributions to {}", path.display());
    Ok(())
}

pub fn train(args: &TrainArgs) -> Result<(), CommandError> {
    let config = build_config(args)?;
    let mut corpus = Corpus::read_file(&args.file)?;
    let mut model = GibbsTopicModel::new(config)?;
    match &args.checkpoint {
        Some(path) => {
            let checkpoints = Checkpoints::new(args.checkpoint_every, path);
            model.train_with_checkpoints(args.iterations, &mut corpus, &checkpoints)?
        }
        None => model.train(args.iterations, &mut corpus)?
    }
    model.write(&args.model)?;
    if let Some(path) = &args.distributions {
        write_distributions(&model, &corpus, path)?;
    }
    if let Some(path) = &args.topic_words {
        write_atomically(path, |out| model.write_topic_words(out, args.top_words))?;
    }
    Ok(())
}

pub fn infer(args: &InferArgs) -> Result<(), CommandError> {
    let mut model = GibbsTopicModel::read(&args.model)?;
    if args.point_estimate {
        model.set_inference_init(InferenceInit::PointEstimate);
    }
    let mut corpus = model.new_corpus();
    corpus.read_file_into(&args.file)?;
    let alpha = args.alpha.map(AlphaPrior::Symmetric);
    model.infer_with(args.iterations, &mut corpus, alpha.as_ref())?;
    match &args.distributions {
        Some(path) => write_distributions(&model, &corpus, path),
        None => Ok(model.write_topic_distributions(&mut stdout().lock(), &corpus)?),
    }
}

pub fn topics(args: &TopicsArgs) -> Result<(), CommandError> {
    let model = GibbsTopicModel::read(&args.model)?;
    model.write_topic_words(&mut stdout().lock(), args.top_words)?;
    Ok(())
}
