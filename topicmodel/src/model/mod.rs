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

//! The model driver: trains on a corpus, infers unseen documents and owns
//! everything that has to be persisted.

mod report;
mod persist;

pub use report::*;
pub use persist::*;

use std::borrow::Borrow;
use std::collections::HashSet;
use std::hash::Hash;
use std::path::PathBuf;
use thiserror::Error;
use crate::config::{regular_topic_label, AlphaPrior, ConfigError, GibbsConfig, InferenceInit, ModelKind};
use crate::corpus::Corpus;
use crate::counts::{CountError, CountModel};
use crate::enums::WriteError;
use crate::model::persist::Checkpoint;
use crate::random::{RandomState, Randoms};
use crate::sampler::{InferSampler, LearnSampler, Sampler, SamplingError};
use crate::smoothing::{Priors, Smoothing};
use crate::vocabulary::{BasicVocabulary, SearchableVocabulary, StringVocabulary, VocabularyError, VocabularyMut};
use crate::{TopicId, TypeId, WordId};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("The model is already trained, reset it before training again!")]
    AlreadyTrained,
    #[error("The model has to be trained or loaded before inference!")]
    NotTrained,
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
    #[error("The corpus does not share the word index of the model, the first difference is at the word id {word}!")]
    IndexMismatch {
        word: WordId
    },
    #[error(transparent)]
    OutOfRange(#[from] VocabularyError),
    #[error(transparent)]
    Counts(#[from] CountError),
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("Failed to write a checkpoint: {0}")]
    Checkpoint(#[from] WriteError),
}

/// Where and how often a running training saves its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoints {
    /// Save after every `every` iterations.
    pub every: usize,
    /// The file is replaced by every checkpoint.
    pub path: PathBuf,
}

impl Checkpoints {
    pub fn new(every: usize, path: impl Into<PathBuf>) -> Self {
        Self { every, path: path.into() }
    }

    fn is_due(&self, iteration: usize) -> bool {
        (iteration + 1) % self.every == 0
    }
}

/// A topic model fitted by collapsed Gibbs sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct GibbsTopicModel {
    config: GibbsConfig,
    priors: Option<Priors>,
    num_regular_topics: usize,
    topic_index: StringVocabulary,
    type_index: StringVocabulary,
    word_index: StringVocabulary,
    counts: CountModel,
    random: Randoms,
    trained: bool,
}

impl GibbsTopicModel {
    /// Creates an untrained model, fails if the config is invalid.
    pub fn new(config: GibbsConfig) -> Result<Self, ModelError> {
        config.validate()?;
        let random = Randoms::new(config.seed);
        Ok(
            Self {
                config,
                priors: None,
                num_regular_topics: 0,
                topic_index: StringVocabulary::new(),
                type_index: StringVocabulary::new(),
                word_index: StringVocabulary::new(),
                counts: CountModel::new(0, 0, 0),
                random,
                trained: false,
            }
        )
    }

    pub fn config(&self) -> &GibbsConfig {
        &self.config
    }

    pub fn kind(&self) -> ModelKind {
        self.config.kind
    }

    /// Changes how unseen documents are initialized, e.g. after loading a model.
    pub fn set_inference_init(&mut self, init: InferenceInit) {
        self.config.inference_init = init;
    }

    /// The priors, known after training or loading.
    pub fn priors(&self) -> Option<&Priors> {
        self.priors.as_ref()
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub fn num_topics(&self) -> usize {
        self.counts.num_topics()
    }

    /// The number of topics without a prototype.
    pub fn num_regular_topics(&self) -> usize {
        self.num_regular_topics
    }

    pub fn num_words(&self) -> usize {
        self.counts.num_words()
    }

    pub fn num_types(&self) -> usize {
        self.counts.num_types()
    }

    pub fn counts(&self) -> &CountModel {
        &self.counts
    }

    pub fn topic_index(&self) -> &StringVocabulary {
        &self.topic_index
    }

    pub fn type_index(&self) -> &StringVocabulary {
        &self.type_index
    }

    pub fn word_index(&self) -> &StringVocabulary {
        &self.word_index
    }

    pub fn random_state(&self) -> RandomState {
        self.random.state()
    }

    delegate::delegate! {
        to self.word_index {
            #[call(get_id)]
            pub fn word_id<Q: ?Sized>(&self, word: &Q) -> Option<WordId> where String: Borrow<Q>, Q: Hash + Eq;
            #[call(get_item)]
            pub fn word(&self, id: WordId) -> Result<&String, VocabularyError>;
        }
        to self.topic_index {
            #[call(get_id)]
            pub fn topic_id<Q: ?Sized>(&self, topic: &Q) -> Option<TopicId> where String: Borrow<Q>, Q: Hash + Eq;
            #[call(get_item)]
            pub fn topic_label(&self, id: TopicId) -> Result<&String, VocabularyError>;
        }
        to self.type_index {
            #[call(get_item)]
            pub fn type_label(&self, id: TypeId) -> Result<&String, VocabularyError>;
        }
    }

    /// An empty corpus sharing the indexes of this model, documents added
    /// to it can be used for inference.
    pub fn new_corpus(&self) -> Corpus {
        Corpus::with_indexes(self.word_index.clone(), self.topic_index.clone(), self.type_index.clone())
    }

    /// Forgets everything learned, the config is kept and the random
    /// stream starts again from the seed.
    pub fn reset(&mut self) {
        self.priors = None;
        self.num_regular_topics = 0;
        self.topic_index = StringVocabulary::new();
        self.type_index = StringVocabulary::new();
        self.word_index = StringVocabulary::new();
        self.counts = CountModel::new(0, 0, 0);
        self.random = Randoms::new(self.config.seed);
        self.trained = false;
    }

    /// Builds the topic index of a `kind` model for `corpus`.
    fn topic_index_for(&self, corpus: &Corpus) -> (StringVocabulary, usize) {
        if self.config.kind.is_supervised() {
            return (corpus.label_index().clone(), 0)
        }
        let regular = self.config.num_topics;
        let mut index: StringVocabulary = (0..regular).map(regular_topic_label).collect();
        if self.config.kind == ModelKind::Prototype {
            for name in self.config.prototypes.keys() {
                index.add_value(name.clone());
            }
        }
        (index, regular)
    }

    /// Resolves the priors for the given dimensions.
    fn build_priors(&self, num_topics: usize, num_types: usize, word_index: &StringVocabulary) -> Result<Priors, ModelError> {
        let (alpha, alpha_sum) = self.config.alpha.resolve(num_topics)?;
        let beta = self.config.beta;
        let gamma = self.config.gamma;
        let num_words = word_index.len();
        let (beta, beta_sum) = match self.config.kind {
            ModelKind::Prototype => {
                let mut matrix = vec![vec![beta; num_words]; num_topics];
                let mut seed_words = HashSet::new();
                let first_prototype = num_topics - self.config.prototypes.len();
                for (offset, words) in self.config.prototypes.values().enumerate() {
                    let topic = first_prototype + offset;
                    for word in words {
                        let Some(word_id) = word_index.get_id(word.as_str()) else {
                            log::warn!("The prototype word {word} is not in the word index.");
                            continue;
                        };
                        matrix[topic][word_id] = beta + gamma;
                        seed_words.insert(word_id);
                    }
                }
                let beta_sum = beta * num_words as f64 + gamma * seed_words.len() as f64;
                (Smoothing::PerTopicWord(matrix), beta_sum)
            }
            _ => (Smoothing::Symmetric(beta), beta * num_words as f64)
        };
        Ok(
            Priors {
                alpha,
                alpha_sum,
                beta,
                beta_sum,
                gamma,
                gamma_sum: gamma * num_types as f64,
            }
        )
    }

    /// Trains the model on `corpus` with `iterations` sweeps.
    ///
    /// Every document gets random first assignments from its candidates. Fails
    /// with [ModelError::AlreadyTrained] if the model was not reset after a
    /// previous training. Nothing of the model is changed if training fails.
    pub fn train(&mut self, iterations: usize, corpus: &mut Corpus) -> Result<(), ModelError> {
        self.train_impl(iterations, corpus, None)
    }

    /// Like [GibbsTopicModel::train], but saves the state after every
    /// `checkpoints.every` iterations. A checkpoint reads back as a trained model.
    pub fn train_with_checkpoints(&mut self, iterations: usize, corpus: &mut Corpus, checkpoints: &Checkpoints) -> Result<(), ModelError> {
        self.train_impl(iterations, corpus, Some(checkpoints))
    }

    fn train_impl(&mut self, iterations: usize, corpus: &mut Corpus, checkpoints: Option<&Checkpoints>) -> Result<(), ModelError> {
        if self.trained {
            return Err(ModelError::AlreadyTrained)
        }
        self.config.validate()?;
        if checkpoints.is_some_and(|checkpoints| checkpoints.every == 0) {
            return Err(ConfigError::ZeroCheckpointInterval.into())
        }
        let kind = self.config.kind;
        if kind == ModelKind::Prototype {
            let word_index = corpus.word_index_mut();
            for word in self.config.prototypes.values().flatten() {
                word_index.add_value(word.clone());
            }
        }
        let (topic_index, num_regular_topics) = self.topic_index_for(corpus);
        let num_topics = topic_index.len();
        if num_topics == 0 {
            return Err(ConfigError::NoTopics.into())
        }
        let num_types = if kind.has_types() { corpus.num_types() } else { 0 };
        if let Some(document) = corpus
            .iter()
            .find(|document| LearnSampler::candidates_for(kind, num_topics, document).is_empty())
        {
            return Err(SamplingError::EmptyCandidateSet { document: document.source().to_string() }.into())
        }
        let priors = self.build_priors(num_topics, num_types, corpus.word_index())?;
        let mut counts = CountModel::new(num_topics, corpus.num_words(), num_types);
        let mut random = self.random.clone();

        log::info!(
            "Training a {kind} model with {num_topics} topics, {} words and {num_types} types on {} documents.",
            counts.num_words(),
            corpus.len()
        );
        {
            let mut sampler = LearnSampler::new(kind, &priors, &mut counts, &mut random);
            for document in corpus.iter_mut() {
                document.clear_assignments();
                sampler.add_document(document)?;
            }
        }
        for iteration in 0..iterations {
            log::info!("Sampling iteration {iteration} started.");
            {
                let mut sampler = LearnSampler::new(kind, &priors, &mut counts, &mut random);
                for document in corpus.iter_mut() {
                    sampler.sample_document(document)?;
                }
            }
            debug_assert!(counts.is_consistent(), "The counts drifted in iteration {iteration}!");
            if let Some(checkpoints) = checkpoints.filter(|checkpoints| checkpoints.is_due(iteration)) {
                let checkpoint = Checkpoint {
                    priors: &priors,
                    num_regular_topics,
                    topic_index: &topic_index,
                    type_index: corpus.type_index(),
                    word_index: corpus.word_index(),
                    counts: &counts,
                    random: &random,
                };
                self.write_checkpoint(&checkpoints.path, checkpoint)?;
            }
        }
        log::trace!("Topic counts after training: {:?}", counts.topic_counts());

        self.priors = Some(priors);
        self.num_regular_topics = num_regular_topics;
        self.topic_index = topic_index;
        self.type_index = corpus.type_index().clone();
        self.word_index = corpus.word_index().clone();
        self.counts = counts;
        self.random = random;
        self.trained = true;
        Ok(())
    }

    /// Infers the assignments of the unseen documents in `corpus` with
    /// `iterations` sweeps per document.
    pub fn infer(&mut self, iterations: usize, corpus: &mut Corpus) -> Result<(), ModelError> {
        self.infer_with(iterations, corpus, None)
    }

    /// Like [GibbsTopicModel::infer], but smooths the topics of the unseen
    /// documents with `alpha` instead of the trained alpha if one is given.
    ///
    /// Every document is sampled on its own against the frozen trained counts,
    /// its local counts are removed again before the next document starts.
    pub fn infer_with(&mut self, iterations: usize, corpus: &mut Corpus, alpha: Option<&AlphaPrior>) -> Result<(), ModelError> {
        let trained_priors = match &self.priors {
            Some(priors) if self.trained => priors,
            _ => return Err(ModelError::NotTrained)
        };
        self.check_word_index(corpus.word_index())?;
        let priors = match alpha {
            Some(alpha) => {
                let (alpha, alpha_sum) = alpha.resolve(self.counts.num_topics())?;
                trained_priors.with_alpha(alpha, alpha_sum)
            }
            None => trained_priors.clone()
        };

        let mut local = self.counts.empty_like();
        let mut sampler = InferSampler::new(
            self.config.kind,
            &priors,
            &self.counts,
            &mut local,
            &mut self.random,
            self.config.inference_init,
        );
        for (document_id, document) in corpus.iter_mut().enumerate() {
            log::debug!("Inferring document {document_id} ({}).", document.source());
            document.clear_assignments();
            sampler.add_document(document)?;
            for _ in 0..iterations {
                sampler.sample_document(document)?;
            }
            sampler.retract_document(document)?;
        }
        Ok(())
    }

    /// The known words of `word_index` have to be the words of this model.
    fn check_word_index(&self, word_index: &StringVocabulary) -> Result<(), ModelError> {
        let mismatch = self
            .word_index
            .iter()
            .zip(word_index.iter())
            .position(|(known, other)| known != other);
        match mismatch {
            Some(word) => Err(ModelError::IndexMismatch { word }),
            None if word_index.len() < self.word_index.len() => Err(ModelError::IndexMismatch { word: word_index.len() }),
            None => Ok(())
        }
    }
}
