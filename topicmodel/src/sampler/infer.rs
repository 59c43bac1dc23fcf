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

use ldagibbs_toolkit::id_sorter::first_max_position;
use crate::config::{InferenceInit, ModelKind};
use crate::corpus::Document;
use crate::counts::{CountLayers, CountModel};
use crate::random::Randoms;
use crate::sampler::{all_candidates, Candidate, GibbsContext, Sampler, SamplingError};
use crate::smoothing::Priors;
use crate::{Count, TopicId, TopicTo, TypeId, WordId, WordTo};

/// Samples unseen documents against the frozen counts of a trained model.
///
/// All writes go to a local layer, so the trained counts are never touched.
/// Every token may take every topic (and type).
pub struct InferSampler<'a> {
    context: GibbsContext<'a>,
    candidates: Vec<Candidate>,
    init: InferenceInit,
    best_topic_for_word: WordTo<Option<TopicId>>,
    best_type_for_topic: TopicTo<Option<TypeId>>,
}

impl<'a> InferSampler<'a> {
    /// `local` has to be shaped like `background`.
    pub fn new(
        kind: ModelKind,
        priors: &'a Priors,
        background: &'a CountModel,
        local: &'a mut CountModel,
        randoms: &'a mut Randoms,
        init: InferenceInit,
    ) -> Self {
        let num_types = kind.has_types().then_some(background.num_types());
        let candidates = all_candidates(background.num_topics(), num_types);
        let (best_topic_for_word, best_type_for_topic) = match init {
            InferenceInit::Random => (Vec::new(), Vec::new()),
            InferenceInit::PointEstimate => (
                background
                    .word_topic_counts()
                    .iter()
                    .map(|topics| best_position(topics.iter().copied()))
                    .collect(),
                (0..background.num_topics())
                    .map(|topic| best_position(background.topic_type_counts(topic)))
                    .collect(),
            ),
        };
        Self {
            context: GibbsContext::new(kind, priors, CountLayers::new(Some(background), local), randoms),
            candidates,
            init,
            best_topic_for_word,
            best_type_for_topic,
        }
    }

    /// The most frequent topic of `word` in the trained counts.
    pub fn best_topic_for_word(&self, word: WordId) -> Option<TopicId> {
        self.best_topic_for_word.get(word).copied().flatten()
    }

    /// The most frequent type of `topic` in the trained counts.
    pub fn best_type_for_topic(&self, topic: TopicId) -> Option<TypeId> {
        self.best_type_for_topic.get(topic).copied().flatten()
    }

    /// Removes the local counts of `document`, its assignments are kept.
    pub fn retract_document(&mut self, document: &Document) -> Result<(), SamplingError> {
        self.context.retract(document)
    }

    fn random_candidate(&mut self) -> Candidate {
        let pos = self.context.randoms().next_index(self.candidates.len());
        self.candidates[pos]
    }

    fn point_estimate(&mut self, word: WordId) -> Candidate {
        let typed = self.context.kind().has_types();
        let Some(topic) = self.best_topic_for_word(word) else {
            log::debug!("The word {word} has no trained counts, drawing a random candidate.");
            return self.random_candidate()
        };
        if !typed {
            return (topic, None)
        }
        match self.best_type_for_topic(topic) {
            Some(doc_type) => (topic, Some(doc_type)),
            None => {
                log::debug!("The topic {topic} has no trained type counts, drawing a random type.");
                let num_types = self.context.counts().num_types();
                (topic, Some(self.context.randoms().next_index(num_types)))
            }
        }
    }
}

fn best_position(counts: impl Iterator<Item=Count>) -> Option<usize> {
    let counts: Vec<Count> = counts.collect();
    if counts.iter().all(|&value| value == 0) {
        None
    } else {
        first_max_position(counts)
    }
}

impl Sampler for InferSampler<'_> {
    fn add_document(&mut self, document: &mut Document) -> Result<(), SamplingError> {
        if self.candidates.is_empty() {
            return Err(SamplingError::EmptyCandidateSet { document: document.source().to_string() })
        }
        let num_words = self.context.num_words();
        for position in 0..document.len() {
            let word = document.token(position);
            if word >= num_words {
                continue;
            }
            let candidate = match self.init {
                InferenceInit::Random => self.random_candidate(),
                InferenceInit::PointEstimate => self.point_estimate(word),
            };
            self.context.assign(document, position, candidate)?;
        }
        Ok(())
    }

    fn sample_document(&mut self, document: &mut Document) -> Result<(), SamplingError> {
        let candidates = std::mem::take(&mut self.candidates);
        let result = self.context.sweep(document, &candidates);
        self.candidates = candidates;
        result
    }
}
