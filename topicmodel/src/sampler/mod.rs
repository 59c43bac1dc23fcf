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

//! The collapsed Gibbs samplers.
//!
//! A sampler resamples the tokens of one document at a time. For every
//! token the current assignment is removed from the counts, every candidate
//! is scored, one is drawn and counted again.

mod learn;
mod infer;

pub use learn::LearnSampler;
pub use infer::InferSampler;

use ldagibbs_toolkit::normal_number::IsNormalNumber;
use thiserror::Error;
use crate::config::ModelKind;
use crate::corpus::Document;
use crate::counts::{CountError, CountLayers};
use crate::random::Randoms;
use crate::smoothing::Priors;
use crate::{Count, Position, Probability, TopicId, TopicTo, TypeId, TypeTo, WordId};

/// A topic and, for models with document types, a type.
pub type Candidate = (TopicId, Option<TypeId>);

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("No candidate was sampled for the word {word} from {candidates} candidates with a mass of {mass}!")]
    NoCandidateSampled {
        word: WordId,
        candidates: usize,
        mass: f64,
    },
    #[error("The document {document:?} has no candidates to sample from!")]
    EmptyCandidateSet {
        document: String,
    },
    #[error("The token at position {position} has no assignment!")]
    MissingAssignment {
        position: Position,
    },
    #[error(transparent)]
    Counts(#[from] CountError),
}

/// The capabilities shared by the training and the inference sampler.
pub trait Sampler {
    /// Gives every known token of `document` a first assignment and counts it.
    fn add_document(&mut self, document: &mut Document) -> Result<(), SamplingError>;

    /// Resamples every known token of `document` once.
    fn sample_document(&mut self, document: &mut Document) -> Result<(), SamplingError>;
}

/// Draws the position of a candidate from unnormalized `scores` summing up to `mass`.
///
/// The walk subtracts the scores in order from `uniform * mass` and stops at the
/// first candidate where nothing positive remains. Returns `None` if the mass is not
/// a positive number or the walk runs out of candidates.
pub fn draw_index(scores: &[Probability], mass: Probability, uniform: f64) -> Option<usize> {
    if !mass.is_positive_mass() {
        return None
    }
    let target = uniform * mass;
    let mut covered = 0.0;
    for (pos, score) in scores.iter().enumerate() {
        covered += *score;
        if target <= covered {
            return Some(pos)
        }
    }
    None
}

/// The counts of the topics and types assigned inside of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTally {
    topics: TopicTo<Count>,
    types: TypeTo<Count>,
}

impl DocumentTally {
    /// Counts the assignments of all tokens below `num_words`.
    pub fn of(document: &Document, num_topics: usize, num_types: usize, num_words: usize) -> Self {
        let mut tally = Self { topics: vec![0; num_topics], types: vec![0; num_types] };
        for position in document.known_positions(num_words) {
            if let Some(topic) = document.topic(position) {
                tally.topics[topic] += 1;
            }
            if let Some(doc_type) = document.doc_type(position) {
                tally.types[doc_type] += 1;
            }
        }
        tally
    }

    pub fn topic(&self, topic: TopicId) -> Count {
        self.topics[topic]
    }

    pub fn doc_type(&self, doc_type: TypeId) -> Count {
        self.types[doc_type]
    }

    fn add(&mut self, topic: TopicId, doc_type: Option<TypeId>) {
        self.topics[topic] += 1;
        if let Some(doc_type) = doc_type {
            self.types[doc_type] += 1;
        }
    }

    fn remove(&mut self, topic: TopicId, doc_type: Option<TypeId>) {
        self.topics[topic] -= 1;
        if let Some(doc_type) = doc_type {
            self.types[doc_type] -= 1;
        }
    }
}

/// The state every sampler works on: the priors, the count layers and the random source.
pub struct GibbsContext<'a> {
    kind: ModelKind,
    priors: &'a Priors,
    counts: CountLayers<'a>,
    randoms: &'a mut Randoms,
    scores: Vec<Probability>,
}

impl<'a> GibbsContext<'a> {
    pub fn new(kind: ModelKind, priors: &'a Priors, counts: CountLayers<'a>, randoms: &'a mut Randoms) -> Self {
        Self {
            kind,
            priors,
            counts,
            randoms,
            scores: Vec::new(),
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn counts(&self) -> &CountLayers<'a> {
        &self.counts
    }

    pub fn randoms(&mut self) -> &mut Randoms {
        &mut *self.randoms
    }

    pub fn num_words(&self) -> usize {
        self.counts.num_words()
    }

    /// The unnormalized probability of assigning `candidate` to `word`.
    pub fn score(&self, word: WordId, (topic, doc_type): Candidate, tally: &DocumentTally) -> Probability {
        let priors = self.priors;
        let word_given_topic = (priors.beta(topic, word) + self.counts.word_topic_count(word, topic) as f64)
            / (priors.beta_sum + self.counts.topic_count(topic) as f64);
        match doc_type {
            None => (priors.alpha(topic) + tally.topic(topic) as f64) * word_given_topic,
            Some(doc_type) => {
                let type_given_document = priors.gamma + tally.doc_type(doc_type) as f64;
                let topic_given_type = (priors.gamma + self.counts.type_topic_count(doc_type, topic) as f64)
                    / (priors.gamma_sum + self.counts.type_count(doc_type) as f64);
                type_given_document * word_given_topic * topic_given_type
            }
        }
    }

    /// Scores all `candidates` for `word` and draws one of them.
    pub fn draw(&mut self, word: WordId, candidates: &[Candidate], tally: &DocumentTally) -> Result<Candidate, SamplingError> {
        let mut scores = std::mem::take(&mut self.scores);
        scores.clear();
        let mut mass = 0.0;
        for &candidate in candidates {
            let score = self.score(word, candidate, tally);
            mass += score;
            scores.push(score);
        }
        let drawn = draw_index(&scores, mass, self.randoms.next_uniform());
        self.scores = scores;
        match drawn {
            Some(pos) => Ok(candidates[pos]),
            None => Err(SamplingError::NoCandidateSampled { word, candidates: candidates.len(), mass })
        }
    }

    pub fn increment(&mut self, topic: TopicId, word: WordId, doc_type: Option<TypeId>) -> Result<(), SamplingError> {
        Ok(self.counts.increment(topic, word, doc_type)?)
    }

    pub fn decrement(&mut self, topic: TopicId, word: WordId, doc_type: Option<TypeId>) -> Result<(), SamplingError> {
        Ok(self.counts.decrement(topic, word, doc_type)?)
    }

    /// Assigns `candidate` to `position` and counts it.
    pub fn assign(&mut self, document: &mut Document, position: Position, (topic, doc_type): Candidate) -> Result<(), SamplingError> {
        let word = document.token(position);
        self.increment(topic, word, doc_type)?;
        document.set_topic(position, topic);
        if let Some(doc_type) = doc_type {
            document.set_type(position, doc_type);
        }
        Ok(())
    }

    /// Removes the counts of every known token of `document`, the assignments are kept.
    pub fn retract(&mut self, document: &Document) -> Result<(), SamplingError> {
        for position in document.known_positions(self.num_words()) {
            if let Some(topic) = document.topic(position) {
                self.decrement(topic, document.token(position), document.doc_type(position))?;
            }
        }
        Ok(())
    }

    /// One decrement, score, draw and increment cycle for every known token of `document`.
    pub fn sweep(&mut self, document: &mut Document, candidates: &[Candidate]) -> Result<(), SamplingError> {
        if candidates.is_empty() {
            return Err(SamplingError::EmptyCandidateSet { document: document.source().to_string() })
        }
        let num_words = self.num_words();
        let mut tally = DocumentTally::of(document, self.counts.num_topics(), self.counts.num_types(), num_words);
        for position in 0..document.len() {
            let word = document.token(position);
            if word >= num_words {
                continue;
            }
            let topic = document.topic(position).ok_or(SamplingError::MissingAssignment { position })?;
            let doc_type = document.doc_type(position);
            if self.kind.has_types() && doc_type.is_none() {
                return Err(SamplingError::MissingAssignment { position })
            }
            self.decrement(topic, word, doc_type)?;
            tally.remove(topic, doc_type);
            let candidate = self.draw(word, candidates, &tally)?;
            tally.add(candidate.0, candidate.1);
            self.assign(document, position, candidate)?;
        }
        Ok(())
    }
}

/// All topics, or all pairs of topic and type in row major order.
pub fn all_candidates(num_topics: usize, num_types: Option<usize>) -> Vec<Candidate> {
    match num_types {
        None => (0..num_topics).map(|topic| (topic, None)).collect(),
        Some(num_types) => (0..num_topics)
            .flat_map(|topic| (0..num_types).map(move |doc_type| (topic, Some(doc_type))))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use crate::config::ModelKind;
    use crate::corpus::Document;
    use crate::counts::{CountLayers, CountModel};
    use crate::random::Randoms;
    use crate::sampler::{all_candidates, draw_index, DocumentTally, GibbsContext, SamplingError};
    use crate::smoothing::{Priors, Smoothing};

    fn priors() -> Priors {
        Priors {
            alpha: Smoothing::Symmetric(0.1),
            alpha_sum: 0.2,
            beta: Smoothing::Symmetric(0.1),
            beta_sum: 0.3,
            gamma: 0.5,
            gamma_sum: 1.0,
        }
    }

    #[test]
    fn draws_walk_the_scores_in_order(){
        let scores = [1.0, 2.0, 1.0];
        assert_eq!(Some(0), draw_index(&scores, 4.0, 0.0));
        assert_eq!(Some(0), draw_index(&scores, 4.0, 0.25));
        assert_eq!(Some(1), draw_index(&scores, 4.0, 0.26));
        assert_eq!(Some(2), draw_index(&scores, 4.0, 0.99));
    }

    #[test]
    fn broken_mass_draws_nothing(){
        assert_eq!(None, draw_index(&[0.0, 0.0], 0.0, 0.5));
        assert_eq!(None, draw_index(&[f64::NAN], f64::NAN, 0.5));
        assert_eq!(None, draw_index(&[1.0], f64::INFINITY, 0.5));
        assert_eq!(None, draw_index(&[], 1.0, 0.5));
    }

    #[test]
    fn candidates_are_row_major(){
        assert_eq!(vec![(0, None), (1, None)], all_candidates(2, None));
        assert_eq!(
            vec![(0, Some(0)), (0, Some(1)), (1, Some(0)), (1, Some(1))],
            all_candidates(2, Some(2))
        );
    }

    #[test]
    fn scores_follow_the_conditionals(){
        let priors = priors();
        let mut counts = CountModel::new(2, 3, 2);
        counts.increment(1, 2, Some(1)).unwrap();
        counts.increment(1, 0, Some(1)).unwrap();
        let mut randoms = Randoms::new(1);
        let context = GibbsContext::new(ModelKind::Typed, &priors, CountLayers::new(None, &mut counts), &mut randoms);
        let mut document = Document::new(vec![2, 0], "d".to_string(), vec![1], vec![1]);
        document.set_topic(0, 1);
        document.set_type(0, 1);
        let tally = DocumentTally::of(&document, 2, 2, 3);

        let untyped = context.score(2, (1, None), &tally);
        approx::assert_relative_eq!((0.1 + 1.0) * (0.1 + 1.0) / (0.3 + 2.0), untyped);
        let typed = context.score(2, (1, Some(1)), &tally);
        approx::assert_relative_eq!((0.5 + 1.0) * (1.1 / 2.3) * (2.5 / 3.0), typed);
    }

    #[test]
    fn a_sweep_keeps_the_counts_consistent(){
        let priors = priors();
        let mut counts = CountModel::new(2, 3, 0);
        let mut randoms = Randoms::new(7);
        let mut document = Document::new(vec![0, 1, 2, 5], "d".to_string(), vec![], vec![]);
        let candidates = all_candidates(2, None);
        {
            let mut context = GibbsContext::new(ModelKind::Lda, &priors, CountLayers::new(None, &mut counts), &mut randoms);
            for position in 0..3 {
                context.assign(&mut document, position, (position % 2, None)).unwrap();
            }
        }
        for _ in 0..5 {
            GibbsContext::new(ModelKind::Lda, &priors, CountLayers::new(None, &mut counts), &mut randoms)
                .sweep(&mut document, &candidates)
                .unwrap();
            assert!(counts.is_consistent());
            assert_eq!(3, counts.total());
        }
        assert_eq!(None, document.topic(3));
        assert!(matches!(
            GibbsContext::new(ModelKind::Lda, &priors, CountLayers::new(None, &mut counts), &mut randoms).sweep(&mut document, &[]),
            Err(crate::sampler::SamplingError::EmptyCandidateSet { .. })
        ));
    }

    #[test]
    fn a_mass_without_probability_fails_the_draw(){
        let mut priors = priors();
        priors.beta = Smoothing::Symmetric(0.0);
        let mut counts = CountModel::new(2, 3, 0);
        counts.increment(0, 1, None).unwrap();
        let mut randoms = Randoms::new(3);
        let candidates = all_candidates(2, None);
        let document = Document::new(vec![0], "d".to_string(), vec![], vec![]);
        let tally = DocumentTally::of(&document, 2, 0, 3);
        let mut context = GibbsContext::new(ModelKind::Lda, &priors, CountLayers::new(None, &mut counts), &mut randoms);
        match context.draw(0, &candidates, &tally) {
            Err(SamplingError::NoCandidateSampled { word: 0, candidates: 2, mass }) => assert_eq!(0.0, mass),
            other => panic!("Expected a failed draw but got {other:?}"),
        }
    }

    #[test]
    fn a_nan_mass_fails_the_sweep(){
        let mut priors = priors();
        priors.beta = Smoothing::Symmetric(0.0);
        priors.beta_sum = 0.0;
        let mut counts = CountModel::new(2, 3, 0);
        let mut randoms = Randoms::new(3);
        let candidates = all_candidates(2, None);
        let mut document = Document::new(vec![2], "d".to_string(), vec![], vec![]);
        let mut context = GibbsContext::new(ModelKind::Lda, &priors, CountLayers::new(None, &mut counts), &mut randoms);
        context.assign(&mut document, 0, (1, None)).unwrap();
        match context.sweep(&mut document, &candidates) {
            Err(SamplingError::NoCandidateSampled { word: 2, candidates: 2, mass }) => assert!(mass.is_nan()),
            other => panic!("Expected a failed draw but got {other:?}"),
        }
    }
}
