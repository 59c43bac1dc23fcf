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

use itertools::Itertools;
use crate::config::ModelKind;
use crate::corpus::Document;
use crate::counts::{CountLayers, CountModel};
use crate::random::Randoms;
use crate::sampler::{all_candidates, Candidate, GibbsContext, Sampler, SamplingError};
use crate::smoothing::Priors;

/// Samples the training corpus, writes straight into the model counts.
pub struct LearnSampler<'a> {
    context: GibbsContext<'a>,
}

impl<'a> LearnSampler<'a> {
    pub fn new(kind: ModelKind, priors: &'a Priors, counts: &'a mut CountModel, randoms: &'a mut Randoms) -> Self {
        Self {
            context: GibbsContext::new(kind, priors, CountLayers::new(None, counts), randoms)
        }
    }

    /// The candidates of `document` while training a `kind` model with `num_topics` topics.
    /// Supervised kinds are restricted to the labels (and types) of the document.
    pub fn candidates_for(kind: ModelKind, num_topics: usize, document: &Document) -> Vec<Candidate> {
        match kind {
            ModelKind::Lda | ModelKind::Prototype => all_candidates(num_topics, None),
            ModelKind::Labeled => document.labels().iter().unique().map(|&topic| (topic, None)).collect(),
            ModelKind::Typed => document
                .labels()
                .iter()
                .unique()
                .cartesian_product(document.types().iter().unique())
                .map(|(&topic, &doc_type)| (topic, Some(doc_type)))
                .collect()
        }
    }

    fn candidates(&self, document: &Document) -> Result<Vec<Candidate>, SamplingError> {
        let candidates = Self::candidates_for(self.context.kind(), self.context.counts().num_topics(), document);
        if candidates.is_empty() {
            Err(SamplingError::EmptyCandidateSet { document: document.source().to_string() })
        } else {
            Ok(candidates)
        }
    }
}

impl Sampler for LearnSampler<'_> {
    fn add_document(&mut self, document: &mut Document) -> Result<(), SamplingError> {
        let candidates = self.candidates(document)?;
        let num_words = self.context.num_words();
        for position in 0..document.len() {
            if document.token(position) >= num_words {
                continue;
            }
            let candidate = *self
                .context
                .randoms()
                .choice(&candidates)
                .ok_or_else(|| SamplingError::EmptyCandidateSet { document: document.source().to_string() })?;
            self.context.assign(document, position, candidate)?;
        }
        Ok(())
    }

    fn sample_document(&mut self, document: &mut Document) -> Result<(), SamplingError> {
        let candidates = self.candidates(document)?;
        self.context.sweep(document, &candidates)
    }
}
