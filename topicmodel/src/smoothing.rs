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

use serde::{Deserialize, Serialize};
use crate::{TopicId, TopicTo, WordId, WordTo};

/// A pseudo count provider for the topic or the word distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Smoothing {
    Symmetric(f64),
    PerTopic(TopicTo<f64>),
    PerTopicWord(TopicTo<WordTo<f64>>),
}

impl Smoothing {
    /// The pseudo count of `word` in `topic`. Providers without a word
    /// dimension ignore `word`.
    #[inline]
    pub fn value(&self, topic: TopicId, word: WordId) -> f64 {
        match self {
            Smoothing::Symmetric(value) => *value,
            Smoothing::PerTopic(values) => values[topic],
            Smoothing::PerTopicWord(values) => values[topic][word],
        }
    }

    /// The pseudo count of `topic` for providers without a word dimension.
    /// A per topic and word provider returns the value of the first word.
    #[inline]
    pub fn topic_value(&self, topic: TopicId) -> f64 {
        self.value(topic, 0)
    }

    /// Returns true if the provider covers `num_topics` topics and `num_words` words.
    pub fn fits(&self, num_topics: usize, num_words: usize) -> bool {
        match self {
            Smoothing::Symmetric(_) => true,
            Smoothing::PerTopic(values) => values.len() == num_topics,
            Smoothing::PerTopicWord(values) => {
                values.len() == num_topics && values.iter().all(|words| words.len() == num_words)
            }
        }
    }
}

/// The priors of a trained model together with their sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Priors {
    pub alpha: Smoothing,
    pub alpha_sum: f64,
    pub beta: Smoothing,
    pub beta_sum: f64,
    pub gamma: f64,
    pub gamma_sum: f64,
}

impl Priors {
    #[inline]
    pub fn alpha(&self, topic: TopicId) -> f64 {
        self.alpha.topic_value(topic)
    }

    #[inline]
    pub fn beta(&self, topic: TopicId, word: WordId) -> f64 {
        self.beta.value(topic, word)
    }

    /// Replaces alpha and its sum.
    pub fn with_alpha(&self, alpha: Smoothing, alpha_sum: f64) -> Self {
        Self {
            alpha,
            alpha_sum,
            ..self.clone()
        }
    }
}
