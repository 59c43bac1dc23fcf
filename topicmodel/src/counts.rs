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

//! The sufficient statistics of the sampler.
//!
//! Every table is only ever written through [CountModel::increment] and
//! [CountModel::decrement], so the totals always equal the sums of their rows.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::{Count, TopicId, TopicTo, TypeId, TypeTo, WordId, WordTo};

#[derive(Debug, Copy, Clone, Error, PartialEq, Eq)]
pub enum CountError {
    #[error("Decrementing topic {topic} of word {word} (type {doc_type:?}) would make a count negative!")]
    Underflow {
        topic: TopicId,
        word: WordId,
        doc_type: Option<TypeId>,
    },
    #[error("The cell (topic {topic}, word {word}, type {doc_type:?}) is outside of the count tables with {num_topics} topics, {num_words} words and {num_types} types!")]
    OutOfRange {
        topic: TopicId,
        word: WordId,
        doc_type: Option<TypeId>,
        num_topics: usize,
        num_words: usize,
        num_types: usize,
    },
}

/// Dense count tables over topics, words and document types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountModel {
    topic_counts: TopicTo<Count>,
    word_topic_counts: WordTo<TopicTo<Count>>,
    type_counts: TypeTo<Count>,
    type_topic_counts: TypeTo<TopicTo<Count>>,
}

impl CountModel {
    pub fn new(num_topics: usize, num_words: usize, num_types: usize) -> Self {
        Self {
            topic_counts: vec![0; num_topics],
            word_topic_counts: vec![vec![0; num_topics]; num_words],
            type_counts: vec![0; num_types],
            type_topic_counts: vec![vec![0; num_topics]; num_types],
        }
    }

    /// Creates a zeroed model with the same shape as `self`.
    pub fn empty_like(&self) -> Self {
        Self::new(self.num_topics(), self.num_words(), self.num_types())
    }

    pub fn num_topics(&self) -> usize {
        self.topic_counts.len()
    }

    pub fn num_words(&self) -> usize {
        self.word_topic_counts.len()
    }

    pub fn num_types(&self) -> usize {
        self.type_counts.len()
    }

    #[inline]
    pub fn topic_count(&self, topic: TopicId) -> Count {
        self.topic_counts[topic]
    }

    #[inline]
    pub fn word_topic_count(&self, word: WordId, topic: TopicId) -> Count {
        self.word_topic_counts[word][topic]
    }

    #[inline]
    pub fn type_count(&self, doc_type: TypeId) -> Count {
        self.type_counts[doc_type]
    }

    #[inline]
    pub fn type_topic_count(&self, doc_type: TypeId, topic: TopicId) -> Count {
        self.type_topic_counts[doc_type][topic]
    }

    pub fn topic_counts(&self) -> &[Count] {
        &self.topic_counts
    }

    pub fn word_topic_counts(&self) -> &[TopicTo<Count>] {
        &self.word_topic_counts
    }

    pub fn type_counts(&self) -> &[Count] {
        &self.type_counts
    }

    pub fn type_topic_counts(&self) -> &[TopicTo<Count>] {
        &self.type_topic_counts
    }

    /// The counts of `topic` for every word.
    pub fn topic_word_counts(&self, topic: TopicId) -> impl Iterator<Item=Count> + '_ {
        self.word_topic_counts.iter().map(move |topics| topics[topic])
    }

    /// The counts of every type for `topic`.
    pub fn topic_type_counts(&self, topic: TopicId) -> impl Iterator<Item=Count> + '_ {
        self.type_topic_counts.iter().map(move |topics| topics[topic])
    }

    fn check_range(&self, topic: TopicId, word: WordId, doc_type: Option<TypeId>) -> Result<(), CountError> {
        let type_ok = doc_type.map_or(true, |value| value < self.num_types());
        if topic < self.num_topics() && word < self.num_words() && type_ok {
            Ok(())
        } else {
            Err(
                CountError::OutOfRange {
                    topic,
                    word,
                    doc_type,
                    num_topics: self.num_topics(),
                    num_words: self.num_words(),
                    num_types: self.num_types(),
                }
            )
        }
    }

    /// Adds one occurrence of `word` assigned to `topic` (and `doc_type`).
    pub fn increment(&mut self, topic: TopicId, word: WordId, doc_type: Option<TypeId>) -> Result<(), CountError> {
        self.check_range(topic, word, doc_type)?;
        self.topic_counts[topic] += 1;
        self.word_topic_counts[word][topic] += 1;
        if let Some(doc_type) = doc_type {
            self.type_counts[doc_type] += 1;
            self.type_topic_counts[doc_type][topic] += 1;
        }
        Ok(())
    }

    /// Removes one occurrence of `word` assigned to `topic` (and `doc_type`).
    /// Nothing is changed if any affected cell is already zero.
    pub fn decrement(&mut self, topic: TopicId, word: WordId, doc_type: Option<TypeId>) -> Result<(), CountError> {
        self.check_range(topic, word, doc_type)?;
        let type_empty = doc_type.is_some_and(|doc_type| {
            self.type_counts[doc_type] == 0 || self.type_topic_counts[doc_type][topic] == 0
        });
        if self.topic_counts[topic] == 0 || self.word_topic_counts[word][topic] == 0 || type_empty {
            return Err(CountError::Underflow { topic, word, doc_type })
        }
        self.topic_counts[topic] -= 1;
        self.word_topic_counts[word][topic] -= 1;
        if let Some(doc_type) = doc_type {
            self.type_counts[doc_type] -= 1;
            self.type_topic_counts[doc_type][topic] -= 1;
        }
        Ok(())
    }

    /// Returns true iff all totals equal the sums of their tables and
    /// all rows have the width of the topic table.
    pub fn is_consistent(&self) -> bool {
        let num_topics = self.num_topics();
        if self.word_topic_counts.iter().chain(self.type_topic_counts.iter()).any(|row| row.len() != num_topics) {
            return false
        }
        let topics_match = (0..num_topics).all(|topic| {
            self.topic_word_counts(topic).map(u64::from).sum::<u64>() == u64::from(self.topic_counts[topic])
        });
        let types_match = self.type_topic_counts.iter().zip_eq(self.type_counts.iter()).all(|(row, &total)| {
            row.iter().copied().map(u64::from).sum::<u64>() == u64::from(total)
        });
        topics_match && types_match
    }

    pub fn is_zero(&self) -> bool {
        self.topic_counts.iter().chain(self.type_counts.iter()).all(|&value| value == 0)
            && self.word_topic_counts.iter().flatten().all(|&value| value == 0)
            && self.type_topic_counts.iter().flatten().all(|&value| value == 0)
    }

    /// The number of counted tokens.
    pub fn total(&self) -> u64 {
        self.topic_counts.iter().copied().map(u64::from).sum()
    }
}

/// A view over the counts used while sampling: an optional frozen
/// background layer and the active layer that receives all writes.
/// Reads return the sum of both layers.
#[derive(Debug)]
pub struct CountLayers<'a> {
    background: Option<&'a CountModel>,
    active: &'a mut CountModel,
}

impl<'a> CountLayers<'a> {
    /// The background and the active layer must have the same shape.
    pub fn new(background: Option<&'a CountModel>, active: &'a mut CountModel) -> Self {
        debug_assert!(
            background.map_or(true, |background| {
                background.num_topics() == active.num_topics()
                    && background.num_words() == active.num_words()
                    && background.num_types() == active.num_types()
            }),
            "The layers have different shapes!"
        );
        Self { background, active }
    }

    pub fn num_topics(&self) -> usize {
        self.active.num_topics()
    }

    pub fn num_words(&self) -> usize {
        self.active.num_words()
    }

    pub fn num_types(&self) -> usize {
        self.active.num_types()
    }

    #[inline]
    pub fn topic_count(&self, topic: TopicId) -> Count {
        self.active.topic_count(topic) + self.background.map_or(0, |value| value.topic_count(topic))
    }

    #[inline]
    pub fn word_topic_count(&self, word: WordId, topic: TopicId) -> Count {
        self.active.word_topic_count(word, topic) + self.background.map_or(0, |value| value.word_topic_count(word, topic))
    }

    #[inline]
    pub fn type_count(&self, doc_type: TypeId) -> Count {
        self.active.type_count(doc_type) + self.background.map_or(0, |value| value.type_count(doc_type))
    }

    #[inline]
    pub fn type_topic_count(&self, doc_type: TypeId, topic: TopicId) -> Count {
        self.active.type_topic_count(doc_type, topic) + self.background.map_or(0, |value| value.type_topic_count(doc_type, topic))
    }

    pub fn increment(&mut self, topic: TopicId, word: WordId, doc_type: Option<TypeId>) -> Result<(), CountError> {
        self.active.increment(topic, word, doc_type)
    }

    pub fn decrement(&mut self, topic: TopicId, word: WordId, doc_type: Option<TypeId>) -> Result<(), CountError> {
        self.active.decrement(topic, word, doc_type)
    }
}

#[cfg(test)]
mod test {
    use crate::counts::{CountError, CountLayers, CountModel};

    #[test]
    fn increment_then_decrement_restores_the_tables(){
        let mut counts = CountModel::new(3, 4, 2);
        counts.increment(1, 2, Some(0)).unwrap();
        counts.increment(2, 3, Some(1)).unwrap();
        let before = counts.clone();
        counts.decrement(1, 2, Some(0)).unwrap();
        counts.increment(1, 2, Some(0)).unwrap();
        assert_eq!(before, counts);
        assert!(counts.is_consistent());
        assert_eq!(2, counts.total());
    }

    #[test]
    fn decrement_never_goes_negative(){
        let mut counts = CountModel::new(2, 2, 2);
        counts.increment(0, 1, None).unwrap();
        let before = counts.clone();
        assert_eq!(
            Err(CountError::Underflow { topic: 0, word: 1, doc_type: Some(0) }),
            counts.decrement(0, 1, Some(0))
        );
        assert_eq!(before, counts);
        assert!(counts.decrement(1, 1, None).is_err());
    }

    #[test]
    fn out_of_range_is_rejected(){
        let mut counts = CountModel::new(2, 2, 0);
        assert!(matches!(counts.increment(0, 2, None), Err(CountError::OutOfRange { .. })));
        assert!(matches!(counts.increment(0, 0, Some(0)), Err(CountError::OutOfRange { .. })));
        assert!(counts.is_zero());
    }

    #[test]
    fn layers_read_both_and_write_the_active_one(){
        let mut background = CountModel::new(2, 3, 1);
        background.increment(1, 2, Some(0)).unwrap();
        let frozen = background.clone();
        let mut local = background.empty_like();
        let mut layers = CountLayers::new(Some(&background), &mut local);
        layers.increment(1, 2, Some(0)).unwrap();
        assert_eq!(2, layers.topic_count(1));
        assert_eq!(2, layers.word_topic_count(2, 1));
        assert_eq!(2, layers.type_topic_count(0, 1));
        layers.decrement(1, 2, Some(0)).unwrap();
        assert!(layers.decrement(1, 2, Some(0)).is_err());
        assert_eq!(frozen, background);
        assert!(local.is_zero());
    }
}
