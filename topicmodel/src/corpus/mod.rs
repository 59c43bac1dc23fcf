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

mod reader;

pub use reader::*;
use std::slice::{Iter, IterMut};
use crate::vocabulary::{BasicVocabulary, StringVocabulary, VocabularyMut};
use crate::{Count, Position, TopicId, TopicTo, TypeId, WordId};

/// A tokenized document with its latent assignments.
///
/// The assignment arrays have the length of the token sequence and are
/// mutated in place by the samplers. `None` marks a position that was never
/// assigned, e.g. an out-of-vocabulary token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    tokens: Vec<WordId>,
    topics: Vec<Option<TopicId>>,
    types: Vec<Option<TypeId>>,
    source: String,
    labels: Vec<TopicId>,
    type_candidates: Vec<TypeId>,
}

impl Document {
    pub fn new(tokens: Vec<WordId>, source: impl Into<String>, type_candidates: Vec<TypeId>, labels: Vec<TopicId>) -> Self {
        let len = tokens.len();
        Self {
            tokens,
            topics: vec![None; len],
            types: vec![None; len],
            source: source.into(),
            labels,
            type_candidates,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[WordId] {
        &self.tokens
    }

    pub fn token(&self, position: Position) -> WordId {
        self.tokens[position]
    }

    /// The topics this document may be assigned to while training.
    pub fn labels(&self) -> &[TopicId] {
        &self.labels
    }

    /// The types this document may be assigned to while training.
    pub fn types(&self) -> &[TypeId] {
        &self.type_candidates
    }

    pub fn topic(&self, position: Position) -> Option<TopicId> {
        self.topics[position]
    }

    pub fn doc_type(&self, position: Position) -> Option<TypeId> {
        self.types[position]
    }

    pub fn set_topic(&mut self, position: Position, topic: TopicId) {
        self.topics[position] = Some(topic);
    }

    pub fn set_type(&mut self, position: Position, doc_type: TypeId) {
        self.types[position] = Some(doc_type);
    }

    /// Iterates over the positions of the tokens known to a model with `num_words` words.
    pub fn known_positions(&self, num_words: usize) -> impl Iterator<Item=Position> + '_ {
        self.tokens
            .iter()
            .enumerate()
            .filter_map(move |(position, &word)| (word < num_words).then_some(position))
    }

    /// Counts the assigned topics of all in-vocabulary tokens.
    pub fn topic_counts(&self, num_topics: usize, num_words: usize) -> TopicTo<Count> {
        let mut counts = vec![0; num_topics];
        for position in self.known_positions(num_words) {
            if let Some(topic) = self.topics[position] {
                if topic < num_topics {
                    counts[topic] += 1;
                }
            }
        }
        counts
    }

    /// The number of in-vocabulary tokens with a topic assignment.
    pub fn assigned_len(&self, num_words: usize) -> usize {
        self.known_positions(num_words)
            .filter(|&position| self.topics[position].is_some())
            .count()
    }

    /// Forgets all assignments.
    pub fn clear_assignments(&mut self) {
        self.topics.fill(None);
        self.types.fill(None);
    }
}

/// An ordered collection of documents sharing one index per dimension.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    words: StringVocabulary,
    labels: StringVocabulary,
    types: StringVocabulary,
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty corpus sharing the ids of already existing indexes,
    /// e.g. the ones of a trained model.
    pub fn with_indexes(words: StringVocabulary, labels: StringVocabulary, types: StringVocabulary) -> Self {
        Self {
            words,
            labels,
            types,
            documents: Vec::new(),
        }
    }

    /// Registers the strings in the indexes and appends a new document.
    pub fn add_document<'a>(
        &mut self,
        source: impl Into<String>,
        types: impl IntoIterator<Item=&'a str>,
        labels: impl IntoIterator<Item=&'a str>,
        words: impl IntoIterator<Item=&'a str>,
    ) -> &Document {
        let type_candidates = types.into_iter().map(|value| self.types.add(value)).collect();
        let labels = labels.into_iter().map(|value| self.labels.add(value)).collect();
        let tokens = words.into_iter().map(|value| self.words.add(value)).collect();
        self.push(Document::new(tokens, source, type_candidates, labels))
    }

    /// Appends an already indexed document.
    pub fn push(&mut self, document: Document) -> &Document {
        self.documents.push(document);
        &self.documents[self.documents.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> Iter<Document> {
        self.documents.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<Document> {
        self.documents.iter_mut()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn word_index(&self) -> &StringVocabulary {
        &self.words
    }

    pub fn word_index_mut(&mut self) -> &mut StringVocabulary {
        &mut self.words
    }

    pub fn label_index(&self) -> &StringVocabulary {
        &self.labels
    }

    pub fn type_index(&self) -> &StringVocabulary {
        &self.types
    }

    pub fn num_topics(&self) -> usize {
        self.labels.len()
    }

    pub fn num_types(&self) -> usize {
        self.types.len()
    }

    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    /// The total number of tokens of all documents.
    pub fn num_tokens(&self) -> usize {
        self.documents.iter().map(Document::len).sum()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Document;
    type IntoIter = Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

impl<'a> IntoIterator for &'a mut Corpus {
    type Item = &'a mut Document;
    type IntoIter = IterMut<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter_mut()
    }
}

#[cfg(test)]
mod test {
    use crate::corpus::Corpus;
    use crate::vocabulary::SearchableVocabulary;

    #[test]
    fn documents_share_the_indexes(){
        let mut corpus = Corpus::new();
        corpus.add_document("a", ["news"], ["sport", "politics"], ["ball", "vote", "ball"]);
        let second = corpus.add_document("b", ["blog"], ["sport"], ["ball", "goal"]);
        assert_eq!(&[0, 2], second.tokens());
        assert_eq!(&[0], second.labels());
        assert_eq!(&[1], second.types());
        assert_eq!(2, corpus.num_topics());
        assert_eq!(2, corpus.num_types());
        assert_eq!(3, corpus.num_words());
        assert_eq!(5, corpus.num_tokens());
        assert_eq!(Some(1), corpus.label_index().get_id("politics"));
    }

    #[test]
    fn unassigned_and_unknown_tokens_are_not_counted(){
        let mut corpus = Corpus::new();
        corpus.add_document("a", ["t"], ["l"], ["x", "y", "z"]);
        let document = corpus.iter_mut().next().unwrap();
        document.set_topic(0, 1);
        document.set_topic(2, 1);
        assert_eq!(vec![0, 1], document.topic_counts(2, 2));
        assert_eq!(1, document.assigned_len(2));
        document.clear_assignments();
        assert_eq!(None, document.topic(0));
    }
}
