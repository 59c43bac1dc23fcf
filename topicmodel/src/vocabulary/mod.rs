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

mod traits;

pub use traits::*;
use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;
use std::ops::Range;
use std::slice::Iter;
use std::vec::IntoIter;
use itertools::Itertools;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The vocabulary used for words, labels and types.
pub type StringVocabulary = Vocabulary<String>;

#[derive(Debug, Copy, Clone, Error, PartialEq, Eq)]
pub enum VocabularyError {
    #[error("The id {id} is not assigned, the vocabulary has only {len} entries!")]
    OutOfRange {
        id: usize,
        len: usize
    },
}

/// A vocabulary mapping between an usize id and a specific object (word).
/// Ids are assigned in first-seen order and are never reused.
#[derive(Clone, Debug)]
pub struct Vocabulary<T> {
    id2entry: Vec<T>,
    entry2id: HashMap<T, usize>,
}

impl<T> Vocabulary<T> {
    /// Create a new empty vocabulary.
    pub fn new() -> Self {
        Self {
            id2entry: Vec::new(),
            entry2id: HashMap::new(),
        }
    }
}

impl<T> Vocabulary<T> where T: Eq + Hash + Clone {
    /// Creates a vocabulary from an ordered item list, fails with the first
    /// duplicate item.
    pub fn try_from_items(id2entry: Vec<T>) -> Result<Self, T> {
        let mut entry2id = HashMap::with_capacity(id2entry.len());
        for (id, value) in id2entry.iter().enumerate() {
            if entry2id.insert(value.clone(), id).is_some() {
                return Err(value.clone())
            }
        }
        Ok(Self { id2entry, entry2id })
    }
}

impl<T> BasicVocabulary<T> for Vocabulary<T> {
    fn len(&self) -> usize {
        self.id2entry.len()
    }

    fn ids(&self) -> Range<usize> {
        0..self.id2entry.len()
    }

    fn iter(&self) -> Iter<T> {
        self.id2entry.iter()
    }

    fn get_value_by_id(&self, id: usize) -> Option<&T> {
        self.id2entry.get(id)
    }

    fn contains_id(&self, id: usize) -> bool {
        self.id2entry.len() > id
    }
}

impl<T> Default for Vocabulary<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AsRef<[T]> for Vocabulary<T> {
    fn as_ref(&self) -> &[T] {
        &self.id2entry
    }
}

impl<T> SearchableVocabulary<T> for Vocabulary<T>
where
    T: Eq + Hash
{
    fn get_id<Q: ?Sized>(&self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: Hash + Eq
    {
        self.entry2id.get(value).copied()
    }
}

impl<T> VocabularyMut<T> for Vocabulary<T> where T: Eq + Hash + Clone {
    fn add_value(&mut self, value: T) -> usize {
        match self.entry2id.entry(value) {
            Entry::Occupied(entry) => {
                *entry.get()
            }
            Entry::Vacant(entry) => {
                let pos = self.id2entry.len();
                self.id2entry.push(entry.key().clone());
                entry.insert(pos);
                pos
            }
        }
    }
}

impl<T, R> Extend<R> for Vocabulary<T>
where
    T: Eq + Hash + Clone,
    R: Into<T>
{
    fn extend<I: IntoIterator<Item=R>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

impl<T> FromIterator<T> for Vocabulary<T> where T: Hash + Eq + Clone {
    fn from_iter<I: IntoIterator<Item=T>>(iter: I) -> Self {
        let mut voc = Self::new();
        voc.add_all_value(iter);
        voc
    }
}

impl<T> IntoIterator for Vocabulary<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.id2entry.into_iter()
    }
}

impl<T> PartialEq for Vocabulary<T> where T: Eq {
    fn eq(&self, other: &Self) -> bool {
        self.id2entry == other.id2entry
    }
}

impl<T> Eq for Vocabulary<T> where T: Eq {}

impl<T> Display for Vocabulary<T> where T: Display {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Vocabulary[{}]", self.id2entry.iter().join(", "))
    }
}

impl<T> Serialize for Vocabulary<T> where T: Serialize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        // The inverse mapping is derived from the order of the items.
        self.id2entry.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Vocabulary<T>
where
    T: Deserialize<'de> + Hash + Eq + Clone + Debug
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        let id2entry = Vec::<T>::deserialize(deserializer)?;
        Vocabulary::try_from_items(id2entry).map_err(|duplicate| {
            de::Error::custom(format!("The vocabulary contains {duplicate:?} more than once!"))
        })
    }
}

#[cfg(test)]
mod test {
    use crate::vocabulary::{BasicVocabulary, SearchableVocabulary, StringVocabulary, Vocabulary, VocabularyError, VocabularyMut};

    #[test]
    fn can_insert_and_retrieve() {
        let mut voc = StringVocabulary::new();
        assert_eq!(0, voc.add("Hello World"));
        assert_eq!(1, voc.add("Wasimodo"));
        assert_eq!(0, voc.add("Hello World"));

        assert_eq!(2usize, voc.len());
        assert_eq!(Some(0usize), voc.get_id("Hello World"));
        assert_eq!(None, voc.get_id("Unknown"));
        assert_eq!(Some("Wasimodo"), voc.get_value_by_id(1).map(|x| x.as_str()));
        for id in voc.ids() {
            assert_eq!(Some(id), voc.get_id(voc.get_item(id).unwrap()));
        }
    }

    #[test]
    fn unknown_ids_are_out_of_range() {
        let voc: StringVocabulary = ["a".to_string()].into_iter().collect();
        assert_eq!(Err(VocabularyError::OutOfRange { id: 1, len: 1 }), voc.get_item(1));
        assert!(!voc.contains_id(1));
    }

    #[test]
    fn can_load_and_unload_json() {
        let voc: StringVocabulary = ["b", "a", "c"].into_iter().map(String::from).collect();
        let ser = serde_json::to_string(&voc).unwrap();
        assert_eq!(r#"["b","a","c"]"#, ser);
        let voc2: Vocabulary<String> = serde_json::from_str(&ser).unwrap();
        assert_eq!(voc, voc2);
        assert_eq!(Some(2), voc2.get_id("c"));
    }

    #[test]
    fn duplicates_are_rejected_when_loading() {
        let result: Result<Vocabulary<String>, _> = serde_json::from_str(r#"["a","a"]"#);
        assert!(result.is_err());
    }
}
