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

use std::borrow::Borrow;
use std::hash::Hash;
use std::ops::Range;
use std::slice::Iter;
use crate::vocabulary::VocabularyError;

/// A basic vocabulary, a dense mapping from ids to items.
pub trait BasicVocabulary<T>: AsRef<[T]> {
    /// The number of entries in the vocabulary
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the ids
    fn ids(&self) -> Range<usize>;

    /// Iterates over the items in the order of the ids.
    /// To get the ids use .enumerate()
    fn iter(&self) -> Iter<T>;

    /// Get the item for a specific `id` or none
    fn get_value_by_id(&self, id: usize) -> Option<&T>;

    /// Get the item for a specific `id`, fails if the id was never assigned.
    fn get_item(&self, id: usize) -> Result<&T, VocabularyError> {
        self.get_value_by_id(id).ok_or(VocabularyError::OutOfRange { id, len: self.len() })
    }

    /// Check if the `id` is contained in this
    fn contains_id(&self, id: usize) -> bool;
}

/// Allows to search a vocabulary by a query
pub trait SearchableVocabulary<T>: BasicVocabulary<T> where T: Eq + Hash {

    /// Retrieves the id for `q`, none means absent.
    fn get_id<Q: ?Sized>(&self, q: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: Hash + Eq;

    fn contains_value<Q: ?Sized>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq
    {
        self.get_id(value).is_some()
    }
}

/// A vocabulary that can grow. There is no way to remove an entry.
pub trait VocabularyMut<T>: SearchableVocabulary<T> where T: Eq + Hash + Clone {
    /// Adds the `value` to the vocabulary and returns the associated id.
    /// Adding a known value does not change anything.
    fn add_value(&mut self, value: T) -> usize;

    /// Adds any `value` that can be converted into `T`
    fn add<V: Into<T>>(&mut self, value: V) -> usize {
        self.add_value(value.into())
    }

    fn add_all_value<I: IntoIterator<Item=T>>(&mut self, other: I) {
        for value in other {
            self.add_value(value);
        }
    }
}
