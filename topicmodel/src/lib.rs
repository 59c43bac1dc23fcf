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

//! Collapsed Gibbs sampling for (labeled, document-typed and prototype seeded) topic models.

pub mod vocabulary;
pub mod corpus;
pub mod prototypes;
pub mod counts;
pub mod smoothing;
pub mod random;
pub mod config;
pub mod sampler;
pub mod model;
pub mod enums;

pub type TopicTo<T> = Vec<T>;
pub type WordTo<T> = Vec<T>;
pub type TypeTo<T> = Vec<T>;
pub type DocumentTo<T> = Vec<T>;

pub type TopicId = usize;
pub type WordId = usize;
pub type TypeId = usize;
pub type Position = usize;

/// A single cell of the count tables.
pub type Count = u32;
pub type Probability = f64;
