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

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use indexmap::IndexMap;
use thiserror::Error;

/// Prototype topics in file order, mapping the topic name to its seed words.
pub type PrototypeTopics = IndexMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum PrototypeReadError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("Line {0} does not contain a topic and its words separated by a tab!")]
    MalformedLine(usize),
}

/// Reads `topic \t word word ...` lines from `path`.
pub fn read_prototypes(path: impl AsRef<Path>) -> Result<PrototypeTopics, PrototypeReadError> {
    read_prototypes_from(BufReader::new(File::open(path)?))
}

/// Reads `topic \t word word ...` lines. A topic named twice keeps its
/// first position but gets the words of the last line.
pub fn read_prototypes_from(reader: impl BufRead) -> Result<PrototypeTopics, PrototypeReadError> {
    let mut topics = PrototypeTopics::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let Some((topic, words)) = line.split_once('\t') else {
            return Err(PrototypeReadError::MalformedLine(line_no + 1))
        };
        let words: Vec<String> = words.split_whitespace().map(String::from).collect();
        if topic.trim().is_empty() || words.is_empty() {
            return Err(PrototypeReadError::MalformedLine(line_no + 1))
        }
        topics.insert(topic.trim().to_string(), words);
    }
    Ok(topics)
}
