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
use thiserror::Error;
use crate::corpus::Corpus;

#[derive(Debug, Error)]
pub enum CorpusReadError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("Line {line} has {fields} tab separated fields, expected source, type, labels and text!")]
    MalformedLine {
        line: usize,
        fields: usize
    },
}

fn split_list(field: &str) -> impl Iterator<Item=&str> {
    field.split(',').map(str::trim).filter(|value| !value.is_empty())
}

impl Corpus {
    /// Reads the documents in `path` into a new corpus.
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, CorpusReadError> {
        let mut corpus = Self::new();
        corpus.read_file_into(path)?;
        Ok(corpus)
    }

    /// Appends the documents in `path` to this corpus, new strings extend the indexes.
    pub fn read_file_into(&mut self, path: impl AsRef<Path>) -> Result<usize, CorpusReadError> {
        let read = self.read_from(BufReader::new(File::open(path.as_ref())?))?;
        log::info!("Read {read} documents from {}.", path.as_ref().display());
        Ok(read)
    }

    /// Appends the documents in `reader` to this corpus and returns the number of read documents.
    ///
    /// Every non blank line is one document with the tab separated fields
    /// `source`, `type[,type...]`, `label[,label...]` and the whitespace tokenized text.
    pub fn read_from(&mut self, reader: impl BufRead) -> Result<usize, CorpusReadError> {
        let mut read = 0usize;
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.splitn(4, '\t').collect();
            let &[source, types, labels, text] = fields.as_slice() else {
                return Err(CorpusReadError::MalformedLine { line: line_no + 1, fields: fields.len() })
            };
            self.add_document(
                source,
                split_list(types),
                split_list(labels),
                text.split_whitespace()
            );
            read += 1;
        }
        Ok(read)
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;
    use crate::corpus::{Corpus, CorpusReadError};
    use crate::vocabulary::{BasicVocabulary, SearchableVocabulary};

    const CORPUS: &str = "doc1\tnews\tsport,politics\tthe ball is round\n\n   \ndoc2\tblog\tsport\tthe goal\n";

    #[test]
    fn reads_documents_and_skips_blank_lines(){
        let mut corpus = Corpus::new();
        let read = corpus.read_from(Cursor::new(CORPUS)).unwrap();
        assert_eq!(2, read);
        assert_eq!(2, corpus.len());
        assert_eq!(2, corpus.num_topics());
        assert_eq!(2, corpus.num_types());
        assert_eq!(5, corpus.num_words());
        let second = &corpus.documents()[1];
        assert_eq!("doc2", second.source());
        assert_eq!(&[0, 4], second.tokens());
        assert_eq!(Some("blog"), corpus.type_index().get_value_by_id(1).map(String::as_str));
        assert_eq!(Some(1), corpus.label_index().get_id("politics"));
    }

    #[test]
    fn a_line_with_missing_fields_is_rejected(){
        let mut corpus = Corpus::new();
        let result = corpus.read_from(Cursor::new("doc1\tnews\tsport\n"));
        assert!(matches!(result, Err(CorpusReadError::MalformedLine { line: 1, fields: 3 })));
    }

    #[test]
    fn reading_into_shared_indexes_keeps_the_ids(){
        let mut corpus = Corpus::new();
        corpus.read_from(Cursor::new(CORPUS)).unwrap();
        let mut unseen = Corpus::with_indexes(
            corpus.word_index().clone(),
            corpus.label_index().clone(),
            corpus.type_index().clone()
        );
        unseen.read_from(Cursor::new("doc3\tnews\tsport\tthe new ball\n")).unwrap();
        assert_eq!(&[0, 5, 1], unseen.documents()[0].tokens());
    }
}
