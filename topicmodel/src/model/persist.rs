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
use std::io::{BufReader, Read, Write};
use std::path::Path;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use ldagibbs_toolkit::fs::write_atomically;
use crate::config::GibbsConfig;
use crate::counts::CountModel;
use crate::enums::{ModelFormatVersion, ReadError, WriteError, MODEL_MAGIC};
use crate::model::GibbsTopicModel;
use crate::random::{RandomState, Randoms};
use crate::smoothing::Priors;
use crate::vocabulary::{BasicVocabulary, StringVocabulary};

/// The written record, the field order is the order on disk.
#[derive(Serialize)]
struct PersistedModelRef<'a> {
    config: &'a GibbsConfig,
    priors: Option<&'a Priors>,
    num_regular_topics: usize,
    topic_index: &'a StringVocabulary,
    type_index: &'a StringVocabulary,
    word_index: &'a StringVocabulary,
    counts: &'a CountModel,
    random: RandomState,
    trained: bool,
}

#[derive(Deserialize)]
struct PersistedModel {
    config: GibbsConfig,
    priors: Option<Priors>,
    num_regular_topics: usize,
    topic_index: StringVocabulary,
    type_index: StringVocabulary,
    word_index: StringVocabulary,
    counts: CountModel,
    random: RandomState,
    trained: bool,
}

impl PersistedModel {
    fn check(&self) -> Result<(), ReadError> {
        let counts = &self.counts;
        if self.topic_index.len() != counts.num_topics() {
            return Err(ReadError::Inconsistent("the topic index does not fit the counts"))
        }
        if self.word_index.len() != counts.num_words() {
            return Err(ReadError::Inconsistent("the word index does not fit the counts"))
        }
        if counts.num_types() != 0 && self.type_index.len() != counts.num_types() {
            return Err(ReadError::Inconsistent("the type index does not fit the counts"))
        }
        if !counts.is_consistent() {
            return Err(ReadError::Inconsistent("the count totals differ from the tables"))
        }
        match &self.priors {
            None if self.trained => Err(ReadError::Inconsistent("a trained model needs priors")),
            Some(priors) if !priors.alpha.fits(counts.num_topics(), counts.num_words())
                || !priors.beta.fits(counts.num_topics(), counts.num_words()) => {
                Err(ReadError::Inconsistent("the priors do not fit the counts"))
            }
            _ => Ok(())
        }
    }
}

impl PersistedModelRef<'_> {
    fn write_to(&self, mut out: impl Write) -> Result<(), WriteError> {
        out.write_all(MODEL_MAGIC)?;
        bincode::serialize_into(&mut out, &(ModelFormatVersion::V1 as u16))?;
        bincode::serialize_into(&mut out, self)?;
        out.flush()?;
        Ok(())
    }

    fn write(&self, path: &Path) -> Result<(), WriteError> {
        let compress = is_gzip(path);
        write_atomically(path, |out| {
            if compress {
                let mut encoder = flate2::write::GzEncoder::new(out, Compression::default());
                self.write_to(&mut encoder)?;
                encoder.finish()?;
                Ok(())
            } else {
                self.write_to(out)
            }
        })
    }
}

/// The state of a running training, written like a trained model.
pub(super) struct Checkpoint<'a> {
    pub priors: &'a Priors,
    pub num_regular_topics: usize,
    pub topic_index: &'a StringVocabulary,
    pub type_index: &'a StringVocabulary,
    pub word_index: &'a StringVocabulary,
    pub counts: &'a CountModel,
    pub random: &'a Randoms,
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == "gz")
}

impl GibbsTopicModel {
    fn as_record(&self) -> PersistedModelRef<'_> {
        PersistedModelRef {
            config: &self.config,
            priors: self.priors.as_ref(),
            num_regular_topics: self.num_regular_topics,
            topic_index: &self.topic_index,
            type_index: &self.type_index,
            word_index: &self.word_index,
            counts: &self.counts,
            random: self.random.state(),
            trained: self.trained,
        }
    }

    /// Writes the model to `path`, gzip compressed if the path ends with `.gz`.
    /// The file is replaced atomically.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), WriteError> {
        let path = path.as_ref();
        self.as_record().write(path)?;
        log::info!("Saved the model to {}", path.display());
        Ok(())
    }

    /// Writes the header and the bincode record to `out`.
    pub fn write_to(&self, out: impl Write) -> Result<(), WriteError> {
        self.as_record().write_to(out)
    }

    /// Writes `checkpoint` with the config of this model to `path`, it reads
    /// back as a trained model.
    pub(super) fn write_checkpoint(&self, path: &Path, checkpoint: Checkpoint) -> Result<(), WriteError> {
        let record = PersistedModelRef {
            config: &self.config,
            priors: Some(checkpoint.priors),
            num_regular_topics: checkpoint.num_regular_topics,
            topic_index: checkpoint.topic_index,
            type_index: checkpoint.type_index,
            word_index: checkpoint.word_index,
            counts: checkpoint.counts,
            random: checkpoint.random.state(),
            trained: true,
        };
        record.write(path)?;
        log::info!("Saved a checkpoint to {}", path.display());
        Ok(())
    }

    /// Reads a model written by [GibbsTopicModel::write].
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let model = if is_gzip(path) {
            Self::read_from(flate2::read::GzDecoder::new(reader))?
        } else {
            Self::read_from(reader)?
        };
        log::info!("Loaded the model from {}", path.display());
        Ok(model)
    }

    /// Reads a model written by [GibbsTopicModel::write_to].
    pub fn read_from(mut reader: impl Read) -> Result<Self, ReadError> {
        let mut magic = [0u8; 8];
        match reader.read_exact(&mut magic) {
            Ok(()) if &magic == MODEL_MAGIC => {}
            Ok(()) => return Err(ReadError::NotAModel),
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Err(ReadError::NotAModel),
            Err(err) => return Err(err.into()),
        }
        let version: u16 = bincode::deserialize_from(&mut reader)?;
        match ModelFormatVersion::from_repr(version) {
            Some(ModelFormatVersion::V1) => {}
            None => return Err(ReadError::UnsupportedVersion(version)),
        }
        let record: PersistedModel = bincode::deserialize_from(&mut reader)?;
        record.check()?;
        Ok(
            Self {
                config: record.config,
                priors: record.priors,
                num_regular_topics: record.num_regular_topics,
                topic_index: record.topic_index,
                type_index: record.type_index,
                word_index: record.word_index,
                counts: record.counts,
                random: Randoms::from_state(&record.random),
                trained: record.trained,
            }
        )
    }
}

#[cfg(test)]
mod test {
    use crate::config::ModelKind;
    use crate::enums::ReadError;
    use crate::model::test::{config, labeled_corpus};
    use crate::model::GibbsTopicModel;

    #[test]
    fn a_written_model_reads_back_equal(){
        let mut corpus = labeled_corpus();
        let mut model = GibbsTopicModel::new(config(ModelKind::Typed)).unwrap();
        model.train(5, &mut corpus).unwrap();
        let mut data = Vec::new();
        model.write_to(&mut data).unwrap();
        assert!(data.starts_with(b"LDAGIBBS"));
        let read = GibbsTopicModel::read_from(data.as_slice()).unwrap();
        assert_eq!(model, read);
    }

    #[test]
    fn compressed_files_round_trip(){
        let dir = tempfile::tempdir().unwrap();
        let mut corpus = labeled_corpus();
        let mut model = GibbsTopicModel::new(config(ModelKind::Labeled)).unwrap();
        model.train(5, &mut corpus).unwrap();
        for name in ["model.bin", "model.bin.gz"] {
            let path = dir.path().join(name);
            model.write(&path).unwrap();
            assert_eq!(model, GibbsTopicModel::read(&path).unwrap());
        }
    }

    #[test]
    fn garbage_is_not_a_model(){
        assert!(matches!(GibbsTopicModel::read_from(&b"LDA"[..]), Err(ReadError::NotAModel)));
        assert!(matches!(GibbsTopicModel::read_from(&b"NOTAMODELATALL"[..]), Err(ReadError::NotAModel)));
        let mut data = b"LDAGIBBS".to_vec();
        data.extend_from_slice(&7u16.to_le_bytes());
        assert!(matches!(GibbsTopicModel::read_from(data.as_slice()), Err(ReadError::UnsupportedVersion(7))));
    }
}
