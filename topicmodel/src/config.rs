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

use std::collections::HashSet;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;
use crate::prototypes::PrototypeTopics;
use crate::smoothing::Smoothing;

/// The model variant, decides the topic space and the candidates of a token.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Unsupervised, every token may take every topic.
    Lda,
    /// The labels of a document restrict its topics while training.
    #[default]
    Labeled,
    /// Topics and document types are sampled jointly.
    Typed,
    /// Regular topics plus topics seeded with prototypical words.
    Prototype,
}

impl ModelKind {
    /// Returns true if the topics are defined by the corpus labels.
    pub fn is_supervised(self) -> bool {
        matches!(self, ModelKind::Labeled | ModelKind::Typed)
    }

    pub fn has_types(self) -> bool {
        matches!(self, ModelKind::Typed)
    }
}

/// How the smoothing over the topics of a document is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlphaPrior {
    /// The sum over all topics, every topic gets `sum / num_topics`.
    Sum(f64),
    /// The same value for every topic.
    Symmetric(f64),
    /// One value per topic.
    PerTopic(Vec<f64>),
}

impl Default for AlphaPrior {
    fn default() -> Self {
        AlphaPrior::Symmetric(0.1)
    }
}

impl AlphaPrior {
    /// Resolves the prior for `num_topics` topics into a provider and its sum.
    pub fn resolve(&self, num_topics: usize) -> Result<(Smoothing, f64), ConfigError> {
        if num_topics == 0 {
            return Err(ConfigError::NoTopics)
        }
        match self {
            AlphaPrior::Sum(sum) => {
                check_prior("alpha", *sum)?;
                Ok((Smoothing::Symmetric(*sum / num_topics as f64), *sum))
            }
            AlphaPrior::Symmetric(value) => {
                check_prior("alpha", *value)?;
                Ok((Smoothing::Symmetric(*value), *value * num_topics as f64))
            }
            AlphaPrior::PerTopic(values) => {
                if values.len() != num_topics {
                    return Err(ConfigError::AlphaLength { expected: num_topics, actual: values.len() })
                }
                for &value in values {
                    check_prior("alpha", value)?;
                }
                Ok((Smoothing::PerTopic(values.clone()), values.iter().sum()))
            }
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        match self {
            AlphaPrior::Sum(value) | AlphaPrior::Symmetric(value) => check_prior("alpha", *value),
            AlphaPrior::PerTopic(values) => values.iter().try_for_each(|&value| check_prior("alpha", value)),
        }
    }
}

/// How the tokens of unseen documents get their first assignment.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Display, AsRefStr, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum InferenceInit {
    /// Uniformly from all candidates.
    #[default]
    Random,
    /// The most frequent topic of the word and the most frequent type of that topic.
    PointEstimate,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("The prior {name} has to be finite and greater than zero, but was {value}!")]
    InvalidPrior {
        name: &'static str,
        value: f64,
    },
    #[error("The model needs at least one topic!")]
    NoTopics,
    #[error("A prototype model needs at least one prototype topic!")]
    NoPrototypes,
    #[error("The prototype topic {0} has no words!")]
    EmptyPrototype(String),
    #[error("Expected {expected} alpha values but got {actual}!")]
    AlphaLength {
        expected: usize,
        actual: usize,
    },
    #[error("The prototype topic {0:?} has the name of a regular topic!")]
    PrototypeNameTaken(String),
    #[error("Checkpoints need an interval of at least one iteration!")]
    ZeroCheckpointInterval,
}

/// The label of the regular topic `topic` of the unsupervised kinds.
pub fn regular_topic_label(topic: usize) -> String {
    format!("Topic: {topic}")
}

fn check_prior(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidPrior { name, value })
    }
}

/// The hyperparameters of a model.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct GibbsConfig {
    pub kind: ModelKind,
    pub alpha: AlphaPrior,
    pub beta: f64,
    pub gamma: f64,
    /// The number of topics of the unsupervised kinds, for the prototype
    /// kind the number of regular topics.
    pub num_topics: usize,
    pub prototypes: PrototypeTopics,
    pub seed: u64,
    pub inference_init: InferenceInit,
}

impl Default for GibbsConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::default(),
            alpha: AlphaPrior::default(),
            beta: 0.01,
            gamma: 0.01,
            num_topics: 0,
            prototypes: PrototypeTopics::new(),
            seed: 20,
            inference_init: InferenceInit::default(),
        }
    }
}

impl GibbsConfig {
    pub fn builder() -> GibbsConfigBuilder {
        GibbsConfigBuilder::default()
    }

    /// Checks everything that can be checked without a corpus.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.alpha.check()?;
        check_prior("beta", self.beta)?;
        check_prior("gamma", self.gamma)?;
        match self.kind {
            ModelKind::Lda if self.num_topics == 0 => Err(ConfigError::NoTopics),
            ModelKind::Prototype if self.prototypes.is_empty() => Err(ConfigError::NoPrototypes),
            ModelKind::Prototype => {
                if let Some((name, _)) = self.prototypes.iter().find(|(_, words)| words.is_empty()) {
                    return Err(ConfigError::EmptyPrototype(name.clone()))
                }
                let regular: HashSet<String> = (0..self.num_topics).map(regular_topic_label).collect();
                match self.prototypes.keys().find(|name| regular.contains(*name)) {
                    Some(name) => Err(ConfigError::PrototypeNameTaken(name.clone())),
                    None => Ok(())
                }
            }
            _ => Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;
    use crate::config::{AlphaPrior, ConfigError, GibbsConfig, InferenceInit, ModelKind};
    use crate::prototypes::PrototypeTopics;
    use crate::smoothing::Smoothing;

    #[test]
    fn kinds_parse_case_insensitive(){
        assert_eq!(ModelKind::Typed, ModelKind::from_str("TYPED").unwrap());
        assert_eq!(ModelKind::Prototype, ModelKind::from_str("prototype").unwrap());
        assert_eq!("labeled", ModelKind::Labeled.as_ref());
        assert_eq!(InferenceInit::PointEstimate, InferenceInit::from_str("point-estimate").unwrap());
        assert!(ModelKind::from_str("hdp").is_err());
    }

    #[test]
    fn alpha_resolves_with_its_sum(){
        let (alpha, sum) = AlphaPrior::Sum(1.0).resolve(4).unwrap();
        assert_eq!(Smoothing::Symmetric(0.25), alpha);
        assert_eq!(1.0, sum);
        let (_, sum) = AlphaPrior::Symmetric(0.1).resolve(3).unwrap();
        approx::assert_relative_eq!(0.3, sum);
        assert_eq!(
            Err(ConfigError::AlphaLength { expected: 3, actual: 2 }),
            AlphaPrior::PerTopic(vec![0.1, 0.2]).resolve(3)
        );
    }

    #[test]
    fn validation_rejects_bad_values(){
        let config = GibbsConfig::builder().beta(0.0).build().unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPrior { name: "beta", .. })));
        let config = GibbsConfig::builder().kind(ModelKind::Lda).build().unwrap();
        assert_eq!(Err(ConfigError::NoTopics), config.validate());
        let config = GibbsConfig::builder().kind(ModelKind::Prototype).num_topics(2usize).build().unwrap();
        assert_eq!(Err(ConfigError::NoPrototypes), config.validate());
        assert_eq!(Ok(()), GibbsConfig::default().validate());
    }

    #[test]
    fn prototypes_may_not_shadow_regular_topics(){
        let mut prototypes = PrototypeTopics::new();
        prototypes.insert("Topic: 0".to_string(), vec!["goal".to_string()]);
        prototypes.insert("weather".to_string(), vec!["rain".to_string()]);
        let config = GibbsConfig::builder()
            .kind(ModelKind::Prototype)
            .num_topics(2usize)
            .prototypes(prototypes.clone())
            .build()
            .unwrap();
        assert_eq!(Err(ConfigError::PrototypeNameTaken("Topic: 0".to_string())), config.validate());

        let config = GibbsConfig::builder()
            .kind(ModelKind::Prototype)
            .num_topics(0usize)
            .prototypes(prototypes)
            .build()
            .unwrap();
        assert_eq!(Ok(()), config.validate());
    }

    #[test]
    fn partial_json_uses_the_defaults(){
        let config: GibbsConfig = serde_json::from_str(r#"{"kind": "lda", "num_topics": 5, "alpha": {"Sum": 2.5}}"#).unwrap();
        assert_eq!(ModelKind::Lda, config.kind);
        assert_eq!(AlphaPrior::Sum(2.5), config.alpha);
        assert_eq!(0.01, config.beta);
        assert_eq!(20, config.seed);
    }
}
