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

use std::io::Write;
use ldagibbs_toolkit::id_sorter::sort_ids_by_value;
use crate::corpus::{Corpus, Document};
use crate::model::{GibbsTopicModel, ModelError};
use crate::{Count, DocumentTo, Probability, TopicId, TopicTo, WordId};

impl GibbsTopicModel {
    /// The smoothed topic proportions of `document`, sorted descending with ties
    /// broken by the higher topic id. Ends before the first zero proportion.
    pub fn topic_distribution(&self, document: &Document) -> Result<Vec<(TopicId, Probability)>, ModelError> {
        let priors = self.priors.as_ref().ok_or(ModelError::NotTrained)?;
        let num_words = self.num_words();
        let counts = document.topic_counts(self.num_topics(), num_words);
        let norm = document.assigned_len(num_words) as f64 + priors.alpha_sum;
        let sorted = sort_ids_by_value(
            counts
                .iter()
                .enumerate()
                .map(|(topic, &count)| (priors.alpha(topic) + count as f64) / norm)
        );
        Ok(
            sorted
                .into_iter()
                .take_while(|value| value.value != 0.0)
                .map(|value| (value.id, value.value))
                .collect()
        )
    }

    /// The topic distributions of all documents in `corpus`.
    pub fn topic_distributions(&self, corpus: &Corpus) -> Result<DocumentTo<Vec<(TopicId, Probability)>>, ModelError> {
        corpus.iter().map(|document| self.topic_distribution(document)).collect()
    }

    /// Writes one line `source \t topic proportion topic proportion ...` per document.
    pub fn write_topic_distributions(&self, out: &mut impl Write, corpus: &Corpus) -> Result<(), ModelError> {
        out.write_all(b"source\ttopic:proportion...\n")?;
        for document in corpus.iter() {
            let distribution = self.topic_distribution(document)?;
            let entries: Vec<String> = distribution
                .into_iter()
                .map(|(topic, proportion)| Ok::<_, ModelError>(format!("{} {proportion}", self.topic_label(topic)?)))
                .collect::<Result<_, _>>()?;
            writeln!(out, "{}\t{}", document.source(), entries.join(" "))?;
        }
        out.flush()?;
        Ok(())
    }

    /// The `n` most frequent words of every topic with their counts, sorted
    /// descending with ties broken by the higher word id.
    pub fn topic_words(&self, n: usize) -> TopicTo<Vec<(WordId, Count)>> {
        (0..self.num_topics())
            .map(|topic| {
                sort_ids_by_value(self.counts.topic_word_counts(topic).map(f64::from))
                    .into_iter()
                    .take(n)
                    .map(|value| (value.id, self.counts.word_topic_count(value.id, topic)))
                    .collect()
            })
            .collect()
    }

    /// Writes one line `topic count: n word:count word:count ...` per topic.
    pub fn write_topic_words(&self, out: &mut impl Write, n: usize) -> Result<(), ModelError> {
        for (topic, words) in self.topic_words(n).into_iter().enumerate() {
            write!(out, "{} count: {}", self.topic_label(topic)?, self.counts.topic_count(topic))?;
            for (word, count) in words {
                write!(out, " {}:{count}", self.word(word)?)?;
            }
            writeln!(out)?;
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::config::ModelKind;
    use crate::corpus::Corpus;
    use crate::model::test::{config, labeled_corpus};
    use crate::model::{GibbsTopicModel, ModelError};

    #[test]
    fn distributions_are_sorted_and_sum_to_one(){
        let mut corpus = labeled_corpus();
        let mut model = GibbsTopicModel::new(config(ModelKind::Labeled)).unwrap();
        model.train(5, &mut corpus).unwrap();
        let distributions = model.topic_distributions(&corpus).unwrap();
        assert_eq!(corpus.len(), distributions.len());
        for distribution in distributions {
            assert_eq!(model.num_topics(), distribution.len());
            assert!(distribution.windows(2).all(|pair| pair[0].1 >= pair[1].1));
            approx::assert_relative_eq!(1.0, distribution.iter().map(|(_, value)| value).sum::<f64>(), epsilon = 1e-9);
        }
    }

    #[test]
    fn the_proportions_are_smoothed_counts(){
        let mut corpus = Corpus::new();
        corpus.add_document("only", [], ["a"], "x x y".split_whitespace());
        corpus.add_document("other", [], ["b"], "z".split_whitespace());
        let mut model = GibbsTopicModel::new(config(ModelKind::Labeled)).unwrap();
        model.train(3, &mut corpus).unwrap();
        let distribution = model.topic_distribution(&corpus.documents()[0]).unwrap();
        // alpha 0.1 for both topics, three tokens of topic a.
        assert_eq!(0, distribution[0].0);
        approx::assert_relative_eq!(3.1 / 3.2, distribution[0].1);
        approx::assert_relative_eq!(0.1 / 3.2, distribution[1].1);
    }

    #[test]
    fn reports_have_the_expected_layout(){
        let mut corpus = labeled_corpus();
        let mut model = GibbsTopicModel::new(config(ModelKind::Labeled)).unwrap();
        assert!(matches!(
            model.write_topic_distributions(&mut Vec::<u8>::new(), &corpus),
            Err(ModelError::NotTrained)
        ));
        model.train(5, &mut corpus).unwrap();

        let mut out = Vec::new();
        model.write_topic_distributions(&mut out, &corpus).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!("source\ttopic:proportion...", lines[0]);
        assert_eq!(corpus.len() + 1, lines.len());
        assert!(lines[1].starts_with("news-1\t"));
        assert_eq!(model.num_topics() * 2, lines[1].split('\t').nth(1).unwrap().split(' ').count());

        let mut out = Vec::new();
        model.write_topic_words(&mut out, 2).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(model.num_topics(), text.lines().count());
        let first = text.lines().next().unwrap();
        assert!(first.starts_with("politics count: "));
        assert_eq!(2, first.split(' ').skip(3).count());
        assert!(first.split(' ').skip(3).all(|entry| entry.contains(':')));
    }

    #[test]
    fn topic_words_prefer_frequent_words(){
        let mut corpus = Corpus::new();
        corpus.add_document("a", [], ["only"], "x y y z z z".split_whitespace());
        let mut model = GibbsTopicModel::new(config(ModelKind::Labeled)).unwrap();
        model.train(1, &mut corpus).unwrap();
        let z = model.word_id("z").unwrap();
        let y = model.word_id("y").unwrap();
        assert_eq!(vec![vec![(z, 3), (y, 2)]], model.topic_words(2));
    }
}
