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

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// The position of a [Randoms] stream, enough to continue it exactly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomState {
    pub seed: [u8; 32],
    pub stream: u64,
    pub word_pos: u128,
}

/// The seeded generator behind every stochastic decision of a model.
#[derive(Debug, Clone)]
pub struct Randoms {
    rng: ChaCha8Rng,
}

impl Randoms {
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    pub fn from_state(state: &RandomState) -> Self {
        let mut rng = ChaCha8Rng::from_seed(state.seed);
        rng.set_stream(state.stream);
        rng.set_word_pos(state.word_pos);
        Self { rng }
    }

    pub fn state(&self) -> RandomState {
        RandomState {
            seed: self.rng.get_seed(),
            stream: self.rng.get_stream(),
            word_pos: self.rng.get_word_pos(),
        }
    }

    /// A uniform value in `[0, 1)` with 53 bits of resolution.
    pub fn next_uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// A uniform index in `[0, n)`. `n` must not be zero.
    pub fn next_index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0, "Can not draw from an empty range!");
        self.rng.random_range(0..n)
    }

    /// A uniformly chosen element, `None` for an empty slice.
    pub fn choice<'a, T>(&mut self, values: &'a [T]) -> Option<&'a T> {
        if values.is_empty() {
            None
        } else {
            Some(&values[self.next_index(values.len())])
        }
    }
}

impl PartialEq for Randoms {
    fn eq(&self, other: &Self) -> bool {
        self.state() == other.state()
    }
}
