//! Multiple-choice quiz sheet generation.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::catalog::{City, CityCatalog, Difficulty};

/// Full sheet size: one correct answer plus three distractors.
pub const QUIZ_OPTION_COUNT: usize = 4;
const DISTRACTOR_COUNT: usize = QUIZ_OPTION_COUNT - 1;

/// Option names stored inline; a full sheet never allocates.
pub type QuizOptions = SmallVec<[String; QUIZ_OPTION_COUNT]>;

/// A shuffled option set with the recorded position of the correct answer.
///
/// Invariant: exactly one option equals the target name, and
/// `correct_index` always points at it. The index is recovered by reverse
/// lookup after the shuffle, never by replaying randomness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSheet {
    options: QuizOptions,
    correct_index: usize,
}

impl QuizSheet {
    /// Build a sheet for the target city. Distractors are drawn uniformly
    /// without replacement from catalog cities at or below the ceiling,
    /// excluding the target. When the pool holds fewer than three cities
    /// the sheet simply carries fewer options.
    pub fn build<R: Rng>(
        target: &City,
        catalog: &CityCatalog,
        ceiling: Difficulty,
        rng: &mut R,
    ) -> Self {
        let target_folded = target.name.to_lowercase();
        let pool: Vec<&City> = catalog
            .filtered(ceiling)
            .into_iter()
            .filter(|city| city.name.to_lowercase() != target_folded)
            .collect();

        let mut options: QuizOptions = pool
            .choose_multiple(rng, DISTRACTOR_COUNT)
            .map(|city| city.name.clone())
            .collect();
        options.push(target.name.clone());
        options.as_mut_slice().shuffle(rng);

        let correct_index = options
            .iter()
            .position(|name| name == &target.name)
            .expect("target name is always appended before the shuffle");

        Self {
            options,
            correct_index,
        }
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub const fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn correct_name(&self) -> &str {
        &self.options[self.correct_index]
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub const fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
