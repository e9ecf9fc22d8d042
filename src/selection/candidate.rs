use std::{cmp::Ordering, sync::Arc};

use crate::selection::{
    error::{SelectorError, ambiguous_action},
    ports::ValueProvider,
    types::ActionDescriptor,
};

/// Tie-break score. A greater score is a better match: more satisfied
/// parameters first, then fewer satisfied optional parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CandidateScore {
    pub found_parameters: usize,
    pub found_optional_parameters: usize,
}

impl Ord for CandidateScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.found_parameters
            .cmp(&other.found_parameters)
            .then_with(|| {
                other
                    .found_optional_parameters
                    .cmp(&self.found_optional_parameters)
            })
    }
}

impl PartialOrd for CandidateScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub action: Arc<ActionDescriptor>,
    pub score: CandidateScore,
}

impl Candidate {
    /// Returns `None` when a required, non-body parameter has no value in
    /// any provider.
    pub fn evaluate(
        action: &Arc<ActionDescriptor>,
        value_providers: &[Arc<dyn ValueProvider>],
    ) -> Option<Self> {
        let mut score = CandidateScore::default();

        for parameter in action
            .parameters
            .iter()
            .filter(|parameter| !parameter.binding.is_from_body)
        {
            let found = value_providers
                .iter()
                .any(|provider| provider.contains_prefix(&parameter.binding.prefix));

            if found {
                score.found_parameters += 1;
                if parameter.binding.is_optional {
                    score.found_optional_parameters += 1;
                }
            } else if !parameter.binding.is_optional {
                return None;
            }
        }

        Some(Self {
            action: Arc::clone(action),
            score,
        })
    }
}

/// Single-pass tracker of the best score seen and every candidate tied at it.
#[derive(Debug, Default)]
pub struct BestCandidates {
    best: Option<CandidateScore>,
    tied: Vec<Candidate>,
}

impl BestCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, candidate: Candidate) {
        let ordering = match self.best {
            Some(best) => candidate.score.cmp(&best),
            None => Ordering::Greater,
        };

        match ordering {
            Ordering::Greater => {
                self.best = Some(candidate.score);
                self.tied.clear();
                self.tied.push(candidate);
            }
            Ordering::Equal => self.tied.push(candidate),
            Ordering::Less => {}
        }
    }

    pub fn best_score(&self) -> Option<CandidateScore> {
        self.best
    }

    pub fn tied(&self) -> &[Candidate] {
        &self.tied
    }

    /// Empty tracker resolves to no match rather than an error.
    pub fn resolve(mut self) -> Result<Option<Arc<ActionDescriptor>>, SelectorError> {
        match self.tied.len() {
            0 => Ok(None),
            1 => Ok(self.tied.pop().map(|candidate| candidate.action)),
            _ => Err(ambiguous_action(
                self.tied
                    .into_iter()
                    .map(|candidate| candidate.action.id.clone())
                    .collect(),
            )),
        }
    }
}
