use crate::error::SweepError;
use crate::report::SimulationResult;
use crate::scheduler::{IndexedOutcome, SweepOutcome};

/// Reassembles per-point outcomes, delivered in any order, into grid order.
///
/// Each grid index must be delivered exactly once. An abort outcome ends
/// aggregation immediately and everything buffered so far is dropped with
/// the aggregator.
#[derive(Debug)]
pub struct ResultAggregator {
    slots: Vec<Option<SimulationResult>>,
    received: usize,
}

impl ResultAggregator {
    pub fn new(num_points: usize) -> Self {
        Self {
            slots: vec![None; num_points],
            received: 0,
        }
    }

    pub fn accept(&mut self, delivered: IndexedOutcome) -> Result<(), SweepError> {
        let IndexedOutcome { index, outcome } = delivered;
        let expected = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or_else(|| SweepError::Protocol {
            detail: format!("grid index {index} is outside a grid of {expected} points"),
        })?;
        if slot.is_some() {
            return Err(SweepError::Protocol {
                detail: format!("grid index {index} was delivered more than once"),
            });
        }

        let result = match outcome {
            SweepOutcome::Success(record) => SimulationResult::Success(record),
            SweepOutcome::Failure(record) => SimulationResult::Failure(record),
            SweepOutcome::Aborted { point, reason } => {
                return Err(SweepError::Aborted {
                    index,
                    point,
                    reason,
                })
            }
        };
        *slot = Some(result);
        self.received += 1;
        Ok(())
    }

    pub fn received(&self) -> usize {
        self.received
    }

    pub fn expected(&self) -> usize {
        self.slots.len()
    }

    pub fn is_complete(&self) -> bool {
        self.received == self.slots.len()
    }

    pub fn finish(self) -> Result<Vec<SimulationResult>, SweepError> {
        let incomplete = SweepError::Incomplete {
            received: self.received,
            expected: self.slots.len(),
        };
        if !self.is_complete() {
            return Err(incomplete);
        }
        self.slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or(incomplete)
    }
}

/// Drains `outcomes` into a grid-ordered result list.
pub fn aggregate(
    num_points: usize,
    outcomes: impl IntoIterator<Item = IndexedOutcome>,
) -> Result<Vec<SimulationResult>, SweepError> {
    let mut aggregator = ResultAggregator::new(num_points);
    for delivered in outcomes {
        aggregator.accept(delivered)?;
    }
    aggregator.finish()
}
