use serde::Serialize;
use sweep_core::{ParameterPoint, Report};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDesign {
    pub rank: usize,
    pub index: usize,
    pub point: ParameterPoint,
    pub uptime_fraction: f64,
    pub uptime_hours: u64,
}

/// Feasible designs ordered by uptime, best first. Equal uptimes keep grid
/// order.
pub fn rank_by_uptime(report: &Report) -> Vec<RankedDesign> {
    let mut successes: Vec<_> = report.successes().collect();
    successes.sort_by(|(a_index, a), (b_index, b)| {
        b.uptime_fraction
            .total_cmp(&a.uptime_fraction)
            .then(a_index.cmp(b_index))
    });

    successes
        .into_iter()
        .enumerate()
        .map(|(position, (index, record))| RankedDesign {
            rank: position + 1,
            index,
            point: record.point.clone(),
            uptime_fraction: record.uptime_fraction,
            uptime_hours: record.uptime_hours,
        })
        .collect()
}

pub fn best_design(report: &Report) -> Option<RankedDesign> {
    rank_by_uptime(report).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_reports::{empty_report, mixed_report};

    #[test]
    fn test_rank_by_uptime_breaks_ties_by_grid_index() {
        let ranked = rank_by_uptime(&mixed_report());
        let order: Vec<_> = ranked.iter().map(|design| (design.rank, design.index)).collect();
        assert_eq!(order, vec![(1, 1), (2, 3), (3, 0)]);
    }

    #[test]
    fn test_best_design() {
        let best = best_design(&mixed_report()).unwrap();
        assert_eq!(best.point.get("strings"), Some(5));
        assert!(best_design(&empty_report()).is_none());
    }
}
