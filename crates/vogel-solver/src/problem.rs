use rust_decimal::Decimal;
use thiserror::Error;

use crate::snapshot::{Cell, Snapshot};

/// Rejected input, raised once at construction. No snapshot is ever built
/// from a problem that fails validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidProblem {
    #[error("tariff matrix must have at least one row and one column")]
    EmptyMatrix,
    #[error("tariff matrix row {row} has {found} columns, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("supply vector has {found} entries, expected {expected}")]
    SupplyLength { expected: usize, found: usize },
    #[error("demand vector has {found} entries, expected {expected}")]
    DemandLength { expected: usize, found: usize },
    #[error("tariff cannot be less than 1, got {tariff} at row {row}, column {column}")]
    NonPositiveTariff {
        row: usize,
        column: usize,
        tariff: i32,
    },
    #[error("supply cannot be negative, got {value} at index {index}")]
    NegativeSupply { index: usize, value: Decimal },
    #[error("demand cannot be negative, got {value} at index {index}")]
    NegativeDemand { index: usize, value: Decimal },
    #[error("total supply {supply} does not cover total demand {demand}")]
    InsufficientSupply { supply: Decimal, demand: Decimal },
}

/// A validated transportation problem: one tariff per (supplier, consumer)
/// pair, supply capacities per supplier, demand requirements per consumer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TransportProblem {
    tariffs: Vec<Vec<i32>>,
    supply: Vec<Decimal>,
    demand: Vec<Decimal>,
}

impl TransportProblem {
    pub fn new(
        tariffs: Vec<Vec<i32>>,
        supply: Vec<Decimal>,
        demand: Vec<Decimal>,
    ) -> Result<Self, InvalidProblem> {
        let rows = tariffs.len();
        let columns = tariffs.first().map(Vec::len).unwrap_or(0);
        if rows == 0 || columns == 0 {
            return Err(InvalidProblem::EmptyMatrix);
        }
        for (row, line) in tariffs.iter().enumerate() {
            if line.len() != columns {
                return Err(InvalidProblem::RaggedMatrix {
                    row,
                    expected: columns,
                    found: line.len(),
                });
            }
        }
        if supply.len() != rows {
            return Err(InvalidProblem::SupplyLength {
                expected: rows,
                found: supply.len(),
            });
        }
        if demand.len() != columns {
            return Err(InvalidProblem::DemandLength {
                expected: columns,
                found: demand.len(),
            });
        }
        for (row, line) in tariffs.iter().enumerate() {
            for (column, &tariff) in line.iter().enumerate() {
                if tariff <= 0 {
                    return Err(InvalidProblem::NonPositiveTariff {
                        row,
                        column,
                        tariff,
                    });
                }
            }
        }
        for (index, &value) in supply.iter().enumerate() {
            if value < Decimal::ZERO {
                return Err(InvalidProblem::NegativeSupply { index, value });
            }
        }
        for (index, &value) in demand.iter().enumerate() {
            if value < Decimal::ZERO {
                return Err(InvalidProblem::NegativeDemand { index, value });
            }
        }
        let supply_total: Decimal = supply.iter().copied().sum();
        let demand_total: Decimal = demand.iter().copied().sum();
        if supply_total < demand_total {
            return Err(InvalidProblem::InsufficientSupply {
                supply: supply_total,
                demand: demand_total,
            });
        }

        Ok(Self {
            tariffs,
            supply,
            demand,
        })
    }

    pub fn rows(&self) -> usize {
        self.tariffs.len()
    }

    pub fn columns(&self) -> usize {
        self.tariffs[0].len()
    }

    pub fn tariff(&self, row: usize, column: usize) -> i32 {
        self.tariffs[row][column]
    }

    pub fn supply(&self) -> &[Decimal] {
        &self.supply
    }

    pub fn demand(&self) -> &[Decimal] {
        &self.demand
    }

    /// Step 0 of the allocation chain: every cell open with nothing
    /// allocated, remaining supply at full capacity.
    pub fn initial_snapshot(&self) -> Snapshot {
        let cells = self
            .tariffs
            .iter()
            .map(|line| line.iter().map(|&tariff| Cell::open(tariff)).collect())
            .collect();
        Snapshot::new(cells, self.supply.clone(), self.demand.clone(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_valid_problem() {
        let problem = TransportProblem::new(
            vec![vec![4, 6, 8], vec![3, 5, 2]],
            vec![dec!(20), dec!(30)],
            vec![dec!(10), dec!(25), dec!(15)],
        )
        .unwrap();

        assert_eq!(problem.rows(), 2);
        assert_eq!(problem.columns(), 3);
        assert_eq!(problem.tariff(1, 2), 2);

        let snapshot = problem.initial_snapshot();
        assert_eq!(snapshot.step_number(), 0);
        assert!(!snapshot.is_complete());
        for row in 0..2 {
            for column in 0..3 {
                let cell = snapshot.cell(row, column);
                assert!(!cell.is_closed());
                assert_eq!(cell.allocated(), Decimal::ZERO);
            }
        }
    }

    #[test]
    fn test_empty_matrix() {
        let result = TransportProblem::new(vec![], vec![], vec![]);
        assert_eq!(result.unwrap_err(), InvalidProblem::EmptyMatrix);

        let result = TransportProblem::new(vec![vec![]], vec![dec!(1)], vec![]);
        assert_eq!(result.unwrap_err(), InvalidProblem::EmptyMatrix);
    }

    #[test]
    fn test_ragged_matrix() {
        let result = TransportProblem::new(
            vec![vec![1, 2], vec![3]],
            vec![dec!(1), dec!(1)],
            vec![dec!(1), dec!(1)],
        );
        assert_eq!(
            result.unwrap_err(),
            InvalidProblem::RaggedMatrix {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_length_mismatches() {
        let result = TransportProblem::new(
            vec![vec![1, 2]],
            vec![dec!(1), dec!(1)],
            vec![dec!(1), dec!(1)],
        );
        assert_eq!(
            result.unwrap_err(),
            InvalidProblem::SupplyLength {
                expected: 1,
                found: 2
            }
        );

        let result = TransportProblem::new(vec![vec![1, 2]], vec![dec!(2)], vec![dec!(1)]);
        assert_eq!(
            result.unwrap_err(),
            InvalidProblem::DemandLength {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_non_positive_tariff() {
        let result = TransportProblem::new(
            vec![vec![4, 0]],
            vec![dec!(10)],
            vec![dec!(5), dec!(5)],
        );
        assert_eq!(
            result.unwrap_err(),
            InvalidProblem::NonPositiveTariff {
                row: 0,
                column: 1,
                tariff: 0
            }
        );
    }

    #[test]
    fn test_negative_quantities() {
        let result = TransportProblem::new(
            vec![vec![1, 1]],
            vec![dec!(-3)],
            vec![dec!(1), dec!(1)],
        );
        assert_eq!(
            result.unwrap_err(),
            InvalidProblem::NegativeSupply {
                index: 0,
                value: dec!(-3)
            }
        );

        let result = TransportProblem::new(
            vec![vec![1, 1]],
            vec![dec!(10)],
            vec![dec!(1), dec!(-1)],
        );
        assert_eq!(
            result.unwrap_err(),
            InvalidProblem::NegativeDemand {
                index: 1,
                value: dec!(-1)
            }
        );
    }

    #[test]
    fn test_insufficient_supply() {
        let result = TransportProblem::new(vec![vec![1]], vec![dec!(5)], vec![dec!(10)]);
        assert_eq!(
            result.unwrap_err(),
            InvalidProblem::InsufficientSupply {
                supply: dec!(5),
                demand: dec!(10)
            }
        );
    }
}
