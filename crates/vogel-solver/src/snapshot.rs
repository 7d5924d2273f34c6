use std::fmt;

use rust_decimal::Decimal;

/// One (supplier, consumer) pairing in the allocation grid.
///
/// Cells are values: `allocate` and `close` return fresh copies, so a grid
/// cloned for the next step never edits state shared with its predecessor.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    tariff: i32,
    allocated: Decimal,
    closed: bool,
}

impl Cell {
    pub(crate) fn open(tariff: i32) -> Self {
        Self {
            tariff,
            allocated: Decimal::ZERO,
            closed: false,
        }
    }

    pub fn tariff(&self) -> i32 {
        self.tariff
    }

    pub fn allocated(&self) -> Decimal {
        self.allocated
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn allocate(self, quantity: Decimal) -> Self {
        Self {
            allocated: self.allocated + quantity,
            ..self
        }
    }

    pub(crate) fn close(self) -> Self {
        Self {
            closed: true,
            ..self
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.tariff, self.allocated)
    }
}

/// One complete allocation state: the grid, the remaining capacity per
/// supplier, the fixed demand per consumer, and the penalties recomputed
/// for this state. Snapshots are never mutated after construction; the
/// chain advances by deriving the next snapshot from the previous one.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub(crate) cells: Vec<Vec<Cell>>,
    pub(crate) remaining_supply: Vec<Decimal>,
    pub(crate) demand: Vec<Decimal>,
    pub(crate) step_number: u32,
    pub(crate) row_penalties: Vec<Option<i32>>,
    pub(crate) col_penalties: Vec<Option<i32>>,
    pub(crate) is_complete: bool,
}

impl Snapshot {
    pub(crate) fn new(
        cells: Vec<Vec<Cell>>,
        remaining_supply: Vec<Decimal>,
        demand: Vec<Decimal>,
        step_number: u32,
    ) -> Self {
        let rows = cells.len();
        let columns = cells.first().map(Vec::len).unwrap_or(0);
        let is_complete = cells.iter().flatten().all(Cell::is_closed);

        let row_penalties = (0..rows)
            .map(|row| {
                let (first, second) = two_smallest(
                    cells[row]
                        .iter()
                        .filter(|cell| !cell.is_closed())
                        .map(Cell::tariff),
                );
                penalty_diff(first, second)
            })
            .collect();
        // Columns intentionally use the same two-smallest scan as rows.
        let col_penalties = (0..columns)
            .map(|column| {
                let (first, second) = two_smallest(
                    cells
                        .iter()
                        .map(|line| &line[column])
                        .filter(|cell| !cell.is_closed())
                        .map(Cell::tariff),
                );
                penalty_diff(first, second)
            })
            .collect();

        Self {
            cells,
            remaining_supply,
            demand,
            step_number,
            row_penalties,
            col_penalties,
            is_complete,
        }
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn columns(&self) -> usize {
        self.cells.first().map(Vec::len).unwrap_or(0)
    }

    pub fn cell(&self, row: usize, column: usize) -> Cell {
        self.cells[row][column]
    }

    pub fn step_number(&self) -> u32 {
        self.step_number
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn remaining_supply(&self) -> &[Decimal] {
        &self.remaining_supply
    }

    pub fn demand(&self) -> &[Decimal] {
        &self.demand
    }

    /// `None` once the row has no open cells left.
    pub fn row_penalty(&self, row: usize) -> Option<i32> {
        self.row_penalties[row]
    }

    /// `None` once the column has no open cells left.
    pub fn column_penalty(&self, column: usize) -> Option<i32> {
        self.col_penalties[column]
    }

    /// Total cost of the allocations in this snapshot.
    pub fn total_cost(&self) -> Decimal {
        self.cells
            .iter()
            .flatten()
            .map(|cell| cell.allocated() * Decimal::from(cell.tariff()))
            .sum()
    }

    /// The nonzero `(tariff, allocated)` pairs in row-major order, for the
    /// final cost breakdown.
    pub fn allocation_terms(&self) -> Vec<(i32, Decimal)> {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| cell.allocated() != Decimal::ZERO)
            .map(|cell| (cell.tariff(), cell.allocated()))
            .collect()
    }
}

/// Single scan tracking the smallest and next-smallest tariff seen so far.
/// An equal value never displaces `first`, but fills or improves `second`.
fn two_smallest<I>(tariffs: I) -> (Option<i32>, Option<i32>)
where
    I: IntoIterator<Item = i32>,
{
    let mut first = None;
    let mut second = None;
    for tariff in tariffs {
        match first {
            None => first = Some(tariff),
            Some(best) if tariff < best => {
                second = first;
                first = Some(tariff);
            }
            _ => match second {
                Some(next) if tariff >= next => {}
                _ => second = Some(tariff),
            },
        }
    }
    (first, second)
}

/// Penalty of a line from its two extreme tariffs: absent values propagate,
/// a single value is its own penalty, two values give their absolute
/// difference.
fn penalty_diff(first: Option<i32>, second: Option<i32>) -> Option<i32> {
    match (first, second) {
        (None, second) => second,
        (first, None) => first,
        (Some(first), Some(second)) => Some((first - second).abs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_penalty_diff_absence_algebra() {
        assert_eq!(penalty_diff(None, None), None);
        assert_eq!(penalty_diff(Some(7), None), Some(7));
        assert_eq!(penalty_diff(None, Some(7)), Some(7));
        assert_eq!(penalty_diff(Some(3), Some(8)), Some(5));
        assert_eq!(penalty_diff(Some(8), Some(3)), Some(5));
    }

    #[test]
    fn test_two_smallest() {
        assert_eq!(two_smallest([]), (None, None));
        assert_eq!(two_smallest([9]), (Some(9), None));
        assert_eq!(two_smallest([5, 3, 4]), (Some(3), Some(4)));
        assert_eq!(two_smallest([3, 5, 2]), (Some(2), Some(3)));
        // An equal value fills second but never displaces first.
        assert_eq!(two_smallest([4, 4]), (Some(4), Some(4)));
        assert_eq!(two_smallest([4, 6, 4]), (Some(4), Some(4)));
    }

    #[test]
    fn test_initial_penalties() {
        let cells = vec![
            vec![Cell::open(4), Cell::open(6), Cell::open(8)],
            vec![Cell::open(3), Cell::open(5), Cell::open(2)],
        ];
        let snapshot = Snapshot::new(
            cells,
            vec![dec!(20), dec!(30)],
            vec![dec!(10), dec!(25), dec!(15)],
            0,
        );

        assert_eq!(snapshot.row_penalty(0), Some(2));
        assert_eq!(snapshot.row_penalty(1), Some(1));
        // Column penalties come from the same two-smallest statistic.
        assert_eq!(snapshot.column_penalty(0), Some(1));
        assert_eq!(snapshot.column_penalty(1), Some(1));
        assert_eq!(snapshot.column_penalty(2), Some(6));
    }

    #[test]
    fn test_single_open_cell_penalty_is_its_tariff() {
        let cells = vec![vec![Cell::open(6), Cell::open(9).close()]];
        let snapshot = Snapshot::new(cells, vec![dec!(10)], vec![dec!(5), dec!(5)], 3);

        assert_eq!(snapshot.row_penalty(0), Some(6));
        assert_eq!(snapshot.column_penalty(0), Some(6));
        assert_eq!(snapshot.column_penalty(1), None);
    }

    #[test]
    fn test_cell_display() {
        let cell = Cell::open(4);
        assert_eq!(cell.to_string(), "4|0");
        assert_eq!(cell.allocate(dec!(2.5)).to_string(), "4|2.5");
    }

    #[test]
    fn test_total_cost_and_terms() {
        let cells = vec![
            vec![Cell::open(4).allocate(dec!(10)), Cell::open(6)],
            vec![Cell::open(3), Cell::open(5).allocate(dec!(7))],
        ];
        let snapshot = Snapshot::new(
            cells,
            vec![dec!(10), dec!(13)],
            vec![dec!(10), dec!(7)],
            1,
        );

        assert_eq!(snapshot.total_cost(), dec!(75));
        assert_eq!(
            snapshot.allocation_terms(),
            vec![(4, dec!(10)), (5, dec!(7))]
        );
    }
}
