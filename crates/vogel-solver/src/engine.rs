use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::problem::TransportProblem;
use crate::snapshot::{Cell, Snapshot};

/// The row or column whose penalty won the selection scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Row(usize),
    Column(usize),
}

impl Target {
    /// Resolve the winning line to a concrete cell: the open cell with the
    /// smallest tariff, scanned in index order. Only a strictly greater
    /// tariff is skipped, so a later equal tariff replaces the held index.
    fn resolve(self, snapshot: &Snapshot) -> Option<(usize, usize)> {
        match self {
            Target::Row(row) => {
                let mut best: Option<(usize, i32)> = None;
                for (column, cell) in snapshot.cells[row].iter().enumerate() {
                    if cell.is_closed() {
                        continue;
                    }
                    match best {
                        Some((_, tariff)) if cell.tariff() > tariff => {}
                        _ => best = Some((column, cell.tariff())),
                    }
                }
                best.map(|(column, _)| (row, column))
            }
            Target::Column(column) => {
                let mut best: Option<(usize, i32)> = None;
                for (row, line) in snapshot.cells.iter().enumerate() {
                    let cell = line[column];
                    if cell.is_closed() {
                        continue;
                    }
                    match best {
                        Some((_, tariff)) if cell.tariff() > tariff => {}
                        _ => best = Some((row, cell.tariff())),
                    }
                }
                best.map(|(row, _)| (row, column))
            }
        }
    }
}

/// Pick the line with the largest penalty. Columns are scanned before rows
/// and only a strictly greater penalty replaces the running best, so the
/// earliest maximal entry wins and a column beats a row of equal penalty.
fn select_target(snapshot: &Snapshot) -> Option<Target> {
    let mut current = -1;
    let mut target = None;

    for (column, penalty) in snapshot.col_penalties.iter().enumerate() {
        if let Some(penalty) = *penalty {
            if current < penalty {
                current = penalty;
                target = Some(Target::Column(column));
            }
        }
    }
    for (row, penalty) in snapshot.row_penalties.iter().enumerate() {
        if let Some(penalty) = *penalty {
            if current < penalty {
                current = penalty;
                target = Some(Target::Row(row));
            }
        }
    }

    target
}

fn close_row(cells: &mut [Vec<Cell>], row: usize) {
    for cell in &mut cells[row] {
        *cell = cell.close();
    }
}

fn close_column(cells: &mut [Vec<Cell>], column: usize) {
    for line in cells.iter_mut() {
        line[column] = line[column].close();
    }
}

impl Snapshot {
    /// Derive the next snapshot in the chain, or `None` once every cell is
    /// closed. Each step allocates into exactly one cell and closes its
    /// exhausted row, column, or both, so the chain is finite.
    pub fn next_step(&self) -> Option<Snapshot> {
        if self.is_complete() {
            return None;
        }

        let target = select_target(self)?;
        let (row, column) = target.resolve(self)?;

        let mut cells = self.cells.clone();
        let mut remaining_supply = self.remaining_supply.clone();

        let column_allocated: Decimal = self
            .cells
            .iter()
            .map(|line| line[column].allocated())
            .sum();
        let demand_left = self.demand[column] - column_allocated;
        let stored = remaining_supply[row];

        if stored > demand_left {
            cells[row][column] = cells[row][column].allocate(demand_left);
            remaining_supply[row] -= demand_left;
            close_column(&mut cells, column);
            debug!(step = self.step_number, row, column, quantity = %demand_left, "column satisfied");
        } else if stored == demand_left {
            cells[row][column] = cells[row][column].allocate(demand_left);
            remaining_supply[row] = Decimal::ZERO;
            close_column(&mut cells, column);
            close_row(&mut cells, row);
            debug!(step = self.step_number, row, column, quantity = %demand_left, "row and column exhausted together");
        } else {
            cells[row][column] = cells[row][column].allocate(stored);
            remaining_supply[row] = Decimal::ZERO;
            close_row(&mut cells, row);
            debug!(step = self.step_number, row, column, quantity = %stored, "row exhausted");
        }

        let next = Snapshot::new(
            cells,
            remaining_supply,
            self.demand.clone(),
            self.step_number + 1,
        );
        trace!(
            step = next.step_number,
            row_penalties = ?next.row_penalties,
            col_penalties = ?next.col_penalties,
        );
        Some(next)
    }
}

/// Iterator over the snapshot chain, initial snapshot first. Ends with the
/// first complete snapshot.
pub struct Steps {
    next: Option<Snapshot>,
}

impl Steps {
    pub(crate) fn new(initial: Snapshot) -> Self {
        Self {
            next: Some(initial),
        }
    }
}

impl Iterator for Steps {
    type Item = Snapshot;

    fn next(&mut self) -> Option<Snapshot> {
        let current = self.next.take()?;
        self.next = current.next_step();
        Some(current)
    }
}

impl TransportProblem {
    /// Walk the full allocation chain from the initial snapshot.
    pub fn snapshots(&self) -> Steps {
        Steps::new(self.initial_snapshot())
    }
}
