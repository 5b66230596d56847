/// Rectangular row-major grid, addressed by (row, col).
///
/// Rectangularity is a construction-time guarantee: `from_rows` refuses
/// ragged input, and no method can change the shape afterwards.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Pos { row, col }
    }
}

/// Movement direction for a single step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    #[cfg(test)]
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// (dRow, dCol)
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T: Copy> Grid<T> {
    /// Build from nested rows. Returns `None` if the rows differ in length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }
        Some(Grid {
            rows: height,
            cols: width,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// (rows, cols)
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    #[inline]
    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    #[inline]
    pub fn get(&self, pos: Pos) -> Option<T> {
        if self.in_bounds(pos) {
            Some(self.cells[pos.row * self.cols + pos.col])
        } else {
            None
        }
    }

    /// Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, pos: Pos, value: T) {
        if self.in_bounds(pos) {
            self.cells[pos.row * self.cols + pos.col] = value;
        }
    }

    /// The neighbour of `pos` in `dir`, or `None` if it falls off the grid.
    pub fn step(&self, pos: Pos, dir: Direction) -> Option<Pos> {
        let (dr, dc) = dir.delta();
        let row = pos.row.checked_add_signed(dr)?;
        let col = pos.col.checked_add_signed(dc)?;
        let next = Pos::new(row, col);
        self.in_bounds(next).then_some(next)
    }

    pub fn row(&self, row: usize) -> &[T] {
        let start = row * self.cols;
        &self.cells[start..start + self.cols]
    }

    /// All cells in row-major order with their positions.
    pub fn iter(&self) -> impl Iterator<Item = (Pos, T)> + '_ {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &v)| (Pos::new(i / cols, i % cols), v))
    }
}

impl<T: Copy + PartialEq> Grid<T> {
    pub fn positions_of(&self, value: T) -> impl Iterator<Item = Pos> + '_ {
        self.iter().filter(move |&(_, v)| v == value).map(|(p, _)| p)
    }

    pub fn count(&self, value: T) -> usize {
        self.cells.iter().filter(|&&v| v == value).count()
    }
}

/// Parse string rows into a grid, mapping each char with `f`.
/// Returns `Err(c)` for the first char `f` rejects, `Ok(None)` for ragged rows.
pub fn parse_rows<T: Copy>(
    rows: &[&str],
    f: impl Fn(char) -> Option<T>,
) -> Result<Option<Grid<T>>, char> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut cells = Vec::with_capacity(row.len());
        for c in row.chars() {
            cells.push(f(c).ok_or(c)?);
        }
        out.push(cells);
    }
    Ok(Grid::from_rows(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digits(rows: &[&str]) -> Grid<u32> {
        parse_rows(rows, |c| c.to_digit(10)).unwrap().unwrap()
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(Grid::from_rows(vec![vec![1, 2], vec![3]]).is_none());
        assert!(parse_rows(&["12", "3"], |c| c.to_digit(10)).unwrap().is_none());
    }

    #[test]
    fn unknown_char_is_reported() {
        assert_eq!(parse_rows(&["1x"], |c| c.to_digit(10)), Err('x'));
    }

    #[test]
    fn get_is_row_major() {
        let g = digits(&["123", "456"]);
        assert_eq!(g.dims(), (2, 3));
        assert_eq!(g.get(Pos::new(1, 0)), Some(4));
        assert_eq!(g.get(Pos::new(0, 2)), Some(3));
        assert_eq!(g.get(Pos::new(2, 0)), None);
        assert_eq!(g.row(1), &[4, 5, 6]);
    }

    #[test]
    fn step_stops_at_edges() {
        let g = digits(&["12", "34"]);
        let origin = Pos::new(0, 0);
        assert_eq!(g.step(origin, Direction::Up), None);
        assert_eq!(g.step(origin, Direction::Left), None);
        assert_eq!(g.step(origin, Direction::Right), Some(Pos::new(0, 1)));
        assert_eq!(g.step(origin, Direction::Down), Some(Pos::new(1, 0)));
        assert_eq!(g.step(Pos::new(1, 1), Direction::Down), None);
        assert_eq!(g.step(Pos::new(1, 1), Direction::Right), None);
    }

    #[test]
    fn set_ignores_out_of_bounds() {
        let mut g = digits(&["12"]);
        g.set(Pos::new(0, 1), 9);
        g.set(Pos::new(5, 5), 9);
        assert_eq!(g.row(0), &[1, 9]);
    }

    #[test]
    fn positions_of_scans_in_order() {
        let g = digits(&["101", "010"]);
        let ones: Vec<Pos> = g.positions_of(1).collect();
        assert_eq!(ones, vec![Pos::new(0, 0), Pos::new(0, 2), Pos::new(1, 1)]);
        assert_eq!(g.count(0), 3);
    }
}
