use crate::logic::board::{Board, Coord, Dot, SegmentKey};
use std::collections::HashMap;
use thiserror::Error;

/// Allowed deviation from a lattice axis, in degrees.
pub const ANGLE_TOLERANCE_DEG: f64 = 1.5;
const LATTICE_ANGLES_DEG: [f64; 4] = [0.0, 60.0, 120.0, 180.0];
// Relative to the squared line length.
const COLLINEAR_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("unknown dot {0}")]
    UnknownDot(Coord),
    #[error("a line needs two distinct dots")]
    Degenerate,
    #[error("line {from} -> {to} does not follow a lattice axis")]
    InvalidDirection { from: Coord, to: Coord },
    #[error("line spans {found} segments, {expected} required")]
    WrongLength { expected: u8, found: usize },
    #[error("segment {0} does not exist on this board")]
    MissingSegment(SegmentKey),
    #[error("every segment of this line is already drawn")]
    NothingToDraw,
    #[error("the game is already over")]
    GameOver,
}

pub fn is_lattice_direction(a: &Dot, b: &Dot) -> bool {
    let angle = (b.y - a.y).atan2(b.x - a.x).to_degrees().abs();
    LATTICE_ANGLES_DEG
        .iter()
        .any(|axis| (angle - axis).abs() <= ANGLE_TOLERANCE_DEG)
}

/// Dots on the closed segment `a..=b`, ordered from `a` towards `b`.
pub fn dots_between<'a>(dots: &'a [Dot], a: &Dot, b: &Dot) -> Vec<&'a Dot> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx.mul_add(dx, dy * dy);
    if len_sq == 0.0 {
        return Vec::new();
    }

    let mut on_line: Vec<(f64, &Dot)> = dots
        .iter()
        .filter_map(|p| {
            let px = p.x - a.x;
            let py = p.y - a.y;
            let cross = dx.mul_add(py, -(dy * px));
            if cross.abs() > COLLINEAR_EPSILON * len_sq {
                return None;
            }
            let t = px.mul_add(dx, py * dy) / len_sq;
            (-COLLINEAR_EPSILON..=1.0 + COLLINEAR_EPSILON)
                .contains(&t)
                .then_some((t, p))
        })
        .collect();
    on_line.sort_by(|x, y| x.0.total_cmp(&y.0));
    on_line.into_iter().map(|(_, p)| p).collect()
}

/// Decomposes the line `a -> b` into elementary segment indices.
pub fn trace_line(
    dots: &[Dot],
    segment_index: &HashMap<SegmentKey, usize>,
    a: &Dot,
    b: &Dot,
    required_length: u8,
) -> Result<Vec<usize>, MoveError> {
    if a.coord() == b.coord() {
        return Err(MoveError::Degenerate);
    }
    if !is_lattice_direction(a, b) {
        return Err(MoveError::InvalidDirection {
            from: a.coord(),
            to: b.coord(),
        });
    }

    let path = dots_between(dots, a, b);
    let found = path.len().saturating_sub(1);
    if found != usize::from(required_length) {
        return Err(MoveError::WrongLength {
            expected: required_length,
            found,
        });
    }

    path.windows(2)
        .map(|pair| match pair {
            [p, q] => {
                let key = SegmentKey::new(p.coord(), q.coord());
                segment_index
                    .get(&key)
                    .copied()
                    .ok_or(MoveError::MissingSegment(key))
            }
            _ => Err(MoveError::Degenerate),
        })
        .collect()
}

/// Full real-play check of a line; returns its index in the line table.
pub fn validate_line(board: &Board, from: Coord, to: Coord) -> Result<usize, MoveError> {
    let topology = board.topology();
    let a = topology.dot(from).ok_or(MoveError::UnknownDot(from))?;
    let b = topology.dot(to).ok_or(MoveError::UnknownDot(to))?;

    let Some(idx) = topology.lines().find(from, to) else {
        trace_line(
            topology.dots(),
            topology.segment_index(),
            a,
            b,
            topology.required_line_length(),
        )?;
        return Err(MoveError::InvalidDirection { from, to });
    };

    let line = topology.lines().get(idx).ok_or(MoveError::Degenerate)?;
    if line.segments.iter().all(|&s| board.is_drawn(s)) {
        return Err(MoveError::NothingToDraw);
    }
    Ok(idx)
}
