//! Builds start snapshots for the hexagonal lattice boards used in play.

use crate::logic::board::{Coord, Dot, Player, SegmentKey};
use crate::logic::snapshot::{BoardSnapshot, SegmentInfo, TriangleInfo};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DOT_SPACING: f64 = 100.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl BoardSize {
    pub const fn row_lengths(self) -> &'static [u8] {
        match self {
            Self::Small => &[3, 4, 5, 4, 3],
            Self::Medium => &[4, 5, 6, 7, 6, 5, 4],
            Self::Large => &[5, 6, 7, 8, 9, 8, 7, 6, 5],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("a board needs at least one row")]
    NoRows,
    #[error("row {row} is empty")]
    EmptyRow { row: usize },
    #[error("rows {row} and {next} must differ in length by exactly one", next = row + 1)]
    UnevenRows { row: usize },
}

fn row_height() -> f64 {
    DOT_SPACING * 3f64.sqrt() / 2.0
}

fn check_rows(row_lengths: &[u8]) -> Result<(), LayoutError> {
    if row_lengths.is_empty() {
        return Err(LayoutError::NoRows);
    }
    if let Some(row) = row_lengths.iter().position(|&len| len == 0) {
        return Err(LayoutError::EmptyRow { row });
    }
    if let Some(row) = row_lengths
        .windows(2)
        .position(|pair| matches!(pair, [a, b] if a.abs_diff(*b) != 1))
    {
        return Err(LayoutError::UnevenRows { row });
    }
    Ok(())
}

/// Lays out the lattice described by `row_lengths` with nothing drawn yet.
///
/// Each row is centred on the widest one, so consecutive rows interleave and
/// every lattice edge runs at 0, 60 or 120 degrees.
pub fn build(
    row_lengths: &[u8],
    required_line_length: u8,
    first_mover: Player,
) -> Result<BoardSnapshot, LayoutError> {
    check_rows(row_lengths)?;

    let widest = row_lengths.iter().copied().max().unwrap_or(0);
    let mut dots = Vec::new();
    for (r, &len) in (0u8..).zip(row_lengths) {
        let offset = f64::from(widest - len) * DOT_SPACING / 2.0;
        for c in 0..len {
            dots.push(Dot {
                r,
                c,
                x: f64::from(c).mul_add(DOT_SPACING, offset),
                y: f64::from(r) * row_height(),
            });
        }
    }

    let mut segments: Vec<SegmentKey> = Vec::new();
    let mut add_segment = |a: Coord, b: Coord| {
        let key = SegmentKey::new(a, b);
        if !segments.contains(&key) {
            segments.push(key);
        }
    };
    let mut triangles: Vec<[SegmentKey; 3]> = Vec::new();
    let tri = |a: Coord, b: Coord, c: Coord| {
        [
            SegmentKey::new(a, b),
            SegmentKey::new(a, c),
            SegmentKey::new(b, c),
        ]
    };

    for (r, &len) in (0u8..).zip(row_lengths) {
        let next_len = row_lengths.get(usize::from(r) + 1).copied();
        for c in 0..len {
            let here = Coord::new(r, c);
            if c + 1 < len {
                add_segment(here, Coord::new(r, c + 1));
            }
            let Some(next_len) = next_len else {
                continue;
            };
            if next_len > len {
                add_segment(here, Coord::new(r + 1, c));
                add_segment(here, Coord::new(r + 1, c + 1));
            } else {
                if c < next_len {
                    add_segment(here, Coord::new(r + 1, c));
                }
                if c > 0 {
                    add_segment(here, Coord::new(r + 1, c - 1));
                }
            }
        }

        let Some(next_len) = next_len else {
            continue;
        };
        if next_len > len {
            for c in 0..len {
                let (top, below_left, below_right) =
                    (Coord::new(r, c), Coord::new(r + 1, c), Coord::new(r + 1, c + 1));
                triangles.push(tri(top, below_left, below_right));
                if c + 1 < len {
                    triangles.push(tri(top, Coord::new(r, c + 1), below_right));
                }
            }
        } else {
            for c in 0..next_len {
                let (left, right, below) =
                    (Coord::new(r, c), Coord::new(r, c + 1), Coord::new(r + 1, c));
                triangles.push(tri(left, right, below));
                if c + 1 < next_len {
                    triangles.push(tri(right, below, Coord::new(r + 1, c + 1)));
                }
            }
        }
    }

    Ok(BoardSnapshot {
        dots,
        segments: segments
            .into_iter()
            .map(|id| SegmentInfo {
                id,
                drawn: false,
                owner: None,
                contested_by: None,
            })
            .collect(),
        total_triangles: triangles.len(),
        triangles: triangles
            .into_iter()
            .map(|segments| TriangleInfo {
                segments,
                filled: false,
                owner: None,
            })
            .collect(),
        required_line_length,
        mover: first_mover,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_board_counts() {
        let snapshot = build(BoardSize::Small.row_lengths(), 1, Player::One).unwrap();
        assert_eq!(snapshot.dots.len(), 19);
        assert_eq!(snapshot.segments.len(), 42);
        assert_eq!(snapshot.total_triangles, 24);
    }

    #[test]
    fn test_preset_triangle_counts() {
        let medium = build(BoardSize::Medium.row_lengths(), 1, Player::One).unwrap();
        assert_eq!(medium.dots.len(), 37);
        assert_eq!(medium.total_triangles, 54);
        let large = build(BoardSize::Large.row_lengths(), 1, Player::One).unwrap();
        assert_eq!(large.dots.len(), 61);
        assert_eq!(large.segments.len(), 156);
        assert_eq!(large.total_triangles, 96);
    }

    #[test]
    fn test_rhombus_geometry() {
        let snapshot = build(&[1, 2, 1], 1, Player::Two).unwrap();
        assert_eq!(snapshot.mover, Player::Two);
        assert_eq!(snapshot.segments.len(), 5);
        assert_eq!(snapshot.total_triangles, 2);

        let top = snapshot.dots.first().unwrap();
        assert!((top.x - 50.0).abs() < 1e-9);
        assert!(top.y.abs() < 1e-9);
        let bottom = snapshot.dots.last().unwrap();
        assert!((bottom.y - 2.0 * row_height()).abs() < 1e-9);
    }

    #[test]
    fn test_edges_are_unit_length() {
        let snapshot = build(BoardSize::Medium.row_lengths(), 1, Player::One).unwrap();
        let find = |coord: Coord| snapshot.dots.iter().find(|d| d.coord() == coord).unwrap();
        for seg in &snapshot.segments {
            let (a, b) = (find(seg.id.a), find(seg.id.b));
            let len = (a.x - b.x).hypot(a.y - b.y);
            assert!((len - DOT_SPACING).abs() < 1e-6, "{} has length {len}", seg.id);
        }
    }

    #[test]
    fn test_rejects_bad_rows() {
        assert_eq!(build(&[], 1, Player::One), Err(LayoutError::NoRows));
        assert_eq!(
            build(&[3, 3], 1, Player::One),
            Err(LayoutError::UnevenRows { row: 0 })
        );
        assert_eq!(
            build(&[2, 0], 1, Player::One),
            Err(LayoutError::EmptyRow { row: 1 })
        );
    }
}
