//! Wire representation of a position, as exchanged with the search worker.

use crate::engine::Move;
use crate::logic::board::{
    Board, Coord, Dot, Player, SegmentKey, SegmentState, Topology, TriangleState,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentInfo {
    pub id: SegmentKey,
    pub drawn: bool,
    pub owner: Option<Player>,
    pub contested_by: Option<Player>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriangleInfo {
    pub segments: [SegmentKey; 3],
    pub filled: bool,
    pub owner: Option<Player>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub dots: Vec<Dot>,
    pub segments: Vec<SegmentInfo>,
    pub triangles: Vec<TriangleInfo>,
    pub total_triangles: usize,
    pub required_line_length: u8,
    pub mover: Player,
}

/// A line on the wire: endpoints plus the elementary segments it covers, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveData {
    pub from: Coord,
    pub to: Coord,
    pub segments: Vec<SegmentKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("required line length must be at least 1")]
    ZeroLineLength,
    #[error("dot {0} appears twice")]
    DuplicateDot(Coord),
    #[error("segment refers to unknown dot {0}")]
    UnknownDot(Coord),
    #[error("segment starts and ends at {0}")]
    DegenerateSegment(Coord),
    #[error("segment {0} appears twice")]
    DuplicateSegment(SegmentKey),
    #[error("triangle refers to unknown segment {0}")]
    UnknownSegment(SegmentKey),
    #[error("totalTriangles is {declared} but {actual} triangles were sent")]
    TriangleCount { declared: usize, actual: usize },
    #[error("segment {0} is drawn but has no owner")]
    MissingOwner(SegmentKey),
    #[error("segment {0} is not drawn but carries an owner or contest mark")]
    StrayOwner(SegmentKey),
    #[error("segment {0} is contested by its own owner")]
    SelfContest(SegmentKey),
    #[error("triangle {index} filled flag disagrees with its segments")]
    InconsistentTriangle { index: usize },
    #[error("board has {count} candidate lines, at most {max} are supported")]
    TooManyLines { count: usize, max: usize },
}

impl Board {
    /// Validates a start request and builds the searchable board from it.
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.total_triangles != snapshot.triangles.len() {
            return Err(SnapshotError::TriangleCount {
                declared: snapshot.total_triangles,
                actual: snapshot.triangles.len(),
            });
        }

        let segment_keys: Vec<SegmentKey> = snapshot.segments.iter().map(|s| s.id).collect();
        let triangle_keys: Vec<[SegmentKey; 3]> =
            snapshot.triangles.iter().map(|t| t.segments).collect();
        let topology = Topology::new(
            snapshot.dots.clone(),
            &segment_keys,
            &triangle_keys,
            snapshot.required_line_length,
        )?;

        let mut segments = Vec::with_capacity(snapshot.segments.len());
        for info in &snapshot.segments {
            let key = info.id.canonical();
            let state = match (info.drawn, info.owner) {
                (true, None) => return Err(SnapshotError::MissingOwner(key)),
                (false, Some(_)) => return Err(SnapshotError::StrayOwner(key)),
                (false, None) if info.contested_by.is_some() => {
                    return Err(SnapshotError::StrayOwner(key))
                }
                (_, owner) => {
                    if owner.is_some() && owner == info.contested_by {
                        return Err(SnapshotError::SelfContest(key));
                    }
                    SegmentState {
                        owner,
                        contested_by: info.contested_by,
                    }
                }
            };
            segments.push(state);
        }

        let mut triangles = Vec::with_capacity(snapshot.triangles.len());
        for (index, info) in snapshot.triangles.iter().enumerate() {
            let all_drawn = topology.triangle(index).is_some_and(|sides| {
                sides
                    .iter()
                    .all(|&s| segments.get(s).is_some_and(SegmentState::is_drawn))
            });
            if info.filled != all_drawn || info.filled != info.owner.is_some() {
                return Err(SnapshotError::InconsistentTriangle { index });
            }
            triangles.push(TriangleState { owner: info.owner });
        }

        Ok(Self::from_parts(
            Arc::new(topology),
            segments,
            triangles,
            snapshot.mover,
        ))
    }

    pub fn to_snapshot(&self) -> BoardSnapshot {
        let topology = self.topology();
        let segments = (0..topology.segment_count())
            .filter_map(|idx| {
                let def = topology.segment(idx)?;
                let state = self.segment(idx);
                Some(SegmentInfo {
                    id: def.key,
                    drawn: state.is_drawn(),
                    owner: state.owner,
                    contested_by: state.contested_by,
                })
            })
            .collect();
        let triangles: Vec<TriangleInfo> = (0..topology.triangle_count())
            .filter_map(|idx| {
                let sides = topology.triangle(idx)?;
                let mut keys = [SegmentKey::new(Coord::default(), Coord::default()); 3];
                for (key, &side) in keys.iter_mut().zip(sides) {
                    *key = topology.segment(side)?.key;
                }
                let state = self.triangle(idx);
                Some(TriangleInfo {
                    segments: keys,
                    filled: state.is_filled(),
                    owner: state.owner,
                })
            })
            .collect();

        BoardSnapshot {
            dots: topology.dots().to_vec(),
            segments,
            total_triangles: triangles.len(),
            triangles,
            required_line_length: topology.required_line_length(),
            mover: self.turn(),
        }
    }

    pub fn move_data(&self, mv: &Move) -> Option<MoveData> {
        let topology = self.topology();
        let line = topology.line(mv.line)?;
        let segments = line
            .segments
            .iter()
            .map(|&s| topology.segment(s).map(|def| def.key))
            .collect::<Option<Vec<_>>>()?;
        Some(MoveData {
            from: line.from,
            to: line.to,
            segments,
        })
    }

    pub fn move_from_data(&self, data: &MoveData) -> Option<Move> {
        self.find_move(data.from, data.to)
    }
}
