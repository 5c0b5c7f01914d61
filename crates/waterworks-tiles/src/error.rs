use std::fmt;

use crate::tile::TileId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileError {
    UnknownTile(TileId),
}

impl fmt::Display for TileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileError::UnknownTile(id) => write!(f, "unknown water tile {}", id),
        }
    }
}

impl std::error::Error for TileError {}
