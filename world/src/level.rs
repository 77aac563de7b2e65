//! JSON decoding for level payloads.
//!
//! Levels travel as flat row-major code grids,
//! `{"width": W, "height": H, "tiles": [codes]}`, with one byte per cell.
//! Structured [`LevelDefinition`] documents are accepted as well so worlds
//! can be snapshotted and reloaded without re-encoding.

use serde::Deserialize;
use splashground_core::{LevelDefinition, LevelError};

#[derive(Debug, Deserialize)]
struct FlatLevel {
    width: u32,
    height: u32,
    tiles: Vec<u8>,
}

/// Decodes a level payload into a validated [`LevelDefinition`].
pub fn from_json(payload: &str) -> Result<LevelDefinition, LevelError> {
    if let Ok(flat) = serde_json::from_str::<FlatLevel>(payload) {
        return LevelDefinition::from_codes(flat.width, flat.height, &flat.tiles);
    }

    let definition: LevelDefinition =
        serde_json::from_str(payload).map_err(|error| LevelError::Malformed {
            message: error.to_string(),
        })?;
    // Structured decode bypasses the constructors; normalize through one.
    LevelDefinition::new(
        definition.width(),
        definition.height(),
        definition.tiles().to_vec(),
    )
}
