//! Patch persistence keyed by stable parameter ids.
//!
//! The byte encoding is left to the host wrapper; with the `serde` feature
//! enabled `PatchState` can be written with any serde format.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{ParamTable, ParamValues};

pub const PATCH_STATE_VERSION: u32 = 1;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRecord {
    /// Wire id, see [`super::ParamId`].
    pub id: u32,
    pub value: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PatchState {
    pub version: u32,
    pub params: Vec<ParamRecord>,
}

impl PatchState {
    /// Capture every cell in table order.
    pub fn capture(table: &ParamTable, values: &ParamValues) -> Self {
        Self {
            version: PATCH_STATE_VERSION,
            params: table
                .iter()
                .map(|info| ParamRecord {
                    id: info.id.raw(),
                    value: values.get(info.id),
                })
                .collect(),
        }
    }
}
