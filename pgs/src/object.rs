/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Reassembles objects that span multiple object definition segments.

#[cfg(test)]
mod tests;

use super::{
    rle::{self, Bitmap, RleError},
    segment::ObjectDefinitionSegment,
};
use std::collections::BTreeMap;
use log::{trace, warn};

/// A complete object: its dimensions and the concatenated RLE data of every fragment.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Object {
    pub id: u16,
    pub version: u8,
    pub width: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

impl Object {

    /// Decompresses the object's pixel data.
    pub fn decode(&self) -> Result<Bitmap, RleError> {
        rle::decode(&self.data, self.width, self.height)
    }
}

#[derive(Clone, Debug)]
struct PendingObject {
    object: Object,
    data_length: u32,
}

/// Collects object fragments by ID.
///
/// A first fragment opens an object, later fragments append to it and a last fragment completes
/// it. Only completed objects are handed out. A completed object remains available until another
/// object with the same ID completes or the reassembler is cleared.
#[derive(Clone, Debug, Default)]
pub struct ObjectReassembler {
    pending: BTreeMap<u16, PendingObject>,
    completed: BTreeMap<u16, Object>,
}

impl ObjectReassembler {

    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fragment, returning the object it completes, if any.
    pub fn push(&mut self, ods: &ObjectDefinitionSegment) -> Option<&Object> {

        if ods.sequence.is_first() {
            self.pending.insert(
                ods.id,
                PendingObject {
                    object: Object {
                        id: ods.id,
                        version: ods.version,
                        width: ods.width,
                        height: ods.height,
                        data: Vec::with_capacity(ods.data_length.saturating_sub(4) as usize),
                    },
                    data_length: ods.data_length,
                },
            );
        }

        let pending = match self.pending.get_mut(&ods.id) {
            Some(pending) => pending,
            None => {
                warn!("dropping fragment of object {} that was never started", ods.id);
                return None
            }
        };

        pending.object.data.extend_from_slice(&ods.data);

        if !ods.sequence.is_last() {
            trace!("object {} has {} bytes so far", ods.id, pending.object.data.len());
            return None
        }

        let PendingObject { object, data_length } = self.pending.remove(&ods.id)?;

        if object.data.len() + 4 != data_length as usize {
            warn!(
                "object {} declared {} bytes of data but carried {}",
                object.id,
                data_length.saturating_sub(4),
                object.data.len(),
            );
        }

        self.completed.insert(object.id, object);
        self.completed.get(&ods.id)
    }

    /// Looks up a completed object.
    pub fn get(&self, id: u16) -> Option<&Object> {
        self.completed.get(&id)
    }

    /// Whether an object with this ID has been started but not completed.
    pub fn is_pending(&self, id: u16) -> bool {
        self.pending.contains_key(&id)
    }

    /// Forgets every pending and completed object.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.completed.clear();
    }
}
