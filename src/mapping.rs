//! Page id <-> vertex translation.
//!
//! The ETL step keeps only valid pages (main namespace, not redirects) and numbers them by
//! sorted page id, so a vertex is simply the position of its page id in a sorted array.

use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexIds {
    ids: Vec<u32>,
}

impl VertexIds {
    /// `ids` must be strictly increasing.
    pub fn from_sorted(ids: Vec<u32>) -> Result<Self> {
        if let Some(pos) = ids.windows(2).position(|w| w[0] >= w[1]) {
            return Err(Error::InvalidParameter(format!(
                "page ids must be strictly increasing (ids[{pos}]={} ids[{}]={})",
                ids[pos],
                pos + 1,
                ids[pos + 1]
            )));
        }
        Ok(Self { ids })
    }

    /// Sorts and drops duplicate page ids.
    pub fn from_unsorted(mut ids: Vec<u32>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn vertex(&self, page_id: u32) -> Option<usize> {
        self.ids.binary_search(&page_id).ok()
    }

    pub fn page_id(&self, vertex: usize) -> Option<u32> {
        self.ids.get(vertex).copied()
    }
}
