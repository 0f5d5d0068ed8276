use serde::{Deserialize, Serialize};

use crate::item::ItemId;

/// Item collections a client keeps a copy of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Active,
    Trash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    Restored,
    Purged,
    TrashCleared,
    AutoPurged,
}

/// Published after every successful mutation so open sessions can re-fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, id: Option<ItemId>) -> Self {
        ChangeEvent { kind, id }
    }

    /// Collections whose contents changed.
    pub fn affected(&self) -> &'static [Collection] {
        match self.kind {
            ChangeKind::Created | ChangeKind::Updated => &[Collection::Active],
            ChangeKind::Deleted | ChangeKind::Restored => &[Collection::Active, Collection::Trash],
            ChangeKind::Purged | ChangeKind::TrashCleared | ChangeKind::AutoPurged => {
                &[Collection::Trash]
            }
        }
    }
}
