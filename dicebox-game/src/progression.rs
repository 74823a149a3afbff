//! Achievement progression and cosmetic inventory.
//!
//! Pure data plus a boundary notification bus. Unlocks are data-only
//! entitlements; nothing here feeds back into the turn state machine.

use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use crate::achievements::AchievementId;

/// Cosmetic slot a reward equips into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CosmeticSlot {
    DiceSkin,
    TileTheme,
    Confetti,
    Theme,
}

impl CosmeticSlot {
    pub const ALL: [Self; 4] = [Self::DiceSkin, Self::TileTheme, Self::Confetti, Self::Theme];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::DiceSkin => "dice_skin",
            Self::TileTheme => "tile_theme",
            Self::Confetti => "confetti",
            Self::Theme => "theme",
        }
    }
}

/// A cosmetic granted by an achievement reward. Catalog data, not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CosmeticGrant {
    pub slot: CosmeticSlot,
    pub id: &'static str,
}

/// Record stored for each unlocked achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRecord {
    pub unlocked: bool,
    /// ISO-8601 timestamp supplied by the platform layer, if it has a clock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Per-slot cosmetic ownership and the current loadout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CosmeticsState {
    pub inventory: BTreeMap<CosmeticSlot, BTreeSet<String>>,
    /// Absent key = nothing equipped in that slot.
    pub equipped: BTreeMap<CosmeticSlot, String>,
}

/// Player progression: unlocked achievements plus cosmetics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Progression {
    pub achievements: BTreeMap<AchievementId, UnlockRecord>,
    pub cosmetics: CosmeticsState,
}

impl Progression {
    /// Ids already unlocked, in the shape achievement evaluation wants.
    #[must_use]
    pub fn owned_achievements(&self) -> BTreeSet<AchievementId> {
        self.achievements.keys().copied().collect()
    }

    /// Mark achievements unlocked. Re-awarding an owned id keeps the
    /// original record. Returns whether anything changed.
    pub fn award_achievements(&mut self, ids: &[AchievementId], date: Option<&str>) -> bool {
        let mut changed = false;
        for &id in ids {
            self.achievements.entry(id).or_insert_with(|| {
                changed = true;
                UnlockRecord {
                    unlocked: true,
                    date: date.map(str::to_string),
                }
            });
        }
        changed
    }

    /// Add cosmetics to the inventory. Returns whether anything new landed.
    pub fn unlock_cosmetics(&mut self, grants: &[CosmeticGrant]) -> bool {
        let mut changed = false;
        for grant in grants {
            let owned = self.cosmetics.inventory.entry(grant.slot).or_default();
            changed |= owned.insert(grant.id.to_string());
        }
        changed
    }

    #[must_use]
    pub fn owns_cosmetic(&self, slot: CosmeticSlot, id: &str) -> bool {
        self.cosmetics
            .inventory
            .get(&slot)
            .is_some_and(|set| set.contains(id))
    }

    /// Equip an owned cosmetic, or clear the slot with `None`. Equipping an
    /// unowned id is a silent no-op. Returns whether the loadout changed.
    pub fn equip_cosmetic(&mut self, slot: CosmeticSlot, id: Option<&str>) -> bool {
        match id {
            Some(id) if !self.owns_cosmetic(slot, id) => false,
            Some(id) => {
                let prev = self.cosmetics.equipped.insert(slot, id.to_string());
                prev.as_deref() != Some(id)
            }
            None => self.cosmetics.equipped.remove(&slot).is_some(),
        }
    }

    #[must_use]
    pub fn equipped(&self, slot: CosmeticSlot) -> Option<&str> {
        self.cosmetics.equipped.get(&slot).map(String::as_str)
    }
}

/// Handle returned by [`ProgressionBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle(usize);

/// Boundary notification channel. Collaborators subscribe to hear about
/// progression writes; the session publishes after each save. This stays at
/// the boundary and the turn state machine never touches it.
#[derive(Default)]
pub struct ProgressionBus {
    listeners: RefCell<Vec<(usize, Box<dyn Fn()>)>>,
    next_id: Cell<usize>,
}

impl ProgressionBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; keep the handle to unsubscribe later.
    pub fn subscribe(&self, listener: Box<dyn Fn()>) -> ListenerHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));
        ListenerHandle(id)
    }

    /// Remove a previously registered callback.
    pub fn unsubscribe(&self, handle: ListenerHandle) {
        self.listeners.borrow_mut().retain(|(id, _)| *id != handle.0);
    }

    /// Invoke every listener. Listeners may subscribe reentrantly; those
    /// additions take effect from the next publish.
    pub fn publish(&self) {
        let current = self.listeners.take();
        for (_, listener) in &current {
            listener();
        }
        let mut listeners = self.listeners.borrow_mut();
        let mut restored = current;
        restored.append(&mut listeners);
        *listeners = restored;
    }
}
