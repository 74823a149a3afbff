//! In-memory storage backend for QA sessions.

use dicebox_game::{GameStorage, Prefs, Progression, RoundSnapshot, Stats};
use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

/// Shared in-memory store. Cloning shares the backing cells, which lets a
/// scenario rebuild a session against the same "disk" to simulate a
/// process restart.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    round: Rc<RefCell<Option<RoundSnapshot>>>,
    stats: Rc<RefCell<Option<Stats>>>,
    progression: Rc<RefCell<Option<Progression>>>,
    prefs: Rc<RefCell<Option<Prefs>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn has_round(&self) -> bool {
        self.round.borrow().is_some()
    }
}

impl GameStorage for MemoryStorage {
    type Error = Infallible;

    fn save_round(&self, snapshot: &RoundSnapshot) -> Result<(), Self::Error> {
        *self.round.borrow_mut() = Some(snapshot.clone());
        Ok(())
    }

    fn load_round(&self) -> Result<Option<RoundSnapshot>, Self::Error> {
        Ok(self.round.borrow().clone())
    }

    fn clear_round(&self) -> Result<(), Self::Error> {
        *self.round.borrow_mut() = None;
        Ok(())
    }

    fn save_stats(&self, stats: &Stats) -> Result<(), Self::Error> {
        *self.stats.borrow_mut() = Some(stats.clone());
        Ok(())
    }

    fn load_stats(&self) -> Result<Option<Stats>, Self::Error> {
        Ok(self.stats.borrow().clone())
    }

    fn save_progression(&self, progression: &Progression) -> Result<(), Self::Error> {
        *self.progression.borrow_mut() = Some(progression.clone());
        Ok(())
    }

    fn load_progression(&self) -> Result<Option<Progression>, Self::Error> {
        Ok(self.progression.borrow().clone())
    }

    fn save_prefs(&self, prefs: &Prefs) -> Result<(), Self::Error> {
        *self.prefs.borrow_mut() = Some(*prefs);
        Ok(())
    }

    fn load_prefs(&self) -> Result<Option<Prefs>, Self::Error> {
        Ok(self.prefs.borrow().clone())
    }
}
