// Tracks who is currently fighting so nobody ends up in two arenas at once.

use dashmap::DashSet;

#[derive(Debug, Default)]
pub struct ActiveDuels {
    fighters: DashSet<u64>,
}

impl ActiveDuels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve both fighters. Returns `None` if either is already in a duel.
    /// The reservation is released when the returned slot is dropped.
    pub fn try_begin(&self, challenger: u64, defender: u64) -> Option<DuelSlot<'_>> {
        if !self.fighters.insert(challenger) {
            return None;
        }
        if !self.fighters.insert(defender) {
            self.fighters.remove(&challenger);
            return None;
        }

        Some(DuelSlot {
            registry: self,
            fighters: [challenger, defender],
        })
    }

    pub fn is_fighting(&self, user_id: u64) -> bool {
        self.fighters.contains(&user_id)
    }
}

pub struct DuelSlot<'a> {
    registry: &'a ActiveDuels,
    fighters: [u64; 2],
}

impl Drop for DuelSlot<'_> {
    fn drop(&mut self) {
        for id in self.fighters {
            self.registry.fighters.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fighters_cannot_join_two_duels() {
        let arena = ActiveDuels::new();
        let slot = arena.try_begin(1, 2).expect("first duel starts");

        assert!(arena.try_begin(2, 3).is_none());
        assert!(arena.try_begin(3, 1).is_none());
        // The failed attempt must not leave 3 reserved
        assert!(!arena.is_fighting(3));

        drop(slot);
        assert!(!arena.is_fighting(1));
        assert!(arena.try_begin(2, 3).is_some());
    }
}
