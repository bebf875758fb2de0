// The duel engine: two fighters trade blows until one drops.
//
// Randomness is injected so the Discord layer can use a thread rng while tests
// use a seeded StdRng.

use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::RangeInclusive;

pub const MAX_HP: u32 = 100;
pub const STRIKE_CHANCE: f64 = 0.7;
pub const DAMAGE_RANGE: RangeInclusive<u32> = 12..=28;
pub const HEAL_RANGE: RangeInclusive<u32> = 10..=22;
pub const CHEER_BONUS: f64 = 0.05;
pub const MAX_LUCK: f64 = 2.0;
/// Stalled duels are called after this many rounds.
pub const MAX_ROUNDS: u32 = 60;

const STRIKE_LINES: [&str; 20] = [
    "swung a wet noodle at",
    "delivered a legendary slap to",
    "poked the eye of",
    "threw a heavy dictionary at",
    "used a gamer move on",
    "challenged the physics of the universe hitting",
    "sent a strongly worded email to the face of",
    "tried to delete the existence of",
    "performed a professional wrestling dropkick on",
    "threw a spoiled slice of pizza at",
    "whispered an embarrassing secret to distract",
    "bonked the head of",
    "accidentally sneezed too hard on",
    "used a selfie stick as a spear against",
    "threw a handful of glitter into the eyes of",
    "attempted a 360-no-scope slap on",
    "lightly tapped the shoulder of",
    "summoned a tiny, angry pigeon to peck",
    "dropped a massive piano (cartoon style) on",
    "hit a home run using the head of",
];

const HEAL_LINES: [&str; 20] = [
    "ate a suspicious mushroom.",
    "drank a glowing potion that tastes like blueberry.",
    "took a quick nap mid-battle.",
    "used a band-aid on a broken heart.",
    "screamed 'I REFUSE TO DIE' and felt better.",
    "found a half-eaten sandwich on the floor.",
    "rubbed some dirt on the wound.",
    "recalled a happy memory and gained life.",
    "drank some spicy lava juice.",
    "patched themselves up with duct tape.",
    "received a magical high-five from a ghost.",
    "consumed an entire wheel of cheese instantly.",
    "hugged a nearby cactus for some reason.",
    "re-read the instructions of the fight.",
    "activated 'Main Character' plot armor.",
    "took a sip of a very expensive energy drink.",
    "prayed to the gods of the Echo.",
    "remembered they left the stove on and panicked into health.",
    "did a quick yoga pose to realign their soul.",
    "smelled a very refreshing lemon.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Challenger,
    Defender,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Challenger => Side::Defender,
            Side::Defender => Side::Challenger,
        }
    }

    fn index(self) -> usize {
        match self {
            Side::Challenger => 0,
            Side::Defender => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fighter {
    pub user_id: u64,
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub luck: f64,
}

impl Fighter {
    pub fn new(user_id: u64, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            hp: MAX_HP,
            max_hp: MAX_HP,
            luck: 1.0,
        }
    }

    /// Spectators have cheered for this fighter at least once.
    pub fn is_blessed(&self) -> bool {
        self.luck > 1.0
    }

    pub fn is_down(&self) -> bool {
        self.hp == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Strike {
        attacker: Side,
        defender: Side,
        damage: u32,
        flavour: &'static str,
    },
    Heal {
        fighter: Side,
        amount: u32,
        flavour: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct Duel {
    fighters: [Fighter; 2],
    turn: Side,
    rounds: u32,
}

impl Duel {
    /// The challenger opens the duel.
    pub fn new(challenger: Fighter, defender: Fighter) -> Self {
        Self {
            fighters: [challenger, defender],
            turn: Side::Challenger,
            rounds: 0,
        }
    }

    pub fn fighter(&self, side: Side) -> &Fighter {
        &self.fighters[side.index()]
    }

    fn fighter_mut(&mut self, side: Side) -> &mut Fighter {
        &mut self.fighters[side.index()]
    }

    /// Who acts in the next round.
    pub fn attacker(&self) -> Side {
        self.turn
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn side_of(&self, user_id: u64) -> Option<Side> {
        [Side::Challenger, Side::Defender]
            .into_iter()
            .find(|side| self.fighter(*side).user_id == user_id)
    }

    /// A spectator cheer fuels whoever attacks next.
    pub fn cheer(&mut self) -> &Fighter {
        let side = self.turn;
        let fighter = self.fighter_mut(side);
        fighter.luck = (fighter.luck + CHEER_BONUS).min(MAX_LUCK);
        fighter
    }

    pub fn is_over(&self) -> bool {
        self.fighters.iter().any(Fighter::is_down) || self.rounds >= MAX_ROUNDS
    }

    /// The winning side, once the duel is over.
    pub fn winner(&self) -> Option<Side> {
        let challenger = self.fighter(Side::Challenger);
        let defender = self.fighter(Side::Defender);

        if challenger.is_down() {
            Some(Side::Defender)
        } else if defender.is_down() {
            Some(Side::Challenger)
        } else if self.rounds >= MAX_ROUNDS {
            if defender.hp > challenger.hp {
                Some(Side::Defender)
            } else {
                Some(Side::Challenger)
            }
        } else {
            None
        }
    }

    /// Play one round and hand the turn over unless the round ended the duel.
    pub fn play_round<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TurnOutcome {
        let attacker = self.turn;
        let defender = attacker.other();

        let outcome = if rng.gen_bool(STRIKE_CHANCE) {
            let roll = rng.gen_range(DAMAGE_RANGE);
            let damage = (f64::from(roll) * self.fighter(attacker).luck).floor() as u32;
            let target = self.fighter_mut(defender);
            target.hp = target.hp.saturating_sub(damage);
            TurnOutcome::Strike {
                attacker,
                defender,
                damage,
                flavour: STRIKE_LINES.choose(rng).copied().unwrap_or(STRIKE_LINES[0]),
            }
        } else {
            let amount = rng.gen_range(HEAL_RANGE);
            let fighter = self.fighter_mut(attacker);
            fighter.hp = (fighter.hp + amount).min(fighter.max_hp);
            TurnOutcome::Heal {
                fighter: attacker,
                amount,
                flavour: HEAL_LINES.choose(rng).copied().unwrap_or(HEAL_LINES[0]),
            }
        };

        self.rounds += 1;
        if !self.fighter(defender).is_down() {
            self.turn = defender;
        }

        outcome
    }

    /// Combat log line for an outcome.
    pub fn describe(&self, outcome: &TurnOutcome) -> String {
        match outcome {
            TurnOutcome::Strike {
                attacker,
                defender,
                damage,
                flavour,
            } => format!(
                "💥 **{}** {} **{}** for **{} damage!**",
                self.fighter(*attacker).name,
                flavour,
                self.fighter(*defender).name,
                damage
            ),
            TurnOutcome::Heal {
                fighter,
                amount,
                flavour,
            } => format!(
                "🧪 **{}** {} (+{} HP)",
                self.fighter(*fighter).name,
                flavour,
                amount
            ),
        }
    }
}

/// Health bar for a fighter. Premium guilds get the emoji gradient.
pub fn health_bar(hp: u32, max_hp: u32, premium: bool) -> String {
    let max_hp = max_hp.max(1);
    if !premium {
        let filled = ((hp * 10) / max_hp).min(10) as usize;
        return format!(
            "[{}{}] {}/{}",
            "█".repeat(filled),
            "░".repeat(10 - filled),
            hp,
            max_hp
        );
    }

    let pct = f64::from(hp) / f64::from(max_hp) * 100.0;
    let gradient = if pct > 75.0 {
        "🟩🟩🟩🟩"
    } else if pct > 50.0 {
        "🟩🟩🟨🟨"
    } else if pct > 25.0 {
        "🟨🟨🟧🟧"
    } else {
        "🟧🟧🟥🟥"
    };

    format!("{} **{:.0}%** ({} HP)", gradient, pct, hp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn duel() -> Duel {
        Duel::new(Fighter::new(1, "Ash"), Fighter::new(2, "Ember"))
    }

    #[test]
    fn standard_health_bar() {
        assert_eq!(health_bar(100, 100, false), "[██████████] 100/100");
        assert_eq!(health_bar(64, 100, false), "[██████░░░░] 64/100");
        assert_eq!(health_bar(0, 100, false), "[░░░░░░░░░░] 0/100");
    }

    #[test]
    fn premium_health_bar_gradient() {
        assert_eq!(health_bar(80, 100, true), "🟩🟩🟩🟩 **80%** (80 HP)");
        assert!(health_bar(75, 100, true).starts_with("🟩🟩🟨🟨"));
        assert!(health_bar(30, 100, true).starts_with("🟨🟨🟧🟧"));
        assert!(health_bar(25, 100, true).starts_with("🟧🟧🟥🟥"));
    }

    #[test]
    fn every_duel_finishes_with_a_winner() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut duel = duel();
            while !duel.is_over() {
                duel.play_round(&mut rng);
            }
            let winner = duel.winner().expect("finished duel has a winner");
            assert!(!duel.fighter(winner).is_down());
            assert!(duel.rounds() <= MAX_ROUNDS);
        }
    }

    #[test]
    fn rounds_respect_damage_and_heal_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut duel = duel();
        while !duel.is_over() {
            let before = duel.clone();
            match duel.play_round(&mut rng) {
                TurnOutcome::Strike {
                    attacker,
                    defender,
                    damage,
                    ..
                } => {
                    assert_ne!(attacker, defender);
                    assert!(DAMAGE_RANGE.contains(&damage));
                    let expected = before.fighter(defender).hp.saturating_sub(damage);
                    assert_eq!(duel.fighter(defender).hp, expected);
                }
                TurnOutcome::Heal {
                    fighter, amount, ..
                } => {
                    assert!(HEAL_RANGE.contains(&amount));
                    assert!(duel.fighter(fighter).hp <= MAX_HP);
                }
            }
        }
    }

    #[test]
    fn turn_alternates_until_knockout() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut duel = duel();
        assert_eq!(duel.attacker(), Side::Challenger);
        duel.play_round(&mut rng);
        if !duel.is_over() {
            assert_eq!(duel.attacker(), Side::Defender);
        }
    }

    #[test]
    fn knockout_keeps_turn_with_the_winner() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut duel = duel();
        while !duel.is_over() {
            duel.play_round(&mut rng);
        }
        if duel.rounds() < MAX_ROUNDS {
            assert_eq!(Some(duel.attacker()), duel.winner());
        }
    }

    #[test]
    fn cheering_boosts_next_attacker_up_to_cap() {
        let mut duel = duel();
        duel.cheer();
        let challenger = duel.fighter(Side::Challenger);
        assert!((challenger.luck - 1.05).abs() < 1e-9);
        assert!(challenger.is_blessed());
        assert!(!duel.fighter(Side::Defender).is_blessed());

        for _ in 0..100 {
            duel.cheer();
        }
        assert_eq!(duel.fighter(Side::Challenger).luck, MAX_LUCK);
    }

    #[test]
    fn stalled_duel_goes_to_healthier_fighter() {
        let mut duel = duel();
        duel.rounds = MAX_ROUNDS;
        duel.fighters[0].hp = 40;
        duel.fighters[1].hp = 55;
        assert!(duel.is_over());
        assert_eq!(duel.winner(), Some(Side::Defender));

        duel.fighters[1].hp = 40;
        assert_eq!(duel.winner(), Some(Side::Challenger));
    }

    #[test]
    fn side_lookup_by_user() {
        let duel = duel();
        assert_eq!(duel.side_of(1), Some(Side::Challenger));
        assert_eq!(duel.side_of(2), Some(Side::Defender));
        assert_eq!(duel.side_of(3), None);
    }

    #[test]
    fn log_lines_name_both_fighters() {
        let duel = duel();
        let line = duel.describe(&TurnOutcome::Strike {
            attacker: Side::Challenger,
            defender: Side::Defender,
            damage: 20,
            flavour: STRIKE_LINES[0],
        });
        assert_eq!(
            line,
            "💥 **Ash** swung a wet noodle at **Ember** for **20 damage!**"
        );
    }
}
