// Ship - the compatibility reading between two members.

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipTier {
    Dynasty,
    EternalFlame,
    BalancedDestiny,
    FadingEmbers,
    DoomedRomance,
}

impl ShipTier {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            90.. => ShipTier::Dynasty,
            70..=89 => ShipTier::EternalFlame,
            50..=69 => ShipTier::BalancedDestiny,
            20..=49 => ShipTier::FadingEmbers,
            _ => ShipTier::DoomedRomance,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ShipTier::Dynasty => "👑 ABSOLUTE DYNASTY",
            ShipTier::EternalFlame => "💖 ETERNAL FLAME",
            ShipTier::BalancedDestiny => "⚖️ BALANCED DESTINY",
            ShipTier::FadingEmbers => "☁️ FADING EMBERS",
            ShipTier::DoomedRomance => "💀 DOOMED ROMANCE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipReading {
    pub percent: u8,
    pub tier: ShipTier,
}

impl ShipReading {
    pub fn new(percent: u8) -> Self {
        let percent = percent.min(100);
        Self {
            percent,
            tier: ShipTier::from_percent(percent),
        }
    }

    /// Draw a fresh reading, uniform over 0..=100.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen_range(0..=100))
    }

    /// Above half the heart glows; otherwise it stays grey.
    pub fn is_warm(&self) -> bool {
        self.percent > 50
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn tier_boundaries() {
        assert_eq!(ShipTier::from_percent(100), ShipTier::Dynasty);
        assert_eq!(ShipTier::from_percent(90), ShipTier::Dynasty);
        assert_eq!(ShipTier::from_percent(89), ShipTier::EternalFlame);
        assert_eq!(ShipTier::from_percent(70), ShipTier::EternalFlame);
        assert_eq!(ShipTier::from_percent(50), ShipTier::BalancedDestiny);
        assert_eq!(ShipTier::from_percent(20), ShipTier::FadingEmbers);
        assert_eq!(ShipTier::from_percent(19), ShipTier::DoomedRomance);
        assert_eq!(ShipTier::from_percent(0), ShipTier::DoomedRomance);
    }

    #[test]
    fn rolls_stay_in_range_and_reach_both_ends() {
        let mut rng = StdRng::seed_from_u64(42);
        let readings: Vec<ShipReading> = (0..5_000).map(|_| ShipReading::roll(&mut rng)).collect();
        assert!(readings.iter().all(|r| r.percent <= 100));
        assert!(readings.iter().any(|r| r.percent == 0));
        assert!(readings.iter().any(|r| r.percent == 100));
    }

    #[test]
    fn warmth_starts_above_half() {
        assert!(!ShipReading::new(50).is_warm());
        assert!(ShipReading::new(51).is_warm());
    }
}
