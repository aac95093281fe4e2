//! ModifierRegistry - the validated pool augment offers are drawn from

use super::{AugmentDef, Rarity};
use crate::config::{AugmentTable, ConfigError, ProgressionConstants};
use rand::Rng;

/// Number of candidates shown after every victory
pub const OFFER_SIZE: usize = 3;

/// Read-only augment pool
#[derive(Debug, Clone)]
pub struct ModifierRegistry {
    augments: Vec<AugmentDef>,
}

impl ModifierRegistry {
    /// Build a registry from a table, validating it first
    pub fn new(table: AugmentTable) -> Result<Self, ConfigError> {
        table.validate()?;
        Ok(ModifierRegistry {
            augments: table.augments,
        })
    }

    pub fn get(&self, id: &str) -> Option<&AugmentDef> {
        self.augments.iter().find(|a| a.id == id)
    }

    pub fn by_rarity(&self, rarity: Rarity) -> impl Iterator<Item = &AugmentDef> {
        self.augments.iter().filter(move |a| a.rarity == rarity)
    }

    /// Draw `OFFER_SIZE` distinct augment ids.
    ///
    /// Each slot draws from every tier with probability
    /// `rare_base_chance + luck × luck_rare_chance`, otherwise from Common only.
    /// An exhausted pool falls back to every augment not offered yet.
    pub fn sample_offer(
        &self,
        luck: f64,
        progression: &ProgressionConstants,
        rng: &mut impl Rng,
    ) -> Vec<String> {
        let upgrade_chance =
            (progression.rare_base_chance + luck * progression.luck_rare_chance).clamp(0.0, 1.0);
        let mut offer: Vec<String> = Vec::with_capacity(OFFER_SIZE);

        for _ in 0..OFFER_SIZE {
            let all_tiers = rng.gen::<f64>() < upgrade_chance;
            let mut pool: Vec<&AugmentDef> = self
                .augments
                .iter()
                .filter(|a| all_tiers || a.rarity == Rarity::Common)
                .filter(|a| !offer.contains(&a.id))
                .collect();
            if pool.is_empty() {
                pool = self
                    .augments
                    .iter()
                    .filter(|a| !offer.contains(&a.id))
                    .collect();
            }
            if pool.is_empty() {
                break;
            }
            let pick = pool[rng.gen_range(0..pool.len())];
            offer.push(pick.id.clone());
        }

        tracing::debug!(?offer, upgrade_chance, "augment offer drawn");
        offer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_augments;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_offer_is_three_distinct() {
        let registry = ModifierRegistry::new(default_augments().unwrap()).unwrap();
        let progression = ProgressionConstants::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..50 {
            let offer = registry.sample_offer(5.0, &progression, &mut rng);
            assert_eq!(offer.len(), OFFER_SIZE);
            let mut dedup = offer.clone();
            dedup.sort();
            dedup.dedup();
            assert_eq!(dedup.len(), OFFER_SIZE);
            assert!(offer.iter().all(|id| registry.get(id).is_some()));
        }
    }

    #[test]
    fn test_zero_luck_mostly_common() {
        let registry = ModifierRegistry::new(default_augments().unwrap()).unwrap();
        let progression = ProgressionConstants {
            rare_base_chance: 0.0,
            luck_rare_chance: 0.0,
            ..ProgressionConstants::default()
        };
        let commons = registry.by_rarity(Rarity::Common).count();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let offer = registry.sample_offer(0.0, &progression, &mut rng);
        let common_in_offer = offer
            .iter()
            .filter(|id| registry.get(id).map(|a| a.rarity) == Some(Rarity::Common))
            .count();
        assert_eq!(common_in_offer, commons.min(OFFER_SIZE));
    }

    #[test]
    fn test_same_seed_same_offer() {
        let registry = ModifierRegistry::new(default_augments().unwrap()).unwrap();
        let progression = ProgressionConstants::default();
        let a = registry.sample_offer(5.0, &progression, &mut ChaCha8Rng::seed_from_u64(9));
        let b = registry.sample_offer(5.0, &progression, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
