use progression_core::{LevelDefinition, LevelStats, RewardCondition, RewardSpec};

/// Grants every reward whose condition the run met and that was not claimed before.
///
/// Granted reward indices are recorded in `stats` so each reward is handed out
/// once per level. Rewards authored as already claimed are never granted.
pub fn claim_rewards(
    definition: &LevelDefinition,
    stats: &mut LevelStats,
    is_perfect: bool,
    time_bonus: bool,
) -> Vec<RewardSpec> {
    let mut granted = Vec::new();
    for (index, reward) in definition.rewards().iter().enumerate() {
        if reward.claimed || stats.claimed_rewards.contains(&index) {
            continue;
        }
        let earned = match reward.condition {
            RewardCondition::Completion => true,
            RewardCondition::Perfect => is_perfect,
            RewardCondition::TimeBonus => time_bonus,
        };
        if earned {
            let _ = stats.claimed_rewards.insert(index);
            granted.push(reward.clone());
        }
    }
    granted
}

#[cfg(test)]
mod tests {
    use super::*;
    use progression_core::{LevelConfig, LevelId, RewardKind};

    fn rewarded_level() -> LevelDefinition {
        let mut pre_claimed = RewardSpec::new(RewardKind::Lives, 1, RewardCondition::Completion);
        pre_claimed.claimed = true;
        LevelDefinition::new(LevelConfig {
            id: LevelId::new(4),
            name: "Vault".to_owned(),
            rewards: vec![
                RewardSpec::new(RewardKind::Score, 250, RewardCondition::Completion),
                RewardSpec::new(RewardKind::Powerup, 1, RewardCondition::Perfect),
                RewardSpec::new(RewardKind::WeaponUpgrade, 2, RewardCondition::TimeBonus),
                pre_claimed,
            ],
            ..LevelConfig::default()
        })
        .expect("valid definition")
    }

    #[test]
    fn grants_rewards_matching_outcome() {
        let definition = rewarded_level();
        let mut stats = LevelStats::new(true);

        let granted = claim_rewards(&definition, &mut stats, false, true);

        let kinds: Vec<RewardKind> = granted.iter().map(|reward| reward.kind).collect();
        assert_eq!(kinds, vec![RewardKind::Score, RewardKind::WeaponUpgrade]);
        assert_eq!(stats.claimed_rewards.len(), 2);
    }

    #[test]
    fn rewards_are_granted_once() {
        let definition = rewarded_level();
        let mut stats = LevelStats::new(true);
        let _ = claim_rewards(&definition, &mut stats, false, false);

        let second = claim_rewards(&definition, &mut stats, true, false);

        assert_eq!(second.len(), 1);
        assert_eq!(second[0].kind, RewardKind::Powerup);
    }
}
