use progression_core::{Achievement, GameProgress, LevelId, MAX_STARS};

/// Records every achievement whose rule now holds and was not earned before.
///
/// `last_stars` is the rating of the level that was just completed and
/// `registered` lists every level the campaign is made of. Completed ids
/// outside `registered` do not count toward campaign completion.
pub fn award_achievements(
    progress: &mut GameProgress,
    last_stars: u8,
    registered: impl IntoIterator<Item = LevelId>,
) -> Vec<Achievement> {
    let mut registered = registered.into_iter().peekable();
    let campaign_complete = registered.peek().is_some()
        && registered.all(|level| progress.completed_levels.contains(&level));
    let mut earned = Vec::new();
    for achievement in Achievement::ALL {
        if progress.has_achievement(achievement) {
            continue;
        }
        let holds = match achievement {
            Achievement::FirstClear => !progress.completed_levels.is_empty(),
            Achievement::FirstPerfect => !progress.perfect_levels.is_empty(),
            Achievement::ThreeStars => last_stars >= MAX_STARS,
            Achievement::ScoreMilestone => progress.total_score >= Achievement::SCORE_MILESTONE,
            Achievement::CampaignComplete => campaign_complete,
        };
        if holds {
            progress.achievements.push(achievement.tag().to_owned());
            earned.push(achievement);
        }
    }
    earned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(ids: &[u32]) -> Vec<LevelId> {
        ids.iter().copied().map(LevelId::new).collect()
    }

    #[test]
    fn first_clear_is_awarded_once() {
        let mut progress = GameProgress::default();
        let _ = progress.completed_levels.insert(LevelId::new(1));

        assert_eq!(
            award_achievements(&mut progress, 2, levels(&[1, 2, 3, 4, 5])),
            vec![Achievement::FirstClear]
        );
        assert!(award_achievements(&mut progress, 2, levels(&[1, 2, 3, 4, 5])).is_empty());
        assert_eq!(progress.achievements, vec!["first-clear".to_owned()]);
    }

    #[test]
    fn campaign_completion_requires_every_level() {
        let mut progress = GameProgress::default();
        let _ = progress.completed_levels.insert(LevelId::new(1));
        let _ = progress.completed_levels.insert(LevelId::new(2));
        progress.total_score = 12_000;

        let earned = award_achievements(&mut progress, 3, levels(&[1, 2]));

        assert_eq!(
            earned,
            vec![
                Achievement::FirstClear,
                Achievement::ThreeStars,
                Achievement::ScoreMilestone,
                Achievement::CampaignComplete,
            ]
        );
    }

    #[test]
    fn unregistered_completions_do_not_finish_the_campaign() {
        let mut progress = GameProgress::default();
        for id in [1, 7, 8] {
            let _ = progress.completed_levels.insert(LevelId::new(id));
        }

        let earned = award_achievements(&mut progress, 1, levels(&[1, 2]));

        assert_eq!(earned, vec![Achievement::FirstClear]);
        assert!(award_achievements(&mut progress, 1, Vec::new()).is_empty());
    }
}
