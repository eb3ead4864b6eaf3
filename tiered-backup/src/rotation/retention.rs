//! Per-tier retention planning.
//!
//! The engine only looks at filenames. Dates come from the name, never from
//! filesystem metadata, so copied or restored archives keep their place in
//! the rotation.

use super::naming::{ArchiveDescriptor, BackupIdentity};
use super::tier::RotationTier;
use std::cmp::Reverse;

/// Number of archives kept per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    monthly: usize,
    weekly: usize,
    daily: usize,
}

impl RetentionPolicy {
    pub fn new(monthly: usize, weekly: usize, daily: usize) -> Self {
        Self {
            monthly,
            weekly,
            daily,
        }
    }

    pub fn quota(&self, tier: RotationTier) -> usize {
        match tier {
            RotationTier::Monthly => self.monthly,
            RotationTier::Weekly => self.weekly,
            RotationTier::Daily => self.daily,
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(
            RotationTier::Monthly.default_quota(),
            RotationTier::Weekly.default_quota(),
            RotationTier::Daily.default_quota(),
        )
    }
}

/// Outcome for one tier: archives kept and archives to remove, both newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPlan {
    pub tier: RotationTier,
    pub quota: usize,
    pub kept: Vec<String>,
    pub delete: Vec<String>,
}

/// Files a retention pass would remove, grouped by tier.
///
/// Tiers appear in `RotationTier::ALL` order, so iterating the plan is
/// deterministic for a given listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan {
    tiers: Vec<TierPlan>,
}

impl DeletionPlan {
    /// Filenames to delete, Monthly then Weekly then Daily, newest first.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.tiers
            .iter()
            .flat_map(|t| t.delete.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.tiers.iter().map(|t| t.delete.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tier(&self, tier: RotationTier) -> Option<&TierPlan> {
        self.tiers.iter().find(|t| t.tier == tier)
    }

    pub fn tiers(&self) -> &[TierPlan] {
        &self.tiers
    }
}

/// Decides which archives of a job fall outside their tier's quota.
#[derive(Debug, Clone, Default)]
pub struct RetentionEngine {
    policy: RetentionPolicy,
}

impl RetentionEngine {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Plan deletions for `identity` from a destination listing.
    ///
    /// Names that do not decode for `identity` are ignored. Within a tier,
    /// archives are ordered newest first and everything past the quota is
    /// marked for deletion. Each file takes one slot, even when two share a
    /// date.
    pub fn plan_deletions<I, S>(&self, identity: &BackupIdentity, listing: I) -> DeletionPlan
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut groups: [Vec<ArchiveDescriptorEntry>; 3] = Default::default();

        for name in listing {
            let name = name.as_ref();
            if let Ok(archive) = ArchiveDescriptor::decode(name, identity) {
                groups[tier_index(archive.tier)].push(ArchiveDescriptorEntry {
                    file_name: name.to_string(),
                    archive,
                });
            }
        }

        let tiers = RotationTier::ALL
            .into_iter()
            .zip(groups)
            .map(|(tier, mut group)| {
                group.sort_by(|a, b| {
                    (Reverse(a.archive.date), Reverse(&a.file_name))
                        .cmp(&(Reverse(b.archive.date), Reverse(&b.file_name)))
                });
                group.dedup_by(|a, b| a.file_name == b.file_name);

                let quota = self.policy.quota(tier);
                let mut names: Vec<String> = group.into_iter().map(|e| e.file_name).collect();
                let delete = if names.len() > quota {
                    names.split_off(quota)
                } else {
                    Vec::new()
                };

                TierPlan {
                    tier,
                    quota,
                    kept: names,
                    delete,
                }
            })
            .collect();

        DeletionPlan { tiers }
    }
}

struct ArchiveDescriptorEntry {
    file_name: String,
    archive: ArchiveDescriptor,
}

fn tier_index(tier: RotationTier) -> usize {
    match tier {
        RotationTier::Monthly => 0,
        RotationTier::Weekly => 1,
        RotationTier::Daily => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::naming::CompressionKind;
    use chrono::NaiveDate;

    fn srv1_web() -> BackupIdentity {
        BackupIdentity::new("srv1", "web").unwrap()
    }

    fn name(identity: &BackupIdentity, date: NaiveDate, tier: RotationTier) -> String {
        ArchiveDescriptor {
            identity: identity.clone(),
            date,
            tier,
            compression: CompressionKind::Gzip,
        }
        .file_name()
    }

    fn daily_run(identity: &BackupIdentity, count: usize) -> Vec<String> {
        let start = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        (0..count as i64)
            .map(|i| name(identity, start + chrono::Duration::days(i), RotationTier::Daily))
            .collect()
    }

    #[test]
    fn test_empty_listing_plans_nothing() {
        let plan = RetentionEngine::default().plan_deletions(&srv1_web(), Vec::<String>::new());
        assert!(plan.is_empty());
        assert_eq!(plan.len(), 0);
        assert_eq!(plan.tiers().len(), 3);
    }

    #[test]
    fn test_daily_over_quota_removes_oldest() {
        let id = srv1_web();
        let listing = daily_run(&id, 20);

        let plan = RetentionEngine::default().plan_deletions(&id, &listing);

        let deleted: Vec<&str> = plan.file_names().collect();
        assert_eq!(deleted.len(), 6);
        // listing is oldest first; the six oldest go, newest first
        let mut expected: Vec<&str> = listing[..6].iter().map(String::as_str).collect();
        expected.reverse();
        assert_eq!(deleted, expected);

        let daily = plan.tier(RotationTier::Daily).unwrap();
        assert_eq!(daily.kept.len(), 14);
        assert_eq!(daily.kept[0], listing[19]);
    }

    #[test]
    fn test_at_or_below_quota_keeps_everything() {
        let id = srv1_web();
        let engine = RetentionEngine::default();

        assert!(engine.plan_deletions(&id, daily_run(&id, 14)).is_empty());
        assert!(engine.plan_deletions(&id, daily_run(&id, 3)).is_empty());
    }

    #[test]
    fn test_monthly_scenario() {
        let listing = [
            "srv1-web-2023-02-01-monthly.tar.gz",
            "srv1-web-2023-01-01-monthly.tar.gz",
            "srv1-web-2023-03-01-monthly.tar.gz",
        ];

        let plan = RetentionEngine::default().plan_deletions(&srv1_web(), listing);

        assert_eq!(
            plan.file_names().collect::<Vec<_>>(),
            vec!["srv1-web-2023-01-01-monthly.tar.gz"]
        );
        assert_eq!(
            plan.tier(RotationTier::Monthly).unwrap().kept,
            vec![
                "srv1-web-2023-03-01-monthly.tar.gz".to_string(),
                "srv1-web-2023-02-01-monthly.tar.gz".to_string(),
            ]
        );
    }

    #[test]
    fn test_foreign_and_unrelated_files_are_ignored() {
        let web = srv1_web();
        let api = BackupIdentity::new("srv1", "api").unwrap();

        let mut listing = daily_run(&web, 15);
        listing.extend(daily_run(&api, 30));
        listing.push("notes.txt".to_string());
        listing.push("srv1-web-2023-05-01-daily.tar.gz.partial".to_string());
        listing.push("srv1-web-latest.tar.gz".to_string());

        let plan = RetentionEngine::default().plan_deletions(&web, &listing);

        let deleted: Vec<&str> = plan.file_names().collect();
        assert_eq!(deleted, vec!["srv1-web-2023-05-01-daily.tar.gz"]);
        assert!(deleted.iter().all(|n| n.starts_with("srv1-web-")));
    }

    #[test]
    fn test_tiers_use_their_own_quota() {
        let id = srv1_web();
        let mut listing = Vec::new();
        // 8 Sundays that are not the 1st
        let mut sunday = NaiveDate::from_ymd_opt(2023, 1, 8).unwrap();
        for _ in 0..8 {
            listing.push(name(&id, sunday, RotationTier::Weekly));
            sunday += chrono::Duration::weeks(1);
        }
        listing.extend(daily_run(&id, 10));

        let plan = RetentionEngine::default().plan_deletions(&id, &listing);

        assert_eq!(plan.len(), 2);
        assert_eq!(
            plan.file_names().collect::<Vec<_>>(),
            vec![
                "srv1-web-2023-01-15-weekly.tar.gz",
                "srv1-web-2023-01-08-weekly.tar.gz",
            ]
        );
        assert!(plan.tier(RotationTier::Daily).unwrap().delete.is_empty());
    }

    #[test]
    fn test_same_date_archives_each_take_a_slot() {
        let listing = [
            "srv1-web-2023-03-01-monthly.tar.gz",
            "srv1-web-2023-03-01-monthly.tar.bz2",
            "srv1-web-2023-02-01-monthly.tar.gz",
        ];

        let plan = RetentionEngine::default().plan_deletions(&srv1_web(), listing);

        assert_eq!(
            plan.file_names().collect::<Vec<_>>(),
            vec!["srv1-web-2023-02-01-monthly.tar.gz"]
        );
    }

    #[test]
    fn test_injected_policy() {
        let id = srv1_web();
        let engine = RetentionEngine::new(RetentionPolicy::new(0, 0, 2));

        let plan = engine.plan_deletions(&id, daily_run(&id, 5));

        assert_eq!(plan.len(), 3);
        assert_eq!(engine.policy().quota(RotationTier::Daily), 2);
    }

    #[test]
    fn test_duplicate_listing_entries_counted_once() {
        let id = srv1_web();
        let mut listing = daily_run(&id, 14);
        listing.push(listing[0].clone());

        assert!(RetentionEngine::default().plan_deletions(&id, &listing).is_empty());
    }
}
