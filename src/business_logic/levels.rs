use crate::business_logic::config::ClusterTieBreak;
use crate::models::flip::{ResistanceLevel, SwingHigh};

const TIE_EPSILON: f64 = 1e-9;

/// Cluster still accepting swings
#[derive(Debug, Clone)]
struct OpenCluster {
    members: Vec<SwingHigh>,
    sum: f64,
}

impl OpenCluster {
    fn new(swing: &SwingHigh) -> Self {
        Self {
            members: vec![swing.clone()],
            sum: swing.price,
        }
    }

    fn mean(&self) -> f64 {
        self.sum / self.members.len() as f64
    }

    /// Whether every member, plus `swing`, stays within tolerance of the updated mean
    fn admits(&self, swing: &SwingHigh, tolerance_pct: f64) -> bool {
        let new_mean = (self.sum + swing.price) / (self.members.len() + 1) as f64;
        self.members
            .iter()
            .chain(std::iter::once(swing))
            .all(|member| pct_distance(member.price, new_mean) <= tolerance_pct)
    }

    fn push(&mut self, swing: &SwingHigh) {
        self.sum += swing.price;
        self.members.push(swing.clone());
    }
}

fn pct_distance(price: f64, reference: f64) -> f64 {
    (price - reference).abs() / reference * 100.0
}

/// Greedy chronological clustering of swing highs into resistance levels.
///
/// Each swing joins the closest open cluster that is within `tolerance_pct` of its
/// running mean and still admits it; when the closest one would stretch past the
/// tolerance the next admitting cluster is tried before a new one is opened. Clusters with fewer than `min_tests`
/// members are dropped. Levels come back ordered by their first member.
pub fn cluster_levels(
    swings: &[SwingHigh],
    tolerance_pct: f64,
    min_tests: usize,
    tie_break: ClusterTieBreak,
) -> Vec<ResistanceLevel> {
    let mut clusters: Vec<OpenCluster> = Vec::new();

    let mut ordered: Vec<&SwingHigh> = swings.iter().collect();
    ordered.sort_by_key(|swing| swing.index);

    for swing in ordered {
        let mut closest: Option<(usize, f64)> = None;
        for (idx, cluster) in clusters.iter().enumerate() {
            let distance = pct_distance(swing.price, cluster.mean());
            if distance > tolerance_pct || !cluster.admits(swing, tolerance_pct) {
                continue;
            }
            closest = match closest {
                None => Some((idx, distance)),
                Some((_, best)) if distance < best - TIE_EPSILON => Some((idx, distance)),
                Some((_, best))
                    if (distance - best).abs() <= TIE_EPSILON
                        && tie_break == ClusterTieBreak::NewestLevel =>
                {
                    Some((idx, distance))
                }
                keep => keep,
            };
        }

        match closest {
            Some((idx, _)) => clusters[idx].push(swing),
            None => clusters.push(OpenCluster::new(swing)),
        }
    }

    clusters
        .into_iter()
        .filter(|cluster| cluster.members.len() >= min_tests)
        .map(|cluster| ResistanceLevel::from_swings(cluster.members))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn make_swings(prices: &[f64]) -> Vec<SwingHigh> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| SwingHigh {
                index: i * 5,
                date: start + Duration::weeks((i * 5) as i64),
                price,
            })
            .collect()
    }

    #[test]
    fn test_groups_nearby_swings() {
        let swings = make_swings(&[100.0, 120.0, 99.5, 121.0, 100.5]);
        let levels = cluster_levels(&swings, 2.0, 3, ClusterTieBreak::OldestLevel);

        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].test_count, 3);
        assert!((levels[0].representative_price - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_falls_back_to_next_admitting_cluster() {
        // 103.5 is closest to the 101.67 cluster, but joining it would push 100 out
        let swings = make_swings(&[100.0, 105.5, 102.0, 103.0, 103.5]);
        let levels = cluster_levels(&swings, 2.0, 1, ClusterTieBreak::OldestLevel);

        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].test_count, 3);
        assert_eq!(levels[1].test_count, 2);
        assert!((levels[1].representative_price - 104.5).abs() < 1e-9);
    }

    #[test]
    fn test_min_tests_filter() {
        let swings = make_swings(&[100.0, 99.5, 150.0]);

        assert!(cluster_levels(&swings, 2.0, 3, ClusterTieBreak::OldestLevel).is_empty());
        assert_eq!(
            cluster_levels(&swings, 2.0, 2, ClusterTieBreak::OldestLevel).len(),
            1
        );
    }

    #[test]
    fn test_members_within_tolerance_of_level() {
        let swings = make_swings(&[
            100.0, 101.9, 102.9, 103.9, 98.2, 110.0, 111.5, 109.0, 100.7, 112.0,
        ]);
        let tolerance = 2.0;
        let levels = cluster_levels(&swings, tolerance, 1, ClusterTieBreak::OldestLevel);

        for level in &levels {
            for member in &level.member_swings {
                assert!(
                    pct_distance(member.price, level.representative_price) <= tolerance,
                    "{} too far from {}",
                    member.price,
                    level.representative_price
                );
            }
        }
    }

    #[test]
    fn test_reclustering_a_level_is_stable() {
        let swings = make_swings(&[100.0, 130.0, 101.5, 99.0, 131.0, 100.8, 129.5]);
        let levels = cluster_levels(&swings, 2.0, 3, ClusterTieBreak::OldestLevel);
        assert_eq!(levels.len(), 2);

        for level in &levels {
            let again = cluster_levels(&level.member_swings, 2.0, 1, ClusterTieBreak::OldestLevel);
            assert_eq!(again.len(), 1);
            assert!((again[0].representative_price - level.representative_price).abs() < 1e-9);
            assert_eq!(again[0].test_count, level.test_count);
        }
    }

    #[test]
    fn test_distinct_zones_are_not_merged_or_split() {
        let swings = make_swings(&[100.0, 110.0, 100.4, 109.6, 99.8, 110.3]);
        let levels = cluster_levels(&swings, 2.0, 3, ClusterTieBreak::OldestLevel);

        assert_eq!(levels.len(), 2);
        let gap = pct_distance(levels[1].representative_price, levels[0].representative_price);
        assert!(gap > 2.0);
    }

    #[test]
    fn test_equidistant_swing_tie_break() {
        let (low, high) = (100.0, 104.0);
        let between = 2.0 * low * high / (low + high);
        let swings = make_swings(&[low, high, between]);

        let oldest = cluster_levels(&swings, 2.0, 2, ClusterTieBreak::OldestLevel);
        assert_eq!(oldest.len(), 1);
        assert_eq!(oldest[0].member_swings[0].price, low);

        let newest = cluster_levels(&swings, 2.0, 2, ClusterTieBreak::NewestLevel);
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0].member_swings[0].price, high);
    }
}
