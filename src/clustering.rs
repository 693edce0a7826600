use crate::marker::Positioned;

/// Groups markers that would visually overlap.
///
/// Single greedy pass in input order. Each unclaimed marker becomes the anchor
/// of a new group and claims every unclaimed marker closer than `threshold`
/// to the anchor itself. Members never pull in their own neighbours, so the
/// result is order-sensitive and not transitive.
///
/// Every input item appears in exactly one group. A NaN distance never
/// satisfies `< threshold`, so degenerate positions end up as singletons.
pub fn cluster<T: Positioned>(markers: &[T], threshold: f64) -> Vec<Vec<&T>> {
    let mut used = vec![false; markers.len()];
    let mut groups = Vec::new();

    for (i, anchor) in markers.iter().enumerate() {
        if used[i] {
            continue;
        }
        used[i] = true;

        let anchor_pos = anchor.position();
        let mut group = vec![anchor];

        for (j, candidate) in markers.iter().enumerate() {
            if used[j] {
                continue;
            }
            if anchor_pos.distance_to(&candidate.position()) < threshold {
                used[j] = true;
                group.push(candidate);
            }
        }

        groups.push(group);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_CLUSTER_THRESHOLD;
    use crate::marker::{Marker, MarkerCategory, Position};

    fn marker(id: &str, x: f64, y: f64) -> Marker {
        Marker::new(id, id.to_uppercase(), MarkerCategory::History, Position::new(x, y))
    }

    fn ids(groups: &[Vec<&Marker>]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| g.iter().map(|m| m.id.clone()).collect())
            .collect()
    }

    #[test]
    fn empty_input_yields_no_groups() {
        let markers: Vec<Marker> = Vec::new();
        assert!(cluster(&markers, DEFAULT_CLUSTER_THRESHOLD).is_empty());
    }

    #[test]
    fn single_marker_is_a_singleton() {
        let markers = vec![marker("a", 40.0, 40.0)];
        assert_eq!(ids(&cluster(&markers, 12.0)), vec![vec!["a"]]);
    }

    #[test]
    fn close_markers_merge_and_far_ones_stay_apart() {
        let markers = vec![marker("a", 0.0, 0.0), marker("b", 1.0, 1.0), marker("c", 50.0, 50.0)];
        assert_eq!(ids(&cluster(&markers, 12.0)), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn membership_is_tested_against_the_anchor_only() {
        // b-c is within range, but c is too far from anchor a.
        let markers = vec![marker("a", 0.0, 0.0), marker("b", 10.0, 0.0), marker("c", 20.0, 0.0)];
        assert_eq!(ids(&cluster(&markers, 12.0)), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn input_order_changes_the_grouping() {
        let markers = vec![marker("b", 10.0, 0.0), marker("a", 0.0, 0.0), marker("c", 20.0, 0.0)];
        assert_eq!(ids(&cluster(&markers, 12.0)), vec![vec!["b", "a", "c"]]);
    }

    #[test]
    fn claimed_markers_are_not_reconsidered_by_later_anchors() {
        let markers = vec![marker("a", 0.0, 0.0), marker("c", 16.0, 0.0), marker("b", 8.0, 0.0)];
        assert_eq!(ids(&cluster(&markers, 12.0)), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn isolated_markers_stay_singletons_in_input_order() {
        let markers = vec![
            marker("a", 10.0, 10.0),
            marker("b", 90.0, 10.0),
            marker("c", 10.0, 90.0),
            marker("d", 90.0, 90.0),
        ];
        assert_eq!(
            ids(&cluster(&markers, 12.0)),
            vec![vec!["a"], vec!["b"], vec!["c"], vec!["d"]]
        );
    }

    #[test]
    fn distance_equal_to_threshold_does_not_merge() {
        let markers = vec![marker("a", 0.0, 0.0), marker("b", 12.0, 0.0)];
        assert_eq!(ids(&cluster(&markers, 12.0)), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn nan_positions_fall_back_to_singletons() {
        let markers = vec![
            marker("a", 5.0, 5.0),
            marker("nan", f64::NAN, 5.0),
            marker("b", 6.0, 5.0),
        ];
        assert_eq!(ids(&cluster(&markers, 12.0)), vec![vec!["a", "b"], vec!["nan"]]);
    }

    #[test]
    fn nan_threshold_never_merges() {
        let markers = vec![marker("a", 5.0, 5.0), marker("b", 5.0, 5.0)];
        assert_eq!(ids(&cluster(&markers, f64::NAN)), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn seam_markers_are_not_wrapped_together() {
        let markers = vec![marker("left", 1.0, 50.0), marker("right", 99.0, 50.0)];
        assert_eq!(ids(&cluster(&markers, 12.0)), vec![vec!["left"], vec!["right"]]);
    }

    #[test]
    fn duplicate_ids_are_still_partitioned_by_position_in_the_list() {
        let markers = vec![marker("dup", 0.0, 0.0), marker("dup", 80.0, 80.0)];
        let groups = cluster(&markers, 12.0);
        assert_eq!(groups.len(), 2);
        assert!(std::ptr::eq(groups[0][0], &markers[0]));
        assert!(std::ptr::eq(groups[1][0], &markers[1]));
    }

    // Small deterministic LCG so generated layouts are reproducible.
    fn scattered(seed: u64, count: usize) -> Vec<Marker> {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) % 10_000) as f64 / 100.0
        };
        (0..count).map(|i| marker(&format!("m{i}"), next(), next())).collect()
    }

    #[test]
    fn every_marker_lands_in_exactly_one_group() {
        for seed in 0..64 {
            for count in [0, 1, 2, 5, 10, 25] {
                let mut markers = scattered(seed, count);
                if seed % 2 == 1 {
                    markers.reverse();
                }

                for threshold in [0.0, 5.0, 12.0, 40.0] {
                    let groups = cluster(&markers, threshold);
                    let mut seen: Vec<*const Marker> =
                        groups.iter().flatten().map(|m| *m as *const Marker).collect();
                    assert_eq!(seen.len(), markers.len(), "seed {seed}, count {count}");
                    seen.sort();
                    seen.dedup();
                    assert_eq!(seen.len(), markers.len(), "duplicate member, seed {seed}");
                    assert!(groups.iter().all(|g| !g.is_empty()));

                    // Members sit within range of their anchor.
                    for group in &groups {
                        let anchor = group[0].position;
                        assert!(group[1..].iter().all(|m| anchor.distance_to(&m.position) < threshold));
                    }
                }
            }
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let markers = vec![
            marker("a", 3.0, 3.0),
            marker("b", 8.0, 4.0),
            marker("c", 14.0, 3.0),
            marker("d", 70.0, 20.0),
            marker("e", 75.0, 25.0),
        ];
        let first = ids(&cluster(&markers, 12.0));
        for _ in 0..5 {
            assert_eq!(ids(&cluster(&markers, 12.0)), first);
        }
    }

    #[test]
    fn works_over_bare_positions() {
        let points = vec![Position::new(0.0, 0.0), Position::new(2.0, 0.0)];
        let groups = cluster(&points, 12.0);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }
}
