//! Reward jitter: bounds and uniformity of the experience roll.

use grindbot::game::{reward_bounds, roll_reward, MissionTemplate};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn base_100_stays_within_90_to_110() {
    let template = MissionTemplate::new("Patrol", 100, 5, 1);
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    for _ in 0..10_000 {
        let award = roll_reward(&template, &mut rng);
        assert!((90..=110).contains(&award), "award {} out of range", award);
    }
}

#[test]
fn every_value_in_the_closed_range_is_equally_likely() {
    const SAMPLES: usize = 210_000;
    let template = MissionTemplate::new("Patrol", 100, 5, 1);
    let (low, high) = reward_bounds(template.xp_reward);
    let buckets = (high - low + 1) as usize;
    let mut counts = vec![0usize; buckets];
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..SAMPLES {
        let award = roll_reward(&template, &mut rng);
        counts[(award - low) as usize] += 1;
    }

    let expected = SAMPLES / buckets;
    for (offset, count) in counts.iter().enumerate() {
        // Standard deviation per bucket is about 98; allow a wide margin.
        let diff = (*count as i64 - expected as i64).abs();
        assert!(
            diff < (expected / 10) as i64,
            "value {} seen {} times, expected about {}",
            low + offset as u64,
            count,
            expected
        );
    }
    // Both endpoints are reachable.
    assert!(counts[0] > 0 && counts[buckets - 1] > 0);

    // Chi-squared with 20 degrees of freedom; 45.3 is the 0.999 quantile.
    let chi2: f64 = counts
        .iter()
        .map(|&c| {
            let d = c as f64 - expected as f64;
            d * d / expected as f64
        })
        .sum();
    assert!(chi2 < 45.3, "chi-squared {} suggests a non-uniform roll", chi2);
}

#[test]
fn small_bases_round_down() {
    assert_eq!(reward_bounds(5), (4, 5));
    assert_eq!(reward_bounds(1), (0, 1));
    let template = MissionTemplate::new("Nap", 5, 1, 1);
    let mut rng = StdRng::seed_from_u64(3);
    let mut seen = [false; 2];
    for _ in 0..1_000 {
        let award = roll_reward(&template, &mut rng);
        seen[(award - 4) as usize] = true;
    }
    assert_eq!(seen, [true, true]);
}
