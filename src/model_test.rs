// Tests for domain model helpers

use super::*;

#[test]
fn test_provider_qualified_id() {
    let identity = ExternalIdentity {
        id: "80351110224678912".to_string(),
        username: "nelly".to_string(),
        email: Some("nelly@example.com".to_string()),
    };
    assert_eq!(identity.provider_qualified_id(), "80351110224678912@discord");
}

#[test]
fn test_leaderboard_sort_key_packing() {
    let mut user = User::new("ab", "Alice Bobson");
    user.achievement_score = 1;

    // Score occupies the bits above the 12-byte name window; the name
    // bytes fill the window left-aligned.
    let expected: u128 = (1u128 << 96) | ((b'a' as u128) << 88) | ((b'b' as u128) << 80);
    assert_eq!(user.leaderboard_sort_key(), expected);
}

#[test]
fn test_leaderboard_sort_key_orders_by_score_then_name() {
    let mut high = User::new("zed", "Z");
    high.achievement_score = 10;
    let mut low = User::new("amy", "A");
    low.achievement_score = 3;

    assert!(high.leaderboard_sort_key() > low.leaderboard_sort_key());

    // Same score ties break alphabetically (ascending key)
    let mut amy = User::new("amy", "A");
    amy.achievement_score = 10;
    let mut zed = User::new("zed", "Z");
    zed.achievement_score = 10;
    assert!(amy.leaderboard_sort_key() < zed.leaderboard_sort_key());
}

#[test]
fn test_leaderboard_sort_key_truncates_long_names() {
    let mut a = User::new("exactly-12-b", "A");
    let mut b = User::new("exactly-12-bytes-and-more", "B");
    a.achievement_score = 5;
    b.achievement_score = 5;
    // Only the first 12 bytes participate in the key
    assert_eq!(a.leaderboard_sort_key(), b.leaderboard_sort_key());
}

#[test]
fn test_leaderboard_sort_key_masks_score_to_32_bits() {
    let mut user = User::new("n", "N");
    user.achievement_score = i64::MAX;
    // Only the low 32 bits of the score participate in the key
    assert_eq!(user.leaderboard_sort_key() >> 96, 0xffff_ffff);
}
