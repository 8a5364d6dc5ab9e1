//! Assertion functions for comparing iteration outputs.
//!
//! The engine returns final vertex sets in partition order, which is not
//! meaningful to callers; these assertions compare results order-independently
//! and panic with messages that show both sides in full.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

/// Assert that two collections contain the same elements, ignoring order.
///
/// # Panics
///
/// Panics if the collections differ in length or content (ignoring order).
///
/// # Example
///
/// ```
/// use vertexflow::testing::assert_collections_unordered_equal;
///
/// assert_collections_unordered_equal(&[3, 1, 2], &[1, 2, 3]);
/// ```
pub fn assert_collections_unordered_equal<T: Debug + Eq + Hash>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );

    let actual_set: HashSet<_> = actual.iter().collect();
    let expected_set: HashSet<_> = expected.iter().collect();
    if actual_set != expected_set {
        let missing: Vec<_> = expected_set.difference(&actual_set).collect();
        let extra: Vec<_> = actual_set.difference(&expected_set).collect();
        panic!(
            "Collection content mismatch:\n  Missing elements: {missing:?}\n  Extra elements: {extra:?}\n  Expected: {expected:?}\n  Actual: {actual:?}"
        );
    }
}

/// Assert that two vertex sets are equal after sorting by key.
///
/// # Panics
///
/// Panics if the sets differ after sorting by key.
///
/// # Example
///
/// ```
/// use vertexflow::testing::assert_kv_collections_equal;
///
/// assert_kv_collections_equal(vec![("b", 2), ("a", 1)], vec![("a", 1), ("b", 2)]);
/// ```
pub fn assert_kv_collections_equal<K, V>(mut actual: Vec<(K, V)>, mut expected: Vec<(K, V)>)
where
    K: Debug + Ord,
    V: Debug + PartialEq,
{
    actual.sort_by(|a, b| a.0.cmp(&b.0));
    expected.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(
        actual.len(),
        expected.len(),
        "Vertex set length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );

    for (i, ((ak, av), (ek, ev))) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            ak == ek && av == ev,
            "Vertex mismatch at sorted index {i}:\n  Expected: ({ek:?}, {ev:?})\n  Actual: ({ak:?}, {av:?})\n  Full expected: {expected:?}\n  Full actual: {actual:?}"
        );
    }
}

/// Assert that two `f64`-valued vertex sets agree within `tolerance`,
/// compared after sorting by key.
///
/// # Panics
///
/// Panics if the key sets differ or any state differs by more than
/// `tolerance`.
///
/// # Example
///
/// ```
/// use vertexflow::testing::assert_states_close;
///
/// assert_states_close(vec![("a", 0.2500001)], vec![("a", 0.25)], 1e-6);
/// ```
pub fn assert_states_close<K>(mut actual: Vec<(K, f64)>, mut expected: Vec<(K, f64)>, tolerance: f64)
where
    K: Debug + Ord,
{
    actual.sort_by(|a, b| a.0.cmp(&b.0));
    expected.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(
        actual.len(),
        expected.len(),
        "Vertex set length mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );

    for ((ak, av), (ek, ev)) in actual.iter().zip(expected.iter()) {
        assert_eq!(ak, ek, "Key mismatch:\n  Expected: {ek:?}\n  Actual: {ak:?}");
        assert!(
            (av - ev).abs() <= tolerance,
            "State of vertex {ak:?} off by more than {tolerance}:\n  Expected: {ev}\n  Actual: {av}"
        );
    }
}

/// Assert that every element satisfies `predicate`.
///
/// # Panics
///
/// Panics on the first element failing the predicate.
pub fn assert_all<T: Debug, F: Fn(&T) -> bool>(collection: &[T], predicate: F, message: &str) {
    for (i, element) in collection.iter().enumerate() {
        assert!(
            predicate(element),
            "Predicate failed at index {i}: {message}\n  Element: {element:?}"
        );
    }
}
