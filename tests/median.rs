use anyhow::Result;
use exact_median::{DynValue, TypeRegistry, median_of};

fn as_i64(v: DynValue) -> i64 {
    *v.downcast_ref::<i64>().expect("expected i64 result")
}

fn as_f64(v: DynValue) -> f64 {
    *v.downcast_ref::<f64>().expect("expected f64 result")
}

fn some<T: Copy>(values: &[T]) -> Vec<Option<T>> {
    values.iter().map(|v| Some(*v)).collect()
}

#[test]
fn odd_group_returns_middle_element() -> Result<()> {
    let reg = TypeRegistry::with_builtins();
    // sorted: [-3, 1, 2, 2, 2, 7, 9] -> middle is 2
    let input = some(&[1i64, 2, 9, 7, 2, -3, 2]);
    let median = median_of(&reg, &input)?.expect("non-empty group");
    assert_eq!(as_i64(median), 2);
    Ok(())
}

#[test]
fn even_group_averages_middle_pair() -> Result<()> {
    let reg = TypeRegistry::with_builtins();
    // sorted: [-3, 0, 1, 2, 7, 7, 9, 99] -> middle pair (2, 7) -> 4.5
    let input = some(&[1.0f64, 9.0, 7.0, 2.0, -3.0, 99.0, 0.0, 7.0]);
    let median = median_of(&reg, &input)?.expect("non-empty group");
    assert_eq!(as_f64(median), 4.5);
    Ok(())
}

#[test]
fn even_group_with_duplicate_middle_values() -> Result<()> {
    let reg = TypeRegistry::with_builtins();
    // sorted: [-3, 0, 1, 2, 2, 2, 7, 7, 9, 99] -> indices 4 and 5 are both
    // 2, so the mean of the middle pair is 2 even though distinct values
    // surround it.
    let input = some(&[1.0f64, 2.0, 9.0, 7.0, 2.0, -3.0, 2.0, 99.0, 0.0, 7.0]);
    let median = median_of(&reg, &input)?.expect("non-empty group");
    assert_eq!(as_f64(median), 2.0);
    Ok(())
}

#[test]
fn even_group_integer_division_truncates() -> Result<()> {
    let reg = TypeRegistry::with_builtins();
    // Same multiset as above in i64: (2 + 7) / 2 = 4 under integer division.
    let input = some(&[1i64, 9, 7, 2, -3, 99, 0, 7]);
    let median = median_of(&reg, &input)?.expect("non-empty group");
    assert_eq!(as_i64(median), 4);
    Ok(())
}

#[test]
fn nulls_do_not_affect_the_result() -> Result<()> {
    let reg = TypeRegistry::with_builtins();
    let with_nulls = vec![
        Some(1i64),
        None,
        Some(2),
        Some(9),
        None,
        Some(7),
        Some(2),
        Some(-3),
        Some(2),
        None,
    ];
    let without_nulls = some(&[1i64, 2, 9, 7, 2, -3, 2]);

    let a = median_of(&reg, &with_nulls)?.expect("non-empty group");
    let b = median_of(&reg, &without_nulls)?.expect("non-empty group");
    assert_eq!(as_i64(a), as_i64(b));
    Ok(())
}

#[test]
fn all_null_group_has_no_result() -> Result<()> {
    let reg = TypeRegistry::with_builtins();
    let input: Vec<Option<i64>> = vec![None, None, None];
    assert!(median_of(&reg, &input)?.is_none());
    Ok(())
}

#[test]
fn empty_group_has_no_result() -> Result<()> {
    let reg = TypeRegistry::with_builtins();
    let input: Vec<Option<i64>> = Vec::new();
    assert!(median_of(&reg, &input)?.is_none());
    Ok(())
}

#[test]
fn single_value_is_its_own_median() -> Result<()> {
    let reg = TypeRegistry::with_builtins();
    let median = median_of(&reg, &[Some(42i64)])?.expect("non-empty group");
    assert_eq!(as_i64(median), 42);
    Ok(())
}

#[test]
fn string_median_uses_lexicographic_order() -> Result<()> {
    let reg = TypeRegistry::with_builtins();
    let input: Vec<Option<String>> = ["pear", "apple", "quince"]
        .into_iter()
        .map(|s| Some(s.to_string()))
        .collect();
    let median = median_of(&reg, &input)?.expect("non-empty group");
    assert_eq!(*median.downcast_ref::<String>().expect("String result"), "pear");
    Ok(())
}
