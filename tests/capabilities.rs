use anyhow::Result;
use exact_median::{
    AggregateError, AggregateFn, AnyValue, Capability, Median, MedianState, TypeEntry,
    TypeRegistry,
};

fn push_all<T: Clone + Send + Sync + 'static>(
    reg: &TypeRegistry,
    values: &[T],
) -> Result<Option<MedianState>> {
    let mut state = None;
    for v in values {
        state = Median.transition(reg, state, Some(v as &AnyValue))?;
    }
    Ok(state)
}

#[test]
fn unregistered_type_fails_at_first_transition() {
    let reg = TypeRegistry::with_builtins();

    #[derive(Clone)]
    struct Unregistered(u64);

    let v = Unregistered(1);
    let err = Median
        .transition(&reg, None, Some(&v as &AnyValue))
        .unwrap_err();
    assert!(matches!(err, AggregateError::UnsupportedType { .. }));
}

#[test]
fn type_without_ordering_cannot_aggregate() {
    // Registered, but with no comparator: creation fails eagerly because
    // nothing downstream works without a sort order.
    #[derive(Clone)]
    struct Blob(Vec<u8>);

    let mut reg = TypeRegistry::new();
    reg.insert(TypeEntry::of::<Blob>().build());

    let v = Blob(vec![1, 2, 3]);
    assert_eq!(v.0.len(), 3);
    let err = Median
        .transition(&reg, None, Some(&v as &AnyValue))
        .unwrap_err();
    assert!(matches!(
        err,
        AggregateError::UnsupportedType {
            capability: Capability::Ordering,
            ..
        }
    ));
}

#[test]
fn odd_groups_work_without_arithmetic() -> Result<()> {
    // String is orderable but has no + or /: fine as long as no mean is
    // ever needed.
    let reg = TypeRegistry::with_builtins();
    let values: Vec<String> = ["delta", "alpha", "echo", "bravo", "charlie"]
        .into_iter()
        .map(String::from)
        .collect();

    let state = push_all(&reg, &values)?;
    let median = Median.finalize(&reg, state)?.expect("non-empty group");
    assert_eq!(*median.downcast_ref::<String>().unwrap(), "charlie");
    Ok(())
}

#[test]
fn even_groups_fail_only_at_finalize_without_arithmetic() -> Result<()> {
    let reg = TypeRegistry::with_builtins();
    let values: Vec<String> = ["delta", "alpha", "echo", "bravo"]
        .into_iter()
        .map(String::from)
        .collect();

    // Transition and combine accept every value without complaint.
    let a = push_all(&reg, &values[..2])?;
    let b = push_all(&reg, &values[2..])?;
    let merged = Median.combine(a, b)?;

    let err = Median.finalize(&reg, merged).unwrap_err();
    assert!(matches!(
        err,
        AggregateError::UnsupportedType {
            capability: Capability::Arithmetic,
            ..
        }
    ));
    Ok(())
}

#[test]
fn custom_ordered_type_gets_an_exact_median() -> Result<()> {
    // A domain type with a custom comparator and no other capabilities.
    #[derive(Clone, Debug, PartialEq)]
    struct Ratio {
        num: i32,
        den: i32,
    }

    let mut reg = TypeRegistry::new();
    reg.insert(
        TypeEntry::of::<Ratio>()
            .with_cmp(|a, b| (a.num * b.den).cmp(&(b.num * a.den)))
            .build(),
    );

    let values = [
        Ratio { num: 3, den: 4 },
        Ratio { num: 1, den: 2 },
        Ratio { num: 7, den: 8 },
    ];
    let state = push_all(&reg, &values)?;
    let median = Median.finalize(&reg, state)?.expect("non-empty group");
    assert_eq!(
        *median.downcast_ref::<Ratio>().unwrap(),
        Ratio { num: 3, den: 4 }
    );
    Ok(())
}

#[test]
fn i8_is_ordered_but_not_averaged() -> Result<()> {
    // No From<u8> for i8, so the builtin entry deliberately has no
    // arithmetic: odd counts succeed, even counts fail at finalize.
    let reg = TypeRegistry::with_builtins();

    let state = push_all(&reg, &[3i8, 1, 2])?;
    let median = Median.finalize(&reg, state)?.expect("non-empty group");
    assert_eq!(*median.downcast_ref::<i8>().unwrap(), 2);

    let state = push_all(&reg, &[3i8, 1, 2, 4])?;
    let err = Median.finalize(&reg, state).unwrap_err();
    assert!(matches!(
        err,
        AggregateError::UnsupportedType {
            capability: Capability::Arithmetic,
            ..
        }
    ));
    Ok(())
}
