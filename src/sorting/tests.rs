use std::sync::Arc;

use proptest::prelude::*;

use super::*;
use crate::{library::CaseLibrary, multicycle::MulticyclePermutation, settings::SortOptions};

fn algorithms(context: SortContext) -> Vec<Box<dyn SortingAlgorithm>> {
    vec![
        Box::new(ElevenEighths::new(context.clone())),
        Box::new(ThreeHalves::new(context)),
    ]
}

fn assert_sorts(sorting: &Sorting) {
    let mut spi = MulticyclePermutation::of_arrangement(&sorting.initial);
    let mut pi = sorting.initial.clone();
    for rho in &sorting.moves {
        assert!(pi.is_applicable(rho), "{rho} on {pi}");
        let next = spi.after_move(rho);
        assert!(next.number_of_even_cycles() >= spi.number_of_even_cycles());
        spi = next;
        pi = pi.apply_transposition(rho);
    }
    assert!(spi.is_identity(), "{sorting} ends on {spi}");
}

#[test]
fn single_move_for_two_one() {
    let sortings: Vec<Sorting> = algorithms(SortContext::default())
        .iter()
        .map(|algorithm| algorithm.sort_str("2,1").unwrap())
        .collect();
    for sorting in &sortings {
        assert_eq!(sorting.moves, vec![Cycle::new(vec![0, 2, 1])]);
        assert_eq!(sorting, &sortings[0]);
    }
    insta::assert_snapshot!(sortings[0].to_string(), @"[0,2,1] (0 2 1)");
}

#[test]
fn sorted_input_needs_no_move() {
    for algorithm in algorithms(SortContext::default()) {
        let sorting = algorithm.sort_str("1,2,3").unwrap();
        assert!(sorting.is_empty());
        assert_eq!(sorting.arrangements().count(), 1);
    }
}

#[test]
fn input_is_validated_before_sorting() {
    let algorithm = ElevenEighths::default();
    for input in ["", "1,a", "1,,2", "-1", " 1"] {
        assert!(
            matches!(algorithm.sort_str(input), Err(SortError::Input(InputError::Malformed(_)))),
            "{input:?}"
        );
    }
    assert_eq!(
        parse_input("2,3"),
        Err(InputError::OutOfRange {
            found: 3,
            expected: 2
        })
    );
    assert_eq!(parse_input("3,1,1"), Err(InputError::Duplicate(1)));
    assert!(matches!(
        ThreeHalves::default().sort(&Cycle::new(vec![0, 3, 1])),
        Err(SortError::Input(InputError::OutOfRange { .. }))
    ));
}

#[test]
fn arrangements_end_sorted() {
    let sorting = ElevenEighths::default().sort_str("4,3,2,1").unwrap();
    let arrangements: Vec<Cycle> = sorting.arrangements().collect();
    assert_eq!(arrangements.len(), sorting.len() + 1);
    assert_eq!(arrangements[0], sorting.initial);
    assert_eq!(arrangements.last(), Some(&Cycle::identity_arrangement(5)));
}

#[test]
fn three_two_sequence_comes_from_the_library() {
    let strict = SortOptions::default().with_search_on_miss(false);

    let without_cases = ThreeHalves::new(SortContext::default().with_options(strict.clone()));
    assert!(matches!(
        without_cases.sort_str("5,4,3,2,1"),
        Err(SortError::MissingCase(_))
    ));

    let cases = CaseLibrary::read_case_file(
        "(0 4 2)(1 5 3);[0,2,4]-[3,1,5]-[2,4,0]\n".as_bytes(),
    )
    .unwrap();
    let context = SortContext::new(Arc::new(CaseLibrary::new()), Arc::new(cases)).with_options(strict);
    let sorting = ThreeHalves::new(context).sort_str("5,4,3,2,1").unwrap();
    assert_eq!(sorting.len(), 3);
    assert_sorts(&sorting);
}

fn arb_arrangement() -> impl Strategy<Value = Cycle> {
    (2usize..=7)
        .prop_flat_map(|n| Just((1..n).collect::<Vec<_>>()).prop_shuffle())
        .prop_map(|rest| {
            let mut symbols = vec![0];
            symbols.extend(rest);
            Cycle::new(symbols)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn small_permutations_are_sorted(pi in arb_arrangement()) {
        for algorithm in algorithms(SortContext::default()) {
            let sorting = algorithm.sort(&pi).unwrap();
            prop_assert_eq!(&sorting.initial, &pi);
            assert_sorts(&sorting);
        }
    }
}
