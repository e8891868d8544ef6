use num::rational::Ratio;
use proptest::prelude::*;

use super::*;
use crate::{
    search::search,
    settings::{Acceptance, SearchOptions},
};

fn config(spi: &str) -> Configuration {
    Configuration::with_identity_arrangement(spi.parse::<MulticyclePermutation>().unwrap())
}

#[test]
fn base_case_signatures() {
    let interleaving = config("(0 4 2)(1 5 3)");
    insta::assert_snapshot!(interleaving.signature(), @"[1,2,1,2,1,2]");
    insta::assert_snapshot!(interleaving.canonical().signature, @"[1,2,1,2,1,2]");

    let intersecting = config("(0 3 1)(2 5 4)");
    insta::assert_snapshot!(intersecting.signature(), @"[1,1,2,1,2,2]");
    insta::assert_snapshot!(intersecting.canonical().signature, @"[1,1,2,1,2,2]");
    assert_eq!(intersecting.open_gates(), vec![1, 5]);
    assert!(!intersecting.is_full());

    assert_ne!(interleaving, intersecting);
}

#[test]
fn oriented_cycles_carry_their_index() {
    let pi = Cycle::new(vec![0, 2, 1]);
    let c = Configuration::new("(0 2 1)".parse().unwrap(), pi);
    assert!(c.is_oriented(&Cycle::new(vec![0, 2, 1])));
    insta::assert_snapshot!(c.signature(), @"[1:1,1:2,1:3]");

    let parsed: Signature = "[1:1,1:2,1:3]".parse().unwrap();
    assert_eq!(&parsed, c.signature());
    assert!(parsed[0].is_oriented());
}

#[test]
fn signature_parse_errors() {
    assert!(matches!(
        "1,2".parse::<Signature>(),
        Err(SignatureParseError::Brackets(_))
    ));
    assert_eq!(
        "[1,x]".parse::<Signature>(),
        Err(SignatureParseError::Entry("x".into()))
    );
    assert_eq!("[]".parse::<Signature>(), Ok(Signature::new(vec![])));
}

#[test]
fn unoriented_order_beats_oriented() {
    assert!(SignatureEntry::unoriented(2) < SignatureEntry::oriented(2, 1));
    assert!(SignatureEntry::oriented(1, 3) < SignatureEntry::unoriented(2));
}

#[test]
fn stable_hash_is_fixed() {
    let signature: Signature = "[1,2,1:1]".parse().unwrap();
    // ((((((1*31+1)*31+0)*31+2)*31+0)*31+1)*31+1)
    let expected = [1u32, 0, 2, 0, 1, 1]
        .iter()
        .fold(1u32, |h, &x| h.wrapping_mul(31).wrapping_add(x));
    assert_eq!(signature.stable_hash(), expected);
    assert_eq!(config("(0 4 2)(1 5 3)").stable_hash(), config("(1 5 3)(0 4 2)").stable_hash());
}

#[test]
fn display_shows_fixed_points() {
    let c = Configuration::new("(0 2 1)(3)".parse().unwrap(), Cycle::new(vec![0, 3, 2, 1]));
    assert_eq!(c.to_string(), "(0 2 1)(3) [0,3,2,1]");
}

#[test]
fn mirror_is_an_involution() {
    let c = Configuration::new("(0 3 1)(2 5 4)".parse().unwrap(), Cycle::new(vec![0, 5, 1, 4, 2, 3]));
    let back = c.mirror().mirror();
    assert_eq!(back.spi(), c.spi());
    assert_eq!(back.pi(), c.pi());
}

#[test]
fn translated_sorting_of_base_case() {
    let c = config("(0 4 2)(1 5 3)").rotate(2).mirror();
    let canonical = c.canonical_configuration();
    let options = SearchOptions::default()
        .with_max_ratio(Ratio::new(3, 2))
        .with_acceptance(Acceptance::FullySorted);
    let sorting = search(canonical.spi(), canonical.pi(), &options).unwrap();
    assert_eq!(sorting.len(), 3);

    let translated = c.from_canonical(&sorting);
    let sorted = translated.iter().fold(c.clone(), |c, rho| {
        assert!(c.pi().is_applicable(rho));
        c.apply(rho)
    });
    assert!(sorted.spi().is_identity());
    similar_asserts::assert_eq!(c.to_canonical(&translated), sorting);
}

fn arb_configuration() -> impl Strategy<Value = Configuration> {
    (1usize..=3)
        .prop_flat_map(|k| {
            let n = 3 * k;
            (
                Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
                Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
            )
        })
        .prop_map(|(cycles, pi)| {
            let spi = cycles.chunks(3).map(|c| Cycle::new(c.to_vec())).collect();
            Configuration::new(spi, Cycle::new(pi))
        })
}

fn arb_moves(c: &Configuration, picks: &[(usize, usize, usize)]) -> Vec<Cycle> {
    let mut current = c.clone();
    let n = c.len();
    let mut moves = Vec::new();
    for &(x, y, z) in picks {
        let mut idx = [x % n, y % n, z % n];
        idx.sort_unstable();
        if idx[0] == idx[1] || idx[1] == idx[2] {
            continue;
        }
        let p = current.pi().symbols();
        let rho = Cycle::new(vec![p[idx[0]], p[idx[1]], p[idx[2]]]);
        current = current.apply(&rho);
        moves.push(rho);
    }
    moves
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn canonical_form_ignores_rotation_and_mirror(c in arb_configuration(), k in 0usize..9) {
        let key = &c.canonical().signature;
        let rotated = c.rotate(k % c.len());
        let mirrored = c.mirror();
        let mirrored_rotated = mirrored.rotate(k % c.len());
        prop_assert_eq!(&rotated.canonical().signature, key);
        prop_assert_eq!(&mirrored.canonical().signature, key);
        prop_assert_eq!(&mirrored_rotated.canonical().signature, key);
    }

    #[test]
    fn of_signature_round_trip(c in arb_configuration()) {
        let rebuilt = Configuration::of_signature(c.signature());
        prop_assert_eq!(rebuilt.signature(), c.signature());
        prop_assert_eq!(&rebuilt.canonical().signature, &c.canonical().signature);
        let canonical = c.canonical_configuration();
        prop_assert_eq!(canonical.signature(), &c.canonical().signature);
    }

    #[test]
    fn moves_follow_the_canonical_form(
        c in arb_configuration(),
        picks in prop::collection::vec((0usize..9, 0usize..9, 0usize..9), 0..4),
    ) {
        let moves = arb_moves(&c, &picks);
        let translated = c.to_canonical(&moves);
        prop_assert_eq!(&c.from_canonical(&translated), &moves);

        let original = moves.iter().fold(c.clone(), |c, rho| c.apply(rho));
        let canonical = translated
            .iter()
            .fold(c.canonical_configuration(), |c, rho| {
                assert!(c.pi().is_applicable(rho));
                c.apply(rho)
            });
        prop_assert_eq!(
            original.spi().number_of_even_cycles(),
            canonical.spi().number_of_even_cycles()
        );
        prop_assert_eq!(&original.canonical().signature, &canonical.canonical().signature);
    }
}
