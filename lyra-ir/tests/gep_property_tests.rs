//! Property tests for getelementptr type derivation
//!
//! Generates pseudo-random type trees and well-typed index chains, tracks
//! the expected leaf type by hand, and checks the derivation agrees.

use std::rc::Rc;

use lyra_ir::{ConstExpr, Constant, GepIndex, GlobalIdent, Type};

/// Small deterministic generator, so failures reproduce.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn pick(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

fn leaf_type(lcg: &mut Lcg) -> Type {
    match lcg.pick(5) {
        0 => Type::i8(),
        1 => Type::i16(),
        2 => Type::i32(),
        3 => Type::i64(),
        _ => Type::double(),
    }
}

fn random_tree(lcg: &mut Lcg, depth: u32) -> Type {
    if depth == 0 {
        return leaf_type(lcg);
    }
    match lcg.pick(3) {
        0 => Type::array(1 + lcg.pick(8), random_tree(lcg, depth - 1)),
        1 => {
            let fields = (0..1 + lcg.pick(4))
                .map(|_| random_tree(lcg, depth - 1))
                .collect();
            Type::struct_of(fields, false)
        }
        _ => Type::vector(1 + lcg.pick(8), leaf_type(lcg)),
    }
}

/// Pick a valid index for the current position and return the type it
/// descends into, or `None` when the position cannot be indexed further.
fn descend(lcg: &mut Lcg, current: &Type) -> Option<(Constant, Type)> {
    match current {
        Type::Array { len, elem } => {
            let index = Constant::i64(lcg.pick(*len) as i64);
            Some((index, (**elem).clone()))
        }
        Type::Vector { len, elem, .. } => {
            let index = Constant::i64(lcg.pick(*len) as i64);
            Some((index, (**elem).clone()))
        }
        Type::Struct(st) => {
            let k = lcg.pick(st.num_fields() as u64) as usize;
            Some((Constant::i32(k as i64), st.field(k)))
        }
        _ => None,
    }
}

#[test]
fn test_random_gep_chains_yield_expected_leaf() {
    let mut lcg = Lcg(0x5eed);
    for round in 0..200u32 {
        let tree = random_tree(&mut lcg, 1 + (round % 4));
        let src = Constant::global_ref(
            Rc::new(GlobalIdent::named("g")),
            Type::ptr(tree.clone()),
        );

        let mut indices = vec![GepIndex::new(Constant::i64(0))];
        let mut expected = tree.clone();
        for _ in 0..lcg.pick(6) {
            match descend(&mut lcg, &expected) {
                Some((index, next)) => {
                    indices.push(GepIndex::new(index));
                    expected = next;
                }
                None => break,
            }
        }

        let gep = ConstExpr::gep(tree, src, indices);
        assert_eq!(
            gep.ty(),
            Type::ptr(expected.clone()),
            "round {round}: expected pointer to {expected}"
        );
    }
}

#[test]
fn test_random_gep_chains_with_inrange_tag() {
    // The inrange wrapper must not change the derived type.
    let mut lcg = Lcg(0xfeed);
    for _ in 0..50 {
        let tree = random_tree(&mut lcg, 2);
        let src = Constant::global_ref(
            Rc::new(GlobalIdent::named("g")),
            Type::ptr(tree.clone()),
        );
        let mut plain = vec![GepIndex::new(Constant::i64(0))];
        let mut tagged = vec![GepIndex::in_range(Constant::i64(0))];
        let mut expected = tree.clone();
        if let Some((index, next)) = descend(&mut lcg, &expected) {
            plain.push(GepIndex::new(index.clone()));
            tagged.push(GepIndex::in_range(index));
            expected = next;
        }
        let plain = ConstExpr::gep(tree.clone(), src.clone(), plain);
        let tagged = ConstExpr::gep(tree, src, tagged);
        assert_eq!(plain.ty(), tagged.ty());
        assert_eq!(plain.ty(), Type::ptr(expected));
    }
}
