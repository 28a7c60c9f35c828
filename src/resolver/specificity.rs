//! Most-specific selection among the candidates surviving a dispatch phase.
//!
//! Candidate `A` is more specific than `B` when every parameter type of `B` accepts the
//! corresponding parameter type of `A` (by conversion) but not the other way round. The winner
//! must be strictly more specific than every other candidate; if no such candidate exists the
//! call is ambiguous and nothing is selected.

use crate::metadata::{method::MethodRc, typesystem::TypeRc};

/// Relation of one candidate to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Specificity {
    /// Accepts a strict subset of the other candidate's argument shapes
    More,
    /// Accepts a strict superset of the other candidate's argument shapes
    Less,
    /// Mutually assignable or incomparable
    Same,
}

impl Specificity {
    /// `s1`: `a` accepts everything `b` accepts; `s2`: `b` accepts everything `a` accepts
    fn from_flags(s1: bool, s2: bool) -> Self {
        match (s1, s2) {
            (true, false) => Specificity::Less,
            (false, true) => Specificity::More,
            _ => Specificity::Same,
        }
    }

    fn reverse(self) -> Self {
        match self {
            Specificity::More => Specificity::Less,
            Specificity::Less => Specificity::More,
            Specificity::Same => Specificity::Same,
        }
    }
}

/// Signature of the relation used by [`most_specific`]
pub type Comparator = fn(&MethodRc, &MethodRc) -> Specificity;

fn assignable(formal: &TypeRc, actual: &TypeRc) -> bool {
    formal.is_convertible_from(actual)
}

fn element(ty: &TypeRc) -> &TypeRc {
    ty.element().unwrap_or(ty)
}

/// Relation of two variadic element types.
///
/// Two primitive elements are only related when identical, two reference elements through
/// assignability; a primitive and a reference element are incomparable.
fn component_relation(a: &TypeRc, b: &TypeRc) -> (bool, bool) {
    match (a.is_primitive(), b.is_primitive()) {
        (true, true) => {
            let same = a.token == b.token;
            (same, same)
        }
        (false, false) => (a.is_assignable_from(b), b.is_assignable_from(a)),
        _ => (false, false),
    }
}

/// Compare two fixed-arity candidates of equal parameter count
#[must_use]
pub fn compare_fixed(a: &MethodRc, b: &MethodRc) -> Specificity {
    let mut s1 = true;
    let mut s2 = true;
    for (pa, pb) in a.params.iter().zip(&b.params) {
        s1 &= assignable(pa, pb);
        s2 &= assignable(pb, pa);
    }
    Specificity::from_flags(s1, s2)
}

/// Compare two variadic candidates, which may differ in parameter count
#[must_use]
pub fn compare_varargs(a: &MethodRc, b: &MethodRc) -> Specificity {
    if a.params.len() > b.params.len() {
        compare_varargs_ordered(&b.params, &a.params).reverse()
    } else {
        compare_varargs_ordered(&a.params, &b.params)
    }
}

/// `p1` has at most as many parameters as `p2`
fn compare_varargs_ordered(p1: &[TypeRc], p2: &[TypeRc]) -> Specificity {
    let (Some(tail1), Some(tail2)) = (p1.last(), p2.last()) else {
        return Specificity::Same;
    };

    let len = p1.len() - 1;
    let last = p2.len() - 1;
    let mut s1 = true;
    let mut s2 = true;

    for (pa, pb) in p1[..len].iter().zip(&p2[..len]) {
        s1 &= assignable(pa, pb);
        s2 &= assignable(pb, pa);
    }

    let spread = element(tail1);
    for pb in &p2[len..last] {
        s1 &= assignable(spread, pb);
        s2 &= assignable(pb, spread);
    }

    let (c1, c2) = component_relation(element(tail1), element(tail2));
    s1 &= c1;
    s2 &= c2;

    Specificity::from_flags(s1, s2)
}

/// The candidate strictly more specific than every other one.
///
/// # Returns
/// `None` for an empty list or when the most specific candidates tie.
#[must_use]
pub fn most_specific(candidates: &[MethodRc], compare: Comparator) -> Option<MethodRc> {
    match candidates {
        [] => None,
        [single] => Some(single.clone()),
        _ => candidates
            .iter()
            .enumerate()
            .find(|(index, candidate)| {
                candidates
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| other != index)
                    .all(|(_, other)| compare(candidate, other) == Specificity::More)
            })
            .map(|(_, winner)| winner.clone()),
    }
}
