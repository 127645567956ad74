// src/noyau/trig.rs
//
// Trig spéciale (angles “exactement reconnus”)
// -------------------------------------------
// - Extraction coeff·π : 0, π, c·π (c rationnel)
// - Réduction modulo période via mod_rationnel() (sin/cos: 2 ; tan: 1)
// - Table angles spéciaux sur n ∈ {1,2,3,4,6}
// - cot/sec/csc : inverse de tan/cos/sin (0 => indéfini)
// - Réciproques : petite table (asin, acos, atan, acot…) + atan(±∞)

use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

use super::expr::{mod_rationnel, Expr, Fonction};

/// Coefficient c tel que x = c·π (None si x n’est pas un multiple rationnel de π).
pub fn as_coeff_pi(x: &Expr) -> Option<BigRational> {
    match x {
        Expr::Rat(r) if r.is_zero() => Some(BigRational::zero()),
        Expr::Pi => Some(BigRational::one()),
        Expr::Mul(v) if v.len() == 2 && v[1] == Expr::Pi => v[0].as_rat().cloned(),
        _ => None,
    }
}

/// Valeur exacte d’une fonction circulaire en un angle spécial.
///
/// - Some(valeur) si reconnu (Indefini pour tan(π/2), cot(0)…)
/// - None si non reconnu
pub fn valeur_speciale(f: Fonction, x: &Expr) -> Option<Expr> {
    match f {
        Fonction::Sin | Fonction::Cos | Fonction::Tan => table(f, x),
        Fonction::Csc => table(Fonction::Sin, x).map(inverse),
        Fonction::Sec => table(Fonction::Cos, x).map(inverse),
        Fonction::Cot => table(Fonction::Tan, x).map(|v| {
            if matches!(v, Expr::Indefini) {
                Expr::zero()
            } else {
                inverse(v)
            }
        }),
        _ => None,
    }
}

fn inverse(v: Expr) -> Expr {
    if v.est_zero() {
        Expr::Indefini
    } else {
        Expr::puissance(v, Expr::entier(-1))
    }
}

fn table(f: Fonction, x: &Expr) -> Option<Expr> {
    // 1) extraire coeff·π
    let coeff = as_coeff_pi(x)?;

    // 2) réduire modulo période
    let coeff_reduit = match f {
        Fonction::Tan => mod_rationnel(&coeff, 1),
        _ => mod_rationnel(&coeff, 2),
    };

    // 3) convertir en k/n "petit"
    let (k, n) = rational_to_small_kn(&coeff_reduit)?;

    // 4) réduction modulo 2π : k mod (2n)
    let k_mod = k.rem_euclid(2 * n);

    let zero = Expr::zero();
    let one = Expr::un();
    let neg_one = Expr::entier(-1);
    let half = Expr::rat(1, 2);
    let neg_half = Expr::rat(-1, 2);

    let sqrt2_over_2 = Expr::produit(vec![Expr::rat(1, 2), Expr::racine(Expr::entier(2))]);
    let sqrt3_over_2 = Expr::produit(vec![Expr::rat(1, 2), Expr::racine(Expr::entier(3))]);
    let sqrt3_over_3 = Expr::produit(vec![Expr::rat(1, 3), Expr::racine(Expr::entier(3))]);
    let sqrt3 = Expr::racine(Expr::entier(3));

    let out = match f {
        Fonction::Sin => match (k_mod, n) {
            (0, _) | (1, 1) => zero,
            (1, 6) | (5, 6) => half,
            (7, 6) | (11, 6) => neg_half,
            (1, 4) | (3, 4) => sqrt2_over_2,
            (5, 4) | (7, 4) => -sqrt2_over_2,
            (1, 3) | (2, 3) => sqrt3_over_2,
            (4, 3) | (5, 3) => -sqrt3_over_2,
            (1, 2) => one,
            (3, 2) => neg_one,
            _ => return None,
        },

        Fonction::Cos => match (k_mod, n) {
            (0, _) => one,
            (1, 1) => neg_one,
            (1, 6) | (11, 6) => sqrt3_over_2,
            (5, 6) | (7, 6) => -sqrt3_over_2,
            (1, 4) | (7, 4) => sqrt2_over_2,
            (3, 4) | (5, 4) => -sqrt2_over_2,
            (1, 3) | (5, 3) => half,
            (2, 3) | (4, 3) => neg_half,
            (1, 2) | (3, 2) => zero,
            _ => return None,
        },

        Fonction::Tan => match (k_mod, n) {
            (0, _) | (1, 1) => zero,
            (1, 6) | (7, 6) => sqrt3_over_3,
            (5, 6) | (11, 6) => -sqrt3_over_3,
            (1, 4) | (5, 4) => one,
            (3, 4) | (7, 4) => neg_one,
            (1, 3) | (4, 3) => sqrt3,
            (2, 3) | (5, 3) => -sqrt3,
            (1, 2) | (3, 2) => Expr::Indefini,
            _ => return None,
        },

        _ => return None,
    };

    Some(out)
}

/// Réciproques et hyperboliques : valeurs exactes usuelles.
pub fn valeur_reciproque(f: Fonction, x: &Expr) -> Option<Expr> {
    let pi_sur = |n: i64| Expr::produit(vec![Expr::rat(1, n), Expr::Pi]);

    if let Some(s) = x.signe_infini() {
        let v = match f {
            Fonction::Atan => pi_sur(2),
            Fonction::Acot => Expr::zero(),
            Fonction::Tanh => Expr::un(),
            Fonction::Sinh => Expr::Infini,
            Fonction::Cosh => return Some(Expr::Infini),
            _ => return None,
        };
        return Some(if s < 0 { -v } else { v });
    }

    let r = x.as_rat()?;
    let (p, q) = (r.numer().to_i64()?, r.denom().to_i64()?);

    let v = match (f, p, q) {
        (Fonction::Asin | Fonction::Atan | Fonction::Sinh | Fonction::Tanh, 0, _) => Expr::zero(),
        (Fonction::Cosh, 0, _) => Expr::un(),
        (Fonction::Asin, 1, 1) => pi_sur(2),
        (Fonction::Asin, 1, 2) => pi_sur(6),
        (Fonction::Acos, 1, 1) => Expr::zero(),
        (Fonction::Acos, 0, _) => pi_sur(2),
        (Fonction::Acos, 1, 2) => pi_sur(3),
        (Fonction::Acos, -1, 2) => Expr::produit(vec![Expr::rat(2, 3), Expr::Pi]),
        (Fonction::Acos, -1, 1) => Expr::Pi,
        (Fonction::Atan, 1, 1) => pi_sur(4),
        (Fonction::Acot, 0, _) => pi_sur(2),
        (Fonction::Acot, 1, 1) => pi_sur(4),
        (Fonction::Asec, 1, 1) => Expr::zero(),
        (Fonction::Asec, -1, 1) => Expr::Pi,
        (Fonction::Acsc, 1, 1) => pi_sur(2),
        _ => return None,
    };
    Some(v)
}

/* ------------------------ Outils ------------------------ */

/// Convertit un rationnel en (k,n) i64 réduit.
/// Accepte seulement n ∈ {1,2,3,4,6}.
fn rational_to_small_kn(r: &BigRational) -> Option<(i64, i64)> {
    let denom = r.denom().to_i64()?;
    let numer = r.numer().to_i64()?;

    let g = gcd_i64(numer.abs(), denom.abs()).max(1);
    let k = numer / g;
    let n = denom / g;

    if [1, 2, 3, 4, 6].contains(&n) {
        Some((k, n))
    } else {
        None
    }
}

fn gcd_i64(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pi_fois(n: i64, d: i64) -> Expr {
        Expr::produit(vec![Expr::rat(n, d), Expr::Pi])
    }

    #[test]
    fn sin_pi_6() {
        assert_eq!(valeur_speciale(Fonction::Sin, &pi_fois(1, 6)), Some(Expr::rat(1, 2)));
    }

    #[test]
    fn cos_pi() {
        assert_eq!(valeur_speciale(Fonction::Cos, &Expr::Pi), Some(Expr::entier(-1)));
    }

    #[test]
    fn tan_pi_2_indefini() {
        assert_eq!(valeur_speciale(Fonction::Tan, &pi_fois(1, 2)), Some(Expr::Indefini));
        assert_eq!(valeur_speciale(Fonction::Cot, &pi_fois(1, 2)), Some(Expr::zero()));
    }

    #[test]
    fn periodicite_9pi_4() {
        let v = valeur_speciale(Fonction::Sin, &pi_fois(9, 4)).unwrap();
        let attendu = valeur_speciale(Fonction::Sin, &pi_fois(1, 4)).unwrap();
        assert_eq!(v, attendu);
    }

    #[test]
    fn angle_non_reconnu() {
        assert_eq!(valeur_speciale(Fonction::Sin, &pi_fois(1, 5)), None);
        assert_eq!(valeur_speciale(Fonction::Sin, &Expr::var("x")), None);
    }

    #[test]
    fn reciproques() {
        assert_eq!(valeur_reciproque(Fonction::Atan, &Expr::un()), Some(pi_fois(1, 4)));
        assert_eq!(valeur_reciproque(Fonction::Atan, &Expr::Infini), Some(pi_fois(1, 2)));
        assert_eq!(valeur_reciproque(Fonction::Acos, &Expr::entier(-1)), Some(Expr::Pi));
    }
}
