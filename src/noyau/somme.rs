// src/noyau/somme.rs
//
// Sommes Σ_{k=a}^{b} f(k).
// - bornes finies, peu de termes : somme exacte terme à terme
// - polynôme en k : interpolation exacte des sommes partielles (degré + 2 points)
// - géométrique : f(k+1)/f(k) constant
// - borne infinie : polynôme (±∞), géométrique |q| < 1, séries de Riemann 1/k^p
//   (p = 1 diverge, p pair via ζ(p)), fractions télescopiques à pôles entiers
// - sinon None : l’appelant affiche la forme non évaluée

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use tracing::debug;

use super::erreur::Resultat;
use super::expr::Expr;
use super::numerique::{evaluer_constante, signe_constante};
use super::polynome::{coefficients, en_fraction, PolyRat};
use super::simplification::simplifier;

/// Borne supérieure d’une somme.
#[derive(Clone, Debug, PartialEq)]
pub enum Borne {
    Finie(BigInt),
    Infinie,
}

impl std::fmt::Display for Borne {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Borne::Finie(n) => write!(f, "{n}"),
            Borne::Infinie => f.write_str("oo"),
        }
    }
}

/// Σ_{var=debut}^{fin} f, None si aucune méthode ne s’applique.
pub fn sommer(
    f: &Expr,
    var: &str,
    debut: &BigInt,
    fin: &Borne,
    max_termes: usize,
) -> Resultat<Option<Expr>> {
    match fin {
        Borne::Finie(b) => {
            if b < debut {
                // bornes inversées : Σ_{a}^{b} = -Σ_{b+1}^{a-1} (vide si b = a - 1)
                let (a2, b2) = (b + BigInt::one(), debut - BigInt::one());
                if a2 > b2 {
                    return Ok(Some(Expr::zero()));
                }
                return Ok(sommer(f, var, &a2, &Borne::Finie(b2), max_termes)?.map(|s| -s));
            }
            let n = b - debut + BigInt::one();
            if n.to_usize().is_some_and(|n| n <= max_termes) {
                return Ok(Some(terme_a_terme(f, var, debut, b)));
            }
            debug!(%n, "trop de termes : formes closes");
            Ok(somme_polynome(f, var, debut, b).or_else(|| geometrique_finie(f, var, debut, b)))
        }
        Borne::Infinie => Ok(somme_infinie(f, var, debut)),
    }
}

fn terme(f: &Expr, var: &str, k: &BigInt) -> Expr {
    f.substituer(var, &Expr::Rat(BigRational::from_integer(k.clone())))
}

fn terme_a_terme(f: &Expr, var: &str, a: &BigInt, b: &BigInt) -> Expr {
    let mut termes = Vec::new();
    let mut k = a.clone();
    while &k <= b {
        termes.push(terme(f, var, &k));
        k += BigInt::one();
    }
    Expr::somme(termes)
}

/* ------------------------ Polynômes ------------------------ */

/// Σ d’un polynôme de degré d : polynôme de degré d + 1 en la borne,
/// évalué par Lagrange sur les sommes partielles S(a), …, S(a + d + 1).
fn somme_polynome(f: &Expr, var: &str, a: &BigInt, b: &BigInt) -> Option<Expr> {
    let degre = coefficients(f, var)?.len() - 1;
    let points: Vec<BigInt> = (0..=degre + 1).map(|i| a + BigInt::from(i)).collect();

    let mut partielles = Vec::with_capacity(points.len());
    let mut acc = Expr::zero();
    for p in &points {
        acc = acc + terme(f, var, p);
        partielles.push(acc.clone());
    }

    let b = BigRational::from_integer(b.clone());
    let mut morceaux = Vec::with_capacity(points.len());
    for (i, (xi, si)) in points.iter().zip(&partielles).enumerate() {
        let xi = BigRational::from_integer(xi.clone());
        let mut poids = BigRational::one();
        for (j, xj) in points.iter().enumerate() {
            if i != j {
                let xj = BigRational::from_integer(xj.clone());
                poids *= (&b - &xj) / (&xi - &xj);
            }
        }
        morceaux.push(Expr::Rat(poids) * si.clone());
    }
    Some(Expr::somme(morceaux))
}

/* ------------------------ Géométriques ------------------------ */

/// Raison q = f(k+1)/f(k) si elle ne dépend pas de k (q ≠ 1).
fn raison(f: &Expr, var: &str) -> Option<Expr> {
    let k = Expr::var(var);
    let suivant = f.substituer(var, &(k + Expr::un()));
    let q = simplifier(&(suivant / f.clone()));
    (!q.contient_var(var) && !q.est_un() && q.est_fini()).then_some(q)
}

fn geometrique_finie(f: &Expr, var: &str, a: &BigInt, b: &BigInt) -> Option<Expr> {
    let q = raison(f, var)?;
    let n = b - a + BigInt::one();
    let qn = Expr::puissance(q.clone(), Expr::Rat(BigRational::from_integer(n)));
    Some(terme(f, var, a) * (Expr::un() - qn) / (Expr::un() - q))
}

/* ------------------------ Borne infinie ------------------------ */

fn somme_infinie(f: &Expr, var: &str, a: &BigInt) -> Option<Expr> {
    if let Some(cs) = coefficients(f, var) {
        let dominant = cs.last()?;
        if dominant.est_zero() {
            return Some(Expr::zero());
        }
        return Some(match signe_constante(dominant)? {
            1 => Expr::Infini,
            _ => Expr::moins_infini(),
        });
    }

    if let Some(q) = raison(f, var) {
        let z = evaluer_constante(&q).ok()?;
        if z.im != 0.0 {
            return None;
        }
        let premier = terme(f, var, a);
        return if z.re.abs() < 1.0 {
            Some(premier / (Expr::un() - q))
        } else if z.re >= 1.0 {
            match signe_constante(&premier)? {
                1 => Some(Expr::Infini),
                -1 => Some(Expr::moins_infini()),
                _ => None,
            }
        } else {
            None
        };
    }

    if !a.is_positive() {
        return None;
    }
    serie_riemann(f, var, a).or_else(|| telescopique(f, var, a))
}

/// ζ(p) pour p pair ≤ 8.
fn zeta_pair(p: i64) -> Option<Expr> {
    let d = match p {
        2 => 6,
        4 => 90,
        6 => 945,
        8 => 9450,
        _ => return None,
    };
    Some(Expr::puissance(Expr::Pi, Expr::entier(p)) / Expr::entier(d))
}

/// c / k^p
fn serie_riemann(f: &Expr, var: &str, a: &BigInt) -> Option<Expr> {
    let (c, reste) = f.coeff_et_reste();
    let Expr::Pow(base, p) = &reste else { return None };
    if !matches!(base.as_ref(), Expr::Var(v) if v == var) {
        return None;
    }
    let p = -p.as_entier()?;
    let c = Expr::Rat(c);

    if p == 1 {
        return Some(if signe_constante(&c)? > 0 {
            Expr::Infini
        } else {
            Expr::moins_infini()
        });
    }

    // ζ(p) − Σ_{k<a} 1/k^p
    let zeta = zeta_pair(p)?;
    let debut = terme_a_terme(&reste, var, &BigInt::one(), &(a - BigInt::one()));
    Some(c * (zeta - debut))
}

/// Σ_{k≥a} n(k)/d(k), d à racines rationnelles simples décalées d’entiers :
/// Σ A_i/(k − r_i) avec Σ A_i = 0 vaut −Σ A_i·H(a − r_i − 1).
fn telescopique(f: &Expr, var: &str, a: &BigInt) -> Option<Expr> {
    let (n, d) = en_fraction(f);
    let pn = PolyRat::depuis_expr(&n, var)?;
    let pd = PolyRat::depuis_expr(&d, var)?;
    let deg_d = pd.degre()?;
    if pn.degre().unwrap_or(0) >= deg_d {
        return None;
    }

    let racines = pd.racines_rationnelles();
    if racines.len() != deg_d {
        return None;
    }

    let derivee = pd.derivee();
    let a = BigRational::from_integer(a.clone());
    let mut total_a = BigRational::zero();
    let mut valeur = BigRational::zero();

    for r in &racines {
        let ai = pn.eval(r) / derivee.eval(r);
        let s = &a - r;
        if !s.is_integer() || !s.is_positive() {
            return None;
        }
        let h = harmonique(s.to_integer().to_u64()? - 1)?;
        valeur -= &ai * h;
        total_a += ai;
    }

    total_a.is_zero().then_some(Expr::Rat(valeur))
}

/// H(n) = Σ_{j=1}^{n} 1/j (borné).
fn harmonique(n: u64) -> Option<BigRational> {
    if n > 100_000 {
        return None;
    }
    let mut h = BigRational::zero();
    for j in 1..=n {
        h += BigRational::new(BigInt::one(), BigInt::from(j));
    }
    Some(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::rpn::lire_expression;

    fn somme(f: &str, a: i64, b: Option<i64>, max: usize) -> Option<String> {
        let f = lire_expression(f).unwrap();
        let fin = match b {
            Some(b) => Borne::Finie(BigInt::from(b)),
            None => Borne::Infinie,
        };
        sommer(&f, "k", &BigInt::from(a), &fin, max)
            .unwrap()
            .map(|e| simplifier(&e).to_string())
    }

    #[test]
    fn terme_a_terme_exact() {
        assert_eq!(somme("k^2", 1, Some(5), 100).as_deref(), Some("55"));
        assert_eq!(somme("1/k", 1, Some(3), 100).as_deref(), Some("11/6"));
    }

    #[test]
    fn polynome_forme_close() {
        // hors budget de termes : interpolation
        assert_eq!(somme("k", 1, Some(1000), 10).as_deref(), Some("500500"));
        assert_eq!(somme("k^2", 1, Some(100), 10).as_deref(), Some("338350"));
    }

    #[test]
    fn geometrique() {
        assert_eq!(somme("2^k", 0, Some(20), 5).as_deref(), Some("2097151"));
        assert_eq!(somme("(1/2)^k", 0, None, 100).as_deref(), Some("2"));
    }

    #[test]
    fn series_infinies() {
        assert_eq!(somme("1/k^2", 1, None, 100).as_deref(), Some("pi**2/6"));
        assert_eq!(somme("1/k", 1, None, 100).as_deref(), Some("oo"));
        assert_eq!(somme("k", 1, None, 100).as_deref(), Some("oo"));
        assert_eq!(somme("1/(k*(k + 1))", 1, None, 100).as_deref(), Some("1"));
    }

    #[test]
    fn bornes_inversees() {
        // Σ_{5}^{1} k = -(2 + 3 + 4)
        assert_eq!(somme("k", 5, Some(1), 100).as_deref(), Some("-9"));
        assert_eq!(somme("k^2", 3, Some(1), 100).as_deref(), Some("-4"));
        // b = a - 1 : somme vide
        assert_eq!(somme("k", 5, Some(4), 100).as_deref(), Some("0"));
        // forme close aussi quand les bornes sont inversées
        assert_eq!(somme("k", 1001, Some(0), 10).as_deref(), Some("-500500"));
    }

    #[test]
    fn sans_forme_close() {
        assert_eq!(somme("sin(k)", 1, None, 100), None);
    }
}
