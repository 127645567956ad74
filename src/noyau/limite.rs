// src/noyau/limite.rs
//
// Limites (côté droit pour un point fini).
//
// Démarche :
// - point infini : x = ±1/t, t -> 0+
// - substitution directe si le résultat est défini
// - exp / puissances variables : lim u^v = exp(lim v·log u)
// - sommes et produits terme à terme tant que la forme n’est pas indéterminée
// - quotient : règle de L’Hôpital (profondeur bornée)
// - dernier recours : estimation numérique reconnue comme rationnel simple ou ±∞

use num_bigint::BigInt;
use num_rational::BigRational;
use tracing::trace;

use super::derivee::deriver;
use super::erreur::{ErreurNoyau, Resultat};
use super::expr::{Expr, Fonction};
use super::numerique::{evaluer_constante, evaluer_en};
use super::polynome::en_fraction;
use super::simplification::simplifier;

const PROFONDEUR_MAX: usize = 8;

/// Pas d’approche numérique (côté droit).
const PAS_NUMERIQUES: [f64; 4] = [1e-4, 1e-5, 1e-6, 1e-7];

/// Plus grand dénominateur reconnu par l’estimation numérique.
const MAX_DENOMINATEUR: i64 = 12;

/// lim_{var -> point} e
pub fn limite(e: &Expr, var: &str, point: &Expr) -> Resultat<Expr> {
    limite_prof(e, var, point, 0)
}

fn limite_prof(e: &Expr, var: &str, point: &Expr, prof: usize) -> Resultat<Expr> {
    if prof > PROFONDEUR_MAX {
        return Err(ErreurNoyau::LimiteIndeterminee);
    }
    if !e.contient_var(var) {
        return Ok(e.clone());
    }

    if let Some(s) = point.signe_infini() {
        let t = format!("_t{prof}");
        let x = Expr::entier(i64::from(s)) / Expr::var(&t);
        trace!(var, "limite à l’infini : changement x = ±1/t");
        return limite_prof(&e.substituer(var, &x), &t, &Expr::zero(), prof + 1);
    }

    let directe = e.substituer(var, point);
    if est_definie(&directe) {
        return Ok(directe);
    }

    let rec = |f: &Expr| limite_prof(f, var, point, prof + 1);

    match e {
        // u^v avec v variable
        Expr::Pow(b, x) if x.contient_var(var) => {
            let l = if **b == Expr::E {
                rec(x)
            } else {
                rec(&(x.as_ref().clone() * Expr::fonction(Fonction::Log, b.as_ref().clone())))
            };
            if let Ok(l) = l {
                let r = Expr::exp(l);
                if est_definie(&r) {
                    return Ok(r);
                }
            }
        }
        Expr::Fonc(f, u) => {
            if let Ok(l) = rec(u) {
                let r = Expr::fonction(*f, l);
                if est_definie(&r) {
                    return Ok(r);
                }
            }
        }
        Expr::Add(v) => {
            if let Some(r) = combiner(v, &rec, Expr::somme) {
                return Ok(r);
            }
        }
        _ => {}
    }

    // quotient n/d
    let (n, d) = en_fraction(e);
    if !d.est_un() {
        if let Ok(Some(r)) = quotient(&n, &d, var, point, prof) {
            return Ok(r);
        }
    }

    // 0·∞ : f·g = g / (1/f), sinon f / (1/g), quand g explose
    if let Expr::Mul(v) = e {
        if let Some(r) = combiner(v, &rec, Expr::produit) {
            return Ok(r);
        }
        for (i, g) in v.iter().enumerate() {
            if rec(g).ok().and_then(|l| l.signe_infini()).is_none() {
                continue;
            }
            let mut autres = v.clone();
            autres.remove(i);
            let f = Expr::produit(autres);
            let essais = [
                (g.clone(), f.clone().inverse()),
                (f, g.clone().inverse()),
            ];
            for (num, den) in &essais {
                if let Ok(Some(r)) = quotient(num, den, var, point, prof) {
                    return Ok(r);
                }
            }
        }
    }

    estimation_numerique(e, var, point)
}

/// Ni indéfini ni infini enfoui, et évaluable quand constant (±∞ accepté).
fn est_definie(e: &Expr) -> bool {
    if e.existe(&|n| matches!(n, Expr::Indefini)) {
        return false;
    }
    if e.signe_infini().is_some() {
        return true;
    }
    if !e.est_fini() {
        return false;
    }
    !e.est_constant() || evaluer_constante(e).is_ok()
}

/// Combine les limites des parties si le résultat reste défini.
fn combiner(
    v: &[Expr],
    rec: &dyn Fn(&Expr) -> Resultat<Expr>,
    assemble: fn(Vec<Expr>) -> Expr,
) -> Option<Expr> {
    let parties: Vec<Expr> = v.iter().map(rec).collect::<Resultat<_>>().ok()?;
    let r = assemble(parties);
    est_definie(&r).then_some(r)
}

/// L’Hôpital sur n/d (None si la forme ne s’y prête pas).
fn quotient(n: &Expr, d: &Expr, var: &str, point: &Expr, prof: usize) -> Resultat<Option<Expr>> {
    let ln = limite_prof(n, var, point, prof + 1);
    let ld = limite_prof(d, var, point, prof + 1);

    let (ln, ld) = match (ln, ld) {
        (Ok(a), Ok(b)) => (a, b),
        _ => return Ok(None),
    };

    let zero_zero = ln.est_zero() && ld.est_zero();
    let inf_inf = ln.signe_infini().is_some() && ld.signe_infini().is_some();

    if zero_zero || inf_inf {
        trace!(prof, "forme indéterminée : L’Hôpital");
        let q = simplifier(&(deriver(n, var) / deriver(d, var)));
        return limite_prof(&q, var, point, prof + 1).map(Some);
    }

    if ld.est_zero() {
        // a/0 : le signe se lit à droite du point
        return Ok(signe_a_droite(&(n.clone() / d.clone()), var, point).map(|s| {
            if s > 0 {
                Expr::Infini
            } else {
                Expr::moins_infini()
            }
        }));
    }

    let r = ln / ld;
    Ok(est_definie(&r).then_some(r))
}

fn point_f64(point: &Expr) -> Option<f64> {
    let z = evaluer_constante(point).ok()?;
    (z.im == 0.0).then_some(z.re)
}

fn signe_a_droite(e: &Expr, var: &str, point: &Expr) -> Option<i8> {
    let x0 = point_f64(point)?;
    let v = evaluer_en(e, var, x0 + 1e-6 * (1.0 + x0.abs()))?;
    if v > 0.0 {
        Some(1)
    } else if v < 0.0 {
        Some(-1)
    } else {
        None
    }
}

/* ------------------------ Estimation numérique ------------------------ */

fn estimation_numerique(e: &Expr, var: &str, point: &Expr) -> Resultat<Expr> {
    let x0 = point_f64(point).ok_or(ErreurNoyau::LimiteIndeterminee)?;
    let valeurs: Vec<f64> = PAS_NUMERIQUES
        .iter()
        .map(|h| evaluer_en(e, var, x0 + h * (1.0 + x0.abs())))
        .collect::<Option<_>>()
        .ok_or(ErreurNoyau::LimiteIndeterminee)?;

    let derniere = valeurs[valeurs.len() - 1];
    let avant = valeurs[valeurs.len() - 2];

    // divergence monotone
    if derniere.abs() > 1e6 && derniere.abs() > avant.abs() && derniere.signum() == avant.signum() {
        return Ok(if derniere > 0.0 {
            Expr::Infini
        } else {
            Expr::moins_infini()
        });
    }

    if (derniere - avant).abs() > 1e-4 * (1.0 + derniere.abs()) {
        return Err(ErreurNoyau::LimiteIndeterminee);
    }

    trace!(valeur = derniere, "limite estimée numériquement");
    reconnaitre(derniere).ok_or(ErreurNoyau::LimiteIndeterminee)
}

/// p/q (q ≤ 12) proche de v.
fn reconnaitre(v: f64) -> Option<Expr> {
    if !v.is_finite() {
        return None;
    }
    for q in 1..=MAX_DENOMINATEUR {
        let p = (v * q as f64).round();
        if (v - p / q as f64).abs() < 1e-5 && p.abs() < 1e12 {
            let r = BigRational::new(BigInt::from(p as i64), BigInt::from(q));
            return Some(Expr::Rat(r));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::rpn::lire_expression;

    fn lim(s: &str, point: &str) -> String {
        let e = lire_expression(s).unwrap();
        let p = lire_expression(point).unwrap();
        limite(&e, "x", &p).unwrap().to_string()
    }

    #[test]
    fn substitution_directe() {
        assert_eq!(lim("x^2 + 1", "2"), "5");
        assert_eq!(lim("sin(x)", "pi/2"), "1");
    }

    #[test]
    fn formes_zero_sur_zero() {
        assert_eq!(lim("sin(x)/x", "0"), "1");
        assert_eq!(lim("(x^2 - 1)/(x - 1)", "1"), "2");
        assert_eq!(lim("(1 - cos(x))/x^2", "0"), "1/2");
    }

    #[test]
    fn a_l_infini() {
        assert_eq!(lim("1/x", "oo"), "0");
        assert_eq!(lim("(2*x^2 + 1)/(x^2 - 3)", "oo"), "2");
        assert_eq!(lim("x^2", "oo"), "oo");
        assert_eq!(lim("x^3", "-oo"), "-oo");
    }

    #[test]
    fn limite_remarquable_e() {
        assert_eq!(lim("(1 + 1/x)^x", "oo"), "E");
    }

    #[test]
    fn pole_cote_droit() {
        assert_eq!(lim("1/x", "0"), "oo");
        assert_eq!(lim("log(x)", "0"), "-oo");
    }

    #[test]
    fn produit_zero_infini() {
        assert_eq!(lim("x*log(x)", "0"), "0");
    }
}
