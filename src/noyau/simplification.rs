// src/noyau/simplification.rs
//
// Simplification “au plus court” :
// - candidats : forme canonique, identités trig, développement, fraction réduite
// - on garde le candidat qui compte le moins d’opérations (le premier en cas d’égalité)

use std::collections::BTreeSet;

use num_traits::{One, Signed};

use super::expr::Expr;
use super::identites_trig::identites_trig;
use super::polynome::{developper, en_fraction, PolyRat};

/// Au-delà, on ne tente que la forme canonique.
const TAILLE_MAX: usize = 400;

pub fn simplifier(e: &Expr) -> Expr {
    if e.taille() > TAILLE_MAX {
        return e.clone();
    }

    let mut candidats = vec![e.clone(), identites_trig(e)];

    let dev = developper(e);
    if dev != *e {
        candidats.push(identites_trig(&dev));
    }

    if let Some(f) = annuler(e) {
        candidats.push(identites_trig(&f));
        candidats.push(f);
    }

    candidats
        .into_iter()
        .min_by_key(compter_ops)
        .unwrap_or_else(|| e.clone())
}

/// Mise au même dénominateur puis division par le pgcd (cas univarié rationnel).
pub fn annuler(e: &Expr) -> Option<Expr> {
    let (n, d) = en_fraction(e);
    if d.est_un() {
        return None;
    }
    let (n, d) = (developper(&n), developper(&d));
    if d.est_zero() {
        return None;
    }

    let mut vars: BTreeSet<String> = n.variables_libres();
    vars.extend(d.variables_libres());

    if vars.len() == 1 {
        let v = vars.iter().next()?;
        if let (Some(pn), Some(pd)) = (PolyRat::depuis_expr(&n, v), PolyRat::depuis_expr(&d, v)) {
            if pd.est_nul() {
                return None;
            }
            let g = PolyRat::pgcd(&pn, &pd);
            let (qn, _) = pn.div_euclide(&g);
            let (qd, _) = pd.div_euclide(&g);

            // dénominateur de coefficient dominant 1
            let lead = qd.0.last()?.clone();
            let qn = qn.echelle(&lead.recip());
            let qd = qd.unitaire();
            return Some(qn.vers_expr(v) / qd.vers_expr(v));
        }
    }

    Some(n / d)
}

/// Nombre d’opérations visibles à l’affichage (+, *, /, **, fonctions, signe).
pub fn compter_ops(e: &Expr) -> usize {
    match e {
        Expr::Rat(r) => usize::from(r.is_negative()) + usize::from(!r.denom().is_one()),
        Expr::Pi | Expr::E | Expr::I | Expr::Infini | Expr::Indefini | Expr::Var(_) => 0,
        Expr::Add(v) => v.len() - 1 + v.iter().map(compter_ops).sum::<usize>(),
        Expr::Mul(v) => {
            let moins_un = v.first().is_some_and(|c| c.as_entier() == Some(-1));
            let internes = v.len() - 1 - usize::from(moins_un);
            internes + v.iter().map(compter_ops).sum::<usize>()
        }
        Expr::Pow(b, x) => 1 + compter_ops(b) + compter_ops(x),
        Expr::Fonc(_, x) => 1 + compter_ops(x),
    }
}
