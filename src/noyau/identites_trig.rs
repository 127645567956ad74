// src/noyau/identites_trig.rs
//
// Identités trigonométriques exactes (anti-boucle)
//
// Objectifs :
// - Règles toujours sûres (réduisent / normalisent sans exploser)
// - Garde-fous anti-boucle via score (noeuds, profondeur) + passes bornées
// - Zéro flottants
//
// Règles incluses :
// B1 Parité : faite à la construction (canon.rs)
// B2 Décalage par k·π/2 (couvre ±π, ±2π, symétrie π − x)
//   sin(u + π/2) -> cos(u)     sin(u + π) -> -sin(u)     sin(u + 3π/2) -> -cos(u)
//   cos(u + π/2) -> -sin(u)    cos(u + π) -> -cos(u)     cos(u + 3π/2) -> sin(u)
//   tan(u + π)   -> tan(u)     tan(u + π/2) -> -cot(u)
// B3 Pythagoricienne (sommes n-aires)
//   c·sin(u)^2·R + c·cos(u)^2·R -> c·R
//   c·sin(u)^2 − c -> −c·cos(u)^2   (et symétrique en cos)
// BONUS : sin(u)·cos(u)^(-1) -> tan(u)
//
// IMPORTANT : on N’EXPAND PAS tan(x) -> sin/cos (risque de boucles / indéfinis).

use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

use super::expr::{mod_rationnel, Expr, Fonction};
use super::trig::as_coeff_pi;

pub fn identites_trig(e: &Expr) -> Expr {
    // Passes bornées : on réécrit tant que ça n’empire pas le score.
    let mut cur = e.clone();
    let mut cur_score = score(&cur);

    for _ in 0..6 {
        let next = reecrire(&cur);
        if next == cur {
            break;
        }

        let next_score = score(&next);
        if next_score <= cur_score {
            cur = next;
            cur_score = next_score;
        } else {
            break;
        }
    }

    cur
}

/* ------------------------ réécriture : 1 passe ------------------------ */

fn reecrire(e: &Expr) -> Expr {
    // enfants d’abord
    let e = match e {
        Expr::Add(v) => Expr::somme(v.iter().map(reecrire).collect()),
        Expr::Mul(v) => Expr::produit(v.iter().map(reecrire).collect()),
        Expr::Pow(b, x) => Expr::puissance(reecrire(b), reecrire(x)),
        Expr::Fonc(f, x) => Expr::fonction(*f, reecrire(x)),
        _ => e.clone(),
    };

    decalage(&e)
        .or_else(|| pythagore(&e))
        .or_else(|| pythagore_complement(&e))
        .or_else(|| quotient_tan(&e))
        .unwrap_or(e)
}

/* ------------------------ B2 : décalages ------------------------ */

fn decalage(e: &Expr) -> Option<Expr> {
    let Expr::Fonc(f, x) = e else { return None };
    if !matches!(f, Fonction::Sin | Fonction::Cos | Fonction::Tan) {
        return None;
    }
    let Expr::Add(v) = x.as_ref() else { return None };

    // terme c·π avec 2c entier
    let (pos, c) = v
        .iter()
        .enumerate()
        .find_map(|(i, t)| as_coeff_pi(t).filter(|c| !c.is_zero()).map(|c| (i, c)))?;
    let quarts = mod_rationnel(&(c * BigRational::from_integer(2.into())), 4);
    if !quarts.denom().is_one() {
        return None;
    }
    let k = quarts.numer().to_i64()?;

    let mut reste = v.clone();
    reste.remove(pos);
    let u = Expr::somme(reste);

    let sin = || Expr::fonction(Fonction::Sin, u.clone());
    let cos = || Expr::fonction(Fonction::Cos, u.clone());

    Some(match (f, k) {
        (Fonction::Sin, 0) => sin(),
        (Fonction::Sin, 1) => cos(),
        (Fonction::Sin, 2) => -sin(),
        (Fonction::Sin, _) => -cos(),
        (Fonction::Cos, 0) => cos(),
        (Fonction::Cos, 1) => -sin(),
        (Fonction::Cos, 2) => -cos(),
        (Fonction::Cos, _) => sin(),
        (_, k) if k % 2 == 0 => Expr::fonction(Fonction::Tan, u),
        _ => -Expr::fonction(Fonction::Cot, u),
    })
}

/* ------------------------ B3 : Pythagore ------------------------ */

fn carre(f: Fonction, u: &Expr) -> Expr {
    Expr::puissance(Expr::fonction(f, u.clone()), Expr::entier(2))
}

/// Argument u si `facteur` = sin(u)^2 (resp. cos).
fn arg_carre(facteur: &Expr, f: Fonction) -> Option<Expr> {
    match facteur {
        Expr::Pow(b, x) if x.as_entier() == Some(2) => match b.as_ref() {
            Expr::Fonc(g, u) if *g == f => Some((**u).clone()),
            _ => None,
        },
        _ => None,
    }
}

fn facteurs(t: &Expr) -> Vec<Expr> {
    match t {
        Expr::Mul(v) => v.clone(),
        _ => vec![t.clone()],
    }
}

/// c·sin(u)^2·R + c·cos(u)^2·R -> c·R
fn pythagore(e: &Expr) -> Option<Expr> {
    let Expr::Add(v) = e else { return None };

    for (i, t) in v.iter().enumerate() {
        for (j, f) in facteurs(t).iter().enumerate() {
            let Some(u) = arg_carre(f, Fonction::Sin) else { continue };

            let mut partenaire = facteurs(t);
            partenaire[j] = carre(Fonction::Cos, &u);
            let partenaire = Expr::produit(partenaire);

            if let Some(k) = v.iter().position(|w| *w == partenaire) {
                let mut reste = facteurs(t);
                reste.remove(j);
                let mut nouveaux: Vec<Expr> = v
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| *idx != i && *idx != k)
                    .map(|(_, w)| w.clone())
                    .collect();
                nouveaux.push(Expr::produit(reste));
                return Some(Expr::somme(nouveaux));
            }
        }
    }
    None
}

/// c·sin(u)^2 − c -> −c·cos(u)^2 (et c·cos(u)^2 − c -> −c·sin(u)^2)
fn pythagore_complement(e: &Expr) -> Option<Expr> {
    let Expr::Add(v) = e else { return None };
    let constante = v.iter().find_map(|t| t.as_rat().cloned())?;

    for (i, t) in v.iter().enumerate() {
        let (c, reste) = t.coeff_et_reste();
        for (f, autre) in [(Fonction::Sin, Fonction::Cos), (Fonction::Cos, Fonction::Sin)] {
            let Some(u) = arg_carre(&reste, f) else { continue };
            if c.clone() + &constante != BigRational::zero() {
                continue;
            }
            let mut nouveaux: Vec<Expr> = v
                .iter()
                .enumerate()
                .filter(|(idx, w)| *idx != i && w.as_rat().is_none())
                .map(|(_, w)| w.clone())
                .collect();
            nouveaux.push(Expr::produit(vec![Expr::Rat(-c.clone()), carre(autre, &u)]));
            return Some(Expr::somme(nouveaux));
        }
    }
    None
}

/* ------------------------ BONUS : sin/cos -> tan ------------------------ */

fn quotient_tan(e: &Expr) -> Option<Expr> {
    let Expr::Mul(v) = e else { return None };

    for (i, f) in v.iter().enumerate() {
        let Expr::Fonc(Fonction::Sin, u) = f else { continue };
        let cible = Expr::puissance(
            Expr::fonction(Fonction::Cos, (**u).clone()),
            Expr::entier(-1),
        );
        if let Some(k) = v.iter().position(|w| *w == cible) {
            let mut nouveaux: Vec<Expr> = v
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != i && *idx != k)
                .map(|(_, w)| w.clone())
                .collect();
            nouveaux.push(Expr::fonction(Fonction::Tan, (**u).clone()));
            return Some(Expr::produit(nouveaux));
        }
    }
    None
}

/* ------------------------ score anti-boucle ------------------------ */

fn score(e: &Expr) -> (usize, usize) {
    (e.taille(), profondeur(e))
}

fn profondeur(e: &Expr) -> usize {
    1 + e.enfants().iter().map(|c| profondeur(c)).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::rpn::lire_expression;

    fn simp(s: &str) -> String {
        identites_trig(&lire_expression(s).unwrap()).to_string()
    }

    #[test]
    fn pythagore_simple() {
        assert_eq!(simp("sin(x)^2 + cos(x)^2"), "1");
        assert_eq!(simp("2*sin(x)^2 + 2*cos(x)^2 + x"), "x + 2");
    }

    #[test]
    fn pythagore_complementaire() {
        assert_eq!(simp("1 - sin(x)^2"), "cos(x)**2");
    }

    #[test]
    fn decalages() {
        assert_eq!(simp("sin(x + pi)"), "-sin(x)");
        assert_eq!(simp("cos(x + pi/2)"), "-sin(x)");
        assert_eq!(simp("sin(pi - x)"), "sin(x)");
        assert_eq!(simp("sin(x + 2*pi)"), "sin(x)");
    }

    #[test]
    fn quotient_en_tan() {
        assert_eq!(simp("sin(x)/cos(x)"), "tan(x)");
    }
}
