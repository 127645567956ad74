// src/noyau/format.rs
//
// Affichage canonique (grammaire relisible par le lecteur) :
// - puissance `**`, produit `*`, fractions `num/den`
// - sqrt(u), exp(u), pi, E, I, oo, nan
// - signe sorti des termes : `x - 1`, `-cos(x)`, `x**3/3`
// - somme commençant par un terme négatif : un terme positif passe devant (`3 - x`)

use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::expr::Expr;

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&formater(self))
    }
}

/* ------------------------ Helpers rationnels ------------------------ */

fn format_rat(r: &BigRational) -> String {
    let n = r.numer();
    let d = r.denom();
    if d.is_one() {
        format!("{n}")
    } else {
        format!("{n}/{d}")
    }
}

/* ------------------------ Formatage ------------------------ */

pub fn formater(e: &Expr) -> String {
    match e {
        Expr::Rat(r) => format_rat(r),
        Expr::Pi => "pi".to_string(),
        Expr::E => "E".to_string(),
        Expr::I => "I".to_string(),
        Expr::Infini => "oo".to_string(),
        Expr::Indefini => "nan".to_string(),
        Expr::Var(v) => v.clone(),
        Expr::Add(v) => formater_somme(v),
        Expr::Mul(v) => formater_produit(v),
        Expr::Pow(b, x) => formater_puissance(b, x),
        Expr::Fonc(f, x) => format!("{}({})", f.nom(), formater(x)),
    }
}

fn formater_somme(v: &[Expr]) -> String {
    // Premier terme négatif : on fait passer devant le premier terme positif.
    let mut ordre: Vec<&Expr> = v.iter().collect();
    if ordre.first().is_some_and(|t| t.signe_extractible()) {
        if let Some(pos) = ordre.iter().position(|t| !t.signe_extractible()) {
            let t = ordre.remove(pos);
            ordre.insert(0, t);
        }
    }

    let mut s = String::new();
    for (i, t) in ordre.into_iter().enumerate() {
        if i == 0 {
            s.push_str(&formater(t));
        } else if t.signe_extractible() {
            s.push_str(" - ");
            s.push_str(&formater(&-(t.clone())));
        } else {
            s.push_str(" + ");
            s.push_str(&formater(t));
        }
    }
    s
}

fn formater_produit(v: &[Expr]) -> String {
    let mut negatif = false;
    let mut num: Vec<String> = Vec::new();
    let mut den: Vec<String> = Vec::new();

    for f in v {
        match f {
            Expr::Rat(r) => {
                if r.is_negative() {
                    negatif = !negatif;
                }
                let a = r.abs();
                if !a.numer().is_one() {
                    num.push(a.numer().to_string());
                }
                if !a.denom().is_one() {
                    den.push(a.denom().to_string());
                }
            }
            Expr::Pow(b, x) if x.as_rat().is_some_and(|r| r.is_negative()) => {
                let oppose = x.as_rat().map(|r| -r).unwrap_or_else(BigRational::zero);
                if oppose.is_one() {
                    den.push(facteur(b));
                } else {
                    den.push(formater_puissance(b, &Expr::Rat(oppose)));
                }
            }
            autre => num.push(facteur(autre)),
        }
    }

    let mut s = if num.is_empty() {
        "1".to_string()
    } else {
        num.join("*")
    };
    if !den.is_empty() {
        let d = den.join("*");
        if den.len() > 1 {
            s = format!("{s}/({d})");
        } else {
            s = format!("{s}/{d}");
        }
    }
    if negatif {
        format!("-{s}")
    } else {
        s
    }
}

/// Facteur d’un produit : parenthèses autour des sommes.
fn facteur(e: &Expr) -> String {
    match e {
        Expr::Add(_) => format!("({})", formater(e)),
        _ => formater(e),
    }
}

fn formater_puissance(b: &Expr, x: &Expr) -> String {
    if let Expr::Rat(r) = x {
        if r == &BigRational::new(BigInt::one(), BigInt::from(2)) {
            return format!("sqrt({})", formater(b));
        }
        if r.is_negative() {
            let oppose = Expr::Rat(-r);
            let d = if oppose.est_un() {
                facteur_puissance(b)
            } else {
                formater_puissance(b, &oppose)
            };
            return format!("1/{d}");
        }
    }
    if *b == Expr::E {
        return format!("exp({})", formater(x));
    }
    format!("{}**{}", facteur_puissance(b), exposant(x))
}

fn facteur_puissance(b: &Expr) -> String {
    let atome = match b {
        Expr::Rat(r) => r.denom().is_one() && !r.is_negative(),
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow(_, _) => false,
        _ => true,
    };
    if atome {
        formater(b)
    } else {
        format!("({})", formater(b))
    }
}

fn exposant(x: &Expr) -> String {
    let atome = match x {
        Expr::Rat(r) => r.denom().is_one() && !r.is_negative(),
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow(_, _) => false,
        _ => true,
    };
    if atome {
        formater(x)
    } else {
        format!("({})", formater(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::expr::Fonction;

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn polynome() {
        // 3*x**2 + 4
        let e = Expr::somme(vec![
            Expr::produit(vec![Expr::entier(3), Expr::puissance(x(), Expr::entier(2))]),
            Expr::entier(4),
        ]);
        assert_eq!(e.to_string(), "3*x**2 + 4");
    }

    #[test]
    fn fraction_et_signe() {
        let e = Expr::produit(vec![Expr::rat(1, 3), Expr::puissance(x(), Expr::entier(3))]);
        assert_eq!(e.to_string(), "x**3/3");
        assert_eq!((-Expr::fonction(Fonction::Cos, x())).to_string(), "-cos(x)");
        assert_eq!((x() - Expr::un()).to_string(), "x - 1");
    }

    #[test]
    fn terme_positif_devant() {
        assert_eq!((Expr::entier(3) - x()).to_string(), "3 - x");
    }

    #[test]
    fn constantes_et_racines() {
        assert_eq!(Expr::racine(Expr::entier(2)).to_string(), "sqrt(2)");
        assert_eq!(Expr::exp(x()).to_string(), "exp(x)");
        assert_eq!(Expr::moins_infini().to_string(), "-oo");
        assert_eq!(
            Expr::produit(vec![Expr::rat(1, 2), Expr::Pi]).to_string(),
            "pi/2"
        );
    }

    #[test]
    fn quotient() {
        let e = Expr::un() / x();
        assert_eq!(e.to_string(), "1/x");
        let e = Expr::entier(2) / (x() + Expr::un());
        assert_eq!(e.to_string(), "2/(x + 1)");
    }
}
