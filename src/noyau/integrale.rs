// src/noyau/integrale.rs
//
// Primitives (sans constante d’intégration).
//
// Stratégies, dans l’ordre :
// 1. linéarité (sommes, facteurs constants)
// 2. table sur argument affine : u^n, c^u, sin(u), log(u)…, carrés trig
// 3. fractions rationnelles : partie entière + éléments simples
//    (racines rationnelles avec multiplicité, au plus un facteur de degré 2 irréductible)
// 4. changement de variable u = g(x) quand f / g' ne dépend plus que de u
// 5. intégration par parties (u = log / réciproque, sinon puissance de x)
// 6. développement puis nouvel essai
//
// Profondeur bornée : None si rien ne s’applique.

use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::derivee::deriver;
use super::expr::{Expr, Fonction};
use super::numerique::signe_constante;
use super::polynome::{coefficients, developper, en_fraction, PolyRat};
use super::simplification::simplifier;

const PROFONDEUR_MAX: usize = 3;

/// Noyaux essayés par changement de variable.
const MAX_NOYAUX: usize = 8;

/// Primitive de `e` par rapport à `var`, None si aucune règle ne s’applique.
pub fn integrer(e: &Expr, var: &str) -> Option<Expr> {
    integrer_prof(e, var, 0)
}

fn integrer_prof(e: &Expr, var: &str, prof: usize) -> Option<Expr> {
    if prof > PROFONDEUR_MAX || !e.est_fini() {
        return None;
    }
    if !e.contient_var(var) {
        return Some(e.clone() * Expr::var(var));
    }

    match e {
        Expr::Add(v) => {
            let mut morceaux = Vec::with_capacity(v.len());
            for t in v {
                morceaux.push(integrer_prof(t, var, prof)?);
            }
            return Some(Expr::somme(morceaux));
        }
        Expr::Mul(v) => {
            let (constantes, variables): (Vec<Expr>, Vec<Expr>) =
                v.iter().cloned().partition(|f| !f.contient_var(var));
            if !constantes.is_empty() {
                let reste = Expr::produit(variables);
                return integrer_prof(&reste, var, prof).map(|p| Expr::produit(constantes) * p);
            }
        }
        _ => {}
    }

    table(e, var)
        .or_else(|| fraction_rationnelle(e, var))
        .or_else(|| substitution(e, var, prof))
        .or_else(|| par_parties(e, var, prof))
        .or_else(|| {
            let d = developper(e);
            if d != *e {
                integrer_prof(&d, var, prof + 1)
            } else {
                None
            }
        })
}

/* ------------------------ Table ------------------------ */

/// u = a·x + b  ->  (a, b), a ≠ 0.
fn affine(u: &Expr, var: &str) -> Option<(Expr, Expr)> {
    match coefficients(u, var)?.as_slice() {
        [b, a] if !a.est_zero() => Some((a.clone(), b.clone())),
        _ => None,
    }
}

fn table(e: &Expr, var: &str) -> Option<Expr> {
    let x = Expr::var(var);

    if let Some(p) = carre_trig(e, var) {
        return Some(p);
    }

    match e {
        Expr::Var(_) => Some(Expr::rat(1, 2) * Expr::puissance(x, Expr::entier(2))),

        // u^n, u affine
        Expr::Pow(b, n) if !n.contient_var(var) => {
            let (a, _) = affine(b, var)?;
            if n.as_entier() == Some(-1) {
                return Some(Expr::fonction(Fonction::Log, (**b).clone()) / a);
            }
            let n1 = (**n).clone() + Expr::un();
            Some(Expr::puissance((**b).clone(), n1.clone()) / (n1 * a))
        }

        // c^u, u affine (exp compris : log(E) = 1)
        Expr::Pow(b, u) if !b.contient_var(var) => {
            let (a, _) = affine(u, var)?;
            let log_b = Expr::fonction(Fonction::Log, (**b).clone());
            Some(e.clone() / (a * log_b))
        }

        Expr::Fonc(f, u) => {
            let (a, _) = affine(u, var)?;
            primitive_fonction(*f, u).map(|p| p / a)
        }

        _ => None,
    }
}

/// F(u) avec F' = f (à diviser par u').
fn primitive_fonction(f: Fonction, u: &Expr) -> Option<Expr> {
    use Fonction::*;

    let app = |g: Fonction| Expr::fonction(g, u.clone());
    let log = |e: Expr| Expr::fonction(Log, e);
    let u2_plus_1 = || Expr::puissance(u.clone(), Expr::entier(2)) + Expr::un();
    let racine_1_moins_u2 =
        || Expr::racine(Expr::un() - Expr::puissance(u.clone(), Expr::entier(2)));

    Some(match f {
        Sin => -app(Cos),
        Cos => app(Sin),
        Tan => -log(app(Cos)),
        Cot => log(app(Sin)),
        Sec => log(app(Sec) + app(Tan)),
        Csc => -log(app(Csc) + app(Cot)),
        Sinh => app(Cosh),
        Cosh => app(Sinh),
        Tanh => log(app(Cosh)),
        Log => u.clone() * app(Log) - u.clone(),
        Asin => u.clone() * app(Asin) + racine_1_moins_u2(),
        Acos => u.clone() * app(Acos) - racine_1_moins_u2(),
        Atan => u.clone() * app(Atan) - Expr::rat(1, 2) * log(u2_plus_1()),
        Acot => u.clone() * app(Acot) + Expr::rat(1, 2) * log(u2_plus_1()),
        Asec | Acsc => return None,
    })
}

/// sin², cos², tan², sec², csc² (et 1/cos², 1/sin²) sur argument affine.
fn carre_trig(e: &Expr, var: &str) -> Option<Expr> {
    use Fonction::*;

    let Expr::Pow(b, n) = e else { return None };
    let Expr::Fonc(f, u) = b.as_ref() else { return None };
    let (a, _) = affine(u, var)?;
    let x = Expr::var(var);
    let u = (**u).clone();
    let sin_2u = || Expr::fonction(Sin, Expr::entier(2) * u.clone());

    let p = match (f, n.as_entier()?) {
        (Sin, 2) => {
            return Some(Expr::rat(1, 2) * x - sin_2u() / (Expr::entier(4) * a));
        }
        (Cos, 2) => {
            return Some(Expr::rat(1, 2) * x + sin_2u() / (Expr::entier(4) * a));
        }
        (Tan, 2) => return Some(Expr::fonction(Tan, u) / a - x),
        (Cot, 2) => return Some(-Expr::fonction(Cot, u) / a - x),
        (Sec, 2) | (Cos, -2) => Expr::fonction(Tan, u),
        (Csc, 2) | (Sin, -2) => -Expr::fonction(Cot, u),
        (Cos, -1) => primitive_fonction(Sec, &u)?,
        (Sin, -1) => primitive_fonction(Csc, &u)?,
        _ => return None,
    };
    Some(p / a)
}

/* ------------------------ Fractions rationnelles ------------------------ */

fn fraction_rationnelle(e: &Expr, var: &str) -> Option<Expr> {
    let (n, d) = en_fraction(e);
    let pn = PolyRat::depuis_expr(&n, var)?;
    let pd = PolyRat::depuis_expr(&d, var)?;
    if pd.est_nul() {
        return None;
    }

    let (q, r) = pn.div_euclide(&pd);
    let mut morceaux = vec![primitive_polynome(&q, var)];
    if !r.est_nul() {
        morceaux.push(elements_simples(&r, &pd, var)?);
    }
    Some(Expr::somme(morceaux))
}

fn primitive_polynome(p: &PolyRat, var: &str) -> Expr {
    let mut c = vec![BigRational::zero()];
    for (k, a) in p.0.iter().enumerate() {
        c.push(a / BigRational::from_integer((k as i64 + 1).into()));
    }
    PolyRat::new(c).vers_expr(var)
}

fn monome_x_moins(r: &BigRational) -> PolyRat {
    PolyRat::new(vec![-r.clone(), BigRational::one()])
}

fn puissance_poly(p: &PolyRat, k: usize) -> PolyRat {
    (0..k).fold(PolyRat::new(vec![BigRational::one()]), |acc, _| acc.fois(p))
}

/// Coefficients de p(t + c) en t.
fn decaler(p: &PolyRat, c: &BigRational) -> PolyRat {
    let t_plus_c = PolyRat::new(vec![c.clone(), BigRational::one()]);
    p.0.iter().rev().fold(PolyRat(Vec::new()), |acc, a| {
        acc.fois(&t_plus_c).moins(&PolyRat::new(vec![-a.clone()]))
    })
}

/// Série de a/b en t, ordre < m (b(0) ≠ 0).
fn serie_quotient(a: &PolyRat, b: &PolyRat, m: usize) -> Vec<BigRational> {
    let zero = BigRational::zero();
    let coeff = |p: &PolyRat, k: usize| p.0.get(k).cloned().unwrap_or_else(BigRational::zero);
    let b0 = coeff(b, 0);
    let mut s: Vec<BigRational> = Vec::with_capacity(m);
    for k in 0..m {
        let mut acc = coeff(a, k);
        for (j, sj) in s.iter().enumerate() {
            let bk = coeff(b, k - j);
            if bk != zero {
                acc -= sj * bk;
            }
        }
        s.push(acc / &b0);
    }
    s
}

/// ∫ r/d, deg r < deg d.
fn elements_simples(r: &PolyRat, d: &PolyRat, var: &str) -> Option<Expr> {
    let lead = d.0.last()?.clone();
    let d = d.unitaire();
    let r = r.echelle(&lead.recip());

    // d = Π (x − ri)^mi · q, q unitaire de degré 0 ou 2
    let mut q = d.clone();
    let mut racines: Vec<(BigRational, usize)> = Vec::new();
    for ri in d.racines_rationnelles() {
        let mut m = 0;
        while q.degre().unwrap_or(0) > 0 && q.eval(&ri).is_zero() {
            q = q.deflater(&ri);
            m += 1;
        }
        racines.push((ri, m));
    }
    if !matches!(q.degre(), Some(0) | Some(2)) {
        return None;
    }

    let x = Expr::var(var);
    let mut morceaux: Vec<Expr> = Vec::new();
    let mut retire = PolyRat(Vec::new());

    for (ri, m) in &racines {
        // r/d = g/(x − ri)^m,  g = r / h
        let facteur = puissance_poly(&monome_x_moins(ri), *m);
        let (h, _) = d.div_euclide(&facteur);
        let serie = serie_quotient(&decaler(&r, ri), &decaler(&h, ri), *m);

        let lin = x.clone() - Expr::Rat(ri.clone());
        for (k, a) in serie.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            let j = m - k;
            // a / (x − ri)^j
            let (hj, _) = d.div_euclide(&puissance_poly(&monome_x_moins(ri), j));
            retire = PolyRat::new(
                (0..retire.0.len().max(hj.0.len()))
                    .map(|i| {
                        retire.0.get(i).cloned().unwrap_or_else(BigRational::zero)
                            + hj.0.get(i).cloned().unwrap_or_else(BigRational::zero) * a
                    })
                    .collect(),
            );

            let a = Expr::Rat(a.clone());
            morceaux.push(if j == 1 {
                a * Expr::fonction(Fonction::Log, lin.clone())
            } else {
                let e = Expr::entier(1 - j as i64);
                a * Expr::puissance(lin.clone(), e.clone()) / e
            });
        }
    }

    if q.degre() == Some(2) {
        // reste = (B·x + C)·(d/q)
        let (autres, _) = d.div_euclide(&q);
        let (bc, _) = r.moins(&retire).div_euclide(&autres);
        let c = |k: usize| bc.0.get(k).cloned().unwrap_or_else(BigRational::zero);
        morceaux.push(terme_quadratique(&c(1), &c(0), &q, var)?);
    }

    Some(Expr::somme(morceaux))
}

/// ∫ (B·x + C) / (x² + p·x + s)
fn terme_quadratique(b: &BigRational, c: &BigRational, q: &PolyRat, var: &str) -> Option<Expr> {
    let p = Expr::Rat(q.0.get(1)?.clone());
    let s = Expr::Rat(q.0.first()?.clone());
    let x = Expr::var(var);
    let b = Expr::Rat(b.clone());
    let c = Expr::Rat(c.clone());

    let trinome = Expr::puissance(x.clone(), Expr::entier(2)) + p.clone() * x.clone() + s.clone();
    let partie_log = b.clone() / Expr::entier(2) * Expr::fonction(Fonction::Log, trinome);

    // C − B·p/2
    let k = c - b * p.clone() / Expr::entier(2);
    let delta = Expr::entier(4) * s - p.clone() * p.clone();
    let lin = Expr::entier(2) * x + p;

    let partie = match signe_constante(&delta)? {
        1 => {
            let w = Expr::racine(delta);
            Expr::entier(2) * k / w.clone() * Expr::fonction(Fonction::Atan, lin / w)
        }
        -1 => {
            let w = Expr::racine(-delta);
            k / w.clone()
                * Expr::fonction(Fonction::Log, (lin.clone() - w.clone()) / (lin + w))
        }
        _ => return None,
    };
    Some(partie_log + partie)
}

/* ------------------------ Changement de variable ------------------------ */

fn noyaux(e: &Expr, var: &str) -> Vec<Expr> {
    let mut out: Vec<Expr> = Vec::new();
    let mut pile: Vec<&Expr> = e.enfants();
    while let Some(n) = pile.pop() {
        if n.contient_var(var) && !matches!(n, Expr::Var(_)) && !out.contains(n) {
            out.push(n.clone());
        }
        pile.extend(n.enfants());
    }
    out.sort_by_key(|n| std::cmp::Reverse(n.taille()));
    out.truncate(MAX_NOYAUX);
    out
}

fn substitution(e: &Expr, var: &str, prof: usize) -> Option<Expr> {
    let nom = format!("_u{prof}");
    let t = Expr::var(&nom);

    for u in noyaux(e, var) {
        let du = deriver(&u, var);
        if du.est_zero() {
            continue;
        }
        let q = e.clone() / du;
        let mut g = q.remplacer(&u, &t);
        if g.contient_var(var) {
            g = simplifier(&q).remplacer(&u, &t);
        }
        if g.contient_var(var) {
            continue;
        }
        if let Some(p) = integrer_prof(&g, &nom, prof + 1) {
            return Some(p.substituer(&nom, &u));
        }
    }
    None
}

/* ------------------------ Par parties ------------------------ */

fn est_log_ou_reciproque(f: &Expr) -> bool {
    use Fonction::*;
    matches!(f, Expr::Fonc(Log | Asin | Acos | Atan | Acot, _))
}

fn est_puissance_de(f: &Expr, var: &str) -> bool {
    match f {
        Expr::Var(v) => v == var,
        Expr::Pow(b, n) => {
            matches!(b.as_ref(), Expr::Var(v) if v == var)
                && n.as_rat().is_some_and(|r| r.is_positive() && r.denom().is_one())
        }
        _ => false,
    }
}

fn par_parties(e: &Expr, var: &str, prof: usize) -> Option<Expr> {
    let facteurs = match e {
        Expr::Mul(v) => v.clone(),
        _ => vec![e.clone()],
    };
    if facteurs.len() < 2 {
        return None;
    }

    let mut choix: Vec<usize> = (0..facteurs.len())
        .filter(|&i| est_log_ou_reciproque(&facteurs[i]))
        .collect();
    choix.extend((0..facteurs.len()).filter(|&i| est_puissance_de(&facteurs[i], var)));

    for i in choix {
        let u = facteurs[i].clone();
        let mut reste = facteurs.clone();
        reste.remove(i);
        let dv = Expr::produit(reste);

        let Some(v) = integrer_prof(&dv, var, prof + 1) else { continue };
        let w = simplifier(&(deriver(&u, var) * v.clone()));
        let Some(iw) = integrer_prof(&w, var, prof + 1) else { continue };
        return Some(u * v - iw);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::numerique::evaluer_en;
    use crate::noyau::rpn::lire_expression;

    fn primitive(s: &str) -> String {
        simplifier(&integrer(&lire_expression(s).unwrap(), "x").unwrap()).to_string()
    }

    /// F' = f en quelques points.
    fn verifie(s: &str) {
        let f = lire_expression(s).unwrap();
        let p = integrer(&f, "x").unwrap_or_else(|| panic!("pas de primitive pour {s}"));
        let dp = deriver(&p, "x");
        for x0 in [0.3, 0.7, 1.9, 2.6] {
            let a = evaluer_en(&dp, "x", x0).unwrap();
            let b = evaluer_en(&f, "x", x0).unwrap();
            assert!((a - b).abs() < 1e-9 * (1.0 + b.abs()), "{s} en {x0} : {a} != {b}");
        }
    }

    #[test]
    fn table_usuelle() {
        assert_eq!(primitive("x^2"), "x**3/3");
        assert_eq!(primitive("sin(x)"), "-cos(x)");
        assert_eq!(primitive("1/x"), "log(x)");
        assert_eq!(primitive("exp(2*x)"), "exp(2*x)/2");
        assert_eq!(primitive("5"), "5*x");
    }

    #[test]
    fn fractions_rationnelles() {
        verifie("1/(x^2 - 1)");
        verifie("(x^3 + 1)/(x - 3)");
        verifie("1/(x^2 + 1)");
        verifie("1/(x - 4)^2");
        verifie("(2*x + 3)/(x^3 + x)");
    }

    #[test]
    fn changement_de_variable() {
        verifie("x*exp(x^2)");
        verifie("sin(x)*cos(x)");
        verifie("log(x)/x");
        verifie("2*x*cos(x^2)");
    }

    #[test]
    fn par_parties_usuelles() {
        verifie("x*exp(x)");
        verifie("x^2*sin(x)");
        verifie("x*log(x)");
    }

    #[test]
    fn carres_trigonometriques() {
        verifie("sin(x)^2");
        verifie("cos(3*x)^2");
        verifie("sec(x)^2");
    }

    #[test]
    fn sans_primitive_elementaire() {
        assert!(integrer(&lire_expression("exp(x^2)").unwrap(), "x").is_none());
    }
}
