// src/noyau/equation.rs
//
// Équation à une inconnue : paliers successifs, le premier qui conclut gagne.
//
//   0. identité   : lhs − rhs se simplifie en 0
//   1. réel       : formes closes réelles (polynômes rationnels, affine symbolique)
//   2. générique  : racines complexes, isolation, produit nul, noyau unique
//                   (seulement après un verdict Vide ou NonResolu)
//   3. numérique  : Newton depuis des graines fixes
//
// Les paliers partagent un verdict ; chacun est appelable seul.

use tracing::{debug, trace};

use super::config::ConfigNoyau;
use super::derivee::deriver;
use super::expr::{Expr, Fonction};
use super::numerique::{evaluer, evaluer_constante, evaluer_en};
use super::polynome::{coefficients, developper, en_fraction, racines_quadratique, resoudre_poly_rat, termes, trier_racines, PolyRat};
use super::racines::RacineNumerique;
use super::simplification::simplifier;

/// Profondeur des inversions / substitutions du palier générique.
const MAX_ISOLATION: usize = 8;

#[derive(Clone, Debug, PartialEq)]
pub enum EnsembleSolutions {
    Vide,
    ToujoursVrai,
    FiniSymbolique(Vec<Expr>),
    FiniNumerique(Vec<RacineNumerique>),
}

/// Ce que le palier réel a constaté sans conclure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Aucun,
    Vide,
    NonResolu,
    Periodique,
}

pub struct Probleme<'a> {
    /// lhs − rhs simplifié
    pub f: Expr,
    pub var: &'a str,
    pub config: &'a ConfigNoyau,
}

impl<'a> Probleme<'a> {
    pub fn new(lhs: &Expr, rhs: &Expr, var: &'a str, config: &'a ConfigNoyau) -> Self {
        Self {
            f: simplifier(&(lhs.clone() - rhs.clone())),
            var,
            config,
        }
    }
}

pub type Palier = fn(&Probleme, &mut Verdict) -> Option<EnsembleSolutions>;

pub const PALIERS: [(&str, Palier); 4] = [
    ("identite", palier_identite),
    ("reel", palier_reel),
    ("generique", palier_generique),
    ("numerique", palier_numerique),
];

pub fn resoudre_equation(lhs: &Expr, rhs: &Expr, var: &str, config: &ConfigNoyau) -> EnsembleSolutions {
    let p = Probleme::new(lhs, rhs, var, config);
    let mut verdict = Verdict::Aucun;

    for (nom, palier) in PALIERS {
        if let Some(s) = palier(&p, &mut verdict) {
            debug!(palier = nom, "équation résolue");
            return s;
        }
        debug!(palier = nom, ?verdict, "palier sans conclusion");
    }
    EnsembleSolutions::Vide
}

/// Paliers 1 puis 2 seulement (solutions exactes), pour l’élimination des systèmes.
pub fn racines_exactes(f: &Expr, var: &str, config: &ConfigNoyau) -> Option<Vec<Expr>> {
    let p = Probleme::new(f, &Expr::zero(), var, config);
    let mut verdict = Verdict::Aucun;
    if p.f.est_zero() {
        return None;
    }
    for palier in [palier_reel as Palier, palier_generique] {
        match palier(&p, &mut verdict) {
            Some(EnsembleSolutions::FiniSymbolique(v)) => return Some(v),
            Some(_) => return None,
            None => {}
        }
    }
    (verdict == Verdict::Vide).then(Vec::new)
}

/* ------------------------ Palier 0 ------------------------ */

pub fn palier_identite(p: &Probleme, _verdict: &mut Verdict) -> Option<EnsembleSolutions> {
    p.f.est_zero().then_some(EnsembleSolutions::ToujoursVrai)
}

/* ------------------------ Palier 1 ------------------------ */

/// Vrai si `var` apparaît hors d’une fonction périodique.
fn hors_periodique(e: &Expr, var: &str) -> bool {
    match e {
        Expr::Var(v) => v == var,
        Expr::Fonc(f, _) if f.est_periodique() => false,
        _ => e.enfants().iter().any(|c| hors_periodique(c, var)),
    }
}

/// Retire les racines qui annulent le dénominateur.
fn hors_poles(sol: Vec<Expr>, d: &Expr, var: &str) -> Vec<Expr> {
    if !d.contient_var(var) {
        return sol;
    }
    sol.into_iter()
        .filter(|r| {
            let v = simplifier(&d.substituer(var, r));
            if v.est_zero() || !v.est_fini() {
                return false;
            }
            match evaluer_constante(&v) {
                Ok(z) => z.norm() > 1e-12,
                Err(_) => !v.est_constant(),
            }
        })
        .collect()
}

pub fn palier_reel(p: &Probleme, verdict: &mut Verdict) -> Option<EnsembleSolutions> {
    let var = p.var;
    if !p.f.contient_var(var) {
        *verdict = Verdict::Vide;
        return None;
    }
    if !hors_periodique(&p.f, var) {
        *verdict = Verdict::Periodique;
        return None;
    }

    let (n, d) = en_fraction(&p.f);
    let n = developper(&n);

    if let Some(pn) = PolyRat::depuis_expr(&n, var) {
        if pn.est_nul() {
            return Some(EnsembleSolutions::ToujoursVrai);
        }
        return match resoudre_poly_rat(&pn, false) {
            Some(r) => {
                let r = hors_poles(r, &d, var);
                if r.is_empty() {
                    *verdict = Verdict::Vide;
                    None
                } else {
                    Some(EnsembleSolutions::FiniSymbolique(r))
                }
            }
            None => {
                *verdict = Verdict::NonResolu;
                None
            }
        };
    }

    // affine à coefficients symboliques
    if let Some([c0, c1]) = coefficients(&n, var).as_deref() {
        let r = hors_poles(vec![simplifier(&(-c0.clone() / c1.clone()))], &d, var);
        if !r.is_empty() {
            return Some(EnsembleSolutions::FiniSymbolique(r));
        }
    }

    *verdict = Verdict::NonResolu;
    None
}

/* ------------------------ Palier 2 ------------------------ */

pub fn palier_generique(p: &Probleme, verdict: &mut Verdict) -> Option<EnsembleSolutions> {
    if !matches!(verdict, Verdict::Vide | Verdict::NonResolu) {
        return None;
    }

    let mut sol: Vec<Expr> = isoler(&p.f, p.var, 0)
        .into_iter()
        .map(|r| simplifier(&r))
        .filter(|r| r.est_fini() && verifie(&p.f, p.var, r))
        .collect();
    trier_racines(&mut sol);

    if sol.is_empty() {
        trace!("palier générique : rien");
        None
    } else {
        Some(EnsembleSolutions::FiniSymbolique(sol))
    }
}

/// f(r) ≈ 0 quand r est constant (les racines symboliques sont gardées).
fn verifie(f: &Expr, var: &str, r: &Expr) -> bool {
    if !r.est_constant() {
        return true;
    }
    let Ok(z) = evaluer_constante(r) else { return false };
    match evaluer(f, &|v| (v == var).then_some(z)) {
        Ok(fz) => fz.norm() < 1e-7 * (1.0 + z.norm()),
        Err(_) => !f.variables_libres().iter().all(|v| v == var),
    }
}

fn isoler(f: &Expr, var: &str, prof: usize) -> Vec<Expr> {
    if prof > MAX_ISOLATION || !f.contient_var(var) {
        return Vec::new();
    }

    let (n, d) = en_fraction(f);
    let n_dev = developper(&n);

    let sol = if let Some(cs) = coefficients(&n_dev, var) {
        match PolyRat::depuis_expr(&n_dev, var) {
            Some(pn) => resoudre_poly_rat(&pn, true).unwrap_or_default(),
            None => match cs.as_slice() {
                [c0, c1] => vec![-c0.clone() / c1.clone()],
                [c0, c1, c2] => racines_quadratique(c2, c1, c0, true),
                _ => Vec::new(),
            },
        }
    } else if let Expr::Mul(fs) = &n {
        fs.iter()
            .filter(|g| g.contient_var(var))
            .flat_map(|g| isoler(g, var, prof + 1))
            .collect()
    } else if let Some(s) = inverser(&n, var, prof) {
        s
    } else {
        noyau_unique(&n, var, prof)
    };

    hors_poles(sol, &d, var)
}

/// g(u) = c avec un seul terme variable : on remonte g.
fn inverser(n: &Expr, var: &str, prof: usize) -> Option<Vec<Expr>> {
    use Fonction::*;

    let (avec, sans): (Vec<Expr>, Vec<Expr>) =
        termes(n).into_iter().partition(|t| t.contient_var(var));
    let [g] = avec.as_slice() else { return None };
    let c = -Expr::somme(sans);

    // facteurs constants
    let (k, h) = match g {
        Expr::Mul(fs) => {
            let (cst, var_fs): (Vec<Expr>, Vec<Expr>) =
                fs.iter().cloned().partition(|f| !f.contient_var(var));
            (Expr::produit(cst), Expr::produit(var_fs))
        }
        _ => (Expr::un(), g.clone()),
    };
    if k.est_zero() {
        return None;
    }
    let rhs = c / k;
    let log = |e: Expr| Expr::fonction(Log, e);
    let carre = |e: Expr| Expr::puissance(e, Expr::entier(2));

    let candidats: Vec<(Expr, Expr)> = match &h {
        Expr::Pow(b, x) if !x.contient_var(var) => {
            let r = Expr::puissance(rhs, x.as_ref().clone().inverse());
            match x.as_entier() {
                Some(m) if m % 2 == 0 => vec![(b.as_ref().clone(), r.clone()), (b.as_ref().clone(), -r)],
                _ => vec![(b.as_ref().clone(), r)],
            }
        }
        Expr::Pow(b, x) if !b.contient_var(var) => {
            vec![(x.as_ref().clone(), log(rhs) / log(b.as_ref().clone()))]
        }
        Expr::Fonc(f, u) => {
            let u = u.as_ref().clone();
            let app = |g: Fonction| Expr::fonction(g, rhs.clone());
            match f {
                Log => vec![(u, Expr::exp(rhs.clone()))],
                Asin => vec![(u, app(Sin))],
                Acos => vec![(u, app(Cos))],
                Atan => vec![(u, app(Tan))],
                Acot => vec![(u, app(Cot))],
                Asec => vec![(u, app(Sec))],
                Acsc => vec![(u, app(Csc))],
                Sin => vec![(u.clone(), app(Asin)), (u, Expr::Pi - app(Asin))],
                Cos => vec![(u.clone(), app(Acos)), (u, -app(Acos))],
                Tan => vec![(u, app(Atan))],
                Cot => vec![(u, app(Acot))],
                Sec => vec![(u, Expr::fonction(Acos, rhs.clone().inverse()))],
                Csc => vec![(u, Expr::fonction(Asin, rhs.clone().inverse()))],
                Sinh => vec![(u, log(rhs.clone() + Expr::racine(carre(rhs.clone()) + Expr::un())))],
                Cosh => {
                    let a = log(rhs.clone() + Expr::racine(carre(rhs.clone()) - Expr::un()));
                    vec![(u.clone(), a.clone()), (u, -a)]
                }
                Tanh => vec![(
                    u,
                    Expr::rat(1, 2) * log((Expr::un() + rhs.clone()) / (Expr::un() - rhs.clone())),
                )],
            }
        }
        _ => return None,
    };

    let mut out = Vec::new();
    for (u, v) in candidats {
        if !v.est_fini() {
            continue;
        }
        out.extend(isoler(&(u - v), var, prof + 1));
    }
    Some(out)
}

/// Remplace un noyau non polynomial k(x) par t, résout en t, puis k(x) = t.
fn noyau_unique(n: &Expr, var: &str, prof: usize) -> Vec<Expr> {
    let nom = format!("_k{prof}");
    let t = Expr::var(&nom);

    let mut candidats: Vec<Expr> = Vec::new();
    let mut pile: Vec<&Expr> = n.enfants();
    while let Some(e) = pile.pop() {
        let noyau = match e {
            Expr::Fonc(_, _) => true,
            Expr::Pow(b, x) => x.contient_var(var) || (b.contient_var(var) && x.as_entier().is_none()),
            _ => false,
        };
        if noyau && e.contient_var(var) && !candidats.contains(e) {
            candidats.push(e.clone());
        }
        pile.extend(e.enfants());
    }

    for k in candidats {
        let mut q = n.remplacer(&k, &t);
        if let Expr::Pow(base, u) = &k {
            if **base == Expr::E {
                // exp(c·u) = t^c
                q = q.transformer(&|e| match e {
                    Expr::Pow(b, w) if **b == Expr::E => {
                        let c = simplifier(&(w.as_ref().clone() / u.as_ref().clone()));
                        c.as_entier().map(|_| Expr::puissance(t.clone(), c))
                    }
                    _ => None,
                });
            }
        }
        if q.contient_var(var) {
            continue;
        }

        let mut out = Vec::new();
        for r in isoler(&q, &nom, prof + 1) {
            out.extend(isoler(&(k.clone() - r), var, prof + 1));
        }
        if !out.is_empty() {
            return out;
        }
    }
    Vec::new()
}

/* ------------------------ Palier 3 ------------------------ */

pub fn palier_numerique(p: &Probleme, _verdict: &mut Verdict) -> Option<EnsembleSolutions> {
    let var = p.var;
    if !p.f.contient_var(var) || p.f.variables_libres().len() > 1 {
        return None;
    }

    let df = deriver(&p.f, var);
    let mut racines: Vec<f64> = Vec::new();
    for &graine in &p.config.graines {
        match newton(&p.f, &df, var, graine, p.config.iterations_newton) {
            Some(r) => {
                if !racines.contains(&r) {
                    racines.push(r);
                }
            }
            None => trace!(graine, "Newton sans convergence"),
        }
    }

    if racines.is_empty() {
        None
    } else {
        Some(EnsembleSolutions::FiniNumerique(
            racines.into_iter().map(RacineNumerique::Reelle).collect(),
        ))
    }
}

fn newton(f: &Expr, df: &Expr, var: &str, x0: f64, iterations: usize) -> Option<f64> {
    let mut x = x0;
    for _ in 0..iterations {
        let fx = evaluer_en(f, var, x)?;
        if fx == 0.0 {
            return Some(x);
        }
        let dfx = evaluer_en(df, var, x)?;
        if dfx == 0.0 || !dfx.is_finite() {
            return None;
        }
        let pas = fx / dfx;
        x -= pas;
        if !x.is_finite() {
            return None;
        }
        if pas.abs() <= 1e-14 * (1.0 + x.abs()) {
            let fx = evaluer_en(f, var, x)?;
            return (fx.abs() < 1e-9).then_some(x);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::rpn::lire_expression;

    fn resoudre(lhs: &str, rhs: &str) -> EnsembleSolutions {
        let config = ConfigNoyau::default();
        resoudre_equation(
            &lire_expression(lhs).unwrap(),
            &lire_expression(rhs).unwrap(),
            "x",
            &config,
        )
    }

    fn symboliques(s: EnsembleSolutions) -> Vec<String> {
        match s {
            EnsembleSolutions::FiniSymbolique(v) => v.iter().map(|e| e.to_string()).collect(),
            autre => panic!("attendu FiniSymbolique, obtenu {autre:?}"),
        }
    }

    #[test]
    fn identite() {
        assert_eq!(resoudre("(x+1)^2", "x^2 + 2*x + 1"), EnsembleSolutions::ToujoursVrai);
        assert_eq!(resoudre("sin(x)^2 + cos(x)^2", "1"), EnsembleSolutions::ToujoursVrai);
    }

    #[test]
    fn polynome_reel() {
        assert_eq!(symboliques(resoudre("x^2 - 4", "0")), vec!["-2", "2"]);
        assert_eq!(symboliques(resoudre("2*x + 3", "0")), vec!["-3/2"]);
        assert_eq!(symboliques(resoudre("x^2", "2")), vec!["-sqrt(2)", "sqrt(2)"]);
    }

    #[test]
    fn poles_exclus() {
        // (x² − 1)/(x − 1) = 0 : x = 1 est un pôle
        assert_eq!(symboliques(resoudre("(x^2 - 1)/(x - 1)", "0")), vec!["-1"]);
    }

    #[test]
    fn racines_complexes_au_palier_generique() {
        assert_eq!(symboliques(resoudre("x^2 + 1", "0")), vec!["-I", "I"]);
    }

    #[test]
    fn isolation() {
        assert_eq!(symboliques(resoudre("exp(x)", "2")), vec!["log(2)"]);
        assert_eq!(symboliques(resoudre("log(x)", "1")), vec!["E"]);
        assert_eq!(symboliques(resoudre("sqrt(x)", "3")), vec!["9"]);
    }

    #[test]
    fn noyau_exponentiel() {
        assert_eq!(symboliques(resoudre("exp(2*x) - 3*exp(x) + 2", "0")), vec!["0", "log(2)"]);
    }

    #[test]
    fn quadratique_symbolique() {
        let mut r = symboliques(resoudre("x^2 + y", "0"));
        r.sort();
        assert_eq!(r, vec!["-sqrt(-y)", "sqrt(-y)"]);
    }

    #[test]
    fn affine_symbolique() {
        let config = ConfigNoyau::default();
        let s = resoudre_equation(
            &lire_expression("a*x + b").unwrap(),
            &Expr::zero(),
            "x",
            &config,
        );
        let EnsembleSolutions::FiniSymbolique(r) = &s else { panic!("{s:?}") };
        assert_eq!(r.len(), 1);
        let a_x_b = Expr::var("a") * r[0].clone() + Expr::var("b");
        assert!(simplifier(&a_x_b).est_zero());
    }

    #[test]
    fn contradiction() {
        assert_eq!(resoudre("1", "2"), EnsembleSolutions::Vide);
    }

    #[test]
    fn periodique_passe_au_numerique() {
        let config = ConfigNoyau::default();
        let p = Probleme::new(&lire_expression("sin(x)").unwrap(), &Expr::zero(), "x", &config);
        let mut verdict = Verdict::Aucun;
        assert_eq!(palier_reel(&p, &mut verdict), None);
        assert_eq!(verdict, Verdict::Periodique);
        assert_eq!(palier_generique(&p, &mut verdict), None);
        match palier_numerique(&p, &mut verdict) {
            Some(EnsembleSolutions::FiniNumerique(r)) => {
                assert!(r.iter().any(|x| matches!(x, RacineNumerique::Reelle(v) if v.abs() < 1e-12)));
            }
            autre => panic!("{autre:?}"),
        }
    }

    #[test]
    fn numerique_transcendant() {
        // cos(x) = x : racine ≈ 0.739085
        match resoudre("cos(x)", "x") {
            EnsembleSolutions::FiniNumerique(r) => {
                assert!(r
                    .iter()
                    .any(|x| matches!(x, RacineNumerique::Reelle(v) if (v - 0.7390851332).abs() < 1e-8)));
            }
            autre => panic!("{autre:?}"),
        }
    }
}
