// src/noyau/systeme.rs
//
// Systèmes d’équations (plusieurs '=').
//
// 1. élimination : pivot linéaire d’abord (coefficient sans inconnue),
//    sinon une équation à une seule inconnue résolue exactement (branches)
// 2. système carré rebelle : Newton multivarié sur une grille de graines
// 3. sinon forme non classée ConditionSet(...)
//
// Les n-uplets sont vérifiés sur les équations de départ, triés, dédoublonnés.

use std::collections::{BTreeMap, BTreeSet};
use std::panic::{catch_unwind, AssertUnwindSafe};

use num_complex::Complex64;
use tracing::{debug, trace, warn};

use super::config::ConfigNoyau;
use super::derivee::deriver;
use super::equation::racines_exactes;
use super::erreur::{depuis_panique, Resultat};
use super::expr::Expr;
use super::nettoyage::normaliser;
use super::numerique::{evaluer, evaluer_constante, format_reel};
use super::polynome::{coefficients, developper};
use super::racines::{arrondir, EPSILON_DOUBLON};
use super::rpn::lire_expression;
use super::simplification::simplifier;

/// Profondeur d’élimination (une inconnue par niveau, plus les branches).
const MAX_ELIMINATION: usize = 12;

/// Grille de graines par coordonnée (produit cartésien jusqu’à 3 inconnues).
const GRILLE: [f64; 5] = [-2.0, -0.5, 0.5, 1.0, 2.0];

#[derive(Clone, Debug, PartialEq)]
pub enum Valeur {
    Exacte(Expr),
    Approchee(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub enum SolutionsSysteme {
    Vide,
    Fini {
        inconnues: Vec<String>,
        tuples: Vec<Vec<Valeur>>,
    },
    NonClasse(String),
}

type Affectation = BTreeMap<String, Expr>;

/// Réponse texte ; ne panique jamais.
pub fn resoudre_systeme(equations: &[&str], config: &ConfigNoyau) -> String {
    let issue = catch_unwind(AssertUnwindSafe(|| resoudre(equations, config)))
        .unwrap_or_else(|p| Err(depuis_panique(p)));

    match issue {
        Ok(s) => en_texte(&s, config.precision),
        Err(e) => {
            warn!(erreur = %e, "système non résolu");
            format!("❌ Unable to solve system: {e}")
        }
    }
}

pub fn resoudre(equations: &[&str], config: &ConfigNoyau) -> Resultat<SolutionsSysteme> {
    let mut paires = Vec::new();
    let mut variables = BTreeSet::new();

    for texte in equations {
        let Some((g, d)) = texte.split_once('=') else { continue };
        let lhs = lire_expression(&normaliser(g))?;
        let rhs = lire_expression(&normaliser(d))?;
        variables.extend(lhs.variables_libres());
        variables.extend(rhs.variables_libres());
        paires.push((lhs, rhs));
    }
    if paires.is_empty() {
        return Ok(SolutionsSysteme::Vide);
    }

    let inconnues: Vec<String> = variables.into_iter().collect();
    let fs: Vec<Expr> = paires
        .iter()
        .map(|(l, r)| simplifier(&(l.clone() - r.clone())))
        .collect();
    debug!(equations = fs.len(), inconnues = ?inconnues, "système");

    if let Some(affectations) = eliminer(&fs, &inconnues, config, 0) {
        debug!(branches = affectations.len(), "système : élimination");
        let tuples = affectations
            .into_iter()
            .map(|m| {
                inconnues
                    .iter()
                    .map(|v| Valeur::Exacte(m.get(v).cloned().unwrap_or_else(|| Expr::var(v))))
                    .collect::<Vec<_>>()
            })
            .filter(|t| satisfait(&fs, &inconnues, t))
            .collect();
        return Ok(finaliser(inconnues, tuples));
    }

    if fs.len() == inconnues.len() {
        let racines = newton_multi(&fs, &inconnues, config);
        if !racines.is_empty() {
            debug!(racines = racines.len(), "système : Newton multivarié");
            let tuples = racines
                .into_iter()
                .map(|x| x.into_iter().map(Valeur::Approchee).collect())
                .collect();
            return Ok(finaliser(inconnues, tuples));
        }
    }

    Ok(SolutionsSysteme::NonClasse(condition_set(&paires, &inconnues)))
}

/* ------------------------ Élimination ------------------------ */

/// Some(affectations) si le système se ramène à des formes closes (vide = incompatible),
/// None sinon.
fn eliminer(
    eqs: &[Expr],
    inconnues: &[String],
    config: &ConfigNoyau,
    prof: usize,
) -> Option<Vec<Affectation>> {
    if prof > MAX_ELIMINATION {
        return None;
    }

    let mut restantes = Vec::new();
    for e in eqs {
        let e = simplifier(e);
        if e.est_zero() {
            continue;
        }
        if !inconnues.iter().any(|v| e.contient_var(v)) {
            // constante non nulle : incompatible
            match evaluer_constante(&e) {
                Ok(z) if z.norm() < 1e-12 => continue,
                _ => return Some(Vec::new()),
            }
        }
        restantes.push(e);
    }

    if restantes.is_empty() {
        // inconnues restantes libres
        let libre = inconnues.iter().map(|v| (v.clone(), Expr::var(v))).collect();
        return Some(vec![libre]);
    }

    if let Some((i, v, valeur)) = pivot_lineaire(&restantes, inconnues) {
        trace!(inconnue = %v, "pivot linéaire");
        return propager(&restantes, i, inconnues, &v, &[valeur], config, prof);
    }

    for (i, e) in restantes.iter().enumerate() {
        let presentes: Vec<&String> = inconnues.iter().filter(|v| e.contient_var(v)).collect();
        let [v] = presentes.as_slice() else { continue };
        if let Some(racines) = racines_exactes(e, v, config) {
            trace!(inconnue = %v, branches = racines.len(), "équation univariée");
            return propager(&restantes, i, inconnues, v, &racines, config, prof);
        }
    }
    None
}

/// Équation i affine en v, coefficient sans inconnue : v = −c0/c1.
fn pivot_lineaire(eqs: &[Expr], inconnues: &[String]) -> Option<(usize, String, Expr)> {
    for (i, e) in eqs.iter().enumerate() {
        let e = developper(e);
        for v in inconnues.iter().filter(|v| e.contient_var(v)) {
            let Some(cs) = coefficients(&e, v) else { continue };
            let [c0, c1] = cs.as_slice() else { continue };
            if c1.est_zero() || inconnues.iter().any(|w| c1.contient_var(w)) {
                continue;
            }
            return Some((i, v.clone(), simplifier(&(-c0.clone() / c1.clone()))));
        }
    }
    None
}

/// v prend chaque valeur ; on résout le reste puis on remonte la valeur de v.
fn propager(
    eqs: &[Expr],
    i: usize,
    inconnues: &[String],
    v: &str,
    valeurs: &[Expr],
    config: &ConfigNoyau,
    prof: usize,
) -> Option<Vec<Affectation>> {
    let autres: Vec<String> = inconnues.iter().filter(|w| *w != v).cloned().collect();
    let mut out = Vec::new();

    for val in valeurs {
        let reste: Vec<Expr> = eqs
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, e)| e.substituer(v, val))
            .collect();

        for mut m in eliminer(&reste, &autres, config, prof + 1)? {
            let mut x = val.clone();
            for (w, vw) in &m {
                x = x.substituer(w, vw);
            }
            m.insert(v.to_string(), simplifier(&x));
            out.push(m);
        }
    }
    Some(out)
}

/// Le n-uplet annule toutes les équations (sans pôle).
fn satisfait(fs: &[Expr], inconnues: &[String], tuple: &[Valeur]) -> bool {
    fs.iter().all(|f| {
        let mut g = f.clone();
        for (v, val) in inconnues.iter().zip(tuple) {
            if let Valeur::Exacte(e) = val {
                g = g.substituer(v, e);
            }
        }
        let g = simplifier(&g);
        if g.existe(&|n| matches!(n, Expr::Indefini)) || !g.est_fini() {
            return false;
        }
        if !g.est_constant() {
            return true;
        }
        evaluer_constante(&g).is_ok_and(|z| z.norm() < 1e-7)
    })
}

fn cle(val: &Valeur) -> (f64, f64) {
    match val {
        Valeur::Exacte(e) => evaluer_constante(e)
            .map(|z| (z.re, z.im))
            .unwrap_or((f64::INFINITY, 0.0)),
        Valeur::Approchee(x) => (*x, 0.0),
    }
}

fn finaliser(inconnues: Vec<String>, mut tuples: Vec<Vec<Valeur>>) -> SolutionsSysteme {
    if tuples.is_empty() {
        return SolutionsSysteme::Vide;
    }
    tuples.sort_by(|a, b| {
        a.iter()
            .zip(b)
            .map(|(x, y)| {
                let (kx, ky) = (cle(x), cle(y));
                kx.0.total_cmp(&ky.0).then(kx.1.total_cmp(&ky.1))
            })
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    tuples.dedup();
    SolutionsSysteme::Fini { inconnues, tuples }
}

/* ------------------------ Newton multivarié ------------------------ */

fn eval_reel(e: &Expr, inconnues: &[String], x: &[f64]) -> Option<f64> {
    let env = |v: &str| {
        inconnues
            .iter()
            .position(|w| w == v)
            .map(|i| Complex64::new(x[i], 0.0))
    };
    let z = evaluer(e, &env).ok()?;
    (z.im.abs() <= 1e-12 * (1.0 + z.re.abs()) && z.re.is_finite()).then_some(z.re)
}

fn graines(n: usize) -> Vec<Vec<f64>> {
    if n > 3 {
        return GRILLE.iter().map(|&g| vec![g; n]).collect();
    }
    let mut points: Vec<Vec<f64>> = vec![Vec::new()];
    for _ in 0..n {
        points = points
            .into_iter()
            .flat_map(|p| {
                GRILLE.iter().map(move |&g| {
                    let mut q = p.clone();
                    q.push(g);
                    q
                })
            })
            .collect();
    }
    points
}

fn newton_multi(fs: &[Expr], inconnues: &[String], config: &ConfigNoyau) -> Vec<Vec<f64>> {
    let jacobienne: Vec<Vec<Expr>> = fs
        .iter()
        .map(|f| inconnues.iter().map(|v| deriver(f, v)).collect())
        .collect();

    let mut racines: Vec<Vec<f64>> = Vec::new();
    for x0 in graines(inconnues.len()) {
        let Some(x) = newton_point(fs, &jacobienne, inconnues, x0, config.iterations_newton) else {
            continue;
        };
        let x: Vec<f64> = x.into_iter().map(|c| arrondir(c, config.chiffres_racines)).collect();
        let deja = racines.iter().any(|r| {
            r.iter().zip(&x).all(|(a, b)| (a - b).abs() < EPSILON_DOUBLON)
        });
        if !deja {
            racines.push(x);
        }
    }
    racines
}

fn newton_point(
    fs: &[Expr],
    jacobienne: &[Vec<Expr>],
    inconnues: &[String],
    mut x: Vec<f64>,
    iterations: usize,
) -> Option<Vec<f64>> {
    for _ in 0..iterations {
        let f: Vec<f64> = fs
            .iter()
            .map(|e| eval_reel(e, inconnues, &x))
            .collect::<Option<_>>()?;
        if f.iter().all(|v| *v == 0.0) {
            return Some(x);
        }
        let j: Vec<Vec<f64>> = jacobienne
            .iter()
            .map(|ligne| ligne.iter().map(|e| eval_reel(e, inconnues, &x)).collect::<Option<_>>())
            .collect::<Option<_>>()?;

        let pas = gauss(j, f)?;
        for (xi, pi) in x.iter_mut().zip(&pas) {
            *xi -= pi;
        }
        if x.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let norme_pas = pas.iter().map(|p| p * p).sum::<f64>().sqrt();
        let norme_x = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norme_pas <= 1e-14 * (1.0 + norme_x) {
            let residu = fs
                .iter()
                .map(|e| eval_reel(e, inconnues, &x))
                .collect::<Option<Vec<f64>>>()?;
            return residu.iter().all(|r| r.abs() < 1e-9).then_some(x);
        }
    }
    None
}

/// A·p = b par pivot partiel (None si singulière).
fn gauss(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let piv = (col..n).max_by(|&i, &k| a[i][col].abs().total_cmp(&a[k][col].abs()))?;
        if a[piv][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, piv);
        b.swap(col, piv);
        for lig in col + 1..n {
            let facteur = a[lig][col] / a[col][col];
            for k in col..n {
                a[lig][k] -= facteur * a[col][k];
            }
            b[lig] -= facteur * b[col];
        }
    }

    let mut p = vec![0.0; n];
    for lig in (0..n).rev() {
        let s: f64 = (lig + 1..n).map(|k| a[lig][k] * p[k]).sum();
        p[lig] = (b[lig] - s) / a[lig][lig];
    }
    Some(p)
}

/* ------------------------ Affichage ------------------------ */

fn condition_set(paires: &[(Expr, Expr)], inconnues: &[String]) -> String {
    let eqs: Vec<String> = paires.iter().map(|(l, r)| format!("{l} = {r}")).collect();
    format!("ConditionSet(({}), {{{}}})", inconnues.join(", "), eqs.join(", "))
}

fn valeur_en_texte(v: &Valeur, precision: usize) -> String {
    match v {
        Valeur::Exacte(e) => e.to_string(),
        Valeur::Approchee(x) => format_reel(*x, precision),
    }
}

pub fn en_texte(s: &SolutionsSysteme, precision: usize) -> String {
    match s {
        SolutionsSysteme::Vide => "No solution found.".to_string(),
        SolutionsSysteme::Fini { inconnues, tuples } => {
            let mut out = String::from("Solutions: ");
            for t in tuples {
                let champs: Vec<String> = inconnues
                    .iter()
                    .zip(t)
                    .map(|(v, val)| format!("{v} = {}", valeur_en_texte(val, precision)))
                    .collect();
                out.push('(');
                out.push_str(&champs.join(", "));
                out.push(')');
            }
            out
        }
        SolutionsSysteme::NonClasse(forme) => format!("Solutions: {forme}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sys(eqs: &[&str]) -> String {
        resoudre_systeme(eqs, &ConfigNoyau::default())
    }

    #[test]
    fn lineaire_deux_inconnues() {
        assert_eq!(sys(&["solve", "3x+y=10", "x-2y=1"]), "Solutions: (x = 3, y = 1)");
    }

    #[test]
    fn incompatible() {
        assert_eq!(sys(&["x+y=1", "x+y=2"]), "No solution found.");
    }

    #[test]
    fn sans_equation() {
        assert_eq!(sys(&["solve", "x+y"]), "No solution found.");
    }

    #[test]
    fn cercle_et_droite() {
        let r = sys(&["x^2+y^2=2", "x=y"]);
        assert_eq!(r, "Solutions: (x = -1, y = -1)(x = 1, y = 1)");
    }

    #[test]
    fn une_seule_inconnue() {
        assert_eq!(sys(&["x+1=2", "2x=2"]), "Solutions: (x = 1)");
    }

    #[test]
    fn inconnue_libre() {
        let r = resoudre(&["x+y=2", "2x+2y=4"], &ConfigNoyau::default()).unwrap();
        let SolutionsSysteme::Fini { tuples, .. } = &r else { panic!("{r:?}") };
        assert_eq!(tuples.len(), 1);
        assert_eq!(tuples[0][1], Valeur::Exacte(Expr::var("y")));
    }

    #[test]
    fn newton_carre() {
        // x = cos(y), y = x : pas de forme close
        let r = sys(&["x=cos(y)", "y=x"]);
        assert!(r.starts_with("Solutions: (x = 0.739085133215"), "{r}");
    }

    #[test]
    fn non_classe() {
        let r = sys(&["x=cos(y)", "y=x", "x=y"]);
        assert!(r.starts_with("Solutions: ConditionSet((x, y), {"), "{r}");
    }

    #[test]
    fn erreur_de_lecture() {
        let r = sys(&["x+=1", "y=2"]);
        assert!(r.starts_with("❌ Unable to solve system: "), "{r}");
    }

    #[test]
    fn gauss_deux_par_deux() {
        let p = gauss(vec![vec![2.0, 1.0], vec![1.0, -1.0]], vec![5.0, 1.0]).unwrap();
        assert!((p[0] - 2.0).abs() < 1e-12 && (p[1] - 1.0).abs() < 1e-12);
        assert!(gauss(vec![vec![1.0, 1.0], vec![1.0, 1.0]], vec![1.0, 2.0]).is_none());
    }
}
