// src/noyau/aiguillage.rs
//
// Aiguillage : une requête texte -> une réponse texte.
//
// Branches essayées dans l’ordre, la première qui répond gagne :
// systeme, edo, somme, derivee, integrale, limite, equation, expression.
// Toute erreur (ou panique) devient "❌ Unable to solve: …".

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;

use num_bigint::BigInt;
use regex::Regex;
use tracing::{debug, warn};

use super::config::ConfigNoyau;
use super::derivee::deriver;
use super::equation::{resoudre_equation, EnsembleSolutions};
use super::erreur::{depuis_panique, ErreurNoyau, Resultat};
use super::expr::Expr;
use super::integrale::integrer;
use super::limite::limite;
use super::nettoyage::normaliser;
use super::numerique::{evaluer_constante, format_nombre, format_reel};
use super::racines::{dedoublonner, RacineNumerique};
use super::rpn::lire_expression;
use super::simplification::simplifier;
use super::somme::{sommer, Borne};
use super::systeme::resoudre_systeme;
use super::variable::choisir_variable;

const MESSAGE_EDO: &str = "ODEs and systems of equations are not yet supported for general parsing.";

/// Ce que l’interface affiche sous la réponse.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Demarche {
    pub branche: &'static str,
    pub normalise: String,
}

/// Service sans état : seule la configuration, immuable.
#[derive(Clone, Debug, Default)]
pub struct Solveur {
    config: ConfigNoyau,
}

struct Requete<'a> {
    texte: &'a str,
    minuscule: String,
}

struct Reponse {
    texte: String,
    normalise: String,
}

impl Reponse {
    fn new(texte: impl Into<String>, normalise: impl Into<String>) -> Self {
        Self {
            texte: texte.into(),
            normalise: normalise.into(),
        }
    }
}

type Branche = fn(&Solveur, &Requete) -> Option<Resultat<Reponse>>;

const BRANCHES: [(&str, Branche); 8] = [
    ("systeme", Solveur::branche_systeme),
    ("edo", Solveur::branche_edo),
    ("somme", Solveur::branche_somme),
    ("derivee", Solveur::branche_derivee),
    ("integrale", Solveur::branche_integrale),
    ("limite", Solveur::branche_limite),
    ("equation", Solveur::branche_equation),
    ("expression", Solveur::branche_expression),
];

/* ------------------------ Motifs ------------------------ */

struct Motifs {
    somme: Regex,
    derivee: Regex,
    par_rapport: Regex,
    integrale: Regex,
    limite: Regex,
    arithmetique: Regex,
}

fn motifs() -> &'static Motifs {
    static MOTIFS: OnceLock<Motifs> = OnceLock::new();
    MOTIFS.get_or_init(|| {
        let re = |m: &str| Regex::new(m).expect("motif constant");
        Motifs {
            somme: re(r"sum\s+([a-zA-Z])\s+from\s*(\-?\d+)\s*to\s*(\-?\d+|inf)\s*(?:of|:)?\s*(.*)"),
            derivee: re(r"(differentiate|derivative)\s*(.*)"),
            par_rapport: re(r"^(.*?)\s*with\s+respect\s+to\s+([a-z])\s*$"),
            integrale: re(r"(integrate|integral)\s*(.*)"),
            limite: re(r"limit\s*(.*)\s*as\s*([a-zA-Z])\s*->\s*(\S*)"),
            arithmetique: re(r"^[0-9.+\-*/()\s]+$"),
        }
    })
}

/* ------------------------ Service ------------------------ */

impl Solveur {
    pub fn new(config: ConfigNoyau) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConfigNoyau {
        &self.config
    }

    /// Réponse seule.
    pub fn aiguiller(&self, texte: &str) -> String {
        self.aiguiller_detaille(texte).0
    }

    /// Réponse + démarche (branche choisie, texte normalisé). Ne panique jamais.
    pub fn aiguiller_detaille(&self, texte: &str) -> (String, Demarche) {
        let issue = catch_unwind(AssertUnwindSafe(|| self.dispatcher(texte)))
            .unwrap_or_else(|p| Err(depuis_panique(p)));

        match issue {
            Ok((branche, r)) => {
                debug!(branche, normalise = %r.normalise, "requête traitée");
                (
                    r.texte,
                    Demarche {
                        branche,
                        normalise: r.normalise,
                    },
                )
            }
            Err(e) => {
                warn!(erreur = %e, requete = texte, "requête non résolue");
                (
                    format!("❌ Unable to solve: {e}"),
                    Demarche {
                        branche: "erreur",
                        normalise: String::new(),
                    },
                )
            }
        }
    }

    fn dispatcher(&self, texte: &str) -> Resultat<(&'static str, Reponse)> {
        let requete = Requete {
            texte,
            minuscule: texte.to_lowercase(),
        };
        for (nom, branche) in BRANCHES {
            if let Some(r) = branche(self, &requete) {
                return r.map(|r| (nom, r));
            }
        }
        Err(ErreurNoyau::Interne("aucune branche".to_string()))
    }

    /* ------------------------ Branches ------------------------ */

    fn branche_systeme(&self, q: &Requete) -> Option<Resultat<Reponse>> {
        if q.minuscule.matches('=').count() <= 1 {
            return None;
        }
        let equations: Vec<&str> = q.texte.split_whitespace().collect();
        let r = resoudre_systeme(&equations, &self.config);
        Some(Ok(Reponse::new(r, equations.join(" "))))
    }

    fn branche_edo(&self, q: &Requete) -> Option<Resultat<Reponse>> {
        (q.minuscule.contains("differential equation") || q.minuscule.contains("ode"))
            .then(|| Ok(Reponse::new(MESSAGE_EDO, "")))
    }

    fn branche_somme(&self, q: &Requete) -> Option<Resultat<Reponse>> {
        let c = motifs().somme.captures(&q.minuscule)?;
        Some(self.somme(&c[1], &c[2], &c[3], &c[4]))
    }

    fn somme(&self, var: &str, debut: &str, fin: &str, f: &str) -> Resultat<Reponse> {
        let debut: BigInt = debut
            .parse()
            .map_err(|_| ErreurNoyau::NombreInvalide(debut.to_string()))?;
        let fin = if fin == "inf" {
            Borne::Infinie
        } else {
            Borne::Finie(
                fin.parse()
                    .map_err(|_| ErreurNoyau::NombreInvalide(fin.to_string()))?,
            )
        };

        let normalise = normaliser(f);
        let f = lire_expression(&normalise)?;
        let texte = match sommer(&f, var, &debut, &fin, self.config.max_termes_somme)? {
            Some(s) => format!("Summation: {}", simplifier(&s)),
            None => format!("Summation: Sum({f}, ({var}, {debut}, {fin}))"),
        };
        Ok(Reponse::new(texte, normalise))
    }

    fn branche_derivee(&self, q: &Requete) -> Option<Resultat<Reponse>> {
        let c = motifs().derivee.captures(&q.minuscule)?;
        Some(self.derivee(&c[2]))
    }

    fn derivee(&self, reste: &str) -> Resultat<Reponse> {
        // "… with respect to y" fixe la variable
        let (f, var) = match motifs().par_rapport.captures(reste) {
            Some(c) => (c[1].to_string(), Some(c[2].to_string())),
            None => (reste.to_string(), None),
        };

        let normalise = normaliser(&f);
        let f = lire_expression(&normalise)?;
        let var = var.unwrap_or_else(|| choisir_variable(&f));
        let d = simplifier(&deriver(&f, &var));
        Ok(Reponse::new(format!("Derivative: {d}"), normalise))
    }

    fn branche_integrale(&self, q: &Requete) -> Option<Resultat<Reponse>> {
        let c = motifs().integrale.captures(&q.minuscule)?;
        Some(self.integrale(&c[2]))
    }

    fn integrale(&self, reste: &str) -> Resultat<Reponse> {
        let normalise = normaliser(reste);
        let f = lire_expression(&normalise)?;
        let var = choisir_variable(&f);
        let texte = match integrer(&f, &var) {
            Some(primitive) => format!("Integral: {}", simplifier(&primitive)),
            None => format!("Integral: Integral({f}, {var})"),
        };
        Ok(Reponse::new(texte, normalise))
    }

    fn branche_limite(&self, q: &Requete) -> Option<Resultat<Reponse>> {
        if !q.minuscule.contains("limit") {
            return None;
        }
        // motif absent : on continue avec l’équation / l’expression
        let c = motifs().limite.captures(&q.minuscule)?;
        Some(self.limite(&c[1], &c[2], &c[3]))
    }

    fn limite(&self, f: &str, var: &str, point: &str) -> Resultat<Reponse> {
        let normalise = normaliser(f);
        let f = lire_expression(&normalise)?;
        let point = match point {
            "oo" | "inf" | "+oo" | "+inf" => Expr::Infini,
            "-oo" | "-inf" => Expr::moins_infini(),
            autre => lire_expression(&normaliser(autre))?,
        };
        let l = limite(&f, var, &point)?;
        Ok(Reponse::new(format!("Limit: {}", simplifier(&l)), normalise))
    }

    fn branche_equation(&self, q: &Requete) -> Option<Resultat<Reponse>> {
        let normalise = normaliser(q.texte);
        let (g, d) = normalise.split_once('=')?;
        Some(self.equation(g, d).map(|t| Reponse::new(t, normalise.clone())))
    }

    fn equation(&self, g: &str, d: &str) -> Resultat<String> {
        let lhs = lire_expression(g)?;
        let rhs = lire_expression(d)?;
        let var = choisir_variable(&(lhs.clone() - rhs.clone()));

        let solutions = match resoudre_equation(&lhs, &rhs, &var, &self.config) {
            EnsembleSolutions::ToujoursVrai => {
                return Ok("The equation is true for all values.".to_string())
            }
            EnsembleSolutions::Vide => Vec::new(),
            EnsembleSolutions::FiniSymbolique(v) => {
                v.iter().map(|e| self.en_nombre(e)).collect()
            }
            EnsembleSolutions::FiniNumerique(r) => self.racines_en_texte(&r),
        };

        Ok(if solutions.is_empty() {
            "No solutions found.".to_string()
        } else {
            format!("Solutions for {var}: {}", solutions.join(", "))
        })
    }

    fn branche_expression(&self, q: &Requete) -> Option<Resultat<Reponse>> {
        let normalise = normaliser(q.texte);
        Some(self.expression(&normalise).map(|t| Reponse::new(t, normalise.clone())))
    }

    fn expression(&self, normalise: &str) -> Resultat<String> {
        let val = lire_expression(normalise)?;
        if !val.variables_libres().is_empty() {
            return Ok(format!("Simplified: {}", simplifier(&val)));
        }

        if motifs().arithmetique.is_match(normalise) {
            // voie rapide ; un résultat non fini repasse par le calcul exact
            match meval::eval_str(normalise.replace("**", "^")) {
                Ok(v) if v.is_finite() => {
                    debug!("voie rapide arithmétique");
                    return Ok(format!("Result: {}", format_reel(v, self.config.precision)));
                }
                _ => {}
            }
        }

        Ok(format!("Result: {}", self.en_nombre(&simplifier(&val))))
    }

    /* ------------------------ Mise en forme ------------------------ */

    /// Valeur numérique d’une constante, forme symbolique sinon.
    fn en_nombre(&self, e: &Expr) -> String {
        if matches!(e, Expr::Indefini) {
            return "nan".to_string();
        }
        if !e.est_constant() || e.signe_infini().is_some() {
            return e.to_string();
        }
        match evaluer_constante(e) {
            Ok(z) => format_nombre(z, self.config.precision),
            Err(_) => e.to_string(),
        }
    }

    fn racines_en_texte(&self, racines: &[RacineNumerique]) -> Vec<String> {
        let c = &self.config;
        dedoublonner(racines, c.reel_seulement, c.tolerance_imaginaire, c.chiffres_racines)
            .into_iter()
            .map(|r| match r {
                RacineNumerique::Reelle(v) => format_reel(v, c.precision),
                RacineNumerique::Complexe(z) => format_nombre(z, c.precision),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solveur() -> Solveur {
        Solveur::new(ConfigNoyau::default())
    }

    #[test]
    fn solveur_partageable() {
        fn exige<T: Send + Sync>() {}
        exige::<Solveur>();
    }

    #[test]
    fn branches_dans_l_ordre() {
        let s = solveur();
        assert_eq!(s.aiguiller_detaille("x=1 y=2").1.branche, "systeme");
        assert_eq!(s.aiguiller_detaille("solve this ode").1.branche, "edo");
        assert_eq!(s.aiguiller_detaille("sum k from 1 to 3 of k").1.branche, "somme");
        assert_eq!(s.aiguiller_detaille("derivative of x^2").1.branche, "derivee");
        assert_eq!(s.aiguiller_detaille("integrate x").1.branche, "integrale");
        assert_eq!(s.aiguiller_detaille("limit 1/x as x -> oo").1.branche, "limite");
        assert_eq!(s.aiguiller_detaille("x + 1 = 3").1.branche, "equation");
        assert_eq!(s.aiguiller_detaille("2 + 2").1.branche, "expression");
    }

    #[test]
    fn edo() {
        assert_eq!(solveur().aiguiller("solve the differential equation y' = y"), MESSAGE_EDO);
    }

    #[test]
    fn derivee_par_rapport_a() {
        assert_eq!(
            solveur().aiguiller("differentiate x*y^2 with respect to y"),
            "Derivative: 2*x*y"
        );
    }

    #[test]
    fn integrale_non_evaluee() {
        assert_eq!(
            solveur().aiguiller("integrate exp(x^2)"),
            "Integral: Integral(exp(x**2), x)"
        );
    }

    #[test]
    fn limite_sans_motif_continue() {
        // pas de "as x -> …" : l’expression est traitée telle quelle
        let (r, d) = solveur().aiguiller_detaille("limit 2+2");
        assert_eq!(d.branche, "expression");
        assert_eq!(r, "Result: 4");
    }

    #[test]
    fn limite_a_l_infini() {
        assert_eq!(solveur().aiguiller("limit (2x+1)/x as x -> inf"), "Limit: 2");
        assert_eq!(solveur().aiguiller("limit sin(x)/x as x -> 0"), "Limit: 1");
    }

    #[test]
    fn somme_non_evaluee() {
        assert_eq!(
            solveur().aiguiller("sum k from 1 to inf of sin(k)"),
            "Summation: Sum(sin(k), (k, 1, oo))"
        );
    }

    #[test]
    fn equation_et_toujours_vraie() {
        assert_eq!(solveur().aiguiller("x + 1 = 1 + x"), "The equation is true for all values.");
        assert_eq!(solveur().aiguiller("x + 1 = x"), "No solutions found.");
        assert_eq!(solveur().aiguiller("2x + 1 = 4"), "Solutions for x: 1.5");
    }

    #[test]
    fn racines_complexes_numeriques() {
        assert_eq!(solveur().aiguiller("x^2 + 1 = 0"), "Solutions for x: -I, I");
    }

    #[test]
    fn voie_rapide_et_exacte_concordent() {
        let s = solveur();
        let precision = s.config().precision;
        for requete in [
            "2+3*4",
            "2/3",
            "7/2",
            "(1+2)*(3+4)",
            "1/3+1/6",
            "2^10",
            "10-2.5*4",
            "1.5*1.5",
            "100/7",
            "-3+2",
            "0.1+0.2",
        ] {
            let normalise = normaliser(requete);
            assert!(motifs().arithmetique.is_match(&normalise), "{normalise}");

            let rapide = meval::eval_str(normalise.replace("**", "^")).unwrap();
            let exacte = s.en_nombre(&simplifier(&lire_expression(&normalise).unwrap()));
            assert_eq!(format_reel(rapide, precision), exacte, "requete={requete:?}");
        }

        assert_eq!(s.aiguiller("2+3*4"), "Result: 14");
        assert_eq!(s.expression("2+3*4").unwrap(), "Result: 14");
        assert_eq!(s.aiguiller("2/3"), "Result: 0.666666666666667");
        // 2**10 : meval lit '^'
        assert_eq!(s.aiguiller("2^10"), "Result: 1024");
    }

    #[test]
    fn exact_hors_voie_rapide() {
        assert_eq!(solveur().aiguiller("sqrt(2)^2"), "Result: 2");
        assert_eq!(solveur().aiguiller("sin(pi/6)"), "Result: 0.5");
    }

    #[test]
    fn simplification_symbolique() {
        assert_eq!(solveur().aiguiller("(x^2 - 1)/(x - 1)"), "Simplified: x + 1");
    }

    #[test]
    fn erreur_convertie() {
        let r = solveur().aiguiller("2 + * 3");
        assert!(r.starts_with("❌ Unable to solve: "), "{r}");
        let r = solveur().aiguiller("");
        assert!(r.starts_with("❌ Unable to solve: "), "{r}");
    }
}
