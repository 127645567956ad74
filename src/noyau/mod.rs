//! Noyau du solveur Q-pur
//!
//! Organisation interne :
//! - erreur.rs          : canal d’erreur unique (ErreurNoyau)
//! - config.rs          : configuration immuable (précision, graines, budgets)
//! - jetons.rs / rpn.rs : tokenisation + shunting-yard -> Expr
//! - expr.rs / canon.rs : arbre exact, constructeurs canoniques
//! - trig.rs            : valeurs spéciales exactes
//! - format.rs          : affichage (grammaire relisible : x**2, sqrt(2), pi, E, I, oo)
//! - numerique.rs       : évaluation complexe + mise en forme des nombres
//! - polynome.rs        : développement, fractions, polynômes rationnels
//! - simplification.rs  : simplification (identités trig, annulation, choix par taille)
//! - derivee.rs / integrale.rs / limite.rs / somme.rs : calcul
//! - classement.rs      : requête plausiblement mathématique ?
//! - nettoyage.rs       : texte brut -> expression normalisée
//! - variable.rs        : variable canonique
//! - racines.rs         : racines numériques (arrondi, dédoublonnage)
//! - equation.rs        : équation à une inconnue (paliers)
//! - systeme.rs         : systèmes
//! - aiguillage.rs      : point d’entrée texte -> texte (Solveur)

pub mod aiguillage;
pub mod canon;
pub mod classement;
pub mod config;
pub mod derivee;
pub mod equation;
pub mod erreur;
pub mod expr;
pub mod format;
pub mod identites_trig;
pub mod integrale;
pub mod jetons;
pub mod limite;
pub mod nettoyage;
pub mod numerique;
pub mod polynome;
pub mod racines;
pub mod rpn;
pub mod simplification;
pub mod somme;
pub mod systeme;
pub mod trig;
pub mod variable;

#[cfg(test)]
mod tests_scientifiques;

#[cfg(test)]
mod tests_fuzz_safe;

// API publique
pub use aiguillage::{Demarche, Solveur};
pub use classement::est_requete_math;
pub use config::ConfigNoyau;
pub use erreur::{ErreurNoyau, Resultat};
pub use nettoyage::normaliser;
