//! Erreurs du noyau.
//!
//! Un seul canal : tokenisation, lecture RPN, évaluation, calcul, garde-fous.
//! La frontière (aiguillage / système) convertit tout en texte préfixé.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErreurNoyau {
    #[error("entrée vide")]
    EntreeVide,

    #[error("caractère inattendu: '{0}'")]
    CaractereInattendu(char),

    #[error("nombre invalide: {0}")]
    NombreInvalide(String),

    #[error("parenthèses non fermées")]
    ParenthesesNonFermees,

    #[error("parenthèse fermante sans ouvrante")]
    ParentheseOrpheline,

    #[error("imbrication trop profonde (max {0})")]
    ImbricationTropProfonde(usize),

    #[error("expression invalide")]
    ExpressionInvalide,

    #[error("fonction inconnue: {0}")]
    FonctionInconnue(String),

    #[error("variable non évaluable: {0}")]
    VariableLibre(String),

    #[error("valeur indéfinie")]
    Indefini,

    #[error("exposant trop grand")]
    ExposantTropGrand,

    #[error("limite indéterminée")]
    LimiteIndeterminee,

    #[error("évaluation numérique impossible: {0}")]
    Numerique(String),

    #[error("erreur interne: {0}")]
    Interne(String),
}

pub type Resultat<T> = Result<T, ErreurNoyau>;

/// Charge utile d’une panique rattrapée -> erreur interne.
pub fn depuis_panique(charge: Box<dyn std::any::Any + Send>) -> ErreurNoyau {
    let message = charge
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| charge.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panique".to_string());
    ErreurNoyau::Interne(message)
}
