// src/noyau/classement.rs
//
// La requête ressemble-t-elle à des maths ? (avertissement côté interface)

use std::sync::OnceLock;

use regex::Regex;

const MOTS_CLES: [&str; 16] = [
    "integrate",
    "integral",
    "differentiate",
    "derivative",
    "solve",
    "equation",
    "root",
    "roots",
    "limit",
    "ln",
    "log",
    "evaluate",
    "simplify",
    "summation",
    "ode",
    "differential equation",
];

fn caracteres_maths() -> &'static Regex {
    static MOTIF: OnceLock<Regex> = OnceLock::new();
    MOTIF.get_or_init(|| Regex::new(r"^[0-9xXyYzZtT+\-*/^().= ]+$").expect("motif constant"))
}

/// Vrai si un mot-clé apparaît, ou si le texte n’est fait que de caractères “maths”.
pub fn est_requete_math(texte: &str) -> bool {
    let texte = texte.trim();
    if texte.is_empty() {
        return false;
    }
    let minuscule = texte.to_lowercase();
    MOTS_CLES.iter().any(|m| minuscule.contains(m)) || caracteres_maths().is_match(texte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mots_cles() {
        assert!(est_requete_math("integrate x^2"));
        assert!(est_requete_math("What is the LIMIT of 1/x"));
        assert!(est_requete_math("ln(2)"));
    }

    #[test]
    fn caracteres_seuls() {
        assert!(est_requete_math("2+3*4"));
        assert!(est_requete_math("x^2 - 4 = 0"));
        assert!(est_requete_math(" (y + 1) / 2 "));
    }

    #[test]
    fn texte_ordinaire() {
        assert!(!est_requete_math("hello world"));
        assert!(!est_requete_math("a + b"));
        assert!(!est_requete_math(""));
        assert!(!est_requete_math("   "));
    }
}
