// src/noyau/variable.rs

use super::expr::Expr;

const PREFEREES: [&str; 4] = ["x", "y", "z", "t"];

/// Variable de travail : x, y, z, t dans cet ordre, sinon la première par ordre alphabétique.
/// Sans variable libre : "x".
pub fn choisir_variable(e: &Expr) -> String {
    let libres = e.variables_libres();
    PREFEREES
        .into_iter()
        .find(|v| libres.contains(*v))
        .map(|v| v.to_string())
        .or_else(|| libres.into_iter().next())
        .unwrap_or_else(|| "x".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::rpn::lire_expression;

    fn choix(s: &str) -> String {
        choisir_variable(&lire_expression(s).unwrap())
    }

    #[test]
    fn ordre_prefere() {
        assert_eq!(choix("y + x"), "x");
        assert_eq!(choix("t + z"), "z");
        assert_eq!(choix("t*y"), "y");
    }

    #[test]
    fn ordre_alphabetique_sinon() {
        assert_eq!(choix("b + a*k"), "a");
        assert_eq!(choix("k^2"), "k");
    }

    #[test]
    fn sans_variable() {
        assert_eq!(choix("2 + pi"), "x");
    }
}
