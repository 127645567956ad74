// src/noyau/rpn.rs
//
// Shunting-yard -> RPN -> AST
// Objectif:
// - Convertir une suite de Tok en RPN (postfix)
// - Puis reconstruire Expr par les constructeurs canoniques
//
// Règles:
// - Ident(name):
//    - fonction connue (sin, cos, log, exp, sqrt, …) => fonction unaire (postfixée en RPN)
//    - pi, E, I, oo => constantes
//    - sinon => variable (Expr::Var) ; suivie de '(' => fonction inconnue (erreur)
// - Moins unaire:
//    - si '-' arrive quand on n’attend PAS une valeur, c’est Tok::Neg
//    - priorité : + - < * / < neg < ^   (donc -x^2 = -(x^2) et 2*-3 = -6)
//
// NOTE:
// - Les fonctions sont traitées comme des opérateurs “collés” à leur argument
//   et sont sorties après la parenthèse fermante.

use super::erreur::{ErreurNoyau, Resultat};
use super::expr::{Expr, Fonction};
use super::jetons::{tokenize, Tok};

/// Imbrication maximale (parenthèses, fonctions, moins unaires, tours de puissances).
/// Au-delà, les parcours récursifs de l’arbre risqueraient de déborder la pile.
pub const MAX_PROFONDEUR: usize = 256;

fn precedence(t: &Tok) -> i32 {
    match t {
        Tok::Plus | Tok::Minus => 1,
        Tok::Star | Tok::Slash => 2,
        Tok::Neg => 3,
        Tok::Caret => 4,
        _ => 0,
    }
}

fn is_right_associative(t: &Tok) -> bool {
    matches!(t, Tok::Caret | Tok::Neg)
}

/// Identificateurs reconnus comme fonctions (unaire).
fn is_fonction_ident(name: &str) -> bool {
    matches!(name, "sqrt" | "exp") || Fonction::depuis_nom(name).is_some()
}

fn est_fonction(t: &Tok) -> bool {
    matches!(t, Tok::Ident(name) if is_fonction_ident(name))
}

/// Lecture complète : texte -> Expr canonique.
pub fn lire_expression(s: &str) -> Resultat<Expr> {
    let tokens = tokenize(s)?;
    if tokens.is_empty() {
        return Err(ErreurNoyau::EntreeVide);
    }
    let rpn = to_rpn(&tokens)?;
    from_rpn(&rpn)
}

/// Convertit une suite de jetons en RPN (notation polonaise inversée).
///
/// Exemple:
///   tokens: [Ident("sin"), LPar, Ident("pi"), Slash, Num(2), RPar]
///   rpn:    [Ident("pi"), Num(2), Slash, Ident("sin")]
pub fn to_rpn(tokens: &[Tok]) -> Resultat<Vec<Tok>> {
    let mut out: Vec<Tok> = Vec::new();
    let mut ops: Vec<Tok> = Vec::new();

    // “valeur” = un atome ou une expression fermée.
    // Sert à détecter le moins unaire.
    let mut prev_was_value = false;

    for (i, tok) in tokens.iter().cloned().enumerate() {
        match tok {
            Tok::Num(_) => {
                out.push(tok);
                prev_was_value = true;
            }

            Tok::Ident(name) => {
                let suivi_de_parenthese = matches!(tokens.get(i + 1), Some(Tok::LPar));
                if is_fonction_ident(&name) {
                    // fonction : on la garde sur la pile (elle sortira après son argument)
                    ops.push(Tok::Ident(name));
                    prev_was_value = false;
                } else if suivi_de_parenthese {
                    return Err(ErreurNoyau::FonctionInconnue(name));
                } else {
                    // variable/atome : sortie directe
                    out.push(Tok::Ident(name));
                    prev_was_value = true;
                }
            }

            Tok::LPar => {
                ops.push(tok);
                prev_was_value = false;
            }

            Tok::RPar => {
                // dépile jusqu’à '('
                let mut ouverte = false;
                while let Some(top) = ops.pop() {
                    if matches!(top, Tok::LPar) {
                        ouverte = true;
                        break;
                    }
                    out.push(top);
                }
                if !ouverte {
                    return Err(ErreurNoyau::ParentheseOrpheline);
                }

                // si une fonction est au sommet, on la sort aussi
                if ops.last().is_some_and(est_fonction) {
                    if let Some(f) = ops.pop() {
                        out.push(f);
                    }
                }

                prev_was_value = true;
            }

            Tok::Minus if !prev_was_value => {
                // moins unaire : préfixe, rien à dépiler
                ops.push(Tok::Neg);
                prev_was_value = false;
            }

            Tok::Plus if !prev_was_value => {
                // plus unaire : ignoré
            }

            Tok::Plus | Tok::Minus | Tok::Star | Tok::Slash | Tok::Caret | Tok::Neg => {
                // dépile tant que:
                // - on n'est pas bloqué par '('
                // - et on ne traverse pas une fonction (fonction reste collée à son argument)
                // - et la précédence/associativité exige de sortir l'opérateur du haut
                while let Some(top) = ops.last() {
                    if matches!(top, Tok::LPar) || est_fonction(top) {
                        break;
                    }

                    let p_top = precedence(top);
                    let p_tok = precedence(&tok);

                    let doit_pop = if is_right_associative(&tok) {
                        p_top > p_tok
                    } else {
                        p_top >= p_tok
                    };

                    if !doit_pop {
                        break;
                    }
                    if let Some(op) = ops.pop() {
                        out.push(op);
                    }
                }

                ops.push(tok);
                prev_was_value = false;
            }
        }

        if ops.len() > MAX_PROFONDEUR {
            return Err(ErreurNoyau::ImbricationTropProfonde(MAX_PROFONDEUR));
        }
    }

    // vide la pile ops
    while let Some(op) = ops.pop() {
        if matches!(op, Tok::LPar) {
            return Err(ErreurNoyau::ParenthesesNonFermees);
        }
        out.push(op);
    }

    Ok(out)
}

/// Construit une Expr à partir d’une RPN.
pub fn from_rpn(rpn: &[Tok]) -> Resultat<Expr> {
    let mut st: Vec<Expr> = Vec::new();

    for tok in rpn.iter().cloned() {
        match tok {
            Tok::Num(r) => st.push(Expr::Rat(r)),

            Tok::Neg => {
                let a = st.pop().ok_or(ErreurNoyau::ExpressionInvalide)?;
                st.push(-a);
            }

            Tok::Plus | Tok::Minus | Tok::Star | Tok::Slash | Tok::Caret => {
                let b = st.pop().ok_or(ErreurNoyau::ExpressionInvalide)?;
                let a = st.pop().ok_or(ErreurNoyau::ExpressionInvalide)?;

                let e = match tok {
                    Tok::Plus => a + b,
                    Tok::Minus => a - b,
                    Tok::Star => a * b,
                    Tok::Slash => a / b,
                    _ => Expr::puissance(a, b),
                };

                st.push(e);
            }

            Tok::Ident(name) => {
                if is_fonction_ident(&name) {
                    let x = st.pop().ok_or(ErreurNoyau::ExpressionInvalide)?;
                    let e = match name.as_str() {
                        "sqrt" => Expr::racine(x),
                        "exp" => Expr::exp(x),
                        autre => match Fonction::depuis_nom(autre) {
                            Some(f) => Expr::fonction(f, x),
                            None => return Err(ErreurNoyau::FonctionInconnue(name)),
                        },
                    };
                    st.push(e);
                } else {
                    st.push(atome(&name));
                }
            }

            Tok::LPar | Tok::RPar => return Err(ErreurNoyau::ExpressionInvalide),
        }
    }

    match (st.pop(), st.is_empty()) {
        (Some(e), true) => Ok(e),
        _ => Err(ErreurNoyau::ExpressionInvalide),
    }
}

fn atome(name: &str) -> Expr {
    match name {
        "pi" => Expr::Pi,
        "E" => Expr::E,
        "I" => Expr::I,
        "oo" => Expr::Infini,
        _ => Expr::Var(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lire(s: &str) -> String {
        lire_expression(s).unwrap().to_string()
    }

    #[test]
    fn moins_unaire_apres_operateur() {
        assert_eq!(lire("2*-3"), "-6");
        assert_eq!(lire("-2^2"), "-4");
        assert_eq!(lire("(-2)^2"), "4");
    }

    #[test]
    fn puissance_associative_droite() {
        assert_eq!(lire("2^3^2"), "512");
    }

    #[test]
    fn fonctions_et_constantes() {
        assert_eq!(lire("sin(pi/6)"), "1/2");
        assert_eq!(lire("sqrt(8)"), "2*sqrt(2)");
        assert_eq!(lire("exp(x)"), "exp(x)");
        assert_eq!(lire("log(E)"), "1");
    }

    #[test]
    fn erreurs() {
        assert_eq!(lire_expression("(1+2"), Err(ErreurNoyau::ParenthesesNonFermees));
        assert_eq!(lire_expression("1+2)"), Err(ErreurNoyau::ParentheseOrpheline));
        assert_eq!(
            lire_expression("foo(2)"),
            Err(ErreurNoyau::FonctionInconnue("foo".to_string()))
        );
        assert_eq!(lire_expression("2*"), Err(ErreurNoyau::ExpressionInvalide));
        assert_eq!(lire_expression(""), Err(ErreurNoyau::EntreeVide));
    }

    #[test]
    fn imbrication_bornee() {
        let ok = format!("{}x{}", "sin(".repeat(100), ")".repeat(100));
        assert!(lire_expression(&ok).is_ok());

        let trop = format!("{}x{}", "sin(".repeat(MAX_PROFONDEUR), ")".repeat(MAX_PROFONDEUR));
        assert_eq!(
            lire_expression(&trop),
            Err(ErreurNoyau::ImbricationTropProfonde(MAX_PROFONDEUR))
        );

        let tour = vec!["x"; MAX_PROFONDEUR + 2].join("^");
        assert!(lire_expression(&tour).is_err());
        let moins = format!("{}x", "-".repeat(MAX_PROFONDEUR + 1));
        assert!(lire_expression(&moins).is_err());
    }

    #[test]
    fn polynome_lu() {
        assert_eq!(lire("3*x**2 + 4"), "3*x**2 + 4");
        assert_eq!(lire("x*x - 1"), "x**2 - 1");
    }
}
