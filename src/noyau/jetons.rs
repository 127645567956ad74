// src/noyau/jetons.rs

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Pow};

use super::erreur::{ErreurNoyau, Resultat};

#[derive(Clone, Debug, PartialEq)]
pub enum Tok {
    Num(BigRational),

    // Fonctions, variables et constantes nommées (pi, E, I, oo).
    // NOTE: le parse (RPN->Expr) décidera si c’est une fonction (sin/cos/...) ou un atome.
    Ident(String),

    Plus,
    Minus,
    Star,
    Slash,
    Caret, // ^ ou **

    // Moins unaire : produit seulement par to_rpn, jamais par tokenize.
    Neg,

    LPar,
    RPar,
}

/// Tokenize une chaîne en jetons.
/// Supporte:
/// - entiers (ex: 12) et décimaux (ex: 2.5 -> Num(5/2), exact)
/// - opérateurs + - * / ^ et ** (puissance)
/// - parenthèses ( )
/// - π (équivaut à ident("pi"))
/// - identifiants [a-zA-Z_][a-zA-Z0-9_]* (casse conservée : E et I sont des constantes)
/// - √ (équivaut à ident("sqrt"))
pub fn tokenize(s: &str) -> Resultat<Vec<Tok>> {
    let mut out = Vec::new();
    let chars: Vec<char> = s.chars().collect();
    let mut i: usize = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Opérateurs et parenthèses
        let simple = match c {
            '(' => Some(Tok::LPar),
            ')' => Some(Tok::RPar),
            '+' => Some(Tok::Plus),
            '-' => Some(Tok::Minus),
            '/' => Some(Tok::Slash),
            '^' => Some(Tok::Caret),
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                Some(Tok::Caret)
            }
            '*' => Some(Tok::Star),
            'π' => Some(Tok::Ident("pi".to_string())),
            '√' => Some(Tok::Ident("sqrt".to_string())),
            _ => None,
        };
        if let Some(t) = simple {
            out.push(t);
            i += 1;
            continue;
        }

        // Identifiants ASCII : [a-zA-Z_][a-zA-Z0-9_]*
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            out.push(Tok::Ident(word));
            continue;
        }

        // Nombre : chiffres [. chiffres]  (ou .5)
        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let entier: String = chars[start..i].iter().collect();

            let mut decimales = String::new();
            if i < chars.len() && chars[i] == '.' {
                i += 1;
                let start_d = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                decimales = chars[start_d..i].iter().collect();
                if i < chars.len() && chars[i] == '.' {
                    let texte: String = chars[start..=i].iter().collect();
                    return Err(ErreurNoyau::NombreInvalide(texte));
                }
            }

            out.push(Tok::Num(lire_nombre(&entier, &decimales)?));
            continue;
        }

        return Err(ErreurNoyau::CaractereInattendu(c));
    }

    Ok(out)
}

/// "12" + "5" -> 125/10 (exact)
fn lire_nombre(entier: &str, decimales: &str) -> Resultat<BigRational> {
    let chiffres = format!("{entier}{decimales}");
    let chiffres = if chiffres.is_empty() { "0".to_string() } else { chiffres };
    let n = BigInt::parse_bytes(chiffres.as_bytes(), 10)
        .ok_or_else(|| ErreurNoyau::NombreInvalide(format!("{entier}.{decimales}")))?;
    let d: BigInt = if decimales.is_empty() {
        BigInt::one()
    } else {
        Pow::pow(BigInt::from(10), decimales.len())
    };
    Ok(BigRational::new(n, d))
}

/// Format utilitaire (debug/“démarche”) : liste de jetons en texte.
pub fn format_tokens(tokens: &[Tok]) -> String {
    fn format_rat(r: &BigRational) -> String {
        let n = r.numer();
        let d = r.denom();
        if d.is_one() {
            format!("{n}")
        } else {
            format!("{n}/{d}")
        }
    }

    let mut out = Vec::new();
    for t in tokens {
        let s = match t {
            Tok::Num(r) => format_rat(r),
            Tok::Ident(name) => name.clone(),

            Tok::Plus => "+".to_string(),
            Tok::Minus => "-".to_string(),
            Tok::Star => "*".to_string(),
            Tok::Slash => "/".to_string(),
            Tok::Caret => "^".to_string(),
            Tok::Neg => "neg".to_string(),

            Tok::LPar => "(".to_string(),
            Tok::RPar => ")".to_string(),
        };
        out.push(s);
    }
    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_exact() {
        let t = tokenize("2.5").unwrap();
        assert_eq!(t, vec![Tok::Num(BigRational::new(BigInt::from(5), BigInt::from(2)))]);
    }

    #[test]
    fn double_etoile_est_puissance() {
        let t = tokenize("x**2").unwrap();
        assert_eq!(format_tokens(&t), "x ^ 2");
    }

    #[test]
    fn casse_conservee() {
        let t = tokenize("E*I").unwrap();
        assert_eq!(
            t,
            vec![Tok::Ident("E".into()), Tok::Star, Tok::Ident("I".into())]
        );
    }

    #[test]
    fn caractere_refuse() {
        assert_eq!(tokenize("x = 2"), Err(ErreurNoyau::CaractereInattendu('=')));
        assert!(matches!(tokenize("1.2.3"), Err(ErreurNoyau::NombreInvalide(_))));
    }
}
