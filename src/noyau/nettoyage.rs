// src/noyau/nettoyage.rs
//
// Texte brut -> expression normalisée (grammaire canonique, sans espaces).
//
// Étapes (l’ordre compte) :
// 1. signes moins typographiques -> '-', '^' -> '**'
// 2. minuscules, ln( -> log(
// 3. constantes sur les mots entiers : pi -> pi, e -> E
// 4. noms de fonctions marqués FUNC_ devant '(' (protégés des mots vides)
// 5. mots vides retirés (frontières de mots)
// 6. multiplication implicite : 2x -> 2*x, )( -> )*(
// 7. espaces retirés
// 8. marqueurs FUNC_ retirés
//
// La passe est itérée jusqu’au point fixe : normaliser(normaliser(s)) == normaliser(s).

use std::sync::OnceLock;

use regex::{Captures, Regex};

const FONCTIONS: [&str; 18] = [
    "sin", "cos", "tan", "cot", "sec", "csc", "asin", "acos", "atan", "acot", "asec", "acsc",
    "sinh", "cosh", "tanh", "exp", "log", "sqrt",
];

const MOTS_VIDES: &str = r"\b(solve|solution|sum|answer|for|the|equation|find|roots?|of|approximate|calculate|compute|differentiate|derivative|integrate|integral|limit|evaluate|simplify|summation|with respect to|what is|is|a|an|to)\b";

/// Borne du point fixe (en pratique 2 ou 3 passes).
const MAX_PASSES: usize = 32;

struct Motifs {
    lettres: Regex,
    fonctions: Regex,
    mots_vides: Regex,
    implicite: Regex,
    parentheses: Regex,
    espaces: Regex,
    marques: Regex,
}

fn motifs() -> &'static Motifs {
    static MOTIFS: OnceLock<Motifs> = OnceLock::new();
    MOTIFS.get_or_init(|| {
        let re = |m: &str| Regex::new(m).expect("motif constant");
        Motifs {
            lettres: re(r"[a-zA-Z]+"),
            fonctions: re(&format!(r"\b({})\s*\(", FONCTIONS.join("|"))),
            mots_vides: re(MOTS_VIDES),
            implicite: re(r"(\d|\))([a-zA-Z(])"),
            parentheses: re(r"(\))(\()"),
            espaces: re(r"\s+"),
            marques: re(&format!(r"FUNC_({})\(", FONCTIONS.join("|"))),
        }
    })
}

/// Normalise une requête brute (n’échoue jamais).
pub fn normaliser(texte: &str) -> String {
    let mut courant = une_passe(texte);
    for _ in 0..MAX_PASSES {
        let suivant = une_passe(&courant);
        if suivant == courant {
            break;
        }
        courant = suivant;
    }
    courant
}

fn une_passe(texte: &str) -> String {
    let m = motifs();

    let s = texte
        .trim()
        .replace(['\u{2212}', '\u{2013}'], "-")
        .replace('^', "**");

    let s = s.to_lowercase().replace("ln(", "log(");

    let s = m.lettres.replace_all(&s, |c: &Captures| match &c[0] {
        "e" => "E".to_string(),
        autre => autre.to_string(),
    });

    let s = m.fonctions.replace_all(&s, "FUNC_${1}(");
    let s = m.mots_vides.replace_all(&s, "");
    let s = m.implicite.replace_all(&s, "${1}*${2}");
    let s = m.parentheses.replace_all(&s, "${1}*${2}");
    let s = m.espaces.replace_all(&s, "");
    let s = m.marques.replace_all(&s, "${1}(");

    s.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn puissance_et_implicite() {
        assert_eq!(normaliser("3x^2 + 4"), "3*x**2+4");
        assert_eq!(normaliser("2(x+1)"), "2*(x+1)");
        assert_eq!(normaliser("(x+1)(x-1)"), "(x+1)*(x-1)");
    }

    #[test]
    fn mots_vides_retires() {
        assert_eq!(normaliser("solve x^2 - 4 = 0"), "x**2-4=0");
        assert_eq!(normaliser("What is 2+3*4"), "2+3*4");
        assert_eq!(normaliser("find the roots of x^2-1"), "x**2-1");
    }

    #[test]
    fn variable_a_supprimee() {
        // `a` est un mot vide : une variable nommée a disparaît
        assert_eq!(normaliser("a + 1"), "+1");
    }

    #[test]
    fn constantes_sur_mots_entiers() {
        assert_eq!(normaliser("e^x"), "E**x");
        assert_eq!(normaliser("2e"), "2*E");
        assert_eq!(normaliser("sec(x) + exp(x)"), "sec(x)+exp(x)");
        assert_eq!(normaliser("pi/2"), "pi/2");
    }

    #[test]
    fn fonctions_protegees() {
        // "tan" contient "a", "asin" contient "a" : les noms survivent
        assert_eq!(normaliser("tan(x) + asin(x)"), "tan(x)+asin(x)");
        assert_eq!(normaliser("ln(x)"), "log(x)");
    }

    #[test]
    fn moins_typographique() {
        assert_eq!(normaliser("x \u{2212} 1"), "x-1");
        assert_eq!(normaliser("x \u{2013} 1"), "x-1");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn idempotent(s in "[ -~]{0,40}") {
            let une = normaliser(&s);
            prop_assert_eq!(normaliser(&une), une);
        }

        #[test]
        fn idempotent_vocabulaire(
            mots in proptest::collection::vec(
                prop_oneof![
                    Just("solve"), Just("x"), Just("2"), Just("^"), Just("sin("), Just(")"),
                    Just("e"), Just("pi"), Just("a"), Just("="), Just(" "), Just("ln("),
                    Just("derivative"), Just("("), Just("*"), Just("-"),
                ],
                0..20,
            )
        ) {
            let s: String = mots.concat();
            let une = normaliser(&s);
            prop_assert_eq!(normaliser(&une), une);
        }
    }
}
