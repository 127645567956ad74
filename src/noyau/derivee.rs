// src/noyau/derivee.rs
//
// Dérivation symbolique exacte.
// - linéarité, produit (n-aire), puissance générale, composition
// - le résultat est canonique mais non simplifié (voir simplification.rs)

use super::expr::{Expr, Fonction};

/// d e / d var
pub fn deriver(e: &Expr, var: &str) -> Expr {
    if !e.contient_var(var) {
        return Expr::zero();
    }

    match e {
        Expr::Var(v) if v == var => Expr::un(),

        Expr::Add(v) => Expr::somme(v.iter().map(|t| deriver(t, var)).collect()),

        Expr::Mul(v) => {
            // (f1·f2·…)' = Σ f1·…·fi'·…·fn
            let mut termes = Vec::with_capacity(v.len());
            for (i, fi) in v.iter().enumerate() {
                if !fi.contient_var(var) {
                    continue;
                }
                let mut facteurs = v.clone();
                facteurs[i] = deriver(fi, var);
                termes.push(Expr::produit(facteurs));
            }
            Expr::somme(termes)
        }

        Expr::Pow(b, x) => deriver_puissance(b, x, var),

        Expr::Fonc(f, u) => Expr::produit(vec![derivee_fonction(*f, u), deriver(u, var)]),

        _ => Expr::zero(),
    }
}

fn deriver_puissance(b: &Expr, x: &Expr, var: &str) -> Expr {
    let b_var = b.contient_var(var);
    let x_var = x.contient_var(var);
    let puissance = || Expr::puissance(b.clone(), x.clone());
    let log_b = || Expr::fonction(Fonction::Log, b.clone());

    match (b_var, x_var) {
        // (u^n)' = n·u^(n−1)·u'
        (true, false) => Expr::produit(vec![
            x.clone(),
            Expr::puissance(b.clone(), x.clone() - Expr::un()),
            deriver(b, var),
        ]),
        // (c^v)' = c^v·log(c)·v'
        (false, true) => Expr::produit(vec![puissance(), log_b(), deriver(x, var)]),
        // (u^v)' = u^v·(v'·log(u) + v·u'/u)
        _ => Expr::produit(vec![
            puissance(),
            deriver(x, var) * log_b() + x.clone() * deriver(b, var) / b.clone(),
        ]),
    }
}

/// f'(u), sans le facteur u'.
fn derivee_fonction(f: Fonction, u: &Expr) -> Expr {
    use Fonction::*;

    let app = |g: Fonction| Expr::fonction(g, u.clone());
    let carre = |e: Expr| Expr::puissance(e, Expr::entier(2));
    let u2 = || carre(u.clone());
    let un = Expr::un;

    match f {
        Sin => app(Cos),
        Cos => -app(Sin),
        Tan => un() + carre(app(Tan)),
        Cot => -(un() + carre(app(Cot))),
        Sec => app(Sec) * app(Tan),
        Csc => -(app(Csc) * app(Cot)),

        Asin => Expr::racine(un() - u2()).inverse(),
        Acos => -Expr::racine(un() - u2()).inverse(),
        Atan => (un() + u2()).inverse(),
        Acot => -(un() + u2()).inverse(),
        Asec => (u2() * Expr::racine(un() - u2().inverse())).inverse(),
        Acsc => -(u2() * Expr::racine(un() - u2().inverse())).inverse(),

        Sinh => app(Cosh),
        Cosh => app(Sinh),
        Tanh => un() - carre(app(Tanh)),

        Log => u.clone().inverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::rpn::lire_expression;
    use crate::noyau::simplification::simplifier;

    fn d(s: &str) -> String {
        simplifier(&deriver(&lire_expression(s).unwrap(), "x")).to_string()
    }

    #[test]
    fn polynome() {
        assert_eq!(d("x^3 + 4*x"), "3*x**2 + 4");
        assert_eq!(d("5"), "0");
        assert_eq!(d("x"), "1");
    }

    #[test]
    fn trigonometrie() {
        assert_eq!(d("sin(x)"), "cos(x)");
        assert_eq!(d("cos(x)"), "-sin(x)");
        assert_eq!(d("sin(2*x)"), "2*cos(2*x)");
    }

    #[test]
    fn exponentielle_et_log() {
        assert_eq!(d("exp(x)"), "exp(x)");
        assert_eq!(d("log(x)"), "1/x");
        assert_eq!(d("exp(x^2)"), "2*x*exp(x**2)");
    }

    #[test]
    fn produit() {
        assert_eq!(d("x*sin(x)"), "x*cos(x) + sin(x)");
    }

    #[test]
    fn autre_variable_constante() {
        let e = lire_expression("a*x^2").unwrap();
        assert_eq!(simplifier(&deriver(&e, "a")).to_string(), "x**2");
    }
}
