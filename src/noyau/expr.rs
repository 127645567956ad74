// src/noyau/expr.rs
//
// AST exact (sans flottants).
// - Rat : rationnel exact
// - Pi, E, I : constantes symboliques (π, e, i)
// - Infini : +∞ (−∞ = Mul[-1, Infini])
// - Indefini : résultat indéterminé (0/0, ∞-∞, tan(π/2)…)
// - Var : variable symbolique (ex: x)
// - Add / Mul : n-aires, aplatis, triés (voir canon.rs)
// - Pow : puissance générale (√x = x^(1/2), exp(x) = E^x)
// - Fonc : fonction unaire nommée
//
// IMPORTANT (SAFE):
// - on ne construit JAMAIS Add/Mul/Pow/Fonc “à la main” hors de canon.rs :
//   on passe par somme / produit / puissance / fonction, qui garantissent la forme canonique.
// - l’égalité structurelle (==) vaut donc égalité de forme canonique.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Fonction {
    Sin,
    Cos,
    Tan,
    Cot,
    Sec,
    Csc,
    Asin,
    Acos,
    Atan,
    Acot,
    Asec,
    Acsc,
    Sinh,
    Cosh,
    Tanh,
    Log,
}

impl Fonction {
    pub fn nom(self) -> &'static str {
        use Fonction::*;
        match self {
            Sin => "sin",
            Cos => "cos",
            Tan => "tan",
            Cot => "cot",
            Sec => "sec",
            Csc => "csc",
            Asin => "asin",
            Acos => "acos",
            Atan => "atan",
            Acot => "acot",
            Asec => "asec",
            Acsc => "acsc",
            Sinh => "sinh",
            Cosh => "cosh",
            Tanh => "tanh",
            Log => "log",
        }
    }

    /// Fonctions nommées du noyau (exp et sqrt sont réécrites en Pow à la lecture).
    pub fn depuis_nom(nom: &str) -> Option<Fonction> {
        use Fonction::*;
        Some(match nom {
            "sin" => Sin,
            "cos" => Cos,
            "tan" => Tan,
            "cot" => Cot,
            "sec" => Sec,
            "csc" => Csc,
            "asin" => Asin,
            "acos" => Acos,
            "atan" => Atan,
            "acot" => Acot,
            "asec" => Asec,
            "acsc" => Acsc,
            "sinh" => Sinh,
            "cosh" => Cosh,
            "tanh" => Tanh,
            "log" | "ln" => Log,
            _ => return None,
        })
    }

    /// Trigonométrie circulaire : ensemble de solutions infini (périodique).
    pub fn est_periodique(self) -> bool {
        use Fonction::*;
        matches!(self, Sin | Cos | Tan | Cot | Sec | Csc)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Rat(BigRational),
    Pi,
    E,
    I,
    Infini,
    Indefini,

    Var(String),

    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Fonc(Fonction, Box<Expr>),
}

impl Expr {
    /* ------------------------ Feuilles ------------------------ */

    pub fn entier(n: i64) -> Expr {
        Expr::Rat(BigRational::from_integer(BigInt::from(n)))
    }

    pub fn rat(n: i64, d: i64) -> Expr {
        Expr::Rat(BigRational::new(BigInt::from(n), BigInt::from(d)))
    }

    pub fn zero() -> Expr {
        Expr::Rat(BigRational::zero())
    }

    pub fn un() -> Expr {
        Expr::Rat(BigRational::one())
    }

    pub fn var(nom: &str) -> Expr {
        Expr::Var(nom.to_string())
    }

    /// −∞ sous forme canonique.
    pub fn moins_infini() -> Expr {
        Expr::Mul(vec![Expr::entier(-1), Expr::Infini])
    }

    /* ------------------------ Tests simples ------------------------ */

    pub fn est_zero(&self) -> bool {
        matches!(self, Expr::Rat(r) if r.is_zero())
    }

    pub fn est_un(&self) -> bool {
        matches!(self, Expr::Rat(r) if r.is_one())
    }

    pub fn as_rat(&self) -> Option<&BigRational> {
        match self {
            Expr::Rat(r) => Some(r),
            _ => None,
        }
    }

    /// Entier “petit” (i64) si l’expression est un rationnel entier.
    pub fn as_entier(&self) -> Option<i64> {
        match self {
            Expr::Rat(r) if r.denom().is_one() => r.numer().to_i64(),
            _ => None,
        }
    }

    /// Signe d’un infini canonique : +1 (∞), −1 (−∞), None sinon.
    pub fn signe_infini(&self) -> Option<i8> {
        match self {
            Expr::Infini => Some(1),
            Expr::Mul(v) if v.len() == 2 && v[1] == Expr::Infini => match &v[0] {
                Expr::Rat(r) if r.is_negative() => Some(-1),
                Expr::Rat(r) if r.is_positive() => Some(1),
                _ => None,
            },
            _ => None,
        }
    }

    /// Coefficient rationnel en tête + reste (reste = 1 si purement rationnel).
    pub fn coeff_et_reste(&self) -> (BigRational, Expr) {
        match self {
            Expr::Rat(r) => (r.clone(), Expr::un()),
            Expr::Mul(v) => match v.first() {
                Some(Expr::Rat(r)) => {
                    let reste: Vec<Expr> = v[1..].to_vec();
                    let reste = if reste.len() == 1 {
                        reste.into_iter().next().unwrap_or_else(Expr::un)
                    } else {
                        Expr::Mul(reste)
                    };
                    (r.clone(), reste)
                }
                _ => (BigRational::one(), self.clone()),
            },
            _ => (BigRational::one(), self.clone()),
        }
    }

    /// Vrai si un signe “-” peut sortir proprement (coefficient négatif).
    pub fn signe_extractible(&self) -> bool {
        self.coeff_et_reste().0.is_negative()
    }

    /* ------------------------ Parcours ------------------------ */

    pub fn enfants(&self) -> Vec<&Expr> {
        match self {
            Expr::Add(v) | Expr::Mul(v) => v.iter().collect(),
            Expr::Pow(b, e) => vec![b.as_ref(), e.as_ref()],
            Expr::Fonc(_, x) => vec![x.as_ref()],
            _ => Vec::new(),
        }
    }

    /// Vrai si un sous-arbre vérifie `pred` (itératif, pas de récursion profonde).
    pub fn existe(&self, pred: &dyn Fn(&Expr) -> bool) -> bool {
        let mut pile: Vec<&Expr> = vec![self];
        while let Some(e) = pile.pop() {
            if pred(e) {
                return true;
            }
            pile.extend(e.enfants());
        }
        false
    }

    pub fn contient_var(&self, nom: &str) -> bool {
        self.existe(&|e| matches!(e, Expr::Var(v) if v == nom))
    }

    pub fn contient(&self, cible: &Expr) -> bool {
        self.existe(&|e| e == cible)
    }

    pub fn variables_libres(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut pile: Vec<&Expr> = vec![self];
        while let Some(e) = pile.pop() {
            if let Expr::Var(v) = e {
                out.insert(v.clone());
            }
            pile.extend(e.enfants());
        }
        out
    }

    /// Pas de variable libre.
    pub fn est_constant(&self) -> bool {
        !self.existe(&|e| matches!(e, Expr::Var(_)))
    }

    /// Ni ∞ ni indéfini dans l’arbre.
    pub fn est_fini(&self) -> bool {
        !self.existe(&|e| matches!(e, Expr::Infini | Expr::Indefini))
    }

    pub fn taille(&self) -> usize {
        1 + self.enfants().iter().map(|e| e.taille()).sum::<usize>()
    }

    /* ------------------------ Réécriture ------------------------ */

    /// Réécrit de haut en bas : si `f` propose un remplaçant, on le prend,
    /// sinon on descend et on reconstruit par les constructeurs canoniques.
    pub fn transformer(&self, f: &dyn Fn(&Expr) -> Option<Expr>) -> Expr {
        if let Some(r) = f(self) {
            return r;
        }
        match self {
            Expr::Add(v) => Expr::somme(v.iter().map(|t| t.transformer(f)).collect()),
            Expr::Mul(v) => Expr::produit(v.iter().map(|t| t.transformer(f)).collect()),
            Expr::Pow(b, e) => Expr::puissance(b.transformer(f), e.transformer(f)),
            Expr::Fonc(g, x) => Expr::fonction(*g, x.transformer(f)),
            _ => self.clone(),
        }
    }

    pub fn substituer(&self, nom: &str, valeur: &Expr) -> Expr {
        self.transformer(&|e| match e {
            Expr::Var(v) if v == nom => Some(valeur.clone()),
            _ => None,
        })
    }

    pub fn remplacer(&self, cible: &Expr, par: &Expr) -> Expr {
        self.transformer(&|e| if e == cible { Some(par.clone()) } else { None })
    }
}

/* ------------------------ Modulo rationnel exact (sans flottants) ------------------------ */

/// Réduction modulo `periode` sur un coefficient rationnel (ex: periode=2 pour sin/cos, 1 pour tan).
/// Retourne un rationnel dans [0, periode).
///
/// Si coeff = n/d, alors coeff mod periode = (n mod (periode*d))/d.
pub(crate) fn mod_rationnel(coeff: &BigRational, periode: i64) -> BigRational {
    if periode <= 0 {
        return coeff.clone();
    }
    if coeff.is_zero() {
        return BigRational::zero();
    }

    let d = coeff.denom().clone();
    let n = coeff.numer().clone();
    let m = BigInt::from(periode) * &d;

    let r = mod_euclid_bigint(&n, &m);
    BigRational::new(r, d)
}

fn mod_euclid_bigint(a: &BigInt, m: &BigInt) -> BigInt {
    if m.is_zero() {
        return a.clone();
    }
    let mut r = a % m;
    if r.is_negative() {
        r += m;
    }
    r
}

/* ------------------------ Outils rationnels ------------------------ */

pub(crate) fn rational_pow_int(base: BigRational, exp: i64) -> BigRational {
    if exp == 0 {
        return BigRational::one();
    }
    if exp < 0 {
        let pos = rational_pow_int(base, -exp);
        return BigRational::one() / pos;
    }

    let mut e = exp as u64;
    let mut acc = BigRational::one();
    let mut b = base;

    while e > 0 {
        if (e & 1) == 1 {
            acc *= b.clone();
        }
        e >>= 1;
        if e > 0 {
            b *= b.clone();
        }
    }
    acc
}

/// Racine q-ième exacte d’un entier >= 0 (None si pas une puissance parfaite).
pub(crate) fn int_root_exact(x: &BigInt, q: u32) -> Option<BigInt> {
    if x.is_negative() || q == 0 {
        return None;
    }
    let s = if q == 2 { int_sqrt_floor(x) } else { x.nth_root(q) };
    if s.pow(q) == *x {
        Some(s)
    } else {
        None
    }
}

pub(crate) fn int_sqrt_floor(x: &BigInt) -> BigInt {
    if x.is_zero() || x.is_negative() {
        return BigInt::zero();
    }

    let mut y = approx_sqrt_start(x);
    loop {
        let y_next = (&y + (x / &y)) >> 1;
        if y_next >= y {
            let mut z = y_next;
            while (&z + 1u32) * (&z + 1u32) <= *x {
                z += 1u32;
            }
            while &z * &z > *x {
                z -= 1u32;
            }
            return z;
        }
        y = y_next;
    }
}

fn approx_sqrt_start(x: &BigInt) -> BigInt {
    let bits = x.bits();
    let half = bits.div_ceil(2);
    BigInt::one() << half
}

/// Décompose n >= 1 en n = s^q * t, avec t sans facteur puissance q-ième (essais bornés).
pub(crate) fn extrait_puissance_parfaite(n: &BigInt, q: u32) -> (BigInt, BigInt) {
    if n.is_zero() || n.is_one() || q < 2 {
        return (BigInt::one(), n.clone());
    }

    let mut reste = n.clone();
    let mut s = BigInt::one();

    // Essai par p = 2 puis impairs, borné (les grands facteurs restent sous la racine).
    let mut p = BigInt::from(2);
    let borne = BigInt::from(100_000);
    while p.pow(q) <= reste && p <= borne {
        let pq = p.pow(q);
        while (&reste % &pq).is_zero() {
            reste /= &pq;
            s *= &p;
        }
        if p == BigInt::from(2) {
            p = BigInt::from(3);
        } else {
            p += 2;
        }
    }

    (s, reste)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_libres_triees() {
        let e = Expr::somme(vec![Expr::var("y"), Expr::var("x"), Expr::var("t")]);
        let v: Vec<String> = e.variables_libres().into_iter().collect();
        assert_eq!(v, vec!["t", "x", "y"]);
    }

    #[test]
    fn substitution_reconstruit_canon() {
        // x + x*y, y := 1  =>  2*x
        let x = Expr::var("x");
        let e = Expr::somme(vec![
            x.clone(),
            Expr::produit(vec![x.clone(), Expr::var("y")]),
        ]);
        let s = e.substituer("y", &Expr::un());
        assert_eq!(s, Expr::produit(vec![Expr::entier(2), x]));
    }

    #[test]
    fn coeff_et_reste_sur_produit() {
        let e = Expr::produit(vec![Expr::entier(-3), Expr::var("x")]);
        let (c, r) = e.coeff_et_reste();
        assert_eq!(c, BigRational::from_integer(BigInt::from(-3)));
        assert_eq!(r, Expr::var("x"));
        assert!(e.signe_extractible());
    }

    #[test]
    fn modulo_rationnel() {
        let r = BigRational::new(BigInt::from(9), BigInt::from(4));
        assert_eq!(mod_rationnel(&r, 2), BigRational::new(BigInt::from(1), BigInt::from(4)));
    }

    #[test]
    fn puissances_parfaites() {
        assert_eq!(int_root_exact(&BigInt::from(27), 3), Some(BigInt::from(3)));
        assert_eq!(int_root_exact(&BigInt::from(12), 2), None);
        let (s, t) = extrait_puissance_parfaite(&BigInt::from(72), 2);
        assert_eq!((s, t), (BigInt::from(6), BigInt::from(2)));
    }
}
