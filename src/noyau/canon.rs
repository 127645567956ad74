// src/noyau/canon.rs
//
// Constructeurs canoniques (déterministes) :
// - somme : aplatissement, regroupement des rationnels, des termes semblables (c·reste), ±∞
// - produit : aplatissement, coefficient rationnel en tête, regroupement par base (x·x = x^2),
//   distribution d’un coefficient sur une somme seule (2·(x+1) = 2x+2)
// - puissance : rationnels exacts, racines parfaites (√72 = 6√2), i^n, (x^a)^n, e^log(u) = u
// - fonction : angles spéciaux (trig.rs), parité, réciproques, log
// - tri déterministe des termes/facteurs (ordre total : rang puis clé)
//
// Toute construction d’Add/Mul/Pow/Fonc passe par ici.

use std::cmp::Ordering;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use super::expr::{extrait_puissance_parfaite, int_root_exact, rational_pow_int, Expr, Fonction};
use super::numerique::{evaluer_constante, signe_constante};
use super::trig::{valeur_reciproque, valeur_speciale};

/// Plus grand exposant entier calculé exactement sur un rationnel.
pub const MAX_EXPOSANT: i64 = 4096;

/// Taille (bits) maximale d’un rationnel obtenu par puissance exacte.
const MAX_BITS_PUISSANCE: u64 = 1 << 16;

impl Expr {
    /* ------------------------ Somme ------------------------ */

    pub fn somme(termes: Vec<Expr>) -> Expr {
        let mut plats = Vec::with_capacity(termes.len());
        aplatir(termes, &mut plats, true);

        let mut constante = BigRational::zero();
        let mut infini_pos = false;
        let mut infini_neg = false;
        let mut groupes: Vec<(Expr, BigRational)> = Vec::new();

        for t in plats {
            if matches!(t, Expr::Indefini) {
                return Expr::Indefini;
            }
            if let Expr::Rat(r) = &t {
                constante += r;
                continue;
            }
            match t.signe_infini() {
                Some(s) if s > 0 => {
                    infini_pos = true;
                    continue;
                }
                Some(_) => {
                    infini_neg = true;
                    continue;
                }
                None => {}
            }
            let (c, reste) = t.coeff_et_reste();
            match groupes.iter_mut().find(|(r, _)| *r == reste) {
                Some(g) => g.1 += c,
                None => groupes.push((reste, c)),
            }
        }

        // ∞ − ∞
        if infini_pos && infini_neg {
            return Expr::Indefini;
        }

        let mut v: Vec<Expr> = groupes
            .into_iter()
            .filter(|(_, c)| !c.is_zero())
            .map(|(reste, c)| avec_coeff(c, reste))
            .collect();

        if infini_pos || infini_neg {
            let inf = if infini_pos {
                Expr::Infini
            } else {
                Expr::moins_infini()
            };
            if v.iter().all(|t| t.est_constant() && t.est_fini()) {
                return inf;
            }
            v.push(inf);
        } else if !constante.is_zero() {
            v.push(Expr::Rat(constante));
        }

        match v.len() {
            0 => Expr::zero(),
            1 => v.pop().unwrap_or_else(Expr::zero),
            _ => {
                v.sort_by(cmp_termes);
                Expr::Add(v)
            }
        }
    }

    /* ------------------------ Produit ------------------------ */

    pub fn produit(facteurs: Vec<Expr>) -> Expr {
        let mut plats = Vec::with_capacity(facteurs.len());
        aplatir(facteurs, &mut plats, false);

        let mut coeff = BigRational::one();
        let mut infini = false;
        let mut bases: Vec<(Expr, Expr)> = Vec::new();

        for f in plats {
            match f {
                Expr::Indefini => return Expr::Indefini,
                Expr::Rat(r) => coeff *= r,
                Expr::Infini => infini = true,
                Expr::Pow(b, e) => ajoute_base(&mut bases, *b, *e),
                autre => ajoute_base(&mut bases, autre, Expr::un()),
            }
        }

        // Reconstruction base^exposant : peut relâcher des rationnels (x^0 = 1, √4 = 2…).
        let mut v: Vec<Expr> = Vec::with_capacity(bases.len());
        let mut a_refaire = false;
        for (b, e) in bases {
            match Expr::puissance(b, e) {
                Expr::Indefini => return Expr::Indefini,
                Expr::Rat(r) => coeff *= r,
                Expr::Infini => infini = true,
                p @ Expr::Mul(_) => {
                    a_refaire = true;
                    v.push(p);
                }
                p => v.push(p),
            }
        }

        // 0·∞
        if coeff.is_zero() {
            return if infini { Expr::Indefini } else { Expr::zero() };
        }

        if a_refaire {
            v.push(Expr::Rat(coeff));
            if infini {
                v.push(Expr::Infini);
            }
            return Expr::produit(v);
        }

        if infini {
            let signe_reste = if v.iter().all(|f| f.est_constant()) {
                signe_constante(&Expr::Mul(v.clone()))
            } else {
                None
            };
            let signe_coeff: i8 = if coeff.is_negative() { -1 } else { 1 };
            match signe_reste {
                Some(s) if s != 0 => {
                    return if s * signe_coeff > 0 {
                        Expr::Infini
                    } else {
                        Expr::moins_infini()
                    };
                }
                Some(_) => return Expr::Indefini,
                None => coeff = BigRational::from_integer(BigInt::from(signe_coeff)),
            }
        }

        // Coefficient seul devant une somme : on distribue.
        if !infini && v.len() == 1 && !coeff.is_one() {
            if let Expr::Add(termes) = &v[0] {
                return Expr::somme(
                    termes
                        .iter()
                        .map(|t| Expr::produit(vec![Expr::Rat(coeff.clone()), t.clone()]))
                        .collect(),
                );
            }
        }

        v.sort_by(cmp_facteurs);
        if infini {
            v.push(Expr::Infini);
        }
        if !coeff.is_one() || v.is_empty() {
            v.insert(0, Expr::Rat(coeff));
        }

        if v.len() == 1 {
            v.pop().unwrap_or_else(Expr::un)
        } else {
            Expr::Mul(v)
        }
    }

    /* ------------------------ Puissance ------------------------ */

    pub fn puissance(base: Expr, exposant: Expr) -> Expr {
        use Expr::*;

        if matches!(base, Indefini) || matches!(exposant, Indefini) {
            return Indefini;
        }
        if exposant.est_zero() {
            return Expr::un();
        }
        if exposant.est_un() {
            return base;
        }
        if base.est_un() {
            return if exposant.est_fini() {
                Expr::un()
            } else {
                Indefini
            };
        }

        if let Some(s) = exposant.signe_infini() {
            return puissance_infinie(base, exposant, s);
        }
        if let Some(s) = base.signe_infini() {
            return base_infinie(base, exposant, s);
        }

        match (&base, &exposant) {
            (Rat(b), Rat(e)) => return puissance_rationnelle(b, e),
            (I, Rat(e)) if e.denom().is_one() => return i_puissance(e.numer()),
            (E, Fonc(Fonction::Log, u)) => return (**u).clone(),
            (E, Mul(v)) => {
                // e^(c·log u) = u^c
                if let [Rat(c), Fonc(Fonction::Log, u)] = v.as_slice() {
                    return Expr::puissance((**u).clone(), Rat(c.clone()));
                }
            }
            _ => {}
        }

        let entier = exposant.as_rat().is_some_and(|r| r.denom().is_one());

        match base {
            Pow(b0, e0) => {
                if entier || base_positive(&b0) {
                    return Expr::puissance(*b0, Expr::produit(vec![*e0, exposant]));
                }
                Pow(Box::new(Pow(b0, e0)), Box::new(exposant))
            }
            Mul(fs) => {
                if entier {
                    return Expr::produit(
                        fs.into_iter()
                            .map(|f| Expr::puissance(f, exposant.clone()))
                            .collect(),
                    );
                }
                // (c·u)^r = c^r · u^r pour c > 0
                if let Some(Rat(c)) = fs.first() {
                    if c.is_positive() {
                        let c = Rat(c.clone());
                        let mut reste: Vec<Expr> = fs[1..].to_vec();
                        let reste = if reste.len() == 1 {
                            reste.pop().unwrap_or_else(Expr::un)
                        } else {
                            Mul(reste)
                        };
                        return Expr::produit(vec![
                            Expr::puissance(c, exposant.clone()),
                            Pow(Box::new(reste), Box::new(exposant)),
                        ]);
                    }
                }
                Pow(Box::new(Mul(fs)), Box::new(exposant))
            }
            autre => Pow(Box::new(autre), Box::new(exposant)),
        }
    }

    /* ------------------------ Fonctions ------------------------ */

    pub fn fonction(f: Fonction, x: Expr) -> Expr {
        use Fonction::*;

        if matches!(x, Expr::Indefini) {
            return Expr::Indefini;
        }

        if f.est_periodique() {
            if let Some(v) = valeur_speciale(f, &x) {
                return v;
            }
            if x.signe_infini().is_none() && x.signe_extractible() {
                let m = -x;
                return match f {
                    Cos | Sec => Expr::fonction(f, m),
                    _ => -Expr::fonction(f, m),
                };
            }
            // sin(asin u) = u …
            if let Expr::Fonc(g, u) = &x {
                if reciproque(f) == Some(*g) {
                    return (**u).clone();
                }
            }
            return Expr::Fonc(f, Box::new(x));
        }

        if f == Log {
            return logarithme(x);
        }

        if let Some(v) = valeur_reciproque(f, &x) {
            return v;
        }

        if x.signe_infini().is_none() && x.signe_extractible() {
            match f {
                Asin | Atan | Acot | Acsc | Sinh | Tanh => return -Expr::fonction(f, -x),
                Cosh => return Expr::fonction(f, -x),
                _ => {}
            }
        }

        Expr::Fonc(f, Box::new(x))
    }

    /* ------------------------ Raccourcis ------------------------ */

    pub fn racine(x: Expr) -> Expr {
        Expr::puissance(x, Expr::rat(1, 2))
    }

    pub fn exp(x: Expr) -> Expr {
        Expr::puissance(Expr::E, x)
    }

    pub fn inverse(self) -> Expr {
        Expr::puissance(self, Expr::entier(-1))
    }
}

impl Add for Expr {
    type Output = Expr;
    fn add(self, autre: Expr) -> Expr {
        Expr::somme(vec![self, autre])
    }
}

impl Sub for Expr {
    type Output = Expr;
    fn sub(self, autre: Expr) -> Expr {
        Expr::somme(vec![self, -autre])
    }
}

impl Mul for Expr {
    type Output = Expr;
    fn mul(self, autre: Expr) -> Expr {
        Expr::produit(vec![self, autre])
    }
}

impl Div for Expr {
    type Output = Expr;
    fn div(self, autre: Expr) -> Expr {
        Expr::produit(vec![self, autre.inverse()])
    }
}

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::produit(vec![Expr::entier(-1), self])
    }
}

/* ------------------------ Aplatissement / regroupement ------------------------ */

fn aplatir(v: Vec<Expr>, out: &mut Vec<Expr>, somme: bool) {
    for e in v {
        match e {
            Expr::Add(w) if somme => aplatir(w, out, somme),
            Expr::Mul(w) if !somme => aplatir(w, out, somme),
            autre => out.push(autre),
        }
    }
}

fn avec_coeff(c: BigRational, reste: Expr) -> Expr {
    if reste.est_un() {
        return Expr::Rat(c);
    }
    if c.is_one() {
        return reste;
    }
    match reste {
        Expr::Mul(mut fs) => {
            fs.insert(0, Expr::Rat(c));
            Expr::Mul(fs)
        }
        autre => Expr::Mul(vec![Expr::Rat(c), autre]),
    }
}

fn ajoute_base(bases: &mut Vec<(Expr, Expr)>, base: Expr, exposant: Expr) {
    match bases.iter_mut().find(|(b, _)| *b == base) {
        Some(entree) => {
            let e = std::mem::replace(&mut entree.1, Expr::zero());
            entree.1 = Expr::somme(vec![e, exposant]);
        }
        None => bases.push((base, exposant)),
    }
}

/* ------------------------ Puissances : cas particuliers ------------------------ */

fn i_puissance(n: &BigInt) -> Expr {
    let r = ((n % 4u32) + 4u32) % 4u32;
    match r.to_u8() {
        Some(0) => Expr::un(),
        Some(1) => Expr::I,
        Some(2) => Expr::entier(-1),
        _ => Expr::Mul(vec![Expr::entier(-1), Expr::I]),
    }
}

fn base_positive(b: &Expr) -> bool {
    match b {
        Expr::Rat(r) => r.is_positive(),
        Expr::E | Expr::Pi => true,
        _ => b.est_constant() && signe_constante(b) == Some(1),
    }
}

/// b^(±∞) pour b constant réel.
fn puissance_infinie(base: Expr, exposant: Expr, signe: i8) -> Expr {
    if base.est_constant() {
        if let Ok(z) = evaluer_constante(&base) {
            if z.im == 0.0 {
                let r = z.re;
                let v = if signe > 0 {
                    if r > 1.0 {
                        Some(Expr::Infini)
                    } else if r.abs() < 1.0 {
                        Some(Expr::zero())
                    } else if r <= -1.0 {
                        Some(Expr::Indefini)
                    } else {
                        None
                    }
                } else if r > 1.0 {
                    Some(Expr::zero())
                } else if r > 0.0 && r < 1.0 {
                    Some(Expr::Infini)
                } else if r <= 0.0 {
                    Some(Expr::Indefini)
                } else {
                    None
                };
                if let Some(v) = v {
                    return v;
                }
            }
        }
    }
    Expr::Pow(Box::new(base), Box::new(exposant))
}

/// (±∞)^e pour e constant.
fn base_infinie(base: Expr, exposant: Expr, signe: i8) -> Expr {
    match signe_constante(&exposant) {
        Some(1) if signe > 0 => Expr::Infini,
        Some(1) => match exposant.as_entier() {
            Some(n) if n % 2 == 0 => Expr::Infini,
            Some(_) => Expr::moins_infini(),
            None => Expr::Pow(Box::new(base), Box::new(exposant)),
        },
        Some(-1) => Expr::zero(),
        _ => Expr::Pow(Box::new(base), Box::new(exposant)),
    }
}

fn puissance_rationnelle(b: &BigRational, e: &BigRational) -> Expr {
    use Expr::*;

    let garde = || Pow(Box::new(Rat(b.clone())), Box::new(Rat(e.clone())));

    // 0^e : 0 si e > 0, indéfini sinon (1/0)
    if b.is_zero() {
        return if e.is_positive() {
            Expr::zero()
        } else {
            Indefini
        };
    }

    let bits = b.numer().bits() + b.denom().bits();

    if e.denom().is_one() {
        let n = match e.numer().to_i64() {
            Some(n) if n.abs() <= MAX_EXPOSANT => n,
            _ => return garde(),
        };
        if bits.saturating_mul(n.unsigned_abs()) > MAX_BITS_PUISSANCE {
            return garde();
        }
        return Rat(rational_pow_int(b.clone(), n));
    }

    let q = match e.denom().to_u32() {
        Some(q) if q <= 64 => q,
        _ => return garde(),
    };

    // √(−a) = i·√a
    if b.is_negative() {
        if q == 2 {
            return Expr::produit(vec![i_puissance(e.numer()), puissance_rationnelle(&-b, e)]);
        }
        return garde();
    }

    // e = k + p/q, 0 < p < q
    let k = e.floor();
    let r = e - &k;
    let k = match k.to_integer().to_i64() {
        Some(k) if k.abs() <= MAX_EXPOSANT => k,
        _ => return garde(),
    };
    if bits.saturating_mul(k.unsigned_abs()) > MAX_BITS_PUISSANCE {
        return garde();
    }
    let p = match r.numer().to_u32() {
        Some(p) => p,
        None => return garde(),
    };

    let mut coeff = rational_pow_int(b.clone(), k);
    let mut facteurs: Vec<Expr> = Vec::new();

    // numérateur : n^(p/q)
    let n = b.numer();
    if !n.is_one() {
        if let Some(rac) = int_root_exact(n, q) {
            coeff *= BigRational::from_integer(rac.pow(p));
        } else if p == 1 {
            let (s, t) = extrait_puissance_parfaite(n, q);
            coeff *= BigRational::from_integer(s);
            facteurs.push(Pow(
                Box::new(Rat(BigRational::from_integer(t))),
                Box::new(Rat(r.clone())),
            ));
        } else {
            facteurs.push(Pow(
                Box::new(Rat(BigRational::from_integer(n.clone()))),
                Box::new(Rat(r.clone())),
            ));
        }
    }

    // dénominateur : d^(−p/q) = d^(−1) · d^((q−p)/q)
    let d = b.denom();
    if !d.is_one() {
        if let Some(rac) = int_root_exact(d, q) {
            coeff /= BigRational::from_integer(rac.pow(p));
        } else {
            coeff /= BigRational::from_integer(d.clone());
            let complement = BigRational::new(BigInt::from(q - p), BigInt::from(q));
            match puissance_rationnelle(&BigRational::from_integer(d.clone()), &complement) {
                Rat(c) => coeff *= c,
                Mul(fs) => {
                    for f in fs {
                        match f {
                            Rat(c) => coeff *= c,
                            autre => facteurs.push(autre),
                        }
                    }
                }
                autre => facteurs.push(autre),
            }
        }
    }

    facteurs.sort_by(cmp_facteurs);
    if !coeff.is_one() || facteurs.is_empty() {
        facteurs.insert(0, Rat(coeff));
    }
    if facteurs.len() == 1 {
        facteurs.pop().unwrap_or_else(Expr::un)
    } else {
        Mul(facteurs)
    }
}

/* ------------------------ Fonctions : cas particuliers ------------------------ */

fn reciproque(f: Fonction) -> Option<Fonction> {
    use Fonction::*;
    match f {
        Sin => Some(Asin),
        Cos => Some(Acos),
        Tan => Some(Atan),
        Cot => Some(Acot),
        Sec => Some(Asec),
        Csc => Some(Acsc),
        _ => None,
    }
}

fn logarithme(x: Expr) -> Expr {
    use Expr::*;
    match &x {
        Rat(r) if r.is_one() => return Expr::zero(),
        Rat(r) if r.is_zero() => return Expr::moins_infini(),
        Rat(r) if r.is_negative() => {
            return Expr::somme(vec![
                logarithme(Rat(-r)),
                Expr::produit(vec![I, Pi]),
            ]);
        }
        Rat(r) if r.numer().is_one() => {
            return -logarithme(Rat(BigRational::from_integer(r.denom().clone())));
        }
        E => return Expr::un(),
        Infini => return Infini,
        Pow(b, u) if **b == E => return (**u).clone(),
        _ => {}
    }
    Fonc(Fonction::Log, Box::new(x))
}

/* ------------------------ Ordre déterministe ------------------------ */

fn rang(e: &Expr) -> u8 {
    use Expr::*;
    match e {
        Rat(_) => 0,
        I => 1,
        Pi => 2,
        E => 3,
        Var(_) => 4,
        Fonc(_, _) => 5,
        Pow(_, _) => 6,
        Mul(_) => 7,
        Add(_) => 8,
        Infini => 9,
        Indefini => 255,
    }
}

pub(crate) fn cle(e: &Expr) -> String {
    use Expr::*;
    let liste = |v: &[Expr]| v.iter().map(cle).collect::<Vec<_>>().join(",");
    match e {
        Rat(r) => format!("R{}/{}", r.numer(), r.denom()),
        Pi => "PI".to_string(),
        E => "E".to_string(),
        I => "I".to_string(),
        Infini => "OO".to_string(),
        Indefini => "NAN".to_string(),
        Var(s) => format!("VAR({s})"),
        Add(v) => format!("ADD({})", liste(v)),
        Mul(v) => format!("MUL({})", liste(v)),
        Pow(b, x) => format!("POW({},{})", cle(b), cle(x)),
        Fonc(f, x) => format!("{}({})", f.nom().to_uppercase(), cle(x)),
    }
}

pub(crate) fn cmp_expr(a: &Expr, b: &Expr) -> Ordering {
    rang(a).cmp(&rang(b)).then_with(|| cle(a).cmp(&cle(b)))
}

/// Facteurs : triés par base (x^2·y, √2·x), exp(u) rangé avec les fonctions.
fn cle_facteur(e: &Expr) -> (u8, String, String) {
    match e {
        Expr::Pow(b, x) if **b == Expr::E && !x.est_constant() => (5, cle(e), String::new()),
        Expr::Pow(b, x) => (rang(b), cle(b), cle(x)),
        _ => (rang(e), cle(e), String::new()),
    }
}

fn cmp_facteurs(a: &Expr, b: &Expr) -> Ordering {
    cle_facteur(a).cmp(&cle_facteur(b))
}

/// Degré total (pour ordonner les termes : x^2 avant x avant constantes).
pub(crate) fn degre(e: &Expr) -> BigRational {
    match e {
        Expr::Var(_) => BigRational::one(),
        Expr::Pow(b, x) => match (b.as_ref(), x.as_ref()) {
            (Expr::Var(_), Expr::Rat(r)) => r.clone(),
            _ => BigRational::zero(),
        },
        Expr::Mul(v) => v
            .iter()
            .fold(BigRational::zero(), |acc, f| acc + degre(f)),
        _ => BigRational::zero(),
    }
}

/// Termes : degré décroissant, constantes puis infinis en fin.
fn cmp_termes(a: &Expr, b: &Expr) -> Ordering {
    let fin = |e: &Expr| match e {
        Expr::Rat(_) => 1u8,
        _ if e.signe_infini().is_some() => 2,
        _ => 0,
    };
    fin(a)
        .cmp(&fin(b))
        .then_with(|| degre(b).cmp(&degre(a)))
        .then_with(|| {
            let (_, ra) = a.coeff_et_reste();
            let (_, rb) = b.coeff_et_reste();
            cmp_expr(&ra, &rb)
        })
        .then_with(|| cle(a).cmp(&cle(b)))
}
