//! Polynômes.
//!
//! - `developper` : distributivité + puissances entières de sommes (borné)
//! - `en_fraction` : mise au même dénominateur (numérateur, dénominateur)
//! - `coefficients` : coefficients (degré croissant) d’un polynôme en une variable
//! - `PolyRat` : polynômes à coefficients rationnels (racines rationnelles, division, pgcd)
//! - `racines_quadratique` / `resoudre_poly_rat` : formes closes (degré 2, bicarré)

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use super::expr::{extrait_puissance_parfaite, Expr};
use super::numerique::{evaluer_constante, signe_constante};

/// Plus grand nombre de termes produits par un développement.
pub const MAX_TERMES_DEVELOPPEMENT: usize = 2000;

/// Plus grand degré développé / reconnu.
const MAX_DEGRE: i64 = 64;

/// Borne des coefficients entiers pour la recherche de racines rationnelles.
const MAX_COEFF_RACINES: u64 = 1_000_000_000_000;

/* ------------------------ Développement ------------------------ */

pub fn developper(e: &Expr) -> Expr {
    match e {
        Expr::Add(v) => Expr::somme(v.iter().map(developper).collect()),
        Expr::Mul(v) => {
            let mut acc = Expr::un();
            for f in v {
                acc = distribuer(&acc, &developper(f));
            }
            acc
        }
        Expr::Pow(b, x) => {
            let b = developper(b);
            let x = developper(x);
            match x.as_entier() {
                Some(n) if (2..=MAX_DEGRE).contains(&n) && matches!(b, Expr::Add(_)) => {
                    puissance_developpee(&b, n)
                }
                Some(n) if (-MAX_DEGRE..=-2).contains(&n) && matches!(b, Expr::Add(_)) => {
                    Expr::puissance(puissance_developpee(&b, -n), Expr::entier(-1))
                }
                _ => Expr::puissance(b, x),
            }
        }
        Expr::Fonc(f, x) => Expr::fonction(*f, developper(x)),
        _ => e.clone(),
    }
}

/// Termes d’une somme (un seul terme sinon).
pub fn termes(e: &Expr) -> Vec<Expr> {
    match e {
        Expr::Add(v) => v.clone(),
        _ => vec![e.clone()],
    }
}

fn distribuer(a: &Expr, b: &Expr) -> Expr {
    let (ta, tb) = (termes(a), termes(b));
    if ta.len() * tb.len() > MAX_TERMES_DEVELOPPEMENT {
        return Expr::produit(vec![a.clone(), b.clone()]);
    }
    let mut out = Vec::with_capacity(ta.len() * tb.len());
    for x in &ta {
        for y in &tb {
            out.push(Expr::produit(vec![x.clone(), y.clone()]));
        }
    }
    Expr::somme(out)
}

fn puissance_developpee(b: &Expr, n: i64) -> Expr {
    let mut acc = b.clone();
    for _ in 1..n {
        acc = distribuer(&acc, b);
    }
    acc
}

/* ------------------------ Mise au même dénominateur ------------------------ */

/// e = num / den, sans exposant négatif au numérateur.
pub fn en_fraction(e: &Expr) -> (Expr, Expr) {
    match e {
        Expr::Rat(r) => (
            Expr::Rat(BigRational::from_integer(r.numer().clone())),
            Expr::Rat(BigRational::from_integer(r.denom().clone())),
        ),
        Expr::Add(v) => {
            let mut num = Expr::zero();
            let mut den = Expr::un();
            for t in v {
                let (n, d) = en_fraction(t);
                if d == den {
                    num = num + n;
                } else if d.est_un() {
                    num = num + n * den.clone();
                } else if den.est_un() {
                    num = num * d.clone() + n;
                    den = d;
                } else {
                    num = num * d.clone() + n * den.clone();
                    den = den * d;
                }
            }
            (num, den)
        }
        Expr::Mul(v) => {
            let mut num = Expr::un();
            let mut den = Expr::un();
            for f in v {
                let (n, d) = en_fraction(f);
                num = num * n;
                den = den * d;
            }
            (num, den)
        }
        Expr::Pow(b, x) => match x.as_rat() {
            Some(r) if r.is_negative() => {
                let k = Expr::Rat(-r);
                if r.denom().is_one() {
                    let (n, d) = en_fraction(b);
                    (Expr::puissance(d, k.clone()), Expr::puissance(n, k))
                } else {
                    (Expr::un(), Expr::puissance((**b).clone(), k))
                }
            }
            Some(r) if r.denom().is_one() => {
                let (n, d) = en_fraction(b);
                (Expr::puissance(n, (**x).clone()), Expr::puissance(d, (**x).clone()))
            }
            _ => (e.clone(), Expr::un()),
        },
        _ => (e.clone(), Expr::un()),
    }
}

/* ------------------------ Coefficients ------------------------ */

/// Coefficients (degré croissant) de `e` vu comme polynôme en `var`.
/// None si `var` apparaît ailleurs qu’en puissance entière positive.
pub fn coefficients(e: &Expr, var: &str) -> Option<Vec<Expr>> {
    let d = developper(e);
    let mut cases: Vec<Vec<Expr>> = Vec::new();
    for t in termes(&d) {
        let (k, c) = monome(&t, var)?;
        if cases.len() <= k {
            cases.resize(k + 1, Vec::new());
        }
        cases[k].push(c);
    }
    let mut out: Vec<Expr> = cases.into_iter().map(Expr::somme).collect();
    while out.len() > 1 && out.last().is_some_and(|c| c.est_zero()) {
        out.pop();
    }
    if out.is_empty() {
        out.push(Expr::zero());
    }
    Some(out)
}

fn monome(t: &Expr, var: &str) -> Option<(usize, Expr)> {
    if !t.contient_var(var) {
        return Some((0, t.clone()));
    }
    match t {
        Expr::Var(v) if v == var => Some((1, Expr::un())),
        Expr::Pow(b, x) if matches!(b.as_ref(), Expr::Var(v) if v == var) => {
            let n = x.as_entier()?;
            if (0..=MAX_DEGRE).contains(&n) {
                Some((n as usize, Expr::un()))
            } else {
                None
            }
        }
        Expr::Mul(fs) => {
            let mut degre = None;
            let mut reste = Vec::new();
            for f in fs {
                if f.contient_var(var) {
                    if degre.is_some() {
                        return None;
                    }
                    let (k, _) = monome(f, var)?;
                    degre = Some(k);
                } else {
                    reste.push(f.clone());
                }
            }
            Some((degre?, Expr::produit(reste)))
        }
        _ => None,
    }
}

/// Degré en `var` (None si non polynomial).
pub fn degre_en(e: &Expr, var: &str) -> Option<usize> {
    coefficients(e, var).map(|c| c.len() - 1)
}

/* ------------------------ Polynômes rationnels ------------------------ */

/// Coefficients rationnels, degré croissant, sans zéro dominant.
#[derive(Clone, Debug, PartialEq)]
pub struct PolyRat(pub Vec<BigRational>);

impl PolyRat {
    pub fn new(mut c: Vec<BigRational>) -> Self {
        while c.last().is_some_and(|x| x.is_zero()) {
            c.pop();
        }
        PolyRat(c)
    }

    pub fn depuis_expr(e: &Expr, var: &str) -> Option<Self> {
        let cs = coefficients(e, var)?;
        let r: Option<Vec<BigRational>> = cs.iter().map(|c| c.as_rat().cloned()).collect();
        Some(Self::new(r?))
    }

    pub fn est_nul(&self) -> bool {
        self.0.is_empty()
    }

    pub fn degre(&self) -> Option<usize> {
        self.0.len().checked_sub(1)
    }

    fn dominant(&self) -> BigRational {
        self.0.last().cloned().unwrap_or_else(BigRational::zero)
    }

    pub fn eval(&self, x: &BigRational) -> BigRational {
        self.0
            .iter()
            .rev()
            .fold(BigRational::zero(), |acc, c| acc * x + c)
    }

    pub fn derivee(&self) -> PolyRat {
        PolyRat::new(
            self.0
                .iter()
                .enumerate()
                .skip(1)
                .map(|(k, c)| c * BigRational::from_integer(BigInt::from(k)))
                .collect(),
        )
    }

    /// Division euclidienne : (quotient, reste).
    pub fn div_euclide(&self, d: &PolyRat) -> (PolyRat, PolyRat) {
        let Some(dd) = d.degre() else {
            return (PolyRat(Vec::new()), self.clone());
        };
        let mut reste = self.0.clone();
        let mut quotient = vec![BigRational::zero(); reste.len().saturating_sub(dd).max(1)];
        let lead = d.dominant();

        while reste.len() > dd && !reste.is_empty() {
            let k = reste.len() - 1 - dd;
            let c = reste[reste.len() - 1].clone() / &lead;
            for (i, di) in d.0.iter().enumerate() {
                reste[k + i] -= &c * di;
            }
            quotient[k] = c;
            reste.pop();
            while reste.last().is_some_and(|x| x.is_zero()) {
                reste.pop();
            }
        }
        (PolyRat::new(quotient), PolyRat::new(reste))
    }

    pub fn unitaire(&self) -> PolyRat {
        if self.est_nul() {
            return self.clone();
        }
        let lead = self.dominant();
        PolyRat(self.0.iter().map(|c| c / &lead).collect())
    }

    /// Pgcd unitaire (Euclide).
    pub fn pgcd(a: &PolyRat, b: &PolyRat) -> PolyRat {
        let (mut a, mut b) = (a.clone(), b.clone());
        while !b.est_nul() {
            let (_, r) = a.div_euclide(&b);
            a = b;
            b = r;
        }
        a.unitaire()
    }

    pub fn vers_expr(&self, var: &str) -> Expr {
        let x = Expr::var(var);
        Expr::somme(
            self.0
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.is_zero())
                .map(|(k, c)| {
                    Expr::produit(vec![
                        Expr::Rat(c.clone()),
                        Expr::puissance(x.clone(), Expr::entier(k as i64)),
                    ])
                })
                .collect(),
        )
    }

    pub fn fois(&self, autre: &PolyRat) -> PolyRat {
        if self.est_nul() || autre.est_nul() {
            return PolyRat(Vec::new());
        }
        let mut c = vec![BigRational::zero(); self.0.len() + autre.0.len() - 1];
        for (i, a) in self.0.iter().enumerate() {
            for (j, b) in autre.0.iter().enumerate() {
                c[i + j] += a * b;
            }
        }
        PolyRat::new(c)
    }

    pub fn moins(&self, autre: &PolyRat) -> PolyRat {
        let n = self.0.len().max(autre.0.len());
        let zero = BigRational::zero();
        PolyRat::new(
            (0..n)
                .map(|k| self.0.get(k).unwrap_or(&zero) - autre.0.get(k).unwrap_or(&zero))
                .collect(),
        )
    }

    pub fn echelle(&self, c: &BigRational) -> PolyRat {
        PolyRat::new(self.0.iter().map(|a| a * c).collect())
    }

    /// Division par (x − r).
    pub(crate) fn deflater(&self, r: &BigRational) -> PolyRat {
        let n = self.0.len();
        if n < 2 {
            return PolyRat(Vec::new());
        }
        let mut q = vec![BigRational::zero(); n - 1];
        let mut acc = BigRational::zero();
        for k in (1..n).rev() {
            acc = acc * r + &self.0[k];
            q[k - 1] = acc.clone();
        }
        PolyRat::new(q)
    }

    /// Racines rationnelles distinctes (théorème des racines rationnelles), triées.
    pub fn racines_rationnelles(&self) -> Vec<BigRational> {
        let mut out: Vec<BigRational> = Vec::new();
        if self.degre().unwrap_or(0) == 0 {
            return out;
        }

        let mut p = self.clone();
        if p.0[0].is_zero() {
            out.push(BigRational::zero());
            while p.0.first().is_some_and(|c| c.is_zero()) {
                p.0.remove(0);
            }
        }
        if p.degre().unwrap_or(0) == 0 {
            return out;
        }

        let ppcm = p
            .0
            .iter()
            .fold(BigInt::one(), |acc, c| ppcm_entier(&acc, c.denom()));
        let ppcm = BigRational::from_integer(ppcm);
        let entiers: Vec<BigInt> = p.0.iter().map(|c| (c * &ppcm).to_integer()).collect();

        let a0 = entiers[0].abs().to_u64().filter(|v| *v <= MAX_COEFF_RACINES);
        let an = entiers[entiers.len() - 1]
            .abs()
            .to_u64()
            .filter(|v| *v <= MAX_COEFF_RACINES);
        let (Some(a0), Some(an)) = (a0, an) else {
            return out;
        };

        for q in diviseurs(an) {
            for num in diviseurs(a0) {
                for signe in [1i64, -1] {
                    let r = BigRational::new(
                        BigInt::from(num) * BigInt::from(signe),
                        BigInt::from(q),
                    );
                    if !out.contains(&r) && p.eval(&r).is_zero() {
                        out.push(r);
                    }
                }
            }
        }
        out.sort();
        out
    }
}

fn pgcd_entier(a: &BigInt, b: &BigInt) -> BigInt {
    let (mut a, mut b) = (a.abs(), b.abs());
    while !b.is_zero() {
        let r = &a % &b;
        a = b;
        b = r;
    }
    a
}

fn ppcm_entier(a: &BigInt, b: &BigInt) -> BigInt {
    if a.is_zero() || b.is_zero() {
        return BigInt::zero();
    }
    (a * b).abs() / pgcd_entier(a, b)
}

fn diviseurs(n: u64) -> Vec<u64> {
    let mut petits = Vec::new();
    let mut grands = Vec::new();
    let mut d = 1u64;
    while d * d <= n {
        if n % d == 0 {
            petits.push(d);
            if d != n / d {
                grands.push(n / d);
            }
        }
        d += 1;
    }
    petits.extend(grands.into_iter().rev());
    petits
}

/* ------------------------ Formes closes ------------------------ */

/// a·x² + b·x + c = 0. Sans `complexes`, un discriminant négatif donne [].
pub fn racines_quadratique(a: &Expr, b: &Expr, c: &Expr, complexes: bool) -> Vec<Expr> {
    let disc = b.clone() * b.clone() - Expr::entier(4) * a.clone() * c.clone();
    let deux_a = Expr::entier(2) * a.clone();
    let moins_b = -b.clone();

    match signe_constante(&disc) {
        Some(0) => return vec![moins_b / deux_a],
        Some(s) if s < 0 && !complexes => return Vec::new(),
        None if disc.est_constant() && !complexes => return Vec::new(),
        _ => {}
    }

    let r = if disc.est_constant() {
        Expr::racine(disc)
    } else {
        racine_symbolique(&disc)
    };
    vec![
        (moins_b.clone() - r.clone()) / deux_a.clone(),
        (moins_b + r) / deux_a,
    ]
}

/// √d, avec le plus grand carré du contenu rationnel de d sorti de la racine :
/// √(-4·y) = 2·√(-y), √(8·y² - 8) = 2·√(2·y² - 2).
fn racine_symbolique(d: &Expr) -> Expr {
    let termes: Vec<(BigRational, Expr)> = match d {
        Expr::Add(v) => v.iter().map(Expr::coeff_et_reste).collect(),
        autre => vec![autre.coeff_et_reste()],
    };

    let num = termes.iter().fold(BigInt::zero(), |g, (c, _)| pgcd_entier(&g, c.numer()));
    let den = termes.iter().fold(BigInt::one(), |l, (c, _)| ppcm_entier(&l, c.denom()));
    if num.is_zero() || den.is_zero() {
        return Expr::racine(d.clone());
    }

    let (s_num, _) = extrait_puissance_parfaite(&num, 2);
    let (s_den, _) = extrait_puissance_parfaite(&den, 2);
    let s = BigRational::new(s_num, s_den);
    if s.is_one() {
        return Expr::racine(d.clone());
    }

    let carre = &s * &s;
    let sous_racine = Expr::somme(
        termes
            .into_iter()
            .map(|(c, reste)| Expr::Rat(c / &carre) * reste)
            .collect(),
    );
    Expr::Rat(s) * Expr::racine(sous_racine)
}

/// Racines exactes d’un polynôme rationnel : rationnelles, puis degré 2 ou bicarré résiduel.
/// None si un facteur résiduel n’a pas de forme close ici.
pub fn resoudre_poly_rat(p: &PolyRat, complexes: bool) -> Option<Vec<Expr>> {
    let deg = p.degre()?;
    if deg == 0 {
        return Some(Vec::new());
    }

    let rationnelles = p.racines_rationnelles();
    let mut q = p.clone();
    for r in &rationnelles {
        while q.degre().unwrap_or(0) > 0 && q.eval(r).is_zero() {
            q = q.deflater(r);
        }
    }

    let mut sol: Vec<Expr> = rationnelles.into_iter().map(Expr::Rat).collect();
    let c = |k: usize| Expr::Rat(q.0.get(k).cloned().unwrap_or_else(BigRational::zero));

    match q.degre() {
        None | Some(0) => {}
        Some(1) => sol.push(-c(0) / c(1)),
        Some(2) => sol.extend(racines_quadratique(&c(2), &c(1), &c(0), complexes)),
        Some(4) if q.0[1].is_zero() && q.0[3].is_zero() => {
            // x⁴ : quadratique en y = x²
            for y in racines_quadratique(&c(4), &c(2), &c(0), true) {
                if !complexes && signe_constante(&y).map_or(true, |s| s < 0) {
                    continue;
                }
                let r = Expr::racine(y);
                sol.push(-r.clone());
                sol.push(r);
            }
        }
        _ => return None,
    }

    trier_racines(&mut sol);
    Some(sol)
}

/// Tri par valeur numérique (partie réelle puis imaginaire), doublons retirés.
pub fn trier_racines(sol: &mut Vec<Expr>) {
    let cle = |e: &Expr| {
        evaluer_constante(e)
            .map(|z| (z.re, z.im))
            .unwrap_or((f64::INFINITY, 0.0))
    };
    sol.sort_by(|a, b| {
        let (ka, kb) = (cle(a), cle(b));
        ka.0.total_cmp(&kb.0).then(ka.1.total_cmp(&kb.1))
    });
    sol.dedup();
}
