//! Évaluation numérique (complexe) et mise en forme des nombres.
//!
//! - `evaluer` : Expr -> Complex64, variables fournies par un environnement
//! - branche principale pour les puissances et les réciproques
//! - entrées réelles dans le domaine : calcul réel (pas de bruit imaginaire)
//! - `format_nombre` : 15 chiffres significatifs par défaut, zéros de queue retirés

use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};

use super::erreur::{ErreurNoyau, Resultat};
use super::expr::{Expr, Fonction};

/// Valeur d’une variable libre (None => variable non évaluable).
pub type Env<'a> = &'a dyn Fn(&str) -> Option<Complex64>;

pub fn evaluer(e: &Expr, env: Env) -> Resultat<Complex64> {
    let z = match e {
        Expr::Rat(r) => reel(rat_vers_f64(r)),
        Expr::Pi => reel(std::f64::consts::PI),
        Expr::E => reel(std::f64::consts::E),
        Expr::I => Complex64::i(),
        Expr::Infini => reel(f64::INFINITY),
        Expr::Indefini => return Err(ErreurNoyau::Indefini),
        Expr::Var(v) => env(v).ok_or_else(|| ErreurNoyau::VariableLibre(v.clone()))?,

        Expr::Add(v) => {
            let mut acc = Complex64::zero();
            for t in v {
                acc += evaluer(t, env)?;
            }
            acc
        }
        Expr::Mul(v) => {
            let mut acc = reel(1.0);
            for f in v {
                acc = multiplier(acc, evaluer(f, env)?);
            }
            acc
        }
        Expr::Pow(b, x) => puissance(evaluer(b, env)?, evaluer(x, env)?)?,
        Expr::Fonc(f, x) => appliquer(*f, evaluer(x, env)?)?,
    };

    if z.re.is_nan() || z.im.is_nan() {
        return Err(ErreurNoyau::Numerique("nan".to_string()));
    }
    Ok(z)
}

/// Évaluation sans variable libre.
pub fn evaluer_constante(e: &Expr) -> Resultat<Complex64> {
    evaluer(e, &|_| None)
}

/// Évaluation réelle d’une fonction d’une variable (None si complexe ou erreur).
pub fn evaluer_en(e: &Expr, var: &str, x: f64) -> Option<f64> {
    let z = evaluer(e, &|v| (v == var).then(|| reel(x))).ok()?;
    if z.im.abs() > 1e-12 * (1.0 + z.re.abs()) {
        return None;
    }
    Some(z.re)
}

/// Signe d’une constante réelle : Some(-1|0|1), None si complexe ou non évaluable.
pub fn signe_constante(e: &Expr) -> Option<i8> {
    if !e.est_constant() {
        return None;
    }
    let z = evaluer_constante(e).ok()?;
    if z.im.abs() > 1e-12 * (1.0 + z.re.abs()) {
        return None;
    }
    Some(if z.re > 0.0 {
        1
    } else if z.re < 0.0 {
        -1
    } else {
        0
    })
}

pub fn rat_vers_f64(r: &BigRational) -> f64 {
    let (n, d) = (r.numer(), r.denom());
    match (n.to_f64(), d.to_f64()) {
        (Some(a), Some(b)) if a.is_finite() && b.is_finite() => a / b,
        _ => {
            // Très grands entiers : on décale les deux avant division.
            let decalage = n.bits().max(d.bits()).saturating_sub(1000);
            let a = (n >> decalage).to_f64().unwrap_or(f64::NAN);
            let b = (d >> decalage).to_f64().unwrap_or(f64::NAN);
            a / b
        }
    }
}

/* ------------------------ Opérations ------------------------ */

fn reel(x: f64) -> Complex64 {
    Complex64::new(x, 0.0)
}

fn multiplier(a: Complex64, b: Complex64) -> Complex64 {
    // (−1)·∞ en complexe produirait une partie imaginaire NaN.
    if a.im == 0.0 && b.im == 0.0 {
        reel(a.re * b.re)
    } else {
        a * b
    }
}

fn puissance(b: Complex64, x: Complex64) -> Resultat<Complex64> {
    if b.im == 0.0 && x.im == 0.0 {
        let (br, xr) = (b.re, x.re);
        if xr.fract() == 0.0 && xr.abs() < 1e9 {
            return Ok(reel(br.powf(xr)));
        }
        if br >= 0.0 {
            return Ok(reel(br.powf(xr)));
        }
    }
    if b.is_zero() {
        return if x.re > 0.0 {
            Ok(Complex64::zero())
        } else {
            Err(ErreurNoyau::Indefini)
        };
    }
    Ok(b.powc(x))
}

fn appliquer(f: Fonction, z: Complex64) -> Resultat<Complex64> {
    use Fonction::*;

    let est_reel = z.im == 0.0;
    let x = z.re;

    let v = match f {
        Sin => if est_reel { reel(x.sin()) } else { z.sin() },
        Cos => if est_reel { reel(x.cos()) } else { z.cos() },
        Tan => if est_reel { reel(x.tan()) } else { z.tan() },
        Cot => if est_reel { reel(1.0 / x.tan()) } else { z.tan().inv() },
        Sec => if est_reel { reel(1.0 / x.cos()) } else { z.cos().inv() },
        Csc => if est_reel { reel(1.0 / x.sin()) } else { z.sin().inv() },

        Asin => if est_reel && x.abs() <= 1.0 { reel(x.asin()) } else { z.asin() },
        Acos => if est_reel && x.abs() <= 1.0 { reel(x.acos()) } else { z.acos() },
        Atan => if est_reel { reel(x.atan()) } else { z.atan() },
        Acot => {
            if est_reel {
                if x == 0.0 {
                    reel(std::f64::consts::FRAC_PI_2)
                } else {
                    reel((1.0 / x).atan())
                }
            } else {
                z.inv().atan()
            }
        }
        Asec => return appliquer(Acos, z.inv()),
        Acsc => return appliquer(Asin, z.inv()),

        Sinh => if est_reel { reel(x.sinh()) } else { z.sinh() },
        Cosh => if est_reel { reel(x.cosh()) } else { z.cosh() },
        Tanh => if est_reel { reel(x.tanh()) } else { z.tanh() },

        Log => {
            if est_reel && x > 0.0 {
                reel(x.ln())
            } else if z.is_zero() {
                reel(f64::NEG_INFINITY)
            } else {
                z.ln()
            }
        }
    };
    Ok(v)
}

/* ------------------------ Mise en forme ------------------------ */

/// Réel sur `precision` chiffres significatifs, zéros de queue retirés.
pub fn format_reel(v: f64, precision: usize) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "oo" } else { "-oo" }.to_string();
    }
    if v == 0.0 {
        return "0".to_string();
    }

    let precision = precision.max(1);
    let exp10 = v.abs().log10().floor() as i32;

    if exp10 >= precision as i32 || exp10 < -7 {
        let s = format!("{:.*e}", precision - 1, v);
        return match s.split_once('e') {
            Some((mantisse, exposant)) => {
                let mantisse = retirer_zeros(mantisse);
                let exposant = exposant.trim_start_matches('+');
                if exposant.starts_with('-') {
                    format!("{mantisse}e{exposant}")
                } else {
                    format!("{mantisse}e+{exposant}")
                }
            }
            None => s,
        };
    }

    let decimales = (precision as i32 - 1 - exp10).max(0) as usize;
    let s = retirer_zeros(&format!("{:.*}", decimales, v));
    if s == "-0" {
        "0".to_string()
    } else {
        s
    }
}

fn retirer_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

/// Complexe : "a", "b*I", "a + b*I", "a - b*I" (±1·I s’écrit "I" / "-I").
pub fn format_nombre(z: Complex64, precision: usize) -> String {
    let echelle = z.re.abs().max(1.0);
    if z.im.abs() <= 1e-14 * echelle {
        return format_reel(z.re, precision);
    }

    let im_abs = format_reel(z.im.abs(), precision);
    let partie_i = if im_abs == "1" {
        "I".to_string()
    } else {
        format!("{im_abs}*I")
    };

    if z.re.abs() <= 1e-14 * z.im.abs() {
        return if z.im < 0.0 {
            format!("-{partie_i}")
        } else {
            partie_i
        };
    }

    let re = format_reel(z.re, precision);
    if z.im < 0.0 {
        format!("{re} - {partie_i}")
    } else {
        format!("{re} + {partie_i}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_entier_et_fraction() {
        assert_eq!(format_reel(14.0, 15), "14");
        assert_eq!(format_reel(2.0 / 3.0, 15), "0.666666666666667");
        assert_eq!(format_reel(-0.5, 15), "-0.5");
        assert_eq!(format_reel(0.0, 15), "0");
    }

    #[test]
    fn format_infinis() {
        assert_eq!(format_reel(f64::INFINITY, 15), "oo");
        assert_eq!(format_reel(f64::NEG_INFINITY, 15), "-oo");
    }

    #[test]
    fn format_complexe() {
        assert_eq!(format_nombre(Complex64::new(0.0, 1.0), 15), "I");
        assert_eq!(format_nombre(Complex64::new(0.0, -1.0), 15), "-I");
        assert_eq!(format_nombre(Complex64::new(1.0, -2.0), 15), "1 - 2*I");
        assert_eq!(format_nombre(Complex64::new(-0.5, 0.5), 15), "-0.5 + 0.5*I");
    }

    #[test]
    fn evaluation_constantes() {
        let e = Expr::produit(vec![Expr::entier(2), Expr::Pi]);
        let z = evaluer_constante(&e).unwrap();
        assert!((z.re - 2.0 * std::f64::consts::PI).abs() < 1e-12);

        assert_eq!(signe_constante(&Expr::moins_infini()), Some(-1));
        assert_eq!(signe_constante(&Expr::I), None);
        assert_eq!(signe_constante(&Expr::var("x")), None);
    }

    #[test]
    fn variable_libre_signalee() {
        let r = evaluer_constante(&Expr::var("x"));
        assert_eq!(r, Err(ErreurNoyau::VariableLibre("x".to_string())));
    }

    #[test]
    fn evaluation_en_un_point() {
        let e = Expr::puissance(Expr::var("x"), Expr::entier(2));
        assert_eq!(evaluer_en(&e, "x", 3.0), Some(9.0));
    }
}
