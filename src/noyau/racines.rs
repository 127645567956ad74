// src/noyau/racines.rs
//
// Racines numériques : filtrage, arrondi, dédoublonnage.

use num_complex::Complex64;

/// Deux racines plus proches que ça sont la même racine (indépendant de l’arrondi d’affichage).
pub const EPSILON_DOUBLON: f64 = 1e-8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RacineNumerique {
    Reelle(f64),
    Complexe(Complex64),
}

impl RacineNumerique {
    pub fn en_complexe(self) -> Complex64 {
        match self {
            RacineNumerique::Reelle(x) => Complex64::new(x, 0.0),
            RacineNumerique::Complexe(z) => z,
        }
    }

    fn proche(&self, autre: &RacineNumerique) -> bool {
        match (self, autre) {
            (RacineNumerique::Reelle(a), RacineNumerique::Reelle(b)) => {
                (a - b).abs() < EPSILON_DOUBLON
            }
            (RacineNumerique::Complexe(a), RacineNumerique::Complexe(b)) => {
                (a.re - b.re).abs() < EPSILON_DOUBLON && (a.im - b.im).abs() < EPSILON_DOUBLON
            }
            _ => false,
        }
    }
}

pub(crate) fn arrondir(v: f64, chiffres: usize) -> f64 {
    let echelle = 10f64.powi(chiffres as i32);
    let r = (v * echelle).round() / echelle;
    if r.is_finite() {
        r
    } else {
        v
    }
}

/// Racines finies, arrondies à `chiffres` décimales, sans doublon (ordre de première apparition).
/// Avec `reel_seulement`, |Im| < `tolerance` donne une racine réelle.
pub fn dedoublonner(
    racines: &[RacineNumerique],
    reel_seulement: bool,
    tolerance: f64,
    chiffres: usize,
) -> Vec<RacineNumerique> {
    let mut out: Vec<RacineNumerique> = Vec::new();

    for r in racines {
        let z = r.en_complexe();
        if !z.re.is_finite() || !z.im.is_finite() {
            continue;
        }

        let arrondie = if reel_seulement && z.im.abs() < tolerance {
            RacineNumerique::Reelle(arrondir(z.re, chiffres))
        } else {
            RacineNumerique::Complexe(Complex64::new(
                arrondir(z.re, chiffres),
                arrondir(z.im, chiffres),
            ))
        };

        if !out.iter().any(|o| o.proche(&arrondie)) {
            out.push(arrondie);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use RacineNumerique::*;

    #[test]
    fn doublons_proches() {
        let r = dedoublonner(&[Reelle(1.0000000001), Reelle(1.0), Reelle(2.0)], true, 1e-12, 12);
        assert_eq!(r.len(), 2);
        assert!(matches!(r[0], Reelle(v) if (v - 1.0).abs() < 1e-9));
        assert_eq!(r[1], Reelle(2.0));
    }

    #[test]
    fn complexes_proches_composante_par_composante() {
        // |Δ| ≈ 1.27e-8 > ε, mais chaque composante est sous ε
        let r = dedoublonner(
            &[
                Complexe(Complex64::new(1.0, 1.0)),
                Complexe(Complex64::new(1.0 + 0.9e-8, 1.0 + 0.9e-8)),
            ],
            false,
            1e-12,
            12,
        );
        assert_eq!(r, vec![Complexe(Complex64::new(1.0, 1.0))]);

        let r = dedoublonner(
            &[
                Complexe(Complex64::new(1.0, 1.0)),
                Complexe(Complex64::new(1.0, 1.0 + 2e-8)),
            ],
            false,
            1e-12,
            12,
        );
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn non_finies_ecartees() {
        let r = dedoublonner(
            &[Reelle(f64::NAN), Reelle(f64::INFINITY), Reelle(3.0)],
            true,
            1e-12,
            12,
        );
        assert_eq!(r, vec![Reelle(3.0)]);
    }

    #[test]
    fn partie_imaginaire_negligeable() {
        let r = dedoublonner(&[Complexe(Complex64::new(2.0, 1e-15))], true, 1e-12, 12);
        assert_eq!(r, vec![Reelle(2.0)]);
        let r = dedoublonner(&[Complexe(Complex64::new(2.0, 1e-15))], false, 1e-12, 12);
        assert_eq!(r, vec![Complexe(Complex64::new(2.0, 0.0))]);
    }

    #[test]
    fn reelle_et_complexe_distinctes() {
        let r = dedoublonner(
            &[Reelle(1.0), Complexe(Complex64::new(1.0, 1e-3))],
            true,
            1e-12,
            12,
        );
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn ordre_conserve() {
        let r = dedoublonner(&[Reelle(3.0), Reelle(-1.0), Reelle(3.0)], true, 1e-12, 12);
        assert_eq!(r, vec![Reelle(3.0), Reelle(-1.0)]);
    }
}
