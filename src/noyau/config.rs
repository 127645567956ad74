//! Configuration du noyau (immuable).
//!
//! Construite une seule fois au démarrage (`main`), confiée au `Solveur`,
//! jamais modifiée par requête.

/// Précision d’affichage par défaut (chiffres significatifs).
const PRECISION_DEFAUT: usize = 15;

/// Garde-fou : borne haute de la précision d’affichage (f64 ≈ 17 chiffres).
const PRECISION_MAX: usize = 17;

/// Graines Newton du palier numérique.
pub const GRAINES_NEWTON: [f64; 11] = [
    -10.0, -5.0, -3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0, 5.0, 10.0,
];

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigNoyau {
    /// Chiffres significatifs des valeurs numériques affichées.
    pub precision: usize,

    /// Arrondi (décimales) des racines numériques avant dédoublonnage.
    pub chiffres_racines: usize,

    /// |Im| sous ce seuil => racine réelle.
    pub tolerance_imaginaire: f64,

    /// Ne garder que les racines réelles quand c’est possible.
    pub reel_seulement: bool,

    pub graines: Vec<f64>,
    pub iterations_newton: usize,

    /// Au-delà, une somme finie passe par les formes closes.
    pub max_termes_somme: usize,
}

impl Default for ConfigNoyau {
    fn default() -> Self {
        Self {
            precision: PRECISION_DEFAUT,
            chiffres_racines: 12,
            tolerance_imaginaire: 1e-12,
            reel_seulement: true,
            graines: GRAINES_NEWTON.to_vec(),
            iterations_newton: 100,
            max_termes_somme: 10_000,
        }
    }
}

impl ConfigNoyau {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lit les surcharges d’environnement (valeurs invalides ignorées).
    pub fn depuis_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("QPUR_PRECISION") {
            if let Ok(p) = val.parse::<usize>() {
                config.precision = p;
            }
        }

        if let Ok(val) = std::env::var("QPUR_CHIFFRES_RACINES") {
            if let Ok(c) = val.parse::<usize>() {
                config.chiffres_racines = c;
            }
        }

        if let Ok(val) = std::env::var("QPUR_MAX_TERMES_SOMME") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_termes_somme = n;
            }
        }

        config
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn chiffres_racines(mut self, chiffres: usize) -> Self {
        self.chiffres_racines = chiffres;
        self
    }

    pub fn max_termes_somme(mut self, n: usize) -> Self {
        self.max_termes_somme = n;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.precision == 0 || self.precision > PRECISION_MAX {
            return Err(format!("precision doit être dans 1..={PRECISION_MAX}"));
        }
        if self.chiffres_racines > 15 {
            return Err("chiffres_racines doit être <= 15".to_string());
        }
        if !(self.tolerance_imaginaire > 0.0) {
            return Err("tolerance_imaginaire doit être > 0".to_string());
        }
        if self.graines.is_empty() {
            return Err("au moins une graine Newton".to_string());
        }
        if self.iterations_newton == 0 {
            return Err("iterations_newton doit être > 0".to_string());
        }
        Ok(())
    }

    /// Valide puis fige la configuration.
    pub fn build(self) -> Result<ConfigNoyau, String> {
        self.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaut_valide() {
        assert!(ConfigNoyau::default().validate().is_ok());
        assert_eq!(ConfigNoyau::default().graines.len(), 11);
    }

    #[test]
    fn precision_hors_bornes_refusee() {
        assert!(ConfigNoyau::new().precision(0).build().is_err());
        assert!(ConfigNoyau::new().precision(40).build().is_err());
        assert!(ConfigNoyau::new().precision(10).build().is_ok());
    }

    #[test]
    fn builder_enchaine() {
        let c = ConfigNoyau::new()
            .precision(8)
            .chiffres_racines(6)
            .max_termes_somme(50)
            .build()
            .unwrap();
        assert_eq!(c.precision, 8);
        assert_eq!(c.chiffres_racines, 6);
        assert_eq!(c.max_termes_somme, 50);
    }
}
