//! src/app/etat.rs
//!
//! État UI (sans vue).
//!
//! Rôle : contenir l’état du solveur graphique (entrée, dernière réponse, historique,
//! avertissement du classement, démarche) et offrir des opérations simples (C/CLR/AC).
//!
//! Contrats :
//! - Aucune évaluation ici : la vue appelle le Solveur puis dépose le résultat.
//! - Actions déterministes, sans effet de bord caché.
//! - Historique borné.

use crate::noyau::{Demarche, Solveur};

/// Garde-fou : nombre d’échanges conservés.
const HISTORIQUE_MAX: usize = 50;

/// Une requête et sa réponse.
#[derive(Clone, Debug)]
pub struct Echange {
    pub requete: String,
    pub reponse: String,
}

#[derive(Clone, Debug)]
pub struct AppSolveur {
    pub solveur: Solveur,

    // --- entrée utilisateur ---
    pub entree: String,

    // --- sorties ---
    pub reponse: String,
    pub avertissement: String, // requête qui ne ressemble pas à des maths
    pub demarche: Demarche,
    pub historique: Vec<Echange>, // plus récent en tête

    // --- UX ---
    // Permet à vue.rs de redonner le focus à l’entrée après un clic sur un bouton.
    pub focus_entree: bool,
}

impl AppSolveur {
    pub fn new(solveur: Solveur) -> Self {
        Self {
            solveur,
            entree: String::new(),
            reponse: String::new(),
            avertissement: String::new(),
            demarche: Demarche::default(),
            historique: Vec::new(),
            focus_entree: true, // au lancement, on veut pouvoir taper tout de suite
        }
    }

    /* ------------------------ Actions “boutons” (état seulement) ------------------------ */

    /// AC : remise à zéro totale (entrée + réponse + historique).
    pub fn reset_total(&mut self) {
        self.entree.clear();
        self.clear_resultats();
        self.historique.clear();
        self.focus_entree = true;
    }

    /// C : effacer seulement l’entrée.
    pub fn clear_entree(&mut self) {
        self.entree.clear();
        self.focus_entree = true;
    }

    /// CLR : effacer réponse + avertissement + démarche (l’historique reste).
    pub fn clear_resultats(&mut self) {
        self.reponse.clear();
        self.avertissement.clear();
        self.demarche = Demarche::default();
        self.focus_entree = true;
    }

    pub fn set_avertissement(&mut self, msg: impl Into<String>) {
        self.avertissement = msg.into();
    }

    /// Dépose une réponse complète et l’ajoute à l’historique.
    pub fn set_reponse(&mut self, requete: &str, reponse: String, demarche: Demarche) {
        self.historique.insert(
            0,
            Echange {
                requete: requete.to_string(),
                reponse: reponse.clone(),
            },
        );
        self.historique.truncate(HISTORIQUE_MAX);

        self.reponse = reponse;
        self.demarche = demarche;
        self.focus_entree = true;
    }

    /// Reprend une requête de l’historique dans l’entrée.
    pub fn rappeler(&mut self, index: usize) {
        if let Some(e) = self.historique.get(index) {
            self.entree = e.requete.clone();
            self.focus_entree = true;
        }
    }
}
