// src/app.rs
//
// Solveur Q-pur : module App (racine)
// -----------------------------------
// - Déclare les sous-modules (etat.rs + vue.rs)
// - Ré-exporte AppSolveur (pour main.rs)
// - Fournit l’impl eframe::App

pub mod etat;
pub mod vue;

pub use etat::AppSolveur;

use eframe::egui;

impl eframe::App for AppSolveur {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ESC = effacer seulement l’entrée (comme bouton "C").
        // Enter est géré par la vue, quand le champ a le focus.
        let esc = ctx.input(|i| i.key_pressed(egui::Key::Escape));
        if esc {
            self.clear_entree();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.ui(ui);
        });
    }
}
