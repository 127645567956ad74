// src/app/vue.rs
//
// Vue (UI egui)
// -------------
// - Une ligne d’entrée : Enter résout (quand le champ a le focus)
// - Boutons d’insertion (mots-clés, fonctions, variables)
// - Réponse, avertissement du classement, historique cliquable, démarche

use eframe::egui;

use super::etat::AppSolveur;
use crate::noyau::est_requete_math;

impl AppSolveur {
    /// UI principale : à appeler depuis eframe::App::update(...)
    pub fn ui(&mut self, ui: &mut egui::Ui) {
        ui.spacing_mut().item_spacing = egui::vec2(6.0, 6.0);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading("Solveur Q-pur");
                ui.add_space(6.0);

                self.ui_entree(ui);

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                self.ui_reponse(ui);

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                self.ui_demarche(ui);
                self.ui_historique(ui);
            });
    }

    fn ui_entree(&mut self, ui: &mut egui::Ui) {
        ui.label("Requête :");

        // id stable + focus contrôlé
        let resp = ui.add(
            egui::TextEdit::singleline(&mut self.entree)
                .desired_width(ui.available_width())
                .hint_text("Ex: solve x^2 - 4 = 0, integrate sin(x), sum k from 1 to 5 of k^2")
                .id_source("entree_edit")
                .code_editor(),
        );

        if self.focus_entree {
            resp.request_focus();
            self.focus_entree = false;
        }

        // Enter résout seulement si le champ a le focus (singleline le perd sur Enter)
        let enter = ui.input(|i| i.key_pressed(egui::Key::Enter));
        if (resp.has_focus() || resp.lost_focus()) && enter {
            self.resoudre_via_noyau();
        }

        ui.add_space(6.0);

        ui.horizontal(|ui| {
            // Contrat: C = entrée seulement ; CLR = réponse seulement ; AC = tout
            self.bouton_action(ui, "C", "Efface seulement l’entrée", Action::ClearEntree);
            self.bouton_action(ui, "CLR", "Efface réponse + démarche", Action::ClearResultats);
            self.bouton_action(ui, "AC", "Remise à zéro totale", Action::ResetTotal);

            ui.add_space(10.0);

            let go = ui.add_sized([72.0, 30.0], egui::Button::new("Résoudre"));
            if go.clicked() {
                self.resoudre_via_noyau();
            }
        });

        ui.add_space(8.0);

        ui.horizontal_wrapped(|ui| {
            for mot in ["solve ", "derivative of ", "integrate ", "limit ", "sum k from 1 to "] {
                self.bouton_insert(ui, mot.trim(), mot);
            }
            ui.separator();
            for f in ["sqrt(", "sin(", "cos(", "exp(", "log("] {
                self.bouton_insert(ui, f.trim_end_matches('('), f);
            }
            ui.separator();
            for s in ["(", ")", "^", "=", "pi", "x", "y", " as x -> "] {
                self.bouton_insert(ui, s.trim(), s);
            }
        });

        if !self.avertissement.is_empty() {
            ui.add_space(6.0);
            ui.colored_label(ui.visuals().warn_fg_color, &self.avertissement);
        }
    }

    fn ui_reponse(&mut self, ui: &mut egui::Ui) {
        ui.label("Réponse :");
        let couleur = if self.reponse.starts_with('❌') {
            Some(ui.visuals().error_fg_color)
        } else {
            None
        };
        egui::Frame::group(ui.style())
            .fill(ui.visuals().extreme_bg_color)
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                let texte = egui::RichText::new(&self.reponse).monospace();
                match couleur {
                    Some(c) => ui.label(texte.color(c)),
                    None => ui.label(texte),
                };
            });
    }

    fn ui_demarche(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Démarche")
            .default_open(true)
            .show(ui, |ui| {
                ui.label("Branche :");
                ui.monospace(self.demarche.branche);
                ui.add_space(4.0);
                ui.label("Normalisé :");
                ui.monospace(&self.demarche.normalise);
            });
    }

    fn ui_historique(&mut self, ui: &mut egui::Ui) {
        let mut rappel = None;
        egui::CollapsingHeader::new(format!("Historique ({})", self.historique.len()))
            .default_open(false)
            .show(ui, |ui| {
                for (i, e) in self.historique.iter().enumerate() {
                    ui.push_id(i, |ui| {
                        if ui
                            .link(&e.requete)
                            .on_hover_text("Reprendre dans l’entrée")
                            .clicked()
                        {
                            rappel = Some(i);
                        }
                        ui.monospace(&e.reponse);
                    });
                    ui.add_space(4.0);
                }
            });
        if let Some(i) = rappel {
            self.rappeler(i);
        }
    }

    fn bouton_action(&mut self, ui: &mut egui::Ui, label: &str, tip: &str, action: Action) {
        let resp = ui
            .add_sized([56.0, 30.0], egui::Button::new(label))
            .on_hover_text(tip);

        if resp.clicked() {
            match action {
                Action::ClearEntree => self.clear_entree(),
                Action::ClearResultats => self.clear_resultats(),
                Action::ResetTotal => self.reset_total(),
            }
            self.focus_entree = true;
        }
    }

    fn bouton_insert(&mut self, ui: &mut egui::Ui, label: &str, a_inserer: &str) {
        if ui.button(label).clicked() {
            self.entree.push_str(a_inserer);
            self.focus_entree = true;
        }
    }

    /// Classe, résout via le noyau, puis dépose réponse + démarche dans l’état UI.
    fn resoudre_via_noyau(&mut self) {
        let requete = self.entree.trim().to_string();
        if requete.is_empty() {
            self.set_avertissement("Entrée vide");
            self.focus_entree = true;
            return;
        }

        if est_requete_math(&requete) {
            self.set_avertissement("");
        } else {
            self.set_avertissement("Cette requête ne ressemble pas à un calcul ; tentative quand même.");
        }

        let (reponse, demarche) = self.solveur.aiguiller_detaille(&requete);
        self.set_reponse(&requete, reponse, demarche);
    }
}

#[derive(Clone, Copy, Debug)]
enum Action {
    ClearEntree,
    ClearResultats,
    ResetTotal,
}
