// src/main.rs
//
// Solveur Q-pur : point d’entrée
// ------------------------------
// - sans argument : fenêtre eframe (entrée, historique, démarche)
// - avec arguments : mode sans fenêtre, chaque argument est une requête,
//   une réponse par ligne sur stdout
//
// Journalisation : RUST_LOG (défaut "warn"), sur stderr.

use std::process::ExitCode;

use eframe::egui;
use tracing_subscriber::EnvFilter;

mod app;
mod noyau;

use app::AppSolveur;
use noyau::{ConfigNoyau, Solveur};

const TITRE_APP: &str = "Solveur Q-pur";

fn installer_journal() {
    let filtre = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filtre)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    installer_journal();

    let config = match ConfigNoyau::depuis_env().build() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuration invalide: {e}");
            return ExitCode::FAILURE;
        }
    };
    let solveur = Solveur::new(config);

    let requetes: Vec<String> = std::env::args().skip(1).collect();
    if !requetes.is_empty() {
        for r in &requetes {
            println!("{}", solveur.aiguiller(r));
        }
        return ExitCode::SUCCESS;
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(TITRE_APP)
            .with_inner_size([560.0, 740.0])
            .with_min_inner_size([420.0, 520.0]),
        ..Default::default()
    };

    let issue = eframe::run_native(
        TITRE_APP,
        options,
        Box::new(|_cc| Ok(Box::new(AppSolveur::new(solveur)))),
    );

    match issue {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(erreur = %e, "fenêtre impossible");
            ExitCode::FAILURE
        }
    }
}
