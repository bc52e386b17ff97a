use doitgirl::{query, App, SaveFile, SessionState, Settings};
use std::sync::Arc;

fn init_tracing(settings: &Settings) {
    #[cfg(feature = "profile-console")]
    {
        console_subscriber::init();
        let _ = settings;
    }

    #[cfg(not(feature = "profile-console"))]
    {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    // ── Settings ───────────────────────────────────────────────
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}; using defaults");
            Settings::default()
        }
    };
    init_tracing(&settings);

    // ── Boot the save file ─────────────────────────────────────
    let save_file = match SaveFile::open(&settings.database_path) {
        Ok(sf) => sf,
        Err(e) => {
            tracing::error!(path = %settings.database_path, error = %e, "failed to open save file");
            std::process::exit(1);
        }
    };

    let app = App::new(Arc::new(save_file), &settings);
    let state = app.init().await;

    tracing::info!(
        users = app.session().users().get_all_users().await.len(),
        path = %settings.database_path,
        "save file loaded"
    );

    match state {
        SessionState::Authenticated(user) => {
            let tasks = app.tasks().tasks().await;
            let summary = query::summary(&tasks);
            tracing::info!(
                username = %user.username,
                pending = summary.pending,
                completed = summary.completed,
                "session restored"
            );
        }
        _ => tracing::info!("no active session; sign in to load tasks"),
    }

    app.dispose().await;
}
