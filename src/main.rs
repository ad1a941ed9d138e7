// src/main.rs

// --- Declaração dos Módulos ---
mod config;
mod db;
mod error;
mod models;
mod repositories;
mod services;
mod state;
#[cfg(test)]
mod test_support;
mod web;

// --- Imports ---
use crate::{config::Config, services::user_service, state::AppState};
use axum::serve;
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tower_sessions::ExpiredDeletion;
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuração do Logging (Tracing) ---
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            env::var("RUST_LOG")
                .unwrap_or_else(|_| {
                    "aet_portal=debug,tower_http=info,sqlx=warn,tower_sessions=info".into()
                })
                .into()
        }))
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Iniciando portal de licenças AET...");

    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Configuração inválida: {}", e))?;

    // --- Configuração da Base de Dados ---
    let db_pool = match db::create_db_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Falha crítica ao inicializar a base de dados: {}", e);
            return Err(anyhow::anyhow!("Falha ao conectar/migrar DB: {}", e));
        }
    };

    if let Some(credentials) = &config.bootstrap_admin {
        user_service::ensure_bootstrap_admin(&db_pool, credentials)
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao criar admin de arranque: {}", e))?;
    }

    // --- Configuração das Sessões ---
    let session_store = SqliteStore::new(db_pool.clone())
        .with_table_name("sessions")
        .map_err(|e| anyhow::anyhow!("Falha ao criar session store: {}", e))?;
    session_store
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("Falha ao migrar tabela de sessões: {}", e))?;

    let session_store_clone = session_store.clone();
    tokio::spawn(async move {
        if let Err(e) = session_store_clone
            .continuously_delete_expired(tokio::time::Duration::from_secs(60 * 60))
            .await
        {
            tracing::error!("Erro na task de limpeza de sessões: {:?}", e);
        }
    });
    tracing::info!("🧹 Tarefa de limpeza de sessões iniciada.");

    // --- Diretório de uploads ---
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tracing::info!("📁 Uploads em {}", config.upload_dir.display());

    // --- Criação do Estado da Aplicação ---
    let addr = config.bind_addr;
    let app_state = AppState {
        db_pool,
        config: Arc::new(config),
    };

    // --- Configuração do Endereço e Listener ---
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Falha ao iniciar listener em {}: {}", addr, e);
            return Err(e.into());
        }
    };
    tracing::info!("📡 Servidor escutando em http://{}", addr);

    let app = web::routes::build_app(app_state, session_store);
    tracing::info!("✅ Router e middlewares configurados.");

    // --- Início do Servidor ---
    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Erro fatal no servidor: {}", e);
        return Err(e.into());
    }

    Ok(())
}
