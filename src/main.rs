use adsearch::catalog::{builtin_templates, load_templates_csv, Template};
use adsearch::cli::{parse_args, Command};
use adsearch::config::Settings;
use adsearch::search::SearchService;
use adsearch::search_index::SearchIndexClient;
use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("adsearch=info".parse()?),
        )
        .init();

    let cli = parse_args();
    let settings = Settings::from_env().context("Failed to read configuration")?;

    let templates: Vec<Template> = match &cli.catalog {
        Some(path) => load_templates_csv(path)
            .with_context(|| format!("Failed to load catalog from '{}'", path.display()))?,
        None => builtin_templates(),
    };
    info!(templates = templates.len(), "Catalog loaded");

    match cli.command {
        Command::Search {
            query,
            language,
            limit,
        } => {
            let service = SearchService::from_settings(&settings, templates)
                .await
                .context("Failed to initialize search service")?;
            let results = service.search(&query, language.as_deref(), limit).await?;
            println!("{}", serde_json::to_string_pretty(&json!({ "results": results }))?);
        }
        Command::Index => {
            let client = SearchIndexClient::new(&settings.elasticsearch_url, &settings.index_name);
            client
                .ensure_index()
                .await
                .with_context(|| format!("Failed to prepare index '{}'", settings.index_name))?;
            let count = client
                .index_templates(&templates)
                .await
                .context("Failed to index templates")?;
            println!("{}", json!({ "index": settings.index_name, "indexed": count }));
        }
    }

    Ok(())
}
