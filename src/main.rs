use anyhow::Context;
use clap::Parser;
use log::debug;
use scan_ai::cli::{Cli, Commands};
use scan_ai::config::Config;
use scan_ai::credentials::{self, CredentialStore, FileCredentialStore};
use scan_ai::error::ScanAiError;
use scan_ai::pipeline::{self, Analyzer};
use scan_ai::store::{RecordStore, SqliteRecordStore};
use scan_ai::transport::HttpTransport;
use scan_ai_common::{AnalysisOutcome, Mode, Payload, PersistedRecord};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<ScanAiError>() {
            Some(err) => {
                eprintln!("❌ {}", err.user_message());
                debug!("{err}");
                if let Some(seconds) = err.retry_after() {
                    debug!("retry-after: {seconds}s");
                }
            }
            None => eprintln!("❌ {e:#}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    match cli.command {
        Commands::Analyze { image, mode, units, language, save, json } => {
            let mode = Mode::from(mode);
            let bytes = std::fs::read(&image)
                .with_context(|| format!("画像を読み込めません: {}", image.display()))?;

            let mut context = config.prompt_context();
            if let Some(units) = units {
                context.units = units.into();
            }
            if let Some(language) = language {
                context.target_language = language;
            }

            let transport = HttpTransport::new(config.endpoint.clone(), credentials::default_store()?)?;
            let analyzer = Analyzer::new(Arc::new(transport), context, config.model_params());

            // Ctrl-C で送信を中断
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            if !json {
                println!("📸 scan-ai - {}\n", mode.label());
                println!("AI解析中...");
            }
            let outcome = analyzer.analyze(&bytes, mode, &cancel).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }

            if save {
                let store = open_store(&config)?;
                let record = pipeline::save(&store, &outcome)?;
                if !json {
                    println!("\n✔ 履歴に保存: {}", record.id);
                }
            }
        }

        Commands::History { limit } => {
            let store = open_store(&config)?;
            let records = store.list_recent(limit)?;
            if records.is_empty() {
                println!("履歴はありません");
            }
            for record in &records {
                print_summary_line(record);
            }
        }

        Commands::Show { id } => {
            let store = open_store(&config)?;
            let id = parse_id(&id)?;
            let record = store
                .get(&id)?
                .ok_or_else(|| ScanAiError::RecordNotFound(id.to_string()))?;
            println!("{}  {}", record.id, record.created_at.format("%Y-%m-%d %H:%M"));
            print_outcome(&record.to_outcome());
        }

        Commands::Delete { id } => {
            let store = open_store(&config)?;
            let id = parse_id(&id)?;
            if !store.delete(&id)? {
                return Err(ScanAiError::RecordNotFound(id.to_string()).into());
            }
            println!("✔ 削除しました: {}", id);
        }

        Commands::Modes => {
            for mode in Mode::ALL {
                println!("  {:<14} {}", mode.id(), mode.label());
            }
        }

        Commands::Config { set_api_key, clear_api_key, units, language, show } => {
            let store = FileCredentialStore::openai()?;

            if let Some(key) = set_api_key {
                store.set(&key)?;
                println!("✔ APIキーを設定しました");
            }
            if clear_api_key {
                store.delete()?;
                println!("✔ APIキーを削除しました");
            }

            let mut changed = false;
            if let Some(units) = units {
                config.units = units.into();
                changed = true;
            }
            if let Some(language) = language {
                config.target_language = language;
                changed = true;
            }
            if changed {
                config.save()?;
                println!("✔ 設定を保存しました");
            }

            if show {
                let key_set = credentials::default_store()?.get()?.is_some();
                println!("設定:");
                println!("  モデル: {}", config.model);
                println!("  エンドポイント: {}", config.endpoint);
                println!("  最大トークン: {}", config.max_tokens);
                println!("  単位系: {:?}", config.units);
                println!("  翻訳先言語: {}", config.target_language);
                println!("  履歴DB: {}", config.database_path()?.display());
                println!("  APIキー: {}", if key_set { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<SqliteRecordStore> {
    Ok(SqliteRecordStore::open(&config.database_path()?)?)
}

fn parse_id(id: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(id.trim()).with_context(|| format!("不正なID: {id}"))
}

fn print_summary_line(record: &PersistedRecord) {
    println!(
        "{}  {}  {:<16} {}",
        record.id,
        record.created_at.format("%Y-%m-%d %H:%M"),
        record.mode.label(),
        record.summary()
    );
}

fn print_outcome(outcome: &AnalysisOutcome) {
    println!("{}", outcome.title);
    println!("  {}", outcome.value);
    if !outcome.detail.is_empty() {
        println!("  {}", outcome.detail);
    }

    match &outcome.payload {
        Payload::Weight(items) if items.len() > 1 => {
            for item in items {
                println!("  - {}: {} {}", item.name, item.weight, item.unit);
            }
        }
        Payload::Dimensions(items) if items.len() > 1 => {
            for item in items {
                println!("  - {}: {}", item.name, item.formatted());
            }
        }
        Payload::Calories(items) if !items.is_empty() => {
            for item in items {
                println!(
                    "  - {} ({}): {} kcal  {}",
                    item.name,
                    item.portion,
                    item.calories,
                    item.formatted_macros()
                );
            }
        }
        Payload::PlantId(items) => {
            for item in items {
                println!(
                    "  - {} ({}) [{}]",
                    item.common_name,
                    item.scientific_name,
                    item.confidence.as_str()
                );
                if !item.description.is_empty() {
                    println!("    {}", item.description);
                }
            }
        }
        Payload::Translate(Some(translation)) => {
            println!("\n{}", translation.translated_text);
        }
        Payload::ObjectCount(items) if !items.is_empty() => {
            for item in items {
                println!("  - {} × {} ({})", item.name, item.count, item.category);
            }
        }
        _ => {}
    }

    if !outcome.explanation.is_empty() {
        println!("\n💡 {}", outcome.explanation);
    }
}
