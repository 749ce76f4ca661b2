use alistamiento::{cli, config, report, store};
use alistamiento_common::stats::{self, GroupDimension};
use alistamiento_common::{
    apply_filters, search_by_serial, CascadedOptions, FilterState, Record, RecordDraft,
};
use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use std::path::Path;
use store::{JsonFileStore, ListStore, MemoryStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load()?;
    let data_file = cli.data.clone().or_else(|| config.data_file());
    let use_mock = cli.mock || (config.use_mock && cli.data.is_none());

    match cli.command {
        Commands::Summary { filters } => {
            println!("📊 alistamiento - Resumen\n");
            let records = load_records(data_file.as_deref(), use_mock)?;
            let state = filters.to_state()?;
            print_active_filters(&state);
            let filtered = apply_filters(&records, &state);

            println!("{}\n", report::render_summary(&stats::summarize(&filtered)));
            for (title, groups) in [
                ("Por sede", stats::group_by_count(filtered.iter().copied(), GroupDimension::Site)),
                ("Por asesor", stats::group_by_count(filtered.iter().copied(), GroupDimension::Agent)),
                ("Modelos", stats::top_models(filtered.iter().copied())),
                ("Por prioridad", stats::priority_groups(filtered.iter().copied())),
            ] {
                println!("{}", report::render_groups(title, &groups));
            }
        }

        Commands::List { filters, buscar_serie, por_avance, json } => {
            let records = load_records(data_file.as_deref(), use_mock)?;
            let state = filters.to_state()?;
            let filtered = apply_filters(&records, &state);

            let mut rows = match buscar_serie.as_deref() {
                Some(query) => search_by_serial(&filtered, query),
                None => filtered,
            };
            if por_avance {
                rows = stats::sort_by_progress(&rows);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_active_filters(&state);
                println!("{}", report::render_table(&rows));
            }
        }

        Commands::Options { filters } => {
            let records = load_records(data_file.as_deref(), use_mock)?;
            let state = filters.to_state()?;
            print_active_filters(&state);
            let options = CascadedOptions::compute(&records, &state);
            print!("{}", report::render_options(&options));
        }

        Commands::Expiring { filters, limit } => {
            println!("⏰ alistamiento - Próximos a vencer\n");
            let records = load_records(data_file.as_deref(), use_mock)?;
            let state = filters.to_state()?;
            print_active_filters(&state);
            let filtered = apply_filters(&records, &state);

            let limit = limit.unwrap_or(config.expiring_limit);
            let expiring = stats::expiring_soon(&filtered, limit);
            println!("{}", report::render_table(&expiring));
        }

        Commands::Phases { filters } => {
            println!("🔧 alistamiento - Avance por fase\n");
            let records = load_records(data_file.as_deref(), use_mock)?;
            let state = filters.to_state()?;
            print_active_filters(&state);
            let filtered = apply_filters(&records, &state);

            print!("{}", report::render_phase_rates(&stats::phase_completion_rates(&filtered)));
        }

        Commands::Progress { id } => {
            let store = store::open_store(data_file.as_deref(), use_mock);
            let record = store.fetch_by_id(&id)?;
            let attachments = store.list_attachments(&id)?;
            print!("{}", report::render_record(&record, &attachments));
        }

        Commands::Create { input, attachments } => {
            let draft = read_draft(&input)?;
            let fields = draft.to_store_fields()?;

            let mut store = writable_store(data_file.as_deref(), use_mock)?;
            let record = store.create(fields)?;
            for path in &attachments {
                upload(store.as_mut(), &record.id, path)?;
            }
            println!("✔ Registro creado: {}", record.id);
        }

        Commands::Update { id, input } => {
            let draft = read_draft(&input)?;
            let fields = draft.to_store_fields()?;

            let mut store = writable_store(data_file.as_deref(), use_mock)?;
            let record = store.update(&id, fields)?;
            println!("✔ Registro actualizado: {}", record.id);
        }

        Commands::Delete { id } => {
            let mut store = writable_store(data_file.as_deref(), use_mock)?;
            store.delete(&id)?;
            println!("✔ Registro eliminado: {}", id);
        }

        Commands::Attach { id, file } => {
            let mut store = writable_store(data_file.as_deref(), use_mock)?;
            upload(store.as_mut(), &id, &file)?;
            println!("✔ Adjunto guardado en el registro {}", id);
        }

        Commands::Config { set_data_file, expiring_limit, show } => {
            let mut config = config;
            let changed = set_data_file.is_some() || expiring_limit.is_some();

            if let Some(path) = set_data_file {
                config.data_file = Some(path);
            }
            if let Some(limit) = expiring_limit {
                config.set_expiring_limit(limit)?;
            }
            if changed {
                config.save()?;
                println!("✔ Configuración guardada");
            }

            if show || !changed {
                println!("Configuración:");
                println!(
                    "  Archivo de datos: {}",
                    config
                        .data_file()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "(sin definir)".into())
                );
                println!("  Límite de vencimientos: {}", config.expiring_limit);
                println!("  Datos de prueba: {}", if config.use_mock { "sí" } else { "no" });
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn load_records(data_file: Option<&Path>, use_mock: bool) -> anyhow::Result<Vec<Record>> {
    let store = store::open_store(data_file, use_mock);
    Ok(store.fetch_all()?)
}

/// 書き込み用のストア。データファイルが読めない場合はデモに切り替えずエラーにする
fn writable_store(data_file: Option<&Path>, use_mock: bool) -> anyhow::Result<Box<dyn ListStore>> {
    match data_file {
        Some(path) if !use_mock => {
            let store = JsonFileStore::open(path)
                .with_context(|| format!("No se pudo abrir {}", path.display()))?;
            Ok(Box::new(store))
        }
        _ => {
            println!("Modo demostración: los cambios no se guardan");
            Ok(Box::new(MemoryStore::demo()))
        }
    }
}

fn read_draft(path: &Path) -> anyhow::Result<RecordDraft> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("No se pudo leer {}", path.display()))?;
    Ok(RecordDraft::from_json(&content)?)
}

fn upload(store: &mut dyn ListStore, id: &str, path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read(path).with_context(|| format!("No se pudo leer {}", path.display()))?;
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    store.upload_attachment(id, &name, &content)?;
    Ok(())
}

fn print_active_filters(state: &FilterState) {
    if state.has_active_filters() {
        println!("Filtros: {}\n", serde_json::to_string(state).unwrap_or_default());
    }
}
