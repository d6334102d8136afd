use clap::{Args, Parser, Subcommand};
use console::style;
use metaremoval::app::{self, CleanRequest};
use metaremoval::config::Config;
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "metaremoval", version, about = "Elimina metadata EXIF y de documentos PDF")]
struct Cli {
    /// Archivo de configuración TOML.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Archivo donde se guardan los contadores del dispositivo.
    #[arg(long, global = true)]
    tally_file: Option<PathBuf>,

    /// Endpoint opcional de estadísticas globales.
    #[arg(long, global = true)]
    stats_url: Option<String>,

    /// Más detalle en el registro (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Limpia los archivos indicados y guarda copias con prefijo
    Clean(CleanArgs),
    /// Muestra los contadores acumulados
    Tally,
    /// Muestra la metadata que se eliminaría, sin modificar nada
    Inspect {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Args)]
struct CleanArgs {
    /// Archivos o directorios a limpiar
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Directorio donde se guardan los archivos limpios
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Prefijo de los archivos guardados
    #[arg(long)]
    prefix: Option<String>,

    /// Calidad JPEG (1-100)
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Segundos máximos por archivo (0 desactiva el límite)
    #[arg(long)]
    timeout: Option<u64>,

    /// Procesa sin guardar los archivos limpios
    #[arg(long)]
    no_save: bool,

    /// Exporta un resumen JSON del lote
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", style("Error:").red().bold());
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = cli.tally_file {
        config.tally_file = Some(path);
    }
    if let Some(url) = cli.stats_url {
        config.stats_url = Some(url);
    }

    match cli.command {
        Command::Clean(args) => {
            if let Some(output) = args.output {
                config.output_dir = Some(output);
            }
            if let Some(prefix) = args.prefix {
                config.file_prefix = prefix;
            }
            if let Some(quality) = args.jpeg_quality {
                config.jpeg_quality = quality;
            }
            if let Some(timeout) = args.timeout {
                config.file_timeout_secs = timeout;
            }
            config.validate()?;

            let request = CleanRequest {
                paths: args.paths,
                save: !args.no_save,
                report: args.report,
            };
            app::run_clean(&config, &request)?;
        }
        Command::Tally => app::run_tally(&config)?,
        Command::Inspect { paths } => app::run_inspect(&paths)?,
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("metaremoval={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
