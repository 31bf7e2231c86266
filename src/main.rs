use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use page_translator::core::{print_error_message, print_info_message, translate_document, DocumentOptions};
use page_translator::env::{self, EnvVar};
use page_translator::translation::{
    ConfigManager, TranslationConfig, TranslationError, TranslationResult, TranslationService,
};

/// Translate the visible text of an HTML page through a batch translation API
#[derive(Parser, Debug)]
#[command(name = "page-translator", version, about, long_about = None)]
struct Args {
    /// HTML file to translate ("-" reads stdin)
    #[arg(required_unless_present_any = ["print_config", "env_docs"])]
    input: Option<String>,

    /// Write the translated document to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Batch translation endpoint
    #[arg(short = 'u', long)]
    api_url: Option<String>,

    /// Maximum number of text nodes per request
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Maximum number of requests in flight
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Configuration file (TOML)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Input document encoding
    #[arg(short, long)]
    encoding: Option<String>,

    /// Only log warnings and errors
    #[arg(short, long)]
    silent: bool,

    /// Print the resolved configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Print the environment variable reference and exit
    #[arg(long)]
    env_docs: bool,
}

impl Args {
    fn apply_overrides(&self, config: &mut TranslationConfig) {
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrent_requests = concurrency;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout = Duration::from_secs(timeout);
        }
    }
}

fn init_logging(silent: bool) {
    let default_level = if silent {
        "warn".to_string()
    } else {
        env::core::LogLevel::get().unwrap_or_else(|_| "info".to_string())
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("page_translator={}", default_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(!env::core::NoColor::get().unwrap_or(false)),
        )
        .init();
}

fn read_input(input: &str) -> TranslationResult<Vec<u8>> {
    if input == "-" {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data)?;
        Ok(data)
    } else {
        fs::read(input).map_err(|e| TranslationError::IoError(format!("{}: {}", input, e)))
    }
}

fn write_output(output: Option<&PathBuf>, data: &[u8]) -> TranslationResult<()> {
    match output {
        Some(path) => fs::write(path, data)
            .map_err(|e| TranslationError::IoError(format!("{}: {}", path.display(), e))),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn run(args: Args) -> TranslationResult<()> {
    if args.env_docs {
        println!("{}", env::generate_env_docs());
        return Ok(());
    }

    let (mut config, _) = ConfigManager::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);
    config.validate()?;

    if args.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let Some(input) = args.input.as_deref() else {
        return Err(TranslationError::ConfigError("缺少输入文件".to_string()));
    };
    let input_data = read_input(input)?;

    let options = DocumentOptions {
        encoding: args.encoding.clone(),
        silent: args.silent,
    };
    let service = TranslationService::new(config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let (output, stats) = runtime.block_on(translate_document(&service, &input_data, &options))?;

    write_output(args.output.as_ref(), &output)?;

    if !options.silent {
        print_info_message(&format!(
            "翻译完成: {} 个文本, {} 个批次 ({} 失败), 用时 {:.2}s",
            stats.leaves_applied,
            stats.batches_created,
            stats.batches_failed,
            stats.elapsed.as_secs_f64()
        ));
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.silent);

    if let Err(error) = run(args) {
        print_error_message(&format!("Error: {}", error));
        process::exit(1);
    }
}
