use std::path::{Path, PathBuf};
use std::process::exit;
use std::time::Instant;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use thiserror::Error;

use textbook_backend::config::{ApiEnvironment, EnrichOptions, InterlinearOptions, QuranApiConfig, RenderOptions};
use textbook_backend::document_io::{read_json, write_json, write_ocr_csvs, write_text_atomic};
use textbook_backend::enrich::enrich_document;
use textbook_backend::ingest::{export_sheets_to_csv, is_spreadsheet_path};
use textbook_backend::interlinear::{collect_readings, read_sessions, render_interlinear};
use textbook_backend::logger::{
    debug, error, format_duration, get_log_level, info, set_log_level, set_log_level_str, warn, Level,
};
use textbook_backend::ocr_parser::parse_ocr_file;
use textbook_backend::quran_api::QuranComClient;
use textbook_backend::tex_render::{render_document, render_transcript};
use textbook_backend::types::TextbookDocument;
use textbook_backend::{ingest_document, processing_timestamp};

#[derive(Error, Debug)]
enum CliError {
    #[error("Input file does not exist: {0:?}")]
    MissingInput(PathBuf),
    #[error("Expected an ODS or XLSX spreadsheet, got: {0:?}")]
    NotSpreadsheet(PathBuf),
    #[error("Unknown log level: {0}")]
    InvalidLogLevel(String),
    #[error("Quran API credentials are not configured")]
    MissingCredentials,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Arabic textbook exercises and glossaries to LaTeX", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Print debug messages
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// Log level: DEBUG, INFO, WARN or ERROR. Overrides --verbose.
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Document title
    #[arg(long, default_value = "Arabic Textbook")]
    title: String,

    /// Document author
    #[arg(long, default_value = "")]
    author: String,

    /// Translation printed with the context verses of each exercise. Empty hides the context.
    #[arg(long, default_value = "M. Pickthall")]
    context_translation: String,

    /// Print transliterations of the exercise verses
    #[arg(long, default_value_t = false)]
    show_transliteration: bool,
}

impl RenderArgs {
    fn options(&self) -> RenderOptions {
        RenderOptions {
            title: self.title.clone(),
            author: self.author.clone(),
            context_translation: Some(self.context_translation.clone()).filter(|s| !s.is_empty()),
            show_transliteration: self.show_transliteration,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a CSV or spreadsheet, enrich it with Quran verses and write TeX and JSON
    #[command(arg_required_else_help = true)]
    Build {
        /// Input CSV, ODS or XLSX file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output TeX file. The JSON document is written next to it.
        #[arg(short, long, default_value = "arabic-textbook.tex")]
        output: PathBuf,

        /// Skip Quran API calls
        #[arg(long, default_value_t = false)]
        no_api: bool,

        /// Use the test API credentials (*_TEST variables)
        #[arg(long, default_value_t = false)]
        test_api: bool,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Render an existing JSON document to TeX without calling the API
    #[command(arg_required_else_help = true)]
    Render {
        #[arg(value_name = "JSON")]
        json: PathBuf,

        #[arg(short, long, default_value = "arabic-textbook.tex")]
        output: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Add Quran verse texts and translations to an existing JSON document
    #[command(arg_required_else_help = true)]
    Enrich {
        #[arg(value_name = "JSON")]
        json: PathBuf,

        /// Output JSON file. Defaults to updating the input in place.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use the test API credentials (*_TEST variables)
        #[arg(long, default_value_t = false)]
        test_api: bool,

        /// Skip verse sources an entry already has
        #[arg(long, default_value_t = false)]
        dedupe: bool,

        /// Context verses before each exercise verse
        #[arg(long, default_value_t = 1)]
        context_before: u32,

        /// Context verses after each exercise verse
        #[arg(long, default_value_t = 1)]
        context_after: u32,
    },

    /// Export the lesson sheets of a spreadsheet to one CSV file
    #[command(arg_required_else_help = true)]
    ExportCsv {
        #[arg(value_name = "SPREADSHEET")]
        input: PathBuf,

        /// Only export sheets whose name contains this string
        #[arg(long)]
        filter_sheetnames: Option<String>,

        /// Output CSV file. Defaults to the input with a .csv extension.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Process OCR markdown of the textbook into JSON, CSV and TeX files
    #[command(arg_required_else_help = true)]
    Ocr {
        #[arg(value_name = "MARKDOWN")]
        input: PathBuf,

        /// Output file prefix
        #[arg(short, long, default_value = "textbook-llm")]
        output_prefix: String,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Print the Quran readings of each session with translations
    Interlinear {
        /// Reading sessions JSON
        #[arg(value_name = "READINGS", env = "SELECTIONS_FILE", default_value = "quran_readings.json")]
        readings: PathBuf,

        #[arg(short, long, default_value = "quran-interlinear.tex")]
        output: PathBuf,

        /// Use the test API credentials (*_TEST variables)
        #[arg(long, default_value_t = false)]
        test_api: bool,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// Document author
        #[arg(long, default_value = "")]
        author: String,
    },
}

fn require_input(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CliError::MissingInput(path.to_path_buf()).into());
    }
    Ok(())
}

fn api_environment(test_api: bool) -> ApiEnvironment {
    if test_api { ApiEnvironment::Test } else { ApiEnvironment::Live }
}

/// API client from the environment, `None` when credentials are missing.
fn quran_client(test_api: bool, options: &EnrichOptions) -> Result<Option<QuranComClient>> {
    let Some(config) = QuranApiConfig::from_env(api_environment(test_api)) else {
        return Ok(None);
    };
    let client = QuranComClient::new(config, options.text_fields.clone(), options.translation_ids.clone())?;
    Ok(Some(client))
}

fn write_tex(doc: &TextbookDocument, output: &Path, render: &RenderArgs) -> Result<()> {
    let tex = render_document(doc, &render.options())?;
    write_text_atomic(output, &tex)?;
    println!("LaTeX file written to: {}", output.display());
    Ok(())
}

fn run_build(input: &Path, output: &Path, no_api: bool, test_api: bool, render: &RenderArgs) -> Result<()> {
    require_input(input)?;

    let mut doc = ingest_document(input)?;
    info(&format!(
        "Read {} vocabulary entries and {} exercises from {}",
        doc.vocabulary.len(),
        doc.exercises.len(),
        input.display()
    ));

    if no_api {
        debug("Skipping Quran API enrichment");
    } else {
        let options = EnrichOptions::default();
        match quran_client(test_api, &options)? {
            Some(client) => {
                if let Err(e) = enrich_document(&mut doc, &client, &options) {
                    error(&format!("Enrichment failed, continuing without verse texts: {}", e));
                }
            }
            None => warn("Missing API configuration, proceeding without enrichment"),
        }
    }

    let json_path = output.with_extension("json");
    write_json(&json_path, &doc)?;
    info(&format!("Saved JSON to {}", json_path.display()));

    write_tex(&doc, output, render)
}

fn run_render(json: &Path, output: &Path, render: &RenderArgs) -> Result<()> {
    let doc = read_json(json)?;
    write_tex(&doc, output, render)
}

fn run_enrich(json: &Path, output: Option<&Path>, test_api: bool, options: &EnrichOptions) -> Result<()> {
    let mut doc = read_json(json)?;

    let Some(client) = quran_client(test_api, options)? else {
        return Err(CliError::MissingCredentials.into());
    };

    let report = enrich_document(&mut doc, &client, options)?;

    let output = output.unwrap_or(json);
    write_json(output, &doc)?;
    println!(
        "Enriched {} of {} verses, written to: {}",
        report.fetched,
        report.unique_keys,
        output.display()
    );
    Ok(())
}

fn run_export_csv(input: &Path, filter: Option<&str>, output: Option<PathBuf>) -> Result<()> {
    require_input(input)?;
    if !is_spreadsheet_path(input) {
        return Err(CliError::NotSpreadsheet(input.to_path_buf()).into());
    }

    let output = output.unwrap_or_else(|| input.with_extension("csv"));
    let names = export_sheets_to_csv(input, &output, filter)?;
    println!("Exported {} sheet(s) to: {}", names.len(), output.display());
    Ok(())
}

fn run_ocr(input: &Path, prefix: &str, render: &RenderArgs) -> Result<()> {
    let output = parse_ocr_file(input)?;
    info(&format!(
        "Found {} vocabulary entries, {} exercises, {} distinct Arabic words",
        output.vocabulary.len(),
        output.exercises.len(),
        output.word_frequencies.len()
    ));

    write_ocr_csvs(&output, prefix)?;

    let timestamp = processing_timestamp();
    let doc = output.to_document(&timestamp);
    write_json(Path::new(&format!("{}.json", prefix)), &doc)?;

    let tex = render_transcript(&output, &render.options())?;
    let tex_path = PathBuf::from(format!("{}.tex", prefix));
    write_text_atomic(&tex_path, &tex)?;

    println!("OCR outputs written with prefix: {}", prefix);
    Ok(())
}

fn run_interlinear(readings: &Path, output: &Path, test_api: bool, options: &InterlinearOptions) -> Result<()> {
    let sessions = read_sessions(readings)?;
    info(&format!("Read {} reading sessions from {}", sessions.len(), readings.display()));

    let Some(config) = QuranApiConfig::from_env(api_environment(test_api)) else {
        return Err(CliError::MissingCredentials.into());
    };
    let client = QuranComClient::new(config, vec!["text_uthmani".to_string()], options.translation_ids.clone())?;

    let book = collect_readings(&sessions, &client)?;
    if book.failed > 0 {
        warn(&format!("{} verses could not be fetched and are left out", book.failed));
    }

    let tex = render_interlinear(&book, options)?;
    write_text_atomic(output, &tex)?;
    println!(
        "Wrote {} sessions with {} verses to: {}",
        book.sessions.len(),
        book.fetched,
        output.display()
    );
    Ok(())
}

fn main() {
    // API credentials may come from a .env file.
    let dotenv_loaded = dotenv().is_ok();

    let cli = Cli::parse();

    if cli.verbose {
        set_log_level(Level::Debug);
    }
    if let Some(level) = cli.log_level.as_deref() {
        if !set_log_level_str(level) {
            eprintln!("{}", CliError::InvalidLogLevel(level.to_string()));
            exit(2);
        }
    }
    debug(&format!("Log level: {}", get_log_level().as_str()));
    if !dotenv_loaded {
        debug("No .env file found or failed to load.");
    }

    let start = Instant::now();

    let command_result = match cli.command {
        Commands::Build { input, output, no_api, test_api, render } => {
            run_build(&input, &output, no_api, test_api, &render)
        }

        Commands::Render { json, output, render } => run_render(&json, &output, &render),

        Commands::Enrich { json, output, test_api, dedupe, context_before, context_after } => {
            let options = EnrichOptions {
                context_before,
                context_after,
                dedupe_sources: dedupe,
                ..Default::default()
            };
            run_enrich(&json, output.as_deref(), test_api, &options)
        }

        Commands::ExportCsv { input, filter_sheetnames, output } => {
            run_export_csv(&input, filter_sheetnames.as_deref(), output)
        }

        Commands::Ocr { input, output_prefix, render } => run_ocr(&input, &output_prefix, &render),

        Commands::Interlinear { readings, output, test_api, title, author } => {
            let defaults = InterlinearOptions::default();
            let options = InterlinearOptions {
                title: title.unwrap_or(defaults.title),
                author,
                translation_ids: defaults.translation_ids,
            };
            run_interlinear(&readings, &output, test_api, &options)
        }
    };

    if let Err(e) = command_result {
        eprintln!("Error executing command: {}", e);
        exit(1);
    }

    debug(&format!("Finished in {}", format_duration(start.elapsed())));
}
