use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use price_template_tools::form::{self, Destination};
use price_template_tools::io::excel_write::{FontFamily, FontSize, SheetStyle, TextStyle};
use price_template_tools::io::source::SourceFile;
use price_template_tools::progress::TracingProgress;
use price_template_tools::remote::{SheetsClient, load_remote_config};
use price_template_tools::sync::{self, RunOutcome, RunRequest};
use price_template_tools::{Result, ToolError};
use tracing_subscriber::EnvFilter;

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    if let Err(error) = init_logging() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }

    let outcome = run(cli);
    if outcome.success {
        println!("{}", outcome.status);
        if let Some(path) = &outcome.artifact {
            println!("{}", path.display());
        }
    } else {
        eprintln!("{}", outcome.status);
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn run(cli: Cli) -> RunOutcome {
    match cli.command {
        Command::Build(args) => execute_build(args),
    }
}

fn execute_build(args: BuildArgs) -> RunOutcome {
    let destination = Destination::from(args.to);
    let sheet_url = args.sheet_url.unwrap_or_default();
    if let Err(error) = form::validate(&args.shop_id, args.inputs.len(), destination, &sheet_url) {
        return error.into();
    }

    let files = match load_sources(&args.inputs) {
        Ok(files) => files,
        Err(error) => return error.into(),
    };

    let request = RunRequest {
        shop_id: args.shop_id,
        files,
        destination,
        text_style: TextStyle {
            family: args.font.into(),
            size: FontSize::new(args.font_size).unwrap_or_default(),
        },
        sheet_style: SheetStyle::default(),
        output_dir: args.output_dir,
        sheet_url,
        sheet_name: args.sheet_name,
    };

    let mut progress = TracingProgress::default();
    sync::run(
        &request,
        || load_remote_config().and_then(|config| SheetsClient::connect(&config)),
        &mut progress,
    )
}

fn load_sources(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
    paths
        .iter()
        .map(|path| {
            if !path.exists() {
                return Err(ToolError::SourceFile {
                    file: path.display().to_string(),
                    reason: "file not found".to_string(),
                });
            }
            SourceFile::open(path)
        })
        .collect()
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Build the pricing template from marketplace price exports."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize price exports and deliver the merged template.
    Build(BuildArgs),
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Shop identifier (digits only).
    #[arg(long, env = "SHOP_ID", default_value = "")]
    shop_id: String,

    /// Source exports (.xlsx, .xls, .csv), merged in the given order.
    inputs: Vec<PathBuf>,

    /// Where to deliver the template.
    #[arg(long, value_enum, default_value_t = DestinationKind::File)]
    to: DestinationKind,

    /// Font family of the generated file.
    #[arg(long, value_enum, default_value_t = FontKind::Calibri)]
    font: FontKind,

    /// Header font size of the generated file; data rows use one point less.
    #[arg(
        long,
        default_value_t = 12,
        value_parser = clap::value_parser!(u8).range(i64::from(FontSize::MIN)..=i64::from(FontSize::MAX))
    )]
    font_size: u8,

    /// Directory receiving the generated file.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Link of the Google spreadsheet to append to.
    #[arg(long, env = "SHEET_URL")]
    sheet_url: Option<String>,

    /// Worksheet to write to; defaults to "Sheet1".
    #[arg(long)]
    sheet_name: Option<String>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DestinationKind {
    /// Styled .xlsx file.
    File,
    /// Google spreadsheet worksheet.
    Sheet,
}

impl From<DestinationKind> for Destination {
    fn from(kind: DestinationKind) -> Self {
        match kind {
            DestinationKind::File => Destination::LocalFile,
            DestinationKind::Sheet => Destination::RemoteSheet,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FontKind {
    Calibri,
    Arial,
    TimesNewRoman,
}

impl From<FontKind> for FontFamily {
    fn from(kind: FontKind) -> Self {
        match kind {
            FontKind::Calibri => FontFamily::Calibri,
            FontKind::Arial => FontFamily::Arial,
            FontKind::TimesNewRoman => FontFamily::TimesNewRoman,
        }
    }
}
