//! pdftemplate CLI - resume template analysis and personalization tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdftemplate::parser::PdfBackend;
use pdftemplate::{
    AnalyzeOptions, AreaKind, EngineConfig, FormData, JsonFormat, LopdfBackend, PageSelection,
    PersonalizeOptions, Template, TemplateEngine, TextBlockExtractor,
};

#[derive(Parser)]
#[command(name = "pdftemplate")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Discover and fill content areas of PDF resume templates", long_about = None)]
struct Cli {
    /// Engine configuration (JSON)
    #[arg(long, global = true, value_name = "FILE", env = "PDFTEMPLATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze templates and write their content areas as JSON
    Analyze {
        /// Template PDF files
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (stdout if not specified)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Page range (e.g., "1-2", "1,3")
        #[arg(long)]
        pages: Option<String>,

        /// Fail on the first page that cannot be decoded
        #[arg(long)]
        strict: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Fill a template with form data
    Fill {
        /// Template PDF file
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        /// Content areas JSON (from `analyze`)
        #[arg(value_name = "AREAS")]
        areas: PathBuf,

        /// Form data JSON
        #[arg(value_name = "FORM")]
        form: PathBuf,

        /// Output PDF file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Stack extra entries of repeatable sections
        #[arg(long)]
        expand: bool,

        /// Also write a PNG preview of the first page
        #[arg(long, value_name = "PNG")]
        preview: Option<PathBuf>,
    },

    /// Check whether form data can fill a template
    Check {
        /// Content areas JSON (from `analyze`)
        #[arg(value_name = "AREAS")]
        areas: PathBuf,

        /// Form data JSON
        #[arg(value_name = "FORM")]
        form: PathBuf,
    },

    /// List positioned text spans and how they classify
    Spans {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page number (all pages if not specified)
        #[arg(long)]
        page: Option<u32>,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            inputs,
            output,
            pages,
            strict,
            compact,
        } => cmd_analyze(
            cli.config.as_deref(),
            &inputs,
            output.as_deref(),
            pages.as_deref(),
            strict,
            compact,
        ),
        Commands::Fill {
            template,
            areas,
            form,
            output,
            expand,
            preview,
        } => cmd_fill(
            cli.config.as_deref(),
            &template,
            &areas,
            &form,
            &output,
            expand,
            preview.as_deref(),
        ),
        Commands::Check { areas, form } => cmd_check(cli.config.as_deref(), &areas, &form),
        Commands::Spans { input, page } => cmd_spans(cli.config.as_deref(), &input, page),
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_engine(config: Option<&Path>) -> Result<TemplateEngine, Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => {
            log::debug!("Loading configuration from {}", path.display());
            EngineConfig::from_json_file(path)?
        }
        None => EngineConfig::default(),
    };
    Ok(TemplateEngine::new(config)?)
}

fn cmd_analyze(
    config: Option<&Path>,
    inputs: &[PathBuf],
    output: Option<&Path>,
    pages: Option<&str>,
    strict: bool,
    compact: bool,
) -> CliResult {
    let engine = build_engine(config)?;

    let page_selection = if let Some(p) = pages {
        PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?
    } else {
        PageSelection::All
    };
    let mut options = AnalyzeOptions::new().with_pages(page_selection);
    if strict {
        options = options.strict();
    }

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let Some(output_dir) = output else {
        // Single-stream mode: one JSON document per input.
        for input in inputs {
            let template = engine.analyze_file_with_options(input, &options)?;
            println!("{}", template.areas_to_json(format)?);
        }
        return Ok(());
    };

    fs::create_dir_all(output_dir)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Analyzing {} template(s)...", inputs.len()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let results = engine.analyze_many(inputs, &options);
    pb.finish_and_clear();

    let mut failures = 0;
    for (input, result) in inputs.iter().zip(results) {
        match result {
            Ok(template) => {
                let stem = input.file_stem().unwrap_or_default().to_string_lossy();
                let path = output_dir.join(format!("{}.areas.json", stem));
                fs::write(&path, template.areas_to_json(format)?)?;
                println!(
                    "{} {} ({} areas)",
                    "Saved".green(),
                    path.display(),
                    template.len()
                );
            }
            Err(e) => {
                failures += 1;
                eprintln!("{} {}: {}", "Failed".red(), input.display(), e);
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} templates failed", failures, inputs.len()).into());
    }
    Ok(())
}

fn cmd_fill(
    config: Option<&Path>,
    template_pdf: &Path,
    areas: &Path,
    form: &Path,
    output: &Path,
    expand: bool,
    preview: Option<&Path>,
) -> CliResult {
    let engine = build_engine(config)?;
    let template = Template::from_areas_json(&fs::read_to_string(areas)?)?;
    let form = FormData::from_json_file(form)?;

    let mut options = PersonalizeOptions::new();
    if expand {
        options = options.with_expansion();
    }
    if preview.is_some() {
        options = with_preview(options)?;
    }

    let result = engine.personalize_file(template_pdf, &template, &form, &options)?;
    fs::write(output, &result.pdf)?;
    println!("{} {}", "Saved to".green(), output.display());

    if let (Some(path), Some(png)) = (preview, result.preview.as_ref()) {
        fs::write(path, png)?;
        println!("{} {}", "Preview".green(), path.display());
    }

    let report = &result.report;
    println!(
        "{}: {}  {}: {}",
        "Filled".bold(),
        report.filled.len(),
        "Skipped".bold(),
        report.skipped.len()
    );
    for (id, reason) in &report.skipped {
        println!("  {} {} ({})", "-".dimmed(), id, reason.dimmed());
    }
    for id in &report.font_fallbacks {
        println!("  {} {} drawn with a substitute font", "!".yellow(), id);
    }
    for warning in &report.warnings {
        println!("  {} {}", "!".yellow(), warning);
    }

    Ok(())
}

#[cfg(feature = "preview")]
fn with_preview(
    options: PersonalizeOptions,
) -> Result<PersonalizeOptions, Box<dyn std::error::Error>> {
    Ok(options.with_preview(pdftemplate::PreviewOptions::default()))
}

#[cfg(not(feature = "preview"))]
fn with_preview(
    _options: PersonalizeOptions,
) -> Result<PersonalizeOptions, Box<dyn std::error::Error>> {
    Err("this build does not include preview support".into())
}

fn cmd_check(config: Option<&Path>, areas: &Path, form: &Path) -> CliResult {
    let engine = build_engine(config)?;
    let template = Template::from_areas_json(&fs::read_to_string(areas)?)?;
    let form = FormData::from_json_file(form)?;

    let report = engine.check_compatibility(&template, &form);

    if report.is_compatible {
        println!("{}", "Compatible".green().bold());
    } else {
        println!("{}", "Not compatible".red().bold());
    }
    for field in &report.missing_fields {
        println!("  {} {}", "missing".red(), field);
    }
    for warning in &report.warnings {
        println!("  {} {}", "warning".yellow(), warning);
    }

    if !report.is_compatible {
        std::process::exit(2);
    }
    Ok(())
}

fn cmd_spans(config: Option<&Path>, input: &Path, page: Option<u32>) -> CliResult {
    let engine = build_engine(config)?;
    let backend = LopdfBackend::load_file(input)?;
    let extractor = TextBlockExtractor::new(&backend);

    let pages: Vec<u32> = match page {
        Some(p) => vec![p],
        None => backend.pages().keys().copied().collect(),
    };

    for page_num in pages {
        let extraction = match extractor.extract_page(page_num) {
            Ok(extraction) => extraction,
            Err(e) => {
                eprintln!("{} {}", "Skipped".yellow(), e);
                continue;
            }
        };

        println!(
            "{} {} ({:.0} x {:.0} pt)",
            "Page".cyan().bold(),
            page_num,
            extraction.size.width,
            extraction.size.height
        );
        println!("{}", "─".repeat(60).dimmed());

        for span in &extraction.spans {
            let label = engine
                .analyzer()
                .classifier()
                .classify(&span.text.to_lowercase())
                .map(|(field_type, confidence)| format!("{} {:.2}", field_type, confidence))
                .unwrap_or_default();
            println!(
                "[{:>6.1} {:>6.1} {:>6.1} {:>6.1}] {:<20} {:>5.1}  {}  {}",
                span.bbox.x0,
                span.bbox.y0,
                span.bbox.x1,
                span.bbox.y1,
                span.font_name.dimmed(),
                span.font_size,
                span.text,
                label.green()
            );
        }
        println!();
    }

    Ok(())
}

fn cmd_info(input: &Path) -> CliResult {
    let backend = LopdfBackend::load_file(input)?;
    let pages = backend.pages();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), backend.version());
    println!("{}: {}", "Pages".bold(), pages.len());

    println!();
    println!("{}", "Pages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for (num, id) in &pages {
        let page_box = backend.page_box(*id);
        let fonts = backend.page_fonts(*id).unwrap_or_default();
        let names: Vec<String> = fonts
            .iter()
            .map(|f| {
                if f.accepts_latin_text() {
                    f.base_font.clone()
                } else {
                    format!("{}*", f.base_font)
                }
            })
            .collect();
        println!(
            "{} {}: {:.0} x {:.0} pt, fonts: {}",
            "Page".bold(),
            num,
            page_box.width(),
            page_box.height(),
            if names.is_empty() {
                "-".to_string()
            } else {
                names.join(", ")
            }
        );
    }

    let engine = TemplateEngine::with_defaults()?;
    let template = engine.analyzer().analyze(&backend, &AnalyzeOptions::default())?;
    let fields = template
        .areas()
        .iter()
        .filter(|a| a.kind == AreaKind::Field)
        .count();

    println!();
    println!("{}", "Template Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Field areas".bold(), fields);
    println!("{}: {}", "Section areas".bold(), template.len() - fields);
    println!(
        "{}: {}",
        "Required".bold(),
        template.areas().iter().filter(|a| a.is_required).count()
    );
    println!("{}", "* font cannot be reused for new text".dimmed());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdftemplate".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF resume template analysis and personalization tool");
    println!();
    println!(
        "Repository: {}",
        "https://github.com/iyulab/pdftemplate".dimmed()
    );
    println!("License: MIT");
}
