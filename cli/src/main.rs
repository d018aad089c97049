//! pdfhtml CLI - PDF to pixel-positioned HTML/CSS with visual refinement

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfhtml::{parser, ConvertOptions, PdfHtml, PdfHtmlOutcome, RefinementReport, Termination};

#[derive(Parser)]
#[command(name = "pdfhtml")]
#[command(version)]
#[command(
    about = "Convert PDF pages to pixel-positioned HTML/CSS and tune them against reference renders",
    long_about = None
)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "PDF")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Number of refinement iterations
    #[arg(long, default_value_t = 3)]
    iterations: u32,

    /// Skip the regression loop even if references exist
    #[arg(long)]
    no_regression: bool,

    /// Resolution of the reference page renders
    #[arg(long, default_value_t = 144)]
    dpi: u32,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Chromium/Chrome binary used for screenshots
    #[arg(long, value_name = "PATH", env = "CHROME_BIN")]
    chrome: Option<PathBuf>,

    /// Embed the stylesheet in index.html
    #[arg(long)]
    inline_css: bool,

    /// Paint the page render behind the markup
    #[arg(long)]
    backdrop: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "PDF")]
        input: PathBuf,

        /// Print metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let env = env_logger::Env::default().default_filter_or(cli.log_level.as_str());
    env_logger::Builder::from_env(env).init();

    let result = match &cli.command {
        Some(Commands::Info { input, json }) => cmd_info(input, *json),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => match (&cli.input, &cli.output) {
            (Some(input), output) => {
                let output = output.clone().unwrap_or_else(|| default_output_dir(input));
                cmd_convert(&cli, input, &output)
            }
            (None, _) => {
                println!("{}", "Usage: pdfhtml <PDF> <OUTPUT>".yellow());
                println!("       pdfhtml --help for more information");
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn default_output_dir(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    PathBuf::from(format!("{}_html", stem))
}

fn build(cli: &Cli) -> PdfHtml {
    let mut options = ConvertOptions::new().with_dpi(cli.dpi).with_backdrop(cli.backdrop);
    if cli.inline_css {
        options = options.with_inline_css();
    }

    let mut builder = PdfHtml::new()
        .with_convert_options(options)
        .with_iterations(cli.iterations);
    if cli.no_regression {
        builder = builder.without_regression();
    }
    if let Some(chrome) = &cli.chrome {
        builder = builder.with_chrome(chrome);
    }
    builder
}

fn cmd_convert(cli: &Cli, input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(if cli.no_regression {
        "Converting PDF...".to_string()
    } else {
        format!("Converting PDF and refining ({} iterations)...", cli.iterations)
    });

    let outcome = build(cli).run(input, output);
    spinner.finish_and_clear();
    let outcome = outcome?;

    print_summary(output, &outcome);
    if let Some(report) = &outcome.report {
        print_report(report);
    }
    Ok(())
}

fn print_summary(output: &Path, outcome: &PdfHtmlOutcome) {
    let conversion = &outcome.conversion;
    let counts = conversion.counts();

    println!("{} {}", "Converted into".green().bold(), output.display());
    println!(
        "  {} pages, {} text runs, {} shapes, {} borders, {} images",
        conversion.page_count(),
        counts.text_count,
        counts.shape_count,
        counts.border_count,
        counts.image_count
    );

    println!("\n{}", "Output files:".green().bold());
    println!("  {} index.html", "├─".dimmed());
    if let Some(stylesheet) = &conversion.synthesis.stylesheet_file {
        println!("  {} {}", "├─".dimmed(), stylesheet);
    }
    if outcome.report.is_some() {
        println!("  {} {}", "├─".dimmed(), pdfhtml::regress::REPORT_FILE);
    }
    println!("  {} manifest.json", "├─".dimmed());
    println!("  {} assets/", "└─".dimmed());
}

fn print_report(report: &RefinementReport) {
    println!("\n{}", "Refinement".cyan().bold());
    println!("{}: {}", "Iterations".bold(), report.iterations);
    match report.best_score {
        Some(score) => {
            println!("{}: {:.3}", "Best scale".bold(), report.best_scale);
            println!("{}: {:.4}", "Best diff".bold(), score);
        }
        None => println!("{}: none", "Best diff".bold()),
    }

    let reason = match report.termination {
        Termination::MaxIterations => "iteration budget reached".normal(),
        Termination::NoReferences => "no reference images".yellow(),
        Termination::RendererUnavailable => "no headless browser found".yellow(),
        Termination::ComparatorUnavailable => "image comparison unavailable".yellow(),
        Termination::NoComparisons => "no page could be compared".yellow(),
    };
    println!("{}: {}", "Stopped".bold(), reason);
}

fn cmd_info(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let backend = parser::open_backend(input)?;
    let metadata = backend.metadata();

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!();
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), metadata.pdf_version);
    println!("{}: {}", "Pages".bold(), metadata.page_count);

    if let Some(title) = &metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(author) = &metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(creator) = &metadata.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(producer) = &metadata.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(created) = &metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(modified) = &metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Page Sizes".cyan().bold());
    for index in 0..backend.page_count() {
        match backend.page_size(index) {
            Ok((width, height)) => println!("  {:>4}: {:.2} x {:.2}", index + 1, width, height),
            Err(e) => println!("  {:>4}: {}", index + 1, e.to_string().red()),
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfhtml".cyan().bold(), env!("CARGO_PKG_VERSION"));
}
