//! # Invoicer CLI
//!
//! Reads an invoice as JSON, prints its totals and lays it out onto a
//! recording canvas.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           invoicer render                               │
//! │                                                                         │
//! │  invoice.json ──► InvoiceBuilder ──► build() ──► Invoice                │
//! │                   (serde)           (validation)   │                    │
//! │                                                    ▼                    │
//! │  invoicer.toml ──► RenderConfig ──────────────► Engine                  │
//! │  INVOICER_* env                                    │                    │
//! │                                                    ▼                    │
//! │                               RecordingCanvas ──► pages.json / stdout   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the default `info` level.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use invoicer_core::{Invoice, InvoiceBuilder, InvoiceTotals};
use invoicer_layout::{
    Engine, FsSource, RecordingCanvas, RenderConfig, RenderedDocument, TemplateManager,
};

#[derive(Parser)]
#[command(name = "invoicer")]
#[command(about = "Compute invoice totals and lay invoices out onto pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the computed totals as JSON
    Totals {
        /// Invoice JSON file
        invoice: PathBuf,
    },

    /// Lay the invoice out and write the recorded page sequence as JSON
    Render {
        /// Invoice JSON file
        invoice: PathBuf,

        /// Render config (defaults to the platform config directory)
        #[arg(long, env = "INVOICER_CONFIG")]
        config: Option<PathBuf>,

        /// Render this template instead of the built-in layout
        #[arg(long)]
        template: Option<String>,

        /// Directory to load templates from
        #[arg(long, default_value = "templates")]
        templates: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the default render config as TOML
    Config,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Totals { invoice } => {
            let invoice = load_invoice(&invoice)?;
            let totals = invoice
                .totals()
                .with_context(|| format!("Failed to compute totals for {}", invoice.number()))?;
            println!("{}", serde_json::to_string_pretty(&totals)?);
        }
        Commands::Render {
            invoice,
            config,
            template,
            templates,
            out,
        } => {
            let invoice = load_invoice(&invoice)?;
            let config = RenderConfig::load(config).context("Failed to load render config")?;
            let report = render(&invoice, config, template.as_deref(), &templates)?;
            write_output(&report, out.as_deref())?;
        }
        Commands::Config => {
            print!("{}", RenderConfig::DEFAULT.to_toml()?);
        }
    }

    Ok(())
}

/// Initializes the tracing subscriber on stderr.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show page breaks and header redraws
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads and validates an invoice from a JSON file.
fn load_invoice(path: &Path) -> Result<Invoice> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_invoice(&text).with_context(|| format!("Invalid invoice in {}", path.display()))
}

fn parse_invoice(text: &str) -> Result<Invoice> {
    let builder: InvoiceBuilder = serde_json::from_str(text).context("Malformed invoice JSON")?;
    let invoice = builder.build()?;
    info!(
        invoice = %invoice.number(),
        items = invoice.items().len(),
        "Loaded invoice"
    );
    Ok(invoice)
}

/// What `render` writes out.
#[derive(Debug, Serialize)]
struct RenderReport {
    invoice: String,
    totals: InvoiceTotals,
    document: RenderedDocument,
}

fn render(
    invoice: &Invoice,
    config: RenderConfig,
    template: Option<&str>,
    template_dir: &Path,
) -> Result<RenderReport> {
    let origin = (config.geometry.margin_left, config.geometry.margin_top);
    let engine = Engine::new(config)
        .with_templates(TemplateManager::new().with_source(FsSource::new(template_dir)));
    let mut canvas = RecordingCanvas::new(origin);

    let totals = match template {
        Some(name) => {
            engine
                .render_template(&mut canvas, invoice, name)
                .with_context(|| format!("Failed to render template {name}"))?
                .totals
        }
        None => {
            engine
                .render_invoice(&mut canvas, invoice)
                .context("Failed to lay out invoice")?
                .totals
        }
    };

    Ok(RenderReport {
        invoice: invoice.number().to_string(),
        totals,
        document: canvas.finish(),
    })
}

fn write_output(report: &RenderReport, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(
                path = %path.display(),
                pages = report.document.page_count(),
                "Wrote page sequence"
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const SAMPLE: &str = include_str!("../demos/sample-invoice.json");

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sample_invoice() {
        let invoice = parse_invoice(SAMPLE).unwrap();
        assert_eq!(invoice.number(), "INV-2024-001");
        assert_eq!(invoice.items().len(), 3);

        let totals = invoice.totals().unwrap();
        assert_eq!(totals.subtotal.amount().normalize().to_string(), "4410");
        assert_eq!(totals.total_net.amount().normalize().to_string(), "4122.5");
    }

    #[test]
    fn test_invalid_invoice_reports_validation_error() {
        let err = parse_invoice(r#"{ "number": "INV-1" }"#).unwrap_err();
        assert!(format!("{err:#}").contains("issue date"));

        let err = parse_invoice("{ not json").unwrap_err();
        assert!(err.to_string().contains("Malformed invoice JSON"));
    }

    #[test]
    fn test_render_builtin_layout() {
        let invoice = parse_invoice(SAMPLE).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let report = render(&invoice, RenderConfig::DEFAULT, None, dir.path()).unwrap();
        assert_eq!(report.document.page_count(), 1);
        assert!(report.document.pages[0].contains_text("Globex Corporation"));

        let out = dir.path().join("pages.json");
        write_output(&report, Some(&out)).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(written["invoice"], "INV-2024-001");
        assert_eq!(written["document"]["pages"][0]["number"], 1);
    }

    #[test]
    fn test_render_template_from_directory() {
        let invoice = parse_invoice(SAMPLE).unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("simple.html"),
            "<h1>{{ number }}</h1><p>{{ customer_name }}</p>",
        )
        .unwrap();

        let report =
            render(&invoice, RenderConfig::DEFAULT, Some("simple.html"), dir.path()).unwrap();
        let texts = report.document.pages[0].texts();
        assert_eq!(texts, vec!["INV-2024-001", "Globex Corporation"]);

        let err =
            render(&invoice, RenderConfig::DEFAULT, Some("missing.html"), dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("not found"));
    }

    #[test]
    fn test_render_template_iterates_items() {
        let invoice = parse_invoice(SAMPLE).unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("loop.html"),
            "<h1>{{ number }}</h1>\
             {{#each items}}<p>{{description}}</p>{{/each}}\
             <p>{{ upper customer_name }}</p>",
        )
        .unwrap();

        let report =
            render(&invoice, RenderConfig::DEFAULT, Some("loop.html"), dir.path()).unwrap();
        assert_eq!(
            report.document.pages[0].texts(),
            vec![
                "INV-2024-001",
                "Architecture review",
                "Implementation support",
                "Printed documentation",
                "GLOBEX CORPORATION",
            ]
        );
    }

    #[test]
    fn test_unknown_template_helper_is_reported() {
        let invoice = parse_invoice(SAMPLE).unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.html"), "<p>{{ shout number }}</p>").unwrap();

        let err =
            render(&invoice, RenderConfig::DEFAULT, Some("bad.html"), dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to render template"));
    }

    #[test]
    fn test_default_tax_for_untaxed_items() {
        let mut json: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
        for item in json["items"].as_array_mut().unwrap() {
            item.as_object_mut().unwrap().remove("tax");
        }
        json["default_tax"] = serde_json::json!({ "kind": "percent", "value": "10" });

        let invoice = parse_invoice(&json.to_string()).unwrap();
        let totals = invoice.totals().unwrap();
        // 10% of the 4122.50 net
        assert_eq!(totals.total_tax.amount().round_dp(2).to_string(), "412.25");

        let dir = tempfile::tempdir().unwrap();
        let report = render(&invoice, RenderConfig::DEFAULT, None, dir.path()).unwrap();
        let rate_cells = report.document.pages[0]
            .texts()
            .iter()
            .filter(|t| *t == "10%")
            .count();
        // one discount cell plus three tax cells
        assert!(rate_cells >= 4, "found {rate_cells} cells");
    }
}
