//! CLI command definitions.

use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Render an invoice from customer and transaction files
    Invoice {
        /// Customer record (JSON or YAML)
        #[arg(long)]
        customer: PathBuf,
        /// Transaction record (JSON or YAML)
        #[arg(long)]
        transaction: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pdf)]
        format: OutputFormat,
        /// Output file; defaults to the invoice filename for PDF, stdout for HTML
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Template name to render instead of the receipt
        #[arg(long)]
        template: Option<String>,
        /// IANA timezone for the invoice date
        #[arg(long)]
        tz: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Html,
    Pdf,
}
