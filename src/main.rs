//! FastSamView CLI entry point
//!
//! `samtools view` compatible filtering and region retrieval.

use clap::{ArgAction, Parser, Subcommand};
use fast_samview::core::{parse_flag_mask, ExitStatus, FilterConfig, HeaderMode, OutputFormat, ViewOptions};
use fast_samview::formats;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "fast-samview")]
#[command(about = "Filter and retrieve alignment records from BAM/SAM files")]
#[command(version)]
#[command(author = "FastSamView Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert/print alignments, optionally restricted to regions
    ///
    /// Regions look like `chr1`, `chr2:1,000` or `chr3:1000-2,000` (1-based,
    /// inclusive) and require an indexed BAM file.
    #[command(disable_help_flag = true)]
    View {
        /// Input BAM file (or SAM with -S)
        input: PathBuf,
        /// Regions to retrieve; whole file when omitted
        regions: Vec<String>,
        /// Output BAM
        #[arg(short = 'b')]
        bam: bool,
        /// Print header for the SAM output
        #[arg(short = 'h')]
        header: bool,
        /// Print header only (no alignments)
        #[arg(short = 'H')]
        header_only: bool,
        /// Input is SAM
        #[arg(short = 'S')]
        sam_input: bool,
        /// Output file name (stdout if not specified)
        #[arg(short = 'o')]
        output: Option<PathBuf>,
        /// Minimum mapping quality
        #[arg(short = 'q', default_value = "0")]
        min_mapq: u8,
        /// Required flag, 0 for unset
        #[arg(short = 'f', default_value = "0", value_parser = parse_flag_mask)]
        required_flags: u16,
        /// Filtering flag, 0 for unset
        #[arg(short = 'F', default_value = "0", value_parser = parse_flag_mask)]
        excluded_flags: u16,
        /// Number of threads for BGZF compression/decompression
        #[arg(short = '@', long, default_value = "1")]
        threads: usize,
        /// Print scan statistics to stderr
        #[arg(long)]
        stats: bool,
        /// Print help
        #[arg(long, action = ArgAction::Help)]
        help: Option<bool>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    match cli.command {
        Commands::View {
            input,
            regions,
            bam,
            header,
            header_only,
            sam_input,
            output,
            min_mapq,
            required_flags,
            excluded_flags,
            threads,
            stats,
            help: _,
        } => {
            let header_mode = if header_only {
                HeaderMode::Only
            } else if header {
                HeaderMode::Include
            } else {
                HeaderMode::Omit
            };

            let options = ViewOptions {
                input,
                output,
                regions,
                filter: FilterConfig::new(min_mapq, required_flags, excluded_flags),
                output_format: if bam { OutputFormat::Bam } else { OutputFormat::Sam },
                header: header_mode,
                input_is_sam: sam_input,
                threads,
            };

            let summary = formats::run_view(&options)?;

            if stats {
                if let Some(report) = &summary.report {
                    eprintln!("\n=== View Statistics ===");
                    eprintln!("Outcome:         {}", report.outcome.as_str());
                    eprintln!("Total records:   {}", report.stats.total);
                    eprintln!("Written:         {}", report.stats.passed);
                    eprintln!("Filtered:        {}", report.stats.filtered);
                    if options.is_region_query() {
                        eprintln!("Regions queried: {}", report.stats.regions_queried);
                        eprintln!("Regions skipped: {}", report.stats.regions_skipped);
                    }
                    eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
                }
            }

            match summary.status {
                ExitStatus::Success => {}
                ExitStatus::SuccessWithWarning => eprintln!("[view] truncated file."),
                ExitStatus::Failure => {
                    eprintln!("[view] random alignment retrieval only works for indexed BAM files.");
                    std::process::exit(summary.status.code());
                }
            }
        }
    }

    Ok(())
}
