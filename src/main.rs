use clap::{Args, Parser, Subcommand};
use rollscan::models::DetectionRules;
use rollscan::pipeline::{self, FraudPipeline, DEFAULT_START_PAGE};
use rollscan::processing::DEFAULT_ZOOM;
use rollscan::RollScanError;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rollscan", version, about = "Electoral roll fraud detection")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process roll PDFs end to end and write the full report set.
    Run {
        /// Electoral roll PDF files.
        #[arg(required = true)]
        documents: Vec<PathBuf>,
        #[command(flatten)]
        dirs: DirArgs,
        /// 1-based page number processing starts at; earlier pages are
        /// summary sheets without voter cards.
        #[arg(long, default_value_t = DEFAULT_START_PAGE)]
        start_page: u16,
        /// Zoom factor for rendering PDF pages.
        #[arg(long, default_value_t = DEFAULT_ZOOM)]
        zoom: f32,
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// Re-run detection over previously extracted records.
    Detect {
        #[command(flatten)]
        dirs: DirArgs,
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// Rebuild only the human review package from extracted records.
    Review {
        #[command(flatten)]
        dirs: DirArgs,
        #[command(flatten)]
        rules: RuleArgs,
    },
}

#[derive(Args)]
struct DirArgs {
    /// Directory for extracted cards, photos and the record store.
    #[arg(long, default_value = "data")]
    work_dir: PathBuf,
    /// Directory the reports are written to.
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,
}

#[derive(Args)]
struct RuleArgs {
    /// Detection rules file (JSON). Flags below override its values.
    #[arg(long)]
    rules: Option<PathBuf>,
    /// Minimum face similarity percentage (inclusive) to flag a pair.
    #[arg(long)]
    face_threshold: Option<f32>,
    /// Confidence bonus when a flagged face pair carries differing names.
    #[arg(long)]
    name_bonus: Option<f32>,
    /// Do not require matching ages for duplicate-details pairs.
    #[arg(long)]
    no_age_gate: bool,
    /// Do not require matching genders for duplicate-details pairs.
    #[arg(long)]
    no_gender_gate: bool,
    /// Maximum photo hash distance (of 64 bits) to flag identical photos.
    #[arg(long)]
    photo_distance: Option<u32>,
    /// Registrations at one house number that trigger an address anomaly.
    #[arg(long)]
    address_threshold: Option<usize>,
}

impl RuleArgs {
    fn resolve(&self) -> Result<DetectionRules, RollScanError> {
        let mut rules = match &self.rules {
            Some(path) => DetectionRules::from_file(path)?,
            None => DetectionRules::default(),
        };
        if let Some(threshold) = self.face_threshold {
            rules.face_similarity_threshold = threshold;
        }
        if let Some(bonus) = self.name_bonus {
            rules.name_mismatch_bonus = bonus;
        }
        if self.no_age_gate {
            rules.require_age_match = false;
        }
        if self.no_gender_gate {
            rules.require_gender_match = false;
        }
        if let Some(distance) = self.photo_distance {
            rules.photo_hash_max_distance = distance;
        }
        if let Some(threshold) = self.address_threshold {
            rules.address_anomaly_threshold = threshold;
        }
        rules.validate()?;
        Ok(rules)
    }
}

fn run(cli: Cli) -> Result<(), RollScanError> {
    match cli.command {
        Command::Run {
            documents,
            dirs,
            start_page,
            zoom,
            rules,
        } => {
            let pipeline = FraudPipeline::new(
                &dirs.work_dir,
                &dirs.out_dir,
                start_page,
                zoom,
                rules.resolve()?,
            )?;
            pipeline.run(&documents)?;
        }
        Command::Detect { dirs, rules } => {
            pipeline::detect_from_store(&dirs.work_dir, &dirs.out_dir, &rules.resolve()?)?;
        }
        Command::Review { dirs, rules } => {
            match pipeline::review_from_store(&dirs.work_dir, &dirs.out_dir, &rules.resolve()?)? {
                Some(paths) => {
                    println!("Review package written:");
                    println!("  {}", paths.csv.display());
                    println!("  {}", paths.html.display());
                }
                None => println!("No fraud candidates, no review package needed."),
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
