//! CLI argument definitions and parsing structures

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use creaturedex_model::{BodyShape, CreatureUpdate};
use creaturedex_store::DEFAULT_PAGE_LIMIT;

/// creaturedex - identify creatures in photographs and catalog them
#[derive(Parser, Debug)]
#[command(name = "creaturedex")]
#[command(about = "Identify living creatures from photographs and keep a catalog of their profiles")]
#[command(long_about = r#"
creaturedex sends a photograph to a vision model to name the creature in it,
checks with a reasoning model that the name is an animal or sea creature, and
stores a biological profile of every new creature in a local catalog.

EXAMPLES:
  # Identify the creature in a photograph
  creaturedex identify lion.jpg

  # Same, printing the catalog record as JSON
  creaturedex identify lion.jpg --json

  # Browse the catalog
  creaturedex list --limit 20
  creaturedex show 3

  # Correct a record by hand
  creaturedex update 3 --weight-kg 190 --body-shape bsi:quadruped

  # Inspect the effective configuration
  creaturedex config

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is discovered by searching upward from CWD for .creaturedex/config.toml
  Use --config to specify an explicit config file path
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Oracle provider: openai (including local compatible servers) or anthropic
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Reasoning model used to verify and explain creatures
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Vision model used to detect the creature in the image
    #[arg(long, global = true)]
    pub vision_model: Option<String>,

    /// Path to the catalog database
    #[arg(long = "database", global = true)]
    pub database_path: Option<PathBuf>,

    /// Directory where uploaded images are stored
    #[arg(long, global = true)]
    pub upload_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Identify the creature in an image and catalog it if it is new
    Identify {
        /// Image file (png, jpg, jpeg, webp or gif)
        image: PathBuf,

        /// Print the catalog record as JSON
        #[arg(long)]
        json: bool,
    },

    /// List cataloged creatures
    List {
        /// Number of records to skip
        #[arg(long, default_value_t = 0)]
        skip: u32,

        /// Maximum number of records to show
        #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: u32,

        #[arg(long)]
        json: bool,
    },

    /// Show one cataloged creature
    Show {
        id: i64,

        #[arg(long)]
        json: bool,
    },

    /// Change fields of a cataloged creature
    Update {
        id: i64,

        #[command(flatten)]
        fields: UpdateArgs,

        #[arg(long)]
        json: bool,
    },

    /// Remove a creature from the catalog
    Delete { id: i64 },

    /// List the model names accepted by the openai provider
    Models {
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration and where each value came from
    Config {
        #[arg(long)]
        json: bool,
    },
}

/// Field flags for `update`; omitted flags leave the field unchanged
#[derive(Args, Debug, Clone, Default)]
pub struct UpdateArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub scientific_name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long = "type")]
    pub creature_type: Option<String>,

    #[arg(long)]
    pub gender_ratio: Option<f64>,

    #[arg(long)]
    pub kingdom: Option<String>,

    #[arg(long)]
    pub classification: Option<String>,

    #[arg(long)]
    pub family: Option<String>,

    #[arg(long, value_parser = parse_positive)]
    pub height_cm: Option<f64>,

    #[arg(long, value_parser = parse_positive)]
    pub weight_kg: Option<f64>,

    /// Body shape icon id, e.g. bsi:quadruped
    #[arg(long)]
    pub body_shape: Option<BodyShape>,

    #[arg(long)]
    pub image_path: Option<String>,
}

impl From<UpdateArgs> for CreatureUpdate {
    fn from(args: UpdateArgs) -> Self {
        CreatureUpdate {
            name: args.name,
            scientific_name: args.scientific_name,
            description: args.description,
            creature_type: args.creature_type,
            gender_ratio: args.gender_ratio,
            kingdom: args.kingdom,
            classification: args.classification,
            family: args.family,
            height_cm: args.height_cm,
            weight_kg: args.weight_kg,
            body_shape: args.body_shape,
            image_path: args.image_path,
        }
    }
}

fn parse_positive(value: &str) -> Result<f64, String> {
    let parsed: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if parsed.is_finite() && parsed > 0.0 {
        Ok(parsed)
    } else {
        Err(format!("'{value}' must be greater than zero"))
    }
}
