use std::path::PathBuf;

use clap::Parser;

use ec2diff::app::RunConfig;
use ec2diff::drift::DEFAULT_WORKERS;
use ec2diff::error::Ec2DiffError;
use ec2diff::output::OutputFormat;
use ec2diff::providers::FetchConfig;
use ec2diff::providers::aws::DEFAULT_PAGE_SIZE;

/// Detect drift between declared Terraform EC2 instances and live AWS state.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Terraform state (.tfstate, .json) or HCL (.tf, .hcl) file
    #[arg(
        short,
        long,
        visible_alias = "state",
        required_unless_present = "list_attributes"
    )]
    pub file: Option<PathBuf>,

    /// Comma-separated instance IDs to check; `label=id` binds HCL blocks by name
    #[arg(short, long, value_delimiter = ',')]
    pub instances: Vec<String>,

    /// Comma-separated attributes to compare (default: all supported)
    #[arg(short, long, value_delimiter = ',')]
    pub attrs: Vec<String>,

    /// Print the supported attribute names and exit
    #[arg(long)]
    pub list_attributes: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// AWS region (default: the AWS config chain)
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Number of concurrent drift comparison workers
    #[arg(long, default_value_t = DEFAULT_WORKERS as u16, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,

    /// Instances requested per DescribeInstances page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(i32).range(5..=1000))]
    pub page_size: i32,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn run_config(&self) -> Result<RunConfig, Ec2DiffError> {
        let file = self
            .file
            .clone()
            .ok_or_else(|| Ec2DiffError::Usage("--file is required".to_string()))?;
        RunConfig::new(file, &self.instances, &self.attrs, usize::from(self.workers))
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            region: self.region.clone(),
            page_size: self.page_size,
        }
    }

    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "ec2diff=debug"
        } else {
            "warn"
        }
    }
}
