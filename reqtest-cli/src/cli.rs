use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Turn requirement prose into a checklist and test skeletons"
)]
pub struct Cli {
    /// Path to a YAML config file (keyword vocabularies, generator settings)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// Add a sub-requirement under an existing requirement
    Add {
        /// Exported checklist file to update in place
        file: PathBuf,

        /// Parent requirement ID (e.g. REQ_001 or REQ_001.2)
        parent: String,

        /// Text of the sub-requirement
        text: String,
    },

    /// Remove a sub-requirement and renumber its siblings
    Remove {
        /// Exported checklist file to update in place
        file: PathBuf,

        /// Parent requirement ID
        parent: String,

        /// Position of the sub-requirement to remove (1-based, as in the id)
        index: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract requirements and print them as a checklist
    Extract {
        /// Requirements text file (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Print JSON instead of the checklist
        #[clap(long)]
        json: bool,
    },

    /// Generate test skeletons for the extracted requirements
    Generate {
        /// Requirements text file (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Target framework (pytest, rust)
        #[clap(long, short = 'f')]
        framework: Option<String>,

        /// Name of the generated suite (class or module)
        #[clap(long)]
        suite: Option<String>,

        /// Read an exported checklist (text or JSON) instead of prose
        #[clap(long)]
        from_checklist: bool,

        /// Output file path (prints to stdout when omitted)
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Export the extracted requirements as a plain-text checklist
    Checklist {
        /// Requirements text file (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Write JSON instead of the plain-text checklist
        #[clap(long)]
        json: bool,

        /// Output file path (prints to stdout when omitted)
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Mark requirements in an exported checklist as done (or not done)
    Check {
        /// Exported checklist file to update in place
        file: PathBuf,

        /// Requirement IDs to change
        ids: Vec<String>,

        /// Apply to every requirement
        #[clap(long)]
        all: bool,

        /// Clear the checkmark instead of setting it
        #[clap(long)]
        uncheck: bool,
    },

    /// Sub-requirement management commands
    #[clap(subcommand)]
    Sub(SubCommand),

    /// Generate pytest code from a checklist, run it and record the results
    Run {
        /// Exported checklist file to update in place
        file: PathBuf,

        /// Python interpreter with pytest installed
        #[clap(long, default_value = "python3")]
        python: PathBuf,

        /// Seconds to wait for pytest before giving up
        #[clap(long, default_value_t = 60)]
        timeout: u64,
    },
}
