use clap::ValueEnum;

/// Output format for command results
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Human,
    /// Machine-readable JSON on stdout
    Json,
}
