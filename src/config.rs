use clap::Parser;

/// Coverage Collector Configuration
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Receiver latitude in decimal degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Receiver longitude in decimal degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Receiver altitude in meters above the WGS84 ellipsoid.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub alt: f64,

    /// Connect to a host:port SBS (Basestation) feed. Reads stdin when absent.
    #[arg(long, value_name = "HOST:PORT")]
    pub connect: Option<String>,

    /// Directory for histogram snapshots and status output.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub work_dir: String,

    /// Seconds between periodic snapshot saves.
    #[arg(long, default_value_t = 30.0)]
    pub save_interval: f64,

    /// Seconds between distinct-aircraft history resets.
    #[arg(long, default_value_t = 30.0)]
    pub reset_interval: f64,

    /// Verbose logging (DEBUG level)
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}
