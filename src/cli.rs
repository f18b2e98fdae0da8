use clap::Parser;

use crate::io::DEFAULT_MIN_FETCH;

#[derive(Parser, Debug)]
#[command(name = "rangeseek")]
#[command(version)]
#[command(about = "Read byte ranges of a remote file over HTTP", long_about = None)]
#[command(after_help = "Examples:\n  \
  rangeseek -s https://example.com/big.iso            print the size\n  \
  rangeseek -o 1024 -n 512 https://example.com/f.bin  512 bytes at offset 1024\n  \
  rangeseek --from-end -o 22 https://example.com/a.zip | xxd   last 22 bytes")]
pub struct Cli {
    /// HTTP URL of the resource
    #[arg(value_name = "URL")]
    pub url: String,

    /// Offset to start reading at
    #[arg(short = 'o', long, default_value_t = 0)]
    pub offset: u64,

    /// Count the offset backwards from the end of the resource
    #[arg(long)]
    pub from_end: bool,

    /// Number of bytes to read (default: to the end)
    #[arg(short = 'n', long)]
    pub length: Option<u64>,

    /// Minimum bytes fetched per request (0 disables read-ahead)
    #[arg(short = 'm', long, value_name = "BYTES", default_value_t = DEFAULT_MIN_FETCH)]
    pub min_fetch: u64,

    /// Size of the resource, if already known
    #[arg(long, value_name = "BYTES")]
    pub size: Option<u64>,

    /// Print the size of the resource and exit
    #[arg(short = 's', long)]
    pub size_only: bool,

    /// Quiet mode, no transfer summary
    #[arg(short = 'q')]
    pub quiet: bool,

    /// Verbose logging (-vv => debug)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }

    /// Default log directive derived from `-v`
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
