//! Main entry point for the rangeseek CLI application.
//!
//! Prints the size of a remote resource, or copies a byte range of it to
//! stdout using HTTP Range requests.

use std::io::SeekFrom;

use anyhow::{Result, bail};
use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use rangeseek::io::Transport;
use rangeseek::{Cli, RangeReader, RangeStream, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level())?;

    if !cli.is_http_url() {
        bail!("not an HTTP URL: {}", cli.url);
    }

    let mut reader = RangeReader::new(&cli.url)?.with_min_fetch(cli.min_fetch);
    if let Some(size) = cli.size {
        reader = reader.with_known_size(size);
    }

    if cli.size_only {
        println!("{}", reader.size().await?);
        return Ok(());
    }

    let mut stream = reader.into_stream();
    let copied = copy_range(&mut stream, &cli).await?;

    // Display network transfer statistics
    if !cli.quiet {
        if let Some(reader) = stream.get_ref() {
            eprintln!(
                "\nCopied {} ({} transferred in {} requests)",
                format_size(copied),
                format_size(reader.transferred_bytes()),
                reader.request_count()
            );
        }
    }

    Ok(())
}

/// Seek to the requested offset and copy the requested bytes to stdout.
///
/// Returns the number of bytes written.
async fn copy_range<T: Transport + 'static>(stream: &mut RangeStream<T>, cli: &Cli) -> Result<u64> {
    let position = if cli.from_end {
        SeekFrom::End(-i64::try_from(cli.offset)?)
    } else {
        SeekFrom::Start(cli.offset)
    };
    stream.seek(position).await?;

    let mut stdout = tokio::io::stdout();
    let copied = match cli.length {
        Some(length) => tokio::io::copy(&mut stream.take(length), &mut stdout).await?,
        None => tokio::io::copy(stream, &mut stdout).await?,
    };

    stdout.flush().await?;
    Ok(copied)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
