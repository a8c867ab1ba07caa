// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyphscan — page-image OCR
//
// Entry point. Initialises logging, loads services from the data directory,
// and runs one command.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use services::app_services::AppServices;

const USAGE: &str = "\
usage: glyphscan <command> [args]

commands:
  train <image> <labels>   learn the glyphs of a sample page, in reading order
  read <image>             print the recognized text of a page
  mask <image> <out.png>   write the page with segmentation boxes drawn
  dump <image> <out-dir>   write pixel and boundary dumps as text";

/// One invocation of the front end.
#[derive(Debug, PartialEq)]
enum Command {
    Train { image: PathBuf, labels: String },
    Read { image: PathBuf },
    Mask { image: PathBuf, out: PathBuf },
    Dump { image: PathBuf, out_dir: PathBuf },
}

impl Command {
    fn parse(args: &[String]) -> Option<Self> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match args.as_slice() {
            ["train", image, labels] => Some(Self::Train {
                image: image.into(),
                labels: (*labels).to_owned(),
            }),
            ["read", image] => Some(Self::Read {
                image: image.into(),
            }),
            ["mask", image, out] => Some(Self::Mask {
                image: image.into(),
                out: out.into(),
            }),
            ["dump", image, out_dir] => Some(Self::Dump {
                image: image.into(),
                out_dir: out_dir.into(),
            }),
            _ => None,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = Command::parse(&args) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    tracing::info!(?command, "Glyphscan starting");
    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> glyphscan_core::Result<()> {
    let mut svc = AppServices::init()?;
    match command {
        Command::Train { image, labels } => {
            let added = svc.train(&image, &labels)?;
            println!(
                "added {added} examples ({} in {})",
                svc.store().len(),
                svc.data_dir().display()
            );
        }
        Command::Read { image } => print!("{}", svc.read(&image)?),
        Command::Mask { image, out } => svc.mask(&image, &out)?,
        Command::Dump { image, out_dir } => svc.dump(&image, &out_dir)?,
    }
    Ok(())
}
