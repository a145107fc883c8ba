pub mod extract;
pub mod list;

use std::path::PathBuf;

use miette::{miette, Result};
use rk_fork::{ResourceFork, TypeCode};
use tracing::warn;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// List the resources of one or more Ndat or Rez files
    List(list::ListArgs),
    /// Extract resources into a directory
    Extract(extract::ExtractArgs),
}

impl Commands {
    pub fn handle(&self) -> Result<()> {
        match self {
            Commands::List(list) => list.handle(),
            Commands::Extract(extract) => extract.handle(),
        }
    }
}

/// Load `files` into a fresh fork, later files overriding earlier ones.
///
/// Fails only when none of the files could be read.
pub(crate) fn load(files: &[PathBuf]) -> Result<ResourceFork> {
    let fork = ResourceFork::empty();
    let results = fork.add_files(files);

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        warn!("{failed} of {} files could not be read", files.len());
    }
    if fork.is_empty() {
        return Err(miette!("no resource file could be read"));
    }

    Ok(fork)
}

/// Parse a `--type` argument into a type code.
///
/// Bytes outside printable ASCII are written as `\xNN`, the way type codes are displayed.
pub(crate) fn parse_type(s: &str) -> Result<TypeCode, String> {
    let mut bytes = Vec::with_capacity(4);
    let mut rest = s.as_bytes();

    while let Some((&b, tail)) = rest.split_first() {
        match tail {
            [b'x', hi, lo, tail @ ..] if b == b'\\' => {
                let hex = std::str::from_utf8(&[*hi, *lo])
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| format!("invalid escape in type code {s:?}"))?;
                bytes.push(hex);
                rest = tail;
            }
            _ => {
                bytes.push(b);
                rest = tail;
            }
        }
    }

    let code: [u8; 4] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| format!("type code must be exactly four bytes, got {}", b.len()))?;
    Ok(TypeCode::new(code))
}

/// A path component naming `code`, with anything unsafe for a file name written as `%NN`
pub(crate) fn type_dir(code: TypeCode) -> String {
    code.as_bytes()
        .iter()
        .map(|&b| match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b' ' | b'-' | b'_' => (b as char).to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect()
}
