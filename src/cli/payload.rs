//! Payload and decode subcommands
//!
//! `payload` writes the NDEF message a provisioning device would push over
//! NFC; `decode` reads one back.

use super::EditArgs;
use crate::format::OutputFormat;
use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Byte encoding of a message on disk or stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Encoding {
    /// Raw NDEF bytes
    Raw,
    /// Base64 text
    #[default]
    Base64,
}

impl Encoding {
    pub fn encode(self, bytes: &[u8]) -> Vec<u8> {
        match self {
            Encoding::Raw => bytes.to_vec(),
            Encoding::Base64 => {
                let mut text = STANDARD.encode(bytes);
                text.push('\n');
                text.into_bytes()
            }
        }
    }

    pub fn decode(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Encoding::Raw => Ok(data.to_vec()),
            Encoding::Base64 => {
                let text = std::str::from_utf8(data).context("base64 input is not text")?;
                STANDARD
                    .decode(text.trim())
                    .context("invalid base64 message")
            }
        }
    }
}

/// Arguments for the payload subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct PayloadArgs {
    /// Output file path (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Encoding of the written message
    #[arg(short, long, value_enum, default_value_t = Encoding::Base64)]
    pub encoding: Encoding,

    #[command(flatten)]
    pub edits: EditArgs,
}

/// Arguments for the decode subcommand
#[derive(Args, Debug, Clone)]
pub struct DecodeArgs {
    /// Message file, or `-` for stdin
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Encoding of the input
    #[arg(short, long, value_enum, default_value_t = Encoding::Base64)]
    pub encoding: Encoding,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,
}

impl DecodeArgs {
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_encoding_round_trips() {
        let bytes = [0xD2u8, 0x0A, 0x02, b'h', b'i'];
        let encoded = Encoding::Base64.encode(&bytes);
        assert!(encoded.ends_with(b"\n"));
        assert_eq!(Encoding::Base64.decode(&encoded).unwrap(), bytes);
        assert_eq!(Encoding::Raw.decode(&Encoding::Raw.encode(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        assert!(Encoding::Base64.decode(b"not base64!").is_err());
    }
}
