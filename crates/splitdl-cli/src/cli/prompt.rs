//! Interactive URL prompt.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};

const PROMPT: &str = "Specify URL to download: ";

/// Asks until a non-empty line is entered.
pub(super) fn read_url<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<String> {
    loop {
        out.write_all(PROMPT.as_bytes())?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("no URL given");
        }
        let url = line.trim();
        if !url.is_empty() {
            return Ok(url.to_string());
        }
    }
}

pub(super) fn read_url_from_stdin() -> Result<String> {
    let stdin = io::stdin();
    read_url(&mut stdin.lock(), &mut io::stdout())
}
