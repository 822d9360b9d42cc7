use std::io::{self, Write};

use anyhow::{Context, Result};

/// Read one trimmed line; an empty answer falls back to `default`
pub fn prompt_input(message: &str, default: Option<&str>) -> Result<String> {
    print_prompt(message, default)?;
    let mut buffer = String::new();
    io::stdin()
        .read_line(&mut buffer)
        .context("failed to read input")?;
    let input = buffer.trim();
    if input.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(input.to_string())
    }
}

/// Like [`prompt_input`], but an empty answer becomes `None`
pub fn prompt_optional(message: &str) -> Result<Option<String>> {
    let answer = prompt_input(message, None)?;
    Ok(if answer.is_empty() { None } else { Some(answer) })
}

fn print_prompt(message: &str, default: Option<&str>) -> Result<()> {
    let mut stdout = io::stdout();
    match default {
        Some(value) if !value.is_empty() => write!(stdout, "{} [{}]: ", message, value)?,
        _ => write!(stdout, "{}: ", message)?,
    }
    stdout.flush().context("failed to flush prompt")?;
    Ok(())
}
