use anyhow::{bail, Context, Result};
use beacon_vision::ProfileField;

/// One line typed on the operator console.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    TakeOff,
    Land,
    /// Raw value text; range checks happen when the profile is updated.
    Set(ProfileField, String),
    Status,
    Quit,
}

/// `Ok(None)` for blank lines and `#` comments.
pub fn parse(line: &str) -> Result<Option<ConsoleCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_ascii_lowercase();
    let cmd = match verb.as_str() {
        "takeoff" | "t" => ConsoleCommand::TakeOff,
        "land" | "l" => ConsoleCommand::Land,
        "status" | "s" => ConsoleCommand::Status,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        "set" => {
            let field = words.next().context("usage: set <r|g|b|dist|conv> <value>")?;
            let value = words.next().context("usage: set <r|g|b|dist|conv> <value>")?;
            let field: ProfileField = field.parse()?;
            ConsoleCommand::Set(field, value.to_string())
        }
        other => bail!("unknown command {:?} (takeoff, land, set, status, quit)", other),
    };
    if let Some(extra) = words.next() {
        bail!("unexpected argument {:?}", extra);
    }
    Ok(Some(cmd))
}
