use anyhow::Result;
use occur_core::codec;
use occur_core::models::RecurrenceRequest;

use crate::cli::DecodeCommand;

/// Prints the stored rule as the JSON description callers exchange.
pub fn decode_rule(command: DecodeCommand) -> Result<()> {
    let recurrence = codec::parse_rule(&command.rule)?;
    let request = RecurrenceRequest::from(&recurrence);
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}
