use anyhow::Result;
use occur_core::codec;

use crate::cli::EncodeCommand;

pub fn encode_rule(command: EncodeCommand) -> Result<()> {
    let encoded = codec::encode(&command.to_request())?;
    match encoded.rule() {
        Some(rule) => println!("{}", rule),
        None => println!("No recurrence"),
    }
    Ok(())
}
