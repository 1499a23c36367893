use anyhow::Result;
use occur_core::codec;
use occur_core::matcher::Matcher;
use occur_core::models::Window;
use owo_colors::OwoColorize;

use crate::cli::CheckCommand;

pub fn check_occurrence(matcher: &Matcher, command: CheckCommand) -> Result<()> {
    let rule = codec::decode(command.rule.as_deref())?;
    let window = Window::new(command.from, command.to);

    match matcher.first_occurrence_in_window(command.anchor, rule.as_ref(), &window)? {
        Some(occurrence) => println!("{} {}", "Occurs at".green().bold(), occurrence),
        None => println!(
            "{} between {} and {}",
            "No occurrence".yellow().bold(),
            window.from,
            window.to
        ),
    }
    Ok(())
}
