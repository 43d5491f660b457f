//! Queue command - manage the flat-file work queue.

use crate::error::CliError;
use panostitch::config::Settings;
use panostitch::queue::QueueManager;

/// Add identifiers to the queue, skipping duplicates.
pub fn add(settings: &Settings, identifiers: &[String]) -> Result<(), CliError> {
    let queue = QueueManager::new(settings.queue.file.clone());

    for identifier in identifiers {
        if queue.enqueue(identifier)? {
            println!("queued {}", identifier);
        } else {
            println!("{} already queued", identifier.trim());
        }
    }
    Ok(())
}

/// Print the queue contents.
pub fn list(settings: &Settings) -> Result<(), CliError> {
    let queue = QueueManager::new(settings.queue.file.clone());
    let entries = queue.list()?;

    if entries.is_empty() {
        println!("The queue is empty.");
        return Ok(());
    }

    for (position, identifier) in entries.iter().enumerate() {
        println!("{}. {}", position + 1, identifier);
    }
    Ok(())
}
