//! Progress rendering with indicatif.

use indicatif::{ProgressBar, ProgressStyle};
use panostitch::fetch::TileStatusKind;
use panostitch::pipeline::{ProgressEvent, ProgressReceiver};
use tokio::task::JoinHandle;

/// Spawn a task that renders pipeline progress events as a progress bar.
///
/// The task ends when the sender side is dropped.
pub fn spawn_renderer(mut events: ProgressReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        let style = ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} tiles ({msg})",
        )
        .expect("static progress template is valid");

        let mut bar: Option<ProgressBar> = None;

        while let Some(event) = events.recv().await {
            match event {
                ProgressEvent::StateChanged(state) => {
                    if let Some(bar) = &bar {
                        bar.set_message(state.to_string());
                    }
                }
                ProgressEvent::GridResolved {
                    identifier,
                    rows,
                    columns,
                    total_tiles,
                } => {
                    println!(
                        "{}: {} rows x {} columns, {} tiles",
                        identifier, rows, columns, total_tiles
                    );
                    let new_bar = ProgressBar::new(total_tiles).with_style(style.clone());
                    bar = Some(new_bar);
                }
                ProgressEvent::TileCompleted { status, coordinate, .. } => {
                    if let Some(bar) = &bar {
                        if status != TileStatusKind::Fetched {
                            bar.println(format!("tile {} failed ({:?})", coordinate, status));
                        }
                        bar.inc(1);
                    }
                }
                ProgressEvent::RunCompleted {
                    identifier,
                    failed_tiles,
                    output_path,
                } => {
                    if let Some(bar) = bar.take() {
                        bar.finish_and_clear();
                    }
                    if failed_tiles > 0 {
                        println!(
                            "{}: assembled with {} missing tile(s) -> {}",
                            identifier,
                            failed_tiles,
                            output_path.display()
                        );
                    } else {
                        println!("{}: assembled -> {}", identifier, output_path.display());
                    }
                }
            }
        }

        // A run that failed fatally never sends RunCompleted
        if let Some(bar) = bar.take() {
            bar.abandon();
        }
    })
}
