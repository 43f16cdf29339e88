//! Renders [`crate::Status`] updates as an `indicatif` progress bar, the
//! same crate and style `avm`'s `cli/tool/install.rs` uses for its
//! download loop, adapted from a step-wise `advance()` loop to a single
//! injected callback since the façade's operations are one-shot.

use indicatif::{ProgressBar, ProgressStyle};
use smol_str::SmolStr;

use crate::Status;

pub struct ProgressReporter {
    hidden: bool,
    bar: Option<ProgressBar>,
    last_name: Option<SmolStr>,
}

impl ProgressReporter {
    pub fn new(hidden: bool) -> ProgressReporter {
        ProgressReporter {
            hidden,
            bar: None,
            last_name: None,
        }
    }

    pub fn report(&mut self, status: Status) {
        if self.hidden {
            return;
        }

        match status {
            Status::InProgress {
                name,
                progress_ratio,
            } => {
                if self.last_name.as_ref() != Some(&name) {
                    if let Some(bar) = self.bar.take() {
                        bar.finish_and_clear();
                    }
                    log::info!("{name} ...");
                    self.last_name = Some(name);
                }

                if let Some((done, total)) = progress_ratio {
                    let bar = self.bar.get_or_insert_with(|| {
                        let bar = ProgressBar::new(total);
                        if let Ok(style) = ProgressStyle::default_bar().template(
                            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                        ) {
                            bar.set_style(style.progress_chars("#>-"));
                        }
                        bar
                    });
                    bar.set_position(done);
                }
            }
            Status::Stopped => {
                if let Some(bar) = self.bar.take() {
                    bar.finish_and_clear();
                }
            }
        }
    }
}
