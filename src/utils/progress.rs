//! Terminal progress bars.

use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// A styled bar of `len` steps, or a hidden one when `visible` is false.
pub fn progress_bar(len: u64, message: &'static str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(message);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar_still_counts() {
        let pb = progress_bar(10, "embedding", false);
        pb.inc(3);
        assert_eq!(pb.position(), 3);
        assert!(pb.is_hidden());
    }
}
