//! Flat row shape shared by every table the engine emits.

/// A record that can be written as one delimited row under a fixed header.
pub trait TabularRecord {
    fn headers() -> Vec<&'static str>;
    fn fields(&self) -> Vec<String>;
}

/// Absent values become empty cells.
pub fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_is_empty() {
        assert_eq!(fmt_opt(None), "");
        assert_eq!(fmt_opt(Some(1.5)), "1.5");
    }
}
