use regex::Regex;
use std::sync::LazyLock;

static FUNCTION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z\-]+$").expect("function name pattern is valid")
});

/// Function names double as cluster service names and DNS labels, so only
/// letters and hyphens are accepted.
pub fn is_valid_function_name(name: &str) -> bool {
    FUNCTION_NAME.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_letters_and_hyphens() {
        assert!(is_valid_function_name("echo"));
        assert!(is_valid_function_name("Figlet-Fn"));
        assert!(is_valid_function_name("-"));
    }

    #[test]
    fn rejects_everything_else() {
        assert!(!is_valid_function_name(""));
        assert!(!is_valid_function_name("echo2"));
        assert!(!is_valid_function_name("echo_fn"));
        assert!(!is_valid_function_name("echo.fn"));
        assert!(!is_valid_function_name("echo fn"));
    }
}
