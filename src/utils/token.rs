//! Token counting traits and utilities

pub mod tiktoken;

/// Trait for counting tokens in a string.
pub trait CountToken {
    fn count_token(&self, string: &str) -> usize;
}

/// Blanket impl of CountToken for Fn(&str) -> usize.
impl<F> CountToken for F where F: Fn(&str) -> usize {
    fn count_token(&self, string: &str) -> usize {
        self(string)
    }
}

/// Count the number of tokens in a string by the length of the string.
#[inline]
pub fn count_tokens_by_len(string: &str) -> usize {
    string.len()
}

#[cfg(test)]
mod test_token {
    use super::{count_tokens_by_len, CountToken};

    #[test]
    fn test_str_len_impl() {
        let counter = str::len;
        let size = counter.count_token("");
        assert_eq!(0, size);
        assert_eq!(5, count_tokens_by_len.count_token("hello"));
    }

    #[test]
    fn test_closure_impl() {
        let words = |s: &str| s.split_whitespace().count();
        assert_eq!(3, words.count_token("one two  three"));
    }
}
