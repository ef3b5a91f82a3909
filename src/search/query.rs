//! Raw query input handling.

/// A query as typed, split into its text and whether the user submitted it.
///
/// Line breaks never reach the query. An input method that confirms with
/// Enter delivers a trailing CR or LF; that counts as a submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryInput {
    pub text: String,
    pub submitted: bool,
}

impl QueryInput {
    /// Parses raw input text.
    ///
    /// # Examples
    ///
    /// ```
    /// use applang::search::QueryInput;
    ///
    /// let input = QueryInput::parse("maps\n");
    /// assert_eq!(input.text, "maps");
    /// assert!(input.submitted);
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let submitted = raw.contains(['\r', '\n']);
        let text = if submitted {
            raw.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
        } else {
            raw.to_string()
        };
        Self { text, submitted }
    }
}
