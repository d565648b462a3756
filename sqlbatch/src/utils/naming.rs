//! Naming utilities for sqlbatch
//!
//! T-SQL identifier quoting.

/// Wrap an identifier in square brackets, doubling any closing bracket
pub fn quote_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// `[schema].[name]`
pub fn qualified_name(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_identifier(schema), quote_identifier(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Users", "[Users]")]
    #[case("Order Details", "[Order Details]")]
    #[case("a]b", "[a]]b]")]
    #[case("[x]", "[[x]]]")]
    fn quotes_identifiers(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(quote_identifier(input), expected);
    }

    #[test]
    fn qualifies_with_schema() {
        assert_eq!(qualified_name("dbo", "Tasks"), "[dbo].[Tasks]");
    }
}
