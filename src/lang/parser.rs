use pest::{iterators::Pairs, Parser};
use pest_derive::Parser;

use super::error::ParseError;

#[derive(Parser)]
#[grammar = "lang/grammar.pest"]
pub struct SimpleParser;

/// Parses Simple source text into pest pairs rooted at `Rule::program`.
pub fn parse_simple(input: &str) -> Result<Pairs<'_, Rule>, ParseError> {
    let pairs = SimpleParser::parse(Rule::program, input)?;
    Ok(pairs)
}
