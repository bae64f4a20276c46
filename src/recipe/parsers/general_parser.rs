pub struct ParseSuccess<'a, T> {
  pub value: T,
  pub rest: &'a str
}

#[derive(Debug)]
pub enum ParseError<E> {
  NoneMatched {
    what_parsing: String,
    parsed_from: String,
    failure_reason: String
  },
  InvalidIdentifier {
    what_parsing: String,
    identifier: String,
    expected: Option<String>,
    parsed_from: String
  },
  Custom(E)
}

pub type ParseResult<'a, T, E> = Result<Option<ParseSuccess<'a, T>>, ParseError<E>>;

pub trait Parser<'a, T, E> {
  fn parse(&self, s: &'a str) -> ParseResult<'a, T, E>;
}

impl<'a, T, E, F> Parser<'a, T, E> for F
  where F: Fn(&'a str) -> ParseResult<'a, T, E>
{
  fn parse(&self, s: &'a str) -> ParseResult<'a, T, E> {
    self(s)
  }
}

pub fn alternatives_parse<'a, T, E>(
  s: &'a str,
  parsers: Vec<&dyn Parser<'a, T, E>>
) -> ParseResult<'a, T, E> {
  for parser in parsers {
    match parser.parse(s) {
      Ok(Some(success)) => return Ok(Some(success)),
      Ok(None) => continue,
      Err(err) => return Err(err)
    }
  }

  Ok(None)
}

pub fn parse_whitespace<'a>(s: &'a str) -> &'a str {
  return s.trim_start();
}

pub fn parse_given_str<'a, E>(
  str_parsing_for: &'static str,
  s: &'a str
) -> ParseResult<'a, &'static str, E> {
  if str_parsing_for.is_empty() || !s.starts_with(str_parsing_for) {
    return Ok(None);
  }

  return Ok(Some(ParseSuccess {
    value: str_parsing_for,
    rest: &s[str_parsing_for.len()..]
  }))
}

pub fn parse_given_str_after_whitespace<'a, E>(
  str_parsing_for: &'static str,
  s: &'a str
) -> ParseResult<'a, &'static str, E> {
  return parse_given_str(str_parsing_for, parse_whitespace(s));
}

/*
  Produces a two line diagnostic:
  	((os:linux and arhc:x86))
  	               ^-- Error occurs here
*/
pub fn point_to_position(full_str: &str, parsed_from: &str) -> String {
  let index: usize = full_str
    .rfind(parsed_from.trim_start())
    .unwrap_or(0);

  return format!(
    "\t{}\n\t{}^-- Error occurs here\n",
    full_str,
    " ".repeat(index)
  );
}
