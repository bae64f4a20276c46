use std::{collections::BTreeSet, fmt};

use enum_iterator::all;

use crate::recipe::settings::{SettingKey, Settings, SettingsAxis};
use super::general_parser::{
  ParseResult,
  ParseError,
  ParseSuccess,
  Parser,
  alternatives_parse,
  parse_whitespace,
  parse_given_str_after_whitespace,
  point_to_position
};

const VALID_JOINT_TERMS: [&'static str; 2] = ["and", "or"];

pub type ConditionParseResult<'a> = ParseResult<'a, SettingsConditionTree, ConditionParseError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsTerm {
  pub key: SettingKey,
  // Always the canonical spelling, so evaluation is a plain comparison.
  pub value: String
}

impl fmt::Display for SettingsTerm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.key.name_string(), self.value)
  }
}

/*
  Examples:
    - ((os:Linux))
    - ((not os:Windows))
    - ((os:Windows and not (compiler:gcc or compiler:clang)))
    - ((os:Linux and arch:x86_64 or os:Macos))

  Precedence from tightest to loosest is 'not', 'and', 'or'. Chained 'and' and
  'or' expressions group from the right.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsConditionTree {
  Term(SettingsTerm),
  Not(Box<SettingsConditionTree>),
  And(Box<SettingsConditionTree>, Box<SettingsConditionTree>),
  Or(Box<SettingsConditionTree>, Box<SettingsConditionTree>),
  ParenGroup(Box<SettingsConditionTree>)
}

impl SettingsConditionTree {
  pub fn parse_from<'a>(s: &'a str) -> ConditionParseResult<'a> {
    return parse_full_condition(s);
  }

  /*
    Every operand is evaluated, even when the result is already known. A term
    on a setting which has no value is an error no matter where it appears,
    except for optional sub-settings like compiler.version, which just don't
    match when unset.
  */
  pub fn evaluate(&self, settings: &Settings) -> Result<bool, String> {
    match self {
      Self::Term(term) => match settings.value_of(term.key) {
        Some(actual_value) => Ok(actual_value == term.value),
        None if term.key.is_optional() => Ok(false),
        None => Err(format!(
          "Condition term '{}' cannot be evaluated because the setting '{}' has no value.",
          term,
          term.key.name_string()
        ))
      },
      Self::Not(expr) => Ok(!expr.evaluate(settings)?),
      Self::And(left_expr, right_expr) => {
        let left_result: bool = left_expr.evaluate(settings)?;
        let right_result: bool = right_expr.evaluate(settings)?;
        Ok(left_result && right_result)
      },
      Self::Or(left_expr, right_expr) => {
        let left_result: bool = left_expr.evaluate(settings)?;
        let right_result: bool = right_expr.evaluate(settings)?;
        Ok(left_result || right_result)
      },
      Self::ParenGroup(expr) => expr.evaluate(settings)
    }
  }

  pub fn referenced_axes(&self) -> BTreeSet<SettingsAxis> {
    let mut axes: BTreeSet<SettingsAxis> = BTreeSet::new();
    self.collect_axes(&mut axes);
    return axes;
  }

  fn collect_axes(&self, axes: &mut BTreeSet<SettingsAxis>) {
    match self {
      Self::Term(term) => {
        axes.insert(term.key.axis());
      },
      Self::Not(expr) | Self::ParenGroup(expr) => expr.collect_axes(axes),
      Self::And(left_expr, right_expr) | Self::Or(left_expr, right_expr) => {
        left_expr.collect_axes(axes);
        right_expr.collect_axes(axes);
      }
    }
  }

  fn inner_to_string(&self) -> String {
    match self {
      Self::Term(term) => term.to_string(),
      Self::Not(expr) => format!("not {}", expr.inner_to_string()),
      Self::And(left_expr, right_expr) => format!("{} and {}", left_expr.inner_to_string(), right_expr.inner_to_string()),
      Self::Or(left_expr, right_expr) => format!("{} or {}", left_expr.inner_to_string(), right_expr.inner_to_string()),
      Self::ParenGroup(expr) => format!("({})", expr.inner_to_string())
    }
  }
}

impl fmt::Display for SettingsConditionTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "(({}))", self.inner_to_string())
  }
}

#[derive(Debug)]
pub enum ConditionParseError {
  NotClosed {
    what_parsing: String,
    parsed_from: String,
    needed: String
  }
}

pub fn parse_condition_with_diagnostic(expr_str: &str) -> Result<SettingsConditionTree, String> {
  return match SettingsConditionTree::parse_from(expr_str) {
    Ok(None) => Err(format!(
      "'{}' is not a settings condition. Conditions are wrapped in '((' and '))', for example: ((os:Linux and not compiler:msvc))",
      expr_str
    )),
    Ok(Some(ParseSuccess { value, rest })) => {
      if rest.trim().is_empty() {
        Ok(value)
      }
      else {
        Err(format!(
          "Failed to parse settings condition because of unexpected text after the closing '))'.\n{}",
          point_to_position(expr_str, rest)
        ))
      }
    },
    Err(parsing_err) => match parsing_err {
      ParseError::InvalidIdentifier { what_parsing, identifier, expected, parsed_from } => {
        let expected_string: String = expected
          .map_or(
            String::from(""),
            |the_expected| format!(" (expected {})", the_expected)
          );

        Err(format!(
          "Failed to parse {} due to invalid identifier '{}'{}.\n{}",
          what_parsing,
          identifier,
          expected_string,
          point_to_position(expr_str, &parsed_from)
        ))
      },
      ParseError::NoneMatched { what_parsing, parsed_from, failure_reason } => {
        Err(format!(
          "Failed to parse {} because {}.\n{}",
          what_parsing,
          failure_reason,
          point_to_position(expr_str, &parsed_from)
        ))
      },
      ParseError::Custom(ConditionParseError::NotClosed { what_parsing, parsed_from, needed }) => {
        Err(format!(
          "Failed to parse {} because it wasn't properly closed with '{}'.\n{}",
          what_parsing,
          needed,
          point_to_position(expr_str, &parsed_from)
        ))
      }
    }
  }
}

fn parse_full_condition<'a>(s: &'a str) -> ConditionParseResult<'a> {
  return match parse_given_str_after_whitespace::<ConditionParseError>("((", s)? {
    None => Ok(None),
    Some(ParseSuccess { rest, .. }) => match parse_or_expression(rest)? {
      None => Err(ParseError::NoneMatched {
        what_parsing: String::from("settings condition"),
        parsed_from: rest.to_string(),
        failure_reason: String::from("it does not contain an expression")
      }),
      Some(ParseSuccess { value: expr, rest: after_inner }) => {
        match parse_given_str_after_whitespace::<ConditionParseError>("))", after_inner)? {
          Some(ParseSuccess { rest: after_full_condition, .. }) => Ok(Some(ParseSuccess {
            value: expr,
            rest: after_full_condition
          })),
          None => Err(unclosed_or_unexpected_token(after_inner, "settings condition", "))")?)
        }
      }
    }
  }
}

/*
  When an expression is followed by something other than its closing
  delimiter, the most useful message names that token.
*/
fn unclosed_or_unexpected_token(
  s: &str,
  what_parsing: &str,
  needed: &str
) -> Result<ParseError<ConditionParseError>, ParseError<ConditionParseError>> {
  return match parse_token(s)? {
    Some(ParseSuccess { value: token, .. }) => Ok(ParseError::InvalidIdentifier {
      what_parsing: what_parsing.to_string(),
      identifier: token.to_string(),
      expected: Some(format!(
        "one of: {}, '{}'",
        VALID_JOINT_TERMS.iter()
          .map(|term| format!("'{}'", term))
          .collect::<Vec<String>>()
          .join(", "),
        needed
      )),
      parsed_from: s.to_string()
    }),
    None => Ok(ParseError::Custom(ConditionParseError::NotClosed {
      what_parsing: what_parsing.to_string(),
      parsed_from: s.to_string(),
      needed: needed.to_string()
    }))
  }
}

fn parse_or_expression<'a>(s: &'a str) -> ConditionParseResult<'a> {
  parse_joined_term(
    s,
    &parse_and_expression,
    "or",
    &parse_or_expression,
    SettingsConditionTree::Or
  )
}

fn parse_and_expression<'a>(s: &'a str) -> ConditionParseResult<'a> {
  parse_joined_term(
    s,
    &parse_unary_expression,
    "and",
    &parse_and_expression,
    SettingsConditionTree::And
  )
}

fn parse_unary_expression<'a>(s: &'a str) -> ConditionParseResult<'a> {
  return alternatives_parse(s, vec![&parse_not, &parse_paren_group, &parse_term]);
}

fn parse_joined_term<'a, F>(
  s: &'a str,
  left_side_parser: &dyn Parser<'a, SettingsConditionTree, ConditionParseError>,
  join_word: &str,
  right_side_parser: &dyn Parser<'a, SettingsConditionTree, ConditionParseError>,
  joint_constructor: F
) -> ConditionParseResult<'a>
  where F: Fn(Box<SettingsConditionTree>, Box<SettingsConditionTree>) -> SettingsConditionTree
{
  assert!(
    VALID_JOINT_TERMS.contains(&join_word),
    "When parsing a joined term (i.e. 'and' or 'or' expression), the joining word must be present in VALID_JOINT_TERMS."
  );

  match left_side_parser.parse(s)? {
    None => Ok(None),
    Some(ParseSuccess { value: left_expr, rest: after_left }) => match parse_token(after_left)? {
      Some(ParseSuccess { value: middle_token, rest: after_middle_token }) if middle_token == join_word => {
        match right_side_parser.parse(after_middle_token)? {
          None => Err(ParseError::NoneMatched {
            what_parsing: format!("joint '{}' expression", join_word),
            parsed_from: after_middle_token.to_string(),
            failure_reason: format!("nothing valid follows '{}'", join_word)
          }),
          Some(ParseSuccess { value: right_expr, rest }) => Ok(Some(ParseSuccess {
            value: (joint_constructor)(Box::new(left_expr), Box::new(right_expr)),
            rest
          }))
        }
      },
      _ => Ok(Some(ParseSuccess {
        value: left_expr,
        rest: after_left
      }))
    }
  }
}

fn parse_not<'a>(s: &'a str) -> ConditionParseResult<'a> {
  return match parse_token(s)? {
    Some(ParseSuccess { value: "not", rest }) => match parse_unary_expression(rest)? {
      None => Err(ParseError::NoneMatched {
        what_parsing: String::from("'not' expression"),
        parsed_from: rest.to_string(),
        failure_reason: String::from("nothing valid follows 'not'")
      }),
      Some(ParseSuccess { value: expr, rest: rest_of_expr }) => Ok(Some(ParseSuccess {
        value: SettingsConditionTree::Not(Box::new(expr)),
        rest: rest_of_expr
      }))
    },
    _ => Ok(None)
  }
}

fn parse_paren_group<'a>(s: &'a str) -> ConditionParseResult<'a> {
  match parse_given_str_after_whitespace::<ConditionParseError>("(", s)? {
    None => Ok(None),
    Some(ParseSuccess { rest, .. }) => match parse_or_expression(rest)? {
      None => Err(ParseError::NoneMatched {
        what_parsing: String::from("parenthesized expression group"),
        parsed_from: rest.to_string(),
        failure_reason: String::from("the group does not contain a valid expression")
      }),
      Some(ParseSuccess { value: grouped_expr, rest: after_contained_expr }) => {
        match parse_given_str_after_whitespace::<ConditionParseError>(")", after_contained_expr)? {
          Some(ParseSuccess { rest: after_group_end, .. }) => Ok(Some(ParseSuccess {
            value: SettingsConditionTree::ParenGroup(Box::new(grouped_expr)),
            rest: after_group_end
          })),
          None => Err(unclosed_or_unexpected_token(after_contained_expr, "parenthesized expression group", ")")?)
        }
      }
    }
  }
}

fn parse_term<'a>(s: &'a str) -> ConditionParseResult<'a> {
  let (token, rest) = match parse_token(s)? {
    None => return Ok(None),
    Some(ParseSuccess { value, rest }) => (value, rest)
  };

  let (key_str, value_str) = match token.split_once(':') {
    Some(split_term) => split_term,
    None => return Err(ParseError::InvalidIdentifier {
      what_parsing: String::from("settings term"),
      identifier: token.to_string(),
      expected: Some(String::from("a term of the form <setting>:<value>, such as os:Linux")),
      parsed_from: s.to_string()
    })
  };

  let key: SettingKey = SettingKey::from_str(key_str)
    .ok_or_else(|| ParseError::InvalidIdentifier {
      what_parsing: String::from("settings term"),
      identifier: key_str.to_string(),
      expected: Some(format!(
        "one of: {}",
        all::<SettingKey>()
          .map(|key| key.name_string())
          .collect::<Vec<&str>>()
          .join(", ")
      )),
      parsed_from: s.to_string()
    })?;

  let value: String = key.canonical_value(value_str)
    .ok_or_else(|| ParseError::InvalidIdentifier {
      what_parsing: format!("value of setting '{}'", key.name_string()),
      identifier: value_str.to_string(),
      expected: Some(format!("one of: {}", key.axis().allowed_value_names().join(", "))),
      parsed_from: s.to_string()
    })?;

  return Ok(Some(ParseSuccess {
    value: SettingsConditionTree::Term(SettingsTerm { key, value }),
    rest
  }));
}

fn parse_token<'a>(s: &'a str) -> ParseResult<'a, &'a str, ConditionParseError> {
  let str_parsing: &'a str = parse_whitespace(s);
  let mut non_token_char_index: usize = str_parsing.len();

  for (index, c) in str_parsing.char_indices() {
    match c {
      'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | ':' => continue,
      '(' | ')' => {
        non_token_char_index = index;
        break;
      },
      whitespace if whitespace.is_whitespace() => {
        non_token_char_index = index;
        break;
      },
      invalid_token => return Err(ParseError::InvalidIdentifier {
        what_parsing: String::from("token"),
        identifier: invalid_token.to_string(),
        expected: None,
        parsed_from: str_parsing[index..].to_string()
      })
    }
  }

  let token: &'a str = &str_parsing[..non_token_char_index];

  if token.is_empty() {
    return Ok(None)
  }

  return Ok(Some(ParseSuccess {
    value: token,
    rest: &str_parsing[non_token_char_index..]
  }));
}
