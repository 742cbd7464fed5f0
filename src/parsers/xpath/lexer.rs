use super::XPathError;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Pipe,
    Dot,
    DotDot,
    Star,
    AxisSep,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `local`, `prefix:local` 或 `prefix:*`
    Name {
        prefix: Option<String>,
        local: String,
    },
    Literal(String),
    Number(f64),
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Slash => "/".to_string(),
            Token::DoubleSlash => "//".to_string(),
            Token::LBracket => "[".to_string(),
            Token::RBracket => "]".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::At => "@".to_string(),
            Token::Comma => ",".to_string(),
            Token::Pipe => "|".to_string(),
            Token::Dot => ".".to_string(),
            Token::DotDot => "..".to_string(),
            Token::Star => "*".to_string(),
            Token::AxisSep => "::".to_string(),
            Token::Eq => "=".to_string(),
            Token::Ne => "!=".to_string(),
            Token::Lt => "<".to_string(),
            Token::Le => "<=".to_string(),
            Token::Gt => ">".to_string(),
            Token::Ge => ">=".to_string(),
            Token::Name {
                prefix: Some(prefix),
                local,
            } => format!("{prefix}:{local}"),
            Token::Name { prefix: None, local } => local.clone(),
            Token::Literal(value) => format!("'{value}'"),
            Token::Number(value) => value.to_string(),
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

/// 把表达式切分为 `(偏移量, Token)` 序列
pub(crate) fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, XPathError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let peek = |index: usize| chars.get(index).map(|(_, c)| *c);

    while i < chars.len() {
        let (offset, c) = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let (token, consumed) = match c {
            '/' if peek(i + 1) == Some('/') => (Token::DoubleSlash, 2),
            '/' => (Token::Slash, 1),
            '[' => (Token::LBracket, 1),
            ']' => (Token::RBracket, 1),
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '@' => (Token::At, 1),
            ',' => (Token::Comma, 1),
            '|' => (Token::Pipe, 1),
            '*' => (Token::Star, 1),
            '=' => (Token::Eq, 1),
            '!' if peek(i + 1) == Some('=') => (Token::Ne, 2),
            '<' if peek(i + 1) == Some('=') => (Token::Le, 2),
            '<' => (Token::Lt, 1),
            '>' if peek(i + 1) == Some('=') => (Token::Ge, 2),
            '>' => (Token::Gt, 1),
            ':' if peek(i + 1) == Some(':') => (Token::AxisSep, 2),
            '.' if peek(i + 1) == Some('.') => (Token::DotDot, 2),
            '.' if peek(i + 1).is_some_and(|c| c.is_ascii_digit()) => {
                let end = scan_while(&chars, i + 1, |c| c.is_ascii_digit());
                (Token::Number(parse_number(input, &chars, i, end)?), end - i)
            }
            '.' => (Token::Dot, 1),
            '"' | '\'' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|(_, q)| *q == c)
                    .map(|p| i + 1 + p)
                    .ok_or(XPathError::UnterminatedLiteral(offset))?;
                let value: String = chars[i + 1..end].iter().map(|(_, c)| *c).collect();
                (Token::Literal(value), end - i + 1)
            }
            c if c.is_ascii_digit() => {
                let mut end = scan_while(&chars, i, |c| c.is_ascii_digit());
                if peek(end) == Some('.') {
                    end = scan_while(&chars, end + 1, |c| c.is_ascii_digit());
                }
                (Token::Number(parse_number(input, &chars, i, end)?), end - i)
            }
            c if is_name_start(c) => {
                let end = scan_while(&chars, i, is_name_char);
                let first: String = chars[i..end].iter().map(|(_, c)| *c).collect();

                // A single ":" turns the name into a prefixed name, "::" is an axis separator
                if peek(end) == Some(':') && peek(end + 1) != Some(':') {
                    match peek(end + 1) {
                        Some('*') => (
                            Token::Name {
                                prefix: Some(first),
                                local: "*".to_string(),
                            },
                            end + 2 - i,
                        ),
                        Some(c) if is_name_start(c) => {
                            let local_end = scan_while(&chars, end + 1, is_name_char);
                            let local: String =
                                chars[end + 1..local_end].iter().map(|(_, c)| *c).collect();
                            (
                                Token::Name {
                                    prefix: Some(first),
                                    local,
                                },
                                local_end - i,
                            )
                        }
                        _ => {
                            return Err(XPathError::UnexpectedChar {
                                ch: ':',
                                offset: chars[end].0,
                            })
                        }
                    }
                } else {
                    (
                        Token::Name {
                            prefix: None,
                            local: first,
                        },
                        end - i,
                    )
                }
            }
            _ => return Err(XPathError::UnexpectedChar { ch: c, offset }),
        };

        tokens.push((offset, token));
        i += consumed;
    }

    Ok(tokens)
}

fn scan_while(chars: &[(usize, char)], start: usize, predicate: impl Fn(char) -> bool) -> usize {
    let mut end = start;
    while end < chars.len() && predicate(chars[end].1) {
        end += 1;
    }
    end
}

fn parse_number(
    input: &str,
    chars: &[(usize, char)],
    start: usize,
    end: usize,
) -> Result<f64, XPathError> {
    let from = chars[start].0;
    let to = chars.get(end).map(|(o, _)| *o).unwrap_or(input.len());
    input[from..to]
        .parse()
        .map_err(|_| XPathError::UnexpectedChar {
            ch: chars[start].1,
            offset: from,
        })
}
