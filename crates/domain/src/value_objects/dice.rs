//! Dice formula parsing and evaluation
//!
//! Supports arithmetic formulas such as `"1d20+5"`, `"2d6 * 2 - @ammo"`,
//! `"(d8 + @actor.proficiency) / 2"`:
//!
//! - integers and `+ - * /` with the usual precedence, unary minus and
//!   parentheses (division truncates toward zero)
//! - dice terms `XdY` and the shorthand `dY`
//! - `@tag` references resolved from a [`RollData`] snapshot
//!
//! Randomness is injected by the caller so the domain stays deterministic
//! under test; maximize/minimize modes need no randomness at all.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

const MAX_DICE: u32 = 1000;
const MAX_TOKENS: usize = 512;
const MAX_DEPTH: usize = 64;

/// Error when parsing or evaluating a formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// The formula string is empty
    #[error("Empty formula")]
    Empty,
    /// A character that cannot start a token
    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    /// A token that does not fit the grammar
    #[error("Unexpected token '{0}'")]
    UnexpectedToken(String),
    /// The formula ended mid-expression
    #[error("Unexpected end of formula")]
    UnexpectedEnd,
    /// Dice count or size out of range
    #[error("Invalid dice term: {0}")]
    InvalidDice(String),
    /// `@tag` not present in the roll data
    #[error("Unknown roll data reference: @{0}")]
    UnknownReference(String),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Arithmetic overflow")]
    Overflow,
    /// Too many tokens or too deeply nested
    #[error("Formula is too complex")]
    TooComplex,
}

/// Numeric snapshot of a stat context, keyed by tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RollData(BTreeMap<String, f64>);

impl RollData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), value);
    }

    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(&key.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How dice terms are resolved during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RollMode {
    /// Roll every die with the injected random source
    Normal,
    /// Every die shows its highest face
    Maximize,
    /// Every die shows 1
    Minimize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Number(i64),
    Dice { count: u32, sides: u32 },
    Reference(String),
    Neg(Box<Expr>),
    Group(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    fn has_dice(&self) -> bool {
        match self {
            Self::Dice { .. } => true,
            Self::Number(_) | Self::Reference(_) => false,
            Self::Neg(inner) | Self::Group(inner) => inner.has_dice(),
            Self::Binary { lhs, rhs, .. } => lhs.has_dice() || rhs.has_dice(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Dice { count, sides } => write!(f, "{}d{}", count, sides),
            Self::Reference(name) => write!(f, "@{}", name),
            Self::Neg(inner) => write!(f, "-{}", inner),
            Self::Group(inner) => write!(f, "({})", inner),
            Self::Binary { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op.symbol(), rhs),
        }
    }
}

/// Result of evaluating a formula once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaEvaluation {
    pub total: i64,
    /// True when the formula contains no dice
    pub deterministic: bool,
    /// Formula with references replaced by their values (e.g. `"1d20 + 3"`)
    pub formula: String,
    /// Formula with each dice term's faces (e.g. `"1d20[14] + 3"`)
    pub breakdown: String,
}

/// A parsed dice formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceExpression {
    source: String,
    root: Expr,
}

impl DiceExpression {
    /// Parse a formula string.
    ///
    /// ```
    /// use kitsheet_domain::DiceExpression;
    ///
    /// assert!(DiceExpression::parse("2d6 + @might").is_ok());
    /// assert!(DiceExpression::parse("2d6 +").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, FormulaError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(FormulaError::Empty);
        }
        let tokens = tokenize(trimmed)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let root = parser.expression()?;
        if let Some(token) = parser.peek() {
            return Err(FormulaError::UnexpectedToken(token.to_string()));
        }
        Ok(Self {
            source: trimmed.to_string(),
            root,
        })
    }

    /// Syntax check only; references are not resolved.
    pub fn is_valid(input: &str) -> bool {
        Self::parse(input).is_ok()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when no dice terms appear, so every evaluation is identical.
    pub fn is_deterministic(&self) -> bool {
        !self.root.has_dice()
    }

    /// Evaluate against `data`. `roll(sides)` must return a face in
    /// `1..=sides`; it is only called in [`RollMode::Normal`].
    pub fn evaluate<R>(
        &self,
        data: &RollData,
        mode: RollMode,
        mut roll: R,
    ) -> Result<FormulaEvaluation, FormulaError>
    where
        R: FnMut(u32) -> u32,
    {
        let out = eval(&self.root, data, mode, &mut roll)?;
        Ok(FormulaEvaluation {
            total: out.total,
            deterministic: self.is_deterministic(),
            formula: out.formula,
            breakdown: out.breakdown,
        })
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

struct EvalOut {
    total: i64,
    formula: String,
    breakdown: String,
}

fn eval<R>(
    expr: &Expr,
    data: &RollData,
    mode: RollMode,
    roll: &mut R,
) -> Result<EvalOut, FormulaError>
where
    R: FnMut(u32) -> u32,
{
    match expr {
        Expr::Number(n) => Ok(EvalOut {
            total: *n,
            formula: n.to_string(),
            breakdown: n.to_string(),
        }),
        Expr::Reference(name) => {
            let value = data
                .get(name)
                .ok_or_else(|| FormulaError::UnknownReference(name.clone()))?;
            let value = value.trunc() as i64;
            Ok(EvalOut {
                total: value,
                formula: value.to_string(),
                breakdown: value.to_string(),
            })
        }
        Expr::Dice { count, sides } => {
            let faces: Vec<u32> = (0..*count)
                .map(|_| match mode {
                    RollMode::Normal => roll(*sides).clamp(1, *sides),
                    RollMode::Maximize => *sides,
                    RollMode::Minimize => 1,
                })
                .collect();
            let total = faces.iter().map(|&f| i64::from(f)).sum();
            let shown: Vec<String> = faces.iter().map(u32::to_string).collect();
            Ok(EvalOut {
                total,
                formula: format!("{}d{}", count, sides),
                breakdown: format!("{}d{}[{}]", count, sides, shown.join(", ")),
            })
        }
        Expr::Neg(inner) => {
            let inner = eval(inner, data, mode, roll)?;
            Ok(EvalOut {
                total: inner.total.checked_neg().ok_or(FormulaError::Overflow)?,
                formula: format!("-{}", inner.formula),
                breakdown: format!("-{}", inner.breakdown),
            })
        }
        Expr::Group(inner) => {
            let inner = eval(inner, data, mode, roll)?;
            Ok(EvalOut {
                total: inner.total,
                formula: format!("({})", inner.formula),
                breakdown: format!("({})", inner.breakdown),
            })
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs, data, mode, roll)?;
            let rhs = eval(rhs, data, mode, roll)?;
            let total = match op {
                BinaryOp::Add => lhs.total.checked_add(rhs.total),
                BinaryOp::Sub => lhs.total.checked_sub(rhs.total),
                BinaryOp::Mul => lhs.total.checked_mul(rhs.total),
                BinaryOp::Div => {
                    if rhs.total == 0 {
                        return Err(FormulaError::DivisionByZero);
                    }
                    lhs.total.checked_div(rhs.total)
                }
            }
            .ok_or(FormulaError::Overflow)?;
            Ok(EvalOut {
                total,
                formula: format!("{} {} {}", lhs.formula, op.symbol(), rhs.formula),
                breakdown: format!("{} {} {}", lhs.breakdown, op.symbol(), rhs.breakdown),
            })
        }
    }
}

// =============================================================================
// Tokenizer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(u64),
    D,
    Reference(String),
    Op(BinaryOp),
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::D => write!(f, "d"),
            Self::Reference(name) => write!(f, "@{}", name),
            Self::Op(op) => write!(f, "{}", op.symbol()),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            c if c.is_whitespace() => {}
            '0'..='9' => {
                let mut digits = String::from(ch);
                while let Some(&(_, next)) = chars.peek() {
                    if !next.is_ascii_digit() {
                        break;
                    }
                    digits.push(next);
                    chars.next();
                }
                let value = digits.parse().map_err(|_| FormulaError::Overflow)?;
                tokens.push(Token::Number(value));
            }
            'd' | 'D' => tokens.push(Token::D),
            '@' => {
                let mut name = String::new();
                while let Some(&(_, next)) = chars.peek() {
                    // '-' always reads as subtraction: "@ammo-1"
                    if !(next.is_alphanumeric() || matches!(next, '_' | '.')) {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                if name.is_empty() {
                    return Err(FormulaError::UnexpectedChar { ch: '@', pos });
                }
                tokens.push(Token::Reference(name.to_lowercase()));
            }
            '+' => tokens.push(Token::Op(BinaryOp::Add)),
            '-' => tokens.push(Token::Op(BinaryOp::Sub)),
            '*' => tokens.push(Token::Op(BinaryOp::Mul)),
            '/' => tokens.push(Token::Op(BinaryOp::Div)),
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            _ => return Err(FormulaError::UnexpectedChar { ch, pos }),
        }
        if tokens.len() > MAX_TOKENS {
            return Err(FormulaError::TooComplex);
        }
    }

    Ok(tokens)
}

// =============================================================================
// Parser (recursive descent)
// =============================================================================

// Token count bounds chain length and depth bounds nesting, which keeps
// parse, eval and drop recursion shallow.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, FormulaError>,
    ) -> Result<T, FormulaError> {
        if self.depth >= MAX_DEPTH {
            return Err(FormulaError::TooComplex);
        }
        self.depth += 1;
        let out = parse(self);
        self.depth -= 1;
        out
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(Token::Op(op @ (BinaryOp::Add | BinaryOp::Sub))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    // term := unary (('*' | '/') unary)*
    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        while let Some(Token::Op(op @ (BinaryOp::Mul | BinaryOp::Div))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    // unary := '-' unary | primary
    fn unary(&mut self) -> Result<Expr, FormulaError> {
        if let Some(Token::Op(BinaryOp::Sub)) = self.peek() {
            self.pos += 1;
            let inner = self.nested(Self::unary)?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.primary()
    }

    // primary := NUMBER ['d' NUMBER] | 'd' NUMBER | REFERENCE | '(' expression ')'
    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.next() {
            Some(Token::Number(n)) => {
                if let Some(Token::D) = self.peek() {
                    self.pos += 1;
                    let sides = self.die_size()?;
                    dice(n, sides)
                } else {
                    i64::try_from(n)
                        .map(Expr::Number)
                        .map_err(|_| FormulaError::Overflow)
                }
            }
            Some(Token::D) => {
                let sides = self.die_size()?;
                dice(1, sides)
            }
            Some(Token::Reference(name)) => Ok(Expr::Reference(name)),
            Some(Token::LParen) => {
                let inner = self.nested(Self::expression)?;
                match self.next() {
                    Some(Token::RParen) => Ok(Expr::Group(Box::new(inner))),
                    Some(other) => Err(FormulaError::UnexpectedToken(other.to_string())),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            Some(other) => Err(FormulaError::UnexpectedToken(other.to_string())),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn die_size(&mut self) -> Result<u64, FormulaError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(other) => Err(FormulaError::InvalidDice(format!(
                "expected die size, found '{}'",
                other
            ))),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}

fn dice(count: u64, sides: u64) -> Result<Expr, FormulaError> {
    if count == 0 || count > u64::from(MAX_DICE) {
        return Err(FormulaError::InvalidDice(format!(
            "dice count must be between 1 and {}",
            MAX_DICE
        )));
    }
    let sides = u32::try_from(sides)
        .ok()
        .filter(|&s| s >= 1)
        .ok_or_else(|| FormulaError::InvalidDice("die size must be at least 1".to_string()))?;
    Ok(Expr::Dice {
        count: count as u32,
        sides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(face: u32) -> impl FnMut(u32) -> u32 {
        move |_| face
    }

    fn total(formula: &str) -> i64 {
        DiceExpression::parse(formula)
            .unwrap()
            .evaluate(&RollData::new(), RollMode::Normal, fixed(1))
            .unwrap()
            .total
    }

    #[test]
    fn test_parse_simple_d20() {
        let expr = DiceExpression::parse("1d20").unwrap();
        assert!(!expr.is_deterministic());
        assert_eq!(expr.to_string(), "1d20");
    }

    #[test]
    fn test_parse_shorthand_and_case() {
        assert_eq!(DiceExpression::parse("d20").unwrap().to_string(), "1d20");
        assert_eq!(DiceExpression::parse("2D6+3").unwrap().to_string(), "2d6 + 3");
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(total("2 + 3 * 4"), 14);
        assert_eq!(total("(2 + 3) * 4"), 20);
        assert_eq!(total("10 - 4 - 3"), 3);
        assert_eq!(total("-3 + 5"), 2);
        assert_eq!(total("7 / 2"), 3);
        assert_eq!(total("-7 / 2"), -3);
    }

    #[test]
    fn test_deterministic_formulas() {
        assert!(DiceExpression::parse("1 + @might").unwrap().is_deterministic());
        assert!(!DiceExpression::parse("(1 + d4)").unwrap().is_deterministic());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(DiceExpression::parse("   "), Err(FormulaError::Empty));
        assert_eq!(DiceExpression::parse("2 +"), Err(FormulaError::UnexpectedEnd));
        assert!(matches!(
            DiceExpression::parse("2 $ 3"),
            Err(FormulaError::UnexpectedChar { ch: '$', .. })
        ));
        assert!(matches!(
            DiceExpression::parse("0d6"),
            Err(FormulaError::InvalidDice(_))
        ));
        assert!(matches!(
            DiceExpression::parse("2d0"),
            Err(FormulaError::InvalidDice(_))
        ));
        assert!(matches!(
            DiceExpression::parse("(1 + 2"),
            Err(FormulaError::UnexpectedEnd)
        ));
        assert!(matches!(
            DiceExpression::parse("1 2"),
            Err(FormulaError::UnexpectedToken(_))
        ));
        assert!(!DiceExpression::is_valid("@"));
        assert!(!DiceExpression::is_valid("fireball"));
    }

    #[test]
    fn test_references_resolve_from_roll_data() {
        let data = RollData::new().with("might", 3.0).with("actor.stamina", 12.0);
        let expr = DiceExpression::parse("1d20 + @might + @Actor.Stamina").unwrap();

        let result = expr.evaluate(&data, RollMode::Normal, fixed(14)).unwrap();
        assert_eq!(result.total, 29);
        assert_eq!(result.formula, "1d20 + 3 + 12");
        assert_eq!(result.breakdown, "1d20[14] + 3 + 12");
        assert!(!result.deterministic);
    }

    #[test]
    fn test_unknown_reference_fails_evaluation() {
        let expr = DiceExpression::parse("@ghost + 1").unwrap();
        let result = expr.evaluate(&RollData::new(), RollMode::Normal, fixed(1));
        assert_eq!(result, Err(FormulaError::UnknownReference("ghost".to_string())));
    }

    #[test]
    fn test_maximize_and_minimize() {
        let expr = DiceExpression::parse("2d6 + 1").unwrap();
        let data = RollData::new();
        let max = expr.evaluate(&data, RollMode::Maximize, fixed(3)).unwrap();
        let min = expr.evaluate(&data, RollMode::Minimize, fixed(3)).unwrap();
        assert_eq!(max.total, 13);
        assert_eq!(max.breakdown, "2d6[6, 6] + 1");
        assert_eq!(min.total, 3);
    }

    #[test]
    fn test_maximize_with_negated_dice() {
        let expr = DiceExpression::parse("10 - 1d4").unwrap();
        let data = RollData::new();
        assert_eq!(expr.evaluate(&data, RollMode::Maximize, fixed(1)).unwrap().total, 6);
        assert_eq!(expr.evaluate(&data, RollMode::Minimize, fixed(1)).unwrap().total, 9);
    }

    #[test]
    fn test_random_source_is_clamped_to_die() {
        let expr = DiceExpression::parse("1d6").unwrap();
        let result = expr
            .evaluate(&RollData::new(), RollMode::Normal, fixed(40))
            .unwrap();
        assert_eq!(result.total, 6);
    }

    #[test]
    fn test_division_by_zero() {
        let expr = DiceExpression::parse("4 / (2 - 2)").unwrap();
        assert_eq!(
            expr.evaluate(&RollData::new(), RollMode::Normal, fixed(1)),
            Err(FormulaError::DivisionByZero)
        );
    }

    #[test]
    fn test_multiple_dice_breakdown() {
        let mut faces = vec![4, 5].into_iter();
        let expr = DiceExpression::parse("2d6+3").unwrap();
        let result = expr
            .evaluate(&RollData::new(), RollMode::Normal, move |_| {
                faces.next().unwrap_or(1)
            })
            .unwrap();
        assert_eq!(result.total, 12);
        assert_eq!(result.breakdown, "2d6[4, 5] + 3");
    }

    #[test]
    fn test_deep_nesting_is_too_complex() {
        let deep = format!("{}1{}", "(".repeat(5000), ")".repeat(5000));
        assert_eq!(DiceExpression::parse(&deep), Err(FormulaError::TooComplex));
        assert!(!DiceExpression::is_valid(&"-".repeat(5000)));

        let nested = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(DiceExpression::parse(&nested), Err(FormulaError::TooComplex));

        let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(total(&shallow), 1);
    }

    #[test]
    fn test_long_chain_is_too_complex() {
        let chain = format!("{}1", "1+".repeat(200_000));
        assert_eq!(DiceExpression::parse(&chain), Err(FormulaError::TooComplex));

        let short = format!("{}1", "1+".repeat(99));
        assert_eq!(total(&short), 100);
    }
}
