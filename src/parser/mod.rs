//! Statement parsing.
//!
//! SELECT statements go through `sqlparser` and are lowered to the small
//! query surface the executor understands: a projection target, a table
//! name, and a list of AND-ed column/literal comparisons. LOAD and QUIT
//! are not SQL; a thin front-end recognizes them before the SQL parser
//! runs. Load-file lines (`<int>, <string>`) are parsed here too.

use sqlparser::ast::{
    BinaryOperator, Expr, FunctionArg, FunctionArgExpr, FunctionArguments, SelectItem, SetExpr,
    Statement, TableFactor, UnaryOperator,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::error::{Error, Result};
use crate::types::{CompOp, Predicate, SelectTarget};

/// A parsed top-level command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select {
        target: SelectTarget,
        table: String,
        conds: Vec<Predicate>,
    },
    Load {
        table: String,
        file: String,
        with_index: bool,
    },
    Quit,
}

/// Parse one interactive command.
pub fn parse(input: &str) -> Result<Command> {
    let trimmed = input.trim().trim_end_matches(';').trim();
    if trimmed.is_empty() {
        return Err(Error::Parse("empty statement".into()));
    }

    let first = trimmed.split_whitespace().next().unwrap_or("");
    if first.eq_ignore_ascii_case("quit") || first.eq_ignore_ascii_case("exit") {
        return Ok(Command::Quit);
    }
    if first.eq_ignore_ascii_case("load") {
        return parse_load(trimmed);
    }
    parse_select(input)
}

/// `LOAD <table> FROM '<file>' [WITH INDEX]`
fn parse_load(input: &str) -> Result<Command> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let err = || Error::Parse("expected LOAD <table> FROM '<file>' [WITH INDEX]".into());

    if tokens.len() < 4 || !tokens[2].eq_ignore_ascii_case("from") {
        return Err(err());
    }
    let table = tokens[1].to_string();
    let file = unquote(tokens[3]).ok_or_else(err)?;

    let with_index = match tokens.len() {
        4 => false,
        6 if tokens[4].eq_ignore_ascii_case("with") && tokens[5].eq_ignore_ascii_case("index") => {
            true
        }
        _ => return Err(err()),
    };
    Ok(Command::Load {
        table,
        file,
        with_index,
    })
}

fn unquote(token: &str) -> Option<String> {
    for quote in ['\'', '"'] {
        if let Some(inner) = token
            .strip_prefix(quote)
            .and_then(|t| t.strip_suffix(quote))
        {
            return Some(inner.to_string());
        }
    }
    if token.starts_with('\'') || token.starts_with('"') {
        return None;
    }
    Some(token.to_string())
}

fn parse_select(input: &str) -> Result<Command> {
    let dialect = GenericDialect {};
    let stmts =
        Parser::parse_sql(&dialect, input).map_err(|e| Error::Parse(e.to_string()))?;
    let [stmt] = stmts.as_slice() else {
        return Err(Error::Parse("expected a single statement".into()));
    };
    let Statement::Query(query) = stmt else {
        return Err(Error::Parse("only SELECT, LOAD and QUIT are supported".into()));
    };
    let SetExpr::Select(select) = &*query.body else {
        return Err(Error::Parse("unsupported query form".into()));
    };

    let target = parse_target(&select.projection)?;

    let [from] = select.from.as_slice() else {
        return Err(Error::Parse("expected exactly one table".into()));
    };
    if !from.joins.is_empty() {
        return Err(Error::Parse("joins are not supported".into()));
    }
    let TableFactor::Table { name, .. } = &from.relation else {
        return Err(Error::Parse("expected a plain table name".into()));
    };
    let table = name.to_string();

    let mut conds = Vec::new();
    if let Some(selection) = &select.selection {
        collect_conds(selection, &mut conds)?;
    }
    Ok(Command::Select {
        target,
        table,
        conds,
    })
}

fn parse_target(projection: &[SelectItem]) -> Result<SelectTarget> {
    match projection {
        [SelectItem::Wildcard(_)] => Ok(SelectTarget::All),
        [SelectItem::UnnamedExpr(expr)] => match expr {
            Expr::Identifier(ident) => column_target(&ident.value),
            Expr::Function(func) => {
                if !func.name.to_string().eq_ignore_ascii_case("count") {
                    return Err(Error::Parse(format!(
                        "unsupported function: {}",
                        func.name
                    )));
                }
                match &func.args {
                    FunctionArguments::List(list)
                        if matches!(
                            list.args.as_slice(),
                            [FunctionArg::Unnamed(FunctionArgExpr::Wildcard)]
                        ) =>
                    {
                        Ok(SelectTarget::Count)
                    }
                    _ => Err(Error::Parse("only count(*) is supported".into())),
                }
            }
            _ => Err(Error::Parse("unsupported projection".into())),
        },
        [SelectItem::UnnamedExpr(a), SelectItem::UnnamedExpr(b)] => {
            let (Expr::Identifier(a), Expr::Identifier(b)) = (a, b) else {
                return Err(Error::Parse("unsupported projection".into()));
            };
            if a.value.eq_ignore_ascii_case("key") && b.value.eq_ignore_ascii_case("value") {
                Ok(SelectTarget::All)
            } else {
                Err(Error::Parse("expected key, value".into()))
            }
        }
        _ => Err(Error::Parse("unsupported projection".into())),
    }
}

fn column_target(name: &str) -> Result<SelectTarget> {
    if name.eq_ignore_ascii_case("key") {
        Ok(SelectTarget::Key)
    } else if name.eq_ignore_ascii_case("value") {
        Ok(SelectTarget::Value)
    } else {
        Err(Error::Parse(format!("unknown column: {name}")))
    }
}

/// Flatten an AND chain of `column <op> literal` comparisons.
fn collect_conds(expr: &Expr, out: &mut Vec<Predicate>) -> Result<()> {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            collect_conds(left, out)?;
            collect_conds(right, out)
        }
        Expr::Nested(inner) => collect_conds(inner, out),
        Expr::BinaryOp { left, op, right } => {
            let op = comp_op(op)?;
            let Expr::Identifier(ident) = &**left else {
                return Err(Error::Parse(
                    "conditions must have the form <column> <op> <literal>".into(),
                ));
            };
            out.push(predicate(&ident.value, op, right)?);
            Ok(())
        }
        _ => Err(Error::Parse(format!("unsupported condition: {expr}"))),
    }
}

fn comp_op(op: &BinaryOperator) -> Result<CompOp> {
    match op {
        BinaryOperator::Eq => Ok(CompOp::Eq),
        BinaryOperator::NotEq => Ok(CompOp::Ne),
        BinaryOperator::Lt => Ok(CompOp::Lt),
        BinaryOperator::LtEq => Ok(CompOp::Le),
        BinaryOperator::Gt => Ok(CompOp::Gt),
        BinaryOperator::GtEq => Ok(CompOp::Ge),
        other => Err(Error::Parse(format!("unsupported operator: {other}"))),
    }
}

fn predicate(column: &str, op: CompOp, literal: &Expr) -> Result<Predicate> {
    let text = literal_text(literal)?;
    if column.eq_ignore_ascii_case("key") {
        let literal = text
            .parse::<i32>()
            .map_err(|_| Error::Parse(format!("key literal must be an integer: {text}")))?;
        Ok(Predicate::Key { op, literal })
    } else if column.eq_ignore_ascii_case("value") {
        Ok(Predicate::Value { op, literal: text })
    } else {
        Err(Error::Parse(format!("unknown column: {column}")))
    }
}

fn literal_text(expr: &Expr) -> Result<String> {
    match expr {
        Expr::Value(val) => match &val.value {
            sqlparser::ast::Value::Number(n, _) => Ok(n.clone()),
            sqlparser::ast::Value::SingleQuotedString(s)
            | sqlparser::ast::Value::DoubleQuotedString(s) => Ok(s.clone()),
            other => Err(Error::Parse(format!("unsupported literal: {other}"))),
        },
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => Ok(format!("-{}", literal_text(expr)?)),
        other => Err(Error::Parse(format!("unsupported literal: {other}"))),
    }
}

/// Parse one load-file line of the form `<int>, <string>`, where the
/// string may be single- or double-quoted. Everything after a closing
/// quote is ignored; a missing comma is a format error.
pub fn parse_load_line(line: &str) -> Result<(i32, String)> {
    let Some((key_part, rest)) = line.split_once(',') else {
        return Err(Error::InvalidFileFormat("load line missing comma".into()));
    };
    let key = key_part
        .trim()
        .parse::<i32>()
        .map_err(|_| Error::InvalidFileFormat(format!("bad key field: {key_part:?}")))?;

    let rest = rest.trim_start_matches([' ', '\t']);
    if rest.is_empty() {
        return Ok((key, String::new()));
    }

    let value = match rest.chars().next() {
        Some(quote @ ('\'' | '"')) => {
            let inner = &rest[1..];
            match inner.find(quote) {
                Some(end) => inner[..end].to_string(),
                None => inner.to_string(),
            }
        }
        _ => rest.to_string(),
    };
    Ok((key, value))
}
