//! `Math.*` functions.

use hashbrown::HashMap;
use lazy_static::lazy_static;

use super::Arg;
use super::operators::handle_binary;
use crate::ast::EmbedOps;

/// What was wrong with the arguments of a math call. The caller adds the
/// function name.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum ArgIssue {
    Count(&'static str),
    Type {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },
}

pub(super) type MathFn = fn(&[Arg<'_>]) -> Result<Arg<'static>, ArgIssue>;

lazy_static! {
    static ref MATH_FUNCS: HashMap<&'static str, MathFn> = {
        let mut table: HashMap<&'static str, MathFn> = HashMap::new();
        table.insert("Max", max);
        table.insert("Min", min);
        table.insert("Sqrt", |args| unary_fp(args, f64::sqrt));
        table.insert("Log", |args| unary_fp(args, f64::ln));
        table.insert("Log2", |args| unary_fp(args, f64::log2));
        table.insert("Log10", |args| unary_fp(args, f64::log10));
        table.insert("Ceil", |args| rounding(args, f64::ceil));
        table.insert("Floor", |args| rounding(args, f64::floor));
        table.insert("Round", |args| rounding(args, f64::round));
        table.insert("Pow", pow);
        table.insert("Lerp", lerp);
        table.insert("LeadZero", |args| bits(args, |v| v.leading_zeros()));
        table.insert("TailZero", |args| bits(args, |v| v.trailing_zeros()));
        table.insert("PopCount", |args| bits(args, |v| v.count_ones()));
        table.insert("ToUint", |args| convert(args, |a| a.get_uint().map(Arg::Uint)));
        table.insert("ToInt", |args| convert(args, |a| a.get_int().map(Arg::Int)));
        table.insert("ToFP", |args| convert(args, |a| a.get_fp().map(Arg::FP)));
        table.insert("ParseInt", |args| parse(args, |s, radix| i64::from_str_radix(s, radix).ok().map(Arg::Int)));
        table.insert("ParseUint", |args| parse(args, |s, radix| u64::from_str_radix(s, radix).ok().map(Arg::Uint)));
        table.insert("ParseFloat", parse_float);
        table.insert("ParseSciFloat", parse_sci_float);
        table
    };
}

pub(super) fn lookup(name: &str) -> Option<MathFn> {
    MATH_FUNCS.get(name).copied()
}

fn type_issue(index: usize, expected: &'static str, arg: &Arg<'_>) -> ArgIssue {
    ArgIssue::Type {
        index,
        expected,
        actual: arg.type_name(),
    }
}

fn number(args: &[Arg<'_>], index: usize) -> Result<f64, ArgIssue> {
    match &args[index] {
        arg if arg.is_number() => arg.get_fp().ok_or_else(|| type_issue(index, "number", arg)),
        arg => Err(type_issue(index, "number", arg)),
    }
}

fn single<'s, 'a>(args: &'s [Arg<'a>]) -> Result<&'s Arg<'a>, ArgIssue> {
    match args {
        [arg] => Ok(arg),
        _ => Err(ArgIssue::Count("1")),
    }
}

fn pick(args: &[Arg<'_>], keep_left: EmbedOps) -> Result<Arg<'static>, ArgIssue> {
    let Some((first, rest)) = args.split_first() else {
        return Err(ArgIssue::Count("at least 1"));
    };
    if !first.is_number() {
        return Err(type_issue(0, "number", first));
    }
    let mut best = first;
    for (i, arg) in rest.iter().enumerate() {
        if !arg.is_number() {
            return Err(type_issue(i + 1, "number", arg));
        }
        if handle_binary(keep_left, best, arg) != Arg::Bool(true) {
            best = arg;
        }
    }
    Ok(best.clone().into_owned())
}

fn max(args: &[Arg<'_>]) -> Result<Arg<'static>, ArgIssue> {
    pick(args, EmbedOps::GreaterEqual)
}

fn min(args: &[Arg<'_>]) -> Result<Arg<'static>, ArgIssue> {
    pick(args, EmbedOps::LessEqual)
}

fn unary_fp(args: &[Arg<'_>], f: fn(f64) -> f64) -> Result<Arg<'static>, ArgIssue> {
    single(args)?;
    Ok(Arg::FP(f(number(args, 0)?)))
}

/// Integers are already whole and pass through unchanged.
fn rounding(args: &[Arg<'_>], f: fn(f64) -> f64) -> Result<Arg<'static>, ArgIssue> {
    match single(args)? {
        Arg::FP(v) => Ok(Arg::FP(f(*v))),
        arg if arg.is_integer() => Ok(arg.clone().into_owned()),
        arg => Err(type_issue(0, "number", arg)),
    }
}

fn pow(args: &[Arg<'_>]) -> Result<Arg<'static>, ArgIssue> {
    let [base, exp] = args else {
        return Err(ArgIssue::Count("2"));
    };
    let exponent = match exp {
        Arg::Uint(v) => u32::try_from(*v).ok(),
        Arg::Int(v) => u32::try_from(*v).ok(),
        _ => None,
    };
    match (base, exponent) {
        (Arg::Uint(b), Some(e)) => Ok(Arg::Uint(b.wrapping_pow(e))),
        (Arg::Int(b), Some(e)) => Ok(Arg::Int(b.wrapping_pow(e))),
        _ => Ok(Arg::FP(number(args, 0)?.powf(number(args, 1)?))),
    }
}

fn lerp(args: &[Arg<'_>]) -> Result<Arg<'static>, ArgIssue> {
    if args.len() != 3 {
        return Err(ArgIssue::Count("3"));
    }
    let (from, to, t) = (number(args, 0)?, number(args, 1)?, number(args, 2)?);
    Ok(Arg::FP(from + (to - from) * t))
}

fn bits(args: &[Arg<'_>], f: fn(u64) -> u32) -> Result<Arg<'static>, ArgIssue> {
    match single(args)? {
        Arg::Uint(v) => Ok(Arg::Uint(f(*v) as u64)),
        Arg::Int(v) => Ok(Arg::Uint(f(*v as u64) as u64)),
        arg => Err(type_issue(0, "integer", arg)),
    }
}

fn convert(args: &[Arg<'_>], f: fn(&Arg<'_>) -> Option<Arg<'static>>) -> Result<Arg<'static>, ArgIssue> {
    let arg = single(args)?;
    f(arg).ok_or_else(|| type_issue(0, "number or bool", arg))
}

/// Unparseable text yields an empty value so `??` can supply a fallback.
fn parse(args: &[Arg<'_>], f: fn(&str, u32) -> Option<Arg<'static>>) -> Result<Arg<'static>, ArgIssue> {
    let (text, radix) = match args {
        [text] => (text, 10),
        [text, radix] => match (radix.is_integer(), radix.get_uint()) {
            (true, Some(value @ 2..=36)) => (text, value as u32),
            _ => return Err(type_issue(1, "radix between 2 and 36", radix)),
        },
        _ => return Err(ArgIssue::Count("1 or 2")),
    };
    let Arg::Str(text) = text else {
        return Err(type_issue(0, "string", text));
    };
    Ok(f(text.trim(), radix).unwrap_or(Arg::Empty))
}

fn parse_float(args: &[Arg<'_>]) -> Result<Arg<'static>, ArgIssue> {
    match single(args)? {
        Arg::Str(text) => Ok(text.trim().parse().map_or(Arg::Empty, Arg::FP)),
        arg => Err(type_issue(0, "string", arg)),
    }
}

/// Like `ParseFloat`, but the text must carry an exponent: `1.5e3`.
fn parse_sci_float(args: &[Arg<'_>]) -> Result<Arg<'static>, ArgIssue> {
    match single(args)? {
        Arg::Str(text) => {
            let text = text.trim();
            let has_exponent = text
                .split_once(['e', 'E'])
                .is_some_and(|(mantissa, exp)| mantissa.ends_with(|c: char| c.is_ascii_digit() || c == '.') && !exp.is_empty());
            Ok(if has_exponent { text.parse().map_or(Arg::Empty, Arg::FP) } else { Arg::Empty })
        }
        arg => Err(type_issue(0, "string", arg)),
    }
}
