//! `Format(fmt, args...)`.
//!
//! Placeholders are `{}` or `{:spec}` with `spec = ['0'][width]['.' precision][type]`
//! and `type` one of `d x X b f e s`. `{{` and `}}` are literal braces.

use super::Arg;

/// Largest width or precision a spec may ask for.
const MAX_WIDTH: usize = 1024;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Spec {
    zero: bool,
    width: usize,
    precision: Option<usize>,
    kind: Option<char>,
}

fn parse_spec(text: &str) -> Result<Spec, String> {
    let mut spec = Spec::default();
    let mut rest = text;
    if let Some(stripped) = rest.strip_prefix('0') {
        spec.zero = true;
        rest = stripped;
    }
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        spec.width = rest[..digits]
            .parse::<usize>()
            .ok()
            .filter(|w| *w <= MAX_WIDTH)
            .ok_or_else(|| format!("width in [{{:{text}}}] exceeds {MAX_WIDTH}"))?;
        rest = &rest[digits..];
    }
    if let Some(stripped) = rest.strip_prefix('.') {
        let digits = stripped.chars().take_while(char::is_ascii_digit).count();
        if digits == 0 {
            return Err(format!("missing precision in [{{:{text}}}]"));
        }
        let precision = stripped[..digits]
            .parse::<usize>()
            .ok()
            .filter(|p| *p <= MAX_WIDTH)
            .ok_or_else(|| format!("precision in [{{:{text}}}] exceeds {MAX_WIDTH}"))?;
        spec.precision = Some(precision);
        rest = &stripped[digits..];
    }
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (None, _) => {}
        (Some(kind @ ('d' | 'x' | 'X' | 'b' | 'f' | 'e' | 's')), None) => spec.kind = Some(kind),
        _ => return Err(format!("unknown format spec [{{:{text}}}]")),
    }
    Ok(spec)
}

fn pad(out: &mut String, spec: &Spec, body: &str) {
    let len = body.chars().count();
    if len >= spec.width {
        out.push_str(body);
        return;
    }
    let fill = spec.width - len;
    if spec.zero {
        // Zeros go after the sign.
        let (sign, digits) = match body.strip_prefix('-') {
            Some(digits) => ("-", digits),
            None => ("", body),
        };
        out.push_str(sign);
        out.extend(std::iter::repeat_n('0', fill));
        out.push_str(digits);
    } else {
        out.extend(std::iter::repeat_n(' ', fill));
        out.push_str(body);
    }
}

fn render(spec: &Spec, text: &str, arg: &Arg<'_>) -> Result<String, String> {
    let mismatch = |expected: &str| format!("format spec [{{:{text}}}] expects {expected}, get [{}]", arg.type_name());
    let body = match (spec.kind, arg) {
        (None, Arg::FP(v)) => match spec.precision {
            Some(p) => format!("{v:.p$}"),
            None => v.to_string(),
        },
        (None, Arg::Custom(_) | Arg::Empty) => return Err(mismatch("a printable value")),
        (None, other) => other.to_string(),
        (Some('s'), Arg::Str(s)) => s.to_string(),
        (Some('s'), _) => return Err(mismatch("string")),
        (Some('d'), Arg::Uint(v)) => v.to_string(),
        (Some('d'), Arg::Int(v)) => v.to_string(),
        (Some('x'), Arg::Uint(v)) => format!("{v:x}"),
        (Some('x'), Arg::Int(v)) => format!("{v:x}"),
        (Some('X'), Arg::Uint(v)) => format!("{v:X}"),
        (Some('X'), Arg::Int(v)) => format!("{v:X}"),
        (Some('b'), Arg::Uint(v)) => format!("{v:b}"),
        (Some('b'), Arg::Int(v)) => format!("{v:b}"),
        (Some('d' | 'x' | 'X' | 'b'), _) => return Err(mismatch("integer")),
        (Some(kind @ ('f' | 'e')), arg) if arg.is_number() => {
            let v = arg.get_fp().unwrap_or_default();
            let p = spec.precision.unwrap_or(6);
            if kind == 'f' { format!("{v:.p$}") } else { format!("{v:.p$e}") }
        }
        (Some(_), _) => return Err(mismatch("number")),
    };
    let mut out = String::new();
    pad(&mut out, spec, &body);
    Ok(out)
}

pub(super) fn format(fmt: &str, args: &[Arg<'_>]) -> Result<String, String> {
    let mut out = String::with_capacity(fmt.len());
    let mut next_arg = 0;
    let mut rest = fmt;
    while let Some(idx) = rest.find(['{', '}']) {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        if let Some(after) = tail.strip_prefix("{{") {
            out.push('{');
            rest = after;
            continue;
        }
        if let Some(after) = tail.strip_prefix("}}") {
            out.push('}');
            rest = after;
            continue;
        }
        if tail.starts_with('}') {
            return Err("unmatched '}' in format string".to_string());
        }
        let Some(close) = tail.find('}') else {
            return Err("unclosed '{' in format string".to_string());
        };
        let inner = &tail[1..close];
        let spec_text = match inner.strip_prefix(':') {
            Some(spec) => spec,
            None if inner.is_empty() => "",
            None => return Err(format!("unsupported placeholder [{{{inner}}}]")),
        };
        let spec = parse_spec(spec_text)?;
        let Some(arg) = args.get(next_arg) else {
            return Err(format!("not enough arguments, [{}] given", args.len()));
        };
        out.push_str(&render(&spec, spec_text, arg)?);
        next_arg += 1;
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    if next_arg != args.len() {
        return Err(format!("[{}] arguments given but [{next_arg}] used", args.len()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders() {
        let args = [Arg::str("gcd"), Arg::Uint(5), Arg::FP(0.5)];
        assert_eq!(format("{} = {} ({})", &args).unwrap(), "gcd = 5 (0.5)");
        assert_eq!(format("{{{}}}", &[Arg::Int(-1)]).unwrap(), "{-1}");
    }

    #[test]
    fn specs() {
        assert_eq!(format("{:04d}|{:x}|{:X}|{:b}", &[Arg::Int(-7), Arg::Uint(255), Arg::Uint(255), Arg::Uint(5)]).unwrap(), "-007|ff|FF|101");
        assert_eq!(format("{:.2f}|{:6s}|{:.2}", &[Arg::Int(3), Arg::str("ab"), Arg::FP(2.375)]).unwrap(), "3.00|    ab|2.38");
        assert_eq!(format("{:.1e}", &[Arg::FP(1500.0)]).unwrap(), "1.5e3");
    }

    #[test]
    fn mismatches() {
        assert_eq!(
            format("{:d}", &[Arg::str("x")]).unwrap_err(),
            "format spec [{:d}] expects integer, get [string]"
        );
        assert!(format("{} {}", &[Arg::Int(1)]).is_err());
        assert!(format("{}", &[Arg::Int(1), Arg::Int(2)]).is_err());
        assert!(format("{", &[]).is_err());
        assert!(format("{:q}", &[Arg::Int(1)]).is_err());
    }

    #[test]
    fn oversized_width_is_rejected() {
        assert_eq!(
            format("{:99999999999}", &[Arg::Int(1)]).unwrap_err(),
            "width in [{:99999999999}] exceeds 1024"
        );
        assert!(format("{:.4096f}", &[Arg::FP(1.0)]).is_err());
        assert!(format("{:099999999999999999999999d}", &[Arg::Int(1)]).is_err());
        assert_eq!(format("{:1024}", &[Arg::Int(1)]).unwrap().len(), 1024);
    }
}
