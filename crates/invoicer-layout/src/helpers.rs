//! # Template Helpers
//!
//! The helper set every [`TemplateManager`](crate::template::TemplateManager)
//! registry starts with.
//!
//! ```text
//! ┌───────────────────┬──────────────────────────────────────────────────┐
//! │ formatMoney a c   │ a: decimal or {amount, currency}; c: code        │
//! │ formatDate d f    │ d: "YYYY-MM-DD"; f: strftime, default %Y-%m-%d   │
//! │ formatDateLong d  │ "March 1, 2024"                                  │
//! │ upper/lower/title │ case mapping                                     │
//! │ join list sep     │ "a, b"                                           │
//! │ add/mul/div a b   │ exact decimal math, div by zero gives 0          │
//! │ seq n             │ [1, 2, ..., n] for {{#each (seq 3)}}             │
//! └───────────────────┴──────────────────────────────────────────────────┘
//! ```
//!
//! The formatting helpers write straight to the output and fail the render
//! on bad input. The rest return values so they can be nested as
//! subexpressions.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::NaiveDate;
use handlebars::{
    handlebars_helper, Context, Handlebars, Helper, HelperResult, Output, RenderContext,
    RenderError, RenderErrorReason,
};
use invoicer_core::format_simple;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const LONG_DATE_FORMAT: &str = "%B %-d, %Y";

/// A registry with the invoice helpers installed.
///
/// Missing values render empty. HTML escaping stays on; the tokenizer
/// decodes the entities it produces.
pub fn registry() -> Handlebars<'static> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(false);

    registry.register_helper("formatMoney", Box::new(format_money_helper));
    registry.register_helper("formatDate", Box::new(format_date_helper));
    registry.register_helper("formatDateLong", Box::new(format_date_long_helper));
    registry.register_helper("upper", Box::new(upper));
    registry.register_helper("lower", Box::new(lower));
    registry.register_helper("title", Box::new(title));
    registry.register_helper("join", Box::new(join));
    registry.register_helper("add", Box::new(add));
    registry.register_helper("mul", Box::new(mul));
    registry.register_helper("div", Box::new(div));
    registry.register_helper("seq", Box::new(seq));
    registry
}

// =============================================================================
// Formatting Helpers
// =============================================================================

fn format_money_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = param(h, 0, "formatMoney")?;

    // a serialized Money carries its own currency
    let (amount, own_currency) = match value {
        Value::Object(money) => (
            money.get("amount").and_then(to_decimal),
            money.get("currency").and_then(Value::as_str),
        ),
        other => (to_decimal(other), None),
    };
    let amount = amount.ok_or_else(|| helper_error("formatMoney", "amount is not a number"))?;
    let currency = h
        .param(1)
        .and_then(|p| p.value().as_str())
        .or(own_currency)
        .ok_or_else(|| helper_error("formatMoney", "missing currency code"))?;

    out.write(&format_simple(amount, currency))?;
    Ok(())
}

fn format_date_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let date = date_param(h, "formatDate")?;
    let layout = h
        .param(1)
        .and_then(|p| p.value().as_str())
        .filter(|layout| !layout.is_empty())
        .unwrap_or(DEFAULT_DATE_FORMAT);

    out.write(&format_date(date, layout)?)?;
    Ok(())
}

fn format_date_long_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let date = date_param(h, "formatDateLong")?;
    out.write(&format_date(date, LONG_DATE_FORMAT)?)?;
    Ok(())
}

fn param<'a>(
    h: &'a Helper,
    index: usize,
    helper: &'static str,
) -> Result<&'a Value, RenderError> {
    h.param(index)
        .map(|p| p.value())
        .ok_or_else(|| RenderErrorReason::ParamNotFoundForIndex(helper, index).into())
}

fn date_param(h: &Helper, helper: &'static str) -> Result<NaiveDate, RenderError> {
    let raw = param(h, 0, helper)?
        .as_str()
        .ok_or_else(|| helper_error(helper, "date must be a string"))?;
    NaiveDate::parse_from_str(raw, DEFAULT_DATE_FORMAT)
        .map_err(|e| helper_error(helper, format!("'{raw}': {e}")))
}

/// strftime without panicking on a bad specifier.
fn format_date(date: NaiveDate, layout: &str) -> Result<String, RenderError> {
    let mut formatted = String::new();
    write!(formatted, "{}", date.format(layout))
        .map_err(|_| helper_error("formatDate", format!("invalid date format '{layout}'")))?;
    Ok(formatted)
}

fn helper_error(helper: &str, reason: impl std::fmt::Display) -> RenderError {
    RenderErrorReason::Other(format!("{helper}: {reason}")).into()
}

// =============================================================================
// Value Helpers
// =============================================================================

handlebars_helper!(upper: |s: str| s.to_uppercase());
handlebars_helper!(lower: |s: str| s.to_lowercase());
handlebars_helper!(title: |s: str| title_case(s));
handlebars_helper!(join: |items: Json, sep: str| join_values(items, sep));
handlebars_helper!(add: |a: Json, b: Json| arithmetic("add", a, b, |x, y| x.checked_add(y)));
handlebars_helper!(mul: |a: Json, b: Json| arithmetic("mul", a, b, |x, y| x.checked_mul(y)));
handlebars_helper!(div: |a: Json, b: Json| arithmetic("div", a, b, |x, y| {
    if y.is_zero() {
        Some(Decimal::ZERO)
    } else {
        x.checked_div(y)
    }
}));
handlebars_helper!(seq: |n: Json| sequence(n));

/// Upper-cases the first letter of every word, lower-cases the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

fn join_values(items: &Value, sep: &str) -> String {
    let Some(items) = items.as_array() else {
        return display(items);
    };
    items.iter().map(display).collect::<Vec<_>>().join(sep)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Decimal from a JSON number or numeric string (`"12.50"`).
fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Result as a normalized decimal string; null (empty output) when an
/// operand is not numeric.
fn arithmetic<F>(helper: &str, a: &Value, b: &Value, op: F) -> Value
where
    F: Fn(Decimal, Decimal) -> Option<Decimal>,
{
    match (to_decimal(a), to_decimal(b)) {
        (Some(x), Some(y)) => op(x, y)
            .map_or(Value::Null, |r| Value::String(r.normalize().to_string())),
        _ => {
            debug!(helper = %helper, left = %a, right = %b, "Non-numeric helper operand");
            Value::Null
        }
    }
}

fn sequence(n: &Value) -> Value {
    let count = to_decimal(n)
        .and_then(|d| u64::try_from(d.trunc()).ok())
        .unwrap_or(0);
    Value::Array((1..=count).map(Value::from).collect())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(template: &str, data: &Value) -> Result<String, RenderError> {
        registry().render_template(template, data)
    }

    #[test]
    fn test_format_money() {
        let data = json!({
            "amount": "1234.5",
            "total": { "amount": "19.999", "currency": "EUR" },
        });
        assert_eq!(render("{{formatMoney amount \"USD\"}}", &data).unwrap(), "$ 1,234.50");
        assert_eq!(render("{{formatMoney total}}", &data).unwrap(), "20,00 €");
        assert_eq!(render("{{formatMoney 7 \"XYZ\"}}", &data).unwrap(), "7.00 XYZ");

        assert!(render("{{formatMoney amount}}", &data).is_err());
        assert!(render("{{formatMoney \"abc\" \"USD\"}}", &data).is_err());
    }

    #[test]
    fn test_format_dates() {
        let data = json!({ "issued": "2024-03-01" });
        assert_eq!(render("{{formatDate issued}}", &data).unwrap(), "2024-03-01");
        assert_eq!(render("{{formatDate issued \"%d.%m.%Y\"}}", &data).unwrap(), "01.03.2024");
        assert_eq!(render("{{formatDateLong issued}}", &data).unwrap(), "March 1, 2024");

        assert!(render("{{formatDate \"yesterday\"}}", &data).is_err());
    }

    #[test]
    fn test_case_and_join_helpers() {
        let data = json!({ "name": "globex CORPORATION", "tags": ["a", "b", 3] });
        assert_eq!(render("{{upper name}}", &data).unwrap(), "GLOBEX CORPORATION");
        assert_eq!(render("{{lower name}}", &data).unwrap(), "globex corporation");
        assert_eq!(render("{{title name}}", &data).unwrap(), "Globex Corporation");
        assert_eq!(render("{{join tags \", \"}}", &data).unwrap(), "a, b, 3");
    }

    #[test]
    fn test_arithmetic_helpers() {
        let data = json!({ "qty": "2.5", "price": "10.10" });
        assert_eq!(render("{{mul qty price}}", &data).unwrap(), "25.25");
        assert_eq!(render("{{add 1 2}}", &data).unwrap(), "3");
        assert_eq!(render("{{div 10 4}}", &data).unwrap(), "2.5");
        assert_eq!(render("{{div 10 0}}", &data).unwrap(), "0");
        assert_eq!(render("{{mul qty \"many\"}}", &data).unwrap(), "");
        assert_eq!(
            render("{{formatMoney (mul qty price) \"USD\"}}", &data).unwrap(),
            "$ 25.25"
        );
    }

    #[test]
    fn test_seq_in_each() {
        let data = json!({});
        assert_eq!(
            render("{{#each (seq 3)}}[{{this}}]{{/each}}", &data).unwrap(),
            "[1][2][3]"
        );
        assert_eq!(render("{{#each (seq 0)}}x{{/each}}", &data).unwrap(), "");
    }
}
