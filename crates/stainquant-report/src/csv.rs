//! CSV field formatting
//!
//! Comma separated values, one record per line. Text fields that contain
//! a comma, a quote or a line break are wrapped in quotes with inner
//! quotes doubled.

/// Quote a text field when needed.
pub fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Format a real number with three decimals.
pub fn real3(v: f64) -> String {
    format!("{:.3}", v)
}

/// Format a real number with two decimals.
pub fn real2(v: f64) -> String {
    format!("{:.2}", v)
}

/// Join already-formatted fields into one line.
pub fn record<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = String::new();
    for (i, f) in fields.into_iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(f.as_ref());
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote() {
        assert_eq!(quote("liver/a.tif"), "liver/a.tif");
        assert_eq!(quote("a,b.tif"), "\"a,b.tif\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_reals() {
        assert_eq!(real3(16.0), "16.000");
        assert_eq!(real3(2.0 / 3.0), "0.667");
        assert_eq!(real2(50.0), "50.00");
        assert_eq!(real2(f64::NAN), "NaN");
    }

    #[test]
    fn test_record() {
        assert_eq!(record(["a", "1", "2.000"]), "a,1,2.000\n");
        assert_eq!(record(Vec::<String>::new()), "\n");
    }
}
