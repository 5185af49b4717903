//! Product identity, version string, and the numeric-precision constant
//! every `Decimal` operation rounds to.

pub const PRODUCT_NAME: &str = "MathScript";
pub const PRODUCT_DESCRIPTION: &str = "MathScript - A Math programming language";

pub const VERSION_MAJOR: u32 = 1;
pub const VERSION_MINOR: Option<u32> = Some(0);
pub const VERSION_BUILD: Option<u32> = Some(1);
pub const VERSION_REVISION: Option<u32> = None;

/// Every `Decimal` value is rounded to this many significant digits after
/// division or a fractional power, matching the language's precision floor.
pub const DECIMAL_PRECISION_DIGITS: i64 = 1000;

pub const DEBUG_MODES: &[&str] = &["lexer", "parser", "lexer-parser", "all"];

/// `major[.minor[.build[.revision]]]`, with each trailing component
/// present only when the one before it is.
pub fn version_string() -> String {
    let mut s = VERSION_MAJOR.to_string();
    if let Some(minor) = VERSION_MINOR {
        s.push('.');
        s.push_str(&minor.to_string());
        if let Some(build) = VERSION_BUILD {
            s.push('.');
            s.push_str(&build.to_string());
            if let Some(revision) = VERSION_REVISION {
                s.push('.');
                s.push_str(&revision.to_string());
            }
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_stops_at_first_missing_optional() {
        assert_eq!(version_string(), "1.0.1");
    }
}
