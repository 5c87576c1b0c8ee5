//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
/// Cuts on a char boundary so multibyte input never panics.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let cut = (0..=max).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0);
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

/// A named predicate applied to one request field.
pub struct ValidationRule {
  pub test: fn(&str) -> bool,
  pub error_message: &'static str,
}

/// One request field together with the rules it must satisfy.
pub struct ValidationField<'a> {
  pub value: &'a str,
  pub rules: &'a [ValidationRule],
  pub field_name: &'static str,
}

/// Runs every rule over every field, reporting the first failure
/// as "Field: message".
pub fn validate_inputs(fields: &[ValidationField<'_>]) -> Result<(), String> {
  for field in fields {
    for rule in field.rules {
      if !(rule.test)(field.value) {
        return Err(format!("{}: {}", field.field_name, rule.error_message));
      }
    }
  }
  Ok(())
}

fn not_blank(value: &str) -> bool {
  !value.trim().is_empty()
}

fn email_shape(value: &str) -> bool {
  let Some((local, domain)) = value.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && domain.contains('.')
    && !domain.ends_with('.')
    && !value.chars().any(char::is_whitespace)
}

pub const IS_NOT_EMPTY: ValidationRule = ValidationRule {
  test: not_blank,
  error_message: "This field cannot be empty",
};

#[allow(dead_code)]
pub const IS_VALID_EMAIL: ValidationRule = ValidationRule {
  test: email_shape,
  error_message: "Invalid email format",
};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_template_replaces_every_occurrence() {
    let out = fill_template("{a} and {b} and {a}", &[("a", "x"), ("b", "y")]);
    assert_eq!(out, "x and y and x");
  }

  #[test]
  fn fill_template_leaves_unknown_keys_alone() {
    let out = fill_template("{a} {missing}", &[("a", "x")]);
    assert_eq!(out, "x {missing}");
  }

  #[test]
  fn validate_inputs_reports_first_failure_with_field_name() {
    let fields = [
      ValidationField { value: "ok", rules: &[IS_NOT_EMPTY], field_name: "Level" },
      ValidationField { value: "   ", rules: &[IS_NOT_EMPTY], field_name: "Response" },
    ];
    let err = validate_inputs(&fields).unwrap_err();
    assert_eq!(err, "Response: This field cannot be empty");
  }

  #[test]
  fn validate_inputs_passes_when_all_rules_hold() {
    let fields = [ValidationField {
      value: "hello",
      rules: &[IS_NOT_EMPTY],
      field_name: "Response",
    }];
    assert!(validate_inputs(&fields).is_ok());
  }

  #[test]
  fn email_rule_accepts_plausible_addresses() {
    assert!((IS_VALID_EMAIL.test)("student@example.com"));
    assert!((IS_VALID_EMAIL.test)("a.b@mail.co.uk"));
  }

  #[test]
  fn email_rule_rejects_malformed_addresses() {
    assert!(!(IS_VALID_EMAIL.test)("no-at-sign"));
    assert!(!(IS_VALID_EMAIL.test)("@example.com"));
    assert!(!(IS_VALID_EMAIL.test)("user@nodot"));
    assert!(!(IS_VALID_EMAIL.test)("user@domain."));
    assert!(!(IS_VALID_EMAIL.test)("user name@example.com"));
  }

  #[test]
  fn trunc_for_log_is_multibyte_safe() {
    let s = "héllo wörld";
    let out = trunc_for_log(s, 3);
    assert!(out.contains('…'));
    let short = trunc_for_log("abc", 10);
    assert_eq!(short, "abc");
  }
}
