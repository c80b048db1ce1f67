/// Replace `${ENV_VAR}` and `${ENV_VAR:-default}` placeholders.
///
/// Unresolvable variables without a default are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated, emit the remainder literally.
            result.push_str(&rest[start..]);
            return result;
        };

        let expr = &after[..end];
        let (name, default) = match expr.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (expr, None),
        };

        match lookup(name).or_else(|| default.map(str::to_string)) {
            Some(value) if !name.is_empty() => result.push_str(&value),
            _ => {
                result.push_str("${");
                result.push_str(expr);
                result.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "FEISHU_APP_ID" => Some("cli_123".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_env_with("app_id = \"${FEISHU_APP_ID}\"", lookup),
            "app_id = \"cli_123\""
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_env_with("${CHANBRIDGE_MISSING}", lookup),
            "${CHANBRIDGE_MISSING}"
        );
    }

    #[test]
    fn falls_back_to_default() {
        assert_eq!(
            substitute_env_with("${CHANBRIDGE_MISSING:-feishu}", lookup),
            "feishu"
        );
        assert_eq!(
            substitute_env_with("${FEISHU_APP_ID:-other}", lookup),
            "cli_123"
        );
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        assert_eq!(substitute_env_with("a ${OPEN", lookup), "a ${OPEN");
    }

    #[test]
    fn empty_name_is_literal() {
        assert_eq!(substitute_env_with("${}", lookup), "${}");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
